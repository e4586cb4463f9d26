//! Ad-hoc statement execution
//!
//! Prints result rows as a JSON array (or a single object with `--one`).

use anyhow::{Context, Result};
use clap::Parser;
use pgconn_core::{Database, DbConfig, Param, Record};
use serde_json::Value;

// === Arg Structs ===

#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// SQL statement, with $1, $2, ... placeholders for parameters
    pub sql: String,

    /// Parameter value (repeatable, bound in order). Types are inferred:
    /// null, true/false, integers and decimals; anything else is text
    #[arg(long = "param", short = 'p', value_name = "VALUE")]
    pub params: Vec<String>,

    /// Bind every parameter as text, skipping type inference
    #[arg(long)]
    pub text_params: bool,

    /// Print only the first row (or null when nothing matched)
    #[arg(long)]
    pub one: bool,

    /// Run inside a transaction and roll it back afterwards
    #[arg(long)]
    pub dry_run: bool,

    /// Emit compact single-line JSON
    #[arg(long)]
    pub compact: bool,
}

// === Command Implementation ===

pub async fn run_query(config: &DbConfig, args: QueryArgs) -> Result<()> {
    let params: Vec<Param> = args
        .params
        .iter()
        .map(|raw| {
            if args.text_params {
                Param::Text(raw.clone())
            } else {
                infer_param(raw)
            }
        })
        .collect();

    let db = Database::new(config)?;
    let outcome = if args.dry_run {
        query_and_rollback(&db, &args.sql, &params).await
    } else {
        db.query(&args.sql, &params).await.map_err(Into::into)
    };
    db.close().await;

    let rows = outcome.context("Query failed")?;
    let output = if args.one {
        rows.into_iter().next().map(Value::Object).unwrap_or(Value::Null)
    } else {
        Value::Array(rows.into_iter().map(Value::Object).collect())
    };

    let rendered = if args.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{}", rendered);

    if args.dry_run {
        eprintln!("(dry run: transaction rolled back)");
    }
    Ok(())
}

async fn query_and_rollback(db: &Database, sql: &str, params: &[Param]) -> Result<Vec<Record>> {
    let mut tx = db.begin_transaction().await?;
    let rows = tx.query(sql, params).await;
    // Roll back even when the statement failed; its error is the one to report.
    let rollback = tx.rollback().await;
    let rows = rows?;
    rollback?;
    Ok(rows)
}

/// Best-effort typing for command-line parameter strings.
fn infer_param(raw: &str) -> Param {
    let trimmed = raw.trim();

    if trimmed.eq_ignore_ascii_case("null") {
        return Param::Null;
    }
    if let Ok(b) = trimmed.parse::<bool>() {
        return Param::Bool(b);
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return match i32::try_from(n) {
            Ok(small) => Param::Int4(small),
            Err(_) => Param::Int8(n),
        };
    }
    // Words like "inf" or "NaN" parse as floats; only treat numerals as numbers.
    if trimmed.chars().any(|c| c.is_ascii_digit()) {
        if let Ok(f) = trimmed.parse::<f64>() {
            return Param::Float8(f);
        }
    }
    Param::Text(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_scalars() {
        assert_eq!(infer_param("null"), Param::Null);
        assert_eq!(infer_param("NULL"), Param::Null);
        assert_eq!(infer_param("true"), Param::Bool(true));
        assert_eq!(infer_param("42"), Param::Int4(42));
        assert_eq!(infer_param("-7"), Param::Int4(-7));
        assert_eq!(infer_param("9000000000"), Param::Int8(9_000_000_000));
        assert_eq!(infer_param("2.5"), Param::Float8(2.5));
        assert_eq!(infer_param("1e3"), Param::Float8(1000.0));
    }

    #[test]
    fn falls_back_to_text() {
        assert_eq!(infer_param("alice"), Param::Text("alice".into()));
        assert_eq!(infer_param("inf"), Param::Text("inf".into()));
        assert_eq!(infer_param("NaN"), Param::Text("NaN".into()));
        assert_eq!(infer_param(""), Param::Text(String::new()));
        assert_eq!(infer_param("12abc"), Param::Text("12abc".into()));
    }

    #[test]
    fn text_is_kept_verbatim() {
        assert_eq!(infer_param("  padded "), Param::Text("  padded ".into()));
    }
}
