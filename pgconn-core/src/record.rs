//! Result rows as column-name → JSON value maps.
//!
//! Column order is preserved. When a result has duplicate column names the
//! last one wins, so alias columns in SQL when that matters.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde_json::{Number, Value};
use sqlx::decode::Decode;
use sqlx::postgres::types::{Oid, PgInterval, PgMoney, PgTimeTz};
use sqlx::postgres::{PgRow, PgTypeInfo, PgTypeKind};
use sqlx::{Column, Postgres, Row, Type, TypeInfo, ValueRef};
use uuid::Uuid;

use crate::wire::{interval_text, timetz_text, MacAddrText, NetworkText, NumericText};

/// One decoded result row.
pub type Record = serde_json::Map<String, Value>;

/// Decode every column of a driver row.
pub fn decode_row(row: &PgRow) -> Result<Record, sqlx::Error> {
    let mut record = Record::new();
    for column in row.columns() {
        let value = decode_column(row, column.ordinal(), column.type_info())?;
        record.insert(column.name().to_owned(), value);
    }
    Ok(record)
}

/// Columns are matched on the server-reported type, so the driver's Rust
/// type compatibility check is skipped.
fn decode_column(row: &PgRow, index: usize, type_info: &PgTypeInfo) -> Result<Value, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(Value::Null);
    }

    // A domain is sent in its base type's format.
    if let PgTypeKind::Domain(base) = type_info.kind() {
        return decode_column(row, index, base);
    }

    let value = match type_info.name() {
        "BOOL" => Value::Bool(row.try_get_unchecked::<bool, _>(index)?),
        "INT2" => Value::from(row.try_get_unchecked::<i16, _>(index)?),
        "INT4" => Value::from(row.try_get_unchecked::<i32, _>(index)?),
        "INT8" => Value::from(row.try_get_unchecked::<i64, _>(index)?),
        "OID" => Value::from(row.try_get_unchecked::<Oid, _>(index)?.0),
        "FLOAT4" => float_value(f64::from(row.try_get_unchecked::<f32, _>(index)?)),
        "FLOAT8" => float_value(row.try_get_unchecked::<f64, _>(index)?),
        // Kept as text so precision survives the trip through JSON.
        "NUMERIC" => Value::String(row.try_get_unchecked::<NumericText, _>(index)?.0),
        "UUID" => uuid_value(row.try_get_unchecked::<Uuid, _>(index)?),
        "JSON" | "JSONB" => row.try_get_unchecked::<Value, _>(index)?,
        "TIMESTAMPTZ" => timestamptz_value(row.try_get_unchecked::<DateTime<Utc>, _>(index)?),
        "TIMESTAMP" => timestamp_value(row.try_get_unchecked::<NaiveDateTime, _>(index)?),
        "DATE" => date_value(row.try_get_unchecked::<NaiveDate, _>(index)?),
        "TIME" => time_value(row.try_get_unchecked::<NaiveTime, _>(index)?),
        "TIMETZ" => {
            let tz = row.try_get_unchecked::<PgTimeTz<NaiveTime, FixedOffset>, _>(index)?;
            Value::String(timetz_text(tz.time, tz.offset))
        }
        "INTERVAL" => Value::String(interval_text(&row.try_get_unchecked::<PgInterval, _>(index)?)),
        "INET" | "CIDR" => Value::String(row.try_get_unchecked::<NetworkText, _>(index)?.0),
        "MACADDR" | "MACADDR8" => Value::String(row.try_get_unchecked::<MacAddrText, _>(index)?.0),
        "MONEY" => Value::String(money_text(row.try_get_unchecked::<PgMoney, _>(index)?.0)),
        "BYTEA" => Value::String(bytea_hex(&row.try_get_unchecked::<Vec<u8>, _>(index)?)),
        "BOOL[]" => array(row, index, Value::Bool)?,
        "INT2[]" => array(row, index, |v: i16| Value::from(v))?,
        "INT4[]" => array(row, index, |v: i32| Value::from(v))?,
        "INT8[]" => array(row, index, |v: i64| Value::from(v))?,
        "FLOAT4[]" => array(row, index, |v: f32| float_value(f64::from(v)))?,
        "FLOAT8[]" => array(row, index, float_value)?,
        "NUMERIC[]" => array(row, index, |v: NumericText| Value::String(v.0))?,
        "UUID[]" => array(row, index, uuid_value)?,
        "JSON[]" | "JSONB[]" => array(row, index, |v: Value| v)?,
        "TIMESTAMPTZ[]" => array(row, index, timestamptz_value)?,
        "TIMESTAMP[]" => array(row, index, timestamp_value)?,
        "DATE[]" => array(row, index, date_value)?,
        "TIME[]" => array(row, index, time_value)?,
        "INTERVAL[]" => array(row, index, |v: PgInterval| Value::String(interval_text(&v)))?,
        "INET[]" | "CIDR[]" => array(row, index, |v: NetworkText| Value::String(v.0))?,
        "BYTEA[]" => array(row, index, |v: Vec<u8>| Value::String(bytea_hex(&v)))?,
        // Text-like arrays, including arrays of enums (named `_typname`).
        _ if matches!(type_info.kind(), PgTypeKind::Array(_)) => {
            array(row, index, Value::String)?
        }
        // TEXT, VARCHAR, BPCHAR, NAME, enums and other types whose binary
        // form is their text form.
        _ => Value::String(row.try_get_unchecked::<String, _>(index)?),
    };
    Ok(value)
}

/// One-dimensional array; NULL elements become JSON null.
fn array<T, F>(row: &PgRow, index: usize, to_value: F) -> Result<Value, sqlx::Error>
where
    T: for<'a> Decode<'a, Postgres> + Type<Postgres>,
    F: Fn(T) -> Value,
{
    let items = row.try_get_unchecked::<Vec<Option<T>>, _>(index)?;
    Ok(Value::Array(
        items
            .into_iter()
            .map(|item| item.map_or(Value::Null, &to_value))
            .collect(),
    ))
}

fn uuid_value(id: Uuid) -> Value {
    Value::String(id.to_string())
}

fn timestamptz_value(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

fn timestamp_value(at: NaiveDateTime) -> Value {
    Value::String(at.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

fn date_value(day: NaiveDate) -> Value {
    Value::String(day.to_string())
}

fn time_value(time: NaiveTime) -> Value {
    Value::String(time.to_string())
}

/// JSON has no NaN or infinity; those are rendered the way Postgres prints them.
fn float_value(v: f64) -> Value {
    match Number::from_f64(v) {
        Some(n) => Value::Number(n),
        None if v.is_nan() => Value::String("NaN".into()),
        None if v > 0.0 => Value::String("Infinity".into()),
        None => Value::String("-Infinity".into()),
    }
}

/// MONEY in minor units, rendered with two decimal places and no currency sign.
fn money_text(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Postgres hex output format: `\x` followed by lowercase hex digits.
fn bytea_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
