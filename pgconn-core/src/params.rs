//! Typed statement parameters.
//!
//! Callers pass `&[Param]` alongside SQL with `$1`, `$2`, ... placeholders.
//! Most Rust values convert with `.into()`; `None::<T>` keeps the type of `T`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::error::BoxDynError;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgArgumentBuffer, PgArguments, PgTypeInfo};
use sqlx::query::Query;
use sqlx::{Postgres, Type};
use uuid::Uuid;

/// Declared Postgres type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Bool,
    Int4,
    Int8,
    Float8,
    Numeric,
    Text,
    Bytes,
    Uuid,
    Date,
    Timestamp,
    TimestampTz,
    Json,
}

/// A single bound value.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// SQL NULL with no declared type; the server infers it from the statement
    Null,
    /// SQL NULL declared with a concrete type, as produced by `None::<T>`
    TypedNull(ParamType),
    Bool(bool),
    Int4(i32),
    Int8(i64),
    Float8(f64),
    Numeric(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Json(Value),
}

impl Param {
    pub fn is_null(&self) -> bool {
        matches!(self, Param::Null | Param::TypedNull(_))
    }

    /// The declared type, or `None` for an untyped NULL.
    pub fn param_type(&self) -> Option<ParamType> {
        let ty = match self {
            Param::Null => return None,
            Param::TypedNull(ty) => *ty,
            Param::Bool(_) => ParamType::Bool,
            Param::Int4(_) => ParamType::Int4,
            Param::Int8(_) => ParamType::Int8,
            Param::Float8(_) => ParamType::Float8,
            Param::Numeric(_) => ParamType::Numeric,
            Param::Text(_) => ParamType::Text,
            Param::Bytes(_) => ParamType::Bytes,
            Param::Uuid(_) => ParamType::Uuid,
            Param::Date(_) => ParamType::Date,
            Param::Timestamp(_) => ParamType::Timestamp,
            Param::TimestampTz(_) => ParamType::TimestampTz,
            Param::Json(_) => ParamType::Json,
        };
        Some(ty)
    }

    fn bind_to<'q>(
        &'q self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        match self {
            Param::Null => query.bind(UntypedNull),
            Param::TypedNull(ty) => bind_null(query, *ty),
            Param::Bool(v) => query.bind(*v),
            Param::Int4(v) => query.bind(*v),
            Param::Int8(v) => query.bind(*v),
            Param::Float8(v) => query.bind(*v),
            Param::Numeric(v) => query.bind(*v),
            Param::Text(v) => query.bind(v.as_str()),
            Param::Bytes(v) => query.bind(v.as_slice()),
            Param::Uuid(v) => query.bind(*v),
            Param::Date(v) => query.bind(*v),
            Param::Timestamp(v) => query.bind(*v),
            Param::TimestampTz(v) => query.bind(*v),
            Param::Json(v) => query.bind(v),
        }
    }
}

fn bind_null<'q>(
    query: Query<'q, Postgres, PgArguments>,
    ty: ParamType,
) -> Query<'q, Postgres, PgArguments> {
    match ty {
        ParamType::Bool => query.bind(None::<bool>),
        ParamType::Int4 => query.bind(None::<i32>),
        ParamType::Int8 => query.bind(None::<i64>),
        ParamType::Float8 => query.bind(None::<f64>),
        ParamType::Numeric => query.bind(None::<Decimal>),
        ParamType::Text => query.bind(None::<String>),
        ParamType::Bytes => query.bind(None::<Vec<u8>>),
        ParamType::Uuid => query.bind(None::<Uuid>),
        ParamType::Date => query.bind(None::<NaiveDate>),
        ParamType::Timestamp => query.bind(None::<NaiveDateTime>),
        ParamType::TimestampTz => query.bind(None::<DateTime<Utc>>),
        ParamType::Json => query.bind(None::<Value>),
    }
}

/// NULL sent with type oid 0 ("unspecified"), so the server resolves the
/// parameter type from context the same way it does for an untyped literal.
struct UntypedNull;

impl Type<Postgres> for UntypedNull {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(Oid(0))
    }
}

impl Encode<'_, Postgres> for UntypedNull {
    fn encode_by_ref(&self, _buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        Ok(IsNull::Yes)
    }
}

/// Build a driver query for `sql` with every parameter bound in order.
pub(crate) fn prepare<'q>(sql: &'q str, params: &'q [Param]) -> Query<'q, Postgres, PgArguments> {
    params
        .iter()
        .fold(sqlx::query(sql), |query, param| param.bind_to(query))
}

/// Rust types with a fixed parameter type, so that `None::<T>` still
/// declares it.
pub trait HasParamType: Into<Param> {
    const PARAM_TYPE: ParamType;
}

macro_rules! has_param_type {
    ($($ty:ty => $param:ident),* $(,)?) => {
        $(impl HasParamType for $ty {
            const PARAM_TYPE: ParamType = ParamType::$param;
        })*
    };
}

has_param_type! {
    bool => Bool,
    i16 => Int4,
    i32 => Int4,
    i64 => Int8,
    f32 => Float8,
    f64 => Float8,
    Decimal => Numeric,
    &str => Text,
    String => Text,
    &String => Text,
    Vec<u8> => Bytes,
    &[u8] => Bytes,
    Uuid => Uuid,
    NaiveDate => Date,
    NaiveDateTime => Timestamp,
    DateTime<Utc> => TimestampTz,
    Value => Json,
}

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Param::Bool(v)
    }
}

impl From<i16> for Param {
    fn from(v: i16) -> Self {
        Param::Int4(i32::from(v))
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Param::Int4(v)
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Int8(v)
    }
}

impl From<f32> for Param {
    fn from(v: f32) -> Self {
        Param::Float8(f64::from(v))
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Float8(v)
    }
}

impl From<Decimal> for Param {
    fn from(v: Decimal) -> Self {
        Param::Numeric(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Text(v.to_owned())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Text(v)
    }
}

impl From<&String> for Param {
    fn from(v: &String) -> Self {
        Param::Text(v.clone())
    }
}

impl From<Vec<u8>> for Param {
    fn from(v: Vec<u8>) -> Self {
        Param::Bytes(v)
    }
}

impl From<&[u8]> for Param {
    fn from(v: &[u8]) -> Self {
        Param::Bytes(v.to_vec())
    }
}

impl From<Uuid> for Param {
    fn from(v: Uuid) -> Self {
        Param::Uuid(v)
    }
}

impl From<NaiveDate> for Param {
    fn from(v: NaiveDate) -> Self {
        Param::Date(v)
    }
}

impl From<NaiveDateTime> for Param {
    fn from(v: NaiveDateTime) -> Self {
        Param::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for Param {
    fn from(v: DateTime<Utc>) -> Self {
        Param::TimestampTz(v)
    }
}

impl From<Value> for Param {
    fn from(v: Value) -> Self {
        Param::Json(v)
    }
}

impl<T: HasParamType> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        v.map_or(Param::TypedNull(T::PARAM_TYPE), Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_convert_to_matching_variants() {
        assert_eq!(Param::from(true), Param::Bool(true));
        assert_eq!(Param::from(7_i16), Param::Int4(7));
        assert_eq!(Param::from(7_i32), Param::Int4(7));
        assert_eq!(Param::from(7_i64), Param::Int8(7));
        assert_eq!(Param::from(1.5_f32), Param::Float8(1.5));
        assert_eq!(Param::from("abc"), Param::Text("abc".into()));
        assert_eq!(Param::from(vec![1_u8, 2]), Param::Bytes(vec![1, 2]));
    }

    #[test]
    fn none_keeps_the_declared_type() {
        let none: Option<i32> = None;
        let param = Param::from(none);
        assert!(param.is_null());
        assert_eq!(param, Param::TypedNull(ParamType::Int4));
        assert_eq!(param.param_type(), Some(ParamType::Int4));

        let none: Option<DateTime<Utc>> = None;
        assert_eq!(Param::from(none), Param::TypedNull(ParamType::TimestampTz));
        assert_eq!(Param::from(Some("x")), Param::Text("x".into()));
    }

    #[test]
    fn bare_null_has_no_declared_type() {
        assert!(Param::Null.is_null());
        assert_eq!(Param::Null.param_type(), None);
        assert!(!Param::Int4(0).is_null());
    }

    #[test]
    fn untyped_null_declares_unspecified_oid() {
        assert_eq!(UntypedNull::type_info(), PgTypeInfo::with_oid(Oid(0)));
    }

    #[test]
    fn json_values_stay_json() {
        let value = json!({"tags": ["a", "b"]});
        assert_eq!(Param::from(value.clone()), Param::Json(value));
    }

    #[test]
    fn prepare_accepts_any_parameter_mix() {
        let params: Vec<Param> = vec![
            Param::Null,
            None::<i64>.into(),
            1_i32.into(),
            "two".into(),
            Uuid::nil().into(),
            json!([3]).into(),
        ];
        // Binding is lazy; building the query must not fail or panic.
        let _query = prepare("SELECT $1, $2, $3, $4, $5, $6", &params);
    }
}
