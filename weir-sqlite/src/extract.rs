use rusqlite::types::{Value as SqliteValue, ValueRef};
use std::str;
use weir_core::{Context, Error, Result, Value, temporal_to_string};

/// Decode a column of the current row.
pub(crate) fn extract_value(value: ValueRef<'_>) -> Result<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int64(Some(v)),
        ValueRef::Real(v) => Value::Float64(Some(v)),
        ValueRef::Text(v) => Value::Varchar(Some(
            str::from_utf8(v)
                .context("Column contains text that is not valid UTF-8")?
                .to_owned(),
        )),
        ValueRef::Blob(v) => Value::Blob(Some(v.into())),
    })
}

/// Storage class a value is bound as: temporal values and uuids as text, booleans as integers.
pub(crate) fn bind_value(value: &Value) -> Result<SqliteValue> {
    if value.is_null() {
        return Ok(SqliteValue::Null);
    }
    Ok(match value {
        Value::Boolean(Some(v)) => SqliteValue::Integer(*v as i64),
        Value::Float32(Some(v)) => SqliteValue::Real(*v as f64),
        Value::Float64(Some(v)) => SqliteValue::Real(*v),
        Value::Varchar(Some(v)) => SqliteValue::Text(v.clone()),
        Value::Blob(Some(v)) => SqliteValue::Blob(v.to_vec()),
        Value::Uuid(Some(v)) => SqliteValue::Text(v.to_string()),
        v => {
            if let Some(text) = temporal_to_string(v) {
                SqliteValue::Text(text)
            } else if let Some(integer) = v.as_integer() {
                SqliteValue::Integer(i64::try_from(integer).map_err(|_| {
                    Error::msg(format!("Integer {} does not fit in a sqlite INTEGER", integer))
                })?)
            } else {
                return Err(Error::msg(format!("Cannot bind {:?} to a sqlite parameter", v)));
            }
        }
    })
}
