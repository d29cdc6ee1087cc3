use crate::sql::base::error::DbError;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use model::{
    core::value::{FieldValue, Value},
    records::row::Row,
};
use rust_decimal::Decimal as RustDecimal;
use std::str::FromStr;
use tokio_postgres::{Row as PgRow, types::Json as PgJson};
use tracing::warn;
use uuid::Uuid;

pub fn to_row(entity: &str, row: &PgRow) -> Result<Row, DbError> {
    let fields = row
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let value = decode_column(row, idx, column.type_().name())?;
            Ok(FieldValue::new(column.name(), value))
        })
        .collect::<Result<Vec<_>, DbError>>()?;

    Ok(Row::new(entity, fields))
}

fn decode_column(row: &PgRow, idx: usize, type_name: &str) -> Result<Value, DbError> {
    let value = match type_name {
        "bool" => row.try_get::<_, Option<bool>>(idx)?.map(Value::Boolean),
        "int2" => row
            .try_get::<_, Option<i16>>(idx)?
            .map(|v| Value::Int(v as i64)),
        "int4" => row
            .try_get::<_, Option<i32>>(idx)?
            .map(|v| Value::Int(v as i64)),
        "int8" => row.try_get::<_, Option<i64>>(idx)?.map(Value::Int),
        "float4" => row
            .try_get::<_, Option<f32>>(idx)?
            .map(|v| Value::Float(v as f64)),
        "float8" => row.try_get::<_, Option<f64>>(idx)?.map(Value::Float),
        "numeric" => match row.try_get::<_, Option<RustDecimal>>(idx)? {
            Some(d) => Some(Value::Decimal(BigDecimal::from_str(&d.to_string()).map_err(
                |e| DbError::Conversion(format!("invalid numeric '{d}': {e}")),
            )?)),
            None => None,
        },
        "uuid" => row.try_get::<_, Option<Uuid>>(idx)?.map(Value::Uuid),
        "json" | "jsonb" => row
            .try_get::<_, Option<PgJson<serde_json::Value>>>(idx)?
            .map(|json| Value::Json(json.0)),
        "date" => row.try_get::<_, Option<NaiveDate>>(idx)?.map(Value::Date),
        "timestamp" => row
            .try_get::<_, Option<NaiveDateTime>>(idx)?
            .map(|naive| Value::Timestamp(naive.and_utc())),
        "timestamptz" => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)?
            .map(Value::Timestamp),
        "bytea" => row.try_get::<_, Option<Vec<u8>>>(idx)?.map(Value::Bytes),
        other => match row.try_get::<_, Option<String>>(idx) {
            Ok(text) => text.map(Value::String),
            Err(err) => {
                warn!(column_type = other, %err, "Unsupported column type, reading as NULL");
                None
            }
        },
    };

    Ok(value.unwrap_or(Value::Null))
}
