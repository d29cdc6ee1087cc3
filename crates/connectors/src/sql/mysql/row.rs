use crate::sql::base::error::DbError;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use model::{
    core::value::{FieldValue, Value},
    records::row::Row,
};
use mysql_async::{Row as MySqlRow, Value as MySqlValue, consts::ColumnType};
use std::str::FromStr;

/// Decodes a driver row into a model row tagged with `entity`.
pub fn to_row(entity: &str, row: &MySqlRow) -> Result<Row, DbError> {
    let fields = row
        .columns_ref()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let value = match row.as_ref(idx) {
                Some(raw) => decode_value(column.column_type(), raw)?,
                None => Value::Null,
            };
            Ok(FieldValue::new(column.name_str().into_owned(), value))
        })
        .collect::<Result<Vec<_>, DbError>>()?;

    Ok(Row::new(entity, fields))
}

/// Maps a single wire value onto a model value using the column's declared type.
pub fn decode_value(column_type: ColumnType, raw: &MySqlValue) -> Result<Value, DbError> {
    let value = match raw {
        MySqlValue::NULL => Value::Null,
        MySqlValue::Int(i) => Value::Int(*i),
        MySqlValue::UInt(u) => Value::Uint(*u),
        MySqlValue::Float(f) => Value::Float(*f as f64),
        MySqlValue::Double(d) => Value::Float(*d),
        MySqlValue::Bytes(bytes) => decode_bytes(column_type, bytes)?,
        MySqlValue::Date(year, month, day, hour, minute, second, micros) => {
            let Some(date) = NaiveDate::from_ymd_opt(*year as i32, *month as u32, *day as u32)
            else {
                // Zero dates ('0000-00-00') have no calendar equivalent.
                return Ok(Value::Null);
            };

            if matches!(
                column_type,
                ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE
            ) {
                Value::Date(date)
            } else {
                date.and_hms_micro_opt(*hour as u32, *minute as u32, *second as u32, *micros)
                    .map(|naive| Value::Timestamp(naive.and_utc()))
                    .ok_or_else(|| DbError::Conversion(format!("invalid time in {raw:?}")))?
            }
        }
        MySqlValue::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if *negative { "-" } else { "" };
            let hours = *days * 24 + *hours as u32;
            Value::String(format!(
                "{sign}{hours:02}:{minutes:02}:{seconds:02}.{micros:06}"
            ))
        }
    };

    Ok(value)
}

fn decode_bytes(column_type: ColumnType, bytes: &[u8]) -> Result<Value, DbError> {
    match column_type {
        ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| DbError::Conversion(format!("decimal is not UTF-8: {e}")))?;
            BigDecimal::from_str(text)
                .map(Value::Decimal)
                .map_err(|e| DbError::Conversion(format!("invalid decimal '{text}': {e}")))
        }
        ColumnType::MYSQL_TYPE_JSON => match serde_json::from_slice(bytes) {
            Ok(json) => Ok(Value::Json(json)),
            Err(_) => Ok(Value::String(String::from_utf8_lossy(bytes).into_owned())),
        },
        _ => match std::str::from_utf8(bytes) {
            Ok(text) => Ok(Value::String(text.to_string())),
            Err(_) => Ok(Value::Bytes(bytes.to_vec())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_columns_keep_precision() {
        let value = decode_value(
            ColumnType::MYSQL_TYPE_NEWDECIMAL,
            &MySqlValue::Bytes(b"31.25".to_vec()),
        )
        .unwrap();
        assert_eq!(value, Value::Decimal(BigDecimal::from_str("31.25").unwrap()));
    }

    #[test]
    fn malformed_decimal_is_a_conversion_error() {
        let err = decode_value(
            ColumnType::MYSQL_TYPE_NEWDECIMAL,
            &MySqlValue::Bytes(b"abc".to_vec()),
        )
        .unwrap_err();
        assert!(matches!(err, DbError::Conversion(_)));
    }

    #[test]
    fn text_and_binary_bytes() {
        assert_eq!(
            decode_value(
                ColumnType::MYSQL_TYPE_VAR_STRING,
                &MySqlValue::Bytes(b"Ann".to_vec())
            )
            .unwrap(),
            Value::String("Ann".into())
        );
        assert_eq!(
            decode_value(
                ColumnType::MYSQL_TYPE_BLOB,
                &MySqlValue::Bytes(vec![0xff, 0xfe])
            )
            .unwrap(),
            Value::Bytes(vec![0xff, 0xfe])
        );
    }

    #[test]
    fn dates_and_datetimes() {
        let date = decode_value(
            ColumnType::MYSQL_TYPE_DATE,
            &MySqlValue::Date(2024, 2, 29, 0, 0, 0, 0),
        )
        .unwrap();
        assert_eq!(date, Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));

        let ts = decode_value(
            ColumnType::MYSQL_TYPE_DATETIME,
            &MySqlValue::Date(2024, 2, 29, 13, 5, 9, 0),
        )
        .unwrap();
        match ts {
            Value::Timestamp(ts) => assert_eq!(ts.to_rfc3339(), "2024-02-29T13:05:09+00:00"),
            other => panic!("expected timestamp, got {other:?}"),
        }

        let zero = decode_value(
            ColumnType::MYSQL_TYPE_DATE,
            &MySqlValue::Date(0, 0, 0, 0, 0, 0, 0),
        )
        .unwrap();
        assert!(zero.is_null());
    }

    #[test]
    fn json_falls_back_to_text() {
        let json = decode_value(
            ColumnType::MYSQL_TYPE_JSON,
            &MySqlValue::Bytes(br#"{"a":1}"#.to_vec()),
        )
        .unwrap();
        assert_eq!(json, Value::Json(serde_json::json!({"a": 1})));

        let broken = decode_value(
            ColumnType::MYSQL_TYPE_JSON,
            &MySqlValue::Bytes(b"{oops".to_vec()),
        )
        .unwrap();
        assert_eq!(broken, Value::String("{oops".into()));
    }
}
