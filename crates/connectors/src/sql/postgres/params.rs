use crate::sql::base::error::DbError;
use bigdecimal::BigDecimal;
use model::core::value::Value;
use rust_decimal::Decimal as RustDecimal;
use tokio_postgres::types::{Json as PgJson, ToSql};

pub struct PgParam(Box<dyn ToSql + Sync + Send>);

impl PgParam {
    pub fn from_value(value: Value) -> Result<Self, DbError> {
        let param = match value {
            Value::Int(v) => PgParam(Box::new(v)),
            // Postgres has no unsigned integers; saturate instead of wrapping.
            Value::Uint(v) => PgParam(Box::new(i64::try_from(v).unwrap_or(i64::MAX))),
            Value::Float(v) => PgParam(Box::new(v)),
            Value::Decimal(v) => PgParam(Box::new(to_numeric(&v)?)),
            Value::String(v) => PgParam(Box::new(v)),
            Value::Boolean(v) => PgParam(Box::new(v)),
            Value::Json(v) => PgParam(Box::new(PgJson(v))),
            Value::Uuid(v) => PgParam(Box::new(v)),
            Value::Bytes(v) => PgParam(Box::new(v)),
            Value::Date(v) => PgParam(Box::new(v)),
            Value::Timestamp(v) => PgParam(Box::new(v)),
            Value::Null => PgParam(Box::new(Option::<String>::None)),
        };
        Ok(param)
    }
}

/// NUMERIC binds go through `rust_decimal`, which holds 28 significant
/// digits. Anything it cannot hold exactly is refused rather than rounded.
fn to_numeric(value: &BigDecimal) -> Result<RustDecimal, DbError> {
    let text = value.to_string();
    let parsed = if text.contains(['e', 'E']) {
        RustDecimal::from_scientific(&text)
    } else {
        RustDecimal::from_str_exact(&text)
    };
    parsed.map_err(|err| DbError::Conversion(format!("{text} does not fit NUMERIC binding: {err}")))
}

impl AsRef<dyn ToSql + Sync> for PgParam {
    fn as_ref(&self) -> &(dyn ToSql + Sync + 'static) {
        &*self.0
    }
}

pub struct PgParamStore {
    pub params: Vec<PgParam>,
}

impl PgParamStore {
    pub fn from_values(values: Vec<Value>) -> Result<Self, DbError> {
        Ok(Self {
            params: values
                .into_iter()
                .map(PgParam::from_value)
                .collect::<Result<_, _>>()?,
        })
    }

    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|param| param.as_ref()).collect()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn decimal(text: &str) -> BigDecimal {
        BigDecimal::from_str(text).unwrap()
    }

    #[test]
    fn one_binding_per_value() {
        let store = PgParamStore::from_values(vec![Value::Uint(u64::MAX), Value::Null]).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.as_refs().len(), 2);
    }

    #[test]
    fn exact_decimals_bind_unchanged() {
        assert_eq!(to_numeric(&decimal("12.50")).unwrap().to_string(), "12.50");
        assert_eq!(to_numeric(&decimal("-0.001")).unwrap().to_string(), "-0.001");
    }

    #[test]
    fn decimals_outside_numeric_range_are_refused() {
        assert!(matches!(
            to_numeric(&decimal("1e40")),
            Err(DbError::Conversion(_))
        ));
        assert!(matches!(
            to_numeric(&decimal("0.12345678901234567890123456789012")),
            Err(DbError::Conversion(_))
        ));

        let store = PgParamStore::from_values(vec![Value::Int(1), Value::Decimal(decimal("1e40"))]);
        assert!(store.is_err());
    }
}
