use crate::core::value::{FieldValue, Value};
use serde::{Deserialize, Serialize};

/// One record read from a data source: an ordered list of named fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Row {
    pub entity: String,
    pub fields: Vec<FieldValue>,
}

impl Row {
    pub fn new(entity: &str, fields: Vec<FieldValue>) -> Self {
        Row {
            entity: entity.to_string(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(field))
    }

    pub fn get_value(&self, field: &str) -> Value {
        self.get(field)
            .map(|f| f.value.clone())
            .unwrap_or(Value::Null)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Renders the row as a JSON object, preserving field order.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.value.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> Row {
        Row::new(
            "user_data",
            vec![
                FieldValue::new("name", Value::String("Ada".into())),
                FieldValue::new("age", Value::Int(36)),
            ],
        )
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let row = user();
        assert_eq!(row.get_value("AGE"), Value::Int(36));
        assert_eq!(row.get_value("missing"), Value::Null);
    }

    #[test]
    fn json_object_has_all_fields() {
        let json = user().to_json();
        assert_eq!(json["name"], "Ada");
        assert_eq!(json["age"], 36);
    }
}
