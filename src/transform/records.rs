use crate::domain::model::Record;
use crate::utils::error::{EtlError, Result};
use serde_json::Value;

/// Parses repaired feed content: a JSON array whose elements are all objects.
pub fn parse_records(content: &[u8]) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_slice(content).map_err(|e| {
        tracing::error!("Error processing recipes: repaired file is not valid JSON: {}", e);
        EtlError::processing(format!("repaired file is not valid JSON: {}", e))
    })?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            let message = format!("expected a JSON array of recipes, found {}", kind(&other));
            tracing::error!("Error processing recipes: {}", message);
            return Err(EtlError::processing(message));
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(data) => Ok(Record::from(data)),
            other => {
                let message = format!(
                    "recipe #{} is {} instead of an object",
                    index,
                    kind(&other)
                );
                tracing::error!("Error processing recipes: {}", message);
                Err(EtlError::processing(message))
            }
        })
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::repair::repair_text;

    #[test]
    fn test_parse_repaired_feed() {
        let repaired = repair_text(
            "{\"name\":\"Chili\",\"ingredients\":\"2 chilies\"}\n{\"name\":\"Soup\",\"ingredients\":\"water\"}\n",
        );
        let records = parse_records(repaired.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get_str("name"), Some("Chili"));
        assert_eq!(records[1].get_str("ingredients"), Some("water"));
    }

    #[test]
    fn test_empty_array() {
        assert!(parse_records(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_double_repaired_feed_is_rejected() {
        let twice = repair_text(&repair_text("{\"a\":1}\n{\"b\":2}"));
        let err = parse_records(twice.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("recipe #0 is an array"));
    }

    #[test]
    fn test_blank_line_element_is_invalid_json() {
        let repaired = repair_text("{\"a\":1}\n\n");
        let err = parse_records(repaired.as_bytes()).unwrap_err();
        assert!(matches!(err, EtlError::ProcessingError { .. }));
    }

    #[test]
    fn test_invalid_json_is_a_data_error() {
        let err = parse_records(b"[{\"a\":1},{broken}]").unwrap_err();

        assert!(matches!(err, EtlError::ProcessingError { .. }));
        assert_eq!(err.category(), crate::utils::error::ErrorCategory::Data);
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn test_top_level_object_is_rejected() {
        let err = parse_records(br#"{"a":1}"#).unwrap_err();
        assert!(err.to_string().contains("found an object"));
    }
}
