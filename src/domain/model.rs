use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const INGREDIENTS: &str = "ingredients";
pub const PREP_TIME: &str = "prepTime";
pub const COOK_TIME: &str = "cookTime";
pub const TOTAL_TIME: &str = "totalTime";
pub const DIFFICULTY: &str = "difficulty";

/// One recipe object from the feed, fields kept in their original order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: Map<String, Value>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// The field as text, `None` when absent, null or not a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(data: Map<String, Value>) -> Self {
        Self { data }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Unknown,
}

impl Difficulty {
    /// Over an hour is Hard, over half an hour Medium, anything else Easy.
    /// No total time at all is Unknown.
    pub fn from_total_time(total_time: Option<i64>) -> Self {
        match total_time {
            Some(t) if t > 60 => Difficulty::Hard,
            Some(t) if t > 30 => Difficulty::Medium,
            Some(_) => Difficulty::Easy,
            None => Difficulty::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A kept recipe with its times converted to minutes.
///
/// `prep_time` and `cook_time` are `None` when the source value was missing
/// or could not be parsed; `total_time` is `None` when either of them is.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecipe {
    pub record: Record,
    pub prep_time: Option<i64>,
    pub cook_time: Option<i64>,
    pub total_time: Option<i64>,
    pub difficulty: Difficulty,
}

impl EnrichedRecipe {
    /// Value of a detail column: the four derived columns come from the typed
    /// fields, everything else passes through from the source record.
    pub fn cell(&self, column: &str) -> Value {
        match column {
            PREP_TIME => self.prep_time.map(Value::from).unwrap_or(Value::Null),
            COOK_TIME => self.cook_time.map(Value::from).unwrap_or(Value::Null),
            TOTAL_TIME => self.total_time.map(Value::from).unwrap_or(Value::Null),
            DIFFICULTY => Value::String(self.difficulty.as_str().to_string()),
            _ => self.record.get(column).cloned().unwrap_or(Value::Null),
        }
    }
}

/// Rows of the detail report together with its column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailReport {
    pub columns: Vec<String>,
    pub recipes: Vec<EnrichedRecipe>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DifficultySummary {
    pub difficulty: Difficulty,
    /// Mean over the recipes with a known total time; `None` if there are none.
    pub average_total_time: Option<f64>,
    pub recipe_count: usize,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub detail: DetailReport,
    pub summary: Vec<DifficultySummary>,
    pub detail_csv: String,
    pub summary_csv: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_difficulty_thresholds() {
        assert_eq!(Difficulty::from_total_time(Some(0)), Difficulty::Easy);
        assert_eq!(Difficulty::from_total_time(Some(30)), Difficulty::Easy);
        assert_eq!(Difficulty::from_total_time(Some(31)), Difficulty::Medium);
        assert_eq!(Difficulty::from_total_time(Some(60)), Difficulty::Medium);
        assert_eq!(Difficulty::from_total_time(Some(61)), Difficulty::Hard);
        assert_eq!(Difficulty::from_total_time(None), Difficulty::Unknown);
    }

    #[test]
    fn test_cell_uses_typed_fields() {
        let record: Record = serde_json::from_value(json!({
            "name": "Chili",
            "prepTime": "PT15M",
            "cookTime": "bogus"
        }))
        .unwrap();
        let recipe = EnrichedRecipe {
            record,
            prep_time: Some(15),
            cook_time: None,
            total_time: None,
            difficulty: Difficulty::Unknown,
        };

        assert_eq!(recipe.cell("name"), json!("Chili"));
        assert_eq!(recipe.cell(PREP_TIME), json!(15));
        assert_eq!(recipe.cell(COOK_TIME), Value::Null);
        assert_eq!(recipe.cell(TOTAL_TIME), Value::Null);
        assert_eq!(recipe.cell(DIFFICULTY), json!("Unknown"));
        assert_eq!(recipe.cell("missing"), Value::Null);
    }

    #[test]
    fn test_record_keeps_field_order() {
        let record: Record =
            serde_json::from_str(r#"{"name":"a","ingredients":"b","url":"c"}"#).unwrap();
        let keys: Vec<&str> = record.data.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "ingredients", "url"]);
    }
}
