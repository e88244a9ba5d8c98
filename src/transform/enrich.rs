use crate::domain::model::{
    DetailReport, Difficulty, EnrichedRecipe, Record, COOK_TIME, DIFFICULTY, INGREDIENTS,
    PREP_TIME, TOTAL_TIME,
};
use crate::transform::duration::{duration_minutes, DurationMode};
use std::collections::HashSet;

/// Spellings that mark a recipe as a chili recipe. Matched as plain
/// substrings of the lower-cased ingredient text.
pub const TARGET_TERMS: [&str; 5] = ["chilies", "chiles", "chili", "chilli", "chile"];

pub fn mentions_chili(ingredients: &str) -> bool {
    let lowered = ingredients.to_lowercase();
    TARGET_TERMS.iter().any(|term| lowered.contains(term))
}

/// Every field seen across `records` in first-seen order, followed by the
/// derived columns that were not already present.
pub fn detail_columns(records: &[Record]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut columns = Vec::new();

    for key in records.iter().flat_map(|record| record.data.keys()) {
        if seen.insert(key.as_str()) {
            columns.push(key.clone());
        }
    }
    for derived in [PREP_TIME, COOK_TIME, TOTAL_TIME, DIFFICULTY] {
        if !seen.contains(derived) {
            columns.push(derived.to_string());
        }
    }

    columns
}

pub fn enrich_recipe(record: &Record, mode: DurationMode) -> EnrichedRecipe {
    let prep_time = duration_minutes(record.get(PREP_TIME), mode);
    let cook_time = duration_minutes(record.get(COOK_TIME), mode);
    let total_time = match (prep_time, cook_time) {
        (Some(prep), Some(cook)) => prep.checked_add(cook),
        _ => None,
    };

    EnrichedRecipe {
        record: record.clone(),
        prep_time,
        cook_time,
        total_time,
        difficulty: Difficulty::from_total_time(total_time),
    }
}

/// Keeps the chili recipes, converts their times and drops rows that are
/// identical in every detail column. The first occurrence of a row wins.
pub fn filter_and_enrich(records: &[Record], mode: DurationMode) -> DetailReport {
    let columns = detail_columns(records);
    let mut seen_rows: HashSet<Vec<String>> = HashSet::new();
    let mut recipes = Vec::new();
    let mut matched = 0usize;

    for record in records
        .iter()
        .filter(|record| record.get_str(INGREDIENTS).is_some_and(mentions_chili))
    {
        matched += 1;
        let recipe = enrich_recipe(record, mode);
        // JSON text per cell keeps null and "" apart.
        let row: Vec<String> = columns
            .iter()
            .map(|column| recipe.cell(column).to_string())
            .collect();

        if seen_rows.insert(row) {
            recipes.push(recipe);
        }
    }

    tracing::info!(
        "Found {} chili recipes out of {}, {} left after removing duplicates",
        matched,
        records.len(),
        recipes.len()
    );

    DetailReport { columns, recipes }
}
