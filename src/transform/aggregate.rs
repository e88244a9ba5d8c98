use crate::domain::model::{Difficulty, DifficultySummary, EnrichedRecipe};
use std::collections::BTreeMap;

#[derive(Default)]
struct Group {
    sum: i128,
    known: usize,
    count: usize,
}

/// Mean total time per difficulty, ordered by label text.
///
/// Recipes without a total time count towards `recipe_count` but not towards
/// the mean; a group with no known total time at all has no mean.
pub fn aggregate(recipes: &[EnrichedRecipe]) -> Vec<DifficultySummary> {
    let mut groups: BTreeMap<&'static str, (Difficulty, Group)> = BTreeMap::new();

    for recipe in recipes {
        let (_, group) = groups
            .entry(recipe.difficulty.as_str())
            .or_insert_with(|| (recipe.difficulty, Group::default()));
        group.count += 1;
        if let Some(total) = recipe.total_time {
            group.sum += i128::from(total);
            group.known += 1;
        }
    }

    groups
        .into_values()
        .map(|(difficulty, group)| DifficultySummary {
            difficulty,
            average_total_time: (group.known > 0).then(|| group.sum as f64 / group.known as f64),
            recipe_count: group.count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Record;

    fn recipe(total_time: Option<i64>) -> EnrichedRecipe {
        EnrichedRecipe {
            record: Record::default(),
            prep_time: total_time,
            cook_time: total_time.map(|_| 0),
            total_time,
            difficulty: Difficulty::from_total_time(total_time),
        }
    }

    #[test]
    fn test_single_group() {
        let summary = aggregate(&[recipe(Some(50))]);
        assert_eq!(
            summary,
            vec![DifficultySummary {
                difficulty: Difficulty::Medium,
                average_total_time: Some(50.0),
                recipe_count: 1,
            }]
        );
    }

    #[test]
    fn test_mean_per_group_sorted_by_label() {
        let recipes = vec![
            recipe(Some(90)),
            recipe(Some(10)),
            recipe(Some(45)),
            recipe(Some(20)),
            recipe(Some(120)),
            recipe(Some(50)),
            recipe(None),
        ];

        let summary = aggregate(&recipes);
        let labels: Vec<&str> = summary.iter().map(|s| s.difficulty.as_str()).collect();
        assert_eq!(labels, vec!["Easy", "Hard", "Medium", "Unknown"]);

        assert_eq!(summary[0].average_total_time, Some(15.0));
        assert_eq!(summary[1].average_total_time, Some(105.0));
        assert_eq!(summary[2].average_total_time, Some(47.5));
        assert_eq!(summary[3].average_total_time, None);
        assert_eq!(summary[3].recipe_count, 1);
    }

    #[test]
    fn test_mean_equals_average_of_group_members() {
        let totals = [31, 32, 40, 59, 60];
        let recipes: Vec<EnrichedRecipe> = totals.iter().map(|t| recipe(Some(*t))).collect();

        let summary = aggregate(&recipes);
        let expected = totals.iter().sum::<i64>() as f64 / totals.len() as f64;
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].average_total_time, Some(expected));
        assert_eq!(summary[0].recipe_count, totals.len());
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&[]).is_empty());
    }
}
