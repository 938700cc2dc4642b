//! Conversion of raw assignment scores into weighted percentage contributions.

use tracing::{debug, warn};

use crate::config::CategoryConfig;
use crate::error::GradeError;
use crate::grading::types::{ColumnKey, ColumnState, WorkingTable};

/// `score / possible * weight`. Returns 0.0 when `possible` is zero.
pub fn scale(score: f64, possible: f64, weight: f64) -> f64 {
    if possible == 0.0 {
        0.0
    } else {
        score / possible * weight
    }
}

/// Weight carried by each counted assignment of a category.
///
/// When `number - drops` is zero (or `drops` exceeds `number`) the whole
/// category percentage is used unscaled.
pub fn percentage_per(config: &CategoryConfig) -> f64 {
    match config.number.saturating_sub(config.drops) {
        0 => config.percentage,
        counted => config.percentage / f64::from(counted),
    }
}

/// Scales every assignment of `category` in place.
///
/// A category that already has scaled columns is left untouched, so calling
/// this twice is harmless. With `number == 0` the category's single column
/// becomes `"Scaled <category>"`; otherwise columns `"<category> 1"` through
/// `"<category> <number>"` become `"Scaled <category> <i>"`.
///
/// # Errors
///
/// Returns [`GradeError::AssignmentNotFound`] if an expected column is
/// missing. Nothing is scaled in that case.
pub fn scale_category(
    table: &mut WorkingTable,
    category: &str,
    number: u32,
    percentage_per: f64,
) -> Result<(), GradeError> {
    if table.is_scaled(category) {
        debug!(category, "Category already scaled, skipping");
        return Ok(());
    }

    let targets = if number == 0 {
        vec![single_column(table, category)?]
    } else {
        (1..=number)
            .map(|i| {
                let key = ColumnKey::new(category, Some(i));
                table
                    .columns
                    .iter()
                    .position(|c| c.key == key)
                    .ok_or_else(|| GradeError::AssignmentNotFound {
                        category: category.to_string(),
                        label: key.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?
    };

    for idx in targets {
        let column = &mut table.columns[idx];
        let possible = column.points_possible;
        for value in column.values.iter_mut() {
            *value = scale(*value, possible, percentage_per);
        }
        if number == 0 {
            column.key.index = None;
        }
        column.state = ColumnState::Scaled;
        debug!(category, column = %column.label(), possible, percentage_per, "Scaled assignment");
    }

    for extra in table
        .columns
        .iter()
        .filter(|c| c.key.category == category && !c.is_scaled())
    {
        warn!(
            category,
            column = %extra.header,
            number,
            "Assignment beyond the configured count is not graded"
        );
    }

    Ok(())
}

/// The column of an ungrouped category: the one without a sub-index, or
/// the category's only column.
fn single_column(table: &WorkingTable, category: &str) -> Result<usize, GradeError> {
    let in_category: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.key.category == category)
        .map(|(i, _)| i)
        .collect();

    in_category
        .iter()
        .copied()
        .find(|&i| table.columns[i].key.index.is_none())
        .or(match in_category.as_slice() {
            [only] => Some(*only),
            _ => None,
        })
        .ok_or_else(|| GradeError::AssignmentNotFound {
            category: category.to_string(),
            label: category.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::types::{StudentKey, WorkingColumn};

    fn column(category: &str, index: Option<u32>, possible: f64, values: &[f64]) -> WorkingColumn {
        let key = ColumnKey::new(category, index);
        WorkingColumn {
            header: key.to_string(),
            key,
            points_possible: possible,
            state: ColumnState::Raw,
            values: values.to_vec(),
        }
    }

    fn table(columns: Vec<WorkingColumn>) -> WorkingTable {
        let students = columns.first().map_or(0, |c| c.values.len());
        WorkingTable {
            keys: (0..students)
                .map(|i| StudentKey::parse(&(1000 + i).to_string()).unwrap())
                .collect(),
            columns,
        }
    }

    #[test]
    fn test_scale() {
        assert_eq!(scale(8.0, 10.0, 10.0), 8.0);
        assert_eq!(scale(45.0, 45.0, 30.0), 30.0);
        assert_eq!(scale(5.0, 0.0, 10.0), 0.0);
    }

    #[test]
    fn test_percentage_per() {
        assert_eq!(percentage_per(&CategoryConfig::new(20.0, 2, 0)), 10.0);
        assert_eq!(percentage_per(&CategoryConfig::new(30.0, 3, 1)), 15.0);
        assert_eq!(percentage_per(&CategoryConfig::new(45.0, 0, 0)), 45.0);
        // Degenerate: nothing left to count, the whole weight is used
        assert_eq!(percentage_per(&CategoryConfig::new(10.0, 2, 2)), 10.0);
        assert_eq!(percentage_per(&CategoryConfig::new(10.0, 1, 3)), 10.0);
    }

    #[test]
    fn test_full_score_on_ungrouped_category_is_full_weight() {
        let mut t = table(vec![column("Final Exam", None, 80.0, &[80.0, 40.0])]);
        scale_category(&mut t, "Final Exam", 0, 45.0).unwrap();

        let scaled = t.column("Scaled Final Exam").unwrap();
        assert_eq!(scaled.values, vec![45.0, 22.5]);
        assert!(t.column("Final Exam").is_none());
    }

    #[test]
    fn test_ungrouped_category_uses_sole_numbered_column() {
        let mut t = table(vec![column("Project", Some(1), 50.0, &[25.0])]);
        scale_category(&mut t, "Project", 0, 20.0).unwrap();
        assert_eq!(t.column("Scaled Project").unwrap().values, vec![10.0]);
    }

    #[test]
    fn test_numbered_category() {
        let mut t = table(vec![
            column("Quiz", Some(1), 10.0, &[8.0, 5.0]),
            column("Quiz", Some(2), 10.0, &[9.0, 10.0]),
        ]);
        scale_category(&mut t, "Quiz", 2, 10.0).unwrap();

        assert_eq!(t.column("Scaled Quiz 1").unwrap().values, vec![8.0, 5.0]);
        assert_eq!(t.column("Scaled Quiz 2").unwrap().values, vec![9.0, 10.0]);
    }

    #[test]
    fn test_each_column_uses_its_own_points_possible() {
        let mut t = table(vec![
            column("Quiz", Some(2), 20.0, &[10.0]),
            column("Quiz", Some(1), 10.0, &[10.0]),
        ]);
        scale_category(&mut t, "Quiz", 2, 10.0).unwrap();
        assert_eq!(t.column("Scaled Quiz 1").unwrap().values, vec![10.0]);
        assert_eq!(t.column("Scaled Quiz 2").unwrap().values, vec![5.0]);
    }

    #[test]
    fn test_scaling_twice_is_a_no_op() {
        let mut t = table(vec![
            column("Quiz", Some(1), 10.0, &[8.0]),
            column("Quiz", Some(2), 10.0, &[9.0]),
        ]);
        scale_category(&mut t, "Quiz", 2, 10.0).unwrap();
        let once = t.clone();
        scale_category(&mut t, "Quiz", 2, 10.0).unwrap();
        assert_eq!(t, once);
    }

    #[test]
    fn test_missing_sub_index_scales_nothing() {
        let mut t = table(vec![
            column("Homework", Some(1), 10.0, &[10.0]),
            column("Homework", Some(3), 10.0, &[10.0]),
        ]);
        let before = t.clone();
        let err = scale_category(&mut t, "Homework", 3, 10.0).unwrap_err();
        assert_eq!(
            err,
            GradeError::AssignmentNotFound {
                category: "Homework".into(),
                label: "Homework 2".into(),
            }
        );
        assert_eq!(t, before);
    }

    #[test]
    fn test_missing_ungrouped_column() {
        let mut t = table(vec![column("Quiz", Some(1), 10.0, &[8.0])]);
        let err = scale_category(&mut t, "Project", 0, 20.0).unwrap_err();
        assert!(matches!(err, GradeError::AssignmentNotFound { ref label, .. } if label == "Project"));
    }

    #[test]
    fn test_extra_columns_stay_raw() {
        let mut t = table(vec![
            column("Quiz", Some(1), 10.0, &[8.0]),
            column("Quiz", Some(2), 10.0, &[9.0]),
        ]);
        scale_category(&mut t, "Quiz", 1, 20.0).unwrap();
        assert_eq!(t.column("Scaled Quiz 1").unwrap().values, vec![16.0]);
        assert_eq!(t.column("Quiz 2").unwrap().values, vec![9.0]);
    }
}
