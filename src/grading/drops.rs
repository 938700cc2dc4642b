//! Lowest-score dropping and per-student totals.

use crate::config::GradingConfig;
use crate::grading::types::WorkingTable;

/// Lists shorter than this are padded instead of dropped.
const MIN_DROPPABLE_LEN: usize = 8;
/// Length short lists are padded to with zeros.
const PADDED_LEN: usize = 7;

/// Removes the `n` lowest scores, first occurrence on ties.
///
/// Lists with fewer than eight scores are not dropped at all: they are
/// padded with zeros to exactly seven entries. Order of the survivors is
/// preserved.
pub fn drop_scores(scores: &[f64], n: u32) -> Vec<f64> {
    let mut kept = scores.to_vec();

    if kept.len() < MIN_DROPPABLE_LEN {
        kept.resize(PADDED_LEN, 0.0);
        return kept;
    }

    for _ in 0..n {
        let Some(lowest) = position_of_min(&kept) else {
            break;
        };
        kept.remove(lowest);
    }

    kept
}

fn position_of_min(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, min)) if v >= min || v.is_nan() => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Per-category contributions and total for one student.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentTotals {
    pub categories: Vec<f64>,
    pub total: f64,
}

/// Applies each category's drop policy to one student's scaled scores and
/// sums everything, plus `attendance` when given, into the total.
pub fn drop_and_sum(
    table: &WorkingTable,
    student: usize,
    config: &GradingConfig,
    attendance: Option<f64>,
) -> StudentTotals {
    let mut pool = Vec::new();
    let mut categories: Vec<f64> = Vec::with_capacity(config.categories().len());

    for (name, category) in config.categories() {
        let kept = drop_scores(&table.scaled_values(student, name), category.drops);
        categories.push(kept.iter().sum());
        pool.extend(kept);
    }

    pool.extend(attendance);

    StudentTotals {
        categories,
        total: pool.iter().sum(),
    }
}
