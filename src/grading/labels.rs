//! Category matching and points-possible extraction.
//!
//! Column headers are parsed once into [`ColumnKey`]s. Later stages only
//! ever look at the structured keys, never at the header text.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::GradeError;
use crate::grading::types::{AssignmentColumn, ColumnKey, RawScoreTable};

/// Points-possible marker Canvas writes under computed group and course
/// totals such as "Quiz Current Score".
pub const READ_ONLY_POINTS: &str = "(read only)";

/// Returns the remainder of `header` if it starts with `category` as a
/// whole word.
pub fn matches_category<'a>(header: &'a str, category: &str) -> Option<&'a str> {
    let rest = header.strip_prefix(category)?;
    match rest.chars().next() {
        Some(c) if c.is_alphanumeric() || c == '_' => None,
        _ => Some(rest),
    }
}

/// Rejects category names where one is a whole-word prefix of another,
/// since their column labels could not be told apart.
pub fn validate_categories<'a, I>(names: I) -> Result<(), GradeError>
where
    I: IntoIterator<Item = &'a str>,
{
    let names: Vec<&str> = names.into_iter().collect();
    for (i, first) in names.iter().enumerate() {
        for second in &names[i + 1..] {
            if matches_category(second, first).is_some() || matches_category(first, second).is_some() {
                return Err(GradeError::ConfigurationConflict {
                    first: first.to_string(),
                    second: second.to_string(),
                    label: None,
                });
            }
        }
    }
    Ok(())
}

/// Parses a column header into its category and optional sub-index.
///
/// `"Homework 3 (88231)"` becomes `Homework 3`; trailing text after the
/// sub-index is ignored. Returns `Ok(None)` for headers outside every
/// category.
pub fn parse_label(header: &str, categories: &[&str]) -> Result<Option<ColumnKey>, GradeError> {
    let mut found: Option<(&str, &str)> = None;

    for &category in categories {
        let Some(rest) = matches_category(header, category) else {
            continue;
        };
        if let Some((previous, _)) = found {
            return Err(GradeError::ConfigurationConflict {
                first: previous.to_string(),
                second: category.to_string(),
                label: Some(header.to_string()),
            });
        }
        found = Some((category, rest));
    }

    let Some((category, rest)) = found else {
        return Ok(None);
    };

    Ok(Some(ColumnKey::new(category, parse_index(rest))))
}

fn parse_index(rest: &str) -> Option<u32> {
    let rest = rest.trim_start();
    let digits_end = rest
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(rest.len(), |(i, _)| i);
    if digits_end == 0 {
        return None;
    }
    // "Quiz 2b" is not sub-index 2
    if rest[digits_end..]
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
    {
        return None;
    }
    rest[..digits_end].parse().ok()
}

/// Selects every column belonging to a configured category and reads its
/// points-possible value.
///
/// Columns outside every category are dropped from further processing, as
/// are Canvas's computed totals, whose points-possible cell reads
/// [`READ_ONLY_POINTS`].
///
/// # Errors
///
/// - [`GradeError::ConfigurationConflict`] when a header matches two categories.
/// - [`GradeError::DuplicateAssignment`] when two headers map to the same key.
/// - [`GradeError::MissingPointsPossible`] when a selected column has no
///   numeric value in the points-possible row.
pub fn select_assignment_columns(
    table: &RawScoreTable,
    categories: &[&str],
) -> Result<Vec<AssignmentColumn>, GradeError> {
    let mut selected: Vec<AssignmentColumn> = Vec::new();
    let mut seen: HashMap<ColumnKey, usize> = HashMap::new();

    for (position, header) in table.headers.iter().enumerate() {
        let Some(key) = parse_label(header, categories)? else {
            debug!(column = %header, "Column matches no category, skipping");
            continue;
        };

        let points_cell = table.points_possible_for(position).map(str::trim);
        if points_cell == Some(READ_ONLY_POINTS) {
            debug!(column = %header, category = %key.category, "Read-only summary column, skipping");
            continue;
        }

        if let Some(&previous) = seen.get(&key) {
            return Err(GradeError::DuplicateAssignment {
                label: key.to_string(),
                first: selected[previous].header.clone(),
                second: header.clone(),
            });
        }

        let points_possible = points_cell
            .filter(|cell| !cell.is_empty())
            .and_then(|cell| cell.parse::<f64>().ok())
            .ok_or_else(|| GradeError::MissingPointsPossible {
                category: key.category.clone(),
                column: header.clone(),
            })?;

        if points_possible == 0.0 {
            warn!(column = %header, "Zero points possible, column will scale to 0");
        }
        debug!(column = %header, assignment = %key, points_possible, "Selected assignment column");

        seen.insert(key.clone(), selected.len());
        selected.push(AssignmentColumn {
            key,
            header: header.clone(),
            position,
            points_possible,
        });
    }

    Ok(selected)
}
