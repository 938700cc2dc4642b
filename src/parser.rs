//! CSV readers for the gradebook export and the attendance file.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use tracing::debug;

use crate::error::GradeError;
use crate::grading::attendance::AttendanceRecord;
use crate::grading::types::{RawScoreTable, StudentKey, StudentRow};

/// Display-name column of the gradebook export.
pub const STUDENT_COLUMN: &str = "Student";
/// Student identifier column of the gradebook export.
pub const SIS_ID_COLUMN: &str = "SIS User ID";
/// Name of the built-in test student, never graded.
pub const TEST_STUDENT: &str = "Student, Test";

/// Builds a [`RawScoreTable`] from the export's header and data records.
///
/// The first record is the points-possible row. The test student is
/// skipped and every other identifier is normalized.
///
/// # Errors
///
/// - [`GradeError::MissingColumn`] when an identity column is absent.
/// - [`GradeError::IdentifierFormat`] for an id that is not an integer.
pub fn build_score_table(
    headers: Vec<String>,
    records: Vec<Vec<String>>,
) -> Result<RawScoreTable, GradeError> {
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| GradeError::MissingColumn {
                column: name.to_string(),
            })
    };
    let name_col = find(STUDENT_COLUMN)?;
    let id_col = find(SIS_ID_COLUMN)?;

    let keep = |i: &usize| *i != name_col && *i != id_col;
    let strip = |record: &[String]| -> Vec<String> {
        (0..headers.len())
            .filter(|i| keep(i))
            .map(|i| record.get(i).cloned().unwrap_or_default())
            .collect()
    };

    let mut records = records.into_iter();
    let points_possible = records.next().map(|r| strip(r.as_slice())).unwrap_or_default();

    let mut students = Vec::new();
    for record in records {
        let name = record.get(name_col).map_or("", |n| n.trim());
        if name == TEST_STUDENT {
            debug!("Skipping test student row");
            continue;
        }
        let raw_id = record.get(id_col).map_or("", String::as_str);
        let key = StudentKey::parse(raw_id).ok_or_else(|| GradeError::IdentifierFormat {
            value: raw_id.to_string(),
            context: format!("score export row for '{name}'"),
        })?;
        students.push(StudentRow {
            key,
            name: name.to_string(),
            cells: strip(record.as_slice()),
        });
    }

    Ok(RawScoreTable {
        headers: (0..headers.len())
            .filter(|i| keep(i))
            .map(|i| headers[i].clone())
            .collect(),
        points_possible,
        students,
    })
}

/// Parses a gradebook export from any reader.
pub fn parse_score_export<R: Read>(reader: R) -> Result<RawScoreTable> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);

    // csv strips a leading UTF-8 BOM from the header record
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        records.push(record.iter().map(str::to_string).collect());
    }

    debug!(columns = headers.len(), rows = records.len(), "Score export read");
    Ok(build_score_table(headers, records)?)
}

/// Reads a gradebook export from `path`.
pub fn read_score_export(path: &str) -> Result<RawScoreTable> {
    let file = File::open(path).with_context(|| format!("failed to open score export '{path}'"))?;
    parse_score_export(file).with_context(|| format!("failed to read score export '{path}'"))
}

#[derive(Debug, Deserialize)]
struct AttendanceRow {
    student_id: String,
    count: Option<f64>,
}

/// Parses an attendance file with `student_id` and `count` columns.
///
/// An empty count is read as zero.
pub fn parse_attendance<R: Read>(reader: R) -> Result<Vec<AttendanceRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::new();

    for result in rdr.deserialize() {
        let row: AttendanceRow = result?;
        let key = StudentKey::parse(&row.student_id).ok_or_else(|| GradeError::IdentifierFormat {
            value: row.student_id.clone(),
            context: "the attendance file".to_string(),
        })?;
        records.push(AttendanceRecord {
            key,
            count: row.count.unwrap_or(0.0),
        });
    }

    Ok(records)
}

/// Reads an attendance file from `path`.
pub fn read_attendance(path: &str) -> Result<Vec<AttendanceRecord>> {
    let file = File::open(path).with_context(|| format!("failed to open attendance file '{path}'"))?;
    parse_attendance(file).with_context(|| format!("failed to read attendance file '{path}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "\u{feff}Student,ID,SIS User ID,Section,Quiz 1 (101),Quiz 2 (102)
    Points Possible,,,,10,10
\"Lovelace, Ada\",1,1001,A,8,9
\"Student, Test\",2,,A,10,10
\"Hopper, Grace\",3,1002.0,A,5
";

    #[test]
    fn test_parse_export() {
        let table = parse_score_export(EXPORT.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["ID", "Section", "Quiz 1 (101)", "Quiz 2 (102)"]);
        assert_eq!(table.points_possible, vec!["", "", "10", "10"]);
        assert_eq!(table.students.len(), 2);

        let ada = &table.students[0];
        assert_eq!(ada.key.as_str(), "1001");
        assert_eq!(ada.name, "Lovelace, Ada");
        assert_eq!(ada.cells, vec!["1", "A", "8", "9"]);

        let grace = &table.students[1];
        assert_eq!(grace.key.as_str(), "1002");
        assert_eq!(grace.cells, vec!["3", "A", "5", ""]);
    }

    #[test]
    fn test_missing_identity_column() {
        let csv = "Student,Quiz 1\nPoints Possible,10\n";
        let err = parse_score_export(csv.as_bytes()).unwrap_err();
        let grade_err = err.downcast_ref::<GradeError>().unwrap();
        assert_eq!(
            grade_err,
            &GradeError::MissingColumn {
                column: SIS_ID_COLUMN.into()
            }
        );
    }

    #[test]
    fn test_bad_student_id() {
        let headers = vec!["Student".to_string(), "SIS User ID".to_string()];
        let records = vec![
            vec!["Points Possible".to_string(), String::new()],
            vec!["Doe, Jane".to_string(), "J-17".to_string()],
        ];
        let err = build_score_table(headers, records).unwrap_err();
        assert_eq!(
            err,
            GradeError::IdentifierFormat {
                value: "J-17".into(),
                context: "score export row for 'Doe, Jane'".into(),
            }
        );
    }

    #[test]
    fn test_empty_export_has_no_points_row() {
        let table = build_score_table(vec!["Student".into(), "SIS User ID".into()], vec![]).unwrap();
        assert!(table.points_possible.is_empty());
        assert!(table.students.is_empty());
    }

    #[test]
    fn test_parse_attendance() {
        let csv = "student_id,count\n1001,12\n1002.0,\n";
        let records = parse_attendance(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key.as_str(), "1001");
        assert_eq!(records[0].count, 12.0);
        assert_eq!(records[1].key.as_str(), "1002");
        assert_eq!(records[1].count, 0.0);
    }

    #[test]
    fn test_byte_order_mark_is_ignored_by_both_readers() {
        let table = parse_score_export(EXPORT.as_bytes()).unwrap();
        assert_eq!(table.students[0].name, "Lovelace, Ada");

        let csv = "\u{feff}student_id,count\n1001,4\n";
        let records = parse_attendance(csv.as_bytes()).unwrap();
        assert_eq!(records[0].key.as_str(), "1001");
        assert_eq!(records[0].count, 4.0);
    }

    #[test]
    fn test_attendance_bad_id() {
        let csv = "student_id,count\nabc,3\n";
        let err = parse_attendance(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GradeError>(),
            Some(GradeError::IdentifierFormat { .. })
        ));
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_score_export("/nonexistent/scores.csv").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/scores.csv"));
    }
}
