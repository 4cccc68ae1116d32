use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{info, warn};

use crate::error::{AnalyticsError, ImportError};
use crate::grade::Grade;
use crate::models::{AcademicYear, AlpsGrade, Engagement, Student, SubjectYearRecord};

/// Year group assigned to imported rows, which carry no year column.
const IMPORTED_YEAR_GROUP: u8 = 11;

/// Where imported grades are filed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTarget {
    pub subject: String,
    pub year: AcademicYear,
}

pub fn import_csv_file(path: &Path, target: &ImportTarget) -> Result<Vec<Student>, ImportError> {
    let file = File::open(path).map_err(|source| ImportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let students = import_csv(file, target)?;
    info!(
        path = %path.display(),
        imported = students.len(),
        "imported students from CSV"
    );
    Ok(students)
}

/// Reads `name, predicted, target, ...` rows after a header row.
/// Rows with an empty name, an unknown grade or undecodable text are dropped;
/// only I/O failures abort the import.
pub fn import_csv<R: Read>(reader: R, target: &ImportTarget) -> Result<Vec<Student>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut students = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(error) if error.is_io_error() => return Err(error.into()),
            Err(error) => {
                warn!(row = index + 1, %error, "dropping unreadable import row");
                continue;
            }
        };
        match row_to_student(&row, target) {
            Ok(Some(student)) => students.push(student),
            Ok(None) => {}
            Err(error) => warn!(row = index + 1, %error, "dropping malformed import row"),
        }
    }

    Ok(students)
}

fn row_to_student(
    row: &StringRecord,
    target: &ImportTarget,
) -> Result<Option<Student>, AnalyticsError> {
    let name = row.get(0).unwrap_or_default();
    if name.is_empty() {
        return Ok(None);
    }

    let predicted: Grade = row.get(1).unwrap_or_default().parse()?;
    let target_grade: Grade = row.get(2).unwrap_or_default().parse()?;

    let mut parts = name.split_whitespace();
    let first_name = parts.next().unwrap_or_default().to_string();
    let last_name = parts.collect::<Vec<_>>().join(" ");
    let id = format!("imported_{}", name.split_whitespace().collect::<Vec<_>>().join("_"));

    let record = SubjectYearRecord {
        predicted_grade: predicted,
        target_grade,
        mock_exam_score: None,
        assessments: Vec::new(),
        alps_grade: AlpsGrade::PLACEHOLDER,
        alps_score: None,
    };

    let mut subjects = BTreeMap::new();
    subjects.insert(
        target.subject.clone(),
        BTreeMap::from([(target.year, record)]),
    );

    Ok(Some(Student {
        id,
        first_name,
        last_name,
        year_group: IMPORTED_YEAR_GROUP,
        subjects,
        engagement: Engagement::neutral(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn target() -> ImportTarget {
        ImportTarget {
            subject: "Physics".to_string(),
            year: AcademicYear::REFERENCE,
        }
    }

    #[test]
    fn imports_name_and_grades_into_selected_subject() {
        let csv = "Student Name,Current Predicted Grade,Target Grade (Min)\nJane Doe,C,B\n";
        let students = import_csv(csv.as_bytes(), &target()).unwrap();

        assert_eq!(students.len(), 1);
        let jane = &students[0];
        assert_eq!(jane.id, "imported_Jane_Doe");
        assert_eq!(jane.first_name, "Jane");
        assert_eq!(jane.last_name, "Doe");
        assert_eq!(jane.year_group, 11);
        assert_eq!(jane.engagement, Engagement::neutral());

        let record = jane.record("Physics", AcademicYear::REFERENCE).unwrap();
        assert_eq!(record.predicted_grade, Grade::C);
        assert_eq!(record.target_grade, Grade::B);
        assert_eq!(record.alps_grade.value(), 5);
        assert!(record.assessments.is_empty());
    }

    #[test]
    fn drops_empty_names_and_bad_grades() {
        let csv = "name,predicted,target\n,B,A\nMary Ann Smith,A*,A*\nBob Stone,Z,A\nSam,B\n";
        let students = import_csv(csv.as_bytes(), &target()).unwrap();

        let ids: Vec<&str> = students.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["imported_Mary_Ann_Smith"]);
        assert_eq!(students[0].last_name, "Ann Smith");
    }

    #[test]
    fn undecodable_row_does_not_abort_import() {
        let csv: &[u8] = b"name,predicted,target\nJane Doe,C,B\nBad\xff Name,B,A\nKim Park,D,B\n";
        let students = import_csv(csv, &target()).unwrap();

        let ids: Vec<&str> = students.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["imported_Jane_Doe", "imported_Kim_Park"]);
    }

    #[test]
    fn reads_exported_tracker_columns() {
        let csv = "\"Student Name\",\"Current Predicted Grade\",\"Target Grade (Min)\",\"Gap\"\n\"Kim Park\",\"D\",\"B\",\"-2\"\n";
        let students = import_csv(csv.as_bytes(), &target()).unwrap();
        assert_eq!(students[0].full_name(), "Kim Park");
    }

    #[test]
    fn imports_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name,predicted,target").unwrap();
        writeln!(file, "Avery Lee,B,A").unwrap();

        let students = import_csv_file(file.path(), &target()).unwrap();
        assert_eq!(students.len(), 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = import_csv_file(Path::new("/nonexistent/students.csv"), &target());
        assert!(matches!(result, Err(ImportError::Io { .. })));
    }
}
