use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AnalyticsError;
use crate::grade::Grade;

/// Alps performance indicator, 1 = best, 9 = worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct AlpsGrade(u8);

impl AlpsGrade {
    pub const PLACEHOLDER: AlpsGrade = AlpsGrade(5);

    pub fn new(value: u8) -> Result<Self, AnalyticsError> {
        if (1..=9).contains(&value) {
            Ok(Self(value))
        } else {
            Err(AnalyticsError::InvalidAlpsGrade(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for AlpsGrade {
    type Error = AnalyticsError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AlpsGrade> for u8 {
    fn from(grade: AlpsGrade) -> Self {
        grade.0
    }
}

/// A school year such as `2023/2024`, keyed and ordered by its first year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AcademicYear {
    start: i32,
}

impl AcademicYear {
    pub const REFERENCE: AcademicYear = AcademicYear { start: 2023 };
    /// Longest window `trailing` will produce.
    pub const MAX_TRAILING: usize = 100;

    pub fn previous(self, years: i32) -> Self {
        Self {
            start: self.start - years,
        }
    }

    /// The `count` years ending at `anchor`, oldest first, capped at `MAX_TRAILING`.
    pub fn trailing(anchor: AcademicYear, count: usize) -> Vec<AcademicYear> {
        let count = count.min(Self::MAX_TRAILING) as i32;
        (0..count)
            .rev()
            .map(|offset| anchor.previous(offset))
            .collect()
    }
}

impl FromStr for AcademicYear {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AnalyticsError::InvalidAcademicYear(s.to_string());
        let (first, second) = s.trim().split_once('/').ok_or_else(invalid)?;
        let is_year = |part: &str| part.len() == 4 && part.bytes().all(|b| b.is_ascii_digit());
        if !is_year(first) || !is_year(second) {
            return Err(invalid());
        }
        let start: i32 = first.parse().map_err(|_| invalid())?;
        let end: i32 = second.parse().map_err(|_| invalid())?;
        if end != start + 1 {
            return Err(invalid());
        }
        Ok(Self { start })
    }
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start, self.start + 1)
    }
}

impl Serialize for AcademicYear {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AcademicYear {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub name: String,
    pub grade: Grade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectYearRecord {
    pub predicted_grade: Grade,
    pub target_grade: Grade,
    pub mock_exam_score: Option<f64>,
    /// Chronological, earliest first.
    pub assessments: Vec<Assessment>,
    pub alps_grade: AlpsGrade,
    pub alps_score: Option<f64>,
}

impl SubjectYearRecord {
    pub fn latest_assessment(&self) -> Option<&Assessment> {
        self.assessments.last()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    pub homework_completion: f64,
    pub online_participation: f64,
    pub attendance: f64,
}

impl Engagement {
    pub fn neutral() -> Self {
        Self {
            homework_completion: 1.0,
            online_participation: 1.0,
            attendance: 1.0,
        }
    }
}

pub type SubjectHistory = BTreeMap<AcademicYear, SubjectYearRecord>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub year_group: u8,
    pub subjects: BTreeMap<String, SubjectHistory>,
    pub engagement: Engagement,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn record(&self, subject: &str, year: AcademicYear) -> Option<&SubjectYearRecord> {
        self.subjects.get(subject)?.get(&year)
    }
}

/// Imported students when there are any, otherwise the generated fallback.
pub fn select_collection<'a>(imported: &'a [Student], generated: &'a [Student]) -> &'a [Student] {
    if imported.is_empty() {
        generated
    } else {
        imported
    }
}

/// Exam tier derived from year group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum ExamLevel {
    /// GCSE, year groups up to 11
    #[value(name = "gcse")]
    Lower,
    /// A-Level, year groups 12 and above
    #[value(name = "a-level")]
    Upper,
}

impl ExamLevel {
    pub fn includes(self, year_group: u8) -> bool {
        match self {
            ExamLevel::Lower => year_group <= 11,
            ExamLevel::Upper => year_group >= 12,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExamLevel::Lower => "GCSE",
            ExamLevel::Upper => "A-Level",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeacherDefinition {
    pub id: String,
    pub name: String,
    pub subjects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDefinition {
    pub id: String,
    pub name: String,
    pub teacher_id: String,
    pub subjects: Vec<String>,
    pub year_group: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn academic_year_parses_and_displays() {
        let year: AcademicYear = "2023/2024".parse().unwrap();
        assert_eq!(year, AcademicYear::REFERENCE);
        assert_eq!(year.to_string(), "2023/2024");
    }

    #[test]
    fn academic_year_rejects_non_consecutive_labels() {
        assert!("2023/2025".parse::<AcademicYear>().is_err());
        assert!("23/24".parse::<AcademicYear>().is_err());
        assert!("spring".parse::<AcademicYear>().is_err());
        assert!("+202/+203".parse::<AcademicYear>().is_err());
        assert!("-202/-201".parse::<AcademicYear>().is_err());
    }

    #[test]
    fn trailing_years_are_oldest_first() {
        let years = AcademicYear::trailing(AcademicYear::REFERENCE, 3);
        let labels: Vec<String> = years.iter().map(|y| y.to_string()).collect();
        assert_eq!(labels, vec!["2021/2022", "2022/2023", "2023/2024"]);
    }

    #[test]
    fn trailing_window_is_capped() {
        let years = AcademicYear::trailing(AcademicYear::REFERENCE, usize::MAX);
        assert_eq!(years.len(), AcademicYear::MAX_TRAILING);
        assert_eq!(years.last(), Some(&AcademicYear::REFERENCE));
        assert!(years.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn alps_grade_bounds() {
        assert!(AlpsGrade::new(0).is_err());
        assert!(AlpsGrade::new(10).is_err());
        assert_eq!(AlpsGrade::new(9).unwrap().value(), 9);
    }

    #[test]
    fn imported_collection_wins_when_non_empty() {
        let generated = vec![sample_student("g")];
        let imported = vec![sample_student("i")];
        assert_eq!(select_collection(&imported, &generated)[0].id, "i");
        assert_eq!(select_collection(&[], &generated)[0].id, "g");
    }

    #[test]
    fn level_filter_splits_at_year_twelve() {
        assert!(ExamLevel::Lower.includes(11));
        assert!(!ExamLevel::Lower.includes(12));
        assert!(ExamLevel::Upper.includes(13));
    }

    fn sample_student(id: &str) -> Student {
        Student {
            id: id.to_string(),
            first_name: "Avery".to_string(),
            last_name: "Lee".to_string(),
            year_group: 10,
            subjects: BTreeMap::new(),
            engagement: Engagement::neutral(),
        }
    }
}
