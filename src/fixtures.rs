//! Builders for hand-written test cohorts.

use std::collections::BTreeMap;

use crate::grade::Grade;
use crate::models::{
    AcademicYear, AlpsGrade, Assessment, Engagement, Student, SubjectYearRecord,
};

pub struct StudentBuilder {
    student: Student,
}

pub fn student(id: &str, name: &str, year_group: u8) -> StudentBuilder {
    let (first, last) = name.split_once(' ').unwrap_or((name, ""));
    StudentBuilder {
        student: Student {
            id: id.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            year_group,
            subjects: BTreeMap::new(),
            engagement: Engagement::neutral(),
        },
    }
}

pub fn record(predicted: &str, target: &str) -> SubjectYearRecord {
    SubjectYearRecord {
        predicted_grade: predicted.parse().unwrap(),
        target_grade: target.parse().unwrap(),
        mock_exam_score: Some(65.0),
        assessments: Vec::new(),
        alps_grade: AlpsGrade::PLACEHOLDER,
        alps_score: Some(0.8),
    }
}

pub fn with_assessments(mut record: SubjectYearRecord, grades: &[&str]) -> SubjectYearRecord {
    record.assessments = grades
        .iter()
        .enumerate()
        .map(|(index, grade)| Assessment {
            name: format!("Assessment {}", index + 1),
            grade: grade.parse::<Grade>().unwrap(),
        })
        .collect();
    record
}

pub fn with_alps(mut record: SubjectYearRecord, alps: u8, score: f64) -> SubjectYearRecord {
    record.alps_grade = AlpsGrade::new(alps).unwrap();
    record.alps_score = Some(score);
    record
}

pub fn year(label: &str) -> AcademicYear {
    label.parse().unwrap()
}

impl StudentBuilder {
    pub fn subject(mut self, subject: &str, label: &str, record: SubjectYearRecord) -> Self {
        self.student
            .subjects
            .entry(subject.to_string())
            .or_default()
            .insert(year(label), record);
        self
    }

    pub fn engagement(mut self, homework: f64, participation: f64, attendance: f64) -> Self {
        self.student.engagement = Engagement {
            homework_completion: homework,
            online_participation: participation,
            attendance,
        };
        self
    }

    pub fn build(self) -> Student {
        self.student
    }
}
