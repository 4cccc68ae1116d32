use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::grade::Grade;
use crate::models::{AcademicYear, Student};

const DEFAULT_ALPS_GRADE: u8 = 5;
const IMPROVEMENT_FACTOR: f64 = 0.15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterventionParams {
    pub subject: String,
    pub target_alps_grade: u8,
    pub year: AcademicYear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn from_gap(gap: i32) -> Self {
        match gap {
            g if g < -1 => Priority::High,
            g if g < 0 => Priority::Medium,
            _ => Priority::Low,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterventionCandidate {
    pub student_id: String,
    pub student_name: String,
    pub predicted_grade: Grade,
    pub target_grade: Grade,
    /// Target rank minus predicted rank; negative is below target.
    pub gap: i32,
    pub priority: Priority,
    pub suggestion: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterventionReport {
    pub subject: String,
    pub year: AcademicYear,
    pub target_alps_grade: u8,
    pub current_alps_grade: u8,
    pub qualifying_students: usize,
    pub students_needed: usize,
    pub candidates: Vec<InterventionCandidate>,
}

pub fn suggest_intervention(predicted: Grade) -> &'static str {
    match predicted.rank() {
        r if r >= 4 => "Focus on foundational concepts; Small group work; Extra practice problems.",
        r if r >= 2 => "Targeted topic revision (e.g., Algebra); Past paper practice; Peer tutoring.",
        _ => "Extension activities; University-style problems; Independent research project guidance.",
    }
}

pub fn gap(predicted: Grade, target: Grade) -> i32 {
    target.rank() as i32 - predicted.rank() as i32
}

pub fn analyze_interventions(students: &[Student], params: &InterventionParams) -> InterventionReport {
    let mut alps_total = 0u32;
    let mut qualifying = 0usize;
    let mut candidates = Vec::new();

    for student in students {
        let Some(record) = student.record(&params.subject, params.year) else {
            continue;
        };

        alps_total += u32::from(record.alps_grade.value());
        qualifying += 1;

        let gap = gap(record.predicted_grade, record.target_grade);
        if gap < 0 {
            candidates.push(InterventionCandidate {
                student_id: student.id.clone(),
                student_name: student.full_name(),
                predicted_grade: record.predicted_grade,
                target_grade: record.target_grade,
                gap,
                priority: Priority::from_gap(gap),
                suggestion: suggest_intervention(record.predicted_grade),
            });
        }
    }

    // Stable: equal gaps keep collection order.
    candidates.sort_by_key(|candidate| candidate.gap);

    let current_alps_grade = if qualifying == 0 {
        DEFAULT_ALPS_GRADE
    } else {
        (f64::from(alps_total) / qualifying as f64).round() as u8
    };

    let shortfall = current_alps_grade.saturating_sub(params.target_alps_grade);
    let students_needed =
        (f64::from(shortfall) * qualifying as f64 * IMPROVEMENT_FACTOR).ceil() as usize;

    debug!(
        subject = %params.subject,
        year = %params.year,
        qualifying,
        candidates = candidates.len(),
        "intervention analysis complete"
    );

    InterventionReport {
        subject: params.subject.clone(),
        year: params.year,
        target_alps_grade: params.target_alps_grade,
        current_alps_grade,
        qualifying_students: qualifying,
        students_needed,
        candidates,
    }
}
