use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::models::{AcademicYear, ExamLevel, Student};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskParams {
    pub level: ExamLevel,
    pub year: AcademicYear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn reason(self) -> &'static str {
        match self {
            RiskLevel::Low => "Generally on track.",
            RiskLevel::Medium => "Monitor performance trends and underperforming students.",
            RiskLevel::High => {
                "Significant underperformance or declining trend detected. Intervention advised."
            }
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectRisk {
    pub subject: String,
    pub risk_level: RiskLevel,
    pub reason: &'static str,
    pub student_count: usize,
    pub avg_predicted_rank: f64,
    pub underperforming_ratio: f64,
    /// Mean rank change between the first two assessments; positive is a decline.
    pub avg_trend: f64,
}

#[derive(Debug, Default)]
struct SubjectTally {
    count: usize,
    predicted_total: usize,
    underperforming: usize,
    trends: Vec<i32>,
}

/// Classifies a subject from its aggregates. High supersedes Medium.
pub fn classify(avg_predicted_rank: f64, underperforming_ratio: f64, avg_trend: f64) -> RiskLevel {
    let mut level = RiskLevel::Low;
    if avg_predicted_rank > 3.5 || underperforming_ratio > 0.3 || avg_trend > 0.3 {
        level = RiskLevel::Medium;
    }
    if avg_predicted_rank > 4.5 || underperforming_ratio > 0.5 || avg_trend > 0.6 {
        level = RiskLevel::High;
    }
    level
}

pub fn predict_exam_risk(students: &[Student], params: &RiskParams) -> Vec<SubjectRisk> {
    let mut tallies: BTreeMap<&str, SubjectTally> = BTreeMap::new();

    for student in students.iter().filter(|s| params.level.includes(s.year_group)) {
        for (subject, history) in &student.subjects {
            let Some(record) = history.get(&params.year) else {
                continue;
            };

            let predicted = record.predicted_grade.rank();
            let entry = tallies.entry(subject.as_str()).or_default();
            entry.count += 1;
            entry.predicted_total += predicted;
            if predicted > record.target_grade.rank() {
                entry.underperforming += 1;
            }
            if let [first, second, ..] = record.assessments.as_slice() {
                entry
                    .trends
                    .push(second.grade.rank() as i32 - first.grade.rank() as i32);
            }
        }
    }

    let risks: Vec<SubjectRisk> = tallies
        .into_iter()
        .filter(|(_, tally)| tally.count > 0)
        .map(|(subject, tally)| {
            let avg_predicted_rank = tally.predicted_total as f64 / tally.count as f64;
            let underperforming_ratio = tally.underperforming as f64 / tally.count as f64;
            let avg_trend = if tally.trends.is_empty() {
                0.0
            } else {
                tally.trends.iter().sum::<i32>() as f64 / tally.trends.len() as f64
            };
            let risk_level = classify(avg_predicted_rank, underperforming_ratio, avg_trend);

            SubjectRisk {
                subject: subject.to_string(),
                risk_level,
                reason: risk_level.reason(),
                student_count: tally.count,
                avg_predicted_rank,
                underperforming_ratio,
                avg_trend,
            }
        })
        .collect();

    debug!(
        level = params.level.label(),
        year = %params.year,
        subjects = risks.len(),
        "exam risk prediction complete"
    );

    risks
}
