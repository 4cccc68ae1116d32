use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::grade::Grade;
use crate::models::{AcademicYear, ClassDefinition, Student};

pub const SUGGESTED_ACTION: &str = "Check in with student; Review recent work/attendance.";

const HOMEWORK_THRESHOLD: f64 = 0.7;
const ATTENDANCE_THRESHOLD: f64 = 0.92;
const SUBJECT_SPREAD: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardParams {
    pub class: ClassDefinition,
    pub year: AcademicYear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerformanceBand {
    AtOrAboveTarget,
    SlightlyBelowTarget,
    SignificantlyBelowTarget,
}

impl PerformanceBand {
    pub fn from_averages(avg_predicted: f64, avg_target: f64) -> Self {
        if avg_predicted <= avg_target {
            PerformanceBand::AtOrAboveTarget
        } else if avg_predicted <= avg_target + 0.5 {
            PerformanceBand::SlightlyBelowTarget
        } else {
            PerformanceBand::SignificantlyBelowTarget
        }
    }
}

impl fmt::Display for PerformanceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PerformanceBand::AtOrAboveTarget => "At or Above Target",
            PerformanceBand::SlightlyBelowTarget => "Slightly Below Target",
            PerformanceBand::SignificantlyBelowTarget => "Significantly Below Target",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttentionReason {
    BelowTarget {
        subject: String,
        predicted: Grade,
        target: Grade,
    },
    RecentDrop {
        subject: String,
        assessment: String,
    },
    LowHomework {
        completion: f64,
    },
    LowAttendance {
        attendance: f64,
    },
}

impl fmt::Display for AttentionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttentionReason::BelowTarget {
                subject,
                predicted,
                target,
            } => write!(
                f,
                "Significantly below target in {subject} (Predicted: {predicted}, Target: {target})"
            ),
            AttentionReason::RecentDrop {
                subject,
                assessment,
            } => write!(
                f,
                "Dropped 2+ grades in recent {subject} assessment ({assessment})"
            ),
            AttentionReason::LowHomework { completion } => {
                write!(f, "Low homework completion ({:.0}%)", completion * 100.0)
            }
            AttentionReason::LowAttendance { attendance } => {
                write!(f, "Low attendance ({:.0}%)", attendance * 100.0)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttentionEntry {
    pub student_id: String,
    pub student_name: String,
    pub reason: AttentionReason,
    pub suggested_action: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSnapshot {
    pub class_name: String,
    pub student_count: usize,
    pub performance: PerformanceBand,
    pub avg_predicted_rank: f64,
    pub avg_target_rank: f64,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub attention: Vec<AttentionEntry>,
    pub avg_homework_pct: f64,
    pub avg_participation_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClassDashboard {
    NoData { class_name: String },
    Snapshot(ClassSnapshot),
}

fn attention_reason(
    student: &Student,
    subject: &str,
    predicted: Grade,
    target: Grade,
    latest: Option<(&str, Grade)>,
) -> Option<AttentionReason> {
    if predicted.rank() > target.rank() + 1 {
        return Some(AttentionReason::BelowTarget {
            subject: subject.to_string(),
            predicted,
            target,
        });
    }
    if let Some((name, grade)) = latest {
        if grade.rank() > predicted.rank() + 1 {
            return Some(AttentionReason::RecentDrop {
                subject: subject.to_string(),
                assessment: name.to_string(),
            });
        }
    }
    let engagement = &student.engagement;
    if engagement.homework_completion < HOMEWORK_THRESHOLD {
        return Some(AttentionReason::LowHomework {
            completion: engagement.homework_completion,
        });
    }
    if engagement.attendance < ATTENDANCE_THRESHOLD {
        return Some(AttentionReason::LowAttendance {
            attendance: engagement.attendance,
        });
    }
    None
}

pub fn build_dashboard(students: &[Student], params: &DashboardParams) -> ClassDashboard {
    let class = &params.class;
    let mut predicted_total = 0usize;
    let mut target_total = 0usize;
    let mut subject_totals: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut attention = Vec::new();
    let mut student_count = 0usize;
    let mut homework_total = 0.0;
    let mut participation_total = 0.0;

    for student in students.iter().filter(|s| s.year_group == class.year_group) {
        let mut relevant_subjects = 0usize;

        for subject in &class.subjects {
            let Some(record) = student.record(subject, params.year) else {
                continue;
            };
            relevant_subjects += 1;

            let predicted = record.predicted_grade.rank();
            predicted_total += predicted;
            target_total += record.target_grade.rank();

            let entry = subject_totals.entry(subject.as_str()).or_insert((0, 0));
            entry.0 += predicted;
            entry.1 += 1;

            let latest = record
                .latest_assessment()
                .map(|assessment| (assessment.name.as_str(), assessment.grade));
            if let Some(reason) = attention_reason(
                student,
                subject,
                record.predicted_grade,
                record.target_grade,
                latest,
            ) {
                attention.push(AttentionEntry {
                    student_id: student.id.clone(),
                    student_name: student.full_name(),
                    reason,
                    suggested_action: SUGGESTED_ACTION,
                });
            }
        }

        if relevant_subjects > 0 {
            student_count += 1;
            homework_total += student.engagement.homework_completion;
            participation_total += student.engagement.online_participation;
        }
    }

    if student_count == 0 {
        debug!(class = %class.name, "no students found for class");
        return ClassDashboard::NoData {
            class_name: class.name.clone(),
        };
    }

    // Pairs without a record still count towards the denominator.
    let denominator = (student_count * class.subjects.len()) as f64;
    let avg_predicted_rank = predicted_total as f64 / denominator;
    let avg_target_rank = target_total as f64 / denominator;

    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    for subject in &class.subjects {
        let Some(&(total, count)) = subject_totals.get(subject.as_str()) else {
            continue;
        };
        let subject_avg = total as f64 / count as f64;
        if subject_avg < avg_predicted_rank - SUBJECT_SPREAD {
            strengths.push(subject.clone());
        }
        if subject_avg > avg_predicted_rank + SUBJECT_SPREAD {
            weaknesses.push(subject.clone());
        }
    }

    debug!(
        class = %class.name,
        student_count,
        flagged = attention.len(),
        "class dashboard complete"
    );

    ClassDashboard::Snapshot(ClassSnapshot {
        class_name: class.name.clone(),
        student_count,
        performance: PerformanceBand::from_averages(avg_predicted_rank, avg_target_rank),
        avg_predicted_rank,
        avg_target_rank,
        strengths,
        weaknesses,
        attention,
        avg_homework_pct: homework_total / student_count as f64 * 100.0,
        avg_participation_pct: participation_total / student_count as f64 * 100.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{record, student, with_assessments, year};
    use pretty_assertions::assert_eq;

    fn science_class() -> ClassDefinition {
        ClassDefinition {
            id: "classA".to_string(),
            name: "Year 9 - Set 1 Science".to_string(),
            teacher_id: "teacher1".to_string(),
            subjects: vec![
                "Physics".to_string(),
                "Chemistry".to_string(),
                "Biology".to_string(),
            ],
            year_group: 9,
        }
    }

    fn params() -> DashboardParams {
        DashboardParams {
            class: science_class(),
            year: year("2023/2024"),
        }
    }

    fn snapshot(dashboard: ClassDashboard) -> ClassSnapshot {
        match dashboard {
            ClassDashboard::Snapshot(snapshot) => snapshot,
            ClassDashboard::NoData { .. } => panic!("expected a snapshot"),
        }
    }

    #[test]
    fn no_matching_year_group_is_no_data() {
        let students = vec![student("s1", "Ann One", 10)
            .subject("Physics", "2023/2024", record("B", "B"))
            .build()];

        assert_eq!(
            build_dashboard(&students, &params()),
            ClassDashboard::NoData {
                class_name: "Year 9 - Set 1 Science".to_string()
            }
        );
    }

    #[test]
    fn averages_use_full_class_denominator() {
        let students = vec![
            student("s1", "Ann One", 9)
                .subject("Physics", "2023/2024", record("C", "B"))
                .subject("Chemistry", "2023/2024", record("C", "C"))
                .subject("Biology", "2023/2024", record("C", "C"))
                .build(),
            student("s2", "Ben Two", 9)
                .subject("Physics", "2023/2024", record("C", "C"))
                .build(),
        ];

        let snap = snapshot(build_dashboard(&students, &params()));

        assert_eq!(snap.student_count, 2);
        // 4 records of rank 3 over 2 students x 3 subjects.
        assert!((snap.avg_predicted_rank - 2.0).abs() < 1e-9);
        assert!((snap.avg_target_rank - 11.0 / 6.0).abs() < 1e-9);
        assert_eq!(snap.performance, PerformanceBand::SlightlyBelowTarget);
        // Every subject average (3.0) sits above 2.0 + 0.5.
        assert_eq!(snap.weaknesses, vec!["Physics", "Chemistry", "Biology"]);
        assert!(snap.strengths.is_empty());
    }

    #[test]
    fn attention_triggers_apply_in_order() {
        let students = vec![
            student("s1", "Ann One", 9)
                .subject("Physics", "2023/2024", record("D", "B"))
                .engagement(0.5, 0.9, 0.8)
                .build(),
            student("s2", "Ben Two", 9)
                .subject(
                    "Physics",
                    "2023/2024",
                    with_assessments(record("B", "B"), &["B", "D"]),
                )
                .build(),
            student("s3", "Cat Three", 9)
                .subject("Physics", "2023/2024", record("B", "B"))
                .engagement(0.65, 0.9, 0.99)
                .build(),
            student("s4", "Dan Four", 9)
                .subject("Physics", "2023/2024", record("B", "B"))
                .engagement(0.95, 0.9, 0.90)
                .build(),
            student("s5", "Eve Five", 9)
                .subject("Physics", "2023/2024", record("B", "B"))
                .build(),
        ];

        let snap = snapshot(build_dashboard(&students, &params()));
        let reasons: Vec<String> = snap.attention.iter().map(|a| a.reason.to_string()).collect();

        assert_eq!(
            reasons,
            vec![
                "Significantly below target in Physics (Predicted: D, Target: B)",
                "Dropped 2+ grades in recent Physics assessment (Assessment 2)",
                "Low homework completion (65%)",
                "Low attendance (90%)",
            ]
        );
        assert!(snap.attention.iter().all(|a| a.suggested_action == SUGGESTED_ACTION));
    }

    #[test]
    fn student_flagged_once_per_subject() {
        let students = vec![student("s1", "Ann One", 9)
            .subject("Physics", "2023/2024", record("B", "B"))
            .subject("Biology", "2023/2024", record("B", "B"))
            .engagement(0.5, 0.5, 0.5)
            .build()];

        let snap = snapshot(build_dashboard(&students, &params()));
        assert_eq!(snap.attention.len(), 2);
        assert!(snap.attention.iter().all(|a| a.student_id == "s1"));
    }

    #[test]
    fn engagement_averages_cover_students_with_class_records() {
        let students = vec![
            student("s1", "Ann One", 9)
                .subject("Physics", "2023/2024", record("A", "A"))
                .engagement(0.8, 0.6, 1.0)
                .build(),
            student("s2", "Ben Two", 9)
                .subject("Physics", "2023/2024", record("A", "A"))
                .engagement(1.0, 1.0, 1.0)
                .build(),
            student("s3", "Cat Three", 9)
                .subject("History", "2023/2024", record("A", "A"))
                .engagement(0.0, 0.0, 1.0)
                .build(),
        ];

        let snap = snapshot(build_dashboard(&students, &params()));
        assert!((snap.avg_homework_pct - 90.0).abs() < 1e-9);
        assert!((snap.avg_participation_pct - 80.0).abs() < 1e-9);
        assert_eq!(snap.performance, PerformanceBand::AtOrAboveTarget);
    }

    #[test]
    fn strengths_sit_half_a_grade_below_class_average() {
        let mut class = science_class();
        class.subjects = vec!["Physics".to_string(), "Chemistry".to_string()];
        let students = vec![student("s1", "Ann One", 9)
            .subject("Physics", "2023/2024", record("A*", "A*"))
            .subject("Chemistry", "2023/2024", record("D", "D"))
            .build()];

        let snap = snapshot(build_dashboard(
            &students,
            &DashboardParams {
                class,
                year: year("2023/2024"),
            },
        ));
        assert_eq!(snap.strengths, vec!["Physics"]);
        assert_eq!(snap.weaknesses, vec!["Chemistry"]);
    }
}
