//! Bounded text summaries of an analysis, used as grounding for the chat assistant.

use std::collections::BTreeSet;
use std::fmt::Write;

use crate::benchmark::BenchmarkReport;
use crate::dashboard::ClassDashboard;
use crate::intervention::InterventionReport;
use crate::models::{AcademicYear, ClassDefinition, ExamLevel, Student, TeacherDefinition};
use crate::risk::{RiskLevel, SubjectRisk};

pub const SAMPLE_LIMIT: usize = 5;
const RISK_SAMPLE_LIMIT: usize = 3;

/// Headline facts about the working collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionOverview {
    pub student_count: usize,
    pub year: AcademicYear,
    pub key_subjects: Vec<String>,
}

impl CollectionOverview {
    pub fn of(students: &[Student], year: AcademicYear) -> Self {
        let subjects: BTreeSet<&str> = students
            .iter()
            .flat_map(|student| student.subjects.keys().map(String::as_str))
            .collect();

        Self {
            student_count: students.len(),
            year,
            key_subjects: subjects
                .into_iter()
                .take(SAMPLE_LIMIT)
                .map(str::to_string)
                .collect(),
        }
    }
}

/// An analyzer result together with the selection that produced it.
#[derive(Debug, Clone, Copy)]
pub enum AnalysisView<'a> {
    Intervention(&'a InterventionReport),
    ExamRisk {
        level: ExamLevel,
        risks: &'a [SubjectRisk],
    },
    Dashboard {
        teacher: &'a TeacherDefinition,
        class: &'a ClassDefinition,
        dashboard: &'a ClassDashboard,
    },
    Benchmark(&'a BenchmarkReport),
}

fn bounded(items: impl IntoIterator<Item = String>, limit: usize) -> String {
    let items: Vec<String> = items.into_iter().collect();
    if items.is_empty() {
        return "None".to_string();
    }
    let mut joined = items.iter().take(limit).cloned().collect::<Vec<_>>().join(", ");
    if items.len() > limit {
        let _ = write!(joined, " (and {} more)", items.len() - limit);
    }
    joined
}

pub fn summarize(overview: &CollectionOverview, view: &AnalysisView<'_>) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "Context: Analyzing data for {} students. Focus on the {} academic year. Key subjects include {} etc. Grades range from A* (best) to U (worst). Alpha grades range from 1 (best) to 9 (worst).",
        overview.student_count,
        overview.year,
        bounded(overview.key_subjects.iter().cloned(), SAMPLE_LIMIT),
    );
    let _ = writeln!(output);

    match view {
        AnalysisView::Intervention(report) => summarize_intervention(&mut output, report),
        AnalysisView::ExamRisk { level, risks } => summarize_risk(&mut output, *level, risks),
        AnalysisView::Dashboard {
            teacher,
            class,
            dashboard,
        } => summarize_dashboard(&mut output, teacher, class, dashboard),
        AnalysisView::Benchmark(report) => summarize_benchmark(&mut output, report),
    }

    output
}

fn summarize_intervention(output: &mut String, report: &InterventionReport) {
    let _ = writeln!(
        output,
        "The user is viewing the 'Student Intervention' tab for {}, aiming for Alpha grade {}.",
        report.subject, report.target_alps_grade
    );
    let _ = writeln!(
        output,
        "Current Alpha grade: {} across {} students; {} students need to improve by at least one grade.",
        report.current_alps_grade, report.qualifying_students, report.students_needed
    );
    let _ = writeln!(
        output,
        "Currently displayed students needing intervention: {}.",
        bounded(
            report.candidates.iter().map(|c| c.student_name.clone()),
            SAMPLE_LIMIT
        )
    );
    let _ = writeln!(output, "Sample student data (up to {SAMPLE_LIMIT} relevant):");
    for candidate in report.candidates.iter().take(SAMPLE_LIMIT) {
        let _ = writeln!(
            output,
            "- {}: Predicted {}, Target {}, Priority {}",
            candidate.student_name, candidate.predicted_grade, candidate.target_grade, candidate.priority
        );
    }
}

fn summarize_risk(output: &mut String, level: ExamLevel, risks: &[SubjectRisk]) {
    let _ = writeln!(
        output,
        "The user is viewing the 'Exam Prediction' tab for {} level.",
        level.label()
    );
    if risks.is_empty() {
        let _ = writeln!(output, "No relevant student data found for the selected level.");
        return;
    }

    let count = |wanted: RiskLevel| risks.iter().filter(|r| r.risk_level == wanted).count();
    let _ = writeln!(
        output,
        "Current Risk Summary: {} subjects analysed; {} High, {} Medium, {} Low.",
        risks.len(),
        count(RiskLevel::High),
        count(RiskLevel::Medium),
        count(RiskLevel::Low)
    );
    let _ = writeln!(output, "Sample data for high/medium risk subjects (if any):");
    for risk in risks
        .iter()
        .filter(|r| r.risk_level != RiskLevel::Low)
        .take(RISK_SAMPLE_LIMIT)
    {
        let _ = writeln!(
            output,
            "- {} ({} Risk): AvgPred {:.2}, Underperforming {:.1}%, Trend {:.2}",
            risk.subject,
            risk.risk_level,
            risk.avg_predicted_rank,
            risk.underperforming_ratio * 100.0,
            risk.avg_trend
        );
    }
}

fn summarize_dashboard(
    output: &mut String,
    teacher: &TeacherDefinition,
    class: &ClassDefinition,
    dashboard: &ClassDashboard,
) {
    let _ = writeln!(
        output,
        "The user is viewing the 'Teacher Dashboard' for {}, class {}.",
        teacher.name, class.name
    );

    let snapshot = match dashboard {
        ClassDashboard::NoData { .. } => {
            let _ = writeln!(output, "No student data found for this class.");
            return;
        }
        ClassDashboard::Snapshot(snapshot) => snapshot,
    };

    let _ = writeln!(
        output,
        "Class Snapshot: {} students. Overall Class Performance: {} (Avg Predicted: {:.2}, Avg Target: {:.2}).",
        snapshot.student_count,
        snapshot.performance,
        snapshot.avg_predicted_rank,
        snapshot.avg_target_rank
    );
    let _ = writeln!(
        output,
        "Topic Strengths: {}. Topic Weaknesses: {}.",
        bounded(snapshot.strengths.iter().cloned(), SAMPLE_LIMIT),
        bounded(snapshot.weaknesses.iter().cloned(), SAMPLE_LIMIT)
    );
    let _ = writeln!(
        output,
        "Students needing attention: {}",
        bounded(
            snapshot
                .attention
                .iter()
                .map(|a| format!("{} ({})", a.student_name, a.reason)),
            SAMPLE_LIMIT
        )
    );
    let _ = writeln!(
        output,
        "Avg. Homework Completion: {:.0}%. Avg. Online Participation: {:.0}%.",
        snapshot.avg_homework_pct, snapshot.avg_participation_pct
    );
}

fn summarize_benchmark(output: &mut String, report: &BenchmarkReport) {
    let _ = writeln!(
        output,
        "The user is viewing the 'School Benchmarking' tab for the last {} years.",
        report.years.len()
    );
    let _ = writeln!(
        output,
        "Overall School Trend: {} (Alpha grade change: {:.1}).",
        report.trend_label(),
        report.overall_trend
    );
    let _ = writeln!(
        output,
        "Performing well: {}. Maintaining: {}. Requiring strategic attention: {}.",
        bounded(report.performing_well.iter().cloned(), SAMPLE_LIMIT),
        bounded(report.maintaining.iter().cloned(), SAMPLE_LIMIT),
        bounded(report.needs_attention.iter().cloned(), SAMPLE_LIMIT)
    );
    let _ = writeln!(
        output,
        "Comparison: approx. {}th percentile nationally (simulated).",
        report.percentile
    );
    let _ = writeln!(output, "Sample subject trend data (up to {SAMPLE_LIMIT}):");
    for subject in report.subjects.iter().take(SAMPLE_LIMIT) {
        let _ = writeln!(
            output,
            "- {}: AvgAlpha {:.1}, Trend {:.1}, Stability {:.1}",
            subject.subject, subject.avg_alps, subject.trend, subject.stability
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::{run_benchmark, BenchmarkParams};
    use crate::catalog;
    use crate::dashboard::{build_dashboard, DashboardParams};
    use crate::fixtures::{record, student};
    use crate::generator::generate_students;
    use crate::intervention::{analyze_interventions, InterventionParams};
    use crate::risk::{predict_exam_risk, RiskParams};

    fn overview(students: &[Student]) -> CollectionOverview {
        CollectionOverview::of(students, AcademicYear::REFERENCE)
    }

    #[test]
    fn intervention_summary_truncates_names() {
        let students: Vec<Student> = (0..8)
            .map(|i| {
                student(&format!("s{i}"), &format!("Student{i} Lee"), 11)
                    .subject("Physics", "2023/2024", record("D", "B"))
                    .build()
            })
            .collect();
        let report = analyze_interventions(
            &students,
            &InterventionParams {
                subject: "Physics".to_string(),
                target_alps_grade: 3,
                year: AcademicYear::REFERENCE,
            },
        );

        let text = summarize(&overview(&students), &AnalysisView::Intervention(&report));

        assert!(text.contains("Analyzing data for 8 students"));
        assert!(text.contains("'Student Intervention' tab for Physics, aiming for Alpha grade 3"));
        assert!(text.contains("(and 3 more)"));
        assert!(!text.contains("Student5 Lee"));
        assert_eq!(text.matches("- Student").count(), SAMPLE_LIMIT);
    }

    #[test]
    fn risk_summary_with_no_subjects() {
        let text = summarize(
            &overview(&[]),
            &AnalysisView::ExamRisk {
                level: ExamLevel::Upper,
                risks: &[],
            },
        );
        assert!(text.contains("A-Level level"));
        assert!(text.contains("No relevant student data"));
    }

    #[test]
    fn every_view_stays_bounded_on_a_full_cohort() {
        let students = generate_students(100, 42);
        let overview = overview(&students);

        let intervention = analyze_interventions(
            &students,
            &InterventionParams {
                subject: catalog::DEFAULT_SUBJECT.to_string(),
                target_alps_grade: 3,
                year: AcademicYear::REFERENCE,
            },
        );
        let risks = predict_exam_risk(
            &students,
            &RiskParams {
                level: ExamLevel::Lower,
                year: AcademicYear::REFERENCE,
            },
        );
        let class = catalog::find_class("classA").unwrap();
        let teacher = catalog::find_teacher(&class.teacher_id).unwrap();
        let dashboard = build_dashboard(
            &students,
            &DashboardParams {
                class: class.clone(),
                year: AcademicYear::REFERENCE,
            },
        );
        let benchmark = run_benchmark(
            &students,
            &BenchmarkParams {
                years: 4,
                anchor: AcademicYear::REFERENCE,
            },
        );

        let views = [
            AnalysisView::Intervention(&intervention),
            AnalysisView::ExamRisk {
                level: ExamLevel::Lower,
                risks: &risks,
            },
            AnalysisView::Dashboard {
                teacher: &teacher,
                class: &class,
                dashboard: &dashboard,
            },
            AnalysisView::Benchmark(&benchmark),
        ];

        for view in &views {
            let text = summarize(&overview, view);
            assert!(text.lines().count() <= 20, "summary too long:\n{text}");
            assert!(text.matches("\n- ").count() <= SAMPLE_LIMIT);
        }
    }

    #[test]
    fn summarizing_is_pure() {
        let students = generate_students(30, 5);
        let report = run_benchmark(
            &students,
            &BenchmarkParams {
                years: 3,
                anchor: AcademicYear::REFERENCE,
            },
        );
        let view = AnalysisView::Benchmark(&report);
        assert_eq!(
            summarize(&overview(&students), &view),
            summarize(&overview(&students), &view)
        );
    }
}
