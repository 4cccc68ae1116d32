use std::fmt::Write;

use crate::benchmark::BenchmarkReport;
use crate::dashboard::ClassDashboard;
use crate::intervention::InterventionReport;
use crate::models::{ClassDefinition, ExamLevel, TeacherDefinition};
use crate::risk::{RiskLevel, SubjectRisk};

pub fn render_intervention(report: &InterventionReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Student Intervention: {}", report.subject);
    let _ = writeln!(output, "Academic year {}", report.year);
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Current simulated Alpha Grade for {}: {}. To reach target grade {}, analysis suggests {} students need to improve by at least one grade.",
        report.subject, report.current_alps_grade, report.target_alps_grade, report.students_needed
    );
    let _ = writeln!(output);

    if report.candidates.is_empty() {
        let _ = writeln!(output, "No students are currently below target.");
        return output;
    }

    let _ = writeln!(
        output,
        "| Student Name | Current Predicted Grade | Target Grade (Min) | Gap | Suggested Priority | Suggested Interventions |"
    );
    let _ = writeln!(output, "|---|---|---|---|---|---|");
    for candidate in &report.candidates {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} | {} |",
            candidate.student_name,
            candidate.predicted_grade,
            candidate.target_grade,
            candidate.gap,
            candidate.priority,
            candidate.suggestion
        );
    }

    output
}

pub fn render_risk(level: ExamLevel, risks: &[SubjectRisk]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Exam Prediction: {}", level.label());
    let _ = writeln!(output);
    let _ = writeln!(output, "## Subject Risk Summary");

    if risks.is_empty() {
        let _ = writeln!(output, "No relevant student data found for the selected level.");
        return output;
    }

    for risk in risks {
        let _ = writeln!(output, "- **{}:** {} Risk", risk.subject, risk.risk_level);
    }

    let flagged: Vec<&SubjectRisk> = risks
        .iter()
        .filter(|risk| risk.risk_level != RiskLevel::Low)
        .collect();
    if flagged.is_empty() {
        return output;
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Subject Deep Dive");
    for risk in flagged {
        let _ = writeln!(output);
        let _ = writeln!(output, "### {} ({} Risk)", risk.subject, risk.risk_level);
        let _ = writeln!(output, "- Reason: {}", risk.reason);
        let _ = writeln!(
            output,
            "- Average Predicted Grade Value: {:.2} (0=A*, 6=U)",
            risk.avg_predicted_rank
        );
        let _ = writeln!(
            output,
            "- Percentage Below Target: {:.1}%",
            risk.underperforming_ratio * 100.0
        );
        let _ = writeln!(
            output,
            "- Average Assessment Trend: {:.2} (Positive indicates recent decline)",
            risk.avg_trend
        );
        let _ = writeln!(
            output,
            "- Suggested Action: Review specific student data, identify common weak areas, consider targeted revision."
        );
    }

    output
}

pub fn render_dashboard(
    teacher: &TeacherDefinition,
    class: &ClassDefinition,
    dashboard: &ClassDashboard,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Teacher Dashboard: {}", class.name);
    let _ = writeln!(output, "Teacher: {}", teacher.name);
    let _ = writeln!(output);

    let snapshot = match dashboard {
        ClassDashboard::NoData { .. } => {
            let _ = writeln!(output, "No student data found for this class.");
            return output;
        }
        ClassDashboard::Snapshot(snapshot) => snapshot,
    };

    let _ = writeln!(output, "## Class Performance Snapshot");
    let _ = writeln!(
        output,
        "Overall Class Performance: {} (Avg Predicted: {:.2}, Avg Target: {:.2})",
        snapshot.performance, snapshot.avg_predicted_rank, snapshot.avg_target_rank
    );
    if !snapshot.strengths.is_empty() {
        let _ = writeln!(output, "Topic Strengths: {}", snapshot.strengths.join(", "));
    }
    if !snapshot.weaknesses.is_empty() {
        let _ = writeln!(output, "Topic Weaknesses: {}", snapshot.weaknesses.join(", "));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Students Requiring Attention");
    if snapshot.attention.is_empty() {
        let _ = writeln!(output, "No students flagged for immediate attention.");
    } else {
        let _ = writeln!(output, "| Student | Reason | Suggested Action |");
        let _ = writeln!(output, "|---|---|---|");
        for entry in &snapshot.attention {
            let _ = writeln!(
                output,
                "| {} | {} | {} |",
                entry.student_name, entry.reason, entry.suggested_action
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Engagement Indicators");
    let _ = writeln!(
        output,
        "- Avg. Homework Completion: {:.0}%",
        snapshot.avg_homework_pct
    );
    let _ = writeln!(
        output,
        "- Avg. Online Participation: {:.0}%",
        snapshot.avg_participation_pct
    );

    output
}

fn or_none(subjects: &[String]) -> String {
    if subjects.is_empty() {
        "None identified".to_string()
    } else {
        subjects.join(", ")
    }
}

pub fn render_benchmark(report: &BenchmarkReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# School Benchmarking");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Strategic Summary");
    let _ = writeln!(
        output,
        "- Overall School Trend ({} Years): {} (Simulated Alpha Grade change: {:.1})",
        report.years.len(),
        report.trend_label(),
        report.overall_trend
    );
    let _ = writeln!(
        output,
        "- Subjects Performing Consistently Well: {}",
        or_none(&report.performing_well)
    );
    let _ = writeln!(
        output,
        "- Subjects Maintaining Performance: {}",
        or_none(&report.maintaining)
    );
    let _ = writeln!(
        output,
        "- Subjects Requiring Strategic Attention: {}",
        or_none(&report.needs_attention)
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## National Comparison");
    let _ = writeln!(
        output,
        "Overall performance places school in approx. {}th percentile nationally (simulated).",
        report.percentile
    );
    if let Some(difference) = report.score_vs_national {
        let _ = writeln!(
            output,
            "Average Alpha Score vs National: {difference:.2} (simulated difference)"
        );
    }

    if !report.subjects.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Subject Trends");
        let _ = writeln!(output, "| Subject | Avg Alpha | Trend | Stability | Category |");
        let _ = writeln!(output, "|---|---|---|---|---|");
        for subject in &report.subjects {
            let _ = writeln!(
                output,
                "| {} | {:.1} | {:.1} | {:.1} | {} |",
                subject.subject, subject.avg_alps, subject.trend, subject.stability, subject.category
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommendations");
    for line in &report.recommendations {
        let _ = writeln!(output, "- {line}");
    }

    output
}
