use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::models::{AcademicYear, Student};

/// Placeholder external benchmark, not derived from data.
pub const NATIONAL_AVG_ALPS: f64 = 4.5;
pub const NATIONAL_AVG_SCORE: f64 = 0.75;

const MIN_RECORDS_PER_YEAR: usize = 5;
const EMPTY_YEAR_ALPS: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BenchmarkParams {
    pub years: usize,
    pub anchor: AcademicYear,
}

impl BenchmarkParams {
    pub fn window(&self) -> Vec<AcademicYear> {
        AcademicYear::trailing(self.anchor, self.years)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubjectCategory {
    PerformingWell,
    Maintaining,
    NeedsAttention,
}

impl SubjectCategory {
    pub fn classify(avg_alps: f64, trend: f64, stability: f64) -> Self {
        if avg_alps < NATIONAL_AVG_ALPS - 0.5 && trend <= 0.0 && stability < 2.0 {
            SubjectCategory::PerformingWell
        } else if avg_alps > NATIONAL_AVG_ALPS + 0.5 || trend > 1.0 || stability > 3.0 {
            SubjectCategory::NeedsAttention
        } else {
            SubjectCategory::Maintaining
        }
    }
}

impl fmt::Display for SubjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SubjectCategory::PerformingWell => "performing well",
            SubjectCategory::Maintaining => "maintaining",
            SubjectCategory::NeedsAttention => "needs attention",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearPoint {
    pub year: AcademicYear,
    pub records: usize,
    pub mean_alps: Option<f64>,
    pub mean_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectTrend {
    pub subject: String,
    pub yearly: Vec<YearPoint>,
    pub avg_alps: f64,
    pub avg_score: Option<f64>,
    /// Last year with data minus first year with data; negative is improvement.
    pub trend: f64,
    pub stability: f64,
    pub category: SubjectCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkReport {
    pub years: Vec<AcademicYear>,
    pub overall_trend: f64,
    pub first_year_alps: f64,
    pub last_year_alps: f64,
    pub subjects: Vec<SubjectTrend>,
    pub performing_well: Vec<String>,
    pub maintaining: Vec<String>,
    pub needs_attention: Vec<String>,
    pub percentile: i64,
    pub score_vs_national: Option<f64>,
    pub recommendations: Vec<String>,
}

impl BenchmarkReport {
    pub fn stable_or_improving(&self) -> bool {
        self.overall_trend <= 0.0
    }

    pub fn trend_label(&self) -> &'static str {
        if self.stable_or_improving() {
            "Stable or Improving"
        } else {
            "Declining"
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct YearTally {
    records: usize,
    alps_total: u32,
    scored: usize,
    score_total: f64,
}

impl YearTally {
    fn add(&mut self, alps: u8, score: Option<f64>) {
        self.records += 1;
        self.alps_total += u32::from(alps);
        if let Some(score) = score {
            self.scored += 1;
            self.score_total += score;
        }
    }

    fn mean_alps(&self) -> Option<f64> {
        (self.records > 0).then(|| f64::from(self.alps_total) / self.records as f64)
    }

    fn point(&self, year: AcademicYear) -> YearPoint {
        YearPoint {
            year,
            records: self.records,
            mean_alps: self.mean_alps(),
            mean_score: (self.scored > 0).then(|| self.score_total / self.scored as f64),
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// JavaScript-style rounding: halves round towards positive infinity.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub fn percentile(last_year_alps: f64) -> i64 {
    (50 + round_half_up((NATIONAL_AVG_ALPS - last_year_alps) * 15.0)).clamp(10, 90)
}

fn subject_trend(subject: &str, yearly: Vec<YearPoint>, window: usize) -> Option<SubjectTrend> {
    let total: usize = yearly.iter().map(|point| point.records).sum();
    if total < MIN_RECORDS_PER_YEAR * window {
        return None;
    }

    let alps: Vec<f64> = yearly.iter().filter_map(|point| point.mean_alps).collect();
    if alps.len() < 2 {
        return None;
    }
    let scores: Vec<f64> = yearly.iter().filter_map(|point| point.mean_score).collect();

    let avg_alps = mean(&alps)?;
    let trend = alps[alps.len() - 1] - alps[0];
    let max = alps.iter().copied().fold(f64::MIN, f64::max);
    let min = alps.iter().copied().fold(f64::MAX, f64::min);
    let stability = max - min;

    Some(SubjectTrend {
        subject: subject.to_string(),
        yearly,
        avg_alps,
        avg_score: mean(&scores),
        trend,
        stability,
        category: SubjectCategory::classify(avg_alps, trend, stability),
    })
}

fn recommendations(performing_well: &[String], needs_attention: &[String]) -> Vec<String> {
    let mut lines = Vec::new();
    if !performing_well.is_empty() {
        lines.push(format!(
            "Celebrate and share best practices from: {}.",
            performing_well.join(", ")
        ));
    }
    if !needs_attention.is_empty() {
        lines.push(format!(
            "Investigate factors affecting performance in: {}. Consider deep dives into curriculum, staffing, or resources.",
            needs_attention.join(", ")
        ));
    }
    lines.push("Continue monitoring subjects maintaining performance.".to_string());
    lines.push("Use subject-level trend data to inform departmental reviews.".to_string());
    lines
}

pub fn run_benchmark(students: &[Student], params: &BenchmarkParams) -> BenchmarkReport {
    let years = params.window();
    let mut per_subject: BTreeMap<&str, BTreeMap<AcademicYear, YearTally>> = BTreeMap::new();
    let mut per_year: BTreeMap<AcademicYear, YearTally> = BTreeMap::new();

    for student in students {
        for (subject, history) in &student.subjects {
            for year in &years {
                let Some(record) = history.get(year) else {
                    continue;
                };
                let alps = record.alps_grade.value();
                per_subject
                    .entry(subject.as_str())
                    .or_default()
                    .entry(*year)
                    .or_default()
                    .add(alps, record.alps_score);
                per_year.entry(*year).or_default().add(alps, record.alps_score);
            }
        }
    }

    let subjects: Vec<SubjectTrend> = per_subject
        .iter()
        .filter_map(|(subject, tallies)| {
            let yearly = years
                .iter()
                .map(|year| tallies.get(year).copied().unwrap_or_default().point(*year))
                .collect();
            subject_trend(subject, yearly, years.len())
        })
        .collect();

    let mut performing_well = Vec::new();
    let mut maintaining = Vec::new();
    let mut needs_attention = Vec::new();
    for trend in &subjects {
        let bucket = match trend.category {
            SubjectCategory::PerformingWell => &mut performing_well,
            SubjectCategory::Maintaining => &mut maintaining,
            SubjectCategory::NeedsAttention => &mut needs_attention,
        };
        bucket.push(trend.subject.clone());
    }

    let year_alps = |year: Option<&AcademicYear>| {
        year.and_then(|year| per_year.get(year))
            .and_then(YearTally::mean_alps)
            .unwrap_or(EMPTY_YEAR_ALPS)
    };
    let first_year_alps = year_alps(years.first());
    let last_year_alps = year_alps(years.last());

    let subject_scores: Vec<f64> = subjects.iter().filter_map(|s| s.avg_score).collect();
    let score_vs_national = mean(&subject_scores).map(|avg| avg - NATIONAL_AVG_SCORE);

    debug!(
        years = years.len(),
        analysed = subjects.len(),
        well = performing_well.len(),
        attention = needs_attention.len(),
        "benchmark analysis complete"
    );

    BenchmarkReport {
        recommendations: recommendations(&performing_well, &needs_attention),
        years,
        overall_trend: last_year_alps - first_year_alps,
        first_year_alps,
        last_year_alps,
        subjects,
        performing_well,
        maintaining,
        needs_attention,
        percentile: percentile(last_year_alps),
        score_vs_national,
    }
}
