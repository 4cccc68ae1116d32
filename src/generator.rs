use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::catalog::SUBJECTS;
use crate::grade::Grade;
use crate::models::{
    AcademicYear, AlpsGrade, Assessment, Engagement, Student, SubjectHistory, SubjectYearRecord,
};

const FIRST_NAMES: [&str; 20] = [
    "Alice", "Bob", "Charlie", "David", "Eve", "Frank", "Grace", "Heidi", "Ivan", "Judy",
    "Kevin", "Liam", "Mia", "Noah", "Olivia", "Peter", "Quinn", "Ryan", "Sophia", "Tom",
];

const LAST_NAMES: [&str; 20] = [
    "Smith", "Jones", "Williams", "Brown", "Davis", "Miller", "Wilson", "Moore", "Taylor",
    "Anderson", "Thomas", "Jackson", "White", "Harris", "Martin", "Thompson", "Garcia",
    "Martinez", "Robinson", "Clark",
];

/// Years of history generated per subject, ending at the reference year.
pub const HISTORY_YEARS: usize = 4;

/// Builds a reproducible synthetic cohort for `count` students.
pub fn generate_students(count: usize, seed: u64) -> Vec<Student> {
    let mut rng = StdRng::seed_from_u64(seed);
    let years = AcademicYear::trailing(AcademicYear::REFERENCE, HISTORY_YEARS);

    let students: Vec<Student> = (0..count)
        .map(|index| generate_student(&mut rng, index, &years))
        .collect();

    debug!(count = students.len(), seed, "generated synthetic students");
    students
}

fn generate_student(rng: &mut StdRng, index: usize, years: &[AcademicYear]) -> Student {
    let year_group: u8 = rng.gen_range(9..=13);
    let subject_count = if year_group < 12 {
        rng.gen_range(6..=8)
    } else {
        3
    };

    let chosen: Vec<&str> = SUBJECTS
        .choose_multiple(rng, subject_count)
        .copied()
        .collect();
    let subjects = chosen
        .into_iter()
        .map(|subject| (subject.to_string(), generate_history(rng, years)))
        .collect::<BTreeMap<_, _>>();

    Student {
        id: format!("student_{}", index + 1),
        first_name: pick(rng, &FIRST_NAMES),
        last_name: pick(rng, &LAST_NAMES),
        year_group,
        subjects,
        engagement: Engagement {
            homework_completion: rng.gen_range(0.6..1.0),
            online_participation: rng.gen_range(0.5..1.0),
            attendance: rng.gen_range(0.9..1.0),
        },
    }
}

fn pick(rng: &mut StdRng, names: &[&str]) -> String {
    names.choose(rng).copied().unwrap_or_default().to_string()
}

fn generate_history(rng: &mut StdRng, years: &[AcademicYear]) -> SubjectHistory {
    let worst = Grade::SCALE.len() as i64 - 1;

    years
        .iter()
        .enumerate()
        .map(|(offset, year)| {
            // Later years drift slightly towards better grades.
            let base = rng.gen_range(0..=worst) + rng.gen_range(-1..=1) - offset as i64;
            let predicted_rank = base.clamp(0, worst) as usize;
            let target_rank = if rng.gen_bool(0.3) {
                predicted_rank.saturating_sub(1)
            } else {
                predicted_rank
            };
            let mock_rank = if rng.gen_bool(0.4) {
                (predicted_rank + 1).min(worst as usize)
            } else {
                predicted_rank
            };
            let topic_rank = if rng.gen_bool(0.2) {
                predicted_rank.saturating_sub(1)
            } else {
                predicted_rank
            };

            let record = SubjectYearRecord {
                predicted_grade: grade_at(predicted_rank),
                target_grade: grade_at(target_rank),
                mock_exam_score: Some(round_to(rng.gen_range(40.0..100.0), 1)),
                assessments: vec![
                    Assessment {
                        name: "Mock 1".to_string(),
                        grade: grade_at(mock_rank),
                    },
                    Assessment {
                        name: "Topic Test".to_string(),
                        grade: grade_at(topic_rank),
                    },
                ],
                alps_grade: AlpsGrade::new(rng.gen_range(1..=9)).unwrap_or(AlpsGrade::PLACEHOLDER),
                alps_score: Some(round_to(rng.gen_range(0.5..1.1), 2)),
            };
            (*year, record)
        })
        .collect()
}

fn grade_at(rank: usize) -> Grade {
    Grade::from_rank(rank).unwrap_or(Grade::U)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
