use crate::models::{ClassDefinition, TeacherDefinition};

pub const SUBJECTS: [&str; 12] = [
    "Mathematics",
    "Further Maths",
    "Physics",
    "Chemistry",
    "Biology",
    "English Literature",
    "History",
    "Geography",
    "Computer Science",
    "Art & Design",
    "French",
    "Spanish",
];

pub const DEFAULT_SUBJECT: &str = "Further Maths";

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

pub fn teachers() -> Vec<TeacherDefinition> {
    vec![
        TeacherDefinition {
            id: "teacher1".to_string(),
            name: "Ms. Evans".to_string(),
            subjects: owned(&["Physics", "Chemistry", "Biology"]),
        },
        TeacherDefinition {
            id: "teacher2".to_string(),
            name: "Mr. Jones".to_string(),
            subjects: owned(&["Mathematics", "Further Maths", "Computer Science"]),
        },
    ]
}

pub fn classes() -> Vec<ClassDefinition> {
    let class = |id: &str, name: &str, teacher: &str, subjects: &[&str], year_group: u8| {
        ClassDefinition {
            id: id.to_string(),
            name: name.to_string(),
            teacher_id: teacher.to_string(),
            subjects: owned(subjects),
            year_group,
        }
    };

    vec![
        class(
            "classA",
            "Year 9 - Set 1 Science",
            "teacher1",
            &["Physics", "Chemistry", "Biology"],
            9,
        ),
        class("classB", "Year 10 - Maths Group 2", "teacher2", &["Mathematics"], 10),
        class("classC", "Year 11 - GCSE Physics", "teacher1", &["Physics"], 11),
        class(
            "classD",
            "Year 12 - A-Level Further Maths",
            "teacher2",
            &["Further Maths"],
            12,
        ),
        class("classE", "Year 11 - GCSE CompSci", "teacher2", &["Computer Science"], 11),
    ]
}

pub fn find_class(id: &str) -> Option<ClassDefinition> {
    classes().into_iter().find(|class| class.id == id)
}

pub fn find_teacher(id: &str) -> Option<TeacherDefinition> {
    teachers().into_iter().find(|teacher| teacher.id == id)
}
