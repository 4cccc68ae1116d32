//! Descriptive analytics over a school's student performance records: intervention
//! targeting, exam-risk prediction, class dashboards and multi-year benchmarking,
//! plus the context summaries that ground the chat assistant.

pub mod benchmark;
pub mod catalog;
pub mod chat;
pub mod completion;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod error;
pub mod export;
#[cfg(test)]
mod fixtures;
pub mod generator;
pub mod grade;
pub mod import;
pub mod intervention;
pub mod models;
pub mod report;
pub mod risk;
