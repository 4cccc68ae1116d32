use anyhow::Context;

use crate::chat::ChatMessage;
use crate::intervention::InterventionCandidate;

pub const TRACKER_HEADER: &str = "Student Name,Current Predicted Grade,Target Grade (Min),Gap,Suggested Priority,Suggested Interventions,Intervention Start Date,Intervention Type,Progress Check 1 (Date/Notes),Progress Check 2 (Date/Notes),Outcome";

/// Empty columns staff fill in while tracking an intervention.
const TRACKING_COLUMNS: usize = 5;

pub fn tracker_file_name(subject: &str) -> String {
    format!(
        "intervention_tracker_{}.csv",
        subject.split_whitespace().collect::<Vec<_>>().join("_")
    )
}

fn quoting_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> anyhow::Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|error| anyhow::anyhow!("failed to flush CSV writer: {}", error.error()))?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

/// Builds the intervention tracker: one row per candidate, then the chat transcript.
pub fn build_tracker_csv(
    candidates: &[InterventionCandidate],
    transcript: &[ChatMessage],
) -> anyhow::Result<String> {
    let mut rows = quoting_writer();
    for candidate in candidates {
        let gap = candidate.gap.to_string();
        let priority = candidate.priority.to_string();
        let predicted = candidate.predicted_grade.to_string();
        let target = candidate.target_grade.to_string();
        let mut fields = vec![
            candidate.student_name.as_str(),
            predicted.as_str(),
            target.as_str(),
            gap.as_str(),
            priority.as_str(),
            candidate.suggestion,
        ];
        fields.extend(std::iter::repeat("").take(TRACKING_COLUMNS));
        rows.write_record(&fields)?;
    }

    let mut chat = quoting_writer();
    chat.write_record(["--- Chat History ---"])?;
    chat.write_record(["Sender", "Message"])?;
    for message in transcript {
        chat.write_record([message.sender.label(), message.text.as_str()])?;
    }

    let mut output = String::new();
    output.push_str(TRACKER_HEADER);
    output.push('\n');
    output.push_str(&finish(rows)?);
    output.push('\n');
    output.push_str(&finish(chat)?);
    Ok(output)
}
