use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::completion::TextCompletion;
use crate::error::ChatError;

const PREAMBLE: &str =
    "You are an AI assistant for Alpha Education, analyzing school performance data.";
const FORMATTING_INSTRUCTION: &str = "When providing detailed plans, steps, or lists of items, please format your response using Markdown tables or bullet points for better readability.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sender {
    User,
    Assistant,
    Error,
}

impl Sender {
    pub fn label(self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "AI",
            Sender::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
            sent_at: Utc::now(),
        }
    }
}

pub fn build_prompt(context: &str, question: &str) -> String {
    format!("{PREAMBLE}\n{context}\n\n{FORMATTING_INSTRUCTION}\n\nUser Question: {question}\n\nAnswer:")
}

/// One chat pane. At most one completion request is outstanding per surface.
#[derive(Debug)]
pub struct ChatSurface {
    name: String,
    in_flight: AtomicBool,
    transcript: Mutex<Vec<ChatMessage>>,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ChatSurface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            in_flight: AtomicBool::new(false),
            transcript: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.messages().clone()
    }

    // Only whole messages are pushed, so a poisoned transcript is still consistent.
    fn messages(&self) -> MutexGuard<'_, Vec<ChatMessage>> {
        self.transcript.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, message: ChatMessage) {
        self.messages().push(message);
    }

    fn acquire(&self) -> Result<InFlight<'_>, ChatError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlight(&self.in_flight))
            .map_err(|_| ChatError::Busy(self.name.clone()))
    }

    /// Sends `question` with `context` as grounding. Failures are recorded in the
    /// transcript as error entries and returned.
    pub async fn ask(
        &self,
        completion: &dyn TextCompletion,
        context: &str,
        question: &str,
    ) -> Result<String, ChatError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let _guard = self.acquire()?;
        self.record(ChatMessage::new(Sender::User, question));

        let prompt = build_prompt(context, question);
        debug!(surface = %self.name, prompt_len = prompt.len(), "asking assistant");

        match completion.complete(&prompt).await {
            Ok(answer) => {
                self.record(ChatMessage::new(Sender::Assistant, answer.clone()));
                Ok(answer)
            }
            Err(error) => {
                warn!(surface = %self.name, %error, "completion failed");
                self.record(ChatMessage::new(
                    Sender::Error,
                    format!("Error communicating with AI: {error}"),
                ));
                Err(ChatError::Communication(error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommunicationError;
    use async_trait::async_trait;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::Arc;
    use tokio::sync::Notify;

    #[test]
    fn transcript_survives_poisoned_lock() {
        let surface = ChatSurface::new("intervention");
        surface.record(ChatMessage::new(Sender::User, "before"));

        let _ = panic::catch_unwind(AssertUnwindSafe(|| {
            let _held = surface.transcript.lock().unwrap();
            panic!("panicked while holding the transcript");
        }));
        assert!(surface.transcript.is_poisoned());

        surface.record(ChatMessage::new(Sender::Assistant, "after"));
        let texts: Vec<String> = surface.transcript().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["before", "after"]);
    }

    struct Echo;

    #[async_trait]
    impl TextCompletion for Echo {
        async fn complete(&self, prompt: &str) -> Result<String, CommunicationError> {
            Ok(format!("echo: {}", prompt.len()))
        }
    }

    struct Failing;

    #[async_trait]
    impl TextCompletion for Failing {
        async fn complete(&self, _prompt: &str) -> Result<String, CommunicationError> {
            Err(CommunicationError::new("connection refused"))
        }
    }

    /// Blocks until released, so a request stays in flight.
    struct Gate {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl TextCompletion for Gate {
        async fn complete(&self, _prompt: &str) -> Result<String, CommunicationError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok("done".to_string())
        }
    }

    #[test]
    fn prompt_places_context_before_question() {
        let prompt = build_prompt("Context: 3 students.", "Who is at risk?");
        assert!(prompt.starts_with(PREAMBLE));
        let context_at = prompt.find("Context: 3 students.").unwrap();
        let question_at = prompt.find("User Question: Who is at risk?").unwrap();
        assert!(context_at < question_at);
        assert!(prompt.ends_with("Answer:"));
    }

    #[tokio::test]
    async fn successful_answer_is_recorded() {
        let surface = ChatSurface::new("intervention");
        let answer = surface.ask(&Echo, "ctx", "  Who?  ").await.unwrap();

        assert!(answer.starts_with("echo: "));
        let transcript = surface.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].sender, Sender::User);
        assert_eq!(transcript[0].text, "Who?");
        assert_eq!(transcript[1].sender, Sender::Assistant);
        assert!(!surface.is_busy());
    }

    #[tokio::test]
    async fn communication_error_becomes_error_entry() {
        let surface = ChatSurface::new("prediction");
        let result = surface.ask(&Failing, "ctx", "Why?").await;

        assert_eq!(
            result,
            Err(ChatError::Communication(CommunicationError::new("connection refused")))
        );
        let transcript = surface.transcript();
        assert_eq!(transcript[1].sender, Sender::Error);
        assert_eq!(transcript[1].text, "Error communicating with AI: connection refused");
        assert!(!surface.is_busy());
    }

    #[tokio::test]
    async fn empty_question_is_rejected_without_transcript_entry() {
        let surface = ChatSurface::new("dashboard");
        assert_eq!(surface.ask(&Echo, "ctx", "   ").await, Err(ChatError::EmptyMessage));
        assert!(surface.transcript().is_empty());
    }

    #[tokio::test]
    async fn second_request_on_same_surface_is_busy() {
        let gate = Arc::new(Gate {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let surface = Arc::new(ChatSurface::new("benchmarking"));
        let other = ChatSurface::new("intervention");

        let first = {
            let surface = Arc::clone(&surface);
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { surface.ask(gate.as_ref(), "ctx", "first").await })
        };
        gate.entered.notified().await;

        assert!(surface.is_busy());
        assert_eq!(
            surface.ask(&Echo, "ctx", "second").await,
            Err(ChatError::Busy("benchmarking".to_string()))
        );
        // Independent surfaces are unaffected.
        assert!(other.ask(&Echo, "ctx", "elsewhere").await.is_ok());

        gate.release.notify_one();
        assert_eq!(first.await.unwrap(), Ok("done".to_string()));
        assert!(!surface.is_busy());
        assert!(surface.ask(&Echo, "ctx", "third").await.is_ok());
    }
}
