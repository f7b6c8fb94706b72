//! Natural-language question answered by `POST /sql/query`.

use tracing::{info, warn};

use crate::api::{Gateway, QueryAnswer};

#[derive(Debug, Default)]
pub struct AskForm {
    pub question: String,
    loading: bool,
    answer: Option<QueryAnswer>,
    error: Option<String>,
}

impl AskForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn answer(&self) -> Option<&QueryAnswer> {
        self.answer.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn submit(&mut self, gateway: &dyn Gateway) -> bool {
        if self.loading {
            return false;
        }
        let question = self.question.trim().to_string();
        if question.is_empty() {
            self.error = Some("Please enter a question.".to_string());
            return false;
        }

        self.loading = true;
        self.answer = None;
        self.error = None;
        let outcome = gateway.ask(&question).await;
        self.loading = false;

        match outcome {
            Ok(answer) => {
                info!(rows = answer.results.len(), "question answered");
                self.answer = Some(answer);
                true
            }
            Err(e) => {
                warn!(error = %e, "question failed");
                self.error = Some(format!("Failed to fetch data: {e}"));
                false
            }
        }
    }

    /// Result rows as indented JSON
    pub fn results_text(&self) -> Option<String> {
        let answer = self.answer.as_ref()?;
        serde_json::to_string_pretty(&answer.results).ok()
    }
}
