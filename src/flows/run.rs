//! Segmented snapshot: `POST /run` splits a question into sub-queries and
//! returns each one's rows or error.

use tracing::{info, warn};

use crate::api::{Gateway, RunResponse, SegmentResult};

#[derive(Debug, Default)]
pub struct SnapshotForm {
    pub query: String,
    loading: bool,
    response: Option<RunResponse>,
    error: Option<String>,
}

impl SnapshotForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn response(&self) -> Option<&RunResponse> {
        self.response.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Run the snapshot. A blank query sends nothing and keeps the last result.
    pub async fn submit(&mut self, gateway: &dyn Gateway) -> bool {
        if self.loading {
            return false;
        }
        let query = self.query.trim().to_string();
        if query.is_empty() {
            return false;
        }

        self.loading = true;
        self.error = None;
        let outcome = gateway.run_query(&query).await;
        self.loading = false;

        match outcome {
            Ok(response) => {
                info!(
                    segments = response.segments.len(),
                    failed = response.segments.iter().filter(|s| s.error.is_some()).count(),
                    "snapshot ready"
                );
                self.response = Some(response);
                true
            }
            Err(e) => {
                warn!(error = %e, "snapshot failed");
                self.error = Some(e.to_string());
                self.response = None;
                false
            }
        }
    }

    /// Segments that came back with rows
    pub fn succeeded(&self) -> impl Iterator<Item = &SegmentResult> {
        self.segments().filter(|s| s.error.is_none())
    }

    /// Segments the backend could not run
    pub fn failed(&self) -> impl Iterator<Item = &SegmentResult> {
        self.segments().filter(|s| s.error.is_some())
    }

    fn segments(&self) -> impl Iterator<Item = &SegmentResult> {
        self.response.iter().flat_map(|r| r.segments.iter())
    }
}
