//! Audience page: saved segments with multi-select, plus the segment
//! builder (describe → preview → save).

use chrono::Utc;
use tracing::{info, warn};

use crate::api::{
    ApiError, Gateway, PreviewSegment, RecordId, SaveSegment, Segment, SegmentPreview,
};
use crate::store::{CacheEntry, RecordCache};
use crate::wizard::{Advance, Field, StepSpec, ValidationError, Wizard};

pub const QUERY: Field = Field::new("query", "Segment criteria");
pub const SEGMENT_NAME: Field = Field::new("name", "Segment Name");

/// Save is the terminal submit, so it stays blocked until a preview is selected
static BUILDER_STEPS: [StepSpec; 1] = [StepSpec::new("Build").needs_selection()];

/// Labels of the page-level indicator
pub const AUDIENCE_STEPS: [&str; 2] = ["Segment", "Activation"];

pub struct SegmentBuilder {
    wizard: Wizard<SegmentPreview, Segment>,
    previewing: bool,
}

impl Default for SegmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentBuilder {
    pub fn new() -> Self {
        Self {
            wizard: Wizard::new(&BUILDER_STEPS),
            previewing: false,
        }
    }

    pub fn wizard(&self) -> &Wizard<SegmentPreview, Segment> {
        &self.wizard
    }

    pub fn wizard_mut(&mut self) -> &mut Wizard<SegmentPreview, Segment> {
        &mut self.wizard
    }

    pub fn preview(&self) -> Option<&SegmentPreview> {
        self.wizard.selection()
    }

    pub fn is_previewing(&self) -> bool {
        self.previewing
    }

    pub fn can_save(&self) -> bool {
        self.preview().is_some() && !self.previewing && !self.wizard.is_submitting()
    }

    /// `create-and-run` body; a blank name is left out entirely
    pub fn preview_request(&self) -> Result<PreviewSegment, ValidationError> {
        let draft = self.wizard.draft();
        let query = draft
            .value(QUERY.name)
            .ok_or_else(|| ValidationError::required(QUERY))?;
        Ok(PreviewSegment {
            query: query.to_string(),
            name: draft.value(SEGMENT_NAME.name).map(str::to_string),
        })
    }

    /// Generate SQL and a count without saving
    pub async fn run_preview(&mut self, gateway: &dyn Gateway) -> bool {
        if self.previewing || self.wizard.is_submitting() {
            return false;
        }
        let request = match self.preview_request() {
            Ok(request) => request,
            Err(e) => {
                self.wizard.reject_field(e);
                return false;
            }
        };

        self.previewing = true;
        let outcome = gateway.preview_segment(&request).await;
        self.previewing = false;

        match outcome {
            Ok(preview) => {
                info!(name = %preview.name, count = preview.count, "segment previewed");
                self.wizard.set_field(SEGMENT_NAME.name, preview.name.clone());
                self.wizard.select_option(preview);
                true
            }
            Err(e) => {
                warn!(error = %e, "segment preview failed");
                self.wizard.set_error(match e {
                    ApiError::Network { .. } => format!("Error creating segment: {e}"),
                    other => format!("Error: {other}"),
                });
                false
            }
        }
    }

    /// `POST /segments` body: the typed name wins over the generated one
    pub fn save_request(&self) -> Option<SaveSegment> {
        let preview = self.preview()?;
        let name = self
            .wizard
            .draft()
            .value(SEGMENT_NAME.name)
            .unwrap_or(&preview.name)
            .to_string();
        Some(SaveSegment {
            natural_query: preview.natural_query.clone(),
            query: preview.generated_sql.clone(),
            name,
            description: preview.description.clone(),
            count: preview.count,
        })
    }

    /// Start the save; `None` when blocked (no preview, or already saving)
    pub fn begin_save(&mut self) -> Option<SaveSegment> {
        if self.previewing || self.wizard.advance() != Advance::Submit {
            return None;
        }
        let request = self.save_request()?;
        self.wizard.begin_submit().then_some(request)
    }

    pub fn finish_save(&mut self, outcome: Result<Segment, ApiError>) {
        self.wizard.finish_submit(outcome.map_err(|e| match e {
            ApiError::Network { .. } => format!("Error saving segment: {e}"),
            other => format!("Error: {other}"),
        }));
    }

    pub fn saved(&self) -> Option<&Segment> {
        self.wizard.result()
    }
}

#[derive(Default)]
pub struct AudienceFlow {
    segments: RecordCache<Segment>,
    selected: Vec<RecordId>,
    builder: Option<SegmentBuilder>,
    error: Option<String>,
}

impl AudienceFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[CacheEntry<Segment>] {
        self.segments.entries()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn refresh(&mut self, gateway: &dyn Gateway) -> Result<(), ApiError> {
        self.error = None;
        match gateway.list_segments().await {
            Ok(segments) => {
                info!(count = segments.len(), "segments refreshed");
                self.segments.replace_with_server(segments);
                let known: Vec<RecordId> = self.segments.records().map(|s| s.id.clone()).collect();
                self.selected.retain(|id| known.contains(id));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch segments");
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    // ─── Selection ──────────────────────────────────────────────────────────

    pub fn is_selected(&self, id: &RecordId) -> bool {
        self.selected.contains(id)
    }

    /// Toggle the confirmed row at `index`; pending rows are not selectable
    pub fn toggle(&mut self, index: usize) {
        let Some(CacheEntry::Confirmed(segment)) = self.segments.get(index) else {
            return;
        };
        let id = segment.id.clone();
        if let Some(pos) = self.selected.iter().position(|s| s == &id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(id);
        }
    }

    pub fn selected_segments(&self) -> Vec<&Segment> {
        self.segments
            .records()
            .filter(|s| self.selected.contains(&s.id))
            .collect()
    }

    /// Sum of counts over the selected segments
    pub fn total_count(&self) -> u64 {
        self.selected_segments().iter().map(|s| s.count).sum()
    }

    pub fn can_activate(&self) -> bool {
        !self.selected.is_empty()
    }

    // ─── Builder ────────────────────────────────────────────────────────────

    pub fn open_builder(&mut self) {
        self.builder = Some(SegmentBuilder::new());
    }

    pub fn close_builder(&mut self) {
        self.builder = None;
    }

    pub fn builder(&self) -> Option<&SegmentBuilder> {
        self.builder.as_ref()
    }

    pub fn builder_mut(&mut self) -> Option<&mut SegmentBuilder> {
        self.builder.as_mut()
    }

    /// Save the previewed segment. The row shows as pending while the call
    /// runs; on success it is confirmed, selected and the builder closes.
    pub async fn save_segment(&mut self, gateway: &dyn Gateway) -> bool {
        let Some(builder) = self.builder.as_mut() else {
            return false;
        };
        let Some(request) = builder.begin_save() else {
            return false;
        };

        let ticket = self.segments.insert_pending(Segment {
            id: RecordId::Text(String::new()),
            name: request.name.clone(),
            description: request.description.clone(),
            natural_query: request.natural_query.clone(),
            sql_query: request.query.clone(),
            count: request.count,
            created_at: Utc::now().to_rfc3339(),
        });

        let outcome = gateway.save_segment(&request).await;
        match &outcome {
            Ok(saved) => {
                info!(id = %saved.id, name = %saved.name, "segment saved");
                self.segments.confirm(ticket, saved.clone());
                if !self.selected.contains(&saved.id) {
                    self.selected.push(saved.id.clone());
                }
            }
            Err(e) => {
                warn!(error = %e, "segment save failed");
                self.segments.reject(ticket);
            }
        }
        builder.finish_save(outcome);

        let saved = builder.wizard().is_complete();
        if saved {
            self.builder = None;
        }
        saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preview() -> SegmentPreview {
        SegmentPreview {
            id: None,
            name: "Big Spenders".to_string(),
            description: "Customers With High Sales".to_string(),
            natural_query: "Customers with $500+ sales last year".to_string(),
            generated_sql: "SELECT * FROM customers".to_string(),
            count: 1204,
        }
    }

    #[test]
    fn test_preview_request_requires_query() {
        let builder = SegmentBuilder::new();
        let err = builder.preview_request().unwrap_err();
        assert_eq!(err.field(), "query");
    }

    #[test]
    fn test_blank_name_is_omitted() {
        let mut builder = SegmentBuilder::new();
        builder.wizard_mut().set_field("query", "Customers with $500+ sales last year");
        builder.wizard_mut().set_field("name", "  ");
        assert!(builder.preview_request().unwrap().name.is_none());
    }

    #[test]
    fn test_save_blocked_before_preview() {
        let mut builder = SegmentBuilder::new();
        assert!(!builder.can_save());
        assert!(builder.begin_save().is_none());
        assert!(!builder.wizard().is_submitting());
    }

    #[test]
    fn test_save_request_prefers_typed_name() {
        let mut builder = SegmentBuilder::new();
        builder.wizard_mut().select_option(preview());
        assert_eq!(builder.save_request().unwrap().name, "Big Spenders");

        builder.wizard_mut().set_field("name", "Whales");
        let request = builder.save_request().unwrap();
        assert_eq!(request.name, "Whales");
        assert_eq!(request.query, "SELECT * FROM customers");
        assert_eq!(request.count, 1204);
    }

    #[test]
    fn test_begin_save_refuses_duplicates() {
        let mut builder = SegmentBuilder::new();
        builder.wizard_mut().select_option(preview());
        assert!(builder.begin_save().is_some());
        assert!(builder.begin_save().is_none());
    }

    #[test]
    fn test_failed_save_keeps_builder_open_with_error() {
        let mut builder = SegmentBuilder::new();
        builder.wizard_mut().select_option(preview());
        builder.begin_save();
        builder.finish_save(Err(ApiError::server(500, "Failed to save segment")));
        assert_eq!(builder.wizard().error(), Some("Error: Failed to save segment"));
        assert!(builder.can_save());
    }
}
