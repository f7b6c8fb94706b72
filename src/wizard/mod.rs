//! Linear multi-step wizard state machine.
//!
//! `S1 → S2 → … → Sn → Complete`, with a back-edge `Si → Si-1` and a
//! cancel-edge to `S1`. Continue on the terminal step never increments;
//! it asks the caller to run the submit, and only a successful submit
//! reaches `Complete`.

pub mod draft;
pub mod stepper;

pub use draft::{Field, FormDraft, ValidationError};
pub use stepper::{status_of, step_views, StepStatus, StepView};

use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Static description of one step
#[derive(Debug, Clone, Copy)]
pub struct StepSpec {
    pub label: &'static str,
    /// Continue is blocked while the selection is empty
    pub needs_selection: bool,
    /// Draft fields that must be non-blank to continue
    pub required: &'static [Field],
}

impl StepSpec {
    pub const fn new(label: &'static str) -> Self {
        Self {
            label,
            needs_selection: false,
            required: &[],
        }
    }

    pub const fn needs_selection(mut self) -> Self {
        self.needs_selection = true;
        self
    }

    pub const fn require(mut self, fields: &'static [Field]) -> Self {
        self.required = fields;
        self
    }
}

/// Why Continue did not move
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Blocked {
    NoSelection,
    MissingFields(Vec<&'static str>),
    Submitting,
    Complete,
}

/// Outcome of Continue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the given 1-based step
    Moved(usize),
    Blocked(Blocked),
    /// Terminal step validated; the caller must run the submit
    Submit,
}

pub struct Wizard<S, R = ()> {
    steps: &'static [StepSpec],
    step: usize,
    selection: Option<S>,
    draft: FormDraft,
    field_errors: BTreeMap<&'static str, ValidationError>,
    submitting: bool,
    result: Option<R>,
    error: Option<String>,
    complete: bool,
}

impl<S, R> fmt::Debug for Wizard<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wizard")
            .field("step", &self.step)
            .field("steps", &self.steps.len())
            .field("has_selection", &self.selection.is_some())
            .field("submitting", &self.submitting)
            .field("complete", &self.complete)
            .finish()
    }
}

impl<S, R> Wizard<S, R> {
    pub fn new(steps: &'static [StepSpec]) -> Self {
        Self {
            steps,
            step: 1,
            selection: None,
            draft: FormDraft::new(),
            field_errors: BTreeMap::new(),
            submitting: false,
            result: None,
            error: None,
            complete: false,
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    /// Current 1-based step
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn is_terminal(&self) -> bool {
        self.step >= self.steps.len()
    }

    pub fn current(&self) -> Option<&StepSpec> {
        self.steps.get(self.step.saturating_sub(1))
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.label).collect()
    }

    pub fn step_views(&self) -> Vec<StepView<'static>> {
        step_views(&self.labels(), self.step)
    }

    pub fn selection(&self) -> Option<&S> {
        self.selection.as_ref()
    }

    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    pub fn field_error(&self, name: &str) -> Option<&ValidationError> {
        self.field_errors.get(name)
    }

    pub fn field_errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.field_errors.values()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result(&self) -> Option<&R> {
        self.result.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    // ─── Mutations ──────────────────────────────────────────────────────────

    /// Update one draft field; its validation error goes away
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) {
        self.draft.set(name, value);
        self.field_errors.remove(name);
    }

    pub fn draft_mut(&mut self) -> &mut FormDraft {
        &mut self.draft
    }

    /// Record a validation error the step rules cannot express
    pub fn reject_field(&mut self, error: ValidationError) {
        self.field_errors.insert(error.field(), error);
    }

    /// Surface an error without touching the step
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn select_option(&mut self, option: S) {
        self.selection = Some(option);
        self.error = None;
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Single-choice steps: pick and move on in one action
    pub fn select_and_advance(&mut self, option: S) -> Advance {
        self.select_option(option);
        self.advance()
    }

    /// Continue / Next
    pub fn advance(&mut self) -> Advance {
        if self.complete {
            return Advance::Blocked(Blocked::Complete);
        }
        if self.submitting {
            return Advance::Blocked(Blocked::Submitting);
        }
        let Some(spec) = self.current().copied() else {
            return Advance::Blocked(Blocked::Complete);
        };

        if spec.needs_selection && self.selection.is_none() {
            debug!(step = self.step, "advance blocked: no selection");
            return Advance::Blocked(Blocked::NoSelection);
        }

        let missing = self.draft.missing(spec.required);
        if !missing.is_empty() {
            let names: Vec<&'static str> = missing.iter().map(ValidationError::field).collect();
            for error in missing {
                self.field_errors.insert(error.field(), error);
            }
            debug!(step = self.step, ?names, "advance blocked: missing fields");
            return Advance::Blocked(Blocked::MissingFields(names));
        }

        self.field_errors.clear();
        self.error = None;
        if self.is_terminal() {
            return Advance::Submit;
        }
        self.step += 1;
        debug!(step = self.step, "wizard advanced");
        Advance::Moved(self.step)
    }

    /// Back: never below step 1; selection and draft are kept
    pub fn retreat(&mut self) -> bool {
        if self.submitting || self.step <= 1 {
            return false;
        }
        self.step -= 1;
        self.field_errors.clear();
        self.error = None;
        debug!(step = self.step, "wizard retreated");
        true
    }

    /// Back to step 1 with nothing selected and an empty draft
    pub fn cancel(&mut self) {
        self.step = 1;
        self.selection = None;
        self.draft.clear();
        self.field_errors.clear();
        self.submitting = false;
        self.result = None;
        self.error = None;
        self.complete = false;
        debug!("wizard cancelled");
    }

    /// Mark the terminal submit in flight. Refused while one is running.
    pub fn begin_submit(&mut self) -> bool {
        if self.submitting || self.complete {
            return false;
        }
        self.submitting = true;
        self.error = None;
        true
    }

    /// Apply the submit outcome. Failure leaves the step where it was.
    pub fn finish_submit<E: fmt::Display>(&mut self, outcome: Result<R, E>) {
        self.submitting = false;
        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.error = None;
                self.complete = true;
                debug!(step = self.step, "wizard complete");
            }
            Err(e) => {
                self.error = Some(e.to_string());
                debug!(step = self.step, error = %e, "wizard submit failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: Field = Field::new("name", "Name");
    const ACCOUNT: Field = Field::new("account", "Account");

    static STEPS: [StepSpec; 3] = [
        StepSpec::new("Select Source").needs_selection(),
        StepSpec::new("Connect").require(&[ACCOUNT]),
        StepSpec::new("Finish").require(&[NAME]),
    ];

    fn wizard() -> Wizard<&'static str, u32> {
        Wizard::new(&STEPS)
    }

    fn at_terminal() -> Wizard<&'static str, u32> {
        let mut w = wizard();
        w.select_and_advance("postgres");
        w.set_field("account", "acme");
        w.advance();
        w.set_field("name", "Warehouse");
        w
    }

    #[test]
    fn test_starts_on_step_one() {
        let w = wizard();
        assert_eq!(w.step(), 1);
        assert!(w.selection().is_none());
        assert!(w.draft().is_empty());
        assert!(!w.is_complete());
    }

    #[test]
    fn test_advance_requires_selection() {
        let mut w = wizard();
        assert_eq!(w.advance(), Advance::Blocked(Blocked::NoSelection));
        assert_eq!(w.step(), 1);
    }

    #[test]
    fn test_advance_increments_by_one_and_keeps_state() {
        let mut w = wizard();
        w.set_field("account", "acme");
        assert_eq!(w.select_and_advance("postgres"), Advance::Moved(2));
        assert_eq!(w.selection(), Some(&"postgres"));
        assert_eq!(w.draft().get("account"), "acme");

        assert_eq!(w.advance(), Advance::Moved(3));
        assert_eq!(w.selection(), Some(&"postgres"));
        assert_eq!(w.draft().get("account"), "acme");
    }

    #[test]
    fn test_missing_fields_block_and_record_errors() {
        let mut w = wizard();
        w.select_and_advance("postgres");

        assert_eq!(
            w.advance(),
            Advance::Blocked(Blocked::MissingFields(vec!["account"]))
        );
        assert_eq!(w.step(), 2);
        assert_eq!(
            w.field_error("account").map(ToString::to_string),
            Some("Account is required".to_string())
        );

        w.set_field("account", "acme");
        assert!(w.field_error("account").is_none());
        assert_eq!(w.advance(), Advance::Moved(3));
    }

    #[test]
    fn test_retreat_on_first_step_is_noop() {
        let mut w = wizard();
        assert!(!w.retreat());
        assert_eq!(w.step(), 1);
    }

    #[test]
    fn test_retreat_keeps_selection_and_draft() {
        let mut w = wizard();
        w.select_and_advance("postgres");
        w.set_field("account", "acme");
        assert!(w.retreat());
        assert_eq!(w.step(), 1);
        assert_eq!(w.selection(), Some(&"postgres"));
        assert_eq!(w.draft().get("account"), "acme");
    }

    #[test]
    fn test_cancel_resets_everything() {
        let mut w = at_terminal();
        w.set_error("boom");
        w.cancel();
        assert_eq!(w.step(), 1);
        assert!(w.selection().is_none());
        assert!(w.draft().is_empty());
        assert!(w.error().is_none());
    }

    #[test]
    fn test_terminal_advance_signals_submit_without_moving() {
        let mut w = at_terminal();
        assert_eq!(w.advance(), Advance::Submit);
        assert_eq!(w.step(), 3);
        assert!(!w.is_complete());
    }

    #[test]
    fn test_failed_submit_leaves_step_with_error() {
        let mut w = at_terminal();
        assert!(w.begin_submit());
        w.finish_submit(Err("HTTP 500"));
        assert_eq!(w.step(), 3);
        assert_eq!(w.error(), Some("HTTP 500"));
        assert!(!w.is_complete());
        assert!(!w.is_submitting());
    }

    #[test]
    fn test_successful_submit_completes_and_clears_error() {
        let mut w = at_terminal();
        w.begin_submit();
        w.finish_submit(Err("first try failed"));
        w.begin_submit();
        w.finish_submit(Ok::<u32, String>(7));
        assert!(w.is_complete());
        assert!(w.error().is_none());
        assert_eq!(w.result(), Some(&7));
        assert_eq!(w.advance(), Advance::Blocked(Blocked::Complete));
    }

    #[test]
    fn test_duplicate_submit_is_refused() {
        let mut w = at_terminal();
        assert!(w.begin_submit());
        assert!(!w.begin_submit());
        assert_eq!(w.advance(), Advance::Blocked(Blocked::Submitting));
        assert!(!w.retreat());
    }

    #[test]
    fn test_step_views_follow_current_step() {
        let mut w = wizard();
        w.select_and_advance("postgres");
        let views = w.step_views();
        assert_eq!(views[0].status, StepStatus::Completed);
        assert_eq!(views[1].status, StepStatus::Active);
        assert_eq!(views[2].status, StepStatus::Upcoming);
    }
}
