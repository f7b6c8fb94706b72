//! Page composition: each screen's state and the calls it makes.
//!
//! Flows hold no terminal state; the UI renders them and forwards input.
//! The session store and gateway are passed in explicitly.

pub mod activation;
pub mod ask;
pub mod audience;
pub mod history;
pub mod login;
pub mod run;
pub mod setup;
pub mod signup;
pub mod sources;

pub use activation::{ActivationFlow, Destination, ScheduleKind};
pub use ask::AskForm;
pub use audience::{AudienceFlow, SegmentBuilder};
pub use history::HistoryView;
pub use login::LoginForm;
pub use run::SnapshotForm;
pub use setup::{SetupFlow, SourceKind, SOURCE_CATALOG};
pub use signup::SignupForm;
pub use sources::SourceDirectory;

#[cfg(test)]
pub(crate) mod tests;
