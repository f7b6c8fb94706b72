//! Activation history, newest first.

use tracing::info;

use crate::store::{ActivationRecord, SessionStore, StoreError};

#[derive(Debug, Default)]
pub struct HistoryView {
    records: Vec<ActivationRecord>,
}

impl HistoryView {
    pub fn load(store: &SessionStore) -> Self {
        Self {
            records: store.activation_history(),
        }
    }

    pub fn reload(&mut self, store: &SessionStore) {
        self.records = store.activation_history();
    }

    pub fn records(&self) -> &[ActivationRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self, store: &mut SessionStore) -> Result<(), StoreError> {
        store.clear_activation_history()?;
        info!(cleared = self.records.len(), "activation history cleared");
        self.records.clear();
        Ok(())
    }
}
