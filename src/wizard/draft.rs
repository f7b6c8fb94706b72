//! Controlled form draft: every keystroke updates the draft, submission reads it.

use std::collections::BTreeMap;
use thiserror::Error;

/// A named input with a human label used in validation messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub label: &'static str,
}

impl Field {
    pub const fn new(name: &'static str, label: &'static str) -> Self {
        Self { name, label }
    }
}

/// Client-side validation failure, raised before any network call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{label} is required")]
    Required { field: &'static str, label: &'static str },
    #[error("{message}")]
    Invalid { field: &'static str, message: String },
}

impl ValidationError {
    pub fn required(field: Field) -> Self {
        ValidationError::Required {
            field: field.name,
            label: field.label,
        }
    }

    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ValidationError::Invalid {
            field,
            message: message.into(),
        }
    }

    /// Name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Required { field, .. } | ValidationError::Invalid { field, .. } => {
                field
            }
        }
    }
}

/// Field name to current string value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormDraft {
    values: BTreeMap<String, String>,
}

impl FormDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    /// Current value; unset fields read as empty
    pub fn get(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    /// Trimmed value, `None` when blank
    pub fn value(&self, name: &str) -> Option<&str> {
        let trimmed = self.get(name).trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    pub fn is_filled(&self, name: &str) -> bool {
        self.value(name).is_some()
    }

    /// Set only if the field has never been touched
    pub fn set_default(&mut self, name: &str, value: impl Into<String>) {
        self.values
            .entry(name.to_string())
            .or_insert_with(|| value.into());
    }

    pub fn push_char(&mut self, name: &str, c: char) {
        self.values.entry(name.to_string()).or_default().push(c);
    }

    pub fn pop_char(&mut self, name: &str) {
        if let Some(value) = self.values.get_mut(name) {
            value.pop();
        }
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Presence check over `fields`, in order
    pub fn missing(&self, fields: &[Field]) -> Vec<ValidationError> {
        fields
            .iter()
            .filter(|f| !self.is_filled(f.name))
            .map(|f| ValidationError::required(*f))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT: Field = Field::new("account", "Account");
    const DATABASE: Field = Field::new("database", "Database");

    #[test]
    fn test_unset_fields_read_empty() {
        let draft = FormDraft::new();
        assert_eq!(draft.get("account"), "");
        assert!(draft.value("account").is_none());
    }

    #[test]
    fn test_whitespace_does_not_count_as_present() {
        let mut draft = FormDraft::new();
        draft.set("account", "   ");
        draft.set("database", "analytics");

        let missing = draft.missing(&[ACCOUNT, DATABASE]);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].field(), "account");
        assert_eq!(missing[0].to_string(), "Account is required");
    }

    #[test]
    fn test_set_default_keeps_user_edits() {
        let mut draft = FormDraft::new();
        draft.set("role", "ANALYST");
        draft.set_default("role", "DEFAULT");
        draft.set_default("name", "PostgreSQL");
        assert_eq!(draft.get("role"), "ANALYST");
        assert_eq!(draft.get("name"), "PostgreSQL");
    }

    #[test]
    fn test_char_editing() {
        let mut draft = FormDraft::new();
        draft.push_char("name", 'a');
        draft.push_char("name", 'b');
        draft.pop_char("name");
        assert_eq!(draft.get("name"), "a");
        draft.pop_char("missing");
        assert!(!draft.is_filled("missing"));
    }
}
