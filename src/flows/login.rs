//! Login gate. The stored flag is a presence check, not a credential check.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use crate::store::{AuthSession, SessionStore, StoreError};
use crate::wizard::{Advance, Field, StepSpec, ValidationError, Wizard};

pub const EMAIL: Field = Field::new("email", "Email");
pub const PASSWORD: Field = Field::new("password", "Password");

static EMAIL_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").ok());

static LOGIN_STEPS: [StepSpec; 1] = [StepSpec::new("Sign in").require(&[EMAIL, PASSWORD])];

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.as_ref().is_some_and(|re| re.is_match(email))
}

/// Validate the pair the way the form does, email first
pub fn validate(email: &str, password: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let email = email.trim();
    if email.is_empty() {
        errors.push(ValidationError::required(EMAIL));
    } else if !is_valid_email(email) {
        errors.push(ValidationError::invalid(EMAIL.name, "Please enter a valid email"));
    }
    if password.is_empty() {
        errors.push(ValidationError::required(PASSWORD));
    }
    errors
}

pub struct LoginForm {
    wizard: Wizard<(), AuthSession>,
    remember_me: bool,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginForm {
    pub fn new() -> Self {
        Self {
            wizard: Wizard::new(&LOGIN_STEPS),
            remember_me: false,
        }
    }

    pub fn wizard(&self) -> &Wizard<(), AuthSession> {
        &self.wizard
    }

    pub fn wizard_mut(&mut self) -> &mut Wizard<(), AuthSession> {
        &mut self.wizard
    }

    pub fn remember_me(&self) -> bool {
        self.remember_me
    }

    pub fn toggle_remember_me(&mut self) {
        self.remember_me = !self.remember_me;
    }

    /// Validate and write the auth flag. Returns true once signed in.
    pub fn submit(&mut self, store: &mut SessionStore) -> bool {
        let draft = self.wizard.draft();
        let email = draft.get(EMAIL.name).trim().to_string();
        let errors = validate(&email, draft.get(PASSWORD.name));
        if !errors.is_empty() {
            for error in errors {
                self.wizard.reject_field(error);
            }
            return false;
        }
        if self.wizard.advance() != Advance::Submit || !self.wizard.begin_submit() {
            return false;
        }

        let session = AuthSession {
            email,
            remember_me: self.remember_me,
        };
        let result = sign_in(store, &session).map(|()| session);
        self.wizard.finish_submit(result);
        self.wizard.is_complete()
    }
}

pub fn sign_in(store: &mut SessionStore, session: &AuthSession) -> Result<(), StoreError> {
    store.sign_in(session)?;
    info!(email = %session.email, "signed in");
    Ok(())
}

pub fn sign_out(store: &mut SessionStore) -> Result<(), StoreError> {
    store.sign_out()?;
    info!("signed out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("krish@initro.ai"));
        assert!(!is_valid_email("krish@initro"));
        assert!(!is_valid_email("krish initro.ai"));
        // Unanchored: any substring shaped like an address passes
        assert!(is_valid_email("x y@a.io"));
    }

    #[test]
    fn test_validation_messages() {
        let errors = validate("", "");
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert_eq!(messages, vec!["Email is required", "Password is required"]);

        let errors = validate("nope", "secret");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "Please enter a valid email");
    }

    #[test]
    fn test_submit_writes_auth_flag() {
        let mut store = SessionStore::in_memory();
        let mut form = LoginForm::new();
        form.wizard_mut().set_field("email", " krish@initro.ai ");
        form.wizard_mut().set_field("password", "hunter2");
        form.toggle_remember_me();

        assert!(form.submit(&mut store));
        let auth = store.auth().unwrap();
        assert_eq!(auth.email, "krish@initro.ai");
        assert!(auth.remember_me);
    }

    #[test]
    fn test_invalid_submit_leaves_store_untouched() {
        let mut store = SessionStore::in_memory();
        let mut form = LoginForm::new();
        form.wizard_mut().set_field("email", "bad");

        assert!(!form.submit(&mut store));
        assert!(!store.is_authenticated());
        assert!(form.wizard().field_error("email").is_some());
        assert!(form.wizard().field_error("password").is_some());
    }

    #[test]
    fn test_failed_write_keeps_gate_closed() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let mut store = SessionStore::open(&blocker.join("state"));

        let mut form = LoginForm::new();
        form.wizard_mut().set_field("email", "krish@initro.ai");
        form.wizard_mut().set_field("password", "hunter2");

        assert!(!form.submit(&mut store));
        assert!(form.wizard().error().is_some());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_sign_out_clears_flag() {
        let mut store = SessionStore::in_memory();
        sign_in(
            &mut store,
            &AuthSession {
                email: "a@b.co".to_string(),
                remember_me: false,
            },
        )
        .unwrap();
        sign_out(&mut store).unwrap();
        assert!(!store.is_authenticated());
    }
}
