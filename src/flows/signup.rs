//! Account creation. Like login, the result is only the local auth flag.

use tracing::info;

use super::login::{is_valid_email, sign_in, EMAIL, PASSWORD};
use crate::store::{AuthSession, SessionStore};
use crate::wizard::{Advance, Field, StepSpec, ValidationError, Wizard};

pub const CONFIRM_PASSWORD: Field = Field::new("confirm_password", "Confirm password");

pub const MIN_PASSWORD_LEN: usize = 8;

static SIGNUP_STEPS: [StepSpec; 1] = [StepSpec::new("Create account")];

/// Check all three fields; the first problem per field is reported
pub fn validate(email: &str, password: &str, confirm: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if email.is_empty() {
        errors.push(ValidationError::required(EMAIL));
    } else if !is_valid_email(email) {
        errors.push(ValidationError::invalid(EMAIL.name, "Please enter a valid email"));
    }

    if password.is_empty() {
        errors.push(ValidationError::required(PASSWORD));
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(ValidationError::invalid(
            PASSWORD.name,
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }

    if confirm.is_empty() {
        errors.push(ValidationError::invalid(
            CONFIRM_PASSWORD.name,
            "Please confirm your password",
        ));
    } else if password != confirm {
        errors.push(ValidationError::invalid(
            CONFIRM_PASSWORD.name,
            "Passwords do not match",
        ));
    }
    errors
}

pub struct SignupForm {
    wizard: Wizard<(), AuthSession>,
}

impl Default for SignupForm {
    fn default() -> Self {
        Self::new()
    }
}

impl SignupForm {
    pub fn new() -> Self {
        Self {
            wizard: Wizard::new(&SIGNUP_STEPS),
        }
    }

    pub fn wizard(&self) -> &Wizard<(), AuthSession> {
        &self.wizard
    }

    pub fn wizard_mut(&mut self) -> &mut Wizard<(), AuthSession> {
        &mut self.wizard
    }

    /// Validate and write the auth flag. Returns true once the account exists locally.
    pub fn submit(&mut self, store: &mut SessionStore) -> bool {
        let draft = self.wizard.draft();
        let email = draft.get(EMAIL.name).trim().to_string();
        let errors = validate(
            &email,
            draft.get(PASSWORD.name),
            draft.get(CONFIRM_PASSWORD.name),
        );
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
            remember_me: false,
        };
        let result = sign_in(store, &session).map(|()| session);
        if let Ok(session) = &result {
            info!(email = %session.email, "account created");
        }
        self.wizard.finish_submit(result);
        self.wizard.is_complete()
    }
}
