//! Rules for choosing a new admin password.
//!
//! The controller trusts its caller; screens that collect a new password run
//! it through [`PasswordRules::validate`] first.

use serde::Serialize;
use thiserror::Error;

use super::DEFAULT_PASSWORD;
use crate::config::DEFAULT_MIN_PASSWORD_LENGTH;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordViolation {
    #[error("The new password must be at least {0} characters long")]
    TooShort(usize),

    #[error("The new password needs at least one lowercase letter, one uppercase letter and one number")]
    MissingCharacterClass,

    #[error("The new password must differ from the default password")]
    SameAsDefault,

    #[error("The new password must differ from the current one")]
    SameAsCurrent,

    #[error("The passwords do not match")]
    Mismatch,
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordRules {
    pub min_length: usize,
}

impl Default for PasswordRules {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }
}

impl PasswordRules {
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }

    /// Check a new password and its confirmation. Rules are checked in the
    /// order the setup screen reports them.
    pub fn validate(&self, new_password: &str, confirmation: &str) -> Result<(), PasswordViolation> {
        if new_password.chars().count() < self.min_length {
            return Err(PasswordViolation::TooShort(self.min_length));
        }
        if new_password == DEFAULT_PASSWORD {
            return Err(PasswordViolation::SameAsDefault);
        }
        if new_password != confirmation {
            return Err(PasswordViolation::Mismatch);
        }
        let has_lower = new_password.chars().any(|c| c.is_lowercase());
        let has_upper = new_password.chars().any(|c| c.is_uppercase());
        let has_digit = new_password.chars().any(|c| c.is_ascii_digit());
        if !(has_lower && has_upper && has_digit) {
            return Err(PasswordViolation::MissingCharacterClass);
        }
        Ok(())
    }

    /// Same as [`validate`](Self::validate), and the password must change.
    pub fn validate_change(
        &self,
        current: &str,
        new_password: &str,
        confirmation: &str,
    ) -> Result<(), PasswordViolation> {
        self.validate(new_password, confirmation)?;
        if new_password == current {
            return Err(PasswordViolation::SameAsCurrent);
        }
        Ok(())
    }
}

/// Rough strength indicator shown while typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum PasswordStrength {
    Empty = 0,
    VeryWeak = 1,
    Weak = 2,
    Medium = 3,
    Strong = 4,
}

impl PasswordStrength {
    pub fn of(password: &str) -> Self {
        match password.chars().count() {
            0 => PasswordStrength::Empty,
            1..=3 => PasswordStrength::VeryWeak,
            4..=5 => PasswordStrength::Weak,
            6..=7 => PasswordStrength::Medium,
            _ => PasswordStrength::Strong,
        }
    }

    pub fn level(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            PasswordStrength::Empty => "",
            PasswordStrength::VeryWeak => "Very weak",
            PasswordStrength::Weak => "Weak",
            PasswordStrength::Medium => "Medium",
            PasswordStrength::Strong => "Strong",
        }
    }
}
