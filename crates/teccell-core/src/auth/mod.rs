//! Admin access control for the shop site.
//!
//! This module provides:
//! - `CredentialRecord`: the per-device setup/password/session record
//! - `policy`: pure evaluation of a record against the current time
//! - `AccessController`: login, first-time setup, logout and reset
//! - `PasswordRules`: validation applied by screens that collect a new password
//!
//! Until first-time setup the gate opens with [`DEFAULT_PASSWORD`]. Sessions
//! expire 24 hours after login; expiry is checked lazily on every read.

pub mod clock;
pub mod controller;
pub mod digest;
pub mod password;
pub mod policy;
pub mod record;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::AccessController;
pub use digest::PasswordDigest;
pub use password::{PasswordRules, PasswordStrength, PasswordViolation};
pub use policy::{AccessState, Phase};
pub use record::CredentialRecord;

/// Password accepted before first-time setup has been completed.
pub const DEFAULT_PASSWORD: &str = "admin";
