//! Core library for the TecCell admin gate.
//!
//! The shop site's admin panel is protected by a single operator password
//! kept on the device. This crate holds everything below the UI:
//!
//! - `auth`: session policy and the access controller state machine
//! - `storage`: key/value backends for the credential record
//! - `config`: configuration file and environment overrides
//! - `error`: error types shared by the above

pub mod auth;
pub mod config;
pub mod error;
pub mod storage;

pub use auth::{AccessController, AccessState, Phase, DEFAULT_PASSWORD};
pub use config::{Config, StoreBackend};
pub use error::{AuthError, StoreError};
pub use storage::{open_store, CredentialStore};
