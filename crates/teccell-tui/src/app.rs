//! Application state management for the TecCell admin gate.
//!
//! This module contains the core `App` struct: the access controller, the
//! form state for the login/setup/change-password screens, and the pure
//! function deciding which screen the gate shows.

use anyhow::Result;
use tracing::{debug, error, info, warn};

use teccell_core::auth::{AccessState, PasswordRules, PasswordStrength};
use teccell_core::storage::{open_store, CredentialStore};
use teccell_core::{AccessController, AuthError, Config, StoreError};

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Word the operator types to confirm a credential reset.
pub const RESET_CONFIRMATION: &str = "RESET";

/// Controller type used by the application.
pub type Gate = AccessController<Box<dyn CredentialStore>>;

// ============================================================================
// UI State Types
// ============================================================================

/// Which screen the gate shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateView {
    Loading,
    PasswordSetup,
    Login,
    Admin,
    PublicSite,
}

/// Decide the screen from the access state and whether the operator asked
/// for the admin area.
///
/// An authenticated first-access session always lands on password setup,
/// whatever was requested.
pub fn gate_view(access: &AccessState, wants_admin: bool) -> GateView {
    if access.loading {
        GateView::Loading
    } else if access.is_authenticated && access.needs_password_setup {
        GateView::PasswordSetup
    } else if !wants_admin {
        GateView::PublicSite
    } else if access.is_authenticated {
        GateView::Admin
    } else {
        GateView::Login
    }
}

/// Overlay state on top of the current view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ConfirmingReset,
    ConfirmingQuit,
    Quitting,
}

/// Field focus in the password forms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Current,
    New,
    Confirm,
    Button,
}

/// State of a password form (login, setup or change password).
#[derive(Debug, Clone)]
pub struct PasswordForm {
    pub current: String,
    pub new_password: String,
    pub confirmation: String,
    pub focus: FormField,
    pub error: Option<String>,
    fields: &'static [FormField],
}

const LOGIN_FIELDS: &[FormField] = &[FormField::Current, FormField::Button];
const SETUP_FIELDS: &[FormField] = &[FormField::New, FormField::Confirm, FormField::Button];
const CHANGE_FIELDS: &[FormField] = &[
    FormField::Current,
    FormField::New,
    FormField::Confirm,
    FormField::Button,
];

impl PasswordForm {
    fn with_fields(fields: &'static [FormField]) -> Self {
        Self {
            current: String::new(),
            new_password: String::new(),
            confirmation: String::new(),
            focus: fields[0],
            error: None,
            fields,
        }
    }

    pub fn login() -> Self {
        Self::with_fields(LOGIN_FIELDS)
    }

    pub fn setup() -> Self {
        Self::with_fields(SETUP_FIELDS)
    }

    pub fn change() -> Self {
        Self::with_fields(CHANGE_FIELDS)
    }

    pub fn fields(&self) -> &'static [FormField] {
        self.fields
    }

    pub fn focus_next(&mut self) {
        let idx = self.focus_index();
        self.focus = self.fields[(idx + 1) % self.fields.len()];
    }

    pub fn focus_prev(&mut self) {
        let idx = self.focus_index();
        self.focus = self.fields[(idx + self.fields.len() - 1) % self.fields.len()];
    }

    fn focus_index(&self) -> usize {
        self.fields.iter().position(|f| *f == self.focus).unwrap_or(0)
    }

    fn focused_text(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Current => Some(&mut self.current),
            FormField::New => Some(&mut self.new_password),
            FormField::Confirm => Some(&mut self.confirmation),
            FormField::Button => None,
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(text) = self.focused_text() {
            if can_add_password_char(text.chars().count(), c) {
                text.push(c);
            }
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(text) = self.focused_text() {
            text.pop();
        }
    }

    pub fn strength(&self) -> PasswordStrength {
        PasswordStrength::of(&self.new_password)
    }

    /// Wipe typed passwords, keeping the error for display.
    pub fn clear_secrets(&mut self) {
        self.current.clear();
        self.new_password.clear();
        self.confirmation.clear();
        self.focus = self.fields[0];
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    gate: Option<Gate>,
    opened: bool,
    pub storage_error: Option<String>,
    rules: PasswordRules,

    pub state: AppState,
    pub wants_admin: bool,
    pub changing_password: bool,

    pub login: PasswordForm,
    pub setup: PasswordForm,
    pub change: PasswordForm,
    pub reset_input: String,

    pub status_message: Option<String>,
    pub site_selection: usize,

    was_authenticated: bool,
}

impl App {
    /// Create the app in the loading state; call [`App::open`] next.
    pub fn new(config: Config) -> Self {
        let rules = PasswordRules::new(config.min_password_length);
        Self {
            config,
            gate: None,
            opened: false,
            storage_error: None,
            rules,

            state: AppState::Normal,
            wants_admin: false,
            changing_password: false,

            login: PasswordForm::login(),
            setup: PasswordForm::setup(),
            change: PasswordForm::change(),
            reset_input: String::new(),

            status_message: None,
            site_selection: 0,

            was_authenticated: false,
        }
    }

    /// Create the app around an already opened controller.
    pub fn with_gate(config: Config, gate: Gate) -> Self {
        let mut app = Self::new(config);
        app.was_authenticated = gate.is_authenticated();
        app.gate = Some(gate);
        app.opened = true;
        app
    }

    /// Open the configured credential store and controller.
    ///
    /// A storage failure is not fatal: the gate stays locked and the error
    /// is shown to the operator.
    pub fn open(&mut self) {
        match Self::open_gate(&self.config) {
            Ok(gate) => {
                debug!(phase = ?gate.phase(), "Access controller ready");
                self.was_authenticated = gate.is_authenticated();
                self.gate = Some(gate);
                self.storage_error = None;
            }
            Err(e) => {
                error!(error = %e, "Failed to open credential store");
                self.open_failed(&format!("Credential storage unavailable: {}", e));
                return;
            }
        }
        self.opened = true;
    }

    /// Leave the gate locked with `message` shown to the operator.
    pub fn open_failed(&mut self, message: &str) {
        self.gate = None;
        self.storage_error = Some(message.to_string());
        self.opened = true;
    }

    /// Build the controller for the configured backend.
    pub fn open_gate(config: &Config) -> Result<Gate> {
        let data_dir = config.data_dir()?;
        let store = open_store(config.store_backend, &data_dir)?;
        let gate = AccessController::new(store)?.with_session_ttl(config.session_ttl());
        Ok(gate)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn access_state(&self) -> AccessState {
        match self.gate {
            Some(ref gate) => gate.state(),
            None if !self.opened => AccessState::loading(),
            None => AccessState::unavailable(),
        }
    }

    pub fn view(&self) -> GateView {
        gate_view(&self.access_state(), self.wants_admin)
    }

    pub fn gate(&self) -> Option<&Gate> {
        self.gate.as_ref()
    }

    /// "23h 59m" style remaining session time for the admin panel.
    pub fn session_remaining_display(&self) -> Option<String> {
        let remaining = self.gate.as_ref()?.time_remaining()?;
        let minutes = remaining.num_minutes().max(0);
        Some(format!("{}h {:02}m", minutes / 60, minutes % 60))
    }

    /// Notice an expiry that happened while the UI was idle.
    pub fn tick(&mut self) {
        let authenticated = self.access_state().is_authenticated;
        if self.was_authenticated && !authenticated {
            info!("Session expired");
            self.changing_password = false;
            self.change = PasswordForm::change();
            if self.wants_admin {
                self.login = PasswordForm::login();
                self.login.error = Some("Session expired, please log in again".to_string());
            }
        }
        self.was_authenticated = authenticated;
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Open the admin area, or the login form if not signed in.
    pub fn request_admin(&mut self) {
        self.wants_admin = true;
        if !self.access_state().is_authenticated {
            self.login = PasswordForm::login();
        }
    }

    pub fn leave_admin(&mut self) {
        self.wants_admin = false;
        self.changing_password = false;
        self.login.clear_secrets();
        self.login.error = None;
    }

    pub fn start_reset(&mut self) {
        self.reset_input.clear();
        self.state = AppState::ConfirmingReset;
    }

    pub fn start_change_password(&mut self) {
        self.change = PasswordForm::change();
        self.changing_password = true;
    }

    // =========================================================================
    // Access operations
    // =========================================================================

    /// Submit the login form.
    pub fn attempt_login(&mut self) {
        let password = std::mem::take(&mut self.login.current);
        self.login.error = None;

        if password.is_empty() {
            self.login.error = Some("Password required".to_string());
            return;
        }

        let Some(gate) = self.gate.as_mut() else {
            self.login.error = Some(self.unavailable_message());
            return;
        };

        match gate.login(&password) {
            Ok(true) => {
                self.login = PasswordForm::login();
                self.was_authenticated = true;
                if gate.state().needs_password_setup {
                    self.setup = PasswordForm::setup();
                    self.status_message = Some("Choose a new admin password".to_string());
                } else {
                    self.status_message = Some("Signed in".to_string());
                }
            }
            Ok(false) => {
                self.login.error = Some("Incorrect password".to_string());
            }
            Err(e) => {
                error!(error = %e, "Login could not be completed");
                self.login.error = Some(e.user_message());
            }
        }
    }

    /// Submit the first-time password setup form.
    pub fn submit_setup(&mut self) {
        self.setup.error = None;
        if let Err(violation) = self
            .rules
            .validate(&self.setup.new_password, &self.setup.confirmation)
        {
            self.setup.error = Some(violation.to_string());
            return;
        }

        let new_password = std::mem::take(&mut self.setup.new_password);
        self.setup.confirmation.clear();

        let Some(gate) = self.gate.as_mut() else {
            self.setup.error = Some(self.unavailable_message());
            return;
        };

        match gate.complete_first_time_setup(&new_password) {
            Ok(()) => {
                self.setup = PasswordForm::setup();
                self.wants_admin = true;
                self.status_message = Some("Admin password set".to_string());
            }
            Err(e) => {
                error!(error = %e, "First-time setup failed");
                self.setup.error = Some(e.user_message());
                self.setup.focus = FormField::New;
            }
        }
    }

    /// Abandon setup: the first-access session ends.
    pub fn cancel_setup(&mut self) {
        self.setup = PasswordForm::setup();
        self.logout();
    }

    /// Submit the change-password form.
    pub fn submit_change_password(&mut self) {
        self.change.error = None;
        if let Err(violation) = self.rules.validate_change(
            &self.change.current,
            &self.change.new_password,
            &self.change.confirmation,
        ) {
            self.change.error = Some(violation.to_string());
            return;
        }

        let current = std::mem::take(&mut self.change.current);
        let new_password = std::mem::take(&mut self.change.new_password);
        self.change.confirmation.clear();

        let Some(gate) = self.gate.as_mut() else {
            self.change.error = Some(self.unavailable_message());
            return;
        };

        match gate.change_password(&current, &new_password) {
            Ok(true) => {
                self.changing_password = false;
                self.change = PasswordForm::change();
                self.status_message = Some("Password changed".to_string());
            }
            Ok(false) => {
                self.change.error = Some("Current password incorrect".to_string());
                self.change.focus = FormField::Current;
            }
            Err(e) => {
                error!(error = %e, "Password change failed");
                self.change.error = Some(e.user_message());
            }
        }
    }

    pub fn logout(&mut self) {
        if let Some(gate) = self.gate.as_mut() {
            if let Err(e) = gate.logout() {
                warn!(error = %e, "Logout could not be persisted");
                self.status_message = Some(e.user_message());
            } else {
                self.status_message = Some("Signed out".to_string());
            }
        }
        self.was_authenticated = false;
        self.leave_admin();
    }

    /// Reset to first access once the operator typed the confirmation word.
    pub fn confirm_reset(&mut self) -> Result<(), AuthError> {
        if self.reset_input != RESET_CONFIRMATION {
            self.status_message = Some("Reset cancelled".to_string());
            self.state = AppState::Normal;
            self.reset_input.clear();
            return Ok(());
        }

        self.state = AppState::Normal;
        self.reset_input.clear();
        let Some(gate) = self.gate.as_mut() else {
            return Err(StoreError::Unavailable(self.unavailable_message()).into());
        };
        gate.reset_to_default()?;
        self.was_authenticated = false;
        self.leave_admin();
        self.setup = PasswordForm::setup();
        self.status_message = Some("Admin reset: log in with the default password".to_string());
        Ok(())
    }

    fn unavailable_message(&self) -> String {
        self.storage_error
            .clone()
            .unwrap_or_else(|| "Credential storage unavailable".to_string())
    }
}

// ============================================================================
// Input validation helpers
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================
