//! Command-line maintenance commands that run without the TUI.
//!
//! - `--status`: print the access state as JSON
//! - `--reset-admin`: wipe the admin password after confirmation
//! - `--set-password`: run first-time setup with hidden input

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use teccell_core::auth::{AccessState, PasswordRules, Phase};
use teccell_core::{Config, StoreBackend, DEFAULT_PASSWORD};

use crate::app::{App, Gate, RESET_CONFIRMATION};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    #[serde(flatten)]
    access: AccessState,
    phase: Phase,
    session_expiry: Option<DateTime<Utc>>,
    store_backend: StoreBackend,
}

fn open_gate(config: &Config) -> Result<Gate> {
    App::open_gate(config).context("Failed to open credential store")
}

pub fn status(config: &Config) -> Result<()> {
    let gate = open_gate(config)?;
    let report = StatusReport {
        access: gate.state(),
        phase: gate.phase(),
        session_expiry: gate.session_expiry(),
        store_backend: config.store_backend,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

pub fn reset_admin(config: &Config) -> Result<()> {
    let mut gate = open_gate(config)?;

    println!("\n=== Reset admin access ===\n");
    println!("This will:");
    println!("  - erase the current admin password");
    println!("  - end any active session");
    println!("  - accept the default password '{}' again\n", DEFAULT_PASSWORD);

    let answer = prompt_line(&format!("Type {} to continue: ", RESET_CONFIRMATION))?;
    if answer != RESET_CONFIRMATION {
        println!("Reset cancelled.");
        return Ok(());
    }

    gate.reset_to_default()?;
    info!("Admin access reset from the command line");
    println!("Admin access reset. Log in with the default password to set a new one.");
    Ok(())
}

pub fn set_password(config: &Config) -> Result<()> {
    let mut gate = open_gate(config)?;
    if !gate.state().needs_password_setup {
        bail!("An admin password is already set. Run --reset-admin first.");
    }

    // Collect everything before a session is written
    println!("\n=== Initial admin setup ===\n");
    let current = rpassword::prompt_password("Default password: ")?;
    let new_password = rpassword::prompt_password("New password: ")?;
    let confirmation = rpassword::prompt_password("Confirm new password: ")?;

    let rules = PasswordRules::new(config.min_password_length);
    if let Err(violation) = rules.validate(&new_password, &confirmation) {
        bail!("{}", violation);
    }

    apply_initial_password(&mut gate, &current, &new_password)?;
    println!("\nAdmin password set.");
    Ok(())
}

/// Sign in with the default password and replace it. The first-access
/// session is ended again if setup does not go through.
fn apply_initial_password(gate: &mut Gate, current: &str, new_password: &str) -> Result<()> {
    if !gate.login(current)? {
        bail!("Incorrect default password");
    }
    if let Err(e) = gate.complete_first_time_setup(new_password) {
        if let Err(logout_err) = gate.logout() {
            warn!(error = %logout_err, "Could not end the first-access session");
        }
        return Err(e.into());
    }
    info!("Admin password set from the command line");
    Ok(())
}
