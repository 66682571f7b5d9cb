//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::error;

use crate::app::{App, AppState, FormField, GateView, PasswordForm};
use crate::site;

/// Outcome of a key press inside a password form.
enum FormAction {
    None,
    Submit,
    Cancel,
}

fn handle_form_key(form: &mut PasswordForm, key: KeyEvent) -> FormAction {
    match key.code {
        KeyCode::Esc => return FormAction::Cancel,
        KeyCode::Down | KeyCode::Tab => form.focus_next(),
        KeyCode::Up | KeyCode::BackTab => form.focus_prev(),
        KeyCode::Enter => {
            if form.focus == FormField::Button {
                return FormAction::Submit;
            }
            form.focus_next();
        }
        KeyCode::Backspace => form.pop_char(),
        KeyCode::Char(c) => form.push_char(c),
        _ => {}
    }
    FormAction::None
}

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle reset confirmation
    if matches!(app.state, AppState::ConfirmingReset) {
        match key.code {
            KeyCode::Esc => {
                app.reset_input.clear();
                app.state = AppState::Normal;
            }
            KeyCode::Enter => {
                if let Err(e) = app.confirm_reset() {
                    error!(error = %e, "Reset failed");
                    app.status_message = Some(e.user_message());
                }
            }
            KeyCode::Backspace => {
                app.reset_input.pop();
            }
            KeyCode::Char(c) if !c.is_control() && app.reset_input.len() < 16 => {
                app.reset_input.push(c);
            }
            _ => {}
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    // Reset is reachable from every screen
    if key.code == KeyCode::Char('r') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.start_reset();
        return Ok(false);
    }

    match app.view() {
        GateView::Loading => {}
        GateView::Login => match handle_form_key(&mut app.login, key) {
            FormAction::Submit => app.attempt_login(),
            FormAction::Cancel => app.leave_admin(),
            FormAction::None => {}
        },
        GateView::PasswordSetup => match handle_form_key(&mut app.setup, key) {
            FormAction::Submit => app.submit_setup(),
            FormAction::Cancel => app.cancel_setup(),
            FormAction::None => {}
        },
        GateView::Admin if app.changing_password => {
            match handle_form_key(&mut app.change, key) {
                FormAction::Submit => app.submit_change_password(),
                FormAction::Cancel => {
                    app.changing_password = false;
                    app.change = PasswordForm::change();
                }
                FormAction::None => {}
            }
        }
        GateView::Admin => match key.code {
            KeyCode::Char('c') => app.start_change_password(),
            KeyCode::Char('l') => app.logout(),
            KeyCode::Esc => app.leave_admin(),
            KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
            _ => {}
        },
        GateView::PublicSite => match key.code {
            KeyCode::Char('a') => app.request_admin(),
            KeyCode::Char('q') | KeyCode::Esc => app.state = AppState::ConfirmingQuit,
            KeyCode::Down | KeyCode::Char('j') => {
                app.site_selection = (app.site_selection + 1).min(site::SERVICES.len() - 1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.site_selection = app.site_selection.saturating_sub(1);
            }
            _ => {}
        },
    }

    Ok(false)
}
