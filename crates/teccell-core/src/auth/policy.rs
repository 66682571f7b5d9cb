//! Session policy: what the stored record means right now.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::record::CredentialRecord;

/// Read-only access state handed to the UI gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AccessState {
    pub is_first_time_access: bool,
    pub is_authenticated: bool,
    pub needs_password_setup: bool,
    pub loading: bool,
}

impl AccessState {
    /// State shown before the credential record has been read.
    pub fn loading() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    /// State used when the credential store cannot be read at all.
    pub fn unavailable() -> Self {
        Self::default()
    }
}

/// Named states of the access state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Phase {
    NoSetup,
    FirstAccessAuthenticated,
    Authenticated,
    Unauthenticated,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::NoSetup => "not set up",
            Phase::FirstAccessAuthenticated => "first access",
            Phase::Authenticated => "signed in",
            Phase::Unauthenticated => "signed out",
        }
    }
}

/// A session is valid strictly before its expiry instant.
pub fn session_valid(record: &CredentialRecord, now: DateTime<Utc>) -> bool {
    record.session_active && record.session_expiry.map(|e| e > now).unwrap_or(false)
}

pub fn evaluate(record: &CredentialRecord, now: DateTime<Utc>) -> AccessState {
    let first_time = !record.setup_completed;
    AccessState {
        is_first_time_access: first_time,
        is_authenticated: session_valid(record, now),
        needs_password_setup: first_time,
        loading: false,
    }
}

pub fn phase(record: &CredentialRecord, now: DateTime<Utc>) -> Phase {
    match (record.setup_completed, session_valid(record, now)) {
        (false, false) => Phase::NoSetup,
        (false, true) => Phase::FirstAccessAuthenticated,
        (true, true) => Phase::Authenticated,
        (true, false) => Phase::Unauthenticated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn configured() -> CredentialRecord {
        CredentialRecord::default().with_password_hash("h".to_string())
    }

    #[test]
    fn test_fresh_record_needs_setup() {
        let state = evaluate(&CredentialRecord::default(), now());
        assert!(state.is_first_time_access);
        assert!(state.needs_password_setup);
        assert!(!state.is_authenticated);
        assert!(!state.loading);
        assert_eq!(phase(&CredentialRecord::default(), now()), Phase::NoSetup);
    }

    #[test]
    fn test_first_access_can_be_authenticated() {
        let record = CredentialRecord::default().with_session(now() + Duration::hours(1));
        let state = evaluate(&record, now());
        assert!(state.is_authenticated);
        assert!(state.needs_password_setup);
        assert_eq!(phase(&record, now()), Phase::FirstAccessAuthenticated);
    }

    #[test]
    fn test_configured_and_signed_in() {
        let record = configured().with_session(now() + Duration::hours(24));
        let state = evaluate(&record, now());
        assert!(state.is_authenticated);
        assert!(!state.is_first_time_access);
        assert!(!state.needs_password_setup);
        assert_eq!(phase(&record, now()), Phase::Authenticated);
    }

    #[test]
    fn test_expiry_boundary_is_expired() {
        let expiry = now() + Duration::hours(24);
        let record = configured().with_session(expiry);
        assert!(evaluate(&record, expiry - Duration::milliseconds(1)).is_authenticated);
        assert!(!evaluate(&record, expiry).is_authenticated);
        assert!(!evaluate(&record, expiry + Duration::seconds(1)).is_authenticated);
        assert_eq!(phase(&record, expiry), Phase::Unauthenticated);
    }

    #[test]
    fn test_flag_without_expiry_is_not_authenticated() {
        let mut record = configured();
        record.session_active = true;
        assert!(!session_valid(&record, now()));
    }

    #[test]
    fn test_access_state_serializes_camel_case() {
        let json = serde_json::to_value(AccessState::loading()).unwrap();
        assert_eq!(json["loading"], true);
        assert_eq!(json["isAuthenticated"], false);
        assert_eq!(json["needsPasswordSetup"], false);
    }
}
