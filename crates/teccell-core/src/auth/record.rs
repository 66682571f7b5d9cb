use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use tracing::warn;

use crate::error::StoreError;
use crate::storage::CredentialStore;

pub const KEY_SETUP_COMPLETED: &str = "admin_setup_completed";
pub const KEY_PASSWORD_HASH: &str = "admin_password_hash";
pub const KEY_LOGGED_IN: &str = "admin_logged_in";
pub const KEY_SESSION_EXPIRY: &str = "admin_session_expiry";

const TRUE: &str = "true";

/// The single per-device credential record.
///
/// Invariants, restored by [`CredentialRecord::load`] whatever is on disk:
/// - `password_hash` is present iff `setup_completed`
/// - `session_expiry` is present iff `session_active`
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialRecord {
    pub setup_completed: bool,
    pub password_hash: Option<String>,
    pub session_active: bool,
    pub session_expiry: Option<DateTime<Utc>>,
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("setup_completed", &self.setup_completed)
            .field("password_hash", &self.password_hash.as_ref().map(|_| "<redacted>"))
            .field("session_active", &self.session_active)
            .field("session_expiry", &self.session_expiry)
            .finish()
    }
}

impl CredentialRecord {
    /// Read the record. Absent keys mean first access.
    pub fn load<S: CredentialStore + ?Sized>(store: &S) -> Result<Self, StoreError> {
        let setup_completed = store.get(KEY_SETUP_COMPLETED)?.as_deref() == Some(TRUE);
        let password_hash = store.get(KEY_PASSWORD_HASH)?.filter(|h| !h.is_empty());
        let session_active = store.get(KEY_LOGGED_IN)?.as_deref() == Some(TRUE);
        let session_expiry = store
            .get(KEY_SESSION_EXPIRY)?
            .and_then(|raw| parse_expiry(&raw));

        Ok(Self {
            setup_completed,
            password_hash,
            session_active,
            session_expiry,
        }
        .normalised())
    }

    /// Write every field, removing the keys of absent values.
    pub fn save<S: CredentialStore + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
        // A half-written record is repaired by `normalised` on the next load.
        match self.password_hash {
            Some(ref hash) => store.set(KEY_PASSWORD_HASH, hash)?,
            None => store.remove(KEY_PASSWORD_HASH)?,
        }
        if self.setup_completed {
            store.set(KEY_SETUP_COMPLETED, TRUE)?;
        } else {
            store.remove(KEY_SETUP_COMPLETED)?;
        }

        match self.session_expiry {
            Some(expiry) => store.set(KEY_SESSION_EXPIRY, &expiry.timestamp_millis().to_string())?,
            None => store.remove(KEY_SESSION_EXPIRY)?,
        }
        if self.session_active {
            store.set(KEY_LOGGED_IN, TRUE)?;
        } else {
            store.remove(KEY_LOGGED_IN)?;
        }
        Ok(())
    }

    /// Remove every key, returning the store to a fresh install.
    pub fn erase<S: CredentialStore + ?Sized>(store: &mut S) -> Result<(), StoreError> {
        store.remove(KEY_LOGGED_IN)?;
        store.remove(KEY_SESSION_EXPIRY)?;
        store.remove(KEY_SETUP_COMPLETED)?;
        store.remove(KEY_PASSWORD_HASH)?;
        Ok(())
    }

    pub fn with_session(mut self, expiry: DateTime<Utc>) -> Self {
        self.session_active = true;
        self.session_expiry = Some(expiry);
        self
    }

    pub fn without_session(mut self) -> Self {
        self.session_active = false;
        self.session_expiry = None;
        self
    }

    pub fn with_password_hash(mut self, hash: String) -> Self {
        self.setup_completed = true;
        self.password_hash = Some(hash);
        self
    }

    /// True when the session flags are still set but the expiry has passed.
    pub fn has_stale_session(&self, now: DateTime<Utc>) -> bool {
        self.session_active && self.session_expiry.map(|e| e <= now).unwrap_or(true)
    }

    fn normalised(mut self) -> Self {
        if self.setup_completed != self.password_hash.is_some() {
            warn!(
                setup_completed = self.setup_completed,
                has_hash = self.password_hash.is_some(),
                "Inconsistent setup state, treating as first access"
            );
            self.setup_completed = false;
            self.password_hash = None;
        }
        if self.session_active != self.session_expiry.is_some() {
            warn!("Session flag without expiry (or vice versa), voiding session");
            self = self.without_session();
        }
        self
    }
}

fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    match raw.trim().parse::<i64>() {
        Ok(millis) => Utc.timestamp_millis_opt(millis).single(),
        Err(e) => {
            warn!(error = %e, "Unparseable session expiry");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::Duration;

    fn at_millis(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).single().unwrap()
    }

    #[test]
    fn test_empty_store_is_first_access() {
        let store = MemoryStore::new();
        let record = CredentialRecord::load(&store).unwrap();
        assert_eq!(record, CredentialRecord::default());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let expiry = at_millis(1_700_000_000_123);
        let record = CredentialRecord::default()
            .with_password_hash("$argon2id$v=19$stub".to_string())
            .with_session(expiry);
        record.save(&mut store).unwrap();

        assert_eq!(store.get(KEY_SETUP_COMPLETED).unwrap().as_deref(), Some("true"));
        assert_eq!(
            store.get(KEY_SESSION_EXPIRY).unwrap().as_deref(),
            Some("1700000000123")
        );
        assert_eq!(CredentialRecord::load(&store).unwrap(), record);
    }

    #[test]
    fn test_save_removes_absent_fields() {
        let mut store = MemoryStore::new();
        CredentialRecord::default()
            .with_session(at_millis(1_000))
            .save(&mut store)
            .unwrap();
        CredentialRecord::default().save(&mut store).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_erase_clears_everything() {
        let mut store = MemoryStore::new();
        CredentialRecord::default()
            .with_password_hash("h".to_string())
            .with_session(at_millis(1_000))
            .save(&mut store)
            .unwrap();
        CredentialRecord::erase(&mut store).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_flag_without_hash_is_first_access() {
        let mut store = MemoryStore::new();
        store.set(KEY_SETUP_COMPLETED, "true").unwrap();
        let record = CredentialRecord::load(&store).unwrap();
        assert!(!record.setup_completed);
        assert!(record.password_hash.is_none());
    }

    #[test]
    fn test_hash_without_flag_is_first_access() {
        let mut store = MemoryStore::new();
        store.set(KEY_PASSWORD_HASH, "h").unwrap();
        let record = CredentialRecord::load(&store).unwrap();
        assert!(!record.setup_completed);
        assert!(record.password_hash.is_none());
    }

    #[test]
    fn test_logged_in_without_expiry_is_voided() {
        let mut store = MemoryStore::new();
        store.set(KEY_LOGGED_IN, "true").unwrap();
        let record = CredentialRecord::load(&store).unwrap();
        assert!(!record.session_active);
        assert!(record.session_expiry.is_none());
    }

    #[test]
    fn test_garbage_expiry_voids_session() {
        let mut store = MemoryStore::new();
        store.set(KEY_LOGGED_IN, "true").unwrap();
        store.set(KEY_SESSION_EXPIRY, "tomorrow").unwrap();
        let record = CredentialRecord::load(&store).unwrap();
        assert!(!record.session_active);
    }

    #[test]
    fn test_has_stale_session_boundary() {
        let expiry = at_millis(10_000);
        let record = CredentialRecord::default().with_session(expiry);
        assert!(!record.has_stale_session(expiry - Duration::milliseconds(1)));
        assert!(record.has_stale_session(expiry));
        assert!(!CredentialRecord::default().has_stale_session(expiry));
    }

    #[test]
    fn test_debug_redacts_hash() {
        let record = CredentialRecord::default().with_password_hash("secret-hash".to_string());
        let shown = format!("{:?}", record);
        assert!(!shown.contains("secret-hash"));
        assert!(shown.contains("<redacted>"));
    }
}
