use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_SESSION_TTL_HOURS, MAX_SESSION_TTL_HOURS};
use crate::error::AuthError;
use crate::storage::CredentialStore;

use super::clock::{Clock, SystemClock};
use super::digest::PasswordDigest;
use super::policy::{self, AccessState, Phase};
use super::record::CredentialRecord;
use super::DEFAULT_PASSWORD;

/// Public operations of the admin gate.
///
/// Holds the last record written to the store; the store has a single
/// writer, so the copy never drifts. Every state query reads the clock
/// afresh.
pub struct AccessController<S, C = SystemClock> {
    store: S,
    clock: C,
    record: CredentialRecord,
    digest: PasswordDigest,
    session_ttl: Duration,
}

impl<S: CredentialStore> AccessController<S, SystemClock> {
    pub fn new(store: S) -> Result<Self, AuthError> {
        Self::open(store, SystemClock)
    }
}

impl<S: CredentialStore, C: Clock> AccessController<S, C> {
    /// Read the credential record and drop an expired session.
    pub fn open(mut store: S, clock: C) -> Result<Self, AuthError> {
        let mut record = CredentialRecord::load(&store)?;
        if record.has_stale_session(clock.now()) {
            debug!("Clearing expired session");
            record = record.without_session();
            record.save(&mut store)?;
        }
        debug!(?record, "Credential record loaded");

        Ok(Self {
            store,
            clock,
            record,
            digest: PasswordDigest::default(),
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        })
    }

    /// Lifetimes beyond [`MAX_SESSION_TTL_HOURS`] are cut down to it.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl.min(Duration::hours(MAX_SESSION_TTL_HOURS));
        self
    }

    pub fn with_digest(mut self, digest: PasswordDigest) -> Self {
        self.digest = digest;
        self
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn state(&self) -> AccessState {
        policy::evaluate(&self.record, self.clock.now())
    }

    pub fn phase(&self) -> Phase {
        policy::phase(&self.record, self.clock.now())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated
    }

    /// Expiry of the current session, if it is still valid.
    pub fn session_expiry(&self) -> Option<DateTime<Utc>> {
        if self.is_authenticated() {
            self.record.session_expiry
        } else {
            None
        }
    }

    pub fn time_remaining(&self) -> Option<Duration> {
        self.session_expiry().map(|expiry| expiry - self.clock.now())
    }

    pub fn record(&self) -> &CredentialRecord {
        &self.record
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Check a password and start a session on success.
    ///
    /// Before setup only the default password is accepted, and the session
    /// it opens still needs password setup. A wrong password is `Ok(false)`
    /// and leaves the record untouched.
    pub fn login(&mut self, candidate: &str) -> Result<bool, AuthError> {
        let accepted = match self.record.password_hash {
            Some(ref hash) if self.record.setup_completed => self.digest.verify(candidate, hash),
            _ => candidate == DEFAULT_PASSWORD,
        };

        if !accepted {
            info!(setup_completed = self.record.setup_completed, "Login rejected");
            return Ok(false);
        }

        let expiry = self.session_expiry_from_now();
        let next = self.record.clone().with_session(expiry);
        self.commit(next)?;
        info!(phase = ?self.phase(), "Login accepted");
        Ok(true)
    }

    /// Replace the default password. One-way until [`reset_to_default`].
    ///
    /// The caller has already validated `new_password`.
    ///
    /// [`reset_to_default`]: Self::reset_to_default
    pub fn complete_first_time_setup(&mut self, new_password: &str) -> Result<(), AuthError> {
        if self.record.setup_completed {
            return Err(AuthError::InvalidTransition("setup has already been completed"));
        }

        let hash = self.digest.hash(new_password)?;
        let expiry = self.session_expiry_from_now();
        let next = CredentialRecord::default()
            .with_password_hash(hash)
            .with_session(expiry);
        self.commit(next)?;
        info!("First-time setup completed");
        Ok(())
    }

    /// Change the operator password from an authenticated session.
    ///
    /// Returns `Ok(false)` when `current` is wrong.
    pub fn change_password(&mut self, current: &str, new_password: &str) -> Result<bool, AuthError> {
        if !self.record.setup_completed {
            return Err(AuthError::InvalidTransition("complete first-time setup first"));
        }
        if !self.is_authenticated() {
            return Err(AuthError::InvalidTransition("sign in to change the password"));
        }
        let verified = self
            .record
            .password_hash
            .as_deref()
            .map(|hash| self.digest.verify(current, hash))
            .unwrap_or(false);
        if !verified {
            info!("Password change rejected: current password incorrect");
            return Ok(false);
        }

        let hash = self.digest.hash(new_password)?;
        let expiry = self.session_expiry_from_now();
        let next = CredentialRecord::default()
            .with_password_hash(hash)
            .with_session(expiry);
        self.commit(next)?;
        info!("Password changed");
        Ok(true)
    }

    /// End the session. Setup state is kept.
    pub fn logout(&mut self) -> Result<(), AuthError> {
        let next = self.record.clone().without_session();
        self.commit(next)?;
        info!("Logged out");
        Ok(())
    }

    /// Wipe the credential record back to a fresh install.
    ///
    /// Destructive; callers must confirm with the operator before calling.
    pub fn reset_to_default(&mut self) -> Result<(), AuthError> {
        warn!("Resetting admin credentials to first access");
        if let Err(e) = CredentialRecord::erase(&mut self.store) {
            self.resync();
            return Err(e.into());
        }
        self.record = CredentialRecord::default();
        Ok(())
    }

    fn session_expiry_from_now(&self) -> DateTime<Utc> {
        let now = self.clock.now();
        now.checked_add_signed(self.session_ttl).unwrap_or(now)
    }

    fn commit(&mut self, next: CredentialRecord) -> Result<(), AuthError> {
        if let Err(e) = next.save(&mut self.store) {
            warn!(error = %e, "Failed to persist credential record");
            self.resync();
            return Err(e.into());
        }
        self.record = next;
        Ok(())
    }

    /// After a failed write, adopt whatever actually reached the store.
    fn resync(&mut self) {
        match CredentialRecord::load(&self.store) {
            Ok(record) => self.record = record,
            Err(e) => debug!(error = %e, "Could not re-read credential record"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;
    use crate::auth::record::{KEY_LOGGED_IN, KEY_PASSWORD_HASH, KEY_SESSION_EXPIRY};
    use crate::error::StoreError;
    use crate::storage::MemoryStore;

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-05-10T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn fast_digest() -> PasswordDigest {
        PasswordDigest::with_params(1024, 1, 1).unwrap()
    }

    fn controller(clock: &ManualClock) -> AccessController<MemoryStore, &ManualClock> {
        AccessController::open(MemoryStore::new(), clock)
            .unwrap()
            .with_digest(fast_digest())
    }

    fn configured<'a>(
        clock: &'a ManualClock,
        password: &str,
    ) -> AccessController<MemoryStore, &'a ManualClock> {
        let mut gate = controller(clock);
        assert!(gate.login(DEFAULT_PASSWORD).unwrap());
        gate.complete_first_time_setup(password).unwrap();
        gate
    }

    /// Store that accepts reads and fails every write.
    #[derive(Default)]
    struct ReadOnlyStore(MemoryStore);

    impl CredentialStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.0.get(key)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("quota exceeded".to_string()))
        }

        fn remove(&mut self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("quota exceeded".to_string()))
        }
    }

    #[test]
    fn test_fresh_install_is_first_access() {
        let clock = ManualClock::new(start());
        let gate = controller(&clock);
        let state = gate.state();
        assert!(state.is_first_time_access);
        assert!(state.needs_password_setup);
        assert!(!state.is_authenticated);
        assert_eq!(gate.phase(), Phase::NoSetup);
    }

    #[test]
    fn test_fresh_install_accepts_only_default() {
        let clock = ManualClock::new(start());
        let mut gate = controller(&clock);
        assert!(!gate.login("Secret123").unwrap());
        assert!(!gate.login("").unwrap());
        assert!(!gate.login("Admin").unwrap());
        assert!(gate.store().is_empty());

        assert!(gate.login(DEFAULT_PASSWORD).unwrap());
        let state = gate.state();
        assert!(state.is_authenticated);
        assert!(state.needs_password_setup);
        assert_eq!(gate.phase(), Phase::FirstAccessAuthenticated);
    }

    #[test]
    fn test_setup_replaces_default() {
        let clock = ManualClock::new(start());
        let mut gate = configured(&clock, "Secret123");
        let state = gate.state();
        assert!(state.is_authenticated);
        assert!(!state.needs_password_setup);
        assert!(!state.is_first_time_access);

        gate.logout().unwrap();
        assert!(!gate.login(DEFAULT_PASSWORD).unwrap());
        assert!(gate.login("Secret123").unwrap());
    }

    #[test]
    fn test_setup_cannot_be_repeated() {
        let clock = ManualClock::new(start());
        let mut gate = configured(&clock, "Secret123");
        let result = gate.complete_first_time_setup("Other456");
        assert!(matches!(result, Err(AuthError::InvalidTransition(_))));
        gate.logout().unwrap();
        assert!(gate.login("Secret123").unwrap());
    }

    #[test]
    fn test_wrong_password_does_not_mutate() {
        let clock = ManualClock::new(start());
        let mut gate = configured(&clock, "Secret123");
        gate.logout().unwrap();

        let before = gate.store().clone();
        let record_before = gate.record().clone();
        assert!(!gate.login("Secret12").unwrap());
        assert!(!gate.login("nope").unwrap());
        assert_eq!(gate.record(), &record_before);
        assert_eq!(
            gate.store().get(KEY_PASSWORD_HASH).unwrap(),
            before.get(KEY_PASSWORD_HASH).unwrap()
        );
        assert_eq!(gate.store().len(), before.len());
    }

    #[test]
    fn test_session_expires_after_ttl() {
        let clock = ManualClock::new(start());
        let mut gate = configured(&clock, "Secret123");
        gate.logout().unwrap();
        assert!(gate.login("Secret123").unwrap());
        assert_eq!(gate.session_expiry(), Some(start() + Duration::hours(24)));

        clock.advance(Duration::hours(24) - Duration::milliseconds(1));
        assert!(gate.is_authenticated());

        clock.advance(Duration::milliseconds(1));
        assert!(!gate.is_authenticated());
        assert_eq!(gate.phase(), Phase::Unauthenticated);
        assert_eq!(gate.session_expiry(), None);
        assert!(!gate.state().is_first_time_access);
    }

    #[test]
    fn test_custom_session_ttl() {
        let clock = ManualClock::new(start());
        let mut gate = controller(&clock).with_session_ttl(Duration::hours(2));
        assert!(gate.login(DEFAULT_PASSWORD).unwrap());
        assert_eq!(gate.time_remaining(), Some(Duration::hours(2)));
        clock.advance(Duration::hours(2));
        assert!(!gate.is_authenticated());
    }

    #[test]
    fn test_session_ttl_is_capped() {
        let clock = ManualClock::new(start());
        let mut gate = controller(&clock).with_session_ttl(Duration::weeks(1_000_000));
        assert!(gate.login(DEFAULT_PASSWORD).unwrap());
        assert_eq!(
            gate.session_expiry(),
            Some(start() + Duration::hours(MAX_SESSION_TTL_HOURS))
        );
    }

    #[test]
    fn test_next_mutation_clears_stale_session() {
        let clock = ManualClock::new(start());
        let mut gate = configured(&clock, "Secret123");
        clock.advance(Duration::hours(25));
        assert!(!gate.is_authenticated());

        // A rejected login leaves the record alone
        assert!(!gate.login("wrong").unwrap());
        assert!(gate.store().get(KEY_LOGGED_IN).unwrap().is_some());

        gate.logout().unwrap();
        assert_eq!(gate.store().get(KEY_LOGGED_IN).unwrap(), None);
        assert_eq!(gate.store().get(KEY_SESSION_EXPIRY).unwrap(), None);
        assert!(gate.store().get(KEY_PASSWORD_HASH).unwrap().is_some());
        assert!(!gate.record().session_active);
    }

    #[test]
    fn test_login_after_expiry_replaces_stale_expiry() {
        let clock = ManualClock::new(start());
        let mut gate = configured(&clock, "Secret123");
        clock.advance(Duration::hours(30));

        assert!(gate.login("Secret123").unwrap());
        let expected = start() + Duration::hours(30) + Duration::hours(24);
        assert_eq!(
            gate.store().get(KEY_SESSION_EXPIRY).unwrap(),
            Some(expected.timestamp_millis().to_string())
        );
        assert_eq!(gate.phase(), Phase::Authenticated);
    }

    #[test]
    fn test_open_clears_expired_session() {
        let clock = ManualClock::new(start());
        let mut gate = configured(&clock, "Secret123");
        assert!(gate.store().get(KEY_LOGGED_IN).unwrap().is_some());

        clock.advance(Duration::hours(25));
        let store = std::mem::take(&mut gate.store);
        let reopened = AccessController::open(store, &clock).unwrap();
        assert_eq!(reopened.store().get(KEY_LOGGED_IN).unwrap(), None);
        assert!(!reopened.record().session_active);
        assert!(reopened.record().setup_completed);
    }

    #[test]
    fn test_logout_then_login_skips_setup() {
        let clock = ManualClock::new(start());
        let mut gate = configured(&clock, "Secret123");
        gate.logout().unwrap();
        assert!(!gate.is_authenticated());
        assert!(!gate.state().needs_password_setup);

        assert!(gate.login("Secret123").unwrap());
        assert_eq!(gate.phase(), Phase::Authenticated);
    }

    #[test]
    fn test_reset_from_every_phase() {
        let clock = ManualClock::new(start());

        let mut no_setup = controller(&clock);
        no_setup.reset_to_default().unwrap();
        assert_eq!(no_setup.phase(), Phase::NoSetup);

        let mut first_access = controller(&clock);
        first_access.login(DEFAULT_PASSWORD).unwrap();
        first_access.reset_to_default().unwrap();
        assert_eq!(first_access.phase(), Phase::NoSetup);
        assert!(first_access.store().is_empty());

        let mut signed_in = configured(&clock, "Secret123");
        signed_in.reset_to_default().unwrap();
        assert!(signed_in.state().is_first_time_access);
        assert!(!signed_in.login("Secret123").unwrap());
        assert!(signed_in.login(DEFAULT_PASSWORD).unwrap());

        let mut signed_out = configured(&clock, "Secret123");
        signed_out.logout().unwrap();
        signed_out.reset_to_default().unwrap();
        assert_eq!(signed_out.phase(), Phase::NoSetup);
        assert!(!signed_out.login("Secret123").unwrap());
    }

    #[test]
    fn test_stored_digest_verifies_only_password() {
        let clock = ManualClock::new(start());
        let gate = configured(&clock, "Secret123");
        let record = gate.record();
        assert!(record.setup_completed);
        let hash = record.password_hash.as_deref().unwrap();
        let digest = fast_digest();
        assert!(digest.verify("Secret123", hash));
        assert!(!digest.verify("Secret1234", hash));
        assert!(!digest.verify(DEFAULT_PASSWORD, hash));
    }

    #[test]
    fn test_change_password() {
        let clock = ManualClock::new(start());
        let mut gate = configured(&clock, "Secret123");

        assert!(!gate.change_password("wrong", "Better456").unwrap());
        assert!(gate.change_password("Secret123", "Better456").unwrap());

        gate.logout().unwrap();
        assert!(!gate.login("Secret123").unwrap());
        assert!(gate.login("Better456").unwrap());
    }

    #[test]
    fn test_change_password_requires_session() {
        let clock = ManualClock::new(start());
        let mut gate = configured(&clock, "Secret123");
        gate.logout().unwrap();
        assert!(matches!(
            gate.change_password("Secret123", "Better456"),
            Err(AuthError::InvalidTransition(_))
        ));

        let mut fresh = controller(&clock);
        fresh.login(DEFAULT_PASSWORD).unwrap();
        assert!(matches!(
            fresh.change_password(DEFAULT_PASSWORD, "Better456"),
            Err(AuthError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_storage_failure_is_not_wrong_password() {
        let clock = ManualClock::new(start());
        let mut gate = AccessController::open(ReadOnlyStore::default(), &clock)
            .unwrap()
            .with_digest(fast_digest());

        let result = gate.login(DEFAULT_PASSWORD);
        assert!(matches!(result, Err(AuthError::Storage(_))));
        assert!(!gate.is_authenticated());

        // A wrong password still reads as a plain rejection
        assert!(!gate.login("nope").unwrap());

        assert!(gate.complete_first_time_setup("Secret123").unwrap_err().is_storage());
        assert!(gate.state().is_first_time_access);
        assert!(gate.reset_to_default().is_err());
    }

    #[test]
    fn test_full_scenario() {
        let clock = ManualClock::new(start());
        let mut gate = controller(&clock);

        assert!(gate.login("admin").unwrap());
        assert!(gate.state().needs_password_setup);

        gate.complete_first_time_setup("Secret123").unwrap();
        assert!(gate.state().is_authenticated);
        assert!(!gate.state().needs_password_setup);

        gate.logout().unwrap();
        assert!(!gate.state().is_authenticated);

        assert!(!gate.login("admin").unwrap());
        assert!(gate.login("Secret123").unwrap());
        assert!(gate.state().is_authenticated);
    }
}
