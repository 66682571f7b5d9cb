use thiserror::Error;

/// Failures of the key/value backend holding the credential record.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt credential file: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Failures of the access controller.
///
/// A wrong password is not an error; `login` reports it as `Ok(false)`.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Credential storage failed: {0}")]
    Storage(#[from] StoreError),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Invalid operation: {0}")]
    InvalidTransition(&'static str),
}

impl AuthError {
    /// Short message suitable for showing to the operator.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Storage(_) => {
                "Credential storage is unavailable. Nothing was changed.".to_string()
            }
            AuthError::Hashing(_) => "Could not process the password. Please try again.".to_string(),
            AuthError::InvalidTransition(what) => format!("Not allowed: {}", what),
        }
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, AuthError::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_is_distinct_from_rejection() {
        let err = AuthError::from(StoreError::Unavailable("disk full".to_string()));
        assert!(err.is_storage());
        assert!(!err.user_message().to_lowercase().contains("incorrect"));
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = AuthError::InvalidTransition("setup already completed");
        assert!(!err.is_storage());
        assert_eq!(err.user_message(), "Not allowed: setup already completed");
    }
}
