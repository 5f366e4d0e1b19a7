//! Error types for caregiver identity verification.

/// Errors that can occur while verifying a caregiver credential.
///
/// Rejections (`AuthenticationRequired`, `InvalidToken`, `CaregiverNotFound`)
/// mean the caller presented something we will not accept. Infrastructure
/// errors (`Provider`, `Directory`) mean the check itself could not be
/// carried out; callers must not treat those as a verdict on the credential.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// No credential was presented.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The authentication authority rejected the credential.
    #[error("Invalid token")]
    InvalidToken,

    /// The credential is valid but no caregiver record matches its subject.
    #[error("Caregiver not found")]
    CaregiverNotFound,

    /// The authentication authority could not be reached or answered
    /// outside its contract.
    #[error("Identity provider error: {message}")]
    Provider {
        /// Description of the provider failure.
        message: String,
    },

    /// The caregiver directory lookup failed.
    #[error("Caregiver directory error: {message}")]
    Directory {
        /// Description of the directory failure.
        message: String,
    },
}

impl VerifyError {
    /// Creates a `Provider` error.
    #[must_use]
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Creates a `Directory` error.
    #[must_use]
    pub fn directory(message: impl Into<String>) -> Self {
        Self::Directory {
            message: message.into(),
        }
    }

    /// Returns `true` if the credential was rejected.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationRequired | Self::InvalidToken | Self::CaregiverNotFound
        )
    }

    /// Returns `true` if verification failed for reasons unrelated to the
    /// credential itself.
    #[must_use]
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Provider { .. } | Self::Directory { .. })
    }
}
