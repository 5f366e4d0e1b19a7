//! External authentication authority abstraction.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::VerifyError;

/// A subject attested by the external authentication authority.
///
/// The subject id is the authority's user id, not a caregiver id; resolving
/// it to a caregiver record is the directory's job.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifiedSubject {
    /// User id issued by the authority.
    pub id: String,
    /// Email on file with the authority, when it exposes one.
    #[serde(default)]
    pub email: Option<String>,
}

/// Checks opaque credentials against the external authentication authority.
///
/// Implementations must map an outright rejection by the authority to
/// [`VerifyError::InvalidToken`] and keep transport or contract failures as
/// [`VerifyError::Provider`], so callers can tell "bad credential" apart
/// from "could not check".
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verifies `token` and returns the subject it attests.
    async fn verify_token(&self, token: &str) -> Result<VerifiedSubject, VerifyError>;
}
