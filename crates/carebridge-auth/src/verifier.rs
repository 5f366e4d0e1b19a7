//! Caregiver identity verification.

use std::sync::Arc;

use carebridge_core::caregiver::Caregiver;
use tracing::debug;

use crate::directory::CaregiverDirectory;
use crate::error::VerifyError;
use crate::provider::{IdentityProvider, VerifiedSubject};

/// A verified caregiver identity.
///
/// Binds the credential's attested subject to the caregiver record it
/// resolves to. The binding never changes for the lifetime of whatever
/// carries it, be that a single request or a realtime session.
#[derive(Debug, Clone, PartialEq)]
pub struct CaregiverIdentity {
    /// The caregiver record the credential resolves to.
    pub caregiver: Caregiver,
    /// The subject attested by the authentication authority.
    pub subject: VerifiedSubject,
}

impl CaregiverIdentity {
    /// Id of the verified caregiver.
    #[must_use]
    pub fn caregiver_id(&self) -> &str {
        &self.caregiver.id
    }
}

/// Verifies opaque credentials and resolves them to caregiver identities.
///
/// Verification is two steps: the external authority attests the
/// credential's subject, then the directory resolves that subject to a
/// caregiver record. Both must succeed before any protected surface is
/// reachable.
pub struct IdentityVerifier {
    provider: Arc<dyn IdentityProvider>,
    directory: Arc<dyn CaregiverDirectory>,
}

impl IdentityVerifier {
    /// Creates a verifier over the given provider and directory.
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        directory: Arc<dyn CaregiverDirectory>,
    ) -> Self {
        Self {
            provider,
            directory,
        }
    }

    /// Verifies `token` and returns the caregiver identity it belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::AuthenticationRequired`] for a blank token,
    /// [`VerifyError::InvalidToken`] when the authority rejects it, and
    /// [`VerifyError::CaregiverNotFound`] when no caregiver is registered
    /// for the attested subject.
    pub async fn verify(&self, token: &str) -> Result<CaregiverIdentity, VerifyError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(VerifyError::AuthenticationRequired);
        }

        let subject = self.provider.verify_token(token).await?;
        let caregiver = self
            .directory
            .find_by_subject(&subject.id)
            .await?
            .ok_or(VerifyError::CaregiverNotFound)?;

        debug!(caregiver_id = %caregiver.id, "Verified caregiver identity");
        Ok(CaregiverIdentity { caregiver, subject })
    }
}

impl std::fmt::Debug for IdentityVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityVerifier").finish_non_exhaustive()
    }
}
