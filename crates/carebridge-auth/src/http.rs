//! HTTP-backed identity provider.
//!
//! Talks to a Supabase-compatible authentication authority: credentials are
//! verified with a `GET {base_url}/auth/v1/user` carrying the credential as
//! a bearer token, and the authority answers with the user it attests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::error::VerifyError;
use crate::provider::{IdentityProvider, VerifiedSubject};

/// HTTP request timeout for authority calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity provider backed by an external HTTP authority.
pub struct HttpIdentityProvider {
    /// HTTP client for authority requests.
    client: reqwest::Client,
    /// Authority base URL, without a trailing slash.
    base_url: String,
    /// Project API key sent alongside every request.
    api_key: String,
}

impl HttpIdentityProvider {
    /// Creates a provider for the authority at `base_url`.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should not happen in
    /// practice).
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn user_endpoint(&self) -> String {
        format!("{}/auth/v1/user", self.base_url)
    }
}

impl std::fmt::Debug for HttpIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpIdentityProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<VerifiedSubject, VerifyError> {
        let response = self
            .client
            .get(self.user_endpoint())
            .header("Authorization", format!("Bearer {token}"))
            .header("apikey", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Failed to reach authentication authority: {}", e);
                VerifyError::provider(e.to_string())
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(VerifyError::InvalidToken);
        }
        if !status.is_success() {
            return Err(VerifyError::provider(format!(
                "authority answered with status {status}"
            )));
        }

        let subject: VerifiedSubject = response
            .json()
            .await
            .map_err(|e| VerifyError::provider(format!("malformed authority response: {e}")))?;
        if subject.id.is_empty() {
            return Err(VerifyError::provider("authority response missing user id"));
        }
        Ok(subject)
    }
}
