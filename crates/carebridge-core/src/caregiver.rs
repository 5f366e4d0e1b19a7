use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::id::generate_id;
use crate::time::now_utc;

/// A caregiver account.
///
/// Credentials live with the external authentication authority; this record
/// only carries the authority's subject id (`subject_id`) so tokens can be
/// resolved back to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caregiver {
    pub id: String,
    /// User id issued by the external authentication authority.
    pub subject_id: String,
    pub name: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Caregiver {
    /// Create a new caregiver record with a generated id.
    pub fn new(
        subject_id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: generate_id(),
            subject_id: subject_id.into(),
            name: name.into(),
            email: email.into().to_lowercase(),
            created_at: now_utc(),
        }
    }
}
