//! Protected member records and input validation.
//!
//! A protected member is a person a caregiver keeps records for. Members are
//! always owned by exactly one caregiver; ownership never changes.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{CoreError, Result};
use crate::id::generate_id;
use crate::time::now_utc;

/// Longest accepted first/last name, in characters, after trimming.
pub const NAME_MAX_LEN: usize = 50;

/// Earliest accepted birth year.
pub const BIRTH_YEAR_MIN: i32 = 1900;

/// How a protected member is related to their caregiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relationship {
    Son,
    Daughter,
    Parent,
    Grandparent,
    Spouse,
    Sibling,
    Other,
}

/// Whether a member record is in active use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    #[default]
    Active,
    Inactive,
}

/// A person a caregiver keeps records for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedMember {
    pub id: String,
    pub caregiver_id: String,
    pub first_name: String,
    pub last_name: String,
    pub relationship: Relationship,
    pub birth_year: i32,
    pub status: MemberStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ProtectedMember {
    /// Create a member record owned by `caregiver_id` from validated input.
    pub fn new(caregiver_id: impl Into<String>, input: CreateMemberInput) -> Self {
        Self {
            id: generate_id(),
            caregiver_id: caregiver_id.into(),
            first_name: input.first_name,
            last_name: input.last_name,
            relationship: input.relationship,
            birth_year: input.birth_year,
            status: input.status.unwrap_or_default(),
            created_at: now_utc(),
        }
    }

    /// Apply the fields present in `update` to this record.
    pub fn apply_update(&mut self, update: UpdateMemberInput) {
        if let Some(first_name) = update.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            self.last_name = last_name;
        }
        if let Some(relationship) = update.relationship {
            self.relationship = relationship;
        }
        if let Some(birth_year) = update.birth_year {
            self.birth_year = birth_year;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
    }
}

/// Request body for creating a protected member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberInput {
    pub first_name: String,
    pub last_name: String,
    pub relationship: Relationship,
    pub birth_year: i32,
    #[serde(default)]
    pub status: Option<MemberStatus>,
}

impl CreateMemberInput {
    /// Normalize and validate the input, returning the trimmed form.
    pub fn validated(mut self) -> Result<Self> {
        self.first_name = validate_name("First name", &self.first_name)?;
        self.last_name = validate_name("Last name", &self.last_name)?;
        validate_birth_year(self.birth_year)?;
        Ok(self)
    }
}

/// Request body for updating a protected member. All fields optional,
/// at least one required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<Relationship>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MemberStatus>,
}

impl UpdateMemberInput {
    /// Whether no fields are present.
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.relationship.is_none()
            && self.birth_year.is_none()
            && self.status.is_none()
    }

    /// Normalize and validate the input, returning the trimmed form.
    pub fn validated(mut self) -> Result<Self> {
        if self.is_empty() {
            return Err(CoreError::validation(
                "At least one field must be provided for update",
            ));
        }
        if let Some(first_name) = &self.first_name {
            self.first_name = Some(validate_name("First name", first_name)?);
        }
        if let Some(last_name) = &self.last_name {
            self.last_name = Some(validate_name("Last name", last_name)?);
        }
        if let Some(birth_year) = self.birth_year {
            validate_birth_year(birth_year)?;
        }
        Ok(self)
    }
}

fn validate_name(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(format!("{field} cannot be empty")));
    }
    if trimmed.chars().count() > NAME_MAX_LEN {
        return Err(CoreError::validation(format!(
            "{field} must be at most {NAME_MAX_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_birth_year(birth_year: i32) -> Result<()> {
    if birth_year < BIRTH_YEAR_MIN {
        return Err(CoreError::validation(format!(
            "Birth year must be {BIRTH_YEAR_MIN} or later"
        )));
    }
    if birth_year > now_utc().year() {
        return Err(CoreError::validation("Birth year cannot be in the future"));
    }
    Ok(())
}
