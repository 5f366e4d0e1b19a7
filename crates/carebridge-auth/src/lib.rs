//! # carebridge-auth
//!
//! Caregiver identity verification for the CareBridge server.
//!
//! CareBridge never issues credentials itself. Callers present opaque
//! tokens minted by an external authentication authority; this crate checks
//! them with the authority and resolves the attested subject to a caregiver
//! record. Every protected surface, HTTP and realtime alike, goes through
//! the same [`IdentityVerifier`].
//!
//! ## Modules
//!
//! - [`error`] - Verification error taxonomy
//! - [`provider`] - Authority abstraction and attested subjects
//! - [`http`] - HTTP-backed identity provider
//! - [`directory`] - Subject to caregiver resolution
//! - [`verifier`] - The two-step verifier and verified identities

pub mod directory;
pub mod error;
pub mod http;
pub mod provider;
pub mod verifier;

pub use directory::{CaregiverDirectory, StorageCaregiverDirectory};
pub use error::VerifyError;
pub use http::HttpIdentityProvider;
pub use provider::{IdentityProvider, VerifiedSubject};
pub use verifier::{CaregiverIdentity, IdentityVerifier};
