#![deny(missing_docs)]

//! # trustgate-core: Foundational Types for the Trustgate Issuer
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It performs no I/O: fetching, signing, hosting and persistence live in
//! `trustgate-client` and `trustgate-api`.
//!
//! ## Design Principles
//!
//! 1. **The claim set is a document tree.** The trust-framework vocabulary is
//!    versioned outside this codebase, so a [`ClaimSet`] wraps an ordered JSON
//!    object and exposes accessor helpers per known [`Term`] instead of a
//!    static schema.
//!
//! 2. **Deterministic first-failure validation.** [`validate`] checks the
//!    structural requirements in a fixed order and reports the first one that
//!    fails, with a stable machine-readable code ([`ClaimError::code`]).
//!
//! 3. **Closed document-type dispatch.** Credential subjects are recognised by
//!    their declared `type` tag via [`DocumentType`]; the extraction path is
//!    picked from a lookup table keyed by [`SubjectKind`].
//!
//! 4. **Newtype identifiers.** You cannot pass an [`OfferingId`] where a
//!    [`ParticipantId`] is expected.

pub mod claims;
pub mod credential;
pub mod digest;
pub mod document;
pub mod error;
pub mod identity;
pub mod naming;
pub mod offering;
pub mod validation;
pub mod vocab;

// Re-export primary types at crate root for ergonomic imports.
pub use claims::{is_blank, ClaimSet};
pub use credential::{CredentialRecord, CredentialType};
pub use digest::sha256_hex;
pub use document::{DocumentType, SubjectKind};
pub use error::{ClaimError, ExportField, ValidationError};
pub use identity::{CredentialId, Did, OfferingId, ParticipantId};
pub use naming::{NameGenerator, SeededNameGenerator};
pub use offering::{LabelLevelLink, Participant, ServiceOffer, StandardType};
pub use validation::{validate, validate_offering_name, ValidatedClaims};
pub use vocab::Term;
