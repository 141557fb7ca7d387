//! # Error Hierarchy
//!
//! Structured error types for the core crate, built with `thiserror`.
//!
//! [`ClaimError`] variants map one-to-one onto the stable, machine-readable
//! codes that callers surface to users (e.g. `aggregation.of.not.found`).
//! Those codes are part of the public contract and must not change.

use thiserror::Error;

/// The three mandatory sub-fields of the data-account-export claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportField {
    /// `requestType`: how the export is requested.
    RequestType,
    /// `accessType`: how the exported data is accessed.
    AccessType,
    /// `formatType`: MIME type(s) of the export.
    FormatType,
}

impl ExportField {
    /// All export fields in validation order.
    pub const ALL: [ExportField; 3] = [
        ExportField::RequestType,
        ExportField::AccessType,
        ExportField::FormatType,
    ];

    /// The bare vocabulary term for this field.
    pub fn term(&self) -> crate::vocab::Term {
        match self {
            Self::RequestType => crate::vocab::REQUEST_TYPE,
            Self::AccessType => crate::vocab::ACCESS_TYPE,
            Self::FormatType => crate::vocab::FORMAT_TYPE,
        }
    }
}

impl std::fmt::Display for ExportField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.term().bare())
    }
}

/// Structural claim-set validation failures.
///
/// Each variant carries a stable code (see [`ClaimError::code`]) that is
/// returned to API callers unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimError {
    /// The offering name is missing or blank.
    #[error("service offering name must not be blank")]
    InvalidServiceName,

    /// The claim set is empty.
    #[error("claim set must not be empty")]
    InvalidCredential,

    /// `aggregationOf` is absent or blank.
    #[error("aggregationOf claim is missing or blank")]
    AggregationNotFound,

    /// `dependsOn` is present but not an array of objects.
    #[error("dependsOn claim is malformed")]
    DependsOnNotFound,

    /// `dataAccountExport` is absent.
    #[error("dataAccountExport claim is missing")]
    DataAccountExportNotFound,

    /// A mandatory `dataAccountExport` sub-field is absent or blank.
    #[error("dataAccountExport.{0} is missing or blank")]
    ExportFieldNotFound(ExportField),

    /// `policy` is absent.
    #[error("policy claim is missing")]
    InvalidPolicy,
}

impl ClaimError {
    /// Stable machine-readable code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidServiceName => "invalid.service.name",
            Self::InvalidCredential => "invalid.credential",
            Self::AggregationNotFound => "aggregation.of.not.found",
            Self::DependsOnNotFound => "depends.on.not.found",
            Self::DataAccountExportNotFound => "data.account.export.not.found",
            Self::ExportFieldNotFound(ExportField::RequestType) => "requestType.of.not.found",
            Self::ExportFieldNotFound(ExportField::AccessType) => "accessType.of.not.found",
            Self::ExportFieldNotFound(ExportField::FormatType) => "formatType.of.not.found",
            Self::InvalidPolicy => "invalid.policy",
        }
    }
}

/// Validation errors for domain primitive newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// DID does not conform to W3C DID syntax (did:method:identifier).
    #[error("invalid DID format: \"{0}\" (expected did:<method>:<identifier>)")]
    InvalidDid(String),

    /// A string identifier could not be parsed as a UUID.
    #[error("invalid identifier: \"{0}\" (expected a UUID)")]
    InvalidId(String),

    /// Credential type tag is not one of the recognised types.
    #[error("unknown credential type: \"{0}\"")]
    UnknownCredentialType(String),
}
