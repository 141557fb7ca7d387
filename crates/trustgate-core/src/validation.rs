//! # Claim Validator
//!
//! Pure structural validation of an incoming claim set. Checks run in a fixed
//! order and the first failure wins, so the reported problem is always the
//! first structurally required one:
//!
//! 1. the claim set is non-empty
//! 2. `aggregationOf` is present and non-blank
//! 3. `dependsOn`, if present, is an object or an array of objects
//! 4. `dataAccountExport` is present with non-blank `requestType`,
//!    `accessType` and `formatType`
//! 5. `policy` is present
//!
//! Reachability of the referenced documents is checked later, by the
//! reference resolver.

use serde_json::Value;

use crate::claims::{is_blank, reference_ids, ClaimSet};
use crate::error::{ClaimError, ExportField};

/// Reference ids extracted from a claim set that passed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedClaims {
    /// Credential-subject URLs of the aggregated resources.
    pub aggregation_ids: Vec<String>,
    /// Credential-subject URLs of the services depended upon.
    pub depends_on_ids: Vec<String>,
}

/// Validate a claim set.
///
/// # Errors
///
/// Returns the first [`ClaimError`] in check order.
pub fn validate(claims: &ClaimSet) -> Result<ValidatedClaims, ClaimError> {
    if claims.is_empty() {
        return Err(ClaimError::InvalidCredential);
    }

    let aggregation = claims
        .aggregation_of()
        .filter(|v| !is_blank(v))
        .ok_or(ClaimError::AggregationNotFound)?;

    let depends_on_ids = match claims.depends_on() {
        None | Some(Value::Null) => Vec::new(),
        Some(value) if is_reference_list(value) => reference_ids(value),
        Some(_) => return Err(ClaimError::DependsOnNotFound),
    };

    let export = claims
        .data_account_export()
        .and_then(Value::as_object)
        .ok_or(ClaimError::DataAccountExportNotFound)?;
    for field in ExportField::ALL {
        match field.term().get(export) {
            Some(v) if !is_blank(v) => {}
            _ => return Err(ClaimError::ExportFieldNotFound(field)),
        }
    }

    match claims.policy() {
        None | Some(Value::Null) => return Err(ClaimError::InvalidPolicy),
        Some(_) => {}
    }

    Ok(ValidatedClaims {
        aggregation_ids: reference_ids(aggregation),
        depends_on_ids,
    })
}

/// Validate the offering name carried next to the claim set.
///
/// # Errors
///
/// Returns [`ClaimError::InvalidServiceName`] when the name is absent or
/// whitespace only.
pub fn validate_offering_name(name: Option<&str>) -> Result<&str, ClaimError> {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => Ok(n),
        _ => Err(ClaimError::InvalidServiceName),
    }
}

fn is_reference_list(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(items) => items.iter().all(Value::is_object),
        _ => false,
    }
}
