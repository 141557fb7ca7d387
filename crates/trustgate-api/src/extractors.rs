//! # Custom Extractors
//!
//! JSON body and path parameter helpers that map rejections to
//! [`AppError::BadRequest`].

use axum::extract::rejection::JsonRejection;
use axum::Json;
use trustgate_core::{OfferingId, ParticipantId};

use crate::error::AppError;

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
///
/// ```ignore
/// async fn handler(body: Result<Json<T>, JsonRejection>) -> Result<..., AppError> {
///     let req = extract_json(body)?;
/// }
/// ```
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Parse a participant id path segment.
pub fn participant_id(raw: &str) -> Result<ParticipantId, AppError> {
    Ok(ParticipantId::parse_str(raw)?)
}

/// Parse an offering id path segment.
pub fn offering_id(raw: &str) -> Result<OfferingId, AppError> {
    Ok(OfferingId::parse_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_ids_are_bad_requests() {
        assert!(matches!(participant_id("nope"), Err(AppError::BadRequest(_))));
        let id = OfferingId::new();
        assert_eq!(offering_id(&id.to_string()).unwrap(), id);
    }
}
