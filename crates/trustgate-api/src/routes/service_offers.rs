//! # Service-Offering Routes
//!
//! - `POST /v1/service-offers`: issue; the participant comes from the body
//!   (`participantJsonUrl`, `verificationMethod`, `privateKey`).
//! - `POST /v1/participants/:participant_id/service-offers`: issue for a
//!   registered participant.
//! - `POST /v1/service-offers/filter` and
//!   `POST /v1/participants/:participant_id/service-offers/filter`: paged
//!   listing.
//! - `GET  /v1/service-offers/:id`: detail, re-read from the hosted document.
//! - `POST /v1/service-offers/locations`: subdivision names allowed by an
//!   offering's policy.
//!
//! Handlers only parse and delegate; the pipeline lives in
//! [`crate::issuance`].

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extractors::{self, extract_json};
use crate::issuance::query::FilterRequest;
use crate::issuance::IssueRequest;
use crate::state::AppState;

/// Assemble the service-offering router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/service-offers", post(issue))
        .route("/v1/service-offers/filter", post(filter))
        .route("/v1/service-offers/locations", post(locations))
        .route("/v1/service-offers/:id", get(get_offering))
        .route(
            "/v1/participants/:participant_id/service-offers",
            post(issue_for_participant),
        )
        .route(
            "/v1/participants/:participant_id/service-offers/filter",
            post(filter_for_participant),
        )
}

// -- Request/Response types ---------------------------------------------------

/// Body of the locations endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationsRequest {
    /// Public URL of the hosted offering.
    pub id: String,
}

/// Subdivision names, in policy order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationsResponse {
    pub locations: Vec<String>,
}

// -- Handlers -----------------------------------------------------------------

async fn issue(
    State(state): State<AppState>,
    body: Result<Json<IssueRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = extract_json(body)?;
    let issued = state.issuer.issue(request, None).await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

async fn issue_for_participant(
    State(state): State<AppState>,
    Path(participant_id): Path<String>,
    body: Result<Json<IssueRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let participant_id = extractors::participant_id(&participant_id)?;
    let request = extract_json(body)?;
    let issued = state.issuer.issue(request, Some(participant_id)).await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

async fn filter(
    State(state): State<AppState>,
    body: Result<Json<FilterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = extract_json(body)?;
    let page = state.query.filter(request, None).await?;
    Ok(Json(page))
}

async fn filter_for_participant(
    State(state): State<AppState>,
    Path(participant_id): Path<String>,
    body: Result<Json<FilterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let participant_id = extractors::participant_id(&participant_id)?;
    let request = extract_json(body)?;
    let page = state.query.filter(request, Some(participant_id)).await?;
    Ok(Json(page))
}

async fn get_offering(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = extractors::offering_id(&id)?;
    let detail = state.query.get_by_id(id).await?;
    Ok(Json(detail))
}

async fn locations(
    State(state): State<AppState>,
    body: Result<Json<LocationsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = extract_json(body)?;
    if request.id.trim().is_empty() {
        return Err(AppError::BadRequest("id must not be blank".into()));
    }
    let locations = state.query.locations(request.id.trim()).await?;
    Ok(Json(LocationsResponse { locations }))
}
