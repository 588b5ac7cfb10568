use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{error, info, warn};

use estate_core::{Property, PropertyDraft, Review};
use estate_storage::PropertyError;

use crate::error::ErrorResponse;
use crate::router::AppState;

const ROUTE_CREATE: &str = "create_property";
const ROUTE_LIST: &str = "list_properties";
const ROUTE_REVIEW: &str = "add_review";
const ROUTE_DELETE: &str = "delete_property";

/// Body returned after a property has been removed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedProperty {
    message: &'static str,
    deleted_property: Property,
}

fn record(route: &'static str, result: &'static str, start: Instant) {
    counter!("api_requests_total", "route" => route, "result" => result).increment(1);
    histogram!("api_request_seconds", "route" => route).record(start.elapsed().as_secs_f64());
}

/// `POST /api/properties`
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<PropertyDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Property>), ErrorResponse> {
    let start = Instant::now();

    let Json(draft) = payload.map_err(|rejection| {
        warn!(stage = "api", route = ROUTE_CREATE, error = %rejection.body_text(), "unreadable property payload");
        record(ROUTE_CREATE, "invalid", start);
        ErrorResponse::bad_request(rejection.body_text())
    })?;

    let new_property = draft.validate().map_err(|err| {
        warn!(stage = "api", route = ROUTE_CREATE, missing = ?err.missing_fields(), "incomplete property data");
        record(ROUTE_CREATE, "invalid", start);
        ErrorResponse::bad_request(err.to_string())
    })?;

    let property = state
        .storage()
        .properties()
        .create(new_property)
        .await
        .map_err(|err| {
            error!(stage = "api", route = ROUTE_CREATE, error = %err, "failed to add property");
            record(ROUTE_CREATE, "error", start);
            ErrorResponse::internal()
        })?;

    info!(stage = "api", route = ROUTE_CREATE, property_id = %property.id, "property created");
    record(ROUTE_CREATE, "created", start);
    Ok((StatusCode::CREATED, Json(property)))
}

/// `GET /api/properties`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Property>>, ErrorResponse> {
    let start = Instant::now();

    let properties = state.storage().properties().list_all().await.map_err(|err| {
        error!(stage = "api", route = ROUTE_LIST, error = %err, "failed to list properties");
        record(ROUTE_LIST, "error", start);
        ErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    })?;

    record(ROUTE_LIST, "ok", start);
    Ok(Json(properties))
}

/// `POST /api/properties/:id/review`
///
/// The property is resolved before the body is looked at, so an unknown id is
/// always a 404. Anything else is reported as a bad request, storage failures
/// included. An empty body is stored as an empty review.
pub async fn add_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Property>), ErrorResponse> {
    let start = Instant::now();
    let repository = state.storage().properties();

    let existing = repository.find_by_id(&id).await.map_err(|err| {
        warn!(stage = "api", route = ROUTE_REVIEW, property_id = %id, error = %err, "failed to load property");
        record(ROUTE_REVIEW, "error", start);
        ErrorResponse::bad_request(err.to_string())
    })?;
    if existing.is_none() {
        record(ROUTE_REVIEW, "not_found", start);
        return Err(ErrorResponse::not_found());
    }

    let review = parse_review(&body).map_err(|err| {
        warn!(stage = "api", route = ROUTE_REVIEW, property_id = %id, error = %err, "unreadable review payload");
        record(ROUTE_REVIEW, "invalid", start);
        ErrorResponse::bad_request(format!("failed to parse review: {err}"))
    })?;

    state.review_rules().check(&review).map_err(|err| {
        warn!(stage = "api", route = ROUTE_REVIEW, property_id = %id, error = %err, "review rejected");
        record(ROUTE_REVIEW, "invalid", start);
        ErrorResponse::bad_request(err.to_string())
    })?;

    let property = repository
        .append_review(&id, review)
        .await
        .map_err(|err| match err {
            PropertyError::NotFound => {
                record(ROUTE_REVIEW, "not_found", start);
                ErrorResponse::not_found()
            }
            other => {
                warn!(stage = "api", route = ROUTE_REVIEW, property_id = %id, error = %other, "failed to add review");
                record(ROUTE_REVIEW, "error", start);
                ErrorResponse::bad_request(other.to_string())
            }
        })?;

    info!(stage = "api", route = ROUTE_REVIEW, property_id = %property.id, reviews = property.reviews.len(), "review added");
    record(ROUTE_REVIEW, "created", start);
    Ok((StatusCode::CREATED, Json(property)))
}

fn parse_review(body: &[u8]) -> Result<Review, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Review::default());
    }
    serde_json::from_slice(body)
}

/// `DELETE /api/properties/:id`
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedProperty>, ErrorResponse> {
    let start = Instant::now();

    let deleted = state
        .storage()
        .properties()
        .delete_by_id(&id)
        .await
        .map_err(|err| {
            error!(stage = "api", route = ROUTE_DELETE, property_id = %id, error = %err, "failed to delete property");
            record(ROUTE_DELETE, "error", start);
            ErrorResponse::internal()
        })?;

    let Some(property) = deleted else {
        record(ROUTE_DELETE, "not_found", start);
        return Err(ErrorResponse::not_found());
    };

    info!(stage = "api", route = ROUTE_DELETE, property_id = %property.id, "property deleted");
    record(ROUTE_DELETE, "deleted", start);
    Ok(Json(DeletedProperty {
        message: "Property deleted",
        deleted_property: property,
    }))
}
