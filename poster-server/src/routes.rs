//! Poster gallery API.
//!
//! One handler answers every method on `/api/posters` (and its
//! `/.netlify/functions/posters` alias):
//!
//! | Method    | Body                       | Response                 |
//! |-----------|----------------------------|--------------------------|
//! | `GET`     |                            | `{posters: [...]}`       |
//! | `POST`    | upload, `dataURL` required | `{id}`                   |
//! | `DELETE`  | `{id}`                     | `{ok: true}`             |
//! | `OPTIONS` |                            | `{ok: true}`             |
//! | other     |                            | 405 `{error}`            |

use axum::body::Bytes;
use axum::extract::State;
use axum::http::Method;
use axum::Json;
use poster_core::{NewPoster, PosterId};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::metrics;
use crate::validation::validate_poster_id;
use crate::AppState;

/// Dispatch a posters request by method.
///
/// # Errors
///
/// Returns [`ApiError::BadRequest`] for an unparsable body or a missing
/// `dataURL`/`id`, [`ApiError::MethodNotAllowed`] for unsupported methods and
/// [`ApiError::Internal`] when storage fails.
#[tracing::instrument(name = "posters", skip(state, body), fields(len = body.len()))]
pub async fn posters(
    State(state): State<AppState>,
    method: Method,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    match method {
        Method::OPTIONS => Ok(Json(json!({ "ok": true }))),
        Method::GET => list(&state).await,
        Method::POST => create(&state, &body).await,
        Method::DELETE => remove(&state, &body).await,
        _ => Err(ApiError::MethodNotAllowed),
    }
}

async fn list(state: &AppState) -> Result<Json<Value>, ApiError> {
    let result = state.storage.list_all().await;
    metrics::record_storage_op("list", result.is_ok());
    let mut posters = result?;
    posters.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(Json(json!({ "posters": posters })))
}

async fn create(state: &AppState, body: &[u8]) -> Result<Json<Value>, ApiError> {
    let payload = parse_body(body)?;
    let has_image = payload
        .get("dataURL")
        .and_then(Value::as_str)
        .is_some_and(|d| !d.is_empty());
    if !has_image {
        return Err(ApiError::bad_request("Missing dataURL"));
    }
    let upload: NewPoster = serde_json::from_value(payload)
        .map_err(|e| ApiError::bad_request(format!("Invalid poster: {e}")))?;

    let result = state.storage.save(upload).await;
    metrics::record_storage_op("save", result.is_ok());
    let id = result?;
    tracing::info!(%id, "Poster saved");
    Ok(Json(json!({ "id": id })))
}

async fn remove(state: &AppState, body: &[u8]) -> Result<Json<Value>, ApiError> {
    let payload = parse_body(body)?;
    let id = match payload.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(ApiError::bad_request("Missing id")),
    };
    if let Err(err) = validate_poster_id(&id) {
        metrics::record_validation_failure(err.kind());
        return Err(err.into());
    }

    let result = state.storage.delete(&PosterId::from_string(id)).await;
    metrics::record_storage_op("delete", result.is_ok());
    result?;
    Ok(Json(json!({ "ok": true })))
}

/// Parse a request body. An empty body counts as `{}`.
fn parse_body(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    serde_json::from_slice(body).map_err(|_| ApiError::bad_request("Invalid JSON body"))
}
