//! HTTP middleware: request ids and caregiver authentication.

use axum::body::Body;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderName, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::server::AppState;

/// Attach an `x-request-id` header to every request and response.
///
/// An id supplied by the caller is preserved; otherwise a fresh one is
/// generated. The value is also stored in request extensions for log
/// correlation.
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let header_name = HeaderName::from_static("x-request-id");

    let req_id_value = req
        .headers()
        .get(&header_name)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_str(&Uuid::new_v4().to_string()).unwrap());

    req.extensions_mut().insert(req_id_value.clone());

    let mut res = next.run(req).await;
    res.headers_mut().insert(header_name, req_id_value);
    res
}

/// Authenticate the request's bearer token and attach the caregiver identity.
///
/// On success the verified [`carebridge_auth::CaregiverIdentity`] lands in
/// request extensions for handlers to read. The failure message tells a
/// missing or malformed header apart from a rejected token.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let Some(header) = header else {
        debug!(path = %req.uri().path(), "No Authorization header");
        return Err(ApiError::unauthorized(
            "Authorization header missing or invalid",
        ));
    };

    let Some(token) = header.strip_prefix("Bearer ") else {
        return Err(ApiError::unauthorized(
            "Authorization header missing or invalid",
        ));
    };

    if token.trim().is_empty() {
        return Err(ApiError::unauthorized("Token not provided"));
    }

    match state.verifier.verify(token).await {
        Ok(identity) => {
            debug!(caregiver_id = %identity.caregiver_id(), "Request authenticated");
            req.extensions_mut().insert(identity);
            Ok(next.run(req).await)
        }
        Err(err) => {
            warn!(error = %err, path = %req.uri().path(), "Authentication failed");
            Err(ApiError::from(err))
        }
    }
}
