//! The `/ws` endpoint: credential checks, session setup, and the socket loop.

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::server::AppState;

use super::session::{SessionHandle, SessionMessage};

/// Query parameters accepted by the realtime endpoint.
#[derive(Debug, Deserialize)]
pub struct RealtimeParams {
    /// Credential for browser clients that cannot set headers on upgrade.
    pub token: Option<String>,
}

/// `GET /ws` upgrade handler.
///
/// The credential comes from the `Authorization` header or the `token`
/// query parameter and is verified before the upgrade completes; a
/// rejected credential is an HTTP 401 and no session ever joins a room.
pub async fn realtime_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    Query(params): Query<RealtimeParams>,
) -> Result<Response, ApiError> {
    let token = bearer_token(&headers)
        .or(params.token.as_deref())
        .unwrap_or_default();

    let identity = match state.verifier.verify(token).await {
        Ok(identity) => identity,
        Err(err) if err.is_rejection() => {
            warn!(error = %err, "Realtime connection rejected");
            return Err(ApiError::unauthorized(err.to_string()));
        }
        Err(err) => {
            warn!(error = %err, "Realtime verification failed");
            return Err(ApiError::internal("Authentication failed"));
        }
    };

    let caregiver_id = identity.caregiver_id().to_string();
    Ok(ws.on_upgrade(move |socket| run_session(socket, caregiver_id, state)))
}

/// Extract a bearer token from the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.trim().is_empty())
}

/// Drive one authenticated session until the client goes away.
///
/// The session sits in its caregiver's room for the whole loop and leaves
/// on every exit path, including transport errors.
async fn run_session(socket: WebSocket, caregiver_id: String, state: AppState) {
    let (tx, mut rx) = mpsc::channel::<SessionMessage>(state.config.realtime.session_buffer);
    let handle = SessionHandle::new(caregiver_id.clone(), tx);
    let session_id = handle.id().to_string();
    let joined_at = handle.joined_at();

    state.sessions.join(handle);

    info!(
        caregiver_id = %caregiver_id,
        session_id = %session_id,
        "Realtime session connected"
    );

    let (mut sender, mut receiver) = socket.split();

    let mut heartbeat = interval(Duration::from_secs(state.config.realtime.heartbeat_secs));
    // The first tick completes immediately; consume it so heartbeats start
    // one period after connect.
    heartbeat.tick().await;

    loop {
        tokio::select! {
            // Inbound traffic from the client
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(session_id = %session_id, "Client closed session");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {
                        // Inbound text/binary/pong carries nothing for us
                    }
                    Some(Err(e)) => {
                        debug!(session_id = %session_id, error = %e, "Session transport error");
                        break;
                    }
                }
            }

            // Outbound messages queued by the dispatcher
            msg = rx.recv() => {
                match msg {
                    Some(SessionMessage::Notify(notification)) => {
                        let text = match notification.to_json() {
                            Ok(text) => text,
                            Err(e) => {
                                warn!(session_id = %session_id, error = %e, "Failed to encode notification");
                                continue;
                            }
                        };
                        if sender.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    Some(SessionMessage::Close) | None => {
                        debug!(session_id = %session_id, "Session channel closed");
                        break;
                    }
                }
            }

            // Server-side keep-alive
            _ = heartbeat.tick() => {
                if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    state.sessions.leave(&caregiver_id, &session_id);

    info!(
        caregiver_id = %caregiver_id,
        session_id = %session_id,
        connected_secs = joined_at.elapsed().as_secs(),
        "Realtime session closed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_authorization(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extracted() {
        let headers = headers_with_authorization("Bearer secret-token");
        assert_eq!(bearer_token(&headers), Some("secret-token"));
    }

    #[test]
    fn test_missing_header_yields_none() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_non_bearer_scheme_yields_none() {
        let headers = headers_with_authorization("Basic dXNlcjpwYXNz");
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_blank_token_yields_none() {
        let headers = headers_with_authorization("Bearer   ");
        assert_eq!(bearer_token(&headers), None);
    }
}
