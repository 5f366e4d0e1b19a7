//! Application state, router assembly, and the run loop.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, patch};
use axum::{Router, middleware};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

use carebridge_auth::{HttpIdentityProvider, IdentityVerifier, StorageCaregiverDirectory};
use carebridge_core::Caregiver;
use carebridge_core::events::EventBus;
use carebridge_db_memory::{InMemoryCaregiverStorage, InMemoryMemberStorage};
use carebridge_storage::{DynCaregiverStorage, DynMemberStorage, EventedMemberStorage};

use crate::config::AppConfig;
use crate::realtime::{AuditLogSink, NotificationDispatcher, SessionRegistry, socket};
use crate::{handlers, middleware as app_middleware};

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub verifier: Arc<IdentityVerifier>,
    /// Member storage wrapped so each successful mutation publishes.
    pub members: DynMemberStorage,
    pub caregivers: DynCaregiverStorage,
    pub sessions: Arc<SessionRegistry>,
    pub bus: Arc<EventBus>,
}

impl AppState {
    /// Assemble the full state graph for `config`.
    ///
    /// Builds a fresh bus with the notification dispatcher and audit sink
    /// registered, wraps member storage so mutations publish, seeds the
    /// caregiver directory, and wires the identity verifier to the
    /// configured authority.
    pub async fn from_config(config: AppConfig) -> Self {
        let bus = Arc::new(EventBus::new());
        let sessions = Arc::new(SessionRegistry::new());

        // Registration order is delivery order: audit runs after dispatch.
        bus.subscribe(Arc::new(NotificationDispatcher::new(sessions.clone())))
            .await;
        bus.subscribe(Arc::new(AuditLogSink::new())).await;

        let members: DynMemberStorage = Arc::new(EventedMemberStorage::new(
            InMemoryMemberStorage::new(),
            bus.clone(),
        ));
        let caregivers: DynCaregiverStorage = Arc::new(InMemoryCaregiverStorage::new());

        seed_caregivers(&caregivers, &config).await;

        let provider = Arc::new(HttpIdentityProvider::new(
            config.auth.provider_url.clone(),
            config.auth.api_key.clone(),
        ));
        let directory = Arc::new(StorageCaregiverDirectory::new(caregivers.clone()));
        let verifier = Arc::new(IdentityVerifier::new(provider, directory));

        Self {
            config: Arc::new(config),
            verifier,
            members,
            caregivers,
            sessions,
            bus,
        }
    }
}

/// Insert configured caregivers into the directory.
async fn seed_caregivers(storage: &DynCaregiverStorage, config: &AppConfig) {
    for seed in &config.seed.caregivers {
        let caregiver = Caregiver::new(&seed.subject_id, &seed.name, &seed.email);
        match storage.insert(caregiver).await {
            Ok(caregiver) => {
                info!(
                    caregiver_id = %caregiver.id,
                    subject_id = %seed.subject_id,
                    "Seeded caregiver"
                );
            }
            Err(e) if e.is_already_exists() => {
                debug!(subject_id = %seed.subject_id, "Caregiver already present");
            }
            Err(e) => {
                warn!(subject_id = %seed.subject_id, error = %e, "Failed to seed caregiver");
            }
        }
    }
}

/// Build the axum application over `state`.
pub fn build_app(state: AppState) -> Router {
    // Everything under /api requires a verified caregiver identity
    let protected = Router::new()
        .route(
            "/api/protected-members",
            get(handlers::list_members).post(handlers::create_member),
        )
        .route(
            "/api/protected-members/{id}",
            patch(handlers::update_member).delete(handlers::delete_member),
        )
        .route("/api/caregivers/me", get(handlers::me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            app_middleware::authenticate,
        ));

    Router::new()
        // Public endpoints
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        // Realtime endpoint does its own credential check before upgrade
        .route("/ws", get(socket::realtime_handler))
        .merge(protected)
        .fallback(handlers::not_found)
        // Middleware stack (order: request id -> cors -> compression -> trace)
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .with_state(state)
}

/// The assembled server, ready to run.
pub struct CareBridgeServer {
    addr: SocketAddr,
    app: Router,
}

impl CareBridgeServer {
    /// Serve until ctrl-c.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub async fn build(self) -> CareBridgeServer {
        let state = AppState::from_config(self.config).await;

        // The binary keeps one process-wide bus; tests assemble isolated
        // states and never install.
        EventBus::install_global(state.bus.clone());

        let app = build_app(state);
        CareBridgeServer {
            addr: self.addr,
            app,
        }
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
