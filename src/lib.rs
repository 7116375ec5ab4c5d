//! Storefront accounts: registration, sign-in and role-gated account
//! management over HTTP.

#![forbid(unsafe_code)]
pub mod account;
pub mod config;
pub mod crypto;
mod database;
pub mod error;
pub mod mail;
pub mod repository;
mod router;
pub mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, StatusCode, header};
use axum::routing::{get, post};
use axum::{Router, middleware as AxumMiddleware};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

use crate::account::{AccountService, AccountStore, TokenService};
use crate::repository::memory::MemoryDatabase;
use crate::repository::postgres::{PgAccountStore, PgTokenStore};

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    token: Option<&str>,
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    let mut request = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, token);
    }

    app.oneshot(request.body(axum::body::Body::from(body)).unwrap())
        .await
        .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub service: Arc<AccountService>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// State over in-memory stores with a fast legacy hasher.
    #[cfg(test)]
    pub fn in_memory(db: &MemoryDatabase) -> Self {
        let service = AccountService::new(
            Box::new(db.accounts()),
            Box::new(db.tokens()),
            Box::new(mail::MailManager::default()),
            Box::new(crypto::LegacyMd5Hasher),
        );

        Self {
            config: Arc::new(config::Configuration::default()),
            service: Arc::new(service),
            metrics: None,
        }
    }
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(10)))
        // Remove senstive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
                .allow_headers(Any)
                .vary([header::AUTHORIZATION]),
        );

    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::handler))
        // `GET /metrics` goes to the Prometheus scrape.
        .route("/metrics", get(router::metrics::handler))
        // `POST /create` goes to `create`.
        .route("/create", post(router::create::handler))
        // `POST /login` goes to `login`.
        .route("/login", post(router::login::handler))
        .nest("/users", router::users::router())
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state(
    config: Arc<config::Configuration>,
    metrics: Option<PrometheusHandle>,
) -> Result<AppState, Box<dyn std::error::Error + Send + Sync>> {
    let (store, tokens): (Box<dyn AccountStore>, Box<dyn TokenService>) =
        match &config.postgres {
            Some(postgres) => {
                let db = database::Database::from_config(postgres).await?;
                // execute migrations scripts on start.
                db.migrate().await?;

                (
                    Box::new(PgAccountStore::new(db.postgres.clone())),
                    Box::new(PgTokenStore::new(db.postgres)),
                )
            },
            None => {
                tracing::warn!(
                    "missing `postgres` entry on `config.yaml` file, accounts are kept in memory"
                );
                let db = MemoryDatabase::default();
                (Box::new(db.accounts()), Box::new(db.tokens()))
            },
        };

    let hasher = crypto::credential_hasher(
        config.password.algorithm,
        config.argon2.clone(),
    )?;

    // handle mail sender.
    let mail = if let Some(cfg) = &config.mail {
        mail::MailManager::new(cfg).await?
    } else {
        tracing::warn!("missing `mail` entry on `config.yaml` file, mails are only logged");
        mail::MailManager::default()
    };

    let service = AccountService::new(store, tokens, Box::new(mail), hasher);

    Ok(AppState {
        config,
        service: Arc::new(service),
        metrics,
    })
}
