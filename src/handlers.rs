// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the admin guard service.
//!
//! The login endpoint consults the rate limiter before it touches the
//! credential store, so a throttled client never gets a password check.

use crate::client::client_identifier;
use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::error::{AppError, Result};
use crate::limiter::{format_wait_time, RateLimiter};
use crate::metrics::Metrics;
use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Shared application state.
pub struct AppState {
    pub limiter: Arc<RateLimiter>,
    pub credentials: Arc<dyn CredentialStore>,
    pub metrics: Arc<Metrics>,
    pub config: Config,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

/// Admin login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Admin login response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub attempts_left: u32,
}

/// Body returned when a client is throttled.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitedResponse {
    pub error: String,
    /// Seconds until the client may try again
    pub retry_after: u64,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/api/admin/login", post(login));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    let cors = cors_layer(&state.config.cors.allowed_origins);

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "pet-value-admin",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<Response> {
    let body = state.metrics.render()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

/// Verify admin credentials, throttled per client address.
pub async fn login(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<Response> {
    let client = client_identifier(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    let limit = &state.config.login_limit;
    let key = limit.key_for(&client);

    let decision = state
        .limiter
        .check(&key, limit.window(), limit.max_attempts)
        .await;
    state
        .metrics
        .tracked_identifiers
        .set(state.limiter.len().await as i64);

    if !decision.allowed {
        state
            .metrics
            .login_attempts
            .with_label_values(&["limited"])
            .inc();

        let retry_after = decision.retry_after_secs();
        info!(%client, retry_after_secs = retry_after, "Login attempt rate limited");

        return Ok((
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, retry_after.to_string())],
            Json(RateLimitedResponse {
                error: format!(
                    "Too many login attempts. Please try again in {}.",
                    format_wait_time(decision.reset_at)
                ),
                retry_after,
            }),
        )
            .into_response());
    }

    state
        .metrics
        .login_attempts
        .with_label_values(&["allowed"])
        .inc();
    debug!(%client, attempts_left = decision.attempts_left, "Login attempt admitted");

    let credentials = state.credentials.clone();
    let LoginRequest { username, password } = req;
    let verified = tokio::task::spawn_blocking(move || credentials.verify(&username, &password))
        .await
        .map_err(|e| AppError::Internal(format!("credential check panicked: {}", e)))??;

    if verified {
        state
            .metrics
            .login_verifications
            .with_label_values(&["success"])
            .inc();
        info!(%client, "Admin login succeeded");

        Ok((
            StatusCode::OK,
            Json(LoginResponse {
                success: true,
                error: None,
                attempts_left: decision.attempts_left,
            }),
        )
            .into_response())
    } else {
        state
            .metrics
            .login_verifications
            .with_label_values(&["failure"])
            .inc();
        warn!(%client, "Admin login failed");

        Ok((
            StatusCode::UNAUTHORIZED,
            Json(LoginResponse {
                success: false,
                error: Some("Invalid credentials".to_string()),
                attempts_left: decision.attempts_left,
            }),
        )
            .into_response())
    }
}
