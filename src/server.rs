// src/server.rs

//! HTTP trigger endpoint.
//!
//! A scheduler calls one of the check routes; the handler runs the whole
//! pipeline before answering. When a shared secret is configured the caller
//! must send `Authorization: Bearer <secret>`.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::ServerConfig;
use crate::pipeline::Tracker;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    tracker: Arc<Tracker>,
    cron_secret: Option<Arc<str>>,
}

/// Body of every trigger response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub message: String,
}

fn reply(status: StatusCode, message: &str) -> (StatusCode, Json<TriggerResponse>) {
    (
        status,
        Json(TriggerResponse {
            message: message.to_string(),
        }),
    )
}

/// Build the router with the check and health routes.
pub fn build_router(tracker: Arc<Tracker>, cron_secret: Option<String>) -> Router {
    let state = AppState {
        tracker,
        cron_secret: cron_secret.map(Arc::from),
    };

    Router::new()
        .route("/api/cron", get(check_handler).post(check_handler))
        .route(
            "/api/checkForUpdates",
            get(check_handler).post(check_handler),
        )
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(tracker: Arc<Tracker>, config: &ServerConfig) -> Result<()> {
    if config.cron_secret.is_none() {
        log::warn!("No cron secret configured; the trigger endpoint is open");
    }
    let app = build_router(tracker, config.cron_secret.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    log::info!("Trigger endpoint listening on {}", config.bind);
    axum::serve(listener, app).await?;
    Ok(())
}

fn authorized(headers: &HeaderMap, secret: Option<&str>) -> bool {
    let Some(secret) = secret else {
        return true;
    };
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == secret)
}

/// Run one check and report the result.
///
/// A started check always runs to completion, even if the caller disconnects.
async fn check_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<TriggerResponse>) {
    if !authorized(&headers, state.cron_secret.as_deref()) {
        log::warn!("Rejected trigger with missing or wrong bearer token");
        return reply(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    // The run lives on its own task so a caller hanging up cannot cancel it
    // between persisting and notifying.
    let tracker = Arc::clone(&state.tracker);
    let outcome = match tokio::spawn(async move { tracker.run().await }).await {
        Ok(result) => result,
        Err(e) => Err(AppError::from(e)),
    };

    match outcome {
        Ok(report) => {
            log::info!(
                "Check finished: {} new, {} deferred, notified={}",
                report.new,
                report.deferred,
                report.notified
            );
            reply(StatusCode::OK, "Done")
        }
        Err(AppError::RunInProgress) => {
            log::warn!("Trigger ignored: a check is already running");
            reply(StatusCode::CONFLICT, "Busy")
        }
        Err(e) => {
            log::error!("Check failed: {e}");
            reply(StatusCode::INTERNAL_SERVER_ERROR, "Error")
        }
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
