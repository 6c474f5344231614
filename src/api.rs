//! HTTP surface: LINE webhook, admin settings, image uploads, health.

use crate::gateway::Gateway;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path as UrlPath, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use replybot_channels::line::{signature::SIGNATURE_HEADER, types::WebhookPayload};
use replybot_core::error::ReplybotError;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Request body cap for JSON routes.
const BODY_LIMIT: usize = 1024 * 1024;

/// Request body cap for `/upload`.
const UPLOAD_LIMIT: usize = 20 * 1024 * 1024;

type ApiError = (StatusCode, Json<Value>);

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub gateway: Arc<Gateway>,
    /// Bearer token for admin and upload routes. `None` = open.
    pub admin_api_key: Option<String>,
    pub admin_page: PathBuf,
    pub uploads_dir: PathBuf,
    /// Base for returned upload URLs. `None` = derive from the `Host` header.
    pub public_url: Option<String>,
    pub uptime: Instant,
}

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({"error": message.into()})))
}

/// Constant-time string comparison for the admin token.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Check bearer token auth. `Err` carries the rejection.
fn check_auth(headers: &HeaderMap, api_key: &Option<String>) -> Result<(), ApiError> {
    let Some(key) = api_key else {
        return Ok(());
    };

    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "missing Authorization header"))?
        .to_str()
        .map_err(|_| api_error(StatusCode::UNAUTHORIZED, "invalid Authorization header"))?;

    match value.strip_prefix("Bearer ") {
        Some(token) if constant_time_eq(token, key) => Ok(()),
        _ => Err(api_error(StatusCode::UNAUTHORIZED, "invalid token")),
    }
}

/// `POST /webhook`: verify the signature over the raw body, then dispatch.
async fn webhook(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !state.gateway.channel().verify_signature(&body, signature) {
        warn!("webhook: rejected request with bad signature");
        return Err(api_error(StatusCode::UNAUTHORIZED, "invalid signature"));
    }

    let payload = WebhookPayload::parse(&body).map_err(|e| {
        api_error(StatusCode::BAD_REQUEST, format!("invalid webhook body: {e}"))
    })?;
    info!("webhook: {} events", payload.events.len());

    let outcomes = state.gateway.dispatch(&payload.events).await.map_err(|e| {
        error!("webhook: dispatch failed: {e}");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let outcomes = serde_json::to_value(outcomes)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(outcomes))
}

/// `GET /admin`: the static admin page.
async fn admin_page(State(state): State<ApiState>) -> Result<Html<String>, ApiError> {
    tokio::fs::read_to_string(&state.admin_page)
        .await
        .map(Html)
        .map_err(|e| {
            warn!("admin page {}: {e}", state.admin_page.display());
            api_error(StatusCode::NOT_FOUND, "admin page not found")
        })
}

/// `GET /admin/settings`: the current snapshot in canonical shape.
async fn get_settings(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    check_auth(&headers, &state.admin_api_key)?;
    let snapshot = state.gateway.settings().snapshot();
    let value = serde_json::to_value(&*snapshot)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(value))
}

/// `POST /admin/settings`: merge, validate, persist, then swap.
async fn save_settings(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    check_auth(&headers, &state.admin_api_key)?;
    let patch: Value = serde_json::from_slice(&body)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("invalid JSON: {e}")))?;

    match state.gateway.settings().save(patch).await {
        Ok(saved) => {
            info!("settings saved ({} rules)", saved.keywords.len());
            Ok(Json(json!({"status": "saved"})))
        }
        Err(ReplybotError::Settings(e)) => {
            warn!("settings rejected: {e}");
            Err(api_error(StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e) => {
            error!("settings save failed: {e}");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// Extension for a stored upload: alphanumeric, at most 8 chars, lower-cased.
fn upload_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "bin".to_string())
}

fn upload_base_url(state: &ApiState, headers: &HeaderMap) -> String {
    if let Some(url) = &state.public_url {
        return url.trim_end_matches('/').to_string();
    }
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}")
}

/// `POST /upload`: store every `images` part, return their public URLs.
async fn upload(
    State(state): State<ApiState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    check_auth(&headers, &state.admin_api_key)?;

    tokio::fs::create_dir_all(&state.uploads_dir)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let base = upload_base_url(&state, &headers);
    let mut urls = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?
    {
        if field.name() != Some("images") {
            continue;
        }
        let name = format!("{}.{}", Uuid::new_v4(), upload_extension(field.file_name()));
        let data = field
            .bytes()
            .await
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
        tokio::fs::write(state.uploads_dir.join(&name), &data)
            .await
            .map_err(|e| {
                error!("upload write failed: {e}");
                api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            })?;
        info!("stored upload {name} ({} bytes)", data.len());
        urls.push(format!("{base}/uploads/{name}"));
    }

    if urls.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "no images uploaded"));
    }
    Ok(Json(json!({"urls": urls})))
}

fn content_type_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// `GET /uploads/{name}`: serve a stored upload. Names never leave the directory.
async fn serve_upload(
    State(state): State<ApiState>,
    UrlPath(name): UrlPath<String>,
) -> Result<Response, ApiError> {
    let not_found = || api_error(StatusCode::NOT_FOUND, "not found");
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return Err(not_found());
    }
    let data = tokio::fs::read(state.uploads_dir.join(&name))
        .await
        .map_err(|_| not_found())?;
    Ok(([(header::CONTENT_TYPE, content_type_for(&name))], data).into_response())
}

/// `GET /api/health`: liveness plus the size of the live rule table.
async fn health(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "uptime_secs": state.uptime.elapsed().as_secs(),
        "rules": state.gateway.settings().snapshot().keywords.len(),
    }))
}

/// Build the axum router with shared state.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/admin", get(admin_page))
        .route("/admin/settings", get(get_settings).post(save_settings))
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
        )
        .route("/uploads/{name}", get(serve_upload))
        .route("/api/health", get(health))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(state: ApiState, addr: &str) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind to {addr}: {e}"))?;

    info!("listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("failed to listen for shutdown signal: {e}");
            }
            info!("shutting down");
        })
        .await?;
    Ok(())
}
