//! HTTP API for pages.
//!
//! All page endpoints live under `/api/pages`. Responses are JSON except
//! for the component bundle, which is served as a JavaScript file.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use forge_core::GenerationRequest;
use forge_model::ModelChoice;
use forge_pages::PageKind;

use crate::state::AppState;
use crate::ws;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/pages/generate", post(generate_page))
        .route("/api/pages/initialize", post(initialize_page))
        .route("/api/pages/list", get(list_pages))
        .route(
            "/api/pages/:page_id/content",
            get(get_content).put(update_content),
        )
        .route("/api/pages/:page_id/component", get(get_component))
        .route("/api/pages/:page_id/component-code", get(get_component_code))
        .route("/ws", get(ws::upgrade))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody {
    page_id: Option<String>,
    page_type: Option<String>,
    user_prompt: Option<String>,
    use_local_model: Option<bool>,
}

/// Kick off a detached generation job and answer immediately; progress is
/// reported over the WebSocket channel for the page.
async fn generate_page(State(state): State<AppState>, Json(body): Json<GenerateBody>) -> Response {
    let (Some(page_id), Some(kind_raw), Some(prompt)) = (
        non_empty(body.page_id),
        non_empty(body.page_type),
        non_empty(body.user_prompt),
    ) else {
        return bad_request("Missing required fields: pageId, pageType, userPrompt");
    };
    let kind = match kind_raw.parse::<PageKind>() {
        Ok(kind) => kind,
        Err(_) => return bad_request(&format!("Unknown pageType: {kind_raw}")),
    };

    state.coordinator.spawn_generation(GenerationRequest {
        page_id: page_id.clone(),
        page_kind: kind,
        prompt,
        model_choice: body.use_local_model.map(ModelChoice::from_use_local),
    });

    Json(json!({
        "success": true,
        "pageId": page_id,
        "message": "Page generation started",
        "status": "processing",
    }))
    .into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeBody {
    page_id: Option<String>,
    page_type: Option<String>,
    user_prompt: Option<String>,
    use_local_model: Option<bool>,
}

/// Create a page synchronously from the template for its kind. When a
/// prompt is supplied the model names the page; otherwise (or when the
/// model fails) the kind's stock title is used.
async fn initialize_page(
    State(state): State<AppState>,
    Json(body): Json<InitializeBody>,
) -> Response {
    let (Some(page_id), Some(kind_raw)) = (non_empty(body.page_id), non_empty(body.page_type))
    else {
        return bad_request("Missing required fields: pageId, pageType");
    };
    let kind = match kind_raw.parse::<PageKind>() {
        Ok(kind) => kind,
        Err(_) => return bad_request(&format!("Unknown pageType: {kind_raw}")),
    };

    let title = match non_empty(body.user_prompt) {
        Some(prompt) => {
            let choice = ModelChoice::from_use_local(body.use_local_model.unwrap_or(false));
            match state.model.generate_title(&prompt, kind, choice).await {
                Ok(title) if !title.trim().is_empty() => title,
                Ok(_) => kind.default_title().to_string(),
                Err(e) => {
                    warn!("Title generation for {page_id} failed: {e}");
                    kind.default_title().to_string()
                }
            }
        }
        None => kind.default_title().to_string(),
    };

    match state.store.initialize_page(&page_id, kind, &title).await {
        Ok(content) => Json(json!({
            "success": true,
            "pageId": page_id,
            "content": content,
            "title": title,
            "message": "Page initialized successfully",
        }))
        .into_response(),
        Err(e) => {
            error!("Failed to initialize page {page_id}: {e}");
            internal_error("Failed to initialize page")
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    page_type: Option<String>,
}

async fn list_pages(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    let filter = match query.page_type.as_deref() {
        None | Some("all") => None,
        Some(raw) => match raw.parse::<PageKind>() {
            Ok(kind) => Some(kind),
            Err(_) => return bad_request(&format!("Unknown pageType: {raw}")),
        },
    };

    let pages = state.store.list_pages(filter).await;
    Json(json!({ "success": true, "pages": pages })).into_response()
}

async fn get_content(State(state): State<AppState>, Path(page_id): Path<String>) -> Response {
    match state.store.read_content(&page_id).await {
        Ok(content) => {
            let is_component = state.store.has_bundle(&page_id).await;
            Json(json!({
                "success": true,
                "pageId": page_id,
                "isComponent": is_component,
                "content": content,
            }))
            .into_response()
        }
        Err(e) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Page not found", "details": e.to_string() })),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct UpdateContentBody {
    content: Option<String>,
}

/// Replace the page's HTML content and notify subscribers.
async fn update_content(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
    Json(body): Json<UpdateContentBody>,
) -> Response {
    let Some(content) = body.content else {
        return bad_request("Missing content field");
    };

    if let Err(e) = state.store.write_content(&page_id, &content).await {
        error!("Failed to update page {page_id}: {e}");
        return internal_error("Failed to update page");
    }
    state.hub.page_update(&page_id, content);

    Json(json!({
        "success": true,
        "pageId": page_id,
        "message": "Page updated successfully",
    }))
    .into_response()
}

/// Serve the built component bundle as JavaScript.
async fn get_component(State(state): State<AppState>, Path(page_id): Path<String>) -> Response {
    match tokio::fs::read(state.store.bundle_path(&page_id)).await {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, "application/javascript")],
            bytes,
        )
            .into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "Component not found",
                "message": "The built component has not been generated yet",
            })),
        )
            .into_response(),
    }
}

async fn get_component_code(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
) -> Response {
    match state.store.read_component_source(&page_id).await {
        Ok(code) => Json(json!({
            "success": true,
            "pageId": page_id,
            "componentCode": code,
        }))
        .into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "Component code not found",
                "message": "The component code has not been generated yet",
            })),
        )
            .into_response(),
    }
}

/// Treats blank strings like absent fields.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn internal_error(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
        .into_response()
}
