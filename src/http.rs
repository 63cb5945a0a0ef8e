//! HTTP gateway: the whole-document `/api/data` endpoints plus `/api/rpc`,
//! which accepts the same `{id, method, params}` envelopes as the stdin loop.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ServerConfig;
use crate::ipc::{self, AppState, Request};
use crate::store::{self, DataStore};

#[derive(Clone)]
pub struct HttpState {
    pub app: Arc<Mutex<AppState>>,
}

impl HttpState {
    pub fn new(app: AppState) -> Self {
        Self {
            app: Arc::new(Mutex::new(app)),
        }
    }
}

pub fn router(state: HttpState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/data", get(get_data_handler).post(post_data_handler))
        .route("/api/rpc", post(rpc_handler))
        .layer(cors)
        .with_state(state)
}

fn failure(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
        .into_response()
}

async fn get_data_handler(State(state): State<HttpState>) -> Response {
    let app = state.app.lock().await;
    let Some(store) = app.store.as_ref() else {
        return failure("Failed to read data");
    };
    match store.load_document() {
        Ok(doc) => Json(doc).into_response(),
        Err(e) => {
            tracing::error!(path = %store.path().display(), error = ?e, "read failed");
            failure("Failed to read data")
        }
    }
}

/// Stores the body verbatim, then refreshes the in-memory classroom from it.
async fn post_data_handler(State(state): State<HttpState>, Json(doc): Json<Value>) -> Response {
    if !doc.is_object() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Body must be a JSON object" })),
        )
            .into_response();
    }

    let mut app = state.app.lock().await;
    let Some(store) = app.store.as_ref() else {
        return failure("Failed to save data");
    };
    if let Err(e) = store.save_document(&doc) {
        tracing::error!(path = %store.path().display(), error = ?e, "save failed");
        return failure("Failed to save data");
    }
    match store::classroom_from_document(&doc) {
        Ok(classroom) => app.classroom = classroom,
        Err(e) => tracing::warn!(error = ?e, "stored document has no usable classroom state"),
    }
    Json(json!({ "success": true })).into_response()
}

async fn rpc_handler(State(state): State<HttpState>, Json(req): Json<Request>) -> Json<Value> {
    let mut app = state.app.lock().await;
    Json(ipc::handle_request(&mut app, req))
}

/// Loads the data file and serves until the listener fails.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let mut app = AppState::new();
    if let Err(e) = app.open_data_file(&config.data_file) {
        // Serve anyway; reads report the failure until the file is fixed.
        tracing::warn!(
            path = %config.data_file.display(),
            error = ?e,
            "could not load stored classroom"
        );
        app.store = Some(DataStore::open(&config.data_file)?);
    }

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(addr = %addr, data_file = %config.data_file.display(), "serving");

    axum::serve(listener, router(HttpState::new(app)))
        .await
        .context("server failed")
}
