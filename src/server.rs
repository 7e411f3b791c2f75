use crate::{
    config::Config,
    mcp::{
        registry::ToolRegistry,
        types::{ApiDocs, ToolInfo, ToolRequest, ToolResponse},
    },
};
use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::{collections::BTreeMap, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

pub const SERVER_NAME: &str = "AWS Storage MCP Server";

const SUPPORTED_SERVICES: [&str; 9] = [
    "Amazon S3",
    "Amazon EBS",
    "Amazon EFS",
    "Amazon FSx",
    "AWS Storage Gateway",
    "Amazon S3 Glacier",
    "AWS Snow Family",
    "AWS Backup",
    "Amazon S3 Object Lambda",
];

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub registry: Arc<ToolRegistry>,
}

pub async fn serve(cfg: Config, registry: ToolRegistry) -> anyhow::Result<()> {
    let shared = AppState { cfg: Arc::new(cfg), registry: Arc::new(registry) };
    let app = build_router(shared.clone());

    let addr = format!("{}:{}", shared.cfg.server.bind_addr, shared.cfg.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(addr = %addr, "listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    tracing::info!("server stopped");
    Ok(())
}

pub fn build_router(shared: AppState) -> Router {
    let limit_bytes = shared.cfg.limits.max_request_kb.saturating_mul(1024);
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);
    Router::new()
        .route("/health", get(health))
        .route("/api", get(api_docs))
        .route("/api/", get(api_docs))
        .route("/invoke", post(invoke))
        .route("/", post(invoke))
        .fallback(not_found)
        .layer(RequestBodyLimitLayer::new(limit_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Liveness only; never reaches the provider.
async fn health() -> Json<ToolResponse> {
    Json(ToolResponse::message("Server is running"))
}

async fn api_docs(State(state): State<AppState>) -> Response {
    let docs = ApiDocs {
        server: SERVER_NAME,
        version: env!("CARGO_PKG_VERSION"),
        endpoints: BTreeMap::from([
            ("/health", "Health check (GET)"),
            ("/api", "Tool catalog (GET)"),
            ("/invoke", "Invoke a tool with {tool_name, parameters} (POST)"),
        ]),
        supported_services: SUPPORTED_SERVICES.to_vec(),
        tools: state.registry.definitions().map(ToolInfo::from).collect(),
    };
    match serde_json::to_value(&docs) {
        Ok(data) => (StatusCode::OK, Json(ToolResponse::success(None, Some(data)))).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Json(ToolResponse::error(e.to_string()))).into_response(),
    }
}

async fn invoke(State(state): State<AppState>, payload: Result<Json<ToolRequest>, JsonRejection>) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            tracing::info!(status = %rejection.status(), reason = %rejection.body_text(), "rejected request body");
            let body = ToolResponse::error(format!("Invalid JSON: {}", rejection.body_text()));
            return (rejection.status(), Json(body)).into_response();
        }
    };
    let resp = state.registry.dispatch(req).await;
    // Tool failures travel in the envelope, not the status code.
    (StatusCode::OK, Json(resp)).into_response()
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ToolResponse>) {
    (StatusCode::NOT_FOUND, Json(ToolResponse::error(format!("Endpoint not found: {}", uri.path()))))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
}
