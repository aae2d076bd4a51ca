//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::knowledge;
use crate::llm::{AnthropicClient, GeminiClient};
use crate::pipeline::Analyzer;

use super::types::*;

/// Shared application state.
pub struct AppState {
    pub analyzer: Analyzer,
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let knowledge = match &config.knowledge_path {
        Some(path) => match knowledge::load_corpus(path) {
            Ok(corpus) if corpus.is_empty() => {
                warn!("knowledge corpus at {} is empty", path.display());
                None
            }
            Ok(corpus) => Some(corpus),
            Err(e) => {
                // The solver still works without background knowledge.
                warn!("failed to load knowledge corpus: {e:#}");
                None
            }
        },
        None => None,
    };

    let ocr = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.ocr_model.clone(),
    ));
    let answerer = Arc::new(AnthropicClient::new(
        config.anthropic_api_key.clone(),
        config.answer_model.clone(),
    ));

    let state = Arc::new(AppState {
        analyzer: Analyzer::new(ocr, answerer, knowledge),
    });

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/analyze", post(analyze))
        .route("/api/cache/invalidate", post(invalidate_cache))
        .route("/api/cache/clear", post(clear_cache))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Accept one multipart image field and run the analysis pipeline on it.
async fn analyze(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, (StatusCode, String)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
    {
        let mime_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "image/png".to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        if data.is_empty() {
            continue;
        }

        let (analysis, cached) = state
            .analyzer
            .analyze(&data, &mime_type)
            .await
            .map_err(|e| (StatusCode::BAD_GATEWAY, format!("{e:#}")))?;

        return Ok(Json(AnalyzeResponse { cached, analysis }));
    }

    Err((StatusCode::BAD_REQUEST, "missing image field".to_string()))
}

async fn invalidate_cache(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InvalidateRequest>,
) -> Json<InvalidateResponse> {
    let removed = state.analyzer.invalidate(&request.content_hash).await;
    Json(InvalidateResponse { removed })
}

async fn clear_cache(State(state): State<Arc<AppState>>) -> Json<ClearCacheResponse> {
    let removed = state.analyzer.clear_cache().await;
    Json(ClearCacheResponse { removed })
}
