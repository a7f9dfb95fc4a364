//! OpenAI 호환 HTTP API
//!
//! 조립이 끝난 합성기를 공유 상태로 받아 라우터를 구성합니다.
//! Ctrl+C에서 정상 종료합니다.

pub mod error;
pub mod routes;
pub mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

use crate::composer::AnswerComposer;

/// 핸들러 공유 상태
pub struct AppState {
    pub composer: Arc<dyn AnswerComposer>,
    /// `/v1/models`에 노출하고 요청에 모델이 없을 때 쓰는 이름
    pub model: String,
}

impl AppState {
    pub fn new(composer: Arc<dyn AnswerComposer>, model: impl Into<String>) -> Self {
        Self {
            composer,
            model: model.into(),
        }
    }
}

/// 라우터 구성
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/models", get(routes::list_models))
        .route("/v1/chat/completions", post(routes::chat_completions))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 주소에 바인드하고 종료 신호까지 서비스
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        // 신호를 받을 수 없으면 종료하지 않고 계속 서비스
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

// ============================================================================
// Tests
// ============================================================================
