//! 핸들러
//!
//! - `GET /v1/models`
//! - `POST /v1/chat/completions`

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::Utc;

use crate::error::{RagError, Result};

use super::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ModelList};
use super::AppState;

/// 설정된 기본 모델 하나를 나열
pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelList> {
    Json(ModelList::single(state.model.clone()))
}

/// 마지막 사용자 메시지에 대한 답변
///
/// 마지막 메시지만 질의로 사용합니다. 이전 메시지는 무시되며,
/// 대화 기록은 서버 쪽 합성기가 관리합니다.
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ChatCompletionRequest>, JsonRejection>,
) -> Result<Json<ChatCompletionResponse>> {
    let Json(request) = payload?;
    let query = last_user_message(&request.messages)?;

    tracing::info!("Chat completion request: {:?}", query);
    let answer = state.composer.compose(query).await?;
    tracing::debug!("Answer route: {:?}", answer.route);

    // 필드가 없을 때만 기본값, 있으면 빈 문자열도 그대로 반환
    let model = request.model.unwrap_or_else(|| state.model.clone());

    Ok(Json(ChatCompletionResponse::single(
        model,
        answer.text,
        Utc::now(),
    )))
}

/// 마지막 메시지가 `user`이면 그 내용
fn last_user_message(messages: &[ChatMessage]) -> Result<&str> {
    let last = messages
        .last()
        .ok_or_else(|| RagError::invalid_request("messages must not be empty"))?;

    if last.role != "user" {
        return Err(RagError::invalid_request(format!(
            "last message must have role 'user', got '{}'",
            last.role
        )));
    }

    Ok(&last.content)
}
