//! OpenAI 호환 요청/응답 타입

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 모델 제공자 표기
pub const OWNED_BY: &str = "ollama";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// `POST /v1/chat/completions` 요청 (알 수 없는 필드는 무시)
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: ChatMessage,
    pub finish_reason: String,
}

/// 토큰 사용량 (집계하지 않으므로 항상 0)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

impl ChatCompletionResponse {
    /// 답변 하나를 담은 응답
    pub fn single(model: impl Into<String>, answer: impl Into<String>, at: DateTime<Utc>) -> Self {
        let created = at.timestamp();
        Self {
            id: format!("chatcmpl-{}", created),
            object: "chat.completion".to_string(),
            created,
            model: model.into(),
            choices: vec![Choice {
                index: 0,
                message: ChatMessage::assistant(answer),
                finish_reason: "stop".to_string(),
            }],
            usage: Usage::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCard {
    pub id: String,
    pub object: String,
    pub owned_by: String,
}

/// `GET /v1/models` 응답
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelCard>,
}

impl ModelList {
    pub fn single(model: impl Into<String>) -> Self {
        Self {
            object: "list".to_string(),
            data: vec![ModelCard {
                id: model.into(),
                object: "model".to_string(),
                owned_by: OWNED_BY.to_string(),
            }],
        }
    }
}
