//! 언어 모델 모듈 - Ollama 텍스트 생성
//!
//! `POST {base}/api/generate` (stream=false) 로 프롬프트를 보내고 생성된 텍스트를 받습니다.
//! 호출은 요청 단위 타임아웃으로 제한되며, 재시도는 하지 않습니다.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// 생성 에러
#[derive(Debug, Error)]
pub enum GenerationError {
    /// 잘못된 엔드포인트
    #[error("invalid language model endpoint: {0}")]
    InvalidEndpoint(String),

    /// 서비스 연결 실패
    #[error("language model unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// 타임아웃 초과
    #[error("language model timed out after {0:?}")]
    Timeout(Duration),

    /// 2xx가 아닌 응답
    #[error("language model returned HTTP {status}: {snippet}")]
    HttpStatus {
        status: reqwest::StatusCode,
        snippet: String,
    },

    /// 응답 형식 오류
    #[error("malformed language model output: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, GenerationError>;

// ============================================================================
// Prompt
// ============================================================================

/// 모델에 전달할 프롬프트 (시스템 프롬프트 + 본문)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: Option<String>,
    pub text: String,
}

impl Prompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            system: None,
            text: text.into(),
        }
    }

    pub fn with_system(system: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            text: text.into(),
        }
    }
}

// ============================================================================
// LanguageModel Trait
// ============================================================================

/// 언어 모델 트레이트
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// 프롬프트로 텍스트 생성
    async fn generate(&self, prompt: &Prompt) -> Result<String>;

    /// 모델 이름
    fn model(&self) -> &str;
}

// ============================================================================
// Ollama LLM
// ============================================================================

/// 기본 생성 모델
pub const DEFAULT_MODEL: &str = "gemma3:4b";

/// 기본 호출 타임아웃
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Ollama 모델 설정
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl LlmConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            temperature: 0.0,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Ollama 생성 클라이언트
pub struct OllamaLlm {
    client: reqwest::Client,
    cfg: LlmConfig,
    url_generate: String,
    url_tags: String,
}

impl OllamaLlm {
    /// 설정으로 생성
    pub fn new(cfg: LlmConfig) -> Result<Self> {
        let endpoint = cfg.base_url.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(GenerationError::InvalidEndpoint(cfg.base_url.clone()));
        }

        let client = reqwest::Client::builder().timeout(cfg.timeout).build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        Ok(Self {
            client,
            url_generate: format!("{}/api/generate", base),
            url_tags: format!("{}/api/tags", base),
            cfg,
        })
    }

    /// Ollama 서버 접근 가능 여부
    pub async fn health_check(&self) -> bool {
        match self.client.get(&self.url_tags).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!("Ollama health check failed: {}", e);
                false
            }
        }
    }

    async fn request(&self, prompt: &Prompt) -> Result<String> {
        let body = GenerateRequest {
            model: &self.cfg.model,
            prompt: &prompt.text,
            system: prompt.system.as_deref(),
            stream: false,
            options: GenerateOptions {
                temperature: self.cfg.temperature,
            },
        };

        tracing::debug!("POST {}", self.url_generate);
        let resp = self
            .client
            .post(&self.url_generate)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(GenerationError::HttpStatus {
                status,
                snippet: text.chars().take(240).collect(),
            });
        }

        let out: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| GenerationError::Decode(format!("{e}; ensure `stream=false` is used")))?;

        Ok(out.response)
    }

    fn map_transport(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout(self.cfg.timeout)
        } else {
            GenerationError::Transport(err)
        }
    }
}

#[async_trait]
impl LanguageModel for OllamaLlm {
    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        match tokio::time::timeout(self.cfg.timeout, self.request(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(self.cfg.timeout)),
        }
    }

    fn model(&self) -> &str {
        &self.cfg.model
    }
}

/// `/api/generate` 요청 본문 (non-streaming)
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

/// `/api/generate` 응답 (생성 텍스트는 `response`)
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_endpoint() {
        let result = OllamaLlm::new(LlmConfig::new("ftp://localhost", DEFAULT_MODEL));
        assert!(matches!(result, Err(GenerationError::InvalidEndpoint(_))));
    }

    #[test]
    fn test_urls() {
        let llm = OllamaLlm::new(LlmConfig::new("http://localhost:11434/", "llama3")).unwrap();
        assert_eq!(llm.url_generate, "http://localhost:11434/api/generate");
        assert_eq!(llm.url_tags, "http://localhost:11434/api/tags");
        assert_eq!(llm.model(), "llama3");
    }

    #[test]
    fn test_request_body_omits_missing_system() {
        let body = GenerateRequest {
            model: "m",
            prompt: "hi",
            system: None,
            stream: false,
            options: GenerateOptions { temperature: 0.0 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["temperature"], 0.0);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_generation_error() {
        let mut cfg = LlmConfig::new("http://127.0.0.1:9", DEFAULT_MODEL);
        cfg.timeout = Duration::from_secs(2);
        let llm = OllamaLlm::new(cfg).unwrap();

        let result = llm.generate(&Prompt::new("hello")).await;
        assert!(matches!(
            result,
            Err(GenerationError::Transport(_)) | Err(GenerationError::Timeout(_))
        ));
    }
}
