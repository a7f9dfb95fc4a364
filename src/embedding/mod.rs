//! 임베딩 모듈 - Ollama API를 통한 텍스트 벡터화
//!
//! 텍스트를 벡터로 변환하는 임베딩 프로바이더입니다.
//! 인제스트와 질의 경로가 모두 같은 프로바이더를 사용해야 합니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = OllamaEmbedding::new("http://localhost:11434", "all-minilm", 384)?;
//! let embedding = embedder.embed("Hello, world!").await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// 임베딩 에러
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// 잘못된 엔드포인트 (비어있거나 http/https 아님)
    #[error("invalid embedding endpoint: {0}")]
    InvalidEndpoint(String),

    /// 잘못된 차원 설정
    #[error("invalid embedding dimension: {0}")]
    InvalidDimension(usize),

    /// 전송 에러
    #[error("embedding request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// 2xx가 아닌 응답
    #[error("embedding service returned HTTP {status}: {snippet}")]
    HttpStatus {
        status: reqwest::StatusCode,
        snippet: String,
    },

    /// 응답 파싱 실패 또는 차원 불일치
    #[error("failed to decode embedding response: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, EmbeddingError>;

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 프로바이더 트레이트
///
/// 같은 입력에 대해 항상 같은 벡터를 반환해야 합니다.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 단일 텍스트 임베딩
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// 배치 임베딩 (기본 구현: 순차 호출)
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// 임베딩 차원 수
    fn dimension(&self) -> usize;

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

// ============================================================================
// Ollama Embedding
// ============================================================================

/// 기본 임베딩 모델 (sentence-transformers all-MiniLM-L6-v2)
pub const DEFAULT_EMBED_MODEL: &str = "all-minilm";

/// 기본 임베딩 차원 (all-minilm)
pub const DEFAULT_DIMENSION: usize = 384;

/// 전송 실패/5xx 시 최대 재시도 횟수
const MAX_RETRIES: u32 = 3;
/// 재시도 시 초기 백오프 (ms)
const INITIAL_BACKOFF_MS: u64 = 500;

/// Ollama 임베딩 구현체
///
/// `POST {base}/api/embeddings` 를 호출합니다.
#[derive(Debug, Clone)]
pub struct OllamaEmbedding {
    client: reqwest::Client,
    url: String,
    model: String,
    dimension: usize,
}

impl OllamaEmbedding {
    /// 새 Ollama 임베딩 인스턴스 생성
    ///
    /// # Arguments
    /// * `base_url` - Ollama 서버 주소 (예: `http://localhost:11434`)
    /// * `model` - 임베딩 모델 이름
    /// * `dimension` - 모델 출력 차원
    pub fn new(base_url: &str, model: impl Into<String>, dimension: usize) -> Result<Self> {
        let base = base_url.trim();
        if base.is_empty() || !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(EmbeddingError::InvalidEndpoint(base_url.to_string()));
        }

        if dimension == 0 {
            return Err(EmbeddingError::InvalidDimension(dimension));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            url: format!("{}/api/embeddings", base.trim_end_matches('/')),
            model: model.into(),
            dimension,
        })
    }

    async fn request_once(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbedRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self.client.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::HttpStatus {
                status,
                snippet: body.chars().take(240).collect(),
            });
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Decode(e.to_string()))?;

        if body.embedding.len() != self.dimension {
            return Err(EmbeddingError::Decode(format!(
                "expected {} dimensions from {}, got {}",
                self.dimension,
                self.model,
                body.embedding.len()
            )));
        }

        Ok(body.embedding)
    }
}

/// Ollama 임베딩 요청 본문
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Ollama 임베딩 응답
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// 재시도할 가치가 있는 에러인지 판단
fn is_retryable(err: &EmbeddingError) -> bool {
    match err {
        EmbeddingError::Transport(e) => e.is_connect() || e.is_timeout(),
        EmbeddingError::HttpStatus { status, .. } => {
            status.is_server_error() || status.as_u16() == 429
        }
        _ => false,
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        // 빈 텍스트 처리
        if text.trim().is_empty() {
            return Ok(vec![0.0; self.dimension]);
        }

        let mut attempt = 0;
        loop {
            match self.request_once(text).await {
                Ok(embedding) => return Ok(embedding),
                Err(e) if attempt < MAX_RETRIES && is_retryable(&e) => {
                    let backoff = Duration::from_millis(INITIAL_BACKOFF_MS * 2u64.pow(attempt));
                    tracing::warn!(
                        "Embedding request failed ({}), retrying in {:?} (attempt {}/{})",
                        e,
                        backoff,
                        attempt + 1,
                        MAX_RETRIES
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());

        for (i, text) in texts.iter().enumerate() {
            tracing::debug!("Embedding batch {}/{}", i + 1, texts.len());
            results.push(self.embed(text).await?);
        }

        Ok(results)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Tests
// ============================================================================
