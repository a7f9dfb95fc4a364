//! 에러 타입
//!
//! 계층별 에러(로더, 인덱스, 임베딩, 생성)를 모아 `RagError` 하나로 노출합니다.
//! HTTP 매핑은 `server::error`에 있습니다.

use thiserror::Error;

pub use crate::embedding::EmbeddingError;
pub use crate::knowledge::IndexError;
pub use crate::llm::GenerationError;
pub use crate::loader::LoadError;

/// rag-app 최상위 에러
#[derive(Debug, Error)]
pub enum RagError {
    /// 소스 문서 로딩 실패 (시작 시 치명적)
    #[error(transparent)]
    Load(#[from] LoadError),

    /// 벡터 인덱스 에러
    #[error(transparent)]
    Index(#[from] IndexError),

    /// 임베딩 서비스 에러
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// 언어 모델 호출 실패
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// 잘못된 채팅 요청
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl RagError {
    /// 잘못된 요청 에러 생성
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}

pub type Result<T> = std::result::Result<T, RagError>;
