//! Vector Store - 벡터 인덱스 트레이트 및 유틸리티
//!
//! 인덱스는 추가 전용(append-only)입니다. 엔트리 id는 삽입 순번이며,
//! 유사도가 같은 결과의 순서를 정하는 데 사용됩니다.

use std::cmp::Ordering;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::embedding::EmbeddingProvider;
use crate::error::RagError;

// ============================================================================
// Errors
// ============================================================================

/// 인덱스 에러
#[derive(Debug, Error)]
pub enum IndexError {
    /// 저장소를 열거나 읽을 수 없음 (시작 시 치명적)
    #[error("vector index unavailable at {path:?}: {message}")]
    Unavailable { path: PathBuf, message: String },

    /// 백엔드 연산 실패
    #[error("vector index backend error: {0}")]
    Backend(String),

    /// 기존 인덱스와 다른 차원의 벡터
    #[error("embedding dimension mismatch: index has {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl IndexError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

// ============================================================================
// Types
// ============================================================================

/// 청크 출처 메타데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSource {
    /// 원본 파일 경로
    pub path: String,
    /// PDF 페이지 번호 (1부터 시작)
    pub page: Option<u32>,
}

impl std::fmt::Display for ChunkSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.page {
            Some(page) => write!(f, "{} (page {})", self.path, page),
            None => write!(f, "{}", self.path),
        }
    }
}

/// 문서 청크 (인제스트 후 불변)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source: ChunkSource,
}

impl Chunk {
    pub fn new(text: impl Into<String>, path: impl Into<String>, page: Option<u32>) -> Self {
        Self {
            text: text.into(),
            source: ChunkSource {
                path: path.into(),
                page,
            },
        }
    }
}

/// 벡터 엔트리 (저장용)
#[derive(Debug, Clone)]
pub struct VectorEntry {
    /// 삽입 순번
    pub id: i64,
    pub embedding: Vec<f32>,
    pub chunk: Chunk,
}

/// 검색 결과
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub id: i64,
    pub chunk: Chunk,
    /// 코사인 유사도 (-1.0 ~ 1.0)
    pub similarity: f32,
}

// ============================================================================
// VectorStore Trait
// ============================================================================

/// VectorStore 트레이트 (async)
///
/// `query`는 동시 읽기에 안전해야 합니다. `insert_batch`/`persist`는
/// 트래픽 시작 전에만 호출됩니다.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// 저장된 엔트리 수 (전체 스캔 없이)
    async fn count(&self) -> Result<usize, IndexError>;

    /// 임베딩이 끝난 엔트리 배치 삽입
    async fn insert_batch(&self, entries: Vec<VectorEntry>) -> Result<usize, IndexError>;

    /// 영구 저장소에 반영
    async fn persist(&self) -> Result<(), IndexError>;

    /// k-최근접 검색 (유사도 내림차순, 동점은 삽입 순)
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredChunk>, IndexError>;

    /// 청크를 임베딩하여 추가
    ///
    /// id는 현재 개수부터 이어서 부여합니다 (삭제가 없으므로 count == 다음 id).
    async fn add(
        &self,
        chunks: &[Chunk],
        embedder: &dyn EmbeddingProvider,
    ) -> Result<usize, RagError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        let start = self.count().await? as i64;
        let entries = chunks
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (chunk, embedding))| VectorEntry {
                id: start + i as i64,
                embedding,
                chunk: chunk.clone(),
            })
            .collect();

        Ok(self.insert_batch(entries).await?)
    }
}

// ============================================================================
// Utility Functions
// ============================================================================

/// 코사인 유사도 계산
///
/// 결과는 -1.0 ~ 1.0 범위입니다. 길이가 다르거나 영벡터면 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// 유사도 내림차순, 동점이면 id 오름차순으로 정렬 후 k개로 자름
pub fn rank_results(mut results: Vec<ScoredChunk>, k: usize) -> Vec<ScoredChunk> {
    results.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
            .then(a.id.cmp(&b.id))
    });
    results.truncate(k);
    results
}

// ============================================================================
// Tests
// ============================================================================
