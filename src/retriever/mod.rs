//! 검색기 - 질의 임베딩 후 top-k 청크 조회
//!
//! 인덱스가 비어 있거나 결과가 없으면 빈 목록을 돌려줍니다 (에러 아님).

use std::sync::Arc;

use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::knowledge::{ScoredChunk, VectorStore};

/// 기본 검색 개수
pub const DEFAULT_TOP_K: usize = 3;

/// 벡터 검색기
#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_top_k(store, embedder, DEFAULT_TOP_K)
    }

    pub fn with_top_k(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// 질의와 가장 유사한 청크 (유사도 내림차순)
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        let embedding = self.embedder.embed(query).await?;
        let results = self.store.query(&embedding, self.top_k).await?;

        tracing::info!("Retrieved {} chunks for query: {:?}", results.len(), query);
        for result in &results {
            tracing::debug!("  [{:.4}] {}", result.similarity, result.chunk.source);
        }

        Ok(results)
    }
}

// ============================================================================
// Tests
// ============================================================================
