//! 인메모리 벡터 저장소 - 정확한 코사인 검색
//!
//! 테스트와 일회성(`ask --ephemeral`) 실행에 사용합니다. 프로세스 종료 시 사라집니다.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::vector::{
    cosine_similarity, rank_results, IndexError, ScoredChunk, VectorEntry, VectorStore,
};

/// 인메모리 벡터 저장소
#[derive(Debug, Default)]
pub struct MemoryVectorStore {
    entries: RwLock<Vec<VectorEntry>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn count(&self) -> Result<usize, IndexError> {
        Ok(self.entries.read().await.len())
    }

    async fn insert_batch(&self, batch: Vec<VectorEntry>) -> Result<usize, IndexError> {
        let mut entries = self.entries.write().await;

        if let (Some(existing), Some(new)) = (entries.first(), batch.first()) {
            if existing.embedding.len() != new.embedding.len() {
                return Err(IndexError::DimensionMismatch {
                    expected: existing.embedding.len(),
                    actual: new.embedding.len(),
                });
            }
        }

        let inserted = batch.len();
        entries.extend(batch);
        Ok(inserted)
    }

    async fn persist(&self) -> Result<(), IndexError> {
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        let entries = self.entries.read().await;

        let scored = entries
            .iter()
            .map(|e| ScoredChunk {
                id: e.id,
                chunk: e.chunk.clone(),
                similarity: cosine_similarity(&e.embedding, embedding),
            })
            .collect();

        Ok(rank_results(scored, k))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingProvider;
    use crate::knowledge::Chunk;
    use crate::testing::KeywordEmbedding;

    fn entry(id: i64, embedding: Vec<f32>) -> VectorEntry {
        VectorEntry {
            id,
            embedding,
            chunk: Chunk::new(format!("chunk {}", id), "guide.md", None),
        }
    }

    #[tokio::test]
    async fn test_count_and_query_order() {
        let store = MemoryVectorStore::new();
        assert_eq!(store.count().await.unwrap(), 0);

        store
            .insert_batch(vec![
                entry(0, vec![0.0, 1.0]),
                entry(1, vec![1.0, 0.0]),
                entry(2, vec![1.0, 1.0]),
            ])
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 3);

        let results = store.query(&[1.0, 0.0], 2).await.unwrap();
        let ids: Vec<i64> = results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(results[0].similarity >= results[1].similarity);
    }

    #[tokio::test]
    async fn test_empty_store_returns_nothing() {
        let store = MemoryVectorStore::new();
        let results = store.query(&[1.0, 0.0], 3).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let store = MemoryVectorStore::new();
        store.insert_batch(vec![entry(0, vec![1.0, 0.0])]).await.unwrap();

        let err = store
            .insert_batch(vec![entry(1, vec![1.0, 0.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[tokio::test]
    async fn test_add_assigns_sequential_ids() {
        let store = MemoryVectorStore::new();
        let embedder = KeywordEmbedding::new();

        let first = vec![Chunk::new("docker images", "guide.md", None)];
        let second = vec![
            Chunk::new("kubernetes pods", "a.pdf", Some(1)),
            Chunk::new("compose files", "a.pdf", Some(2)),
        ];

        assert_eq!(store.add(&first, &embedder).await.unwrap(), 1);
        assert_eq!(store.add(&second, &embedder).await.unwrap(), 2);
        assert_eq!(store.add(&[], &embedder).await.unwrap(), 0);

        let ids: Vec<i64> = store.entries.read().await.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_repeated_queries_are_stable() {
        let store = MemoryVectorStore::new();
        let embedder = KeywordEmbedding::new();
        let chunks = vec![
            Chunk::new("docker layer caching", "guide.md", None),
            Chunk::new("docker multi-stage builds", "a.pdf", Some(1)),
            Chunk::new("docker image size", "a.pdf", Some(2)),
            Chunk::new("unrelated gardening tips", "b.pdf", Some(1)),
        ];
        store.add(&chunks, &embedder).await.unwrap();

        let query = embedder.embed("docker image size").await.unwrap();
        let first = store.query(&query, 3).await.unwrap();
        let second = store.query(&query, 3).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0].chunk.text, "docker image size");
        for pair in first.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }
}
