//! Knowledge 모듈 - 벡터 인덱스
//!
//! - Vector: 인덱스 트레이트, 청크/엔트리 타입, 코사인 유사도
//! - Lance: LanceDB 기반 영구 인덱스 (서비스 기본값)
//! - Memory: 인메모리 정확 검색 인덱스

mod lance;
mod memory;
mod vector;

// Re-exports
pub use lance::{LanceVectorStore, PERSIST_DIR, TABLE_NAME};
pub use memory::MemoryVectorStore;
pub use vector::{
    cosine_similarity, rank_results, Chunk, ChunkSource, IndexError, ScoredChunk, VectorEntry,
    VectorStore,
};
