//! rag-app - Ollama 기반 RAG 채팅 서비스
//!
//! 마크다운 가이드와 PDF 문서를 LanceDB 벡터 인덱스에 한 번 인제스트하고,
//! 검색 결과를 근거로 로컬 언어 모델이 답하도록 합니다.
//! OpenAI 호환 채팅 API로 노출합니다.

pub mod cli;
pub mod composer;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod knowledge;
pub mod llm;
pub mod loader;
pub mod pipeline;
pub mod retriever;
pub mod server;

#[cfg(test)]
mod testing;

// Re-exports
pub use composer::{build_composer, Answer, AnswerComposer, AnswerRoute, FallbackReason, Strategy};
pub use config::AppConfig;
pub use embedding::{EmbeddingProvider, OllamaEmbedding};
pub use error::{RagError, Result};
pub use ingest::{ensure_ingested, IngestReport};
pub use knowledge::{
    Chunk, ChunkSource, LanceVectorStore, MemoryVectorStore, ScoredChunk, VectorStore,
};
pub use llm::{LanguageModel, OllamaLlm};
pub use loader::{DocumentLoader, DocumentSource};
pub use pipeline::Pipeline;
pub use retriever::Retriever;
