//! 파이프라인 조립
//!
//! 프로세스 전체에서 공유하는 구성요소를 한 번 만듭니다:
//! 인덱스 열기 → 필요하면 인제스트 → 언어 모델, 합성기 준비.
//! 실패는 모두 시작 단계에서 드러나며 서버는 리슨을 시작하지 않습니다.

use std::path::Path;
use std::sync::Arc;

use crate::composer::{build_composer, AnswerComposer, Strategy};
use crate::config::AppConfig;
use crate::embedding::{EmbeddingProvider, OllamaEmbedding};
use crate::error::Result;
use crate::ingest::{ensure_ingested, IngestReport};
use crate::knowledge::{LanceVectorStore, MemoryVectorStore, VectorStore, PERSIST_DIR};
use crate::llm::{LanguageModel, LlmConfig, OllamaLlm};
use crate::loader::{DocumentLoader, DocumentSource};
use crate::retriever::Retriever;

/// 조립된 파이프라인
pub struct Pipeline {
    pub store: Arc<dyn VectorStore>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub llm: Arc<dyn LanguageModel>,
    pub composer: Arc<dyn AnswerComposer>,
    pub ingest: IngestReport,
}

impl Pipeline {
    /// `vectordb/` 영구 인덱스로 시작
    pub async fn bootstrap(config: &AppConfig, strategy: Strategy) -> Result<Self> {
        let store = Arc::new(LanceVectorStore::open(Path::new(PERSIST_DIR)).await?);
        Self::with_store(config, strategy, store).await
    }

    /// 인메모리 인덱스로 시작 (매번 인제스트)
    pub async fn bootstrap_ephemeral(config: &AppConfig, strategy: Strategy) -> Result<Self> {
        Self::with_store(config, strategy, Arc::new(MemoryVectorStore::new())).await
    }

    async fn with_store(
        config: &AppConfig,
        strategy: Strategy,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let embedder = Arc::new(OllamaEmbedding::new(
            config.ollama_base(),
            config.embed_model.clone(),
            config.embed_dimension,
        )?);

        let mut llm_config = LlmConfig::new(config.ollama_base(), config.default_model.clone());
        llm_config.timeout = config.llm_timeout;
        let llm = Arc::new(OllamaLlm::new(llm_config)?);

        let loader = DocumentLoader::new(&config.guide_path, &config.resources_dir);

        Self::assemble(store, embedder, llm, &loader, strategy).await
    }

    /// 주어진 구성요소로 조립
    pub async fn assemble(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LanguageModel>,
        source: &dyn DocumentSource,
        strategy: Strategy,
    ) -> Result<Self> {
        tracing::info!(
            "Embedding model: {} ({} dims), generation model: {}",
            embedder.name(),
            embedder.dimension(),
            llm.model()
        );

        let ingest = ensure_ingested(store.as_ref(), embedder.as_ref(), source).await?;

        let retriever = Retriever::new(store.clone(), embedder.clone());
        let composer = build_composer(strategy, retriever, llm.clone());

        Ok(Self {
            store,
            embedder,
            llm,
            composer,
            ingest,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
