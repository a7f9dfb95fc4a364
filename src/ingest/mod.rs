//! 인제스트 컨트롤러
//!
//! 시작 시 인덱스가 비어 있으면 한 번만 문서를 읽고, 임베딩하고, 저장합니다.
//! 인덱스에 데이터가 있으면 원본 문서가 바뀌어도 다시 인제스트하지 않습니다.
//!
//! count 확인과 쓰기 사이에는 잠금이 없습니다. 여러 프로세스가 같은
//! 인덱스 디렉토리로 동시에 시작하는 경우는 지원하지 않습니다.

use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::knowledge::VectorStore;
use crate::loader::DocumentSource;

/// 인제스트 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// 인덱스가 이미 채워져 있어 건너뜀
    pub skipped: bool,
    /// 로더가 돌려준 청크 수
    pub loaded: usize,
    /// 인제스트 후 인덱스 엔트리 수
    pub stored: usize,
}

/// 인덱스가 비어 있으면 문서를 인제스트
pub async fn ensure_ingested(
    store: &dyn VectorStore,
    embedder: &dyn EmbeddingProvider,
    source: &dyn DocumentSource,
) -> Result<IngestReport> {
    let existing = store.count().await?;
    if existing > 0 {
        tracing::info!("Index already holds {} chunks; skipping ingestion", existing);
        return Ok(IngestReport {
            skipped: true,
            loaded: 0,
            stored: existing,
        });
    }

    tracing::info!("Index empty; ingesting…");
    let chunks = source.load_all().await?;
    let loaded = chunks.len();

    store.add(&chunks, embedder).await?;
    store.persist().await?;

    let stored = store.count().await?;
    tracing::info!("Stored {} chunks", stored);

    Ok(IngestReport {
        skipped: false,
        loaded,
        stored,
    })
}

// ============================================================================
// Tests
// ============================================================================
