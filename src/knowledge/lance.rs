//! LanceDB Vector Store - 영구 벡터 인덱스
//!
//! `vectordb/` 디렉토리 안의 `chunks` 테이블에 엔트리를 저장합니다.
//! 코사인 거리로 검색하며, 각 쓰기는 LanceDB 커밋 단위로 디스크에 반영됩니다.
//! ref: https://lancedb.github.io/lancedb/

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_array::{
    Array, FixedSizeListArray, Float32Array, Int32Array, Int64Array, RecordBatch,
    RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::connection::Connection;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::DistanceType;

use super::vector::{rank_results, Chunk, IndexError, ScoredChunk, VectorEntry, VectorStore};

/// 영구 인덱스 디렉토리 (작업 디렉토리 기준)
pub const PERSIST_DIR: &str = "vectordb";

/// 벡터 테이블 이름
pub const TABLE_NAME: &str = "chunks";

// ============================================================================
// LanceVectorStore
// ============================================================================

/// LanceDB 벡터 저장소 구현
pub struct LanceVectorStore {
    db: Connection,
    path: PathBuf,
}

impl LanceVectorStore {
    /// LanceDB 저장소 열기 (없으면 생성)
    ///
    /// 디렉토리를 만들 수 없거나 테이블 목록을 읽을 수 없으면 `IndexError::Unavailable`.
    pub async fn open(path: &Path) -> Result<Self, IndexError> {
        let unavailable = |message: String| IndexError::Unavailable {
            path: path.to_path_buf(),
            message,
        };

        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| unavailable(format!("failed to create directory: {e}")))?;

        let path_str = path
            .to_str()
            .ok_or_else(|| unavailable("invalid path encoding".to_string()))?;

        let db = lancedb::connect(path_str)
            .execute()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        // 열자마자 읽기 가능 여부 확인
        db.table_names()
            .execute()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        tracing::debug!("Opened vector index at {:?}", path);
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    /// 인덱스 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 벡터 테이블 스키마 생성
    fn create_schema(dimension: i32) -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("text", DataType::Utf8, false),
            Field::new("source", DataType::Utf8, false),
            Field::new("page", DataType::Int32, true),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    dimension,
                ),
                false,
            ),
        ])
    }

    /// 엔트리들을 Arrow RecordBatch로 변환
    fn entries_to_batch(entries: &[VectorEntry]) -> Result<RecordBatch, IndexError> {
        let dimension = entries
            .first()
            .map(|e| e.embedding.len())
            .ok_or_else(|| IndexError::backend("cannot create batch from empty entries"))?;

        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dimension) {
            return Err(IndexError::DimensionMismatch {
                expected: dimension,
                actual: bad.embedding.len(),
            });
        }

        let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
        let texts: Vec<&str> = entries.iter().map(|e| e.chunk.text.as_str()).collect();
        let sources: Vec<&str> = entries.iter().map(|e| e.chunk.source.path.as_str()).collect();
        let pages: Vec<Option<i32>> = entries
            .iter()
            .map(|e| e.chunk.source.page.map(|p| p as i32))
            .collect();

        // 임베딩을 FixedSizeList로 변환
        let embeddings_flat: Vec<f32> = entries
            .iter()
            .flat_map(|e| e.embedding.iter().copied())
            .collect();

        let values = Float32Array::from(embeddings_flat);
        let field = Arc::new(Field::new("item", DataType::Float32, true));
        let embeddings_list = FixedSizeListArray::try_new(
            field,
            dimension as i32,
            Arc::new(values) as Arc<dyn Array>,
            None,
        )
        .map_err(IndexError::backend)?;

        RecordBatch::try_new(
            Arc::new(Self::create_schema(dimension as i32)),
            vec![
                Arc::new(Int64Array::from(ids)),
                Arc::new(StringArray::from(texts)),
                Arc::new(StringArray::from(sources)),
                Arc::new(Int32Array::from(pages)),
                Arc::new(embeddings_list),
            ],
        )
        .map_err(IndexError::backend)
    }

    /// 검색 결과 배치를 ScoredChunk로 변환
    fn batch_to_results(batch: &RecordBatch) -> Result<Vec<ScoredChunk>, IndexError> {
        let missing = |name: &str| IndexError::Backend(format!("missing {} column", name));

        let ids = batch
            .column_by_name("id")
            .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
            .ok_or_else(|| missing("id"))?;
        let texts = batch
            .column_by_name("text")
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .ok_or_else(|| missing("text"))?;
        let sources = batch
            .column_by_name("source")
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .ok_or_else(|| missing("source"))?;
        let pages = batch
            .column_by_name("page")
            .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
            .ok_or_else(|| missing("page"))?;
        // _distance 컬럼 (LanceDB가 자동 추가)
        let distances = batch
            .column_by_name("_distance")
            .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
            .ok_or_else(|| missing("_distance"))?;

        Ok((0..batch.num_rows())
            .map(|i| {
                let page = (!pages.is_null(i)).then(|| pages.value(i) as u32);
                ScoredChunk {
                    id: ids.value(i),
                    chunk: Chunk::new(texts.value(i), sources.value(i), page),
                    // 코사인 거리 -> 코사인 유사도
                    similarity: 1.0 - distances.value(i),
                }
            })
            .collect())
    }

    /// 테이블 존재 여부 확인
    async fn table_exists(&self) -> Result<bool, IndexError> {
        let names = self
            .db
            .table_names()
            .execute()
            .await
            .map_err(IndexError::backend)?;
        Ok(names.iter().any(|n| n == TABLE_NAME))
    }

    async fn open_table(&self) -> Result<lancedb::table::Table, IndexError> {
        self.db
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(IndexError::backend)
    }

    /// 기존 테이블의 임베딩 차원
    async fn table_dimension(table: &lancedb::table::Table) -> Result<Option<usize>, IndexError> {
        let schema = table.schema().await.map_err(IndexError::backend)?;
        Ok(schema.field_with_name("embedding").ok().and_then(|f| {
            match f.data_type() {
                DataType::FixedSizeList(_, size) => Some(*size as usize),
                _ => None,
            }
        }))
    }
}

#[async_trait]
impl VectorStore for LanceVectorStore {
    async fn count(&self) -> Result<usize, IndexError> {
        if !self.table_exists().await? {
            return Ok(0);
        }

        let table = self.open_table().await?;
        table.count_rows(None).await.map_err(IndexError::backend)
    }

    async fn insert_batch(&self, entries: Vec<VectorEntry>) -> Result<usize, IndexError> {
        if entries.is_empty() {
            return Ok(0);
        }

        let batch = Self::entries_to_batch(&entries)?;
        let schema = batch.schema();
        let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);

        if self.table_exists().await? {
            // 기존 테이블에 추가
            let table = self.open_table().await?;
            if let Some(expected) = Self::table_dimension(&table).await? {
                let actual = entries[0].embedding.len();
                if expected != actual {
                    return Err(IndexError::DimensionMismatch { expected, actual });
                }
            }

            table
                .add(batches)
                .execute()
                .await
                .map_err(IndexError::backend)?;
        } else {
            // 새 테이블 생성
            self.db
                .create_table(TABLE_NAME, batches)
                .execute()
                .await
                .map_err(IndexError::backend)?;
        }

        Ok(entries.len())
    }

    async fn persist(&self) -> Result<(), IndexError> {
        // 쓰기는 이미 커밋됨. 새 핸들로 다시 열어 디스크 상태를 확인
        let count = self.count().await?;
        tracing::debug!("Vector index at {:?} holds {} entries", self.path, count);
        Ok(())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        if k == 0 || !self.table_exists().await? {
            return Ok(vec![]);
        }

        let table = self.open_table().await?;

        // k번째와 동점인 행이 잘리지 않도록 전체를 받아 id 순으로 다시 정렬
        let total = table.count_rows(None).await.map_err(IndexError::backend)?;

        let stream = table
            .vector_search(embedding.to_vec())
            .map_err(IndexError::backend)?
            .distance_type(DistanceType::Cosine)
            .limit(total.max(k))
            .execute()
            .await
            .map_err(IndexError::backend)?;

        let batches: Vec<RecordBatch> = stream.try_collect().await.map_err(IndexError::backend)?;

        let mut results = Vec::new();
        for batch in &batches {
            results.extend(Self::batch_to_results(batch)?);
        }

        Ok(rank_results(results, k))
    }
}

// ============================================================================
// Tests
// ============================================================================
