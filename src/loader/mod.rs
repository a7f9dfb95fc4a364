//! 문서 로더 모듈
//!
//! 마크다운 가이드 1개(필수)와 리소스 디렉토리의 PDF 파일들을 읽어
//! 청크 목록을 만듭니다.
//! - 마크다운: 전체 내용이 청크 1개
//! - PDF: 페이지당 청크 1개 (페이지 번호 유지)
//!
//! 읽기 외의 부작용은 없습니다.

pub mod pdf;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use walkdir::WalkDir;

use crate::knowledge::Chunk;

/// 기본 마크다운 가이드 경로 (컨테이너 루트에 마운트)
pub const DEFAULT_GUIDE_PATH: &str = "/docker_best_practices.md";

/// 기본 PDF 리소스 디렉토리
pub const DEFAULT_RESOURCES_DIR: &str = "/resources";

// ============================================================================
// Errors
// ============================================================================

/// 로딩 에러
#[derive(Debug, Error)]
pub enum LoadError {
    /// 필수 가이드 문서가 없거나 읽을 수 없음
    #[error("required guide document {path:?} is missing or unreadable: {source}")]
    MissingGuide {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 파일 읽기 실패
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// PDF 파싱 실패
    #[error("failed to extract text from PDF {path:?}: {message}")]
    Pdf { path: PathBuf, message: String },

    /// 추출 태스크 실패
    #[error("PDF extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

// ============================================================================
// DocumentSource Trait
// ============================================================================

/// 인제스트할 청크를 제공하는 소스
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// 모든 문서를 읽어 청크 목록 반환
    async fn load_all(&self) -> Result<Vec<Chunk>, LoadError>;
}

// ============================================================================
// DocumentLoader
// ============================================================================

/// 파일 시스템 문서 로더
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    guide_path: PathBuf,
    resources_dir: PathBuf,
}

impl DocumentLoader {
    pub fn new(guide_path: impl Into<PathBuf>, resources_dir: impl Into<PathBuf>) -> Self {
        Self {
            guide_path: guide_path.into(),
            resources_dir: resources_dir.into(),
        }
    }

    pub fn guide_path(&self) -> &Path {
        &self.guide_path
    }

    pub fn resources_dir(&self) -> &Path {
        &self.resources_dir
    }

    /// 리소스 디렉토리의 PDF 파일 목록 (확장자 대소문자 무시, 이름순)
    ///
    /// 하위 디렉토리는 보지 않습니다. 디렉토리가 없으면 빈 목록.
    pub fn discover_pdfs(&self) -> Vec<PathBuf> {
        if !self.resources_dir.is_dir() {
            tracing::debug!("Resource directory {:?} not found; no PDFs", self.resources_dir);
            return vec![];
        }

        WalkDir::new(&self.resources_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable resource entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && is_pdf(entry.path()))
            .map(|entry| entry.into_path())
            .collect()
    }

    /// 마크다운 가이드 읽기 (청크 1개)
    async fn load_guide(&self) -> Result<Chunk, LoadError> {
        let text = tokio::fs::read_to_string(&self.guide_path)
            .await
            .map_err(|source| LoadError::MissingGuide {
                path: self.guide_path.clone(),
                source,
            })?;

        Ok(Chunk::new(text, self.guide_path.display().to_string(), None))
    }

    /// PDF 하나를 페이지별 청크로 변환
    async fn load_pdf(path: PathBuf) -> Result<Vec<Chunk>, LoadError> {
        // PDF 추출은 CPU 바운드이므로 spawn_blocking 사용
        let task_path = path.clone();
        let pages = tokio::task::spawn_blocking(move || pdf::extract_pages(&task_path)).await??;

        let source = path.display().to_string();
        Ok(pages
            .into_iter()
            .map(|(page, text)| Chunk::new(text, source.clone(), Some(page)))
            .collect())
    }
}

#[async_trait]
impl DocumentSource for DocumentLoader {
    async fn load_all(&self) -> Result<Vec<Chunk>, LoadError> {
        let mut chunks = vec![self.load_guide().await?];

        for path in self.discover_pdfs() {
            let pages = Self::load_pdf(path.clone()).await?;
            tracing::info!("Loaded {} pages from {:?}", pages.len(), path);
            chunks.extend(pages);
        }

        Ok(chunks)
    }
}

/// 확장자가 pdf인지 (대소문자 무시)
fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

// ============================================================================
// Tests
// ============================================================================
