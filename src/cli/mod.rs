//! CLI 모듈
//!
//! rag-app 명령어 정의 및 구현

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::composer::{AnswerRoute, Strategy};
use crate::config::AppConfig;
use crate::embedding::OllamaEmbedding;
use crate::ingest::ensure_ingested;
use crate::knowledge::{LanceVectorStore, VectorStore, PERSIST_DIR};
use crate::llm::{LlmConfig, OllamaLlm};
use crate::loader::DocumentLoader;
use crate::pipeline::Pipeline;
use crate::retriever::{Retriever, DEFAULT_TOP_K};
use crate::server::{self, AppState};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "rag-app")]
#[command(version, about = "Ollama 기반 RAG 채팅 서비스 (OpenAI 호환 API)", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 인덱스 준비 후 HTTP API 서비스
    Serve {
        /// 리슨 주소 (기본: API_ADDRESS)
        #[arg(short, long)]
        addr: Option<SocketAddr>,

        /// 답변 전략 (기본: RAG_STRATEGY)
        #[arg(short, long)]
        strategy: Option<Strategy>,
    },

    /// 인덱스가 비어 있으면 문서 인제스트
    Ingest,

    /// 질문 하나에 답변
    Ask {
        /// 질문
        question: String,

        /// 답변 전략 (기본: RAG_STRATEGY)
        #[arg(short, long)]
        strategy: Option<Strategy>,

        /// vectordb/ 대신 인메모리 인덱스 사용
        #[arg(long)]
        ephemeral: bool,
    },

    /// 인덱스 검색 (생성 없이)
    Search {
        /// 검색 쿼리
        query: String,

        /// 결과 개수
        #[arg(short, long, default_value_t = DEFAULT_TOP_K)]
        limit: usize,
    },

    /// 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::from_env().context("설정 읽기 실패")?;

    match cli.command {
        Commands::Serve { addr, strategy } => cmd_serve(&config, addr, strategy).await,
        Commands::Ingest => cmd_ingest(&config).await,
        Commands::Ask {
            question,
            strategy,
            ephemeral,
        } => cmd_ask(&config, &question, strategy, ephemeral).await,
        Commands::Search { query, limit } => cmd_search(&config, &query, limit).await,
        Commands::Status => cmd_status(&config).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 서비스 명령어 (serve)
///
/// 인덱스 준비가 끝난 뒤에만 리슨을 시작합니다.
async fn cmd_serve(
    config: &AppConfig,
    addr: Option<SocketAddr>,
    strategy: Option<Strategy>,
) -> Result<()> {
    let strategy = strategy.unwrap_or(config.strategy);
    let pipeline = Pipeline::bootstrap(config, strategy)
        .await
        .context("파이프라인 초기화 실패")?;

    let state = Arc::new(AppState::new(
        pipeline.composer,
        config.default_model.clone(),
    ));

    server::serve(addr.unwrap_or(config.api_address), state)
        .await
        .context("HTTP 서버 실행 실패")
}

/// 인제스트 명령어 (ingest)
async fn cmd_ingest(config: &AppConfig) -> Result<()> {
    let store = open_index().await?;
    let embedder = build_embedder(config)?;
    let loader = DocumentLoader::new(&config.guide_path, &config.resources_dir);

    println!("[*] 가이드: {}", loader.guide_path().display());
    println!("[*] PDF 디렉토리: {}", loader.resources_dir().display());

    let report = ensure_ingested(&store, &embedder, &loader)
        .await
        .context("인제스트 실패")?;

    if report.skipped {
        println!("[OK] 인덱스에 이미 {} 청크가 있어 건너뜀", report.stored);
    } else {
        println!(
            "[OK] {} 청크 로드, 인덱스에 {} 청크 저장",
            report.loaded, report.stored
        );
    }

    Ok(())
}

/// 질문 명령어 (ask)
async fn cmd_ask(
    config: &AppConfig,
    question: &str,
    strategy: Option<Strategy>,
    ephemeral: bool,
) -> Result<()> {
    let strategy = strategy.unwrap_or(config.strategy);
    let pipeline = if ephemeral {
        Pipeline::bootstrap_ephemeral(config, strategy).await
    } else {
        Pipeline::bootstrap(config, strategy).await
    }
    .context("파이프라인 초기화 실패")?;

    let answer = pipeline
        .composer
        .compose(question)
        .await
        .context("답변 생성 실패")?;

    let route = match answer.route {
        AnswerRoute::Grounded => "문서 기반",
        AnswerRoute::Conversational => "대화형",
        AnswerRoute::Fallback(_) => "일반 답변",
    };
    println!("[{}] {}", route, answer.text);

    Ok(())
}

/// 검색 명령어 (search)
async fn cmd_search(config: &AppConfig, query: &str, limit: usize) -> Result<()> {
    let store = Arc::new(open_index().await?);
    let embedder = Arc::new(build_embedder(config)?);
    let retriever = Retriever::with_top_k(store, embedder, limit);

    println!("[*] 검색 중: \"{}\"", query);
    let results = retriever.retrieve(query).await.context("검색 실패")?;

    if results.is_empty() {
        println!("\n[!] 검색 결과가 없습니다.");
        return Ok(());
    }

    println!("\n[OK] 검색 결과 ({} 건):\n", results.len());
    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. [유사도: {:.4}] #{} {}",
            i + 1,
            result.similarity,
            result.id,
            result.chunk.source
        );
        println!("   {}", truncate_text(&result.chunk.text, 200));
        println!();
    }

    Ok(())
}

/// 상태 명령어 (status)
async fn cmd_status(config: &AppConfig) -> Result<()> {
    println!("rag-app v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("[*] 생성 모델: {}", config.default_model);
    println!(
        "[*] 임베딩 모델: {} ({}차원)",
        config.embed_model, config.embed_dimension
    );
    println!("[*] 전략: {}", config.strategy);
    println!("[*] Ollama: {}", config.ollama_base());

    match open_index().await {
        Ok(store) => match store.count().await {
            Ok(count) => println!("[OK] 벡터 인덱스: {} 청크 ({})", count, PERSIST_DIR),
            Err(e) => println!("[!] 인덱스 조회 실패: {}", e),
        },
        Err(e) => println!("[!] 인덱스 열기 실패: {:#}", e),
    }

    let mut llm_config = LlmConfig::new(config.ollama_base(), config.default_model.clone());
    llm_config.timeout = config.llm_timeout;
    match OllamaLlm::new(llm_config) {
        Ok(llm) if llm.health_check().await => println!("[OK] Ollama 연결됨"),
        Ok(_) => println!("[!] Ollama에 연결할 수 없습니다"),
        Err(e) => println!("[!] Ollama 설정 오류: {}", e),
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

async fn open_index() -> Result<LanceVectorStore> {
    LanceVectorStore::open(Path::new(PERSIST_DIR))
        .await
        .context("벡터 인덱스 열기 실패")
}

fn build_embedder(config: &AppConfig) -> Result<OllamaEmbedding> {
    OllamaEmbedding::new(
        config.ollama_base(),
        config.embed_model.clone(),
        config.embed_dimension,
    )
    .context("임베딩 클라이언트 생성 실패")
}

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 5), "hello...");
        assert_eq!(truncate_text("hello\nworld", 20), "hello world");
    }

    #[test]
    fn test_truncate_unicode() {
        let korean = "안녕하세요 세계";
        let truncated = truncate_text(korean, 5);
        assert_eq!(truncated, "안녕하세요...");
    }

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from(["rag-app", "ask", "What is Docker?", "--strategy", "direct"])
            .unwrap();
        match cli.command {
            Commands::Ask {
                question,
                strategy,
                ephemeral,
            } => {
                assert_eq!(question, "What is Docker?");
                assert_eq!(strategy, Some(Strategy::Direct));
                assert!(!ephemeral);
            }
            _ => panic!("expected ask"),
        }

        let cli = Cli::try_parse_from(["rag-app", "serve", "--addr", "127.0.0.1:9000"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Serve { addr: Some(a), strategy: None } if a.port() == 9000
        ));

        assert!(Cli::try_parse_from(["rag-app", "ask", "q", "--strategy", "hybrid"]).is_err());
    }
}
