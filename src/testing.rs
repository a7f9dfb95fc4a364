//! 테스트용 대역 (임베딩, 언어 모델, 문서 소스)

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::embedding::{self, EmbeddingProvider};
use crate::knowledge::{Chunk, MemoryVectorStore, VectorStore};
use crate::llm::{self, GenerationError, LanguageModel, Prompt};
use crate::loader::{DocumentSource, LoadError};
use crate::retriever::Retriever;

const KEYWORD_DIMENSION: usize = 64;

/// 단어 해시 기반 결정적 임베딩
///
/// 같은 단어를 공유하는 텍스트끼리 유사도가 높아집니다.
#[derive(Debug, Default)]
pub struct KeywordEmbedding {
    calls: AtomicUsize,
}

impl KeywordEmbedding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn bucket(word: &str) -> usize {
        word.bytes()
            .fold(7usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize))
            % KEYWORD_DIMENSION
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedding {
    async fn embed(&self, text: &str) -> embedding::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut vector = vec![0.0; KEYWORD_DIMENSION];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            vector[Self::bucket(&word.to_lowercase())] += 1.0;
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        KEYWORD_DIMENSION
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

/// 준비된 응답을 순서대로 돌려주고 받은 프롬프트를 기록하는 언어 모델
#[derive(Debug, Default)]
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<llm::Result<String>>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedLlm {
    pub fn new(responses: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// 첫 호출에서 실패하는 모델
    pub fn failing(err: GenerationError) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from([Err(err)])),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedLlm {
    async fn generate(&self, prompt: &Prompt) -> llm::Result<String> {
        self.prompts.lock().unwrap().push(prompt.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Decode("no scripted response left".into())))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// 고정 청크를 돌려주고 호출 횟수를 세는 문서 소스
#[derive(Debug, Default)]
pub struct StaticSource {
    chunks: Vec<Chunk>,
    loads: AtomicUsize,
}

impl StaticSource {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self {
            chunks,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentSource for StaticSource {
    async fn load_all(&self) -> Result<Vec<Chunk>, LoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.chunks.clone())
    }
}

/// 주어진 청크로 채운 인메모리 인덱스 위의 검색기
pub async fn retriever_with(chunks: &[Chunk]) -> Retriever {
    let store = Arc::new(MemoryVectorStore::new());
    let embedder = Arc::new(KeywordEmbedding::new());
    store
        .add(chunks, embedder.as_ref())
        .await
        .expect("in-memory ingestion succeeds");
    Retriever::new(store, embedder)
}
