//! FallbackOnUncertainty 전략
//!
//! 1. top-k 검색
//! 2. 결과 없음 → 4로
//! 3. 근거 프롬프트 호출. 출력이 SENTINEL로 시작하면 4로, 아니면 그 답변 반환
//! 4. 질문만으로 일반 답변 생성 후 반환

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::llm::LanguageModel;
use crate::retriever::Retriever;

use super::prompt::{grounded_prompt, is_abstention, ungrounded_prompt};
use super::{Answer, AnswerComposer, AnswerRoute, FallbackReason, Strategy};

pub struct FallbackComposer {
    retriever: Retriever,
    llm: Arc<dyn LanguageModel>,
}

impl FallbackComposer {
    pub fn new(retriever: Retriever, llm: Arc<dyn LanguageModel>) -> Self {
        Self { retriever, llm }
    }

    async fn ungrounded(&self, query: &str, reason: FallbackReason) -> Result<Answer> {
        let text = self.llm.generate(&ungrounded_prompt(query)).await?;
        Ok(Answer::new(text.trim(), AnswerRoute::Fallback(reason)))
    }
}

#[async_trait]
impl AnswerComposer for FallbackComposer {
    async fn compose(&self, query: &str) -> Result<Answer> {
        let chunks = self.retriever.retrieve(query).await?;

        if chunks.is_empty() {
            tracing::info!("No docs found; using fallback LLM");
            return self.ungrounded(query, FallbackReason::NoContext).await;
        }

        let grounded = self.llm.generate(&grounded_prompt(query, &chunks)).await?;
        let grounded = grounded.trim();
        tracing::info!("RAG answer: {:?}", grounded);

        if is_abstention(grounded) {
            tracing::info!("RAG said \"I don't know\"; using fallback LLM");
            return self.ungrounded(query, FallbackReason::Abstained).await;
        }

        Ok(Answer::new(grounded, AnswerRoute::Grounded))
    }

    fn strategy(&self) -> Strategy {
        Strategy::FallbackOnUncertainty
    }
}

// ============================================================================
// Tests
// ============================================================================
