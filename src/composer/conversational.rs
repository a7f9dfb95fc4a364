//! Conversational 전략
//!
//! 최근 질문들을 현재 질문과 합쳐 검색하고, 대화 기록과 컨텍스트를 넣어
//! 한 번 호출합니다. 성공한 턴만 기록에 추가합니다.
//!
//! 대화 상태는 프로세스당 하나의 세션입니다 (세션 구분 없음, 재시작 시 초기화).

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::llm::LanguageModel;
use crate::retriever::Retriever;

use super::prompt::conversational_prompt;
use super::{Answer, AnswerComposer, AnswerRoute, Strategy, Turn};

/// 검색 질의에 포함할 최근 턴 수
pub const HISTORY_WINDOW: usize = 2;

pub struct ConversationalComposer {
    retriever: Retriever,
    llm: Arc<dyn LanguageModel>,
    history: Mutex<Vec<Turn>>,
}

impl ConversationalComposer {
    pub fn new(retriever: Retriever, llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            retriever,
            llm,
            history: Mutex::new(Vec::new()),
        }
    }

    /// 지금까지의 대화 기록
    pub async fn history(&self) -> Vec<Turn> {
        self.history.lock().await.clone()
    }
}

/// 최근 질문 + 현재 질문으로 검색 질의 구성
fn retrieval_query(history: &[Turn], query: &str) -> String {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    history[start..]
        .iter()
        .map(|t| t.question.as_str())
        .chain(std::iter::once(query))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl AnswerComposer for ConversationalComposer {
    async fn compose(&self, query: &str) -> Result<Answer> {
        // 턴 순서를 지키기 위해 합성이 끝날 때까지 잠금 유지
        let mut history = self.history.lock().await;

        let chunks = self
            .retriever
            .retrieve(&retrieval_query(&history, query))
            .await?;

        let prompt = conversational_prompt(query, &history, &chunks);
        let text = self.llm.generate(&prompt).await?.trim().to_string();

        history.push(Turn {
            question: query.to_string(),
            answer: text.clone(),
        });
        tracing::debug!("Conversation now has {} turns", history.len());

        Ok(Answer::new(text, AnswerRoute::Conversational))
    }

    fn strategy(&self) -> Strategy {
        Strategy::Conversational
    }
}

// ============================================================================
// Tests
// ============================================================================
