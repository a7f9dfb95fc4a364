//! 답변 합성기 - 검색 결과와 질문으로 최종 답변을 만드는 정책
//!
//! 배포 단위로 선택하는 세 가지 전략:
//! - `Direct`: 검색된 청크를 모두 프롬프트에 넣고 한 번 호출
//! - `Conversational`: 대화 기록으로 검색과 생성을 보강, 턴을 기록
//! - `FallbackOnUncertainty`: 컨텍스트가 없거나 모델이 "I don't know"로
//!   답하면 컨텍스트 없는 일반 답변으로 전환
//!
//! 생성 실패는 그대로 전파합니다. 재시도는 하지 않습니다.

mod conversational;
mod direct;
mod fallback;
pub mod prompt;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::llm::LanguageModel;
use crate::retriever::Retriever;

pub use conversational::{ConversationalComposer, HISTORY_WINDOW};
pub use direct::DirectComposer;
pub use fallback::FallbackComposer;

// ============================================================================
// Types
// ============================================================================

/// 답변 합성 전략
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Direct,
    Conversational,
    #[default]
    FallbackOnUncertainty,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Direct => "direct",
            Strategy::Conversational => "conversational",
            Strategy::FallbackOnUncertainty => "fallback",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "direct" | "qa" => Ok(Strategy::Direct),
            "conversational" | "chat" => Ok(Strategy::Conversational),
            "fallback" | "fallback_on_uncertainty" => Ok(Strategy::FallbackOnUncertainty),
            other => Err(format!(
                "unknown strategy '{}': expected direct, conversational or fallback",
                other
            )),
        }
    }
}

/// 폴백으로 전환된 이유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// 검색 결과 없음
    NoContext,
    /// 근거 답변이 SENTINEL로 시작
    Abstained,
}

/// 답변이 만들어진 경로
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerRoute {
    Grounded,
    Conversational,
    Fallback(FallbackReason),
}

/// 합성된 답변
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub route: AnswerRoute,
}

impl Answer {
    pub fn new(text: impl Into<String>, route: AnswerRoute) -> Self {
        Self {
            text: text.into(),
            route,
        }
    }
}

/// 대화 턴 (질문, 답변)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

// ============================================================================
// AnswerComposer Trait
// ============================================================================

/// 답변 합성기 트레이트
#[async_trait]
pub trait AnswerComposer: Send + Sync {
    /// 질문에 대한 최종 답변
    async fn compose(&self, query: &str) -> Result<Answer>;

    /// 사용 중인 전략
    fn strategy(&self) -> Strategy;
}

/// 전략에 맞는 합성기 생성
pub fn build_composer(
    strategy: Strategy,
    retriever: Retriever,
    llm: Arc<dyn LanguageModel>,
) -> Arc<dyn AnswerComposer> {
    tracing::info!("Answer strategy: {}", strategy);
    match strategy {
        Strategy::Direct => Arc::new(DirectComposer::new(retriever, llm)),
        Strategy::Conversational => Arc::new(ConversationalComposer::new(retriever, llm)),
        Strategy::FallbackOnUncertainty => Arc::new(FallbackComposer::new(retriever, llm)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{retriever_with, ScriptedLlm};

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("direct".parse::<Strategy>(), Ok(Strategy::Direct));
        assert_eq!(" Conversational ".parse::<Strategy>(), Ok(Strategy::Conversational));
        assert_eq!("fallback".parse::<Strategy>(), Ok(Strategy::FallbackOnUncertainty));
        assert_eq!(
            "fallback-on-uncertainty".parse::<Strategy>(),
            Ok(Strategy::FallbackOnUncertainty)
        );
        assert!("hybrid".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_strategy_display_roundtrips() {
        for strategy in [
            Strategy::Direct,
            Strategy::Conversational,
            Strategy::FallbackOnUncertainty,
        ] {
            assert_eq!(strategy.to_string().parse::<Strategy>(), Ok(strategy));
        }
        assert_eq!(Strategy::default(), Strategy::FallbackOnUncertainty);
    }

    #[tokio::test]
    async fn test_build_composer_selects_strategy() {
        for strategy in [
            Strategy::Direct,
            Strategy::Conversational,
            Strategy::FallbackOnUncertainty,
        ] {
            let composer = build_composer(
                strategy,
                retriever_with(&[]).await,
                Arc::new(ScriptedLlm::default()),
            );
            assert_eq!(composer.strategy(), strategy);
        }
    }
}
