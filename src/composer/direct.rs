//! Direct 전략 - 검색 결과를 모두 넣고 한 번 호출, 폴백 없음

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::llm::LanguageModel;
use crate::retriever::Retriever;

use super::prompt::grounded_prompt;
use super::{Answer, AnswerComposer, AnswerRoute, Strategy};

pub struct DirectComposer {
    retriever: Retriever,
    llm: Arc<dyn LanguageModel>,
}

impl DirectComposer {
    pub fn new(retriever: Retriever, llm: Arc<dyn LanguageModel>) -> Self {
        Self { retriever, llm }
    }
}

#[async_trait]
impl AnswerComposer for DirectComposer {
    async fn compose(&self, query: &str) -> Result<Answer> {
        let chunks = self.retriever.retrieve(query).await?;
        let text = self.llm.generate(&grounded_prompt(query, &chunks)).await?;
        Ok(Answer::new(text.trim(), AnswerRoute::Grounded))
    }

    fn strategy(&self) -> Strategy {
        Strategy::Direct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::Chunk;
    use crate::testing::{retriever_with, ScriptedLlm};

    #[tokio::test]
    async fn test_single_call_without_fallback() {
        let llm = Arc::new(ScriptedLlm::new(["I don't know."]));
        let composer = DirectComposer::new(
            retriever_with(&[Chunk::new("Pin base images.", "guide.md", None)]).await,
            llm.clone(),
        );

        let answer = composer.compose("What about networking?").await.unwrap();

        // 폴백 없이 모델 출력 그대로
        assert_eq!(answer, Answer::new("I don't know.", AnswerRoute::Grounded));
        assert_eq!(llm.calls(), 1);
        assert!(llm.prompts()[0].text.contains("Pin base images."));
    }

    #[tokio::test]
    async fn test_empty_index_still_calls_model() {
        let llm = Arc::new(ScriptedLlm::new(["  An answer.  "]));
        let composer = DirectComposer::new(retriever_with(&[]).await, llm.clone());

        let answer = composer.compose("Anything?").await.unwrap();
        assert_eq!(answer.text, "An answer.");
        assert_eq!(llm.calls(), 1);
    }
}
