//! 프롬프트 템플릿
//!
//! 근거 프롬프트의 지시문과 `is_abstention` 검사는 같은 `SENTINEL` 상수를 공유합니다.
//! 한쪽만 바꾸면 폴백 전환이 동작하지 않습니다.

use crate::knowledge::ScoredChunk;
use crate::llm::Prompt;

use super::Turn;

/// 컨텍스트로 답할 수 없을 때 모델이 말하도록 지시하는 문구
pub const SENTINEL: &str = "I don't know";

/// 대화형 전략의 페르소나
pub const CONVERSATIONAL_SYSTEM: &str = "You are a helpful assistant. Use the context to answer \
     factual questions, but you can also chat conversationally.";

/// 컨텍스트 없는 폴백 답변의 시스템 프롬프트
pub const FALLBACK_SYSTEM: &str =
    "You are a helpful assistant. Provide an informative answer to the user's question.";

/// 검색된 청크를 하나의 컨텍스트 블록으로 합침
pub fn format_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|c| format!("[{}]\n{}", c.chunk.source, c.chunk.text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// 컨텍스트만 사용해 답하도록 하는 프롬프트
pub fn grounded_prompt(question: &str, chunks: &[ScoredChunk]) -> Prompt {
    Prompt::new(format!(
        "Use only the following pieces of context to answer the question at the end. \
         If the context does not contain the answer, reply with \"{SENTINEL}\" and nothing \
         else; don't try to make up an answer.\n\n\
         {context}\n\n\
         Question: {question}\n\
         Helpful Answer:",
        context = format_context(chunks),
    ))
}

/// 질문만 사용하는 일반 답변 프롬프트
pub fn ungrounded_prompt(question: &str) -> Prompt {
    Prompt::with_system(FALLBACK_SYSTEM, question)
}

/// 대화 기록 + 컨텍스트 프롬프트
pub fn conversational_prompt(question: &str, history: &[Turn], chunks: &[ScoredChunk]) -> Prompt {
    let mut text = String::new();

    if !history.is_empty() {
        text.push_str("Chat history:\n");
        for turn in history {
            text.push_str(&format!("Human: {}\nAssistant: {}\n", turn.question, turn.answer));
        }
        text.push('\n');
    }

    if !chunks.is_empty() {
        text.push_str(&format!("Context:\n{}\n\n", format_context(chunks)));
    }

    text.push_str(&format!("Question: {question}\nAnswer:"));
    Prompt::with_system(CONVERSATIONAL_SYSTEM, text)
}

/// 모델 출력이 SENTINEL로 시작하는지 (대소문자 무시, 앞 공백 무시)
pub fn is_abstention(answer: &str) -> bool {
    let normalized = answer.trim_start().replace('\u{2019}', "'").to_lowercase();
    normalized.starts_with(&SENTINEL.to_lowercase())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::Chunk;

    fn scored(text: &str, path: &str, page: Option<u32>) -> ScoredChunk {
        ScoredChunk {
            id: 0,
            chunk: Chunk::new(text, path, page),
            similarity: 0.9,
        }
    }

    #[test]
    fn test_is_abstention() {
        assert!(is_abstention("I don't know."));
        assert!(is_abstention("  i DON'T KNOW the answer"));
        assert!(is_abstention("I don\u{2019}t know"));
        assert!(!is_abstention("Use multi-stage builds."));
        assert!(!is_abstention("Honestly, I don't know"));
        assert!(!is_abstention(""));
    }

    #[test]
    fn test_grounded_prompt_carries_sentinel_and_context() {
        let prompt = grounded_prompt(
            "How do I reduce image size?",
            &[scored("Use multi-stage builds.", "guide.md", None)],
        );

        assert!(prompt.system.is_none());
        assert!(prompt.text.contains(&format!("\"{SENTINEL}\"")));
        assert!(prompt.text.contains("[guide.md]\nUse multi-stage builds."));
        assert!(prompt.text.ends_with("Question: How do I reduce image size?\nHelpful Answer:"));
    }

    #[test]
    fn test_ungrounded_prompt_is_raw_question() {
        let prompt = ungrounded_prompt("What is Rust?");
        assert_eq!(prompt.system.as_deref(), Some(FALLBACK_SYSTEM));
        assert_eq!(prompt.text, "What is Rust?");
    }

    #[test]
    fn test_conversational_prompt_includes_history() {
        let history = vec![Turn {
            question: "What is Docker?".to_string(),
            answer: "A container runtime.".to_string(),
        }];
        let prompt = conversational_prompt(
            "How do I shrink images?",
            &history,
            &[scored("Use multi-stage builds.", "/resources/a.pdf", Some(4))],
        );

        assert_eq!(prompt.system.as_deref(), Some(CONVERSATIONAL_SYSTEM));
        assert!(prompt.text.starts_with(
            "Chat history:\nHuman: What is Docker?\nAssistant: A container runtime.\n"
        ));
        assert!(prompt.text.contains("[/resources/a.pdf (page 4)]"));
        assert!(prompt.text.ends_with("Question: How do I shrink images?\nAnswer:"));
    }

    #[test]
    fn test_format_context_joins_chunks() {
        let context = format_context(&[
            scored(" first ", "a.md", None),
            scored("second", "b.pdf", Some(2)),
        ]);
        assert_eq!(context, "[a.md]\nfirst\n\n[b.pdf (page 2)]\nsecond");
    }
}
