//! 환경 변수 설정
//!
//! 시작 시 한 번 읽어 `AppConfig`로 고정합니다. 값이 없으면 기본값을 사용하고,
//! 형식이 잘못된 값은 `ConfigError`로 거부합니다.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::composer::Strategy;
use crate::embedding::{DEFAULT_DIMENSION, DEFAULT_EMBED_MODEL};
use crate::llm::{DEFAULT_MODEL, DEFAULT_TIMEOUT};
use crate::loader::{DEFAULT_GUIDE_PATH, DEFAULT_RESOURCES_DIR};

/// 기본 Ollama 주소 (컨테이너 안에서 호스트의 Ollama)
pub const DEFAULT_OLLAMA_URL: &str = "http://host.docker.internal:11434";

/// 기본 API 리슨 주소
pub const DEFAULT_API_ADDRESS: &str = "0.0.0.0:8000";

/// 설정 에러
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(name: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            name,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// 애플리케이션 설정
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 생성 모델 (`/v1/models`에도 노출)
    pub default_model: String,
    /// Ollama 기본 URL
    pub ollama_url: Url,
    /// 임베딩 모델
    pub embed_model: String,
    /// 임베딩 모델 출력 차원
    pub embed_dimension: usize,
    /// 답변 전략
    pub strategy: Strategy,
    /// HTTP 리슨 주소
    pub api_address: SocketAddr,
    /// 언어 모델 호출 제한 시간
    pub llm_timeout: Duration,
    /// 마크다운 가이드 경로
    pub guide_path: PathBuf,
    /// PDF 디렉토리
    pub resources_dir: PathBuf,
}

impl AppConfig {
    /// 프로세스 환경 변수에서 읽기
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 임의의 조회 함수에서 읽기 (빈 값은 없는 것으로 취급)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str, default: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let ollama_raw = get("OLLAMA_SERVER_URL", DEFAULT_OLLAMA_URL);
        let ollama_url = Url::parse(&ollama_raw)
            .map_err(|e| ConfigError::invalid("OLLAMA_SERVER_URL", &ollama_raw, e))?;
        if !matches!(ollama_url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                "OLLAMA_SERVER_URL",
                &ollama_raw,
                "scheme must be http or https",
            ));
        }

        let strategy_raw = get("RAG_STRATEGY", Strategy::default().as_str());
        let strategy = strategy_raw
            .parse::<Strategy>()
            .map_err(|e| ConfigError::invalid("RAG_STRATEGY", &strategy_raw, e))?;

        let address_raw = get("API_ADDRESS", DEFAULT_API_ADDRESS);
        let api_address = address_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("API_ADDRESS", &address_raw, e))?;

        let dimension_raw = get("EMBED_DIMENSION", &DEFAULT_DIMENSION.to_string());
        let embed_dimension = match dimension_raw.parse::<usize>() {
            Ok(0) => {
                return Err(ConfigError::invalid(
                    "EMBED_DIMENSION",
                    &dimension_raw,
                    "must be greater than zero",
                ))
            }
            Ok(dim) => dim,
            Err(e) => return Err(ConfigError::invalid("EMBED_DIMENSION", &dimension_raw, e)),
        };

        let timeout_raw = get("LLM_TIMEOUT_SECS", &DEFAULT_TIMEOUT.as_secs().to_string());
        let llm_timeout = match timeout_raw.parse::<u64>() {
            Ok(0) => {
                return Err(ConfigError::invalid(
                    "LLM_TIMEOUT_SECS",
                    &timeout_raw,
                    "must be greater than zero",
                ))
            }
            Ok(secs) => Duration::from_secs(secs),
            Err(e) => return Err(ConfigError::invalid("LLM_TIMEOUT_SECS", &timeout_raw, e)),
        };

        Ok(Self {
            default_model: get("DEFAULT_MODEL", DEFAULT_MODEL),
            ollama_url,
            embed_model: get("EMBED_MODEL", DEFAULT_EMBED_MODEL),
            embed_dimension,
            strategy,
            api_address,
            llm_timeout,
            guide_path: PathBuf::from(get("GUIDE_PATH", DEFAULT_GUIDE_PATH)),
            resources_dir: PathBuf::from(get("RESOURCES_DIR", DEFAULT_RESOURCES_DIR)),
        })
    }

    /// 끝의 `/`를 뺀 Ollama 주소
    pub fn ollama_base(&self) -> &str {
        self.ollama_url.as_str().trim_end_matches('/')
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.default_model, "gemma3:4b");
        assert_eq!(config.ollama_base(), "http://host.docker.internal:11434");
        assert_eq!(config.embed_model, "all-minilm");
        assert_eq!(config.embed_dimension, 384);
        assert_eq!(config.strategy, Strategy::FallbackOnUncertainty);
        assert_eq!(config.api_address.port(), 8000);
        assert_eq!(config.llm_timeout, Duration::from_secs(120));
        assert_eq!(config.guide_path, PathBuf::from("/docker_best_practices.md"));
        assert_eq!(config.resources_dir, PathBuf::from("/resources"));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DEFAULT_MODEL", "llama3.2"),
            ("OLLAMA_SERVER_URL", "http://localhost:11434/"),
            ("RAG_STRATEGY", "conversational"),
            ("API_ADDRESS", "127.0.0.1:9000"),
            ("LLM_TIMEOUT_SECS", "30"),
            ("GUIDE_PATH", "  "),
        ])
        .unwrap();

        assert_eq!(config.default_model, "llama3.2");
        assert_eq!(config.ollama_base(), "http://localhost:11434");
        assert_eq!(config.strategy, Strategy::Conversational);
        assert_eq!(config.api_address.to_string(), "127.0.0.1:9000");
        assert_eq!(config.llm_timeout, Duration::from_secs(30));
        // 빈 값은 기본값
        assert_eq!(config.guide_path, PathBuf::from(DEFAULT_GUIDE_PATH));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for (name, value) in [
            ("OLLAMA_SERVER_URL", "not a url"),
            ("OLLAMA_SERVER_URL", "ftp://host:21"),
            ("RAG_STRATEGY", "hybrid"),
            ("API_ADDRESS", "localhost"),
            ("LLM_TIMEOUT_SECS", "0"),
            ("LLM_TIMEOUT_SECS", "soon"),
            ("EMBED_DIMENSION", "0"),
        ] {
            let err = config_from(&[(name, value)]).unwrap_err();
            let ConfigError::Invalid { name: got, .. } = err;
            assert_eq!(got, name);
        }
    }
}
