//! 설정 모듈
//!
//! 프로세스 시작 시 한 번 로드되어 `AppContext`로 전달되는 애플리케이션 설정입니다.
//! `.env` 파일과 환경변수에서 값을 읽고, 없으면 기본값을 사용합니다.

use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::knowledge::ChunkConfig;

// ============================================================================
// Defaults
// ============================================================================

/// 청크 최대 길이 (문자 수)
pub const DEFAULT_CHUNK_SIZE: usize = 2000;
/// 청크 오버랩 (문자 수)
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
/// 검색 결과 개수
pub const DEFAULT_TOP_K: usize = 8;
/// MMR 후보 개수
pub const DEFAULT_FETCH_K: usize = 20;
/// MMR 관련성/다양성 균형 (1.0 = 관련성만)
pub const DEFAULT_MMR_LAMBDA: f32 = 0.5;
/// 임베딩 모델
pub const DEFAULT_EMBED_MODEL: &str = "gemini-embedding-001";
/// 임베딩 차원
pub const DEFAULT_EMBED_DIMENSION: usize = 768;
/// 답변 생성 모델
pub const DEFAULT_LLM_MODEL: &str = "gemini-1.5-flash";
/// 답변 생성 temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// 분당 요청 수 (Gemini 무료 티어)
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

// ============================================================================
// AppConfig
// ============================================================================

/// 애플리케이션 설정
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub fetch_k: usize,
    pub mmr_lambda: f32,
    pub embed_model: String,
    pub embed_dimension: usize,
    pub llm_model: String,
    pub temperature: f32,
    pub requests_per_minute: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            fetch_k: DEFAULT_FETCH_K,
            mmr_lambda: DEFAULT_MMR_LAMBDA,
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            embed_dimension: DEFAULT_EMBED_DIMENSION,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
        }
    }
}

impl AppConfig {
    /// 환경변수에서 설정 로드
    ///
    /// `.env` 파일이 있으면 먼저 읽습니다. 설정되지 않은 항목은 기본값을 사용합니다.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {:?}", path);
        }

        let defaults = Self::default();
        let config = Self {
            chunk_size: env_or("BOND_INSIGHTS_CHUNK_SIZE", defaults.chunk_size)?,
            chunk_overlap: env_or("BOND_INSIGHTS_CHUNK_OVERLAP", defaults.chunk_overlap)?,
            top_k: env_or("BOND_INSIGHTS_TOP_K", defaults.top_k)?,
            fetch_k: env_or("BOND_INSIGHTS_FETCH_K", defaults.fetch_k)?,
            mmr_lambda: env_or("BOND_INSIGHTS_MMR_LAMBDA", defaults.mmr_lambda)?,
            embed_model: env_or("BOND_INSIGHTS_EMBED_MODEL", defaults.embed_model)?,
            embed_dimension: env_or("BOND_INSIGHTS_EMBED_DIM", defaults.embed_dimension)?,
            llm_model: env_or("BOND_INSIGHTS_LLM_MODEL", defaults.llm_model)?,
            temperature: env_or("BOND_INSIGHTS_TEMPERATURE", defaults.temperature)?,
            requests_per_minute: env_or("BOND_INSIGHTS_RPM", defaults.requests_per_minute)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<()> {
        self.chunk_config().validate()?;

        if self.top_k == 0 {
            bail!("top_k must be at least 1");
        }
        if self.fetch_k < self.top_k {
            bail!(
                "fetch_k ({}) must be >= top_k ({})",
                self.fetch_k,
                self.top_k
            );
        }
        if !(0.0..=1.0).contains(&self.mmr_lambda) {
            bail!("mmr_lambda must be within 0.0..=1.0, got {}", self.mmr_lambda);
        }
        if self.requests_per_minute == 0 {
            bail!("requests_per_minute must be at least 1");
        }

        Ok(())
    }

    /// 청킹 설정
    pub fn chunk_config(&self) -> ChunkConfig {
        ChunkConfig {
            max_characters: self.chunk_size,
            overlap_characters: self.chunk_overlap,
        }
    }
}

/// 환경변수를 파싱하거나 기본값 반환
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        _ => Ok(default),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 2000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.top_k, 8);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let config = AppConfig {
            chunk_overlap: 2000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fetch_k_below_top_k_rejected() {
        let config = AppConfig {
            top_k: 10,
            fetch_k: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_lambda_range() {
        let config = AppConfig {
            mmr_lambda: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_or_parses_and_rejects() {
        std::env::set_var("BOND_INSIGHTS_TEST_PARSE_OK", " 42 ");
        assert_eq!(env_or("BOND_INSIGHTS_TEST_PARSE_OK", 1usize).unwrap(), 42);

        std::env::set_var("BOND_INSIGHTS_TEST_PARSE_BAD", "forty-two");
        assert!(env_or("BOND_INSIGHTS_TEST_PARSE_BAD", 1usize).is_err());

        assert_eq!(env_or("BOND_INSIGHTS_TEST_UNSET", 7usize).unwrap(), 7);
    }
}
