//! 언어 모델 모듈 - Gemini generateContent 호출
//!
//! 프롬프트 하나를 보내고 텍스트 답변 하나를 받는 단순한 인터페이스입니다.
//! 재시도와 Rate limit은 `GeminiClient`가 처리합니다.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::gemini::{get_api_key, GeminiClient};

// ============================================================================
// LanguageModel Trait
// ============================================================================

/// 텍스트 생성 모델 트레이트
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// 프롬프트에 대한 답변 생성
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// 모델 이름
    fn name(&self) -> &str;
}

// ============================================================================
// Gemini
// ============================================================================

/// Gemini 텍스트 생성 구현체
///
/// source: https://ai.google.dev/api/generate-content
#[derive(Debug)]
pub struct GeminiChat {
    client: GeminiClient,
    model: String,
    temperature: f32,
}

impl GeminiChat {
    /// 새 인스턴스 생성
    pub fn new(api_key: String, model: &str, temperature: f32, requests_per_minute: u32) -> Result<Self> {
        let client = GeminiClient::new(api_key, Duration::from_secs(120), requests_per_minute)?;

        Ok(Self {
            client,
            model: model.to_string(),
            temperature,
        })
    }

    /// 환경변수의 API 키와 설정으로 생성
    pub fn from_env(config: &AppConfig) -> Result<Self> {
        let api_key = get_api_key()?;
        let chat = Self::new(
            api_key,
            &config.llm_model,
            config.temperature,
            config.requests_per_minute,
        )?;

        tracing::info!(
            "Using Gemini model {} (temperature: {})",
            chat.model,
            chat.temperature
        );
        Ok(chat)
    }

    fn request(&self, prompt: &str) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl LanguageModel for GeminiChat {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = self.request(prompt);

        let response: GenerateResponse = self
            .client
            .post(&self.model, "generateContent", &request)
            .await
            .context("Generation request failed")?;

        response.into_text()
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

impl GenerateResponse {
    /// 첫 후보의 텍스트 파트를 이어붙임
    fn into_text(self) -> Result<String> {
        let candidate = match self.candidates.into_iter().next() {
            Some(c) => c,
            None => {
                let reason = self
                    .prompt_feedback
                    .and_then(|f| f.block_reason)
                    .unwrap_or_else(|| "unknown".to_string());
                anyhow::bail!("Model returned no candidates (block reason: {})", reason);
            }
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            anyhow::bail!(
                "Model returned an empty answer (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            );
        }

        Ok(text)
    }
}

// ============================================================================
// Tests
// ============================================================================
