//! 임베딩 모듈 - Gemini API를 통한 텍스트 벡터화
//!
//! 세그먼트와 질의를 벡터로 변환하는 Gemini 임베딩 프로바이더입니다.
//! 문서는 `RETRIEVAL_DOCUMENT`, 질의는 `RETRIEVAL_QUERY` 태스크로 임베딩합니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = GeminiEmbedding::from_env(&AppConfig::default())?;
//! let embedding = embedder.embed("The par value is $5,000,000.").await?;
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::gemini::{get_api_key, GeminiClient};

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 프로바이더 트레이트
///
/// 텍스트를 벡터로 변환하는 인터페이스입니다.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 단일 문서 텍스트 임베딩
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// 질의 임베딩 (기본 구현: 문서 임베딩과 동일)
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        self.embed(query).await
    }

    /// 배치 임베딩 (기본 구현: 순차 호출)
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// 임베딩 차원 수
    fn dimension(&self) -> usize;

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

// ============================================================================
// Google Gemini Embedding
// ============================================================================

/// batchEmbedContents 요청당 최대 텍스트 수
pub const MAX_BATCH_SIZE: usize = 100;

/// 지원 차원 (gemini-embedding-001 MRL)
pub const SUPPORTED_DIMENSIONS: [usize; 3] = [768, 1536, 3072];

/// 임베딩 태스크 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    RetrievalDocument,
    RetrievalQuery,
}

impl TaskType {
    fn as_str(self) -> &'static str {
        match self {
            TaskType::RetrievalDocument => "RETRIEVAL_DOCUMENT",
            TaskType::RetrievalQuery => "RETRIEVAL_QUERY",
        }
    }
}

/// Google Gemini 임베딩 구현체
///
/// source: https://ai.google.dev/gemini-api/docs/embeddings
#[derive(Debug)]
pub struct GeminiEmbedding {
    client: GeminiClient,
    model: String,
    dimension: usize,
}

impl GeminiEmbedding {
    /// 새 Gemini 임베딩 인스턴스 생성
    ///
    /// # Arguments
    /// * `api_key` - Google AI API 키
    /// * `model` - 임베딩 모델 이름
    /// * `dimension` - 임베딩 차원 (768, 1536, 3072 중 선택)
    /// * `requests_per_minute` - 분당 요청 한도
    pub fn new(
        api_key: String,
        model: &str,
        dimension: usize,
        requests_per_minute: u32,
    ) -> Result<Self> {
        if !SUPPORTED_DIMENSIONS.contains(&dimension) {
            anyhow::bail!(
                "Invalid dimension: {}. Must be 768, 1536, or 3072",
                dimension
            );
        }

        let client = GeminiClient::new(api_key, Duration::from_secs(30), requests_per_minute)?;

        Ok(Self {
            client,
            model: model.to_string(),
            dimension,
        })
    }

    /// 환경변수의 API 키와 설정으로 생성
    pub fn from_env(config: &AppConfig) -> Result<Self> {
        let api_key = get_api_key()?;
        let embedder = Self::new(
            api_key,
            &config.embed_model,
            config.embed_dimension,
            config.requests_per_minute,
        )?;

        tracing::info!(
            "Using Gemini API embedding {} (dimension: {})",
            embedder.model,
            embedder.dimension
        );
        Ok(embedder)
    }

    async fn embed_as(&self, text: &str, task_type: TaskType) -> Result<Vec<f32>> {
        // 빈 텍스트 처리
        if text.trim().is_empty() {
            return Ok(vec![0.0; self.dimension]);
        }

        let request = self.request(text, task_type);
        let response: EmbedResponse = self
            .client
            .post(&self.model, "embedContent", &request)
            .await
            .context("Embedding request failed")?;

        self.check_dimension(response.embedding.values)
    }

    /// batchEmbedContents 한 번으로 여러 문서 임베딩 (최대 `MAX_BATCH_SIZE`개)
    async fn embed_chunk(&self, texts: &[&String]) -> Result<Vec<Vec<f32>>> {
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| self.request(text, TaskType::RetrievalDocument))
                .collect(),
        };

        let response: BatchEmbedResponse = self
            .client
            .post(&self.model, "batchEmbedContents", &request)
            .await
            .context("Batch embedding request failed")?;

        if response.embeddings.len() != texts.len() {
            anyhow::bail!(
                "Batch embedding count mismatch: sent {}, got {}",
                texts.len(),
                response.embeddings.len()
            );
        }

        response
            .embeddings
            .into_iter()
            .map(|embedding| self.check_dimension(embedding.values))
            .collect()
    }

    fn request(&self, text: &str, task_type: TaskType) -> EmbedRequest {
        EmbedRequest {
            model: format!("models/{}", self.model),
            content: EmbedContent {
                parts: vec![EmbedPart {
                    text: text.to_string(),
                }],
            },
            task_type: task_type.as_str().to_string(),
            output_dimensionality: Some(self.dimension),
        }
    }

    fn check_dimension(&self, values: Vec<f32>) -> Result<Vec<f32>> {
        if values.len() != self.dimension {
            anyhow::bail!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.dimension,
                values.len()
            );
        }
        Ok(values)
    }
}

/// Gemini API 요청 본문
/// source: https://ai.google.dev/gemini-api/docs/embeddings
#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    content: EmbedContent,
    #[serde(rename = "taskType")]
    task_type: String,
    #[serde(rename = "outputDimensionality", skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<usize>,
}

#[derive(Debug, Serialize)]
struct EmbedContent {
    parts: Vec<EmbedPart>,
}

#[derive(Debug, Serialize)]
struct EmbedPart {
    text: String,
}

/// 배치 요청 본문
#[derive(Debug, Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedRequest>,
}

/// Gemini API 응답
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

/// 배치 응답 (요청 순서 유지)
#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_as(text, TaskType::RetrievalDocument).await
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        self.embed_as(query, TaskType::RetrievalQuery).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // 빈 텍스트는 요청 없이 영벡터
        let mut results = vec![vec![0.0; self.dimension]; texts.len()];
        let pending: Vec<usize> = (0..texts.len())
            .filter(|&i| !texts[i].trim().is_empty())
            .collect();

        let total = pending.len().div_ceil(MAX_BATCH_SIZE);
        for (n, indices) in pending.chunks(MAX_BATCH_SIZE).enumerate() {
            tracing::debug!("Embedding batch {}/{} ({} texts)", n + 1, total, indices.len());

            let chunk: Vec<&String> = indices.iter().map(|&i| &texts[i]).collect();
            let vectors = self.embed_chunk(&chunk).await?;
            for (&i, vector) in indices.iter().zip(vectors) {
                results[i] = vector;
            }
        }

        Ok(results)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Tests
// ============================================================================
