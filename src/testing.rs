//! 테스트용 임베딩/언어 모델 구현체
//!
//! 네트워크 없이 파이프라인을 검증하기 위한 결정적 구현입니다.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::knowledge::Segment;
use crate::llm::LanguageModel;

/// 단어 해시 기반 bag-of-words 임베딩
pub struct HashEmbedding {
    dimension: usize,
}

impl HashEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn bucket(&self, word: &str) -> usize {
        // FNV-1a
        let hash = word
            .bytes()
            .fold(0xcbf29ce484222325u64, |h, b| (h ^ b as u64).wrapping_mul(0x100000001b3));
        (hash % self.dimension as u64) as usize
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            vector[self.bucket(&word.to_lowercase())] += 1.0;
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hash-embedding"
    }
}

/// 항상 실패하는 임베딩
pub struct FailingEmbedding;

#[async_trait]
impl EmbeddingProvider for FailingEmbedding {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        anyhow::bail!("embedding service unavailable")
    }

    fn dimension(&self) -> usize {
        8
    }

    fn name(&self) -> &str {
        "failing-embedding"
    }
}

/// 고정 답변 언어 모델 (받은 프롬프트 기록)
pub struct CannedModel {
    answer: String,
    prompts: Mutex<Vec<String>>,
}

impl CannedModel {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LanguageModel for CannedModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        Ok(self.answer.clone())
    }

    fn name(&self) -> &str {
        "canned-model"
    }
}

/// 항상 실패하는 언어 모델
pub struct FailingModel;

#[async_trait]
impl LanguageModel for FailingModel {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        anyhow::bail!("model quota exceeded")
    }

    fn name(&self) -> &str {
        "failing-model"
    }
}

/// 테스트용 세그먼트
pub fn segment(text: &str, page: u32) -> Segment {
    Segment {
        text: text.to_string(),
        page: Some(page),
        filename: "bond.pdf".to_string(),
        chunk_index: 0,
        start_char: 0,
    }
}
