//! 답변 생성 모듈
//!
//! 검색된 세그먼트 전체를 하나의 프롬프트에 넣어("stuff") 언어 모델에 질의하고,
//! 답변과 함께 사용한 세그먼트의 인용 목록을 반환합니다.
//!
//! 세그먼트 합계가 모델 컨텍스트 한도를 넘는 경우는 처리하지 않습니다.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::knowledge::{page_label, Segment, SessionIndex};
use crate::llm::LanguageModel;

/// 인용 발췌 길이 (문자 수)
pub const EXCERPT_CHARS: usize = 400;

/// 질의응답 프롬프트 템플릿
const QA_TEMPLATE: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\n\
{context}\n\nQuestion: {question}\nHelpful Answer:";

// ============================================================================
// Types
// ============================================================================

/// 답변 근거 인용
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Citation {
    /// 페이지 번호 (0부터 시작)
    pub page: Option<u32>,
    /// 원본 파일명
    pub filename: String,
    /// 세그먼트 앞부분 (줄바꿈은 공백으로 치환)
    pub excerpt: String,
}

impl Citation {
    /// 세그먼트에서 인용 생성
    pub fn from_segment(segment: &Segment) -> Self {
        let excerpt: String = segment
            .text
            .chars()
            .take(EXCERPT_CHARS)
            .collect::<String>()
            .replace('\n', " ");

        Self {
            page: segment.page,
            filename: segment.filename.clone(),
            excerpt,
        }
    }
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page {}: {}...", page_label(self.page), self.excerpt)
    }
}

/// 질의응답 결과
#[derive(Debug, Clone, Serialize)]
pub struct QaResult {
    /// 모델 답변
    pub answer: String,
    /// 답변에 사용된 세그먼트 (검색 순서)
    pub sources: Vec<Segment>,
    /// 세그먼트별 인용
    pub citations: Vec<Citation>,
}

impl QaResult {
    /// 인용 문자열 목록 ("Page <page>: <excerpt>...")
    pub fn citation_lines(&self) -> Vec<String> {
        self.citations.iter().map(|c| c.to_string()).collect()
    }
}

// ============================================================================
// AnswerGenerator
// ============================================================================

/// 검색 결과 기반 답변 생성기
pub struct AnswerGenerator {
    llm: Arc<dyn LanguageModel>,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// 검색된 세그먼트로 답변 생성
    ///
    /// 모델 호출 실패는 그대로 전파됩니다.
    pub async fn answer(&self, query: &str, segments: Vec<Segment>) -> Result<QaResult> {
        let prompt = build_prompt(query, &segments);

        tracing::debug!(
            "Asking {} with {} segments ({} prompt chars)",
            self.llm.name(),
            segments.len(),
            prompt.chars().count()
        );

        let answer = self
            .llm
            .generate(&prompt)
            .await
            .context("Failed to generate answer")?;

        let citations = segments.iter().map(Citation::from_segment).collect();

        Ok(QaResult {
            answer,
            sources: segments,
            citations,
        })
    }

    /// 인덱스에서 검색 후 답변 생성
    pub async fn ask(&self, index: &SessionIndex, query: &str, k: usize) -> Result<QaResult> {
        let segments = index.retrieve(query, k).await?;
        self.answer(query, segments).await
    }
}

/// "stuff" 프롬프트 구성
pub fn build_prompt(query: &str, segments: &[Segment]) -> String {
    let context = segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    QA_TEMPLATE
        .replace("{context}", &context)
        .replace("{question}", query)
}

// ============================================================================
// Tests
// ============================================================================
