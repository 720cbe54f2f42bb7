//! 애플리케이션 컨텍스트
//!
//! 프로세스 시작 시 한 번 만들어 참조로 전달합니다.
//! 설정, 청커, 임베딩 모델, 언어 모델, 인덱스 캐시를 묶고
//! 질의응답 / 보고서 / 키워드 검색 세 가지 진입점을 제공합니다.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::embedding::{EmbeddingProvider, GeminiEmbedding};
use crate::knowledge::{
    sliding_window_chunker, Chunker, IndexCache, RetrievalParams, Segment, SessionIndex,
};
use crate::llm::{GeminiChat, LanguageModel};
use crate::loader::{load_documents, Document};
use crate::qa::{AnswerGenerator, QaResult};
use crate::report::{write_report, REPORT_PROMPT};
use crate::search::{self, SearchOutcome, NO_DOCUMENTS_MESSAGE};

// ============================================================================
// Outcomes
// ============================================================================

/// 질의응답 결과
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    /// 업로드된 문서 없음
    NoDocuments,
    Answered(QaResult),
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOutcome::NoDocuments => f.write_str(NO_DOCUMENTS_MESSAGE),
            QueryOutcome::Answered(result) => f.write_str(&result.answer),
        }
    }
}

/// 보고서 생성 결과
#[derive(Debug, Clone)]
pub enum ReportOutcome {
    /// 업로드된 문서 없음 (파일을 만들지 않음)
    NoDocuments,
    Written {
        /// 저장된 PDF 경로
        path: PathBuf,
        /// 보고서에 쓰인 답변과 인용
        result: QaResult,
    },
}

impl fmt::Display for ReportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportOutcome::NoDocuments => f.write_str(NO_DOCUMENTS_MESSAGE),
            ReportOutcome::Written { path, .. } => write!(f, "{}", path.display()),
        }
    }
}

// ============================================================================
// AppContext
// ============================================================================

/// 요청 처리에 필요한 공유 상태
pub struct AppContext {
    config: AppConfig,
    chunker: Box<dyn Chunker>,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: AnswerGenerator,
    cache: IndexCache,
}

impl AppContext {
    /// 주어진 모델로 컨텍스트 생성
    pub fn new(
        config: AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LanguageModel>,
    ) -> Result<Self> {
        config.validate().context("Invalid configuration")?;

        Ok(Self {
            chunker: sliding_window_chunker(config.chunk_config()),
            config,
            embedder,
            generator: AnswerGenerator::new(llm),
            cache: IndexCache::new(),
        })
    }

    /// Gemini 임베딩/생성 모델로 컨텍스트 생성 (API 키 필요)
    pub fn from_env(config: AppConfig) -> Result<Self> {
        let embedder = Arc::new(GeminiEmbedding::from_env(&config)?);
        let llm = Arc::new(GeminiChat::from_env(&config)?);
        Self::new(config, embedder, llm)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache(&self) -> &IndexCache {
        &self.cache
    }

    /// 문서 집합의 인덱스 (캐시 재사용)
    pub async fn index(&self, docs: &[Document]) -> Result<Arc<SessionIndex>> {
        let params = RetrievalParams {
            fetch_k: self.config.fetch_k,
            lambda: self.config.mmr_lambda,
        };

        self.cache
            .get_or_build(docs, self.chunker.as_ref(), Arc::clone(&self.embedder), params)
            .await
    }

    /// 문서에 대해 질문하고 답변과 인용을 반환
    pub async fn query(&self, docs: &[Document], question: &str) -> Result<QueryOutcome> {
        if docs.is_empty() {
            return Ok(QueryOutcome::NoDocuments);
        }

        let index = self.index(docs).await?;
        let result = self
            .generator
            .ask(&index, question, self.config.top_k)
            .await?;

        Ok(QueryOutcome::Answered(result))
    }

    /// 고정 심사 프롬프트로 답변을 받아 PDF 보고서 작성
    pub async fn report(&self, docs: &[Document], output: Option<&Path>) -> Result<ReportOutcome> {
        if docs.is_empty() {
            return Ok(ReportOutcome::NoDocuments);
        }

        let index = self.index(docs).await?;
        let result = self
            .generator
            .ask(&index, REPORT_PROMPT, self.config.top_k)
            .await?;

        let path = write_report(&result.answer, &result.citation_lines(), output).await?;
        Ok(ReportOutcome::Written { path, result })
    }

    /// 키워드 검색 (임베딩 호출 없음)
    pub async fn search(&self, docs: &[Document], keyword: &str) -> Result<SearchOutcome> {
        search_documents(docs, self.chunker.as_ref(), keyword).await
    }
}

/// 임베딩 없이 문서를 분할해 키워드 검색
pub async fn search_documents(
    docs: &[Document],
    chunker: &dyn Chunker,
    keyword: &str,
) -> Result<SearchOutcome> {
    if docs.is_empty() {
        return Ok(SearchOutcome::NoDocuments);
    }

    let segments = split_documents(docs, chunker).await?;
    Ok(search::search(&segments, keyword))
}

/// 문서를 세그먼트로 분할
pub async fn split_documents(docs: &[Document], chunker: &dyn Chunker) -> Result<Vec<Segment>> {
    let pages = load_documents(docs).await?;
    Ok(chunker.split_pages(&pages))
}

/// 경로 목록에서 문서 읽기 (순서 유지)
pub async fn read_documents(paths: &[PathBuf]) -> Result<Vec<Document>> {
    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        docs.push(Document::read(path).await?);
    }
    Ok(docs)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CannedModel, HashEmbedding};

    fn context() -> AppContext {
        AppContext::new(
            AppConfig::default(),
            Arc::new(HashEmbedding::new(32)),
            Arc::new(CannedModel::new("Insure.")),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_query_without_documents() {
        let outcome = context().query(&[], "What is the credit rating?").await.unwrap();
        assert!(matches!(outcome, QueryOutcome::NoDocuments));
        assert_eq!(outcome.to_string(), "Please upload at least one PDF file.");
    }

    #[tokio::test]
    async fn test_report_without_documents_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.pdf");

        let outcome = context().report(&[], Some(&output)).await.unwrap();
        assert!(matches!(outcome, ReportOutcome::NoDocuments));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_search_without_documents() {
        let outcome = context().search(&[], "par value").await.unwrap();
        assert_eq!(outcome, SearchOutcome::NoDocuments);
    }

    #[tokio::test]
    async fn test_search_over_cached_index_matches_fresh_split() {
        let ctx = context();
        let bytes = crate::report::render_report("The par value is $5,000,000.", &[]).unwrap();
        let docs = vec![Document::from_bytes(Path::new("bond.pdf"), bytes)];

        let index = ctx.index(&docs).await.unwrap();
        let cached = search::search(index.segments(), "PAR VALUE");
        let fresh = ctx.search(&docs, "PAR VALUE").await.unwrap();

        assert_eq!(cached, fresh);
        assert_eq!(cached.hits().len(), 1);
        assert_eq!(cached.hits()[0].page, Some(0));
    }

    #[tokio::test]
    async fn test_query_propagates_bad_pdf() {
        let docs = vec![Document::from_bytes(Path::new("bad.pdf"), b"not a pdf".to_vec())];
        assert!(context().query(&docs, "coupon?").await.is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AppConfig {
            chunk_overlap: 2000,
            ..AppConfig::default()
        };
        let result = AppContext::new(
            config,
            Arc::new(HashEmbedding::new(8)),
            Arc::new(CannedModel::new("")),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_read_documents_missing_file() {
        let result = read_documents(&[PathBuf::from("/no/such/official-statement.pdf")]).await;
        assert!(result.is_err());
    }
}
