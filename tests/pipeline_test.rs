//! PDF → 세그먼트 → 검색/질의응답/보고서 전체 흐름 테스트
//!
//! 입력 PDF는 보고서 렌더러로 만들고, 임베딩/언어 모델은 결정적 구현으로 대체합니다.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use bond_insights::app::search_documents;
use bond_insights::report::layout_report;
use bond_insights::{
    default_chunker, render_report, AppConfig, AppContext, Document, EmbeddingProvider,
    LanguageModel, Page, QueryOutcome, ReportOutcome, SearchOutcome,
};

/// 단어 길이 분포 임베딩
struct WordShapeEmbedding;

#[async_trait]
impl EmbeddingProvider for WordShapeEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0; 16];
        for word in text.split_whitespace() {
            vector[word.chars().count().min(15)] += 1.0;
        }
        vector[0] += 0.01;
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        16
    }

    fn name(&self) -> &str {
        "word-shape"
    }
}

/// 받은 프롬프트 길이를 답하는 모델
struct PromptLengthModel;

#[async_trait]
impl LanguageModel for PromptLengthModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(format!("Insure. Reviewed {} characters of context.", prompt.len()))
    }

    fn name(&self) -> &str {
        "prompt-length"
    }
}

fn context() -> AppContext {
    AppContext::new(
        AppConfig::default(),
        Arc::new(WordShapeEmbedding),
        Arc::new(PromptLengthModel),
    )
    .unwrap()
}

fn pdf(name: &str, body: &str) -> Document {
    let bytes = render_report(body, &[]).unwrap();
    Document::from_bytes(Path::new(name), bytes)
}

#[tokio::test]
async fn test_keyword_search_on_single_page_pdf() {
    let docs = vec![pdf("bond.pdf", "The par value is $5,000,000.")];

    let outcome = context().search(&docs, "par value").await.unwrap();
    let rendered = outcome.to_string();

    assert!(rendered.contains("Page 0: ..."));
    assert!(rendered.contains("par value is $5,000,000"));
}

#[tokio::test]
async fn test_query_without_documents() {
    let outcome = context()
        .query(&[], "What is the credit rating of this bond?")
        .await
        .unwrap();
    assert_eq!(outcome.to_string(), "Please upload at least one PDF file.");
}

#[test]
fn test_long_page_splits_into_two_segments() {
    let page = Page {
        text: "x".repeat(2500),
        page: Some(0),
        filename: "long.pdf".to_string(),
    };

    let segments = default_chunker().split_pages(&[page]);
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].text.chars().count(), 2000);
    assert_eq!(segments[1].start_char, 1800);
    assert_eq!(segments[1].text.chars().count(), 700);
}

#[tokio::test]
async fn test_search_reports_zero_based_page_numbers() {
    let body = (0..150)
        .map(|i| format!("Finding {}: revenue pledge remains adequate.", i))
        .collect::<Vec<_>>()
        .join("\n");

    let expected_page = layout_report(&body, &[])
        .iter()
        .position(|p| p.runs.iter().any(|r| r.text.starts_with("Finding 120:")))
        .unwrap();
    assert!(expected_page > 0);

    let docs = vec![pdf("multi.pdf", &body)];
    let outcome = context().search(&docs, "finding 120:").await.unwrap();

    // 겹침 구간에 걸리면 같은 페이지의 두 세그먼트가 모두 일치할 수 있음
    let hits = outcome.hits();
    assert!(!hits.is_empty());
    for hit in hits {
        assert_eq!(hit.page, Some(expected_page as u32));
        assert_eq!(hit.filename, "multi.pdf");
    }
}

#[tokio::test]
async fn test_search_across_documents_keeps_order() {
    let docs = vec![
        pdf("a.pdf", "Series 2023A water revenue bonds."),
        pdf("b.pdf", "Series 2024B sewer revenue bonds."),
    ];
    let chunker = default_chunker();

    let outcome = search_documents(&docs, chunker.as_ref(), "REVENUE")
        .await
        .unwrap();
    let files: Vec<&str> = outcome.hits().iter().map(|h| h.filename.as_str()).collect();
    assert_eq!(files, vec!["a.pdf", "b.pdf"]);

    let none = search_documents(&docs, chunker.as_ref(), "tollway")
        .await
        .unwrap();
    assert_eq!(none, SearchOutcome::NoMatches);
}

#[tokio::test]
async fn test_query_answers_with_citations_and_reuses_index() {
    let ctx = context();
    let docs = vec![pdf("bond.pdf", "The par value is $5,000,000.\nMoody's rating: Baa3.")];

    let first = ctx.query(&docs, "What is the par value?").await.unwrap();
    let result = match first {
        QueryOutcome::Answered(result) => result,
        QueryOutcome::NoDocuments => panic!("documents were supplied"),
    };

    assert!(result.answer.starts_with("Insure."));
    assert!(!result.citations.is_empty());
    assert!(result.citations.len() <= ctx.config().top_k);
    assert!(result.citation_lines()[0].starts_with("Page 0: "));

    ctx.query(&docs, "What is the rating?").await.unwrap();
    assert_eq!(ctx.cache().len().await, 1);
}

#[tokio::test]
async fn test_report_written_and_readable() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("bam-report.pdf");
    let docs = vec![pdf("bond.pdf", "General obligation bonds, tax-exempt, Series 2024.")];

    let outcome = context().report(&docs, Some(&output)).await.unwrap();
    let path = match outcome {
        ReportOutcome::Written { path, .. } => path,
        ReportOutcome::NoDocuments => panic!("documents were supplied"),
    };
    assert_eq!(path, output);

    let written = lopdf::Document::load(&path).unwrap();
    let text = written.extract_text(&[1]).unwrap();
    assert!(text.contains("Bond Due Diligence Report"));
    assert!(text.contains("Insure."));
    assert!(text.contains("Citations"));
}
