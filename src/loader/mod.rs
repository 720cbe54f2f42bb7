//! 문서 로더 모듈
//!
//! 업로드된 PDF 파일을 읽어 페이지 단위 `Page` 객체로 변환합니다.
//! 페이지 번호는 0부터 시작하며, 각 페이지에 원본 파일명이 붙습니다.

pub mod pdf;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

// ============================================================================
// Types
// ============================================================================

/// 업로드된 PDF 문서 (요청 동안만 유지)
#[derive(Debug, Clone)]
pub struct Document {
    /// 파일명 (경로 제외)
    pub filename: String,
    /// 원본 경로
    pub path: PathBuf,
    /// PDF 원본 바이트
    pub bytes: Vec<u8>,
}

impl Document {
    /// 파일에서 문서 읽기
    pub async fn read(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read PDF: {:?}", path))?;

        Ok(Self::from_bytes(path, bytes))
    }

    /// 메모리 바이트로 문서 생성
    pub fn from_bytes(path: &Path, bytes: Vec<u8>) -> Self {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Self {
            filename,
            path: path.to_path_buf(),
            bytes,
        }
    }
}

/// 추출된 페이지
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// 페이지 텍스트
    pub text: String,
    /// 페이지 번호 (0부터 시작, 알 수 없으면 None)
    pub page: Option<u32>,
    /// 원본 파일명
    pub filename: String,
}

// ============================================================================
// Loader
// ============================================================================

/// 문서에서 페이지 목록 추출
///
/// PDF 파싱은 CPU 바운드이므로 spawn_blocking에서 실행합니다.
pub async fn load_document(doc: &Document) -> Result<Vec<Page>> {
    let bytes = doc.bytes.clone();
    let filename = doc.filename.clone();

    let pages = tokio::task::spawn_blocking(move || load_pages(&bytes, &filename))
        .await
        .context("PDF extraction task failed")??;

    tracing::debug!("Loaded {} pages from {}", pages.len(), doc.filename);
    Ok(pages)
}

/// 여러 문서를 순서대로 로드
pub async fn load_documents(docs: &[Document]) -> Result<Vec<Page>> {
    let mut pages = Vec::new();
    for doc in docs {
        pages.extend(load_document(doc).await?);
    }

    tracing::info!("Loaded {} pages from {} documents", pages.len(), docs.len());
    Ok(pages)
}

/// PDF 바이트에서 페이지 추출 (동기)
pub fn load_pages(bytes: &[u8], filename: &str) -> Result<Vec<Page>> {
    let pages = pdf::extract_pages(bytes, filename)?;

    Ok(pages
        .into_iter()
        .map(|(page, text)| Page {
            text,
            page: Some(page),
            filename: filename.to_string(),
        })
        .collect())
}

// ============================================================================
// Tests
// ============================================================================
