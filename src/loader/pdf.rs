//! PDF 텍스트 추출 모듈
//!
//! lopdf로 페이지별 텍스트를 추출하고, 실패하거나 텍스트가 없으면
//! pdf-extract 전체 추출 결과를 페이지 구분자로 나누어 사용합니다.

use anyhow::{Context, Result};
use regex::Regex;

/// PDF 바이트에서 페이지별 텍스트 추출
///
/// (페이지 인덱스, 텍스트) 벡터를 반환합니다. 페이지 인덱스는 0부터 시작합니다.
/// 텍스트가 없는 페이지도 빈 문자열로 포함됩니다.
pub fn extract_pages(bytes: &[u8], name: &str) -> Result<Vec<(u32, String)>> {
    match extract_with_lopdf(bytes) {
        Ok(pages) if pages.iter().any(|(_, text)| !text.trim().is_empty()) => return Ok(pages),
        Ok(pages) => {
            tracing::debug!(
                "lopdf found no text in {} ({} pages), trying pdf-extract",
                name,
                pages.len()
            );
        }
        Err(e) => {
            tracing::debug!("lopdf failed on {}: {:#}, trying pdf-extract", name, e);
        }
    }

    let text = pdf_extract::extract_text_from_mem(bytes)
        .with_context(|| format!("Failed to extract text from PDF: {}", name))?;

    if text.trim().is_empty() {
        tracing::warn!(
            "No text extracted from PDF: {}. It might be a scanned document.",
            name
        );
        return Ok(vec![(0, String::new())]);
    }

    Ok(split_pdf_pages(&text)
        .into_iter()
        .enumerate()
        .map(|(i, text)| (i as u32, text))
        .collect())
}

/// lopdf 페이지별 추출
fn extract_with_lopdf(bytes: &[u8]) -> Result<Vec<(u32, String)>> {
    let doc = lopdf::Document::load_mem(bytes).context("Failed to load PDF")?;

    let mut pages = Vec::new();
    for page_number in doc.get_pages().keys() {
        let text = match doc.extract_text(&[*page_number]) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!("Could not extract text of page {}: {}", page_number, e);
                String::new()
            }
        };
        pages.push((page_number.saturating_sub(1), text));
    }

    Ok(pages)
}

/// PDF 텍스트를 페이지별로 분리
fn split_pdf_pages(text: &str) -> Vec<String> {
    // 폼피드 문자 (\x0c)로 페이지 분리 시도
    let pages: Vec<String> = text
        .split('\x0c')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if pages.len() > 1 {
        return pages;
    }

    // 페이지 구분자 패턴으로 시도 (예: "--- Page 1 ---")
    let page_pattern = Regex::new(r"(?m)^[\s]*[-=]+[\s]*(?:Page[\s]*)?(\d+)[\s]*[-=]+[\s]*$")
        .expect("Invalid regex");

    if page_pattern.is_match(text) {
        let pages: Vec<String> = page_pattern
            .split(text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if pages.len() > 1 {
            return pages;
        }
    }

    // 분리 실패 - 전체를 하나의 페이지로
    vec![text.to_string()]
}

// ============================================================================
// Tests
// ============================================================================
