//! 키워드 검색 모듈
//!
//! 임베딩 없이 세그먼트 텍스트에서 키워드를 대소문자 구분 없이 찾아
//! 주변 문맥(앞뒤 60자)을 스니펫으로 반환합니다.
//!
//! 세그먼트당 첫 번째 일치만 보고합니다.

use std::fmt;

use serde::Serialize;

use crate::knowledge::{page_label, Segment};

/// 스니펫 반경 (문자 수)
pub const SNIPPET_RADIUS: usize = 60;

/// 문서 미업로드 메시지
pub const NO_DOCUMENTS_MESSAGE: &str = "Please upload at least one PDF file.";

/// 일치 없음 메시지
pub const NO_MATCHES_MESSAGE: &str = "No matches found.";

// ============================================================================
// Types
// ============================================================================

/// 키워드 일치 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// 페이지 번호
    pub page: Option<u32>,
    /// 원본 파일명
    pub filename: String,
    /// 일치 위치 주변 텍스트
    pub snippet: String,
}

impl fmt::Display for SearchHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page {}: ...{}...", page_label(self.page), self.snippet)
    }
}

/// 검색 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SearchOutcome {
    /// 검색할 문서가 없음
    NoDocuments,
    /// 일치 없음
    NoMatches,
    /// 일치 목록 (세그먼트 순서)
    Matches(Vec<SearchHit>),
}

impl SearchOutcome {
    pub fn hits(&self) -> &[SearchHit] {
        match self {
            SearchOutcome::Matches(hits) => hits,
            _ => &[],
        }
    }
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchOutcome::NoDocuments => f.write_str(NO_DOCUMENTS_MESSAGE),
            SearchOutcome::NoMatches => f.write_str(NO_MATCHES_MESSAGE),
            SearchOutcome::Matches(hits) => {
                for (i, hit) in hits.iter().enumerate() {
                    if i > 0 {
                        f.write_str("\n\n")?;
                    }
                    write!(f, "{}", hit)?;
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// Search
// ============================================================================

/// 세그먼트에서 키워드 검색
pub fn search(segments: &[Segment], keyword: &str) -> SearchOutcome {
    if keyword.trim().is_empty() {
        return SearchOutcome::NoMatches;
    }

    let needle: Vec<char> = keyword.chars().flat_map(char::to_lowercase).collect();

    let hits: Vec<SearchHit> = segments
        .iter()
        .filter_map(|segment| {
            let chars: Vec<char> = segment.text.chars().collect();
            let idx = find_case_insensitive(&chars, &needle)?;

            let start = idx.saturating_sub(SNIPPET_RADIUS);
            let end = (idx + SNIPPET_RADIUS).min(chars.len());
            let snippet: String = chars[start..end]
                .iter()
                .map(|&c| if c == '\n' { ' ' } else { c })
                .collect();

            Some(SearchHit {
                page: segment.page,
                filename: segment.filename.clone(),
                snippet,
            })
        })
        .collect();

    tracing::debug!(
        "Keyword search: {} hits in {} segments",
        hits.len(),
        segments.len()
    );

    if hits.is_empty() {
        SearchOutcome::NoMatches
    } else {
        SearchOutcome::Matches(hits)
    }
}

/// 소문자 비교로 첫 일치 위치(원문 문자 인덱스) 찾기
fn find_case_insensitive(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }

    // 소문자 변환 시 길이가 바뀌는 문자가 있어 원문 인덱스를 따로 기록
    let mut lowered = Vec::with_capacity(haystack.len());
    let mut origin = Vec::with_capacity(haystack.len());
    for (i, c) in haystack.iter().enumerate() {
        for l in c.to_lowercase() {
            lowered.push(l);
            origin.push(i);
        }
    }

    lowered
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| origin[p])
}

// ============================================================================
// Tests
// ============================================================================
