//! Text Chunking Module
//!
//! 페이지 텍스트를 고정 크기 슬라이딩 윈도우로 분할합니다.
//! 각 세그먼트는 이전 세그먼트와 `overlap_characters` 만큼 겹치며,
//! 페이지 번호와 파일명 메타데이터를 그대로 물려받습니다.

use anyhow::{bail, Result};
use serde::Serialize;

use crate::loader::Page;

// ============================================================================
// Chunk Configuration
// ============================================================================

/// 청킹 설정
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// 최대 청크 크기 (문자 수)
    pub max_characters: usize,
    /// 오버랩 크기 (문자 수)
    pub overlap_characters: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_characters: 2000,
            overlap_characters: 200,
        }
    }
}

impl ChunkConfig {
    /// 오버랩 없는 설정
    pub fn without_overlap(max_characters: usize) -> Self {
        Self {
            max_characters,
            overlap_characters: 0,
        }
    }

    /// 설정 검증 (0 < overlap < max 조건)
    pub fn validate(&self) -> Result<()> {
        if self.max_characters == 0 {
            bail!("chunk size must be greater than 0");
        }
        if self.overlap_characters >= self.max_characters {
            bail!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.overlap_characters,
                self.max_characters
            );
        }
        Ok(())
    }

    /// 윈도우 이동 폭 (L - O)
    #[inline]
    fn stride(&self) -> usize {
        self.max_characters.saturating_sub(self.overlap_characters).max(1)
    }
}

// ============================================================================
// Segment
// ============================================================================

/// 페이지 텍스트의 부분 문자열 (검색 단위)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    /// 세그먼트 텍스트
    pub text: String,
    /// 원본 페이지 번호 (0부터 시작)
    pub page: Option<u32>,
    /// 원본 파일명
    pub filename: String,
    /// 페이지 내 세그먼트 순번 (0-based)
    pub chunk_index: usize,
    /// 페이지 텍스트 내 시작 위치 (문자 단위)
    pub start_char: usize,
}

impl Segment {
    /// 표시용 페이지 라벨 (페이지 정보 없으면 "N/A")
    pub fn page_label(&self) -> String {
        page_label(self.page)
    }
}

/// 페이지 번호 표시 문자열
pub fn page_label(page: Option<u32>) -> String {
    page.map(|p| p.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

// ============================================================================
// Chunker Trait
// ============================================================================

/// 텍스트 청킹 전략 트레이트
pub trait Chunker: Send + Sync {
    /// 텍스트를 청크로 분할
    fn chunk(&self, text: &str) -> Vec<String>;

    /// 청커 이름
    fn name(&self) -> &'static str;

    /// 페이지 목록을 세그먼트로 분할 (문서/페이지/오프셋 순서 유지)
    fn split_pages(&self, pages: &[Page]) -> Vec<Segment>;
}

// ============================================================================
// SlidingWindowChunker
// ============================================================================

/// 고정 크기 슬라이딩 윈도우 청커
///
/// 윈도우 크기 L, 오버랩 O 일 때 시작 위치를 (L - O)씩 이동합니다.
/// 마지막 세그먼트만 L보다 짧을 수 있습니다.
pub struct SlidingWindowChunker {
    config: ChunkConfig,
}

impl SlidingWindowChunker {
    /// 설정으로 생성
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    /// 기본 설정으로 생성
    pub fn with_defaults() -> Self {
        Self::new(ChunkConfig::default())
    }

    /// 설정 참조
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// (시작 문자 위치, 청크) 목록 반환
    fn windows(&self, text: &str) -> Vec<(usize, String)> {
        if text.trim().is_empty() {
            return vec![];
        }

        // 문자 경계의 바이트 오프셋 (마지막에 text.len() 추가)
        let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        let char_count = bounds.len();
        bounds.push(text.len());

        let max = self.config.max_characters.max(1);
        let stride = self.config.stride();

        let mut windows = Vec::with_capacity(char_count / stride + 1);
        let mut start = 0;

        loop {
            let end = (start + max).min(char_count);
            windows.push((start, text[bounds[start]..bounds[end]].to_string()));

            if end >= char_count {
                break;
            }
            start += stride;
        }

        windows
    }
}

impl Chunker for SlidingWindowChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        self.windows(text).into_iter().map(|(_, c)| c).collect()
    }

    fn name(&self) -> &'static str {
        "SlidingWindowChunker"
    }

    fn split_pages(&self, pages: &[Page]) -> Vec<Segment> {
        let mut segments = Vec::new();

        for page in pages {
            for (chunk_index, (start_char, text)) in self.windows(&page.text).into_iter().enumerate()
            {
                segments.push(Segment {
                    text,
                    page: page.page,
                    filename: page.filename.clone(),
                    chunk_index,
                    start_char,
                });
            }
        }

        tracing::debug!(
            "{}: {} pages -> {} segments",
            self.name(),
            pages.len(),
            segments.len()
        );

        segments
    }
}

// ============================================================================
// Factory Functions
// ============================================================================

/// 기본 청커 생성
pub fn default_chunker() -> Box<dyn Chunker> {
    Box::new(SlidingWindowChunker::with_defaults())
}

/// 설정을 지정하여 청커 생성
pub fn sliding_window_chunker(config: ChunkConfig) -> Box<dyn Chunker> {
    Box::new(SlidingWindowChunker::new(config))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn page(text: &str, page: u32) -> Page {
        Page {
            text: text.to_string(),
            page: Some(page),
            filename: "bond.pdf".to_string(),
        }
    }

    /// 오버랩을 제거하고 이어붙여 원문 복원
    fn reconstruct(chunks: &[String], overlap: usize) -> String {
        let mut out = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                out.push_str(chunk);
            } else {
                out.extend(chunk.chars().skip(overlap));
            }
        }
        out
    }

    #[test]
    fn test_chunker_empty() {
        let chunker = SlidingWindowChunker::with_defaults();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n\t ").is_empty());
    }

    #[test]
    fn test_short_text_single_segment() {
        let chunker = SlidingWindowChunker::with_defaults();
        let chunks = chunker.chunk("The par value is $5,000,000.");
        assert_eq!(chunks, vec!["The par value is $5,000,000.".to_string()]);
    }

    #[test]
    fn test_exact_length_single_segment() {
        let chunker = SlidingWindowChunker::with_defaults();
        let text = "x".repeat(2000);
        assert_eq!(chunker.chunk(&text).len(), 1);
    }

    #[test]
    fn test_2500_chars_two_segments() {
        let chunker = SlidingWindowChunker::new(ChunkConfig {
            max_characters: 2000,
            overlap_characters: 200,
        });
        let text: String = (0..2500).map(|i| (b'a' + (i % 26) as u8) as char).collect();

        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 2000);
        assert_eq!(chunks[1].chars().count(), 700);
    }

    #[test]
    fn test_overlap_and_reconstruction() {
        let config = ChunkConfig {
            max_characters: 10,
            overlap_characters: 3,
        };
        let chunker = SlidingWindowChunker::new(config);
        let text = "abcdefghijklmnopqrstuvwxyz0123456789";

        let chunks = chunker.chunk(text);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 10);
        }
        for pair in chunks.windows(2) {
            let prev_tail: String = pair[0].chars().skip(pair[0].chars().count() - 3).collect();
            let next_head: String = pair[1].chars().take(3).collect();
            assert_eq!(prev_tail, next_head);
        }
        assert_eq!(reconstruct(&chunks, 3), text);
    }

    #[test]
    fn test_unicode_is_split_on_char_boundaries() {
        let chunker = SlidingWindowChunker::new(ChunkConfig {
            max_characters: 4,
            overlap_characters: 1,
        });
        let text = "채권보험심사보고서";

        let chunks = chunker.chunk(text);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
        assert_eq!(reconstruct(&chunks, 1), text);
    }

    #[test]
    fn test_no_overlap() {
        let chunker = SlidingWindowChunker::new(ChunkConfig::without_overlap(4));
        let chunks = chunker.chunk("abcdefgh");
        assert_eq!(chunks, vec!["abcd".to_string(), "efgh".to_string()]);
    }

    #[test]
    fn test_split_pages_keeps_metadata_and_order() {
        let chunker = SlidingWindowChunker::new(ChunkConfig {
            max_characters: 5,
            overlap_characters: 1,
        });
        let pages = vec![page("abcdefgh", 0), page("", 1), page("xyz", 2)];

        let segments = chunker.split_pages(&pages);
        assert_eq!(segments.len(), 3);

        assert_eq!(segments[0].text, "abcde");
        assert_eq!(segments[0].page, Some(0));
        assert_eq!(segments[0].start_char, 0);

        assert_eq!(segments[1].text, "efgh");
        assert_eq!(segments[1].chunk_index, 1);
        assert_eq!(segments[1].start_char, 4);

        assert_eq!(segments[2].text, "xyz");
        assert_eq!(segments[2].page, Some(2));
        assert_eq!(segments[2].filename, "bond.pdf");
    }

    #[test]
    fn test_config_validation() {
        assert!(ChunkConfig::default().validate().is_ok());
        assert!(ChunkConfig::without_overlap(10).validate().is_ok());
        assert!(ChunkConfig {
            max_characters: 100,
            overlap_characters: 100,
        }
        .validate()
        .is_err());
        assert!(ChunkConfig::without_overlap(0).validate().is_err());
    }

    #[test]
    fn test_page_label() {
        assert_eq!(page_label(Some(3)), "3");
        assert_eq!(page_label(None), "N/A");
    }
}
