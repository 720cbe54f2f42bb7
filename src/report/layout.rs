//! 보고서 페이지 레이아웃
//!
//! 본문과 인용을 A4 페이지에 배치한 결과를 페이지별 텍스트 런 목록으로 계산합니다.
//! PDF 직렬화와 분리되어 있어 좌표만으로 검증할 수 있습니다.

use super::metrics::{string_width, Font};

/// A4 폭 (pt)
pub const PAGE_WIDTH: f32 = 595.2756;
/// A4 높이 (pt)
pub const PAGE_HEIGHT: f32 = 841.8898;

pub const LEFT_MARGIN: f32 = 40.0;
pub const RIGHT_MARGIN: f32 = 40.0;
/// 페이지 상단에서 첫 줄까지 거리
pub const TOP_OFFSET: f32 = 50.0;
/// 이 높이보다 내려가면 새 페이지
pub const BOTTOM_LIMIT: f32 = 60.0;

pub const REPORT_TITLE: &str = "Bond Due Diligence Report";
pub const CITATIONS_HEADING: &str = "Citations";

/// 블록 스타일 (폰트, 크기, 줄 간격, 블록 뒤 간격)
#[derive(Debug, Clone, Copy)]
struct Style {
    font: Font,
    size: f32,
    line_step: f32,
    block_gap: f32,
}

const TITLE: Style = Style {
    font: Font::HelveticaBold,
    size: 16.0,
    line_step: 32.0,
    block_gap: 0.0,
};

const BODY: Style = Style {
    font: Font::Helvetica,
    size: 11.0,
    line_step: 15.0,
    block_gap: 2.0,
};

/// 본문과 인용 제목 사이 간격
const SECTION_GAP: f32 = 10.0;

const HEADING: Style = Style {
    font: Font::HelveticaBold,
    size: 13.0,
    line_step: 20.0,
    block_gap: 0.0,
};

const CITATION: Style = Style {
    font: Font::Helvetica,
    size: 9.0,
    line_step: 12.0,
    block_gap: 8.0,
};

/// 사용 가능한 줄 폭
pub fn usable_width() -> f32 {
    PAGE_WIDTH - LEFT_MARGIN - RIGHT_MARGIN
}

// ============================================================================
// Types
// ============================================================================

/// 한 줄 텍스트 출력 명령
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub font: Font,
    pub size: f32,
    pub x: f32,
    /// 베이스라인 y (페이지 하단 기준)
    pub y: f32,
    pub text: String,
}

/// 페이지 하나의 출력 명령
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub runs: Vec<TextRun>,
}

// ============================================================================
// Wrapping
// ============================================================================

/// 단어 단위 greedy 줄바꿈
///
/// 한 단어가 폭보다 길면 그 단어만 한 줄에 두고 넘치게 둡니다.
/// 공백뿐인 입력은 빈 목록을 반환합니다.
pub fn wrap_text(text: &str, width: f32, font: Font, size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{} {}", current, word);
        if string_width(&candidate, font, size) <= width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// ============================================================================
// Page Layout
// ============================================================================

/// 커서 기반 페이지 배치기
struct PageCursor {
    pages: Vec<PageLayout>,
    y: f32,
}

impl PageCursor {
    fn new() -> Self {
        Self {
            pages: vec![PageLayout::default()],
            y: PAGE_HEIGHT - TOP_OFFSET,
        }
    }

    fn break_page(&mut self) {
        self.pages.push(PageLayout::default());
        self.y = PAGE_HEIGHT - TOP_OFFSET;
    }

    /// 현재 위치에 한 줄 출력
    fn draw(&mut self, style: Style, text: &str) {
        // 블록 간격만으로 하단을 넘은 경우
        if self.y < BOTTOM_LIMIT {
            self.break_page();
        }

        let run = TextRun {
            font: style.font,
            size: style.size,
            x: LEFT_MARGIN,
            y: self.y,
            text: text.to_string(),
        };
        if let Some(page) = self.pages.last_mut() {
            page.runs.push(run);
        }
    }

    /// 제목 한 줄 (페이지 넘김 없음)
    fn heading(&mut self, style: Style, text: &str) {
        self.draw(style, text);
        self.y -= style.line_step;
    }

    /// 줄바꿈된 블록 출력, 줄마다 하단 검사
    fn block(&mut self, style: Style, text: &str) {
        for line in text.split('\n') {
            for wrapped in wrap_text(line, usable_width(), style.font, style.size) {
                self.draw(style, &wrapped);
                self.y -= style.line_step;
                if self.y < BOTTOM_LIMIT {
                    self.break_page();
                }
            }
        }
    }

    fn finish(mut self) -> Vec<PageLayout> {
        while self.pages.len() > 1 && self.pages.last().is_some_and(|p| p.runs.is_empty()) {
            self.pages.pop();
        }
        self.pages
    }
}

/// 보고서 본문과 인용을 페이지별로 배치
pub fn layout_report(report_text: &str, citations: &[String]) -> Vec<PageLayout> {
    let mut cursor = PageCursor::new();

    cursor.heading(TITLE, REPORT_TITLE);

    for line in report_text.split('\n') {
        cursor.block(BODY, line);
        cursor.y -= BODY.block_gap;
    }

    cursor.y -= SECTION_GAP;
    cursor.heading(HEADING, CITATIONS_HEADING);

    for citation in citations {
        cursor.block(CITATION, citation);
        cursor.y -= CITATION.block_gap;
    }

    cursor.finish()
}

// ============================================================================
// Tests
// ============================================================================
