//! 표준 Type1 폰트 메트릭
//!
//! PDF 기본 14 폰트 중 Helvetica / Helvetica-Bold의 AFM 글자 폭(1/1000 em)입니다.
//! 폰트를 임베드하지 않으므로 줄바꿈 계산은 이 표만으로 합니다.
//! ref: Adobe Core14 AFM (Helvetica.afm, Helvetica-Bold.afm)

/// 보고서에 쓰는 폰트
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Helvetica,
    HelveticaBold,
}

impl Font {
    /// PDF BaseFont 이름
    pub fn base_font(self) -> &'static str {
        match self {
            Font::Helvetica => "Helvetica",
            Font::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// 페이지 리소스 이름
    pub fn resource_name(self) -> &'static str {
        match self {
            Font::Helvetica => "F1",
            Font::HelveticaBold => "F2",
        }
    }

    /// 글자 폭 (1/1000 em)
    pub fn char_width(self, c: char) -> u16 {
        let (ascii, latin1) = match self {
            Font::Helvetica => (&HELVETICA_WIDTHS, &HELVETICA_LATIN1_WIDTHS),
            Font::HelveticaBold => (&HELVETICA_BOLD_WIDTHS, &HELVETICA_BOLD_LATIN1_WIDTHS),
        };

        match c {
            ' '..='~' => ascii[c as usize - 0x20],
            '\u{A0}'..='\u{FF}' => latin1[c as usize - 0xA0],
            '\u{2018}' | '\u{2019}' => match self {
                Font::Helvetica => 222,
                Font::HelveticaBold => 278,
            },
            '\u{201C}' | '\u{201D}' => match self {
                Font::Helvetica => 333,
                Font::HelveticaBold => 500,
            },
            '\u{2013}' => 556,
            '\u{2014}' | '\u{2026}' => 1000,
            '\u{2022}' => 350,
            _ => DEFAULT_WIDTH,
        }
    }
}

/// 표에 없는 글자의 폭
const DEFAULT_WIDTH: u16 = 556;

/// 문자열 폭 (pt)
pub fn string_width(text: &str, font: Font, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| font.char_width(c) as u32).sum();
    units as f32 * size / 1000.0
}

// 0x20 (space) ..= 0x7E (~)
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

// 0xA0 (nbsp) ..= 0xFF (ÿ), WinAnsi 코드 순서
#[rustfmt::skip]
const HELVETICA_LATIN1_WIDTHS: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

#[rustfmt::skip]
const HELVETICA_BOLD_LATIN1_WIDTHS: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_widths() {
        assert_eq!(Font::Helvetica.char_width(' '), 278);
        assert_eq!(Font::Helvetica.char_width('W'), 944);
        assert_eq!(Font::Helvetica.char_width('i'), 222);
        assert_eq!(Font::Helvetica.char_width('~'), 584);
        assert_eq!(Font::HelveticaBold.char_width('b'), 611);
        assert_eq!(Font::HelveticaBold.char_width('@'), 975);
        assert_eq!(Font::Helvetica.char_width('한'), 556);
    }

    #[test]
    fn test_latin1_widths() {
        assert_eq!(Font::Helvetica.char_width('\u{A0}'), 278);
        assert_eq!(Font::Helvetica.char_width('©'), 737);
        assert_eq!(Font::Helvetica.char_width('¼'), 834);
        assert_eq!(Font::Helvetica.char_width('Æ'), 1000);
        assert_eq!(Font::Helvetica.char_width('É'), 667);
        assert_eq!(Font::Helvetica.char_width('Ö'), 778);
        assert_eq!(Font::Helvetica.char_width('é'), 556);
        assert_eq!(Font::Helvetica.char_width('ÿ'), 500);
        assert_eq!(Font::HelveticaBold.char_width('Å'), 722);
        assert_eq!(Font::HelveticaBold.char_width('ö'), 611);
        assert_eq!(Font::HelveticaBold.char_width('ç'), 556);
    }

    #[test]
    fn test_string_width_scales_with_size() {
        // "Hi" = 722 + 222
        let w = string_width("Hi", Font::Helvetica, 10.0);
        assert!((w - 9.44).abs() < 1e-4);
        assert!((string_width("Hi", Font::Helvetica, 20.0) - 2.0 * w).abs() < 1e-4);
        assert_eq!(string_width("", Font::HelveticaBold, 16.0), 0.0);
    }
}
