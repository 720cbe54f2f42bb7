//! 실사 보고서 PDF 생성
//!
//! 모델 답변과 인용을 A4 PDF로 렌더링합니다.
//! 배치는 `layout`에서 계산하고 여기서는 lopdf 객체로 직렬화만 합니다.
//! 폰트는 임베드하지 않고 표준 Helvetica 계열을 WinAnsiEncoding으로 참조합니다.

mod layout;
mod metrics;
mod prompt;

pub use layout::{
    layout_report, usable_width, wrap_text, PageLayout, TextRun, BOTTOM_LIMIT, CITATIONS_HEADING,
    LEFT_MARGIN, PAGE_HEIGHT, PAGE_WIDTH, REPORT_TITLE, TOP_OFFSET,
};
pub use metrics::{string_width, Font};
pub use prompt::REPORT_PROMPT;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

// ============================================================================
// Rendering
// ============================================================================

/// 보고서 PDF 바이트 생성
pub fn render_report(report_text: &str, citations: &[String]) -> Result<Vec<u8>> {
    let pages = layout_report(report_text, citations);
    let mut doc = build_document(&pages)?;

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .context("Failed to serialize report PDF")?;

    tracing::debug!(
        "Rendered report: {} pages, {} citations, {} bytes",
        pages.len(),
        citations.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// 보고서를 파일로 저장하고 경로 반환
///
/// `output`이 없으면 `.pdf` 임시 파일을 만들어 남겨 둡니다 (삭제는 호출자 몫).
pub async fn write_report(
    report_text: &str,
    citations: &[String],
    output: Option<&Path>,
) -> Result<PathBuf> {
    let bytes = render_report(report_text, citations)?;

    let path = match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create directory: {:?}", parent))?;
            }
            path.to_path_buf()
        }
        None => {
            let temp = tempfile::Builder::new()
                .prefix("bond-report-")
                .suffix(".pdf")
                .tempfile()
                .context("Failed to create temporary report file")?;
            let (_file, path) = temp.keep().context("Failed to keep temporary report file")?;
            path
        }
    };

    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("Failed to write report: {:?}", path))?;

    tracing::info!("Report written to {:?}", path);
    Ok(path)
}

/// 레이아웃을 lopdf 문서로 변환
fn build_document(pages: &[PageLayout]) -> Result<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = font_object(&mut doc, Font::Helvetica);
    let bold = font_object(&mut doc, Font::HelveticaBold);
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            Font::Helvetica.resource_name() => regular,
            Font::HelveticaBold.resource_name() => bold,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let content = Content {
            operations: page_operations(page),
        };
        let encoded = content.encode().context("Failed to encode page content")?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(PAGE_WIDTH.into()),
                Object::Real(PAGE_HEIGHT.into()),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(REPORT_TITLE),
        "Producer" => Object::string_literal(concat!("bond-insights ", env!("CARGO_PKG_VERSION"))),
        "CreationDate" => Object::string_literal(
            chrono::Local::now().format("D:%Y%m%d%H%M%S").to_string(),
        ),
    });
    doc.trailer.set("Info", info_id);

    doc.compress();
    Ok(doc)
}

fn font_object(doc: &mut Document, font: Font) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_font(),
        "Encoding" => "WinAnsiEncoding",
    })
}

fn page_operations(page: &PageLayout) -> Vec<Operation> {
    let mut ops = Vec::with_capacity(page.runs.len() * 5);

    for run in &page.runs {
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![run.font.resource_name().into(), Object::Real(run.size.into())],
        ));
        ops.push(Operation::new(
            "Td",
            vec![Object::Real(run.x.into()), Object::Real(run.y.into())],
        ));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(
                encode_win_ansi(&run.text),
                StringFormat::Literal,
            )],
        ));
        ops.push(Operation::new("ET", vec![]));
    }

    ops
}

/// WinAnsiEncoding 바이트로 변환 (표현할 수 없는 글자는 '?')
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' | '\u{A0}'..='\u{FF}' => c as u8,
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2122}' => 0x99,
            _ => b'?',
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
