//! CLI 모듈
//!
//! bond-insights CLI 명령어 정의 및 구현

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::app::{read_documents, search_documents, AppContext, QueryOutcome, ReportOutcome};
use crate::collector::FileCollector;
use crate::config::AppConfig;
use crate::gemini::has_api_key;
use crate::knowledge::sliding_window_chunker;
use crate::loader::Document;
use crate::qa::QaResult;
use crate::search::{self, NO_DOCUMENTS_MESSAGE};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "bond-insights")]
#[command(version, about = "채권 공시 PDF 질의응답 및 실사 보고서 생성", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 입력 PDF 지정
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// PDF 파일 경로 (여러 번 지정 가능)
    #[arg(short, long = "file")]
    pub files: Vec<PathBuf>,

    /// PDF 폴더 경로 (재귀)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 문서에 대해 질문
    Ask {
        #[command(flatten)]
        sources: SourceArgs,

        /// 답변에 사용할 세그먼트 수
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// 질문
        question: String,
    },

    /// 지방채 보험 심사 보고서 PDF 생성
    Report {
        #[command(flatten)]
        sources: SourceArgs,

        /// 저장 경로 (기본: 임시 파일)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 키워드 검색
    Search {
        #[command(flatten)]
        sources: SourceArgs,

        /// 검색할 키워드 또는 구문
        keyword: String,
    },

    /// 대화형 모드 (인덱스를 한 번만 구축)
    Shell {
        #[command(flatten)]
        sources: SourceArgs,

        /// 답변에 사용할 세그먼트 수
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ask {
            sources,
            top_k,
            question,
        } => cmd_ask(&sources, top_k, &question).await,
        Commands::Report { sources, output } => cmd_report(&sources, output).await,
        Commands::Search { sources, keyword } => cmd_search(&sources, &keyword).await,
        Commands::Shell { sources, top_k } => cmd_shell(&sources, top_k).await,
        Commands::Status => cmd_status().await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 질문 명령어 (ask)
async fn cmd_ask(sources: &SourceArgs, top_k: Option<usize>, question: &str) -> Result<()> {
    let docs = collect_documents(sources).await?;
    if docs.is_empty() {
        println!("{}", NO_DOCUMENTS_MESSAGE);
        return Ok(());
    }

    let ctx = AppContext::from_env(load_config(top_k)?)?;
    ask(&ctx, &docs, question).await
}

/// 보고서 명령어 (report)
async fn cmd_report(sources: &SourceArgs, output: Option<PathBuf>) -> Result<()> {
    let docs = collect_documents(sources).await?;
    if docs.is_empty() {
        println!("{}", NO_DOCUMENTS_MESSAGE);
        return Ok(());
    }

    let ctx = AppContext::from_env(load_config(None)?)?;
    report(&ctx, &docs, output).await
}

/// 검색 명령어 (search)
///
/// 임베딩을 쓰지 않으므로 API 키 없이 동작합니다.
async fn cmd_search(sources: &SourceArgs, keyword: &str) -> Result<()> {
    let config = load_config(None)?;
    let docs = collect_documents(sources).await?;

    let chunker = sliding_window_chunker(config.chunk_config());
    let outcome = search_documents(&docs, chunker.as_ref(), keyword).await?;

    println!("{}", outcome);
    Ok(())
}

/// 대화형 명령어 (shell)
async fn cmd_shell(sources: &SourceArgs, top_k: Option<usize>) -> Result<()> {
    let docs = collect_documents(sources).await?;
    if docs.is_empty() {
        println!("{}", NO_DOCUMENTS_MESSAGE);
        return Ok(());
    }

    let ctx = AppContext::from_env(load_config(top_k)?)?;

    println!("[*] 인덱스 구축 중...");
    let index = ctx.index(&docs).await?;
    println!("[OK] {} 세그먼트 준비 완료", index.len());
    println!("    명령: ask <질문> | search <키워드> | report [경로] | help | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("bond> ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await.context("stdin 읽기 실패")? else {
            break;
        };

        // 명령 하나가 실패해도 셸은 계속
        let result = match ShellCommand::parse(&line) {
            ShellCommand::Empty => Ok(()),
            ShellCommand::Quit => break,
            ShellCommand::Help => {
                println!("    ask <질문> | search <키워드> | report [경로] | quit");
                Ok(())
            }
            ShellCommand::Ask(question) => ask(&ctx, &docs, &question).await,
            // 이미 구축된 인덱스의 세그먼트를 재사용 (PDF 재파싱 없음)
            ShellCommand::Search(keyword) => {
                println!("{}", search::search(index.segments(), &keyword));
                Ok(())
            }
            ShellCommand::Report(output) => report(&ctx, &docs, output).await,
            ShellCommand::Unknown(cmd) => {
                println!("[!] 알 수 없는 명령: {} (help 참고)", cmd);
                Ok(())
            }
        };

        if let Err(e) = result {
            println!("[!] 실패: {:#}", e);
        }
    }

    Ok(())
}

/// 상태 명령어 (status)
///
/// 버전, API 키 설정 여부, 적용된 설정을 출력합니다.
async fn cmd_status() -> Result<()> {
    println!("bond-insights v{}", env!("CARGO_PKG_VERSION"));
    println!();

    // .env 로드가 API 키 확인보다 먼저
    let config = AppConfig::from_env();

    // API 키 상태
    if has_api_key() {
        println!("[OK] API 키: 설정됨");
    } else {
        println!("[!] API 키: 미설정");
        println!("    설정: export GEMINI_API_KEY=your-key");
    }

    match config {
        Ok(config) => {
            println!("[OK] 설정:");
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Err(e) => {
            println!("[!] 설정 오류: {:#}", e);
        }
    }

    Ok(())
}

// ============================================================================
// Shared Actions
// ============================================================================

async fn ask(ctx: &AppContext, docs: &[Document], question: &str) -> Result<()> {
    println!("[*] 질문: {}", truncate_text(question, 80));

    match ctx.query(docs, question).await? {
        QueryOutcome::NoDocuments => println!("{}", NO_DOCUMENTS_MESSAGE),
        QueryOutcome::Answered(result) => print_answer(&result),
    }
    Ok(())
}

async fn report(ctx: &AppContext, docs: &[Document], output: Option<PathBuf>) -> Result<()> {
    println!("[*] 보고서 생성 중...");

    match ctx.report(docs, output.as_deref()).await? {
        ReportOutcome::NoDocuments => println!("{}", NO_DOCUMENTS_MESSAGE),
        ReportOutcome::Written { path, result } => {
            println!(
                "[OK] 보고서 저장: {} (인용 {} 건)",
                path.display(),
                result.citations.len()
            );
        }
    }
    Ok(())
}

fn print_answer(result: &QaResult) {
    println!();
    println!("{}", result.answer.trim());
    println!();
    println!("Citations:");
    for line in result.citation_lines() {
        println!("  - {}", line);
    }
    println!();
}

/// 설정 로드 (--top-k 반영)
fn load_config(top_k: Option<usize>) -> Result<AppConfig> {
    let mut config = AppConfig::from_env()?;

    if let Some(k) = top_k {
        config.top_k = k;
        config.fetch_k = config.fetch_k.max(k);
        config.validate()?;
    }

    Ok(config)
}

/// `--file` / `--dir`로 지정된 PDF 읽기
async fn collect_documents(sources: &SourceArgs) -> Result<Vec<Document>> {
    let collector = FileCollector::with_defaults();
    let files = collector.collect(&sources.files, sources.dir.as_deref())?;

    if files.is_empty() {
        return Ok(vec![]);
    }

    let total: u64 = files.iter().map(|f| f.size).sum();
    println!(
        "[*] PDF {} 개 ({})",
        files.len(),
        format_bytes(total as usize)
    );

    let paths: Vec<PathBuf> = files.into_iter().map(|f| f.path).collect();
    read_documents(&paths).await
}

// ============================================================================
// Shell Commands
// ============================================================================

/// 대화형 모드 입력 한 줄
#[derive(Debug, PartialEq)]
enum ShellCommand {
    Empty,
    Quit,
    Help,
    Ask(String),
    Search(String),
    Report(Option<PathBuf>),
    Unknown(String),
}

impl ShellCommand {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ShellCommand::Empty;
        }

        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };

        match cmd.to_lowercase().as_str() {
            "quit" | "exit" | "q" => ShellCommand::Quit,
            "help" | "?" => ShellCommand::Help,
            "ask" if !rest.is_empty() => ShellCommand::Ask(rest.to_string()),
            "search" => ShellCommand::Search(rest.to_string()),
            "report" if rest.is_empty() => ShellCommand::Report(None),
            "report" => ShellCommand::Report(Some(PathBuf::from(rest))),
            _ => ShellCommand::Unknown(cmd.to_string()),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// 바이트 크기 포맷팅
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("coupon", 10), "coupon");
        assert_eq!(truncate_text("par value", 3), "par...");
        assert_eq!(truncate_text("series\nA", 20), "series A");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
    }

    #[test]
    fn test_shell_command_parse() {
        assert_eq!(ShellCommand::parse("   "), ShellCommand::Empty);
        assert_eq!(ShellCommand::parse("quit"), ShellCommand::Quit);
        assert_eq!(
            ShellCommand::parse("ask What is the coupon rate?"),
            ShellCommand::Ask("What is the coupon rate?".to_string())
        );
        assert_eq!(
            ShellCommand::parse("SEARCH  par value "),
            ShellCommand::Search("par value".to_string())
        );
        assert_eq!(ShellCommand::parse("report"), ShellCommand::Report(None));
        assert_eq!(
            ShellCommand::parse("report out/bam.pdf"),
            ShellCommand::Report(Some(PathBuf::from("out/bam.pdf")))
        );
        assert_eq!(
            ShellCommand::parse("ask"),
            ShellCommand::Unknown("ask".to_string())
        );
    }

    #[test]
    fn test_cli_parses_repeated_files() {
        let cli = Cli::try_parse_from([
            "bond-insights",
            "ask",
            "--file",
            "a.pdf",
            "-f",
            "b.pdf",
            "-k",
            "4",
            "What is the par value?",
        ])
        .unwrap();

        match cli.command {
            Commands::Ask {
                sources,
                top_k,
                question,
            } => {
                assert_eq!(sources.files, vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]);
                assert_eq!(top_k, Some(4));
                assert_eq!(question, "What is the par value?");
            }
            _ => panic!("expected ask"),
        }
    }
}
