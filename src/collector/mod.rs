//! 파일 수집 모듈
//!
//! `--file`, `--dir` 인자로 지정된 PDF 파일을 수집합니다.
//! 폴더는 재귀적으로 탐색하며 .gitignore 패턴을 존중합니다.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;

// ============================================================================
// Collected File
// ============================================================================

/// 수집된 PDF 파일 정보
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedFile {
    /// 파일 절대 경로
    pub path: PathBuf,
    /// 파일 크기 (바이트)
    pub size: u64,
}

/// PDF 확장자 여부
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// 파일을 수집에서 제외한 이유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotPdf,
    TooLarge { size: u64, limit: u64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotPdf => f.write_str("not a PDF file"),
            SkipReason::TooLarge { size, limit } => {
                write!(f, "file too large ({} bytes, limit {} bytes)", size, limit)
            }
        }
    }
}

// ============================================================================
// File Collector
// ============================================================================

/// 파일 수집기 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// .gitignore 패턴 존중 여부
    pub respect_gitignore: bool,
    /// 숨김 파일 포함 여부
    pub include_hidden: bool,
    /// 최대 파일 크기 (바이트, 0이면 제한 없음)
    pub max_file_size: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            respect_gitignore: true,
            include_hidden: false,
            max_file_size: 50 * 1024 * 1024, // 50MB
        }
    }
}

/// PDF 파일 수집기
pub struct FileCollector {
    config: CollectorConfig,
}

impl FileCollector {
    /// 새 수집기 생성
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    /// 기본 설정으로 수집기 생성
    pub fn with_defaults() -> Self {
        Self::new(CollectorConfig::default())
    }

    /// `--file` 목록과 `--dir` 폴더를 합쳐 수집
    ///
    /// 순서: 지정된 파일 순서, 이후 폴더 내 파일 (경로 정렬). 중복 경로는 한 번만 포함됩니다.
    pub fn collect(&self, files: &[PathBuf], dir: Option<&Path>) -> Result<Vec<CollectedFile>> {
        let mut collected: Vec<CollectedFile> = Vec::new();

        for path in files {
            // 제외 사유는 collect_file에서 로깅
            if let Some(file) = self.collect_file(path)? {
                collected.push(file);
            }
        }

        if let Some(dir) = dir {
            collected.extend(self.collect_directory(dir)?);
        }

        let mut seen = std::collections::HashSet::new();
        collected.retain(|f| seen.insert(f.path.clone()));

        Ok(collected)
    }

    /// 단일 파일 수집
    pub fn collect_file(&self, path: &Path) -> Result<Option<CollectedFile>> {
        let abs_path = absolute(path)?;

        if !abs_path.exists() {
            anyhow::bail!("File not found: {:?}", abs_path);
        }

        if !abs_path.is_file() {
            anyhow::bail!("Not a file: {:?}", abs_path);
        }

        let file = Self::describe(abs_path)?;
        match self.skip_reason(&file) {
            Some(reason) => {
                tracing::warn!("Skipping {:?}: {}", file.path, reason);
                Ok(None)
            }
            None => Ok(Some(file)),
        }
    }

    /// 폴더 재귀 수집
    pub fn collect_directory(&self, path: &Path) -> Result<Vec<CollectedFile>> {
        let abs_path = absolute(path)?;

        if !abs_path.exists() {
            anyhow::bail!("Directory not found: {:?}", abs_path);
        }

        if !abs_path.is_dir() {
            anyhow::bail!("Not a directory: {:?}", abs_path);
        }

        let mut files = Vec::new();

        // ignore 크레이트로 .gitignore 지원
        let walker = WalkBuilder::new(&abs_path)
            .hidden(!self.config.include_hidden)
            .git_ignore(self.config.respect_gitignore)
            .git_global(self.config.respect_gitignore)
            .git_exclude(self.config.respect_gitignore)
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Failed to read entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            if !is_pdf(entry.path()) {
                continue;
            }

            match Self::describe(entry.path().to_path_buf()) {
                Ok(file) => match self.skip_reason(&file) {
                    Some(reason) => tracing::warn!("Skipping {:?}: {}", file.path, reason),
                    None => files.push(file),
                },
                Err(e) => {
                    tracing::warn!("Failed to collect file: {}", e);
                }
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));

        tracing::info!("Collected {} PDF files from {:?}", files.len(), abs_path);
        Ok(files)
    }

    fn describe(path: PathBuf) -> Result<CollectedFile> {
        let metadata = std::fs::metadata(&path)
            .with_context(|| format!("Failed to read metadata: {:?}", path))?;

        Ok(CollectedFile {
            path,
            size: metadata.len(),
        })
    }

    /// 필터 조건에 걸리면 제외 사유 반환
    pub fn skip_reason(&self, file: &CollectedFile) -> Option<SkipReason> {
        if !is_pdf(&file.path) {
            return Some(SkipReason::NotPdf);
        }

        let limit = self.config.max_file_size;
        if limit > 0 && file.size > limit {
            return Some(SkipReason::TooLarge {
                size: file.size,
                limit,
            });
        }

        None
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

// ============================================================================
// Tests
// ============================================================================
