//! bond-insights - 채권 공시 PDF 질의응답 시스템
//!
//! 업로드된 PDF를 페이지 단위로 추출해 겹치는 세그먼트로 나누고,
//! Gemini 임베딩 + LanceDB + MMR 검색으로 질문에 답합니다.
//! 지방채 보험 심사 보고서 PDF 생성과 키워드 검색도 지원합니다.

pub mod app;
pub mod cli;
pub mod collector;
pub mod config;
pub mod embedding;
pub mod gemini;
pub mod knowledge;
pub mod llm;
pub mod loader;
pub mod qa;
pub mod report;
pub mod search;

#[cfg(test)]
mod testing;

// Re-exports
pub use app::{AppContext, QueryOutcome, ReportOutcome};
pub use config::AppConfig;
pub use embedding::{EmbeddingProvider, GeminiEmbedding};
pub use gemini::{get_api_key, has_api_key, GeminiError};
pub use knowledge::{
    default_chunker, sliding_window_chunker, ChunkConfig, Chunker, IndexCache, LanceVectorStore,
    RetrievalParams, Segment, SessionIndex, SlidingWindowChunker,
};
pub use llm::{GeminiChat, LanguageModel};
pub use loader::{Document, Page};
pub use qa::{AnswerGenerator, Citation, QaResult};
pub use report::{render_report, write_report, REPORT_PROMPT};
pub use search::{SearchHit, SearchOutcome};
