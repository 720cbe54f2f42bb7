//! Knowledge 모듈 - 세션 단위 벡터 검색
//!
//! - Chunker: 페이지 텍스트를 겹치는 고정 크기 세그먼트로 분할
//! - LanceDB: 임시 디렉토리 기반 벡터 검색 (ANN)
//! - MMR: 관련성과 다양성을 함께 고려한 재선택
//! - Cache: 같은 파일 집합에 대한 인덱스 재사용

mod cache;
mod chunker;
mod index;
mod lance;
mod mmr;
mod vector;

// Re-exports
pub use cache::{cache_key, IndexCache};
pub use chunker::{
    default_chunker, page_label, sliding_window_chunker, ChunkConfig, Chunker, Segment,
    SlidingWindowChunker,
};
pub use index::{RetrievalParams, SessionIndex};
pub use lance::LanceVectorStore;
pub use mmr::mmr_select;
pub use vector::{cosine_similarity, SearchResult, VectorEntry, VectorStore};
