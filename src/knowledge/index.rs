//! 세션 인덱스 - 세그먼트 임베딩 + MMR 검색
//!
//! 업로드된 문서 집합 하나에 대한 벡터 인덱스입니다.
//! LanceDB에서 `fetch_k`개의 최근접 후보를 가져온 뒤
//! MMR로 관련성과 다양성을 함께 고려해 `k`개를 고릅니다.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::embedding::EmbeddingProvider;

use super::chunker::Segment;
use super::lance::LanceVectorStore;
use super::mmr::mmr_select;
use super::vector::{VectorEntry, VectorStore};

/// 검색 정책 설정
#[derive(Debug, Clone, Copy)]
pub struct RetrievalParams {
    /// MMR 후보 개수
    pub fetch_k: usize,
    /// 관련성 가중치 (0.0 ~ 1.0)
    pub lambda: f32,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            fetch_k: 20,
            lambda: 0.5,
        }
    }
}

/// 세션 벡터 인덱스
pub struct SessionIndex {
    segments: Vec<Segment>,
    store: Box<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    params: RetrievalParams,
}

impl SessionIndex {
    /// 세그먼트를 임베딩하여 새 인덱스 생성
    ///
    /// 임베딩 실패는 그대로 전파됩니다. 세그먼트가 없으면 빈 인덱스를 만듭니다.
    pub async fn build(
        segments: Vec<Segment>,
        embedder: Arc<dyn EmbeddingProvider>,
        params: RetrievalParams,
    ) -> Result<Self> {
        let store = LanceVectorStore::open_temp(embedder.dimension())
            .await
            .context("Failed to open vector store")?;

        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        let embeddings = embedder
            .embed_batch(&texts)
            .await
            .context("Failed to embed segments")?;

        if embeddings.len() != segments.len() {
            anyhow::bail!(
                "Embedder returned {} vectors for {} segments",
                embeddings.len(),
                segments.len()
            );
        }

        let entries: Vec<VectorEntry> = texts
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (chunk_text, embedding))| VectorEntry {
                segment_id: i as i64,
                chunk_text,
                embedding,
            })
            .collect();

        store
            .insert_batch(&entries)
            .await
            .context("Failed to insert vectors")?;

        tracing::info!(
            "Built index: {} segments embedded with {}",
            segments.len(),
            embedder.name()
        );

        Ok(Self {
            segments,
            store: Box::new(store),
            embedder,
            params,
        })
    }

    /// 질의와 관련된 세그먼트를 최대 `k`개 반환
    ///
    /// 순서는 MMR 선택 순서이며, 순수 거리 순서와 다를 수 있습니다.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Segment>> {
        if k == 0 || self.segments.is_empty() {
            return Ok(vec![]);
        }

        let query_embedding = self
            .embedder
            .embed_query(query)
            .await
            .context("Failed to embed query")?;

        let fetch_k = self.params.fetch_k.max(k);
        let candidates = self.store.search(&query_embedding, fetch_k).await?;

        let vectors: Vec<Vec<f32>> = candidates.iter().map(|c| c.embedding.clone()).collect();
        let picked = mmr_select(&query_embedding, &vectors, k, self.params.lambda);

        let mut results = Vec::with_capacity(picked.len());
        for i in picked {
            let id = candidates[i].segment_id;
            let segment = usize::try_from(id)
                .ok()
                .and_then(|idx| self.segments.get(idx))
                .ok_or_else(|| anyhow::anyhow!("Index returned unknown segment id {}", id))?;
            results.push(segment.clone());
        }

        tracing::debug!(
            "Retrieved {} of {} candidates for query ({} chars, best similarity {:.3})",
            results.len(),
            candidates.len(),
            query.chars().count(),
            candidates.first().map(|c| c.similarity).unwrap_or(0.0)
        );

        Ok(results)
    }

    /// 인덱스된 세그먼트
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// 인덱스된 세그먼트 수
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// 저장된 벡터 수
    pub async fn vector_count(&self) -> Result<usize> {
        self.store.count().await
    }
}

// ============================================================================
// Tests
// ============================================================================
