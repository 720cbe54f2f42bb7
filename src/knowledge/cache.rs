//! 세션 인덱스 캐시
//!
//! 업로드된 파일 집합(파일명 + 내용 해시)을 키로 `SessionIndex`를 재사용합니다.
//! 같은 파일을 다시 올리면 추출/임베딩을 건너뜁니다. 파일 순서는 키에 영향을 주지 않습니다.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::embedding::EmbeddingProvider;
use crate::loader::{load_documents, Document};

use super::chunker::Chunker;
use super::index::{RetrievalParams, SessionIndex};

/// 파일 집합의 캐시 키 (SHA-256 hex)
pub fn cache_key(docs: &[Document]) -> String {
    let mut entries: Vec<(String, String)> = docs
        .iter()
        .map(|d| (d.filename.clone(), hex::encode(Sha256::digest(&d.bytes))))
        .collect();
    entries.sort();

    let mut hasher = Sha256::new();
    for (filename, digest) in &entries {
        hasher.update(filename.as_bytes());
        hasher.update([0u8]);
        hasher.update(digest.as_bytes());
        hasher.update([b'\n']);
    }
    hex::encode(hasher.finalize())
}

/// 파일 집합별 인덱스 캐시
///
/// 크기 제한이 없으므로 장시간 실행하는 경우 `invalidate`로 비웁니다.
#[derive(Default)]
pub struct IndexCache {
    entries: Mutex<HashMap<String, Arc<SessionIndex>>>,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 캐시된 인덱스를 반환하거나 새로 구축
    ///
    /// 구축 중 실패하면 아무것도 캐시하지 않습니다.
    pub async fn get_or_build(
        &self,
        docs: &[Document],
        chunker: &dyn Chunker,
        embedder: Arc<dyn EmbeddingProvider>,
        params: RetrievalParams,
    ) -> Result<Arc<SessionIndex>> {
        let key = cache_key(docs);

        // 같은 키를 동시에 두 번 구축하지 않도록 구축 동안 잠금 유지
        let mut entries = self.entries.lock().await;
        if let Some(index) = entries.get(&key) {
            tracing::debug!("Index cache hit: {}", &key[..12]);
            return Ok(Arc::clone(index));
        }

        tracing::debug!("Index cache miss: {} ({} files)", &key[..12], docs.len());

        let pages = load_documents(docs).await?;
        let segments = chunker.split_pages(&pages);
        let index = Arc::new(SessionIndex::build(segments, embedder, params).await?);

        entries.insert(key, Arc::clone(&index));
        Ok(index)
    }

    /// 특정 파일 집합의 캐시 제거
    pub async fn invalidate(&self, docs: &[Document]) -> bool {
        self.entries.lock().await.remove(&cache_key(docs)).is_some()
    }

    /// 캐시된 인덱스 수
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::default_chunker;
    use crate::testing::{FailingEmbedding, HashEmbedding};
    use std::path::Path;

    fn doc(name: &str, bytes: &[u8]) -> Document {
        Document::from_bytes(Path::new(name), bytes.to_vec())
    }

    #[test]
    fn test_key_ignores_order() {
        let a = doc("a.pdf", b"alpha");
        let b = doc("b.pdf", b"beta");
        assert_eq!(
            cache_key(&[a.clone(), b.clone()]),
            cache_key(&[b, a])
        );
    }

    #[test]
    fn test_key_depends_on_content() {
        assert_ne!(
            cache_key(&[doc("a.pdf", b"alpha")]),
            cache_key(&[doc("a.pdf", b"alpha v2")])
        );
        assert_ne!(
            cache_key(&[doc("a.pdf", b"alpha")]),
            cache_key(&[doc("renamed.pdf", b"alpha")])
        );
    }

    #[tokio::test]
    async fn test_empty_set_is_cached_once() {
        let cache = IndexCache::new();
        let chunker = default_chunker();
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbedding::new(16));

        let first = cache
            .get_or_build(&[], chunker.as_ref(), embedder.clone(), RetrievalParams::default())
            .await
            .unwrap();
        let second = cache
            .get_or_build(&[], chunker.as_ref(), embedder, RetrievalParams::default())
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len().await, 1);

        assert!(cache.invalidate(&[]).await);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_build_is_not_cached() {
        let cache = IndexCache::new();
        let chunker = default_chunker();
        let bad = [doc("bad.pdf", b"%PDF-garbage")];

        let result = cache
            .get_or_build(
                &bad,
                chunker.as_ref(),
                Arc::new(FailingEmbedding),
                RetrievalParams::default(),
            )
            .await;

        assert!(result.is_err());
        assert!(cache.is_empty().await);
    }
}
