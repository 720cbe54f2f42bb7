//! MMR (Maximal Marginal Relevance) 선택
//!
//! 질의 관련성과 이미 선택된 결과와의 중복도를 함께 고려해 후보를 고릅니다.
//! ref: Carbonell & Goldstein, "The Use of MMR, Diversity-Based Reranking" (1998)
//!
//! score(c) = λ · sim(q, c) − (1 − λ) · max_{s ∈ S} sim(c, s)

use super::vector::cosine_similarity;

/// MMR로 후보 인덱스 선택
///
/// 선택 순서대로 `candidates`의 인덱스를 반환합니다. 결과는 최대 `k`개입니다.
///
/// # Arguments
/// * `query` - 질의 임베딩
/// * `candidates` - 후보 임베딩 목록
/// * `k` - 선택할 개수
/// * `lambda` - 1.0이면 관련성만, 0.0이면 다양성만 고려
pub fn mmr_select(query: &[f32], candidates: &[Vec<f32>], k: usize, lambda: f32) -> Vec<usize> {
    if candidates.is_empty() || k == 0 {
        return vec![];
    }

    let relevance: Vec<f32> = candidates
        .iter()
        .map(|c| cosine_similarity(query, c))
        .collect();

    // 첫 선택: 질의와 가장 유사한 후보
    let first = argmax(relevance.iter().copied().enumerate());
    let mut selected = vec![first];

    // 각 후보의 선택 집합에 대한 최대 유사도
    let mut redundancy: Vec<f32> = candidates
        .iter()
        .map(|c| cosine_similarity(c, &candidates[first]))
        .collect();

    while selected.len() < k.min(candidates.len()) {
        let scores = (0..candidates.len())
            .filter(|i| !selected.contains(i))
            .map(|i| (i, lambda * relevance[i] - (1.0 - lambda) * redundancy[i]));

        let next = argmax(scores);
        selected.push(next);

        for (i, candidate) in candidates.iter().enumerate() {
            let sim = cosine_similarity(candidate, &candidates[next]);
            if sim > redundancy[i] {
                redundancy[i] = sim;
            }
        }
    }

    selected
}

/// 최고 점수 인덱스 (동점이면 앞선 인덱스)
fn argmax(scores: impl Iterator<Item = (usize, f32)>) -> usize {
    let mut best: Option<(usize, f32)> = None;
    for (i, score) in scores {
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i).unwrap_or(0)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_inputs() {
        assert!(mmr_select(&[1.0, 0.0], &[], 3, 0.5).is_empty());
        assert!(mmr_select(&[1.0, 0.0], &[vec![1.0, 0.0]], 0, 0.5).is_empty());
    }

    #[test]
    fn test_never_exceeds_k_or_candidates() {
        let candidates = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]];
        assert_eq!(mmr_select(&[1.0, 0.0], &candidates, 2, 0.5).len(), 2);
        assert_eq!(mmr_select(&[1.0, 0.0], &candidates, 10, 0.5).len(), 3);
    }

    #[test]
    fn test_first_pick_is_most_relevant() {
        let candidates = vec![vec![0.0, 1.0], vec![1.0, 0.1], vec![0.5, 0.5]];
        let selected = mmr_select(&[1.0, 0.0], &candidates, 1, 0.5);
        assert_eq!(selected, vec![1]);
    }

    #[test]
    fn test_prefers_diverse_over_near_duplicate() {
        let query = vec![1.0, 0.0, 0.0];
        let candidates = vec![
            vec![0.9, 0.436, 0.0],  // 가장 관련
            vec![0.89, 0.45, 0.05], // 거의 중복
            vec![0.8, -0.6, 0.0],   // 덜 관련 있지만 다른 방향
        ];

        let selected = mmr_select(&query, &candidates, 2, 0.5);
        assert_eq!(selected, vec![0, 2]);
    }

    #[test]
    fn test_lambda_one_is_pure_relevance() {
        let query = vec![1.0, 0.0, 0.0];
        let candidates = vec![
            vec![0.9, 0.436, 0.0],
            vec![0.89, 0.45, 0.05],
            vec![0.8, -0.6, 0.0],
        ];

        let selected = mmr_select(&query, &candidates, 3, 1.0);
        assert_eq!(selected, vec![0, 1, 2]);
    }

    #[test]
    fn test_no_duplicates_in_selection() {
        let candidates = vec![vec![1.0, 0.0]; 5];
        let mut selected = mmr_select(&[1.0, 0.0], &candidates, 5, 0.5);
        selected.sort_unstable();
        assert_eq!(selected, vec![0, 1, 2, 3, 4]);
    }
}
