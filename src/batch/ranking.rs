//! Deduplication and ranking of scored candidates

use crate::processing::chunk_index::RetrievedChunk;
use crate::processing::document::Document;
use crate::processing::scorer::ScoreResult;
use crate::processing::skills::SkillSet;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// One scored resume inside a batch.
#[derive(Debug, Clone)]
pub struct CandidateMatch {
    pub identity: String,
    pub document_id: String,
    pub submitted_at: Option<DateTime<Utc>>,
    /// Position of the document in the request, used as a recency fallback.
    pub sequence: usize,
    pub document: Document,
    pub scores: ScoreResult,
    pub matched_skills: SkillSet,
    pub missing_skills: SkillSet,
    pub top_chunks: Vec<RetrievedChunk>,
}

impl CandidateMatch {
    /// Whether `self` should replace `other` for the same identity: higher
    /// hybrid score first, then the more recent submission. A document with a
    /// timestamp counts as more recent than one without; with equal or
    /// missing timestamps the later request position wins.
    fn supersedes(&self, other: &CandidateMatch) -> bool {
        match self.scores.hybrid_score.total_cmp(&other.scores.hybrid_score) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => (self.submitted_at, self.sequence) > (other.submitted_at, other.sequence),
        }
    }
}

/// Keep one match per identity.
pub fn deduplicate(matches: Vec<CandidateMatch>) -> Vec<CandidateMatch> {
    let mut best: BTreeMap<String, CandidateMatch> = BTreeMap::new();

    for candidate in matches {
        let replace = best
            .get(&candidate.identity)
            .map_or(true, |current| candidate.supersedes(current));

        if replace {
            best.insert(candidate.identity.clone(), candidate);
        } else {
            log::debug!(
                "Dropping duplicate document {} for {}",
                candidate.document_id,
                candidate.identity
            );
        }
    }

    best.into_values().collect()
}

/// Sort by hybrid score descending, identity ascending on ties, and keep the
/// first `top_k`.
pub fn rank(mut matches: Vec<CandidateMatch>, top_k: usize) -> Vec<CandidateMatch> {
    matches.sort_by(|a, b| {
        b.scores
            .hybrid_score
            .total_cmp(&a.scores.hybrid_score)
            .then_with(|| a.identity.cmp(&b.identity))
    });
    matches.truncate(top_k);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocumentRole;
    use chrono::TimeZone;

    fn candidate(identity: &str, document_id: &str, hybrid: f64, sequence: usize) -> CandidateMatch {
        CandidateMatch {
            identity: identity.to_string(),
            document_id: document_id.to_string(),
            submitted_at: None,
            sequence,
            document: Document {
                role: DocumentRole::Resume,
                raw_text: "resume".to_string(),
                text: "resume".to_string(),
                skills: SkillSet::new(),
                fields: Default::default(),
                terms: Default::default(),
                embedding: vec![],
                chunks: vec![],
            },
            scores: ScoreResult {
                skill_score: hybrid,
                lexical_score: hybrid,
                semantic_score: hybrid,
                hybrid_score: hybrid,
            },
            matched_skills: SkillSet::new(),
            missing_skills: SkillSet::new(),
            top_chunks: vec![],
        }
    }

    #[test]
    fn test_dedup_keeps_highest_score() {
        let matches = vec![
            candidate("a@x.com", "doc-1", 60.0, 0),
            candidate("b@x.com", "doc-2", 50.0, 1),
            candidate("a@x.com", "doc-3", 75.0, 2),
        ];

        let deduped = deduplicate(matches);

        assert_eq!(deduped.len(), 2);
        let a = deduped.iter().find(|m| m.identity == "a@x.com").unwrap();
        assert_eq!(a.scores.hybrid_score, 75.0);
        assert_eq!(a.document_id, "doc-3");
    }

    #[test]
    fn test_dedup_tie_prefers_recent_submission() {
        let mut older = candidate("a@x.com", "older", 70.0, 5);
        older.submitted_at = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let mut newer = candidate("a@x.com", "newer", 70.0, 0);
        newer.submitted_at = Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());

        let deduped = deduplicate(vec![newer, older]);
        assert_eq!(deduped[0].document_id, "newer");
    }

    #[test]
    fn test_dedup_tie_without_timestamps_prefers_later_position() {
        let deduped = deduplicate(vec![
            candidate("a@x.com", "first", 70.0, 0),
            candidate("a@x.com", "second", 70.0, 1),
        ]);
        assert_eq!(deduped[0].document_id, "second");
    }

    #[test]
    fn test_rank_order_and_truncation() {
        let matches = vec![
            candidate("c@x.com", "1", 80.0, 0),
            candidate("a@x.com", "2", 90.0, 1),
            candidate("b@x.com", "3", 80.0, 2),
            candidate("d@x.com", "4", 10.0, 3),
        ];

        let ranked = rank(matches, 3);
        let order: Vec<&str> = ranked.iter().map(|m| m.identity.as_str()).collect();

        assert_eq!(order, vec!["a@x.com", "b@x.com", "c@x.com"]);
    }
}
