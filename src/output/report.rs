//! Response shapes for single and batch evaluation

use crate::batch::{BatchStatus, CandidateFailure, CandidateMatch, RankedBatch};
use crate::processing::chunk_index::RetrievedChunk;
use crate::processing::fields::DocumentFields;
use crate::processing::scorer::ScoreResult;
use crate::processing::skills::SkillSet;
use crate::processing::MatchReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillsBreakdown {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

impl SkillsBreakdown {
    fn new(matched: &SkillSet, missing: &SkillSet) -> Self {
        Self {
            matched: matched.iter().cloned().collect(),
            missing: missing.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub embedder: String,
    pub version: String,
}

impl ReportMetadata {
    pub fn new(processing_time_ms: u64, embedder: &str) -> Self {
        Self {
            generated_at: Utc::now(),
            processing_time_ms,
            embedder: embedder.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Single-document evaluation output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub skills: SkillsBreakdown,
    pub scores: ScoreResult,
    pub top_chunks: Vec<RetrievedChunk>,
    pub resume_skills: Vec<String>,
    pub job_skills: Vec<String>,
    pub resume_fields: DocumentFields,
    pub job_fields: DocumentFields,
    pub metadata: ReportMetadata,
}

impl MatchResponse {
    pub fn from_report(report: &MatchReport, embedder: &str) -> Self {
        let evaluation = &report.evaluation;
        Self {
            skills: SkillsBreakdown::new(&evaluation.matched_skills, &evaluation.missing_skills),
            scores: evaluation.scores,
            top_chunks: evaluation.top_chunks.clone(),
            resume_skills: evaluation.resume.skills.iter().cloned().collect(),
            job_skills: report.job.skills.iter().cloned().collect(),
            resume_fields: evaluation.resume.fields.clone(),
            job_fields: report.job.fields.clone(),
            metadata: ReportMetadata::new(report.processing_time_ms, embedder),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCandidate {
    pub rank: usize,
    pub identity: String,
    pub document_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    pub skills: SkillsBreakdown,
    pub scores: ScoreResult,
    pub top_chunks: Vec<RetrievedChunk>,
    pub fields: DocumentFields,
}

impl RankedCandidate {
    fn new(rank: usize, candidate: &CandidateMatch) -> Self {
        Self {
            rank,
            identity: candidate.identity.clone(),
            document_id: candidate.document_id.clone(),
            submitted_at: candidate.submitted_at,
            skills: SkillsBreakdown::new(&candidate.matched_skills, &candidate.missing_skills),
            scores: candidate.scores,
            top_chunks: candidate.top_chunks.clone(),
            fields: candidate.document.fields.clone(),
        }
    }
}

/// Batch evaluation output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub ranked: Vec<RankedCandidate>,
    pub excluded_count: usize,
    pub status: BatchStatus,
    pub failures: Vec<CandidateFailure>,
    pub metadata: ReportMetadata,
}

impl BatchResponse {
    pub fn from_batch(batch: &RankedBatch, embedder: &str) -> Self {
        Self {
            ranked: batch
                .ranked
                .iter()
                .enumerate()
                .map(|(i, candidate)| RankedCandidate::new(i + 1, candidate))
                .collect(),
            excluded_count: batch.excluded_count,
            status: batch.status,
            failures: batch.failures.clone(),
            metadata: ReportMetadata::new(batch.elapsed_ms, embedder),
        }
    }
}

/// Qualitative label for a 0-100 score.
pub fn score_label(score: f64) -> &'static str {
    match score {
        s if s >= 80.0 => "STRONG",
        s if s >= 60.0 => "GOOD",
        s if s >= 40.0 => "FAIR",
        _ => "WEAK",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::ModelRegistry;
    use crate::processing::MatchEngine;
    use std::sync::Arc;

    #[test]
    fn test_match_response_shape() {
        let registry = Arc::new(ModelRegistry::hashing(64).unwrap());
        let engine = MatchEngine::new(registry, &Config::default()).unwrap();
        let report = engine
            .evaluate(
                "Python, Django, REST API development",
                "Looking for Python developer with Django and SQL skills",
            )
            .unwrap();

        let response = MatchResponse::from_report(&report, "hashing");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["skills"]["matched"], serde_json::json!(["Django", "Python"]));
        assert_eq!(json["skills"]["missing"], serde_json::json!(["SQL"]));
        assert!(json["scores"]["hybridScore"].is_number());
        assert!(json["scores"]["skillScore"].is_number());
        assert!(json["topChunks"][0]["relevance"].is_number());
        assert!(json["topChunks"][0]["text"].is_string());
        assert!(json["jobSkills"].is_array());
        assert!(json["resumeFields"].is_object());
    }

    #[test]
    fn test_score_label() {
        assert_eq!(score_label(85.0), "STRONG");
        assert_eq!(score_label(60.0), "GOOD");
        assert_eq!(score_label(39.9), "WEAK");
    }
}
