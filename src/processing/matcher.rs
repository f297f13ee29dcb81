//! Matching engine combining skills, lexical, semantic and chunk retrieval

use crate::config::Config;
use crate::error::{DocumentRole, Result};
use crate::models::ModelRegistry;
use crate::processing::chunk_index::{embed_chunks, ChunkIndex, ChunkingPolicy, RetrievedChunk};
use crate::processing::document::Document;
use crate::processing::embeddings::SemanticSimilarity;
use crate::processing::fields::FieldExtractor;
use crate::processing::lexical::{term_counts, LexicalSimilarity};
use crate::processing::normalizer::{NormalizedText, TextNormalizer};
use crate::processing::scorer::{HybridScorer, ScoreResult};
use crate::processing::skills::{SkillExtractor, SkillSet, SkillTaxonomy};
use std::sync::Arc;
use std::time::Instant;

/// Scores resumes against job descriptions. Immutable once built and safe to
/// share across worker threads.
pub struct MatchEngine {
    registry: Arc<ModelRegistry>,
    normalizer: TextNormalizer,
    skill_extractor: SkillExtractor,
    field_extractor: FieldExtractor,
    lexical: LexicalSimilarity,
    semantic: SemanticSimilarity,
    scorer: HybridScorer,
    chunking: ChunkingPolicy,
    top_chunks: usize,
}

/// Everything computed for one resume against one job description.
#[derive(Debug, Clone)]
pub struct MatchEvaluation {
    pub resume: Document,
    pub scores: ScoreResult,
    pub matched_skills: SkillSet,
    pub missing_skills: SkillSet,
    pub top_chunks: Vec<RetrievedChunk>,
}

/// Result of a single-document evaluation, job side included.
#[derive(Debug, Clone)]
pub struct MatchReport {
    pub job: Document,
    pub evaluation: MatchEvaluation,
    pub processing_time_ms: u64,
}

impl MatchEngine {
    pub fn new(registry: Arc<ModelRegistry>, config: &Config) -> Result<Self> {
        let taxonomy = SkillTaxonomy::with_extra(&config.skills.extra);
        log::debug!("Skill taxonomy has {} entries", taxonomy.len());
        let skill_extractor = SkillExtractor::new(taxonomy, registry.tagger().clone())?;
        let field_extractor = FieldExtractor::new(registry.tagger().clone())?;

        Ok(Self {
            normalizer: TextNormalizer::new(),
            skill_extractor,
            field_extractor,
            lexical: LexicalSimilarity::new(),
            semantic: SemanticSimilarity::new(),
            scorer: HybridScorer::new(config.scoring)?,
            chunking: ChunkingPolicy::from_config(&config.processing)?,
            top_chunks: config.processing.top_chunks,
            registry,
        })
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Validate and normalize raw text without touching any model.
    pub fn normalize(&self, raw: &str, role: DocumentRole) -> Result<NormalizedText> {
        self.normalizer.normalize(raw, role)
    }

    /// Build the job-side document. Job descriptions are never chunked.
    pub fn prepare_job(&self, normalized: NormalizedText) -> Result<Document> {
        self.analyze(normalized, DocumentRole::JobDescription)
    }

    /// Build the resume-side document including embedded chunks.
    pub fn prepare_resume(&self, normalized: NormalizedText) -> Result<Document> {
        let mut document = self.analyze(normalized, DocumentRole::Resume)?;
        let mut chunks = self.chunking.split(&document.text);
        embed_chunks(self.registry.embedder().as_ref(), &mut chunks)?;
        document.chunks = chunks;
        Ok(document)
    }

    /// Score one raw resume against a prepared job description.
    pub fn score(&self, job: &Document, resume_text: &str) -> Result<MatchEvaluation> {
        let normalized = self.normalize(resume_text, DocumentRole::Resume)?;
        let resume = self.prepare_resume(normalized)?;
        self.score_document(job, resume)
    }

    pub fn score_document(&self, job: &Document, resume: Document) -> Result<MatchEvaluation> {
        let skills = self.scorer.compare_skills(&resume.skills, &job.skills);
        let lexical_score = self.lexical.score(&resume.terms, &job.terms);
        let semantic_score = self.semantic.score(&resume.embedding, &job.embedding)?;
        let scores = self.scorer.combine(skills.score, lexical_score, semantic_score);

        let top_chunks = ChunkIndex::new(&resume.chunks).retrieve(&job.embedding, self.top_chunks)?;

        Ok(MatchEvaluation {
            resume,
            scores,
            matched_skills: skills.matched,
            missing_skills: skills.missing,
            top_chunks,
        })
    }

    /// Single-document evaluation. Both inputs are validated before the
    /// model registry is consulted, so empty input always reports
    /// `EmptyDocument` even when models are not ready.
    pub fn evaluate(&self, resume_text: &str, job_text: &str) -> Result<MatchReport> {
        let start_time = Instant::now();

        let resume = self.normalize(resume_text, DocumentRole::Resume)?;
        let job = self.normalize(job_text, DocumentRole::JobDescription)?;
        self.registry.ensure_ready()?;

        let job = self.prepare_job(job)?;
        let resume = self.prepare_resume(resume)?;
        let evaluation = self.score_document(&job, resume)?;

        let processing_time_ms = start_time.elapsed().as_millis() as u64;
        log::debug!(
            "Evaluated resume in {} ms (hybrid {:.1})",
            processing_time_ms,
            evaluation.scores.hybrid_score
        );

        Ok(MatchReport {
            job,
            evaluation,
            processing_time_ms,
        })
    }

    fn analyze(&self, normalized: NormalizedText, role: DocumentRole) -> Result<Document> {
        let (raw_text, text) = normalized.into_parts();
        let tokens = self.registry.tagger().tag(&text);

        let skills = self.skill_extractor.extract_tagged(&text, &tokens);
        let fields = self.field_extractor.extract(&text);
        let terms = term_counts(&self.normalizer.terms(&text));
        let embedding = self.registry.embedder().embed(&text)?;

        Ok(Document {
            role,
            raw_text,
            text,
            skills,
            fields,
            terms,
            embedding,
            chunks: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResumeRankerError;

    fn engine() -> MatchEngine {
        let registry = Arc::new(ModelRegistry::hashing(256).unwrap());
        MatchEngine::new(registry, &Config::default()).unwrap()
    }

    #[test]
    fn test_scenario() {
        let report = engine()
            .evaluate(
                "Python, Django, REST API development",
                "Looking for Python developer with Django and SQL skills",
            )
            .unwrap();
        let evaluation = &report.evaluation;

        assert!(evaluation.matched_skills.contains("Python"));
        assert!(evaluation.matched_skills.contains("Django"));
        assert!(evaluation.missing_skills.contains("SQL"));
        assert!((evaluation.scores.skill_score - 66.7).abs() < 0.05);
        assert_eq!(evaluation.top_chunks.len(), 1);
    }

    #[test]
    fn test_scores_in_range() {
        let report = engine()
            .evaluate("Welder with forklift license", "Senior Rust engineer, Kubernetes, AWS")
            .unwrap();
        let s = report.evaluation.scores;

        for value in [s.skill_score, s.lexical_score, s.semantic_score, s.hybrid_score] {
            assert!((0.0..=100.0).contains(&value));
        }
        assert_eq!(s.skill_score, 0.0);
    }

    #[test]
    fn test_empty_inputs() {
        let engine = engine();

        let err = engine.evaluate("   ", "Python developer").unwrap_err();
        assert!(matches!(err, ResumeRankerError::EmptyDocument { role: DocumentRole::Resume }));

        let err = engine.evaluate("Python developer", "\n\t").unwrap_err();
        assert!(matches!(
            err,
            ResumeRankerError::EmptyDocument { role: DocumentRole::JobDescription }
        ));
    }

    #[test]
    fn test_document_keeps_raw_text() {
        let raw = "  Rust\tengineer\n\n Tokio  ";
        let report = engine().evaluate(raw, "Rust engineer").unwrap();
        let resume = &report.evaluation.resume;

        assert_eq!(resume.raw_text, raw);
        assert_eq!(resume.text, "Rust engineer Tokio");
    }

    #[test]
    fn test_deterministic() {
        let engine = engine();
        let resume = "Backend engineer. Python, Django, PostgreSQL, Docker. 4 years of experience.";
        let job = "We need a Python backend engineer who knows Docker and Kubernetes.";

        let a = engine.evaluate(resume, job).unwrap().evaluation.scores;
        let b = engine.evaluate(resume, job).unwrap().evaluation.scores;

        assert_eq!(a.skill_score.to_bits(), b.skill_score.to_bits());
        assert_eq!(a.lexical_score.to_bits(), b.lexical_score.to_bits());
        assert_eq!(a.semantic_score.to_bits(), b.semantic_score.to_bits());
        assert_eq!(a.hybrid_score.to_bits(), b.hybrid_score.to_bits());
    }

    #[test]
    fn test_long_resume_returns_top_chunks() {
        let engine = engine();
        let resume = "Built data pipelines in Python and Spark. ".repeat(40);

        let report = engine.evaluate(&resume, "Python data engineer").unwrap();
        let chunks = &report.evaluation.top_chunks;

        assert_eq!(chunks.len(), 3);
        assert!(chunks.windows(2).all(|w| w[0].relevance >= w[1].relevance));
        assert!(report.evaluation.resume.chunks.len() > 3);
    }
}
