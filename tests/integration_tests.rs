//! Integration tests for the resume ranker

use resume_ranker::batch::{
    BatchMatchCoordinator, BatchRequest, BatchStatus, CandidateDocument, FailureReason, WorkerPool,
};
use resume_ranker::config::{Config, EmbeddingBackend};
use resume_ranker::error::DocumentRole;
use resume_ranker::input::{CandidateStore, InputManager, ManifestStore};
use resume_ranker::models::hashing::HashingEmbedder;
use resume_ranker::models::ModelRegistry;
use resume_ranker::output::{BatchResponse, MatchResponse, ReportGenerator};
use resume_ranker::processing::embeddings::Embedder;
use resume_ranker::processing::tagger::RuleTagger;
use resume_ranker::processing::MatchEngine;
use resume_ranker::{Result, ResumeRankerError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn hashing_engine() -> Arc<MatchEngine> {
    let registry = Arc::new(ModelRegistry::hashing(256).unwrap());
    Arc::new(MatchEngine::new(registry, &Config::default()).unwrap())
}

fn engine_with(embedder: Arc<dyn Embedder>) -> Arc<MatchEngine> {
    let registry = Arc::new(ModelRegistry::new(
        embedder,
        Arc::new(RuleTagger::new()),
        EmbeddingBackend::Hashing,
    ));
    Arc::new(MatchEngine::new(registry, &Config::default()).unwrap())
}

fn candidate(identity: &str, document_id: &str, text: &str) -> CandidateDocument {
    CandidateDocument {
        identity: identity.to_string(),
        document_id: document_id.to_string(),
        resume_text: text.to_string(),
        submitted_at: None,
    }
}

fn request(job: &str, candidates: Vec<CandidateDocument>) -> BatchRequest {
    BatchRequest {
        job_description: job.to_string(),
        candidates,
        top_k: 10,
        deadline: Duration::from_secs(30),
        failed: Vec::new(),
    }
}

/// Counts every embedding call before delegating to the hashing embedder.
struct CountingEmbedder {
    inner: HashingEmbedder,
    calls: AtomicUsize,
}

impl CountingEmbedder {
    fn new() -> Self {
        Self {
            inner: HashingEmbedder::new(128).unwrap(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for CountingEmbedder {
    fn name(&self) -> &str {
        "counting"
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text)
    }
}

/// Blocks for a while on any text containing the marker word.
struct SlowEmbedder {
    inner: HashingEmbedder,
    marker: &'static str,
    delay: Duration,
}

impl Embedder for SlowEmbedder {
    fn name(&self) -> &str {
        "slow"
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.contains(self.marker) {
            std::thread::sleep(self.delay);
        }
        self.inner.embed(text)
    }
}

#[tokio::test]
async fn test_text_extraction_from_txt() {
    let mut manager = InputManager::new();
    let text = manager.extract_text(&fixture("sample_resume.txt")).await.unwrap();

    assert!(text.contains("John Doe"));
    assert!(text.contains("Software Engineer"));
    assert!(text.contains("React"));
    assert!(text.contains("Node.js"));
}

#[tokio::test]
async fn test_text_extraction_from_markdown() {
    let mut manager = InputManager::new();
    let text = manager.extract_text(&fixture("sample_resume.md")).await.unwrap();

    assert!(text.contains("John Doe"));
    assert!(text.contains("React"));
    assert!(!text.contains("**"));
    assert!(!text.contains("##"));
}

#[tokio::test]
async fn test_caching_functionality() {
    let mut manager = InputManager::new();
    let path = fixture("sample_resume.txt");

    let text1 = manager.extract_text(&path).await.unwrap();
    assert_eq!(manager.cache_size(), 1);

    let text2 = manager.extract_text(&path).await.unwrap();
    assert_eq!(text1, text2);
    assert_eq!(manager.cache_size(), 1);
}

#[tokio::test]
async fn test_unsupported_and_missing_files() {
    let mut manager = InputManager::new();

    let result = manager.extract_text(&fixture("unsupported.xyz")).await;
    assert!(matches!(result, Err(ResumeRankerError::UnsupportedFormat(_))));

    let result = manager.extract_text(&fixture("nonexistent.txt")).await;
    assert!(matches!(result, Err(ResumeRankerError::InvalidInput(_))));
}

#[test]
fn test_python_django_scenario() {
    let report = hashing_engine()
        .evaluate(
            "Python, Django, REST API development",
            "Looking for Python developer with Django and SQL skills",
        )
        .unwrap();
    let evaluation = &report.evaluation;

    let matched: Vec<&str> = evaluation.matched_skills.iter().map(String::as_str).collect();
    let missing: Vec<&str> = evaluation.missing_skills.iter().map(String::as_str).collect();
    assert_eq!(matched, vec!["Django", "Python"]);
    assert_eq!(missing, vec!["SQL"]);
    assert!((evaluation.scores.skill_score - 66.7).abs() < 0.05);

    let s = evaluation.scores;
    for value in [s.skill_score, s.lexical_score, s.semantic_score, s.hybrid_score] {
        assert!((0.0..=100.0).contains(&value));
    }
}

#[tokio::test]
async fn test_fixture_match_is_deterministic() {
    let mut manager = InputManager::new();
    let resume = manager.extract_text(&fixture("sample_resume.txt")).await.unwrap();
    let job = manager.extract_text(&fixture("job_description.txt")).await.unwrap();
    let engine = hashing_engine();

    let first = engine.evaluate(&resume, &job).unwrap();
    let second = engine.evaluate(&resume, &job).unwrap();

    assert_eq!(
        first.evaluation.scores.hybrid_score.to_bits(),
        second.evaluation.scores.hybrid_score.to_bits()
    );
    assert_eq!(first.evaluation.matched_skills, second.evaluation.matched_skills);
    assert!(first.evaluation.matched_skills.contains("React"));
    assert!(first.evaluation.missing_skills.contains("Kubernetes"));
    assert_eq!(first.evaluation.resume.fields.cgpa, Some(8.4));
    assert_eq!(first.evaluation.resume.fields.experience_years, Some(5));

    let response = MatchResponse::from_report(&first, "hashing");
    let json = ReportGenerator::with_options(false, true)
        .generate_match(&response, resume_ranker::config::OutputFormat::Json)
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["scores"]["hybridScore"].is_number());
}

#[test]
fn test_top_chunks_capped_by_available_chunks() {
    // 599 characters: one full 500-char window plus the trailing window.
    let resume = "Rust systems programmer. ".repeat(24);
    let report = hashing_engine().evaluate(&resume, "Rust engineer").unwrap();

    assert_eq!(report.evaluation.resume.chunks.len(), 2);
    assert_eq!(report.evaluation.top_chunks.len(), 2);
    for chunk in &report.evaluation.top_chunks {
        assert!((0.0..=1.0).contains(&chunk.relevance));
    }
}

#[tokio::test]
async fn test_empty_job_description_never_embeds() {
    let counting = Arc::new(CountingEmbedder::new());
    let engine = engine_with(counting.clone());
    let coordinator = BatchMatchCoordinator::new(engine, WorkerPool::new(2));

    let result = coordinator
        .run(request(
            "  \n ",
            vec![candidate("a@x.com", "1", "Python"), candidate("b@x.com", "2", "SQL")],
        ))
        .await;

    assert!(matches!(
        result,
        Err(ResumeRankerError::EmptyDocument { role: DocumentRole::JobDescription })
    ));
    assert_eq!(counting.calls(), 0);
}

#[tokio::test]
async fn test_batch_with_one_empty_resume_is_partial() {
    let mut candidates: Vec<CandidateDocument> = (0..9)
        .map(|i| {
            candidate(
                &format!("candidate{}@example.com", i),
                &format!("doc-{}", i),
                &format!("Backend developer number {} with Python, Django and {} years of experience", i, i + 1),
            )
        })
        .collect();
    candidates.insert(4, candidate("blank@example.com", "doc-blank", " \t\n"));

    let batch = BatchMatchCoordinator::new(hashing_engine(), WorkerPool::new(3))
        .run(request("Python Django backend developer", candidates))
        .await
        .unwrap();

    assert_eq!(batch.status, BatchStatus::Partial);
    assert_eq!(batch.excluded_count, 1);
    assert_eq!(batch.ranked.len(), 9);
    assert_eq!(batch.failures[0].identity, "blank@example.com");
    assert_eq!(batch.failures[0].reason, FailureReason::EmptyDocument);
    assert!(batch
        .ranked
        .windows(2)
        .all(|w| w[0].scores.hybrid_score >= w[1].scores.hybrid_score));
}

#[tokio::test]
async fn test_duplicate_identity_keeps_best_score() {
    let engine = hashing_engine();
    let job = "Python Django SQL backend developer";
    let weak = "Graphic designer, print layout";
    let strong = "Python Django SQL backend developer with Docker";

    let weak_score = engine.evaluate(weak, job).unwrap().evaluation.scores.hybrid_score;
    let strong_score = engine.evaluate(strong, job).unwrap().evaluation.scores.hybrid_score;
    assert!(strong_score > weak_score);

    let batch = BatchMatchCoordinator::new(engine, WorkerPool::new(2))
        .run(request(
            job,
            vec![
                candidate("same@example.com", "strong", strong),
                candidate("same@example.com", "weak", weak),
                candidate("other@example.com", "1", "Django developer"),
            ],
        ))
        .await
        .unwrap();

    let same: Vec<_> = batch.ranked.iter().filter(|m| m.identity == "same@example.com").collect();
    assert_eq!(same.len(), 1);
    assert_eq!(same[0].document_id, "strong");
    assert_eq!(same[0].scores.hybrid_score, strong_score);
    assert_eq!(batch.ranked.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_deadline_excludes_slow_candidates() {
    let slow = Arc::new(SlowEmbedder {
        inner: HashingEmbedder::new(128).unwrap(),
        marker: "glacial",
        delay: Duration::from_millis(1500),
    });
    let coordinator = BatchMatchCoordinator::new(engine_with(slow), WorkerPool::new(4));

    let mut req = request(
        "Python developer",
        vec![
            candidate("fast1@example.com", "1", "Python developer"),
            candidate("slow@example.com", "2", "glacial Python developer"),
            candidate("fast2@example.com", "3", "Django developer"),
        ],
    );
    req.deadline = Duration::from_millis(400);

    let batch = coordinator.run(req).await.unwrap();

    assert_eq!(batch.status, BatchStatus::Partial);
    assert_eq!(batch.ranked.len(), 2);
    assert_eq!(batch.excluded_count, 1);
    assert_eq!(batch.failures[0].identity, "slow@example.com");
    assert_eq!(batch.failures[0].reason, FailureReason::DeadlineExceeded);
    assert!(batch.elapsed_ms < 1500);
}

#[tokio::test]
async fn test_manifest_batch_end_to_end() {
    let loaded = ManifestStore::new(fixture("manifest.toml")).load_candidates().await.unwrap();
    assert_eq!(loaded.documents.len(), 3);
    assert_eq!(loaded.failures.len(), 1);
    assert_eq!(loaded.failures[0].identity, "dave@example.com");

    let mut manager = InputManager::new();
    let job = manager.extract_text(&fixture("job_description.txt")).await.unwrap();

    let mut req = request(&job, loaded.documents);
    req.top_k = 2;
    req.failed = loaded.failures;
    let batch = BatchMatchCoordinator::new(hashing_engine(), WorkerPool::new(2))
        .run(req)
        .await
        .unwrap();

    assert_eq!(batch.status, BatchStatus::Partial);
    assert_eq!(batch.excluded_count, 1);
    assert_eq!(batch.ranked.len(), 2);
    assert_eq!(batch.ranked[0].identity, "alice@example.com");
    assert!(batch.ranked.iter().all(|m| m.identity != "bob@example.com"));

    let response = BatchResponse::from_batch(&batch, "hashing");
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["status"], "partial");
    assert_eq!(json["excludedCount"], 1);
    assert_eq!(json["ranked"][0]["rank"], 1);
    assert_eq!(json["failures"][0]["identity"], "dave@example.com");
    assert_eq!(json["failures"][0]["reason"]["kind"], "extraction");
}
