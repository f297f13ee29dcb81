//! One job description against many resumes

use crate::batch::pool::{CancelToken, TaskError, WorkerPool};
use crate::batch::ranking::{deduplicate, rank, CandidateMatch};
use crate::error::{DocumentRole, Result, ResumeRankerError};
use crate::processing::document::Document;
use crate::processing::MatchEngine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{Id, JoinSet};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Pending,
    Running,
    Completed,
    PartiallyFailed,
    Failed,
}

/// A resume submitted for ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDocument {
    /// Stable candidate identity (for example an email address).
    pub identity: String,
    /// Identifies this particular document when one identity has several.
    pub document_id: String,
    pub resume_text: String,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub job_description: String,
    pub candidates: Vec<CandidateDocument>,
    pub top_k: usize,
    pub deadline: Duration,
    /// Candidates whose document could not be read. They are never scored
    /// but count as excluded, exactly like a candidate that fails scoring.
    pub failed: Vec<CandidateFailure>,
}

/// Deadline used when `started + deadline` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum FailureReason {
    EmptyDocument,
    Extraction(String),
    Scoring(String),
    DeadlineExceeded,
    Aborted(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::EmptyDocument => write!(f, "resume is empty after normalization"),
            FailureReason::Extraction(msg) => write!(f, "text extraction failed: {}", msg),
            FailureReason::Scoring(msg) => write!(f, "scoring failed: {}", msg),
            FailureReason::DeadlineExceeded => write!(f, "not finished before the batch deadline"),
            FailureReason::Aborted(msg) => write!(f, "task aborted: {}", msg),
        }
    }
}

/// A candidate document excluded from ranking, kept distinguishable from a
/// low score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateFailure {
    pub identity: String,
    pub document_id: String,
    pub reason: FailureReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Completed,
    Partial,
}

#[derive(Debug, Clone)]
pub struct RankedBatch {
    pub ranked: Vec<CandidateMatch>,
    pub excluded_count: usize,
    pub status: BatchStatus,
    pub failures: Vec<CandidateFailure>,
    pub elapsed_ms: u64,
}

pub struct BatchMatchCoordinator {
    engine: Arc<MatchEngine>,
    pool: WorkerPool,
}

struct BatchRun {
    state: BatchState,
    started: Instant,
}

impl BatchRun {
    fn new() -> Self {
        Self {
            state: BatchState::Pending,
            started: Instant::now(),
        }
    }

    fn transition(&mut self, next: BatchState) {
        log::info!("Batch {:?} -> {:?} after {} ms", self.state, next, self.elapsed_ms());
        self.state = next;
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

impl BatchMatchCoordinator {
    pub fn new(engine: Arc<MatchEngine>, pool: WorkerPool) -> Self {
        Self { engine, pool }
    }

    /// Score every candidate, isolate per-candidate failures, then dedup by
    /// identity and return the top `top_k`.
    ///
    /// The job description is validated before any candidate is dispatched.
    /// Candidates still running at the deadline are excluded and whatever
    /// finished is ranked. Fails as a whole only when the request is invalid,
    /// the job description cannot be prepared, or every candidate failed.
    pub async fn run(&self, request: BatchRequest) -> Result<RankedBatch> {
        let mut run = BatchRun::new();

        if request.top_k == 0 {
            return Err(ResumeRankerError::InvalidInput("top_k must be greater than 0".to_string()));
        }
        if request.deadline.is_zero() {
            return Err(ResumeRankerError::InvalidInput("deadline must be greater than 0".to_string()));
        }

        let job_text = self
            .engine
            .normalize(&request.job_description, DocumentRole::JobDescription)?;
        self.engine.registry().ensure_ready()?;

        let deadline = run
            .started
            .checked_add(request.deadline)
            .unwrap_or_else(|| run.started + FAR_FUTURE);
        let cancel = CancelToken::new();
        run.transition(BatchState::Running);

        let engine = self.engine.clone();
        let job = match self
            .pool
            .submit(&cancel, move || engine.prepare_job(job_text))
            .join_until(deadline)
            .await
        {
            Ok(Ok(job)) => Arc::new(job),
            Ok(Err(e)) => {
                run.transition(BatchState::Failed);
                return Err(e);
            }
            Err(TaskError::TimedOut) | Err(TaskError::Cancelled) => {
                run.transition(BatchState::Failed);
                return Err(ResumeRankerError::DeadlineExceeded {
                    elapsed_ms: run.elapsed_ms(),
                });
            }
            Err(TaskError::Aborted(msg)) => {
                run.transition(BatchState::Failed);
                return Err(ResumeRankerError::Processing(format!("job description preparation aborted: {}", msg)));
            }
        };

        let total = request.candidates.len() + request.failed.len();
        let mut outcomes: Vec<Option<std::result::Result<CandidateMatch, FailureReason>>> =
            (0..request.candidates.len()).map(|_| None).collect();
        let (mut tasks, task_index) = self.dispatch(&request.candidates, &job, &cancel);

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next_with_id()).await {
                Ok(Some(Ok((_, (index, outcome))))) => outcomes[index] = Some(outcome),
                Ok(Some(Err(e))) => {
                    log::error!("Candidate task failed to join: {}", e);
                    if let Some(&index) = task_index.get(&e.id()) {
                        outcomes[index] = Some(Err(FailureReason::Aborted(e.to_string())));
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    log::warn!(
                        "Batch deadline of {} ms reached with {} candidates unfinished",
                        request.deadline.as_millis(),
                        tasks.len()
                    );
                    cancel.cancel();
                    tasks.abort_all();
                    break;
                }
            }
        }

        let mut matches = Vec::new();
        let mut failures = request.failed.clone();
        for failure in &failures {
            log::warn!("Excluding {} ({}): {}", failure.identity, failure.document_id, failure.reason);
        }
        for (candidate, outcome) in request.candidates.iter().zip(outcomes) {
            match outcome.unwrap_or(Err(FailureReason::DeadlineExceeded)) {
                Ok(candidate_match) => matches.push(candidate_match),
                Err(reason) => {
                    log::warn!(
                        "Excluding {} ({}): {}",
                        candidate.identity,
                        candidate.document_id,
                        reason
                    );
                    failures.push(CandidateFailure {
                        identity: candidate.identity.clone(),
                        document_id: candidate.document_id.clone(),
                        reason,
                    });
                }
            }
        }

        if total > 0 && failures.len() == total {
            run.transition(BatchState::Failed);
            if failures.iter().all(|f| f.reason == FailureReason::DeadlineExceeded) {
                return Err(ResumeRankerError::DeadlineExceeded {
                    elapsed_ms: run.elapsed_ms(),
                });
            }
            return Err(ResumeRankerError::BatchFailed { failed: total });
        }

        let status = if failures.is_empty() {
            run.transition(BatchState::Completed);
            BatchStatus::Completed
        } else {
            run.transition(BatchState::PartiallyFailed);
            BatchStatus::Partial
        };

        let ranked = rank(deduplicate(matches), request.top_k);

        Ok(RankedBatch {
            ranked,
            excluded_count: failures.len(),
            status,
            failures,
            elapsed_ms: run.elapsed_ms(),
        })
    }

    fn dispatch(
        &self,
        candidates: &[CandidateDocument],
        job: &Arc<Document>,
        cancel: &CancelToken,
    ) -> (
        JoinSet<(usize, std::result::Result<CandidateMatch, FailureReason>)>,
        HashMap<Id, usize>,
    ) {
        let mut tasks = JoinSet::new();
        let mut task_index = HashMap::new();

        for (index, candidate) in candidates.iter().cloned().enumerate() {
            let engine = self.engine.clone();
            let job = job.clone();

            let handle = self.pool.submit(cancel, move || {
                let evaluation = engine.score(&job, &candidate.resume_text)?;
                Ok::<_, ResumeRankerError>(CandidateMatch {
                    identity: candidate.identity,
                    document_id: candidate.document_id,
                    submitted_at: candidate.submitted_at,
                    sequence: index,
                    document: evaluation.resume,
                    scores: evaluation.scores,
                    matched_skills: evaluation.matched_skills,
                    missing_skills: evaluation.missing_skills,
                    top_chunks: evaluation.top_chunks,
                })
            });

            let abort = tasks.spawn(async move {
                let outcome = match handle.await {
                    Ok(Ok(candidate_match)) => Ok(candidate_match),
                    Ok(Err(e)) if e.is_empty_document() => Err(FailureReason::EmptyDocument),
                    Ok(Err(e)) => Err(FailureReason::Scoring(e.to_string())),
                    Err(TaskError::Cancelled) | Err(TaskError::TimedOut) => Err(FailureReason::DeadlineExceeded),
                    Err(TaskError::Aborted(msg)) => Err(FailureReason::Aborted(msg)),
                };
                (index, outcome)
            });
            task_index.insert(abort.id(), index);
        }

        log::debug!("Dispatched {} candidates to a pool of {}", candidates.len(), self.pool.capacity());
        (tasks, task_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, EmbeddingBackend};
    use crate::models::ModelRegistry;
    use crate::processing::embeddings::Embedder;
    use crate::processing::tagger::RuleTagger;

    fn coordinator(workers: usize) -> BatchMatchCoordinator {
        let registry = Arc::new(ModelRegistry::hashing(128).unwrap());
        let engine = Arc::new(MatchEngine::new(registry, &Config::default()).unwrap());
        BatchMatchCoordinator::new(engine, WorkerPool::new(workers))
    }

    fn candidate(identity: &str, document_id: &str, text: &str) -> CandidateDocument {
        CandidateDocument {
            identity: identity.to_string(),
            document_id: document_id.to_string(),
            resume_text: text.to_string(),
            submitted_at: None,
        }
    }

    fn request(candidates: Vec<CandidateDocument>) -> BatchRequest {
        BatchRequest {
            job_description: "Python backend developer with Django, SQL and Docker".to_string(),
            candidates,
            top_k: 10,
            deadline: Duration::from_secs(30),
            failed: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_all_succeed() {
        let batch = coordinator(2)
            .run(request(vec![
                candidate("a@x.com", "1", "Python and Django developer, SQL expert, Docker"),
                candidate("b@x.com", "2", "Graphic designer with Photoshop"),
            ]))
            .await
            .unwrap();

        assert_eq!(batch.status, BatchStatus::Completed);
        assert_eq!(batch.excluded_count, 0);
        assert_eq!(batch.ranked.len(), 2);
        assert_eq!(batch.ranked[0].identity, "a@x.com");
    }

    #[tokio::test]
    async fn test_failed_candidate_is_isolated() {
        let batch = coordinator(4)
            .run(request(vec![
                candidate("a@x.com", "1", "Python developer"),
                candidate("b@x.com", "2", "  \n "),
                candidate("c@x.com", "3", "Django and SQL"),
            ]))
            .await
            .unwrap();

        assert_eq!(batch.status, BatchStatus::Partial);
        assert_eq!(batch.excluded_count, 1);
        assert_eq!(batch.failures[0].identity, "b@x.com");
        assert_eq!(batch.failures[0].reason, FailureReason::EmptyDocument);
        assert_eq!(batch.ranked.len(), 2);
    }

    #[tokio::test]
    async fn test_all_failed_is_batch_error() {
        let result = coordinator(2)
            .run(request(vec![candidate("a@x.com", "1", ""), candidate("b@x.com", "2", " ")]))
            .await;

        assert!(matches!(result, Err(ResumeRankerError::BatchFailed { failed: 2 })));
    }

    #[tokio::test]
    async fn test_empty_job_description_fails_fast() {
        let mut req = request(vec![candidate("a@x.com", "1", "Python")]);
        req.job_description = "\t".to_string();

        let result = coordinator(2).run(req).await;
        assert!(matches!(
            result,
            Err(ResumeRankerError::EmptyDocument { role: DocumentRole::JobDescription })
        ));
    }

    #[tokio::test]
    async fn test_duplicates_collapse_and_top_k_applies() {
        let mut req = request(vec![
            candidate("a@x.com", "weak", "Graphic designer"),
            candidate("a@x.com", "strong", "Python Django SQL Docker backend developer"),
            candidate("b@x.com", "1", "Python developer"),
            candidate("c@x.com", "1", "Django developer"),
        ]);
        req.top_k = 2;

        let batch = coordinator(3).run(req).await.unwrap();

        assert_eq!(batch.ranked.len(), 2);
        assert_eq!(batch.ranked[0].identity, "a@x.com");
        assert_eq!(batch.ranked[0].document_id, "strong");
        let identities: Vec<&str> = batch.ranked.iter().map(|m| m.identity.as_str()).collect();
        assert!(identities.windows(2).all(|w| w[0] != w[1]));
    }

    #[tokio::test]
    async fn test_empty_candidate_list() {
        let batch = coordinator(2).run(request(vec![])).await.unwrap();

        assert_eq!(batch.status, BatchStatus::Completed);
        assert!(batch.ranked.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_request() {
        let mut req = request(vec![]);
        req.top_k = 0;
        assert!(matches!(coordinator(1).run(req).await, Err(ResumeRankerError::InvalidInput(_))));

        let mut req = request(vec![]);
        req.deadline = Duration::ZERO;
        assert!(matches!(coordinator(1).run(req).await, Err(ResumeRankerError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_unreadable_documents_count_as_excluded() {
        let mut req = request(vec![
            candidate("a@x.com", "1", "Python developer"),
            candidate("b@x.com", "2", "Django and SQL"),
        ]);
        req.failed.push(CandidateFailure {
            identity: "c@x.com".to_string(),
            document_id: "resumes/c.pdf".to_string(),
            reason: FailureReason::Extraction("File does not exist".to_string()),
        });

        let batch = coordinator(2).run(req).await.unwrap();

        assert_eq!(batch.status, BatchStatus::Partial);
        assert_eq!(batch.excluded_count, 1);
        assert_eq!(batch.ranked.len(), 2);
        assert_eq!(batch.failures[0].identity, "c@x.com");
        assert!(matches!(batch.failures[0].reason, FailureReason::Extraction(_)));
    }

    #[tokio::test]
    async fn test_only_unreadable_documents_is_batch_error() {
        let mut req = request(vec![]);
        req.failed.push(CandidateFailure {
            identity: "c@x.com".to_string(),
            document_id: "c.pdf".to_string(),
            reason: FailureReason::Extraction("corrupt".to_string()),
        });

        let result = coordinator(1).run(req).await;
        assert!(matches!(result, Err(ResumeRankerError::BatchFailed { failed: 1 })));
    }

    #[tokio::test]
    async fn test_unbounded_deadline() {
        let mut req = request(vec![candidate("a@x.com", "1", "Python developer")]);
        req.deadline = Duration::from_millis(u64::MAX);

        let batch = coordinator(1).run(req).await.unwrap();

        assert_eq!(batch.status, BatchStatus::Completed);
        assert_eq!(batch.ranked.len(), 1);
    }

    struct PanickingEmbedder {
        inner: crate::models::hashing::HashingEmbedder,
    }

    impl Embedder for PanickingEmbedder {
        fn name(&self) -> &str {
            "panicking"
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }

        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.contains("explode") {
                panic!("embedder crashed");
            }
            self.inner.embed(text)
        }
    }

    #[tokio::test]
    async fn test_crashed_task_is_aborted_not_deadline() {
        let registry = Arc::new(ModelRegistry::new(
            Arc::new(PanickingEmbedder {
                inner: crate::models::hashing::HashingEmbedder::new(64).unwrap(),
            }),
            Arc::new(RuleTagger::new()),
            EmbeddingBackend::Hashing,
        ));
        let engine = Arc::new(MatchEngine::new(registry, &Config::default()).unwrap());
        let coordinator = BatchMatchCoordinator::new(engine, WorkerPool::new(2));

        let batch = coordinator
            .run(request(vec![
                candidate("a@x.com", "1", "Python developer"),
                candidate("b@x.com", "2", "explode Django"),
            ]))
            .await
            .unwrap();

        assert_eq!(batch.status, BatchStatus::Partial);
        assert_eq!(batch.failures[0].identity, "b@x.com");
        assert!(matches!(batch.failures[0].reason, FailureReason::Aborted(_)));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&BatchStatus::Partial).unwrap(), "\"partial\"");
        assert_eq!(serde_json::to_string(&BatchStatus::Completed).unwrap(), "\"completed\"");
    }
}
