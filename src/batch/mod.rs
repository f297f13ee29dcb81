//! Concurrent batch evaluation and ranking

pub mod coordinator;
pub mod pool;
pub mod ranking;

pub use coordinator::{
    BatchMatchCoordinator, BatchRequest, BatchState, BatchStatus, CandidateDocument, CandidateFailure,
    FailureReason, RankedBatch,
};
pub use pool::{CancelToken, TaskError, TaskHandle, WorkerPool};
pub use ranking::CandidateMatch;
