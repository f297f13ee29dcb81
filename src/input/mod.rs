//! Input processing module
//! Handles file detection, text extraction, and candidate document stores

pub mod file_detector;
pub mod manager;
pub mod store;
pub mod text_extractor;

pub use manager::InputManager;
pub use store::{CandidateStore, LoadedCandidates, ManifestStore, MemoryStore};
