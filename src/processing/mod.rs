//! Text processing and matching module

pub mod chunk_index;
pub mod document;
pub mod embeddings;
pub mod fields;
pub mod lexical;
pub mod matcher;
pub mod normalizer;
pub mod scorer;
pub mod skills;
pub mod tagger;

pub use matcher::{MatchEngine, MatchEvaluation, MatchReport};
