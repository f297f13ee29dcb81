//! Document structures produced by the matching pipeline

use crate::error::DocumentRole;
use crate::processing::fields::DocumentFields;
use crate::processing::lexical::TermCounts;
use crate::processing::skills::SkillSet;
use serde::{Deserialize, Serialize};

/// A contiguous window of a normalized resume.
///
/// Offsets count characters (not bytes) into the normalized text, so
/// `start_offset < end_offset <= char_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

/// A normalized document with every derived representation attached.
#[derive(Debug, Clone)]
pub struct Document {
    pub role: DocumentRole,
    /// Extracted text as submitted, before normalization.
    pub raw_text: String,
    /// Normalized text; chunk offsets index into this.
    pub text: String,
    pub skills: SkillSet,
    pub fields: DocumentFields,
    pub terms: TermCounts,
    pub embedding: Vec<f32>,
    /// Populated for resumes only; job descriptions are never chunked.
    pub chunks: Vec<Chunk>,
}
