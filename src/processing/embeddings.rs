//! Embedding abstraction and semantic similarity

use crate::error::{Result, ResumeRankerError};

/// Maps text to a fixed-dimension dense vector.
///
/// Implementations are shared read-only across the worker pool, so `embed`
/// takes `&self` and must be safe to call concurrently.
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    fn dimension(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Calculate cosine similarity between two embeddings
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(ResumeRankerError::Embedding(format!(
            "Embedding dimensions don't match: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    if a.is_empty() {
        return Ok(0.0);
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        Ok(0.0)
    } else {
        Ok(dot_product / (norm_a * norm_b))
    }
}

/// Cosine similarity of whole-document embeddings, scaled to 0-100.
/// Negative cosines (opposed meaning) clamp to zero.
#[derive(Debug, Clone, Default)]
pub struct SemanticSimilarity;

impl SemanticSimilarity {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, resume: &[f32], job: &[f32]) -> Result<f64> {
        let cosine = cosine_similarity(resume, job)? as f64;
        Ok((cosine * 100.0).clamp(0.0, 100.0))
    }
}
