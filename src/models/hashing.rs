//! Feature-hashing embedder that needs no model files

use crate::error::{Result, ResumeRankerError};
use crate::processing::embeddings::Embedder;
use unicode_segmentation::UnicodeSegmentation;

const BIGRAM_WEIGHT: f32 = 0.5;

/// Projects unigrams and bigrams into a fixed number of signed buckets using
/// BLAKE3, then L2-normalizes. Output depends only on the input text and the
/// dimension, so it is stable across runs and platforms.
pub struct HashingEmbedder {
    dimension: usize,
    name: String,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(ResumeRankerError::Configuration(
                "hashing embedder dimension must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            name: format!("hashing-blake3-{}", dimension),
        })
    }

    fn bucket(&self, feature: &str) -> (usize, f32) {
        let hash = blake3::hash(feature.as_bytes());
        let bytes = hash.as_bytes();
        let mut index_bytes = [0u8; 8];
        index_bytes.copy_from_slice(&bytes[..8]);
        let index = (u64::from_le_bytes(index_bytes) % self.dimension as u64) as usize;
        let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
        (index, sign)
    }
}

impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let words: Vec<String> = text.unicode_words().map(|w| w.to_lowercase()).collect();
        let mut vector = vec![0.0f32; self.dimension];

        for word in &words {
            let (index, sign) = self.bucket(word);
            vector[index] += sign;
        }
        for pair in words.windows(2) {
            let (index, sign) = self.bucket(&format!("{} {}", pair[0], pair[1]));
            vector[index] += sign * BIGRAM_WEIGHT;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        Ok(vector)
    }
}
