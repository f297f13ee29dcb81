//! Resume chunking and per-query chunk retrieval

use crate::config::ProcessingConfig;
use crate::error::{Result, ResumeRankerError};
use crate::processing::document::Chunk;
use crate::processing::embeddings::{cosine_similarity, Embedder};
use serde::Serialize;

/// Sliding character window over normalized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingPolicy {
    pub window: usize,
    pub stride: usize,
}

impl Default for ChunkingPolicy {
    fn default() -> Self {
        Self {
            window: 500,
            stride: 250,
        }
    }
}

impl ChunkingPolicy {
    pub fn new(window: usize, stride: usize) -> Result<Self> {
        if window == 0 {
            return Err(ResumeRankerError::InvalidInput("chunk window must be positive".to_string()));
        }
        if stride == 0 || stride > window {
            return Err(ResumeRankerError::InvalidInput(format!(
                "chunk stride must be in 1..={} (got {})",
                window, stride
            )));
        }
        Ok(Self { window, stride })
    }

    pub fn from_config(config: &ProcessingConfig) -> Result<Self> {
        Self::new(config.chunk_window, config.chunk_stride)
    }

    /// Split `text` into windows covering every character. The final window
    /// ends exactly at the end of the text and may be shorter than `window`.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let mut chunks = Vec::new();
        if total == 0 {
            return chunks;
        }

        let mut start = 0;
        loop {
            let end = (start + self.window).min(total);
            chunks.push(Chunk {
                text: chars[start..end].iter().collect(),
                start_offset: start,
                end_offset: end,
                embedding: Vec::new(),
            });
            if end == total {
                break;
            }
            start += self.stride;
        }

        chunks
    }
}

/// Fill in chunk embeddings in one batch call.
pub fn embed_chunks(embedder: &dyn Embedder, chunks: &mut [Chunk]) -> Result<()> {
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let embeddings = embedder.embed_batch(&texts)?;
    if embeddings.len() != chunks.len() {
        return Err(ResumeRankerError::Embedding(format!(
            "embedder returned {} vectors for {} chunks",
            embeddings.len(),
            chunks.len()
        )));
    }
    for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
        chunk.embedding = embedding;
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedChunk {
    pub text: String,
    pub relevance: f32,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// Nearest-neighbour view over one resume's chunks. Built per evaluation and
/// never shared between candidates.
pub struct ChunkIndex<'a> {
    chunks: &'a [Chunk],
}

impl<'a> ChunkIndex<'a> {
    pub fn new(chunks: &'a [Chunk]) -> Self {
        Self { chunks }
    }

    /// The `min(k, len)` chunks most similar to `query`, most relevant first.
    /// Equal relevance falls back to document order.
    pub fn retrieve(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        let mut scored = Vec::with_capacity(self.chunks.len());
        for chunk in self.chunks {
            let relevance = cosine_similarity(&chunk.embedding, query)?.clamp(0.0, 1.0);
            scored.push((relevance, chunk));
        }

        scored.sort_by(|(ra, ca), (rb, cb)| {
            rb.total_cmp(ra).then(ca.start_offset.cmp(&cb.start_offset))
        });

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(relevance, chunk)| RetrievedChunk {
                text: chunk.text.clone(),
                relevance,
                start_offset: chunk.start_offset,
                end_offset: chunk.end_offset,
            })
            .collect())
    }
}
