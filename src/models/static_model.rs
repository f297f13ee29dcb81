//! Model2Vec static embeddings

use crate::error::{Result, ResumeRankerError};
use crate::processing::embeddings::Embedder;
use model2vec_rs::model::StaticModel;
use std::path::Path;
use std::time::Instant;

pub struct StaticEmbedder {
    model: StaticModel,
    name: String,
    dimension: usize,
}

impl StaticEmbedder {
    /// Load a Model2Vec model from a local directory. Blocking; call from
    /// `spawn_blocking` when running inside the runtime.
    pub fn load(model_path: &Path, name: &str) -> Result<Self> {
        let start_time = Instant::now();
        log::info!("Loading Model2Vec embedding model from: {}", model_path.display());

        let model = StaticModel::from_pretrained(
            model_path,
            None, // token
            None, // normalize
            None, // subfolder
        )
        .map_err(|e| ResumeRankerError::ModelUnavailable(format!("Failed to load model: {}", e)))?;

        let dimension = model.encode_single("dimension probe").len();
        if dimension == 0 {
            return Err(ResumeRankerError::ModelUnavailable(format!(
                "model at {} produced empty embeddings",
                model_path.display()
            )));
        }

        log::info!("Model loaded in {:.2?} ({} dimensions)", start_time.elapsed(), dimension);

        Ok(Self {
            model,
            name: name.to_string(),
            dimension,
        })
    }
}

impl Embedder for StaticEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.model.encode_single(text))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(self.model.encode(texts))
    }
}
