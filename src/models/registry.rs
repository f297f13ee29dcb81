//! Process-wide, read-only model state

use crate::config::{Config, EmbeddingBackend};
use crate::error::{Result, ResumeRankerError};
use crate::models::bert::BertEmbedder;
use crate::models::hashing::HashingEmbedder;
use crate::models::manager::EmbeddingModelManager;
use crate::models::static_model::StaticEmbedder;
use crate::processing::embeddings::Embedder;
use crate::processing::tagger::{RuleTagger, Tagger};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Owns the embedder and tagger for the lifetime of the process.
///
/// Created once before any request is served and handed to every component
/// by `Arc`. Nothing in here is mutated after construction, so workers call
/// into it concurrently without locking.
pub struct ModelRegistry {
    embedder: Arc<dyn Embedder>,
    tagger: Arc<dyn Tagger>,
    backend: EmbeddingBackend,
    loaded_at: DateTime<Utc>,
    load_time_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryHealth {
    pub ready: bool,
    pub backend: EmbeddingBackend,
    pub embedder: String,
    pub dimension: usize,
    pub tagger: String,
    pub loaded_at: DateTime<Utc>,
    pub load_time_ms: u64,
}

impl ModelRegistry {
    pub fn new(embedder: Arc<dyn Embedder>, tagger: Arc<dyn Tagger>, backend: EmbeddingBackend) -> Self {
        Self {
            embedder,
            tagger,
            backend,
            loaded_at: Utc::now(),
            load_time_ms: 0,
        }
    }

    /// Registry backed by the hashing embedder. Needs no model files.
    pub fn hashing(dimension: usize) -> Result<Self> {
        Ok(Self::new(
            Arc::new(HashingEmbedder::new(dimension)?),
            Arc::new(RuleTagger::new()),
            EmbeddingBackend::Hashing,
        ))
    }

    /// Load the configured backend, downloading model files when allowed.
    /// Any failure surfaces as `ModelUnavailable`.
    pub async fn load(config: &Config) -> Result<Self> {
        let start_time = Instant::now();
        let backend = config.models.embedding_backend;
        log::info!("Loading model registry (backend: {:?})", backend);

        let embedder: Arc<dyn Embedder> = match backend {
            EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new(config.models.hashing_dimension)?),
            EmbeddingBackend::Static | EmbeddingBackend::Bert => {
                let mut manager = EmbeddingModelManager::new(
                    config.models_dir().clone(),
                    config.models.available_models.clone(),
                )
                .await
                .map_err(unavailable)?;

                let model_id = config.models.embedding_model.clone();
                let model_path = manager
                    .ensure_model_available(&model_id, config.models.allow_download)
                    .await
                    .map_err(unavailable)?;

                let loaded = tokio::task::spawn_blocking(move || -> Result<Arc<dyn Embedder>> {
                    let embedder: Arc<dyn Embedder> = match backend {
                        EmbeddingBackend::Bert => Arc::new(BertEmbedder::load(&model_path, &model_id)?),
                        _ => Arc::new(StaticEmbedder::load(&model_path, &model_id)?),
                    };
                    Ok(embedder)
                })
                .await
                .map_err(|e| ResumeRankerError::ModelUnavailable(format!("model loader panicked: {}", e)))?;

                loaded.map_err(unavailable)?
            }
        };

        let mut registry = Self::new(embedder, Arc::new(RuleTagger::new()), backend);
        registry.load_time_ms = start_time.elapsed().as_millis() as u64;
        registry.ensure_ready()?;

        log::info!(
            "Model registry ready in {} ms ({}, {} dimensions)",
            registry.load_time_ms,
            registry.embedder.name(),
            registry.embedder.dimension()
        );

        Ok(registry)
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn tagger(&self) -> &Arc<dyn Tagger> {
        &self.tagger
    }

    pub fn is_ready(&self) -> bool {
        self.embedder.dimension() > 0
    }

    pub fn ensure_ready(&self) -> Result<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(ResumeRankerError::ModelUnavailable(format!(
                "embedder {} reports zero dimensions",
                self.embedder.name()
            )))
        }
    }

    pub fn health(&self) -> RegistryHealth {
        RegistryHealth {
            ready: self.is_ready(),
            backend: self.backend,
            embedder: self.embedder.name().to_string(),
            dimension: self.embedder.dimension(),
            tagger: self.tagger.name().to_string(),
            loaded_at: self.loaded_at,
            load_time_ms: self.load_time_ms,
        }
    }
}

fn unavailable(err: ResumeRankerError) -> ResumeRankerError {
    match err {
        ResumeRankerError::ModelUnavailable(_) => err,
        other => ResumeRankerError::ModelUnavailable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_hashing_registry_is_ready() {
        let registry = ModelRegistry::hashing(64).unwrap();
        let health = registry.health();

        assert!(health.ready);
        assert_eq!(health.dimension, 64);
        assert_eq!(health.backend, EmbeddingBackend::Hashing);
        assert_eq!(health.tagger, "rule-uax29");
    }

    #[tokio::test]
    async fn test_load_hashing_backend() {
        let mut config = Config::default();
        config.models.embedding_backend = EmbeddingBackend::Hashing;
        config.models.hashing_dimension = 128;

        let registry = ModelRegistry::load(&config).await.unwrap();
        assert_eq!(registry.embedder().dimension(), 128);
    }

    #[tokio::test]
    async fn test_missing_model_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.models.models_dir = temp_dir.path().to_path_buf();
        config.models.allow_download = false;

        let result = ModelRegistry::load(&config).await;
        assert!(matches!(result, Err(ResumeRankerError::ModelUnavailable(_))));
    }
}
