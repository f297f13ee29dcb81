//! Embedding model management for downloading and locating model files

use crate::config::{AvailableModel, EmbeddingBackend};
use crate::error::{Result, ResumeRankerError};
use hf_hub::api::tokio::Api;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Manager for embedding models - handles download, caching, and lookup
pub struct EmbeddingModelManager {
    models_dir: PathBuf,
    available_models: Vec<AvailableModel>,
    downloaded_models: HashSet<String>,
}

impl EmbeddingModelManager {
    /// Create a new embedding model manager over a catalogue of known models
    pub async fn new(models_dir: PathBuf, available_models: Vec<AvailableModel>) -> Result<Self> {
        if !models_dir.exists() {
            fs::create_dir_all(&models_dir).await?;
        }

        let mut manager = Self {
            models_dir,
            available_models,
            downloaded_models: HashSet::new(),
        };

        manager.scan_downloaded_models().await?;

        Ok(manager)
    }

    /// Scan for already downloaded models
    async fn scan_downloaded_models(&mut self) -> Result<()> {
        let mut entries = fs::read_dir(&self.models_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let model_name = entry.file_name().to_string_lossy().to_string();
            let backend = self
                .get_model_info(&model_name)
                .map(|m| m.backend)
                .unwrap_or(EmbeddingBackend::Static);

            if is_valid_model_directory(&entry.path(), backend).await {
                self.downloaded_models.insert(model_name);
            }
        }

        Ok(())
    }

    /// Download an embedding model from Hugging Face Hub
    pub async fn download_model(&mut self, model_id: &str) -> Result<PathBuf> {
        let model_info = self
            .get_model_info(model_id)
            .cloned()
            .ok_or_else(|| ResumeRankerError::InvalidInput(format!("Unknown embedding model: {}", model_id)))?;

        let model_dir = self.models_dir.join(&model_info.name);

        if self.downloaded_models.contains(&model_info.name) {
            return Ok(model_dir);
        }

        log::info!(
            "Downloading embedding model {} ({} MB) from {}",
            model_info.name,
            model_info.size_mb,
            model_info.repo_id
        );

        fs::create_dir_all(&model_dir).await?;

        let api = Api::new().map_err(|e| ResumeRankerError::Network(format!("Failed to initialize HF API: {}", e)))?;
        let repo = api.repo(hf_hub::Repo::model(model_info.repo_id.clone()));

        for (file, required) in required_files(model_info.backend) {
            match repo.get(file).await {
                Ok(file_path) => {
                    fs::copy(&file_path, model_dir.join(file)).await?;
                    log::info!("Downloaded {}", file);
                }
                Err(e) if *required => {
                    return Err(ResumeRankerError::Network(format!(
                        "Failed to download required file {}: {}",
                        file, e
                    )));
                }
                Err(e) => log::warn!("Optional file {} not found: {}", file, e),
            }
        }

        self.downloaded_models.insert(model_info.name.clone());

        log::info!("Embedding model {} downloaded", model_info.name);
        Ok(model_dir)
    }

    /// Get path to a downloaded model
    pub fn get_model_path(&self, model_id: &str) -> Option<PathBuf> {
        let name = self.resolve_model_id(model_id).unwrap_or_else(|| model_id.to_string());
        if self.downloaded_models.contains(&name) {
            Some(self.models_dir.join(name))
        } else {
            None
        }
    }

    /// Get or download a model, returning its path
    pub async fn ensure_model_available(&mut self, model_id: &str, allow_download: bool) -> Result<PathBuf> {
        if let Some(path) = self.get_model_path(model_id) {
            return Ok(path);
        }

        let local = Path::new(model_id);
        if local.is_absolute() && local.is_dir() {
            return Ok(local.to_path_buf());
        }

        if !allow_download {
            return Err(ResumeRankerError::ModelUnavailable(format!(
                "model {} is not downloaded and downloads are disabled",
                model_id
            )));
        }

        let resolved = self.resolve_model_id(model_id).ok_or_else(|| {
            ResumeRankerError::ModelUnavailable(format!("model {} is neither local nor in the catalogue", model_id))
        })?;
        self.download_model(&resolved).await
    }

    pub fn list_available_models(&self) -> &[AvailableModel] {
        &self.available_models
    }

    pub fn list_downloaded_models(&self) -> Vec<String> {
        let mut models: Vec<String> = self.downloaded_models.iter().cloned().collect();
        models.sort();
        models
    }

    pub fn get_model_info(&self, model_id: &str) -> Option<&AvailableModel> {
        self.available_models.iter().find(|m| m.name == model_id)
    }

    pub fn is_model_downloaded(&self, model_id: &str) -> bool {
        self.get_model_path(model_id).is_some()
    }

    /// Resolve model ID from various formats (name, repo_id, case-insensitive name)
    pub fn resolve_model_id(&self, input: &str) -> Option<String> {
        if self.get_model_info(input).is_some() {
            return Some(input.to_string());
        }

        if let Some(model) = self.available_models.iter().find(|m| m.repo_id == input) {
            return Some(model.name.clone());
        }

        let input_lower = input.to_lowercase();
        self.available_models
            .iter()
            .find(|m| m.name.to_lowercase() == input_lower)
            .map(|m| m.name.clone())
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }
}

fn required_files(backend: EmbeddingBackend) -> &'static [(&'static str, bool)] {
    match backend {
        EmbeddingBackend::Bert => &[("model.safetensors", true), ("tokenizer.json", true), ("config.json", true)],
        _ => &[("model.safetensors", true), ("tokenizer.json", true), ("config.json", false)],
    }
}

/// Check if a directory contains the files the backend needs
async fn is_valid_model_directory(path: &Path, backend: EmbeddingBackend) -> bool {
    for (file, required) in required_files(backend) {
        if *required && fs::metadata(path.join(file)).await.is_err() {
            return false;
        }
    }
    true
}
