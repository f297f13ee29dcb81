//! Configuration management for the resume ranker

use crate::error::{Result, ResumeRankerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tolerance used when checking that the hybrid weights sum to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub models: ModelConfig,
    pub processing: ProcessingConfig,
    pub scoring: ScoringConfig,
    pub batch: BatchConfig,
    #[serde(default)]
    pub skills: SkillsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub models_dir: PathBuf,
    pub embedding_backend: EmbeddingBackend,
    pub embedding_model: String,
    pub hashing_dimension: usize,
    pub allow_download: bool,
    pub available_models: Vec<AvailableModel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableModel {
    pub name: String,
    pub repo_id: String,
    pub backend: EmbeddingBackend,
    pub dimensions: usize,
    pub size_mb: u64,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Model2Vec static embeddings
    Static,
    /// Transformer sentence encoder run through candle
    Bert,
    /// Feature hashing, no model files required
    Hashing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub chunk_window: usize,
    pub chunk_stride: usize,
    pub top_chunks: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub skill_weight: f64,
    pub lexical_weight: f64,
    pub semantic_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub workers: usize,
    pub top_k: usize,
    pub deadline_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillsConfig {
    #[serde(default)]
    pub extra: Vec<SkillDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub canonical: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            skill_weight: 0.5,
            lexical_weight: 0.2,
            semantic_weight: 0.3,
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            chunk_window: 500,
            chunk_stride: 250,
            top_chunks: 3,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            top_k: 10,
            deadline_ms: 30_000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let models_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".resume-ranker")
            .join("models");

        Self {
            models: ModelConfig {
                models_dir,
                embedding_backend: EmbeddingBackend::Static,
                embedding_model: "minishlab/potion-base-8M".to_string(),
                hashing_dimension: 384,
                allow_download: true,
                available_models: vec![
                    AvailableModel {
                        name: "potion-base-8M".to_string(),
                        repo_id: "minishlab/potion-base-8M".to_string(),
                        backend: EmbeddingBackend::Static,
                        dimensions: 256,
                        size_mb: 33,
                        description: "Fast Model2Vec static embeddings (recommended)".to_string(),
                    },
                    AvailableModel {
                        name: "m2v-base".to_string(),
                        repo_id: "minishlab/M2V_base_output".to_string(),
                        backend: EmbeddingBackend::Static,
                        dimensions: 256,
                        size_mb: 90,
                        description: "Legacy Model2Vec base embeddings".to_string(),
                    },
                    AvailableModel {
                        name: "all-minilm-l6-v2".to_string(),
                        repo_id: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
                        backend: EmbeddingBackend::Bert,
                        dimensions: 384,
                        size_mb: 90,
                        description: "MiniLM sentence encoder run through candle".to_string(),
                    },
                ],
            },
            processing: ProcessingConfig::default(),
            scoring: ScoringConfig::default(),
            batch: BatchConfig::default(),
            skills: SkillsConfig::default(),
            output: OutputConfig {
                format: OutputFormat::Console,
                detailed: false,
                color_output: true,
            },
        }
    }
}

impl ScoringConfig {
    pub fn sum(&self) -> f64 {
        self.skill_weight + self.lexical_weight + self.semantic_weight
    }

    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("skill_weight", self.skill_weight),
            ("lexical_weight", self.lexical_weight),
            ("semantic_weight", self.semantic_weight),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ResumeRankerError::Configuration(format!(
                    "scoring.{} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        if (self.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ResumeRankerError::Configuration(format!(
                "scoring weights must sum to 1.0, got {:.6}",
                self.sum()
            )));
        }
        Ok(())
    }
}

impl ProcessingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_window == 0 {
            return Err(ResumeRankerError::Configuration(
                "processing.chunk_window must be greater than 0".to_string(),
            ));
        }
        if self.chunk_stride == 0 || self.chunk_stride > self.chunk_window {
            return Err(ResumeRankerError::Configuration(format!(
                "processing.chunk_stride must be in 1..={}, got {}",
                self.chunk_window, self.chunk_stride
            )));
        }
        Ok(())
    }
}

impl BatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(ResumeRankerError::Configuration(
                "batch.workers must be greater than 0".to_string(),
            ));
        }
        if self.top_k == 0 {
            return Err(ResumeRankerError::Configuration(
                "batch.top_k must be greater than 0".to_string(),
            ));
        }
        if self.deadline_ms == 0 {
            return Err(ResumeRankerError::Configuration(
                "batch.deadline_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load from the default location, writing defaults on first run.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| ResumeRankerError::Configuration(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ResumeRankerError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-ranker")
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        self.scoring.validate()?;
        self.processing.validate()?;
        self.batch.validate()?;
        if self.models.embedding_backend == EmbeddingBackend::Hashing && self.models.hashing_dimension == 0 {
            return Err(ResumeRankerError::Configuration(
                "models.hashing_dimension must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn models_dir(&self) -> &PathBuf {
        &self.models.models_dir
    }
}
