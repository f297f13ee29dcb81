//! BERT sentence encoder (MiniLM family) running on candle

use crate::error::{Result, ResumeRankerError};
use crate::processing::embeddings::Embedder;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use std::path::Path;
use std::time::Instant;
use tokenizers::{Tokenizer, TruncationParams};

const MAX_SEQUENCE_LENGTH: usize = 512;

/// Mean-pooled BERT embeddings, the sentence-transformers recipe.
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    name: String,
    dimension: usize,
}

/// Get the best available device for inference (GPU if available, CPU fallback)
pub fn get_best_device() -> Device {
    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            log::info!("Using CUDA GPU for embeddings");
            return device;
        }
    }

    if cfg!(target_os = "macos") {
        match Device::new_metal(0) {
            Ok(device) => {
                log::info!("Using Metal GPU for embeddings");
                return device;
            }
            Err(e) => log::debug!("Metal GPU initialization failed: {}", e),
        }
    }

    Device::Cpu
}

/// Device with optional override from `RESUME_RANKER_DEVICE` (cpu, cuda, metal)
pub fn get_device_with_override() -> Result<Device> {
    if let Ok(preference) = std::env::var("RESUME_RANKER_DEVICE") {
        match preference.to_lowercase().as_str() {
            "cpu" => return Ok(Device::Cpu),
            "cuda" => {
                return Device::new_cuda(0)
                    .map_err(|e| ResumeRankerError::ModelUnavailable(format!("Failed to initialize CUDA: {}", e)));
            }
            "metal" => {
                return Device::new_metal(0)
                    .map_err(|e| ResumeRankerError::ModelUnavailable(format!("Failed to initialize Metal: {}", e)));
            }
            other => log::warn!("Unknown device '{}', falling back to auto-detection", other),
        }
    }

    Ok(get_best_device())
}

impl BertEmbedder {
    /// Load `config.json`, `tokenizer.json` and `model.safetensors` from a
    /// local directory. Blocking.
    pub fn load(model_path: &Path, name: &str) -> Result<Self> {
        let start_time = Instant::now();
        log::info!("Loading BERT sentence encoder from: {}", model_path.display());

        let device = get_device_with_override()?;

        let config_content = std::fs::read_to_string(model_path.join("config.json")).map_err(|e| {
            ResumeRankerError::ModelUnavailable(format!("Failed to read model config: {}", e))
        })?;
        let raw_config: serde_json::Value = serde_json::from_str(&config_content)?;
        let dimension = raw_config["hidden_size"].as_u64().unwrap_or(0) as usize;
        if dimension == 0 {
            return Err(ResumeRankerError::ModelUnavailable(
                "model config has no hidden_size".to_string(),
            ));
        }
        let config: BertConfig = serde_json::from_str(&config_content)?;

        let mut tokenizer = Tokenizer::from_file(model_path.join("tokenizer.json"))
            .map_err(|e| ResumeRankerError::ModelUnavailable(format!("Failed to load tokenizer: {}", e)))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| ResumeRankerError::ModelUnavailable(format!("Failed to configure tokenizer: {}", e)))?;
        tokenizer.with_padding(None);

        let weights = model_path.join("model.safetensors");
        // Safety: the weights file is not modified while the model is alive
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights], DTYPE, &device)? };
        let model = BertModel::load(vb, &config)?;

        log::info!("BERT encoder loaded in {:.2?} ({} dimensions)", start_time.elapsed(), dimension);

        Ok(Self {
            model,
            tokenizer,
            device,
            name: name.to_string(),
            dimension,
        })
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| ResumeRankerError::Embedding(format!("Tokenization failed: {}", e)))?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let (_, tokens, _) = hidden.dims3()?;
        let pooled = hidden.sum(1)?.affine(1.0 / tokens.max(1) as f64, 0.0)?;

        Ok(pooled.squeeze(0)?.to_dtype(DType::F32)?.to_vec1::<f32>()?)
    }
}

impl Embedder for BertEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.encode(text)
    }
}
