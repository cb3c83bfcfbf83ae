// Model file acquisition and caching
// Resolves a model description to a local file the inference backend can load

use crate::models::state::{MonitorError, MonitorResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Model source configuration
#[derive(Debug, Clone)]
pub enum ModelSource {
    /// Local file path
    LocalFile(PathBuf),
    /// Direct URL
    Url(String),
}

/// Sequence-model metadata
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
    pub source: ModelSource,
    pub size_bytes: Option<u64>,
}

/// Manager for caching and resolving model files.
///
/// Acquisition failures surface as `ModelLoadFailed` so they flow into the
/// classifier's permanent-fallback policy. Intended to run during setup,
/// before the monitor starts.
pub struct ModelManager {
    cache_dir: PathBuf,
}

impl ModelManager {
    /// Create a new model manager with cache directory
    pub fn new(cache_dir: PathBuf) -> MonitorResult<Self> {
        fs::create_dir_all(&cache_dir)
            .map_err(|e| MonitorError::ModelLoadFailed(e.to_string()))?;
        Ok(Self { cache_dir })
    }

    /// Get the cache directory path
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Check if a model is cached
    pub fn is_cached(&self, model: &ModelInfo) -> bool {
        self.model_path(&model.name).exists()
    }

    /// Get the local path for a model
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.cache_dir.join(model_name)
    }

    /// Resolve a model to a local file, copying or downloading if not cached
    pub fn ensure_model(&self, model: &ModelInfo) -> MonitorResult<PathBuf> {
        let model_path = self.model_path(&model.name);

        if self.is_cached(model) {
            println!("Model {} already cached at {:?}", model.name, model_path);
            return Ok(model_path);
        }

        println!("Fetching model {} from {:?}", model.name, model.source);

        match &model.source {
            ModelSource::LocalFile(path) => {
                fs::copy(path, &model_path)
                    .map_err(|e| MonitorError::ModelLoadFailed(e.to_string()))?;
            }
            ModelSource::Url(url) => {
                let response = reqwest::blocking::get(url)
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| MonitorError::ModelLoadFailed(e.to_string()))?;
                let bytes = response
                    .bytes()
                    .map_err(|e| MonitorError::ModelLoadFailed(e.to_string()))?;
                fs::write(&model_path, &bytes)
                    .map_err(|e| MonitorError::ModelLoadFailed(e.to_string()))?;
            }
        }

        Ok(model_path)
    }

    /// Clear the model cache
    pub fn clear_cache(&self) -> MonitorResult<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir)
                .map_err(|e| MonitorError::ModelLoadFailed(e.to_string()))?;
            fs::create_dir_all(&self.cache_dir)
                .map_err(|e| MonitorError::ModelLoadFailed(e.to_string()))?;
        }
        Ok(())
    }

    /// Get cache size in bytes
    pub fn cache_size(&self) -> MonitorResult<u64> {
        let mut total_size = 0u64;

        if self.cache_dir.exists() {
            let entries = fs::read_dir(&self.cache_dir)
                .map_err(|e| MonitorError::ModelLoadFailed(e.to_string()))?;
            for entry in entries {
                let entry = entry.map_err(|e| MonitorError::ModelLoadFailed(e.to_string()))?;
                let metadata = entry
                    .metadata()
                    .map_err(|e| MonitorError::ModelLoadFailed(e.to_string()))?;
                if metadata.is_file() {
                    total_size += metadata.len();
                }
            }
        }

        Ok(total_size)
    }
}

// ==============================================================================
// Predefined Model Configurations
// ==============================================================================

pub mod pretrained {
    use super::*;

    /// The drowsiness sequence classifier consumed by the model-backed variant
    pub fn drowsiness_sequence() -> ModelInfo {
        ModelInfo {
            name: "drowsiness-sequence.onnx".to_string(),
            version: "v1".to_string(),
            source: ModelSource::Url(
                "https://storage.googleapis.com/vigil-models/drowsiness_sequence/v1/drowsiness_sequence.onnx".to_string(),
            ),
            size_bytes: Some(2_400_000), // ~2.4 MB
        }
    }
}
