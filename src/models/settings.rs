//! Settings Models
//!
//! Application configuration and settings data structures.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::sequence::YogaStyle;

/// Application configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Folder holding the PDF / text corpus
    pub corpus_dir: PathBuf,
    /// Folder where the built index is persisted
    pub index_dir: PathBuf,
    /// Chunk window in characters
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,
    /// Chunks returned per retrieval
    pub top_k: usize,
    /// Optional cosine similarity floor for retrieved chunks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_similarity: Option<f32>,
    /// Chat model used for rewriting, dispatch and summaries
    pub chat_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Embedding model
    pub embedding_model: String,
    /// Vector dimension produced by the embedding model
    pub embedding_dimension: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_base_url: Option<String>,
    /// Per-request timeout for model and embedding calls
    pub request_timeout_secs: u64,
    /// Minimum seconds between accepted chat turns
    pub rate_limit_secs: u64,
    /// Style used when the model does not name one
    pub default_style: YogaStyle,
    /// Append Yoga Journal links for poses mentioned in a turn
    pub show_images: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            corpus_dir: PathBuf::from("data"),
            index_dir: PathBuf::from("index"),
            chunk_size: 500,
            chunk_overlap: 200,
            top_k: 3,
            min_similarity: None,
            chat_model: "gpt-4".to_string(),
            temperature: 0.0,
            max_tokens: 1024,
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimension: 1536,
            llm_base_url: None,
            embedding_base_url: None,
            request_timeout_secs: 60,
            rate_limit_secs: 10,
            default_style: YogaStyle::Hatha,
            show_images: true,
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub corpus_dir: Option<PathBuf>,
    pub index_dir: Option<PathBuf>,
    pub chat_model: Option<String>,
    pub top_k: Option<usize>,
    pub default_style: Option<YogaStyle>,
    pub show_images: Option<bool>,
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(dir) = update.corpus_dir {
            self.corpus_dir = dir;
        }
        if let Some(dir) = update.index_dir {
            self.index_dir = dir;
        }
        if let Some(model) = update.chat_model {
            self.chat_model = model;
        }
        if let Some(top_k) = update.top_k {
            self.top_k = top_k;
        }
        if let Some(style) = update.default_style {
            self.default_style = style;
        }
        if let Some(show) = update.show_images {
            self.show_images = show;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".to_string());
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            ));
        }
        if self.top_k == 0 {
            return Err("top_k must be at least 1".to_string());
        }
        if let Some(floor) = self.min_similarity {
            if !(-1.0..=1.0).contains(&floor) {
                return Err(format!("min_similarity must be within [-1, 1], got {}", floor));
            }
        }
        if self.embedding_dimension == 0 {
            return Err("embedding_dimension must be greater than 0".to_string());
        }
        if self.chat_model.trim().is_empty() {
            return Err("chat_model must not be empty".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.top_k, 3);
        assert_eq!(config.rate_limit_secs, 10);
        assert!(config.min_similarity.is_none());
        assert!(config.show_images);
    }

    #[test]
    fn test_apply_update() {
        let mut config = AppConfig::default();
        let update = SettingsUpdate {
            default_style: Some(YogaStyle::Yin),
            show_images: Some(false),
            ..Default::default()
        };
        config.apply_update(update);
        assert_eq!(config.default_style, YogaStyle::Yin);
        assert!(!config.show_images);
        // Other fields should remain unchanged
        assert_eq!(config.chat_model, "gpt-4");
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_overlap_not_smaller_than_size() {
        let config = AppConfig {
            chunk_overlap: 500,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_similarity_floor_range() {
        let config = AppConfig {
            min_similarity: Some(1.5),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"top_k": 5}"#).unwrap();
        assert_eq!(config.top_k, 5);
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.default_style, YogaStyle::Hatha);
    }
}
