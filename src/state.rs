//! Application State
//!
//! Everything a command needs, built once from the configuration file and
//! the API key: model providers, the similarity index and chat sessions.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::models::settings::{AppConfig, SettingsUpdate};
use crate::services::knowledge::{
    EmbeddingProvider, EmbeddingProviderConfig, IndexBuilder, OpenAIEmbeddingProvider, Retriever,
    SimilarityIndex,
};
use crate::services::session::Session;
use crate::storage::ConfigService;
use crate::utils::error::{AppError, AppResult};
use yoga_gpt_llm::{LlmProvider, OpenAIProvider, ProviderConfig};

pub struct AppState {
    config: ConfigService,
    api_key: Option<String>,
}

impl AppState {
    pub fn new(config: ConfigService, api_key: Option<String>) -> Self {
        Self { config, api_key }
    }

    pub fn config(&self) -> &AppConfig {
        self.config.get_config()
    }

    pub fn config_path(&self) -> &Path {
        self.config.path()
    }

    /// Apply `update` and write it to the config file.
    pub fn update_settings(&mut self, update: SettingsUpdate) -> AppResult<&AppConfig> {
        self.config.update_config(update)?;
        info!(path = %self.config.path().display(), "settings saved");
        Ok(self.config.get_config())
    }

    pub fn reset_settings(&mut self) -> AppResult<&AppConfig> {
        self.config.reset()?;
        Ok(self.config.get_config())
    }

    fn require_api_key(&self) -> AppResult<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::config("OPENAI_API_KEY is not set"))
    }

    /// Chat model client configured from the settings.
    pub fn llm_provider(&self) -> AppResult<Arc<dyn LlmProvider>> {
        let config = self.config();
        let provider = OpenAIProvider::new(ProviderConfig {
            api_key: Some(self.require_api_key()?),
            base_url: config.llm_base_url.clone(),
            model: config.chat_model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            request_timeout_secs: Some(config.request_timeout_secs),
        })?;
        Ok(Arc::new(provider))
    }

    pub fn embedding_provider(&self) -> AppResult<Arc<dyn EmbeddingProvider>> {
        let provider_config =
            EmbeddingProviderConfig::from_app_config(self.config(), Some(self.require_api_key()?));
        Ok(Arc::new(OpenAIEmbeddingProvider::new(&provider_config)?))
    }

    /// Load the persisted index, or build it from the corpus.
    pub async fn open_index(
        &self,
        embedder: Arc<dyn EmbeddingProvider>,
        rebuild: bool,
    ) -> AppResult<SimilarityIndex> {
        let config = self.config();
        let builder = IndexBuilder::new(config, embedder);
        let index = if rebuild {
            info!(corpus = %config.corpus_dir.display(), "rebuilding index");
            builder.rebuild(&config.corpus_dir).await?
        } else {
            builder.build(&config.corpus_dir).await?
        };
        Ok(index)
    }

    /// A fresh chat session over the index.
    pub async fn new_session(&self, rebuild: bool) -> AppResult<Session> {
        let llm = self.llm_provider()?;
        let embedder = self.embedding_provider()?;
        let index = self.open_index(Arc::clone(&embedder), rebuild).await?;
        let retriever = Retriever::new(Arc::new(index), embedder)
            .with_min_similarity(self.config().min_similarity);
        Ok(Session::new(llm, Arc::new(retriever), self.config()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sequence::YogaStyle;
    use tempfile::tempdir;

    #[test]
    fn test_missing_api_key_is_config_error() {
        let dir = tempdir().unwrap();
        let service = ConfigService::open(dir.path().join("config.json")).unwrap();
        let state = AppState::new(service, Some("  ".to_string()));

        assert!(matches!(state.llm_provider(), Err(AppError::Config(_))));
        assert!(matches!(state.embedding_provider(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_providers_follow_config() {
        let dir = tempdir().unwrap();
        let service = ConfigService::open(dir.path().join("config.json")).unwrap();
        let state = AppState::new(service, Some("sk-test".to_string()));

        let llm = state.llm_provider().unwrap();
        assert_eq!(llm.model(), "gpt-4");
        let embedder = state.embedding_provider().unwrap();
        assert_eq!(embedder.dimension(), 1536);
    }

    #[test]
    fn test_settings_update_reaches_file_and_providers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut state = AppState::new(
            ConfigService::open(&path).unwrap(),
            Some("sk-test".to_string()),
        );

        let config = state
            .update_settings(SettingsUpdate {
                chat_model: Some("gpt-4-0613".to_string()),
                default_style: Some(YogaStyle::Yin),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(config.default_style, YogaStyle::Yin);
        assert_eq!(state.llm_provider().unwrap().model(), "gpt-4-0613");

        let reopened = ConfigService::open(&path).unwrap();
        assert_eq!(reopened.get_config().default_style, YogaStyle::Yin);
        assert_eq!(reopened.get_config().chat_model, "gpt-4-0613");

        state.reset_settings().unwrap();
        assert_eq!(state.config(), &AppConfig::default());
        assert_eq!(
            ConfigService::open(state.config_path()).unwrap().get_config(),
            &AppConfig::default()
        );
    }
}
