//! Router configuration.

use crate::plugins::PluginParams;
use crate::walking::WalkingCacheConfig;

/// A plugin forced for every query, bypassing provider selection.
#[derive(Debug, Clone)]
pub struct PluginOverride {
    /// Registry identifier.
    pub plugin: String,
    pub params: PluginParams,
}

/// Configuration for a [`Router`](super::Router) session.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Language used to pick localized attributions.
    pub language: String,

    /// Name of the provider used when none covers the query.
    pub default_provider: Option<String>,

    /// Plugin used for every query instead of the selected provider.
    pub override_plugin: Option<PluginOverride>,

    pub walking_cache: WalkingCacheConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            default_provider: None,
            override_plugin: None,
            walking_cache: WalkingCacheConfig::default(),
        }
    }
}

impl RouterConfig {
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_default_provider(mut self, name: impl Into<String>) -> Self {
        self.default_provider = Some(name.into());
        self
    }

    pub fn with_override_plugin(mut self, plugin: impl Into<String>, params: PluginParams) -> Self {
        self.override_plugin = Some(PluginOverride {
            plugin: plugin.into(),
            params,
        });
        self
    }

    pub fn with_walking_cache(mut self, config: WalkingCacheConfig) -> Self {
        self.walking_cache = config;
        self
    }
}
