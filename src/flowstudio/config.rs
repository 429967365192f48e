//! # Configuration
//!
//! FlowStudio keeps a single JSON object in `<data dir>/config.json`.
//!
//! ## Merging
//!
//! The stored object is merged over the compiled defaults on load: every
//! missing field takes its default, unknown fields are ignored. Files written by
//! older versions therefore load into a complete [`StudioConfig`], and files
//! written by newer versions still load here.
//!
//! ## Provider Presets
//!
//! [`AiProvider`] carries a default endpoint and model for each provider.
//! Switching provider with `set("provider", ..)` resets endpoint and model to
//! that provider's preset; both can be overridden afterwards.
//!
//! ## Available Settings
//!
//! | Key | Default |
//! |-----|---------|
//! | `provider` | `openai` |
//! | `api-endpoint` | provider preset |
//! | `api-key` | empty |
//! | `model` | provider preset |
//! | `temperature` | `0.7` |
//! | `max-tokens` | `2048` |
//! | `timeout-secs` | `60` |
//! | `template-source-url` | `builtin:` |
//! | `plantuml-server` | `https://www.plantuml.com/plantuml` |
//! | `documents-dir` | unset |
//! | `features.<name>` | `true` |

use crate::encoder::DEFAULT_SERVER;
use crate::error::{Result, StudioError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

pub const CONFIG_FILENAME: &str = "config.json";

/// Locator of the bundled template library.
pub const BUILTIN_TEMPLATE_SOURCE: &str = "builtin:";

/// Wire format spoken by a provider's endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderWire {
    /// `POST /chat/completions` with `choices[0].message.content` replies.
    ChatCompletions,
    /// Ollama's `POST /api/chat` with `message.content` replies.
    OllamaChat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AiProvider {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "qwen")]
    Qwen,
    #[serde(rename = "ollama")]
    Ollama,
    /// Any OpenAI-compatible endpoint.
    #[serde(rename = "custom")]
    Custom,
}

impl AiProvider {
    pub const ALL: [AiProvider; 5] = [
        AiProvider::OpenAi,
        AiProvider::DeepSeek,
        AiProvider::Qwen,
        AiProvider::Ollama,
        AiProvider::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "openai",
            AiProvider::DeepSeek => "deepseek",
            AiProvider::Qwen => "qwen",
            AiProvider::Ollama => "ollama",
            AiProvider::Custom => "custom",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "https://api.openai.com/v1/chat/completions",
            AiProvider::DeepSeek => "https://api.deepseek.com/chat/completions",
            AiProvider::Qwen => {
                "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions"
            }
            AiProvider::Ollama => "http://localhost:11434/api/chat",
            AiProvider::Custom => "",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "gpt-4o-mini",
            AiProvider::DeepSeek => "deepseek-chat",
            AiProvider::Qwen => "qwen-plus",
            AiProvider::Ollama => "llama3.1",
            AiProvider::Custom => "",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        match self {
            AiProvider::OpenAi | AiProvider::DeepSeek | AiProvider::Qwen => true,
            AiProvider::Ollama | AiProvider::Custom => false,
        }
    }

    pub fn wire(&self) -> ProviderWire {
        match self {
            AiProvider::Ollama => ProviderWire::OllamaChat,
            AiProvider::OpenAi | AiProvider::DeepSeek | AiProvider::Qwen | AiProvider::Custom => {
                ProviderWire::ChatCompletions
            }
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        AiProvider::ALL
            .into_iter()
            .find(|p| p.as_str() == lower)
            .ok_or_else(|| {
                let names: Vec<&str> = AiProvider::ALL.iter().map(|p| p.as_str()).collect();
                format!("Unknown provider '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

/// Switches for optional parts of the studio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureToggles {
    pub ai_generation: bool,
    /// Substitute a canned diagram when the provider fails.
    pub fallback_on_ai_error: bool,
    pub remote_templates: bool,
    pub diagram_preview: bool,
    pub review_tracking: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            ai_generation: true,
            fallback_on_ai_error: true,
            remote_templates: true,
            diagram_preview: true,
            review_tracking: true,
        }
    }
}

impl FeatureToggles {
    const NAMES: [&'static str; 5] = [
        "ai-generation",
        "fallback-on-ai-error",
        "remote-templates",
        "diagram-preview",
        "review-tracking",
    ];

    fn flag_mut(&mut self, name: &str) -> Option<&mut bool> {
        match name {
            "ai-generation" => Some(&mut self.ai_generation),
            "fallback-on-ai-error" => Some(&mut self.fallback_on_ai_error),
            "remote-templates" => Some(&mut self.remote_templates),
            "diagram-preview" => Some(&mut self.diagram_preview),
            "review-tracking" => Some(&mut self.review_tracking),
            _ => None,
        }
    }

    fn flag(&self, name: &str) -> Option<bool> {
        match name {
            "ai-generation" => Some(self.ai_generation),
            "fallback-on-ai-error" => Some(self.fallback_on_ai_error),
            "remote-templates" => Some(self.remote_templates),
            "diagram-preview" => Some(self.diagram_preview),
            "review-tracking" => Some(self.review_tracking),
            _ => None,
        }
    }
}

/// Configuration for FlowStudio, stored in `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub provider: AiProvider,
    pub api_endpoint: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Global timeout for provider and template requests.
    pub timeout_secs: u64,
    pub template_source_url: String,
    pub plantuml_server: String,
    pub documents_dir: Option<PathBuf>,
    pub features: FeatureToggles,
}

impl Default for StudioConfig {
    fn default() -> Self {
        let provider = AiProvider::default();
        Self {
            provider,
            api_endpoint: provider.default_endpoint().to_string(),
            api_key: String::new(),
            model: provider.default_model().to_string(),
            temperature: 0.7,
            max_tokens: 2048,
            timeout_secs: 60,
            template_source_url: BUILTIN_TEMPLATE_SOURCE.to_string(),
            plantuml_server: DEFAULT_SERVER.to_string(),
            documents_dir: None,
            features: FeatureToggles::default(),
        }
    }
}

impl StudioConfig {
    pub const KEYS: [&'static str; 10] = [
        "provider",
        "api-endpoint",
        "api-key",
        "model",
        "temperature",
        "max-tokens",
        "timeout-secs",
        "template-source-url",
        "plantuml-server",
        "documents-dir",
    ];

    /// Load config from the given directory, or return defaults if not found.
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        Self::from_json(&content)
    }

    /// Merge a stored JSON object over the defaults, field by field.
    ///
    /// A field that does not parse (an unknown provider, a mistyped value)
    /// keeps its default and the rest of the file still applies. Zero
    /// timeouts and token limits are reset to their defaults.
    pub fn from_json(content: &str) -> Result<Self> {
        let stored: Value = serde_json::from_str(content)?;
        let fields = stored.as_object().ok_or_else(|| {
            StudioError::Config(format!("{} must hold a JSON object", CONFIG_FILENAME))
        })?;

        let mut config = Self::default();
        merge_field(fields, "provider", &mut config.provider);
        merge_field(fields, "api_endpoint", &mut config.api_endpoint);
        merge_field(fields, "api_key", &mut config.api_key);
        merge_field(fields, "model", &mut config.model);
        merge_field(fields, "temperature", &mut config.temperature);
        merge_field(fields, "max_tokens", &mut config.max_tokens);
        merge_field(fields, "timeout_secs", &mut config.timeout_secs);
        merge_field(fields, "template_source_url", &mut config.template_source_url);
        merge_field(fields, "plantuml_server", &mut config.plantuml_server);
        merge_field(fields, "documents_dir", &mut config.documents_dir);

        match fields.get("features") {
            Some(Value::Object(flags)) => {
                let features = &mut config.features;
                merge_field(flags, "ai_generation", &mut features.ai_generation);
                merge_field(flags, "fallback_on_ai_error", &mut features.fallback_on_ai_error);
                merge_field(flags, "remote_templates", &mut features.remote_templates);
                merge_field(flags, "diagram_preview", &mut features.diagram_preview);
                merge_field(flags, "review_tracking", &mut features.review_tracking);
            }
            Some(other) => warn!(value = %other, "ignoring config field features: not an object"),
            None => {}
        }

        config.reset_out_of_range();
        Ok(config)
    }

    fn reset_out_of_range(&mut self) {
        let defaults = Self::default();
        if self.timeout_secs == 0 {
            warn!(default = defaults.timeout_secs, "timeout_secs is 0, using default");
            self.timeout_secs = defaults.timeout_secs;
        }
        if self.max_tokens == 0 {
            warn!(default = defaults.max_tokens, "max_tokens is 0, using default");
            self.max_tokens = defaults.max_tokens;
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            warn!(temperature = self.temperature, "temperature out of range, using default");
            self.temperature = defaults.temperature;
        }
    }

    /// Save config to the given directory.
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self)?;
        let tmp_path = config_dir.join(format!(".config-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, config_path)?;
        Ok(())
    }

    /// Endpoint to call, falling back to the provider preset when blank.
    pub fn effective_endpoint(&self) -> &str {
        if self.api_endpoint.trim().is_empty() {
            self.provider.default_endpoint()
        } else {
            &self.api_endpoint
        }
    }

    pub fn effective_model(&self) -> &str {
        if self.model.trim().is_empty() {
            self.provider.default_model()
        } else {
            &self.model
        }
    }

    /// Switch provider and adopt its preset endpoint and model.
    pub fn select_provider(&mut self, provider: AiProvider) {
        self.provider = provider;
        self.api_endpoint = provider.default_endpoint().to_string();
        self.model = provider.default_model().to_string();
    }

    pub fn uses_builtin_templates(&self) -> bool {
        let source = self.template_source_url.trim();
        source.is_empty() || source == BUILTIN_TEMPLATE_SOURCE
    }

    /// Every key with its display value, in a stable order.
    pub fn entries(&self) -> Vec<(String, String)> {
        Self::KEYS
            .iter()
            .map(|k| k.to_string())
            .chain(FeatureToggles::NAMES.iter().map(|n| format!("features.{}", n)))
            .filter_map(|key| self.get(&key).map(|value| (key, value)))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(name) = key.strip_prefix("features.") {
            return self.features.flag(name).map(|v| v.to_string());
        }
        let value = match key {
            "provider" => self.provider.to_string(),
            "api-endpoint" => self.effective_endpoint().to_string(),
            "api-key" => mask_secret(&self.api_key),
            "model" => self.effective_model().to_string(),
            "temperature" => self.temperature.to_string(),
            "max-tokens" => self.max_tokens.to_string(),
            "timeout-secs" => self.timeout_secs.to_string(),
            "template-source-url" => self.template_source_url.clone(),
            "plantuml-server" => self.plantuml_server.clone(),
            "documents-dir" => self
                .documents_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            _ => return None,
        };
        Some(value)
    }

    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), String> {
        if let Some(name) = key.strip_prefix("features.") {
            let flag = self
                .features
                .flag_mut(name)
                .ok_or_else(|| format!("Unknown feature: {}", name))?;
            *flag = parse_bool(value)?;
            return Ok(());
        }

        match key {
            "provider" => self.select_provider(value.parse()?),
            "api-endpoint" => self.api_endpoint = value.trim().to_string(),
            "api-key" => self.api_key = value.trim().to_string(),
            "model" => self.model = value.trim().to_string(),
            "temperature" => {
                let t: f32 = value
                    .parse()
                    .map_err(|_| format!("Invalid temperature: {}", value))?;
                if !(0.0..=2.0).contains(&t) {
                    return Err(format!("Temperature must be between 0 and 2, got {}", t));
                }
                self.temperature = t;
            }
            "max-tokens" => {
                self.max_tokens = parse_positive(value, "max-tokens")? as u32;
            }
            "timeout-secs" => {
                self.timeout_secs = parse_positive(value, "timeout-secs")?;
            }
            "template-source-url" => self.template_source_url = value.trim().to_string(),
            "plantuml-server" => {
                let server = value.trim();
                if !(server.starts_with("http://") || server.starts_with("https://")) {
                    return Err(format!("Render server must be an http(s) URL: {}", server));
                }
                self.plantuml_server = server.trim_end_matches('/').to_string();
            }
            "documents-dir" => {
                self.documents_dir = if value.trim().is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value.trim()))
                };
            }
            other => return Err(format!("Unknown config key: {}", other)),
        }
        Ok(())
    }
}

fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count == 0 {
        String::new()
    } else if count <= 8 {
        "*".repeat(count)
    } else {
        let tail: String = secret.chars().skip(count - 4).collect();
        format!("{}{}", "*".repeat(count - 4), tail)
    }
}

fn merge_field<T: DeserializeOwned>(fields: &Map<String, Value>, name: &str, slot: &mut T) {
    let Some(value) = fields.get(name) else {
        return;
    };
    match T::deserialize(value) {
        Ok(parsed) => *slot = parsed,
        Err(e) => warn!(field = name, error = %e, "ignoring invalid config value"),
    }
}

fn parse_bool(value: &str) -> std::result::Result<bool, String> {
    match value.to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(format!("Expected true or false, got {}", value)),
    }
}

fn parse_positive(value: &str, key: &str) -> std::result::Result<u64, String> {
    match value.parse::<u64>() {
        Ok(n) if n > 0 && n <= u32::MAX as u64 => Ok(n),
        _ => Err(format!("{} must be a positive integer, got {}", key, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = StudioConfig::default();
        assert_eq!(config.provider, AiProvider::OpenAi);
        assert_eq!(
            config.api_endpoint,
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_tokens, 2048);
        assert_eq!(config.timeout_secs, 60);
        assert!(config.uses_builtin_templates());
        assert!(config.features.ai_generation);
    }

    #[test]
    fn test_partial_object_merges_over_defaults() {
        let stored = r#"{"provider": "ollama", "model": "qwen2.5", "features": {"remote_templates": false}}"#;
        let config = StudioConfig::from_json(stored).unwrap();

        assert_eq!(config.provider, AiProvider::Ollama);
        assert_eq!(config.model, "qwen2.5");
        // missing fields fall back to defaults
        let defaults = StudioConfig::default();
        assert_eq!(config.temperature, defaults.temperature);
        assert_eq!(config.max_tokens, defaults.max_tokens);
        assert_eq!(config.plantuml_server, defaults.plantuml_server);
        assert_eq!(config.template_source_url, defaults.template_source_url);
        // nested objects merge too
        assert!(!config.features.remote_templates);
        assert!(config.features.ai_generation);
        assert!(config.features.fallback_on_ai_error);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let stored = r#"{"timeout_secs": 5, "some_future_field": [1, 2, 3]}"#;
        let config = StudioConfig::from_json(stored).unwrap();
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_bad_field_does_not_discard_the_rest() {
        let stored = r#"{
            "api_key": "sk-keep-me",
            "model": "my-model",
            "provider": "anthropic",
            "timeout_secs": "30",
            "features": {"review_tracking": false, "diagram_preview": "nope"}
        }"#;
        let config = StudioConfig::from_json(stored).unwrap();
        let defaults = StudioConfig::default();

        assert_eq!(config.api_key, "sk-keep-me");
        assert_eq!(config.model, "my-model");
        assert_eq!(config.provider, defaults.provider);
        assert_eq!(config.timeout_secs, defaults.timeout_secs);
        assert!(!config.features.review_tracking);
        assert!(config.features.diagram_preview);
    }

    #[test]
    fn test_zero_limits_reset_to_defaults() {
        let config =
            StudioConfig::from_json(r#"{"timeout_secs": 0, "max_tokens": 0, "temperature": 7.5}"#)
                .unwrap();
        let defaults = StudioConfig::default();
        assert_eq!(config.timeout_secs, defaults.timeout_secs);
        assert_eq!(config.max_tokens, defaults.max_tokens);
        assert_eq!(config.temperature, defaults.temperature);
    }

    #[test]
    fn test_non_object_config_is_error() {
        assert!(matches!(
            StudioConfig::from_json("[1, 2]"),
            Err(StudioError::Config(_))
        ));
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(StudioConfig::from_json("{}").unwrap(), StudioConfig::default());
    }

    #[test]
    fn test_merged_config_has_every_key() {
        let config = StudioConfig::from_json(r#"{"api_key": "k"}"#).unwrap();
        let entries = config.entries();
        assert_eq!(entries.len(), StudioConfig::KEYS.len() + FeatureToggles::NAMES.len());
        for key in StudioConfig::KEYS {
            assert!(config.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_select_provider_resets_preset() {
        let mut config = StudioConfig::default();
        config.set("model", "my-model").unwrap();
        config.set("provider", "deepseek").unwrap();
        assert_eq!(config.provider, AiProvider::DeepSeek);
        assert_eq!(config.model, "deepseek-chat");
        assert_eq!(config.effective_endpoint(), "https://api.deepseek.com/chat/completions");
    }

    #[test]
    fn test_effective_values_fall_back_to_preset() {
        let mut config = StudioConfig::default();
        config.api_endpoint = "  ".to_string();
        config.model = String::new();
        assert_eq!(config.effective_endpoint(), AiProvider::OpenAi.default_endpoint());
        assert_eq!(config.effective_model(), "gpt-4o-mini");
    }

    #[test]
    fn test_set_validates_values() {
        let mut config = StudioConfig::default();
        assert!(config.set("temperature", "3.5").is_err());
        assert!(config.set("temperature", "warm").is_err());
        assert!(config.set("max-tokens", "0").is_err());
        assert!(config.set("plantuml-server", "ftp://x").is_err());
        assert!(config.set("provider", "skynet").is_err());
        assert!(config.set("nope", "1").is_err());
        assert!(config.set("features.unknown", "true").is_err());

        config.set("temperature", "0.2").unwrap();
        config.set("features.ai-generation", "off").unwrap();
        config.set("plantuml-server", "https://render.local/plantuml/").unwrap();
        assert_eq!(config.temperature, 0.2);
        assert!(!config.features.ai_generation);
        assert_eq!(config.plantuml_server, "https://render.local/plantuml");
    }

    #[test]
    fn test_api_key_is_masked() {
        let mut config = StudioConfig::default();
        assert_eq!(config.get("api-key").unwrap(), "");
        config.set("api-key", "sk-1234567890abcd").unwrap();
        assert_eq!(config.get("api-key").unwrap(), "*************abcd");
        config.set("api-key", "short").unwrap();
        assert_eq!(config.get("api-key").unwrap(), "*****");
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();

        let mut config = StudioConfig::default();
        config.select_provider(AiProvider::Qwen);
        config.api_key = "secret".to_string();
        config.save(temp_dir.path()).unwrap();

        let loaded = StudioConfig::load(temp_dir.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = StudioConfig::load(temp_dir.path().join("absent")).unwrap();
        assert_eq!(config, StudioConfig::default());
    }

    #[test]
    fn test_load_malformed_config_is_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILENAME), "{not json").unwrap();
        let err = StudioConfig::load(temp_dir.path()).unwrap_err();
        assert!(err.is_malformed_payload());
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("OpenAI".parse::<AiProvider>().unwrap(), AiProvider::OpenAi);
        assert_eq!("ollama".parse::<AiProvider>().unwrap(), AiProvider::Ollama);
        assert_eq!(AiProvider::Ollama.wire(), ProviderWire::OllamaChat);
        assert!(!AiProvider::Custom.requires_api_key());
    }
}
