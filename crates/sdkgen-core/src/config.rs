//! Configuration management for SDK generation.
//!
//! This module defines the `GenerationConfig` struct and related functionality
//! for managing generation settings. The configuration can be loaded from a
//! YAML or TOML file, discovered next to the API description, or created
//! programmatically and amended from command-line arguments.
//!
//! # Examples
//!
//! ```no_run
//! use sdkgen_core::config::GenerationConfig;
//! use sdkgen_core::language::GenerationLanguage;
//!
//! # #[tokio::main]
//! # async fn main() -> sdkgen_core::Result<()> {
//! // Create a new config programmatically
//! let mut config = GenerationConfig::new("openapi.yaml", "generated");
//! config.languages = vec![GenerationLanguage::CSharp, GenerationLanguage::Python];
//! config.include_patterns = vec!["/users/**".to_string()];
//!
//! // Or load from a config file
//! let config = GenerationConfig::from_file("sdkgen.yaml").await?;
//! # Ok(())
//! # }
//! ```

// Internal imports (std, crate)
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::language::GenerationLanguage;
use crate::registry::SerializationRegistry;
use crate::{Error, Result};

// External imports (alphabetized)
use serde::{Deserialize, Deserializer, Serialize};
use serde_value::Value as SerdeValue;
use tokio::fs;
use url::Url;

/// File names looked up by [`GenerationConfig::discover`], in order
pub const CONFIG_FILE_NAMES: &[&str] = &["sdkgen.yaml", "sdkgen.yml", "sdkgen.toml"];

/// Configuration for SDK generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Name of the root request builder class
    #[serde(default = "default_client_class_name")]
    pub client_class_name: String,

    /// Root namespace of the generated code
    #[serde(default = "default_client_namespace_name")]
    pub client_namespace_name: String,

    /// Path or URL of the API description
    #[serde(default)]
    pub openapi_path: String,

    /// Output directory for generated code
    #[serde(default = "default_output_path")]
    pub output_path: String,

    /// Target languages
    #[serde(default = "default_languages")]
    pub languages: Vec<GenerationLanguage>,

    /// Path patterns to include, optionally suffixed with `#VERB,VERB`
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub include_patterns: Vec<String>,

    /// Path patterns to exclude, optionally suffixed with `#VERB,VERB`
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub exclude_patterns: Vec<String>,

    /// Validation rules to skip, `all` disables every rule
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub disabled_validation_rules: Vec<String>,

    /// Media types with generated (de)serialization, in priority order
    #[serde(default = "default_structured_mime_types")]
    pub structured_mime_types: Vec<String>,

    /// Whether models capture unknown properties
    #[serde(default = "default_true")]
    pub include_additional_data: bool,

    /// Whether models store their values in a backing store
    #[serde(default)]
    pub uses_backing_store: bool,

    /// Remove previously generated files before writing
    #[serde(default)]
    pub clean_output: bool,

    /// Overrides the first server entry of the description
    #[serde(default)]
    pub base_url: Option<Url>,

    /// Content type to serialization writer factory overrides
    #[serde(default)]
    pub serializers: BTreeMap<String, String>,

    /// Content type to parse node factory overrides
    #[serde(default)]
    pub deserializers: BTreeMap<String, String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            client_class_name: default_client_class_name(),
            client_namespace_name: default_client_namespace_name(),
            openapi_path: String::new(),
            output_path: default_output_path(),
            languages: default_languages(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            disabled_validation_rules: Vec::new(),
            structured_mime_types: default_structured_mime_types(),
            include_additional_data: true,
            uses_backing_store: false,
            clean_output: false,
            base_url: None,
            serializers: BTreeMap::new(),
            deserializers: BTreeMap::new(),
        }
    }
}

impl GenerationConfig {
    /// Create a new config with default values
    pub fn new(openapi_path: impl Into<String>, output_path: impl Into<String>) -> Self {
        Self {
            openapi_path: openapi_path.into(),
            output_path: output_path.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a YAML or TOML file, chosen by extension
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Find a configuration file in `dir`, then in the user configuration directory
    pub async fn discover<P: AsRef<Path>>(dir: P) -> Result<Option<PathBuf>> {
        let mut candidates: Vec<PathBuf> = CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.as_ref().join(name))
            .collect();
        if let Some(user_dir) = dirs::config_dir() {
            candidates.extend(
                CONFIG_FILE_NAMES
                    .iter()
                    .map(|name| user_dir.join("sdkgen").join(name)),
            );
        }
        for candidate in candidates {
            if fs::try_exists(&candidate).await? {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Check identifiers and patterns before running a generation
    pub fn validate(&self) -> Result<()> {
        if !is_identifier(&self.client_class_name) {
            return Err(Error::config(format!(
                "client class name '{}' is not a valid identifier",
                self.client_class_name
            )));
        }
        if self.client_namespace_name.is_empty()
            || !self.client_namespace_name.split('.').all(is_identifier)
        {
            return Err(Error::config(format!(
                "client namespace '{}' is not a valid dotted name",
                self.client_namespace_name
            )));
        }
        if self.languages.is_empty() {
            return Err(Error::config("at least one language is required"));
        }
        if self.structured_mime_types.is_empty() {
            return Err(Error::config("at least one structured mime type is required"));
        }
        for pattern in self.include_patterns.iter().chain(&self.exclude_patterns) {
            let path_part = pattern.split('#').next().unwrap_or_default();
            glob::Pattern::new(path_part).map_err(|e| {
                Error::config(format!("invalid path pattern '{}': {}", pattern, e))
            })?;
        }
        Ok(())
    }

    /// Namespace holding the component models
    pub fn models_namespace_name(&self) -> String {
        format!("{}.models", self.client_namespace_name)
    }

    /// Serialization factories with the configured overrides applied
    pub fn serialization_registry(&self) -> SerializationRegistry {
        SerializationRegistry::with_overrides(&self.serializers, &self.deserializers)
    }

    /// Directory receiving the files of one language
    pub fn language_output_path(&self, language: GenerationLanguage) -> PathBuf {
        let root = PathBuf::from(&self.output_path);
        if self.languages.len() > 1 {
            root.join(language.as_str())
        } else {
            root
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn default_client_class_name() -> String {
    "ApiClient".to_string()
}

fn default_client_namespace_name() -> String {
    "ApiSdk".to_string()
}

fn default_output_path() -> String {
    "output".to_string()
}

fn default_languages() -> Vec<GenerationLanguage> {
    vec![GenerationLanguage::default()]
}

fn default_structured_mime_types() -> Vec<String> {
    [
        "application/json",
        "text/plain",
        "application/x-www-form-urlencoded",
        "multipart/form-data",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_true() -> bool {
    true
}

/// Accept either a single string or a list of strings
fn deserialize_string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = SerdeValue::deserialize(deserializer)?;

    match value {
        SerdeValue::String(s) => Ok(vec![s]),
        SerdeValue::Seq(seq) => {
            let mut result = Vec::new();
            for item in seq {
                if let SerdeValue::String(s) = item {
                    result.push(s);
                } else {
                    return Err(serde::de::Error::custom(
                        "Expected string or array of strings",
                    ));
                }
            }
            Ok(result)
        }
        SerdeValue::Unit | SerdeValue::Option(None) => Ok(Vec::new()),
        _ => Err(serde::de::Error::custom(
            "Expected string or array of strings",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_config_roundtrip() -> crate::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("sdkgen.yaml");

        let mut config = GenerationConfig::new("openapi.json", "generated");
        config.languages = vec![GenerationLanguage::Java, GenerationLanguage::TypeScript];
        config.base_url = Some(Url::parse("https://api.example.com/v1").unwrap());
        config.save(&file_path).await?;

        let loaded = GenerationConfig::from_file(&file_path).await?;
        assert_eq!(loaded, config);
        assert_eq!(loaded.client_class_name, "ApiClient");
        assert_eq!(loaded.models_namespace_name(), "ApiSdk.models");

        Ok(())
    }

    #[tokio::test]
    async fn test_string_or_list_patterns() -> crate::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("sdkgen.yaml");
        fs::write(
            &file_path,
            "openapi_path: api.yaml\ninclude_patterns: /users/**\nexclude_patterns:\n  - /admin/**\n  - /users/{id}#DELETE\n",
        )
        .await?;

        let config = GenerationConfig::from_file(&file_path).await?;
        assert_eq!(config.include_patterns, ["/users/**"]);
        assert_eq!(config.exclude_patterns.len(), 2);
        assert!(config.include_additional_data);
        config.validate()?;
        Ok(())
    }

    #[tokio::test]
    async fn test_toml_config() -> crate::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("sdkgen.toml");
        fs::write(
            &file_path,
            "openapi_path = \"api.yaml\"\nlanguages = [\"python\"]\nclient_class_name = \"PetClient\"\n",
        )
        .await?;

        let config = GenerationConfig::from_file(&file_path).await?;
        assert_eq!(config.languages, [GenerationLanguage::Python]);
        assert_eq!(config.client_class_name, "PetClient");
        Ok(())
    }

    #[tokio::test]
    async fn test_discover_prefers_working_directory() -> crate::Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("sdkgen.yml"), "openapi_path: a.yaml\n").await?;
        let found = GenerationConfig::discover(dir.path()).await?;
        assert_eq!(found, Some(dir.path().join("sdkgen.yml")));
        Ok(())
    }

    #[test]
    fn test_validate_rejects_bad_identifiers() {
        let mut config = GenerationConfig::new("a.yaml", "out");
        config.client_class_name = "1Client".to_string();
        assert!(config.validate().is_err());

        let mut config = GenerationConfig::new("a.yaml", "out");
        config.client_namespace_name = "Api..Sdk".to_string();
        assert!(config.validate().is_err());

        let mut config = GenerationConfig::new("a.yaml", "out");
        config.include_patterns = vec!["/users/[".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_language_output_path() {
        let mut config = GenerationConfig::new("a.yaml", "out");
        assert_eq!(config.language_output_path(GenerationLanguage::CSharp), PathBuf::from("out"));
        config.languages.push(GenerationLanguage::Python);
        assert_eq!(
            config.language_output_path(GenerationLanguage::Python),
            PathBuf::from("out").join("python")
        );
    }
}
