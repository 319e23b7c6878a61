//! Configuration management for specforge
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (specforge.toml)
//! - Environment variables (SPECFORGE__*)
//!
//! ## Example config file (specforge.toml):
//! ```toml
//! [store]
//! base_iri = "https://example.com"
//!
//! [generation.json_schema]
//! dialect = "https://json-schema.org/draft/2020-12/schema"
//!
//! [generation.csv_schema]
//! layout = "multiple"
//!
//! [generation.xml_schema.root_class]
//! extract_type = true
//!
//! [generation.documentation]
//! languages = ["cs", "en"]
//!
//! [output]
//! directory = "./artefacts"
//! format = "pretty"
//! ```
//!
//! Generation settings are defaults; an artefact's own `configuration`
//! object overrides them key by key.

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ModelResult;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForgeConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Prefix of newly minted resource IRIs
    #[serde(default = "default_base_iri")]
    pub base_iri: String,
}

/// Per-format generator defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub json_schema: JsonSchemaConfig,

    #[serde(default)]
    pub xml_schema: XmlSchemaConfig,

    #[serde(default)]
    pub csv_schema: CsvSchemaConfig,

    #[serde(default)]
    pub documentation: DocumentationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchemaConfig {
    /// Value of `$schema`
    #[serde(default = "default_dialect")]
    pub dialect: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XmlSchemaConfig {
    #[serde(default)]
    pub root_class: XmlExtraction,

    #[serde(default)]
    pub other_classes: XmlExtraction,
}

/// Whether classes get named top-level definitions instead of inline ones
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlExtraction {
    #[serde(default)]
    pub extract_type: bool,

    #[serde(default)]
    pub extract_group: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CsvSchemaConfig {
    #[serde(default)]
    pub layout: TableLayout,
}

/// CSV table layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableLayout {
    /// One denormalized table
    #[default]
    Single,
    /// One table per class, joined by foreign keys
    Multiple,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentationConfig {
    /// Preferred label languages, most preferred first
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory for generated artefacts
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,

    /// JSON output format
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON artefacts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

// Default value functions
fn default_base_iri() -> String {
    "https://ofn.gov.cz".to_string()
}

fn default_dialect() -> String {
    "https://json-schema.org/draft/2020-12/schema".to_string()
}

fn default_languages() -> Vec<String> {
    vec!["cs".to_string(), "en".to_string()]
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("./artefacts")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_iri: default_base_iri(),
        }
    }
}

impl Default for JsonSchemaConfig {
    fn default() -> Self {
        Self {
            dialect: default_dialect(),
        }
    }
}

impl Default for DocumentationConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            format: OutputFormat::Pretty,
        }
    }
}

impl GenerationConfig {
    /// Apply an artefact's configuration object on top of these defaults.
    /// `null` leaves the defaults unchanged.
    pub fn with_overrides(&self, overrides: &serde_json::Value) -> ModelResult<Self> {
        if overrides.is_null() {
            return Ok(self.clone());
        }
        let mut merged = serde_json::to_value(self)?;
        merge(&mut merged, overrides);
        Ok(serde_json::from_value(merged)?)
    }
}

fn merge(target: &mut serde_json::Value, overrides: &serde_json::Value) {
    match (target, overrides) {
        (serde_json::Value::Object(target), serde_json::Value::Object(overrides)) => {
            for (key, value) in overrides {
                merge(target.entry(key.clone()).or_insert(serde_json::Value::Null), value);
            }
        }
        (target, value) => *target = value.clone(),
    }
}

impl OutputFormat {
    pub fn render(&self, value: &serde_json::Value) -> ModelResult<String> {
        let mut text = match self {
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
            OutputFormat::Compact => serde_json::to_string(value)?,
        };
        text.push('\n');
        Ok(text)
    }
}

impl ForgeConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["specforge.toml", ".specforge.toml", "config/specforge.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("cz", "ofn", "specforge") {
            let xdg_config = config_dir.config_dir().join("specforge.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (SPECFORGE__*)
        builder = builder.add_source(
            Environment::with_prefix("SPECFORGE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Output directory (resolves relative paths)
    pub fn output_directory(&self) -> PathBuf {
        if self.output.directory.is_absolute() {
            self.output.directory.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.output.directory)
        }
    }
}
