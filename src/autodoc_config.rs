//! Configuration file for autodoc.
//!
//! Settings are read from `.autodoc/autodoc.toml`. Every key is optional;
//! unknown keys are rejected so typos surface at load time instead of being
//! silently ignored.
//!
//! # Configuration File Format
//!
//! ```toml
//! [project]
//! name = "my-project"
//! language = "en"
//!
//! [project.additional_info]
//! global_idea = "Generates documentation for repositories"
//!
//! [build]
//! log_level = 0
//! save_logs = false
//! use_global_file = true
//! parallel_parts = false
//! max_doc_part_size = 5000
//! global_part_size = 10000
//! branching_factor = 4
//! concurrency = 4
//! ignore_patterns = ["*.lock"]
//!
//! [structure]
//! include_order = true
//! include_intro_links = true
//! include_intro_text = false
//! custom_descriptions = ["How to install the project"]
//! custom_rewrites = ["License: MIT"]
//!
//! [model]
//! base_url = "https://api.groq.com/openai/v1"
//! api_key_env = "API_KEY"
//! models = ["openai/gpt-oss-120b", "llama-3.3-70b-versatile"]
//! shuffle = true
//! failover = "evict"
//! backoff_initial_ms = 1000
//! backoff_max_ms = 30000
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::model::openai::DEFAULT_BASE_URL;
use crate::model::{Backoff, FailoverPolicy};
use crate::reduce::{DEFAULT_BRANCHING_FACTOR, DEFAULT_CONCURRENCY};

/// File name of the configuration inside the `.autodoc` directory.
pub const CONFIG_FILE_NAME: &str = "autodoc.toml";

/// Models tried when the file lists none.
pub const DEFAULT_MODELS: &[&str] = &[
    "openai/gpt-oss-120b",
    "llama-3.3-70b-versatile",
    "openai/gpt-oss-safeguard-20b",
];

/// Project identity and the free-form profile handed to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    /// Project name (defaults to the directory name)
    #[serde(default)]
    pub name: Option<String>,
    /// Output language of the documentation
    #[serde(default = "default_language")]
    pub language: String,
    /// Key/value profile entries (global idea, audience, stack...)
    #[serde(default)]
    pub additional_info: BTreeMap<String, String>,
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            name: None,
            language: default_language(),
            additional_info: BTreeMap::new(),
        }
    }
}

/// Build pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    /// Verbosity: <0 warn, 0 info, 1 debug, >=2 trace
    #[serde(default)]
    pub log_level: i32,
    /// Keep `report.log` in the cache after the run
    #[serde(default)]
    pub save_logs: bool,
    /// Produce a global summary and feed it to every part
    #[serde(default = "default_true")]
    pub use_global_file: bool,
    /// Generate parts concurrently, without rolling context
    #[serde(default)]
    pub parallel_parts: bool,
    /// Chunk size for documentation parts
    #[serde(default = "default_max_doc_part_size")]
    pub max_doc_part_size: usize,
    /// Chunk size for the global summary reduction
    #[serde(default = "default_global_part_size")]
    pub global_part_size: usize,
    /// Items merged per reduction level
    #[serde(default = "default_branching_factor")]
    pub branching_factor: usize,
    /// In-flight model calls for concurrent stages (1 = sequential)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Extra glob patterns excluded from the harvest
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_max_doc_part_size() -> usize {
    5_000
}

fn default_global_part_size() -> usize {
    10_000
}

fn default_branching_factor() -> usize {
    DEFAULT_BRANCHING_FACTOR
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            log_level: 0,
            save_logs: false,
            use_global_file: true,
            parallel_parts: false,
            max_doc_part_size: default_max_doc_part_size(),
            global_part_size: default_global_part_size(),
            branching_factor: default_branching_factor(),
            concurrency: default_concurrency(),
            ignore_patterns: Vec::new(),
        }
    }
}

/// Which extra sections the final document gets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructureSection {
    #[serde(default = "default_true")]
    pub include_order: bool,
    #[serde(default = "default_true")]
    pub include_intro_links: bool,
    #[serde(default)]
    pub include_intro_text: bool,
    /// Questions answered from the code
    #[serde(default)]
    pub custom_descriptions: Vec<String>,
    /// Texts rewritten into sections without code context
    #[serde(default)]
    pub custom_rewrites: Vec<String>,
}

impl Default for StructureSection {
    fn default() -> Self {
        Self {
            include_order: true,
            include_intro_links: true,
            include_intro_text: false,
            custom_descriptions: Vec::new(),
            custom_rewrites: Vec::new(),
        }
    }
}

/// Model endpoint and failover pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSection {
    /// OpenAI-compatible API root
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Model names in the failover pool
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    /// Shuffle the pool when the client is built
    #[serde(default = "default_true")]
    pub shuffle: bool,
    #[serde(default)]
    pub failover: FailoverPolicy,
    /// First delay after a full failed pass (rotate policy, 0 disables)
    #[serde(default = "default_backoff_initial_ms")]
    pub backoff_initial_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_key_env() -> String {
    "API_KEY".to_string()
}

fn default_models() -> Vec<String> {
    DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
}

fn default_backoff_initial_ms() -> u64 {
    1_000
}

fn default_backoff_max_ms() -> u64 {
    30_000
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            models: default_models(),
            shuffle: true,
            failover: FailoverPolicy::default(),
            backoff_initial_ms: default_backoff_initial_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

impl ModelSection {
    pub fn backoff(&self) -> Backoff {
        Backoff {
            initial: Duration::from_millis(self.backoff_initial_ms),
            max: Duration::from_millis(self.backoff_max_ms.max(self.backoff_initial_ms)),
        }
    }

    /// API key from the configured environment variable, if set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// The complete autodoc.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutodocToml {
    #[serde(default)]
    pub project: ProjectSection,
    #[serde(default)]
    pub build: BuildSection,
    #[serde(default)]
    pub structure: StructureSection,
    #[serde(default)]
    pub model: ModelSection,
}

impl AutodocToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load `autodoc.toml` from `autodoc_dir`, or defaults if it doesn't exist.
    pub fn load_or_default(autodoc_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = autodoc_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize autodoc.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Problems that make a run pointless or impossible.
    fn errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.build.max_doc_part_size == 0 {
            errors.push("build.max_doc_part_size must be greater than 0".to_string());
        }
        if self.build.global_part_size == 0 {
            errors.push("build.global_part_size must be greater than 0".to_string());
        }
        if self.build.concurrency == 0 {
            errors.push("build.concurrency must be at least 1".to_string());
        }
        if self.model.models.iter().all(|m| m.trim().is_empty()) {
            errors.push("model.models must list at least one model".to_string());
        }
        if self.model.base_url.trim().is_empty() {
            errors.push("model.base_url must not be empty".to_string());
        }
        for pattern in &self.build.ignore_patterns {
            if let Err(e) = glob::Pattern::new(pattern) {
                errors.push(format!("Invalid ignore pattern '{}': {}", pattern, e));
            }
        }

        errors
    }

    /// Validate the configuration, returning every problem found as a warning.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.errors();

        if self.build.branching_factor < 2 {
            warnings.push(format!(
                "build.branching_factor {} is below 2; 2 will be used",
                self.build.branching_factor
            ));
        }
        if self.model.backoff_max_ms < self.model.backoff_initial_ms {
            warnings.push(format!(
                "model.backoff_max_ms ({}) is below backoff_initial_ms ({}); the initial delay will be used as the cap",
                self.model.backoff_max_ms, self.model.backoff_initial_ms
            ));
        }
        if self.model.failover == FailoverPolicy::Rotate && self.model.backoff_initial_ms == 0 {
            warnings.push(
                "model.failover = \"rotate\" without backoff retries a fully failing pool forever"
                    .to_string(),
            );
        }
        if !self.build.use_global_file && self.structure.include_intro_text {
            warnings.push(
                "structure.include_intro_text without build.use_global_file writes the overview from the generated document"
                    .to_string(),
            );
        }

        warnings
    }

    /// Fail on problems that would break a run.
    pub fn validate_strict(&self) -> Result<(), ConfigError> {
        let errors = self.errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }
}
