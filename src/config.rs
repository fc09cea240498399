use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::autodoc_config::AutodocToml;
use crate::init::{AUTODOC_DIR, CACHE_DIR, project_name_from_dir};
use crate::prompts::build_project_profile;

/// Default location of the final document, relative to the project.
pub const DEFAULT_OUTPUT_FILE: &str = ".autodoc/output.md";

/// Project identity rendered into the system prompt shared by every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSettings {
    pub name: String,
    pub info: BTreeMap<String, String>,
}

impl ProjectSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            info: BTreeMap::new(),
        }
    }

    pub fn with_info(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.info.insert(key.into(), value.into());
        self
    }

    /// The project profile prompt.
    pub fn prompt(&self) -> String {
        build_project_profile(&self.name, &self.info)
    }
}

/// Values given on the command line that win over `autodoc.toml`.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub language: Option<String>,
    pub parallel: bool,
    pub max_part_size: Option<usize>,
}

/// Runtime configuration: resolved paths plus the loaded `autodoc.toml`.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_dir: PathBuf,
    pub autodoc_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub verbose: bool,
    pub toml: AutodocToml,
}

impl Config {
    /// Resolve `project_dir` and load its configuration (defaults if absent).
    pub fn new(project_dir: PathBuf, verbose: bool) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .with_context(|| {
                format!("Failed to resolve project directory: {}", project_dir.display())
            })?;
        let autodoc_dir = project_dir.join(AUTODOC_DIR);
        let toml = AutodocToml::load_or_default(&autodoc_dir)?;
        Ok(Self::from_toml(project_dir, toml, verbose))
    }

    /// Build from an already loaded configuration.
    pub fn from_toml(project_dir: PathBuf, toml: AutodocToml, verbose: bool) -> Self {
        let autodoc_dir = project_dir.join(AUTODOC_DIR);
        let cache_dir = autodoc_dir.join(CACHE_DIR);
        Self {
            project_dir,
            autodoc_dir,
            cache_dir,
            verbose,
            toml,
        }
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(language) = overrides.language {
            self.toml.project.language = language;
        }
        if overrides.parallel {
            self.toml.build.parallel_parts = true;
        }
        if let Some(size) = overrides.max_part_size {
            self.toml.build.max_doc_part_size = size;
        }
        self
    }

    pub fn language(&self) -> &str {
        &self.toml.project.language
    }

    /// Configured project name, or the directory name.
    pub fn project_name(&self) -> String {
        self.toml
            .project
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| project_name_from_dir(&self.project_dir))
    }

    pub fn project_settings(&self) -> ProjectSettings {
        ProjectSettings {
            name: self.project_name(),
            info: self.toml.project.additional_info.clone(),
        }
    }

    /// Default path of the final document.
    pub fn default_output_file(&self) -> PathBuf {
        self.project_dir.join(DEFAULT_OUTPUT_FILE)
    }

    /// Resolve a user-given path against the project directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.cache_dir).with_context(|| {
            format!("Failed to create cache directory: {}", self.cache_dir.display())
        })?;
        Ok(())
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_config_paths() {
        let dir = tempdir().unwrap();
        let config = Config::new(dir.path().to_path_buf(), true).unwrap();
        let root = dir.path().canonicalize().unwrap();

        assert!(config.verbose);
        assert_eq!(config.autodoc_dir, root.join(".autodoc"));
        assert_eq!(config.cache_dir, root.join(".autodoc/cache"));
        assert_eq!(config.default_output_file(), root.join(".autodoc/output.md"));
    }

    #[test]
    fn test_config_loads_toml() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".autodoc")).unwrap();
        fs::write(
            dir.path().join(".autodoc/autodoc.toml"),
            "[project]\nname = \"Demo\"\nlanguage = \"fr\"\n\
             [project.additional_info]\nglobal_idea = \"docs\"\n",
        )
        .unwrap();

        let config = Config::new(dir.path().to_path_buf(), false).unwrap();
        assert_eq!(config.language(), "fr");
        assert_eq!(config.project_name(), "Demo");

        let prompt = config.project_settings().prompt();
        assert!(prompt.contains("Project Name: Demo"));
        assert!(prompt.contains("global_idea: docs"));
    }

    #[test]
    fn test_config_rejects_bad_toml() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".autodoc")).unwrap();
        fs::write(dir.path().join(".autodoc/autodoc.toml"), "[build]\nbogus = 1\n").unwrap();
        assert!(Config::new(dir.path().to_path_buf(), false).is_err());
    }

    #[test]
    fn test_missing_project_dir() {
        let dir = tempdir().unwrap();
        let result = Config::new(dir.path().join("missing"), false);
        assert!(result.unwrap_err().to_string().contains("Failed to resolve project directory"));
    }

    #[test]
    fn test_overrides_win() {
        let dir = tempdir().unwrap();
        let config = Config::new(dir.path().to_path_buf(), false)
            .unwrap()
            .with_overrides(Overrides {
                language: Some("es".into()),
                parallel: true,
                max_part_size: Some(1234),
            });
        assert_eq!(config.language(), "es");
        assert!(config.toml.build.parallel_parts);
        assert_eq!(config.toml.build.max_doc_part_size, 1234);
    }

    #[test]
    fn test_project_name_falls_back_to_directory() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("named-dir");
        fs::create_dir(&project).unwrap();
        let config = Config::new(project, false).unwrap();
        assert_eq!(config.project_name(), "named-dir");
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let dir = tempdir().unwrap();
        let config = Config::new(dir.path().to_path_buf(), false).unwrap();
        assert_eq!(config.resolve(Path::new("out.md")), config.project_dir.join("out.md"));
        let abs = dir.path().join("abs.md");
        assert_eq!(config.resolve(&abs), abs);
    }

    #[test]
    fn test_project_settings_builder() {
        let settings = ProjectSettings::new("X").with_info("audience", "devs");
        assert!(settings.prompt().contains("audience: devs"));
    }
}
