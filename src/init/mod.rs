//! Initialization of the `.autodoc/` project directory.
//!
//! ```text
//! .autodoc/
//! ├── autodoc.toml     # Project configuration
//! ├── output.md        # Final documentation (written by `autodoc run`)
//! └── cache/           # Intermediate artifacts of a run
//!     ├── code_mix.txt
//!     ├── global_info.md
//!     ├── output_doc.md
//!     └── report.log
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::autodoc_config::{AutodocToml, CONFIG_FILE_NAME};

/// The name of the autodoc directory.
pub const AUTODOC_DIR: &str = ".autodoc";

/// The name of the cache directory inside [`AUTODOC_DIR`].
pub const CACHE_DIR: &str = "cache";

/// Result of initializing an autodoc project.
#[derive(Debug)]
pub struct InitResult {
    /// Path to the `.autodoc` directory
    pub autodoc_dir: PathBuf,
    /// Whether the directory was newly created (false if it already existed)
    pub created: bool,
    /// Whether a default `autodoc.toml` was written
    pub config_written: bool,
}

/// Initialize autodoc in `project_dir`.
///
/// Creates `.autodoc/` and `.autodoc/cache/`, and writes a default
/// `autodoc.toml` named after the directory unless one already exists.
pub fn init_project(project_dir: &Path) -> Result<InitResult> {
    let autodoc_dir = get_autodoc_dir(project_dir);
    let created = !autodoc_dir.exists();

    let cache_dir = autodoc_dir.join(CACHE_DIR);
    std::fs::create_dir_all(&cache_dir)
        .with_context(|| format!("Failed to create directory: {}", cache_dir.display()))?;

    let config_path = autodoc_dir.join(CONFIG_FILE_NAME);
    let config_written = if config_path.exists() {
        false
    } else {
        default_config(project_dir).save(&config_path)?;
        true
    };

    Ok(InitResult {
        autodoc_dir,
        created,
        config_written,
    })
}

/// Default configuration with the project named after its directory.
pub fn default_config(project_dir: &Path) -> AutodocToml {
    let mut config = AutodocToml::default();
    config.project.name = Some(project_name_from_dir(project_dir));
    config
}

/// Directory name of `project_dir`, or "project" when it has none.
pub fn project_name_from_dir(project_dir: &Path) -> String {
    project_dir
        .canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(project_dir)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}

/// Check if a project is already initialized.
pub fn is_initialized(project_dir: &Path) -> bool {
    project_dir.join(AUTODOC_DIR).join(CONFIG_FILE_NAME).exists()
}

/// Get the path to the autodoc directory for a project.
pub fn get_autodoc_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(AUTODOC_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_creates_structure() {
        let dir = tempdir().unwrap();
        let result = init_project(dir.path()).unwrap();

        assert!(result.created);
        assert!(result.config_written);
        assert!(dir.path().join(".autodoc/cache").is_dir());
        assert!(dir.path().join(".autodoc/autodoc.toml").is_file());
        assert!(is_initialized(dir.path()));
    }

    #[test]
    fn test_init_names_project_after_directory() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("my-service");
        std::fs::create_dir(&project).unwrap();
        init_project(&project).unwrap();

        let config = AutodocToml::load_or_default(&get_autodoc_dir(&project)).unwrap();
        assert_eq!(config.project.name.as_deref(), Some("my-service"));
    }

    #[test]
    fn test_init_keeps_existing_config() {
        let dir = tempdir().unwrap();
        init_project(dir.path()).unwrap();
        let path = dir.path().join(".autodoc/autodoc.toml");
        std::fs::write(&path, "[project]\nlanguage = \"de\"\n").unwrap();

        let result = init_project(dir.path()).unwrap();
        assert!(!result.created);
        assert!(!result.config_written);
        assert!(std::fs::read_to_string(&path).unwrap().contains("\"de\""));
    }

    #[test]
    fn test_not_initialized() {
        let dir = tempdir().unwrap();
        assert!(!is_initialized(dir.path()));
    }
}
