//! Repository harvester.
//!
//! Packs a project tree into one text blob (the "code mix"): a directory
//! listing followed by every file wrapped in a `<file path="...">` block.
//! The closing `</file>` tag is what the chunker splits on.

use anyhow::{Context, Result};
use glob::Pattern;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::chunk::UNIT_BOUNDARY;

/// Patterns skipped in every harvest, before user patterns are applied.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    "*.pyo",
    "*.pyd",
    "*.pdb",
    "*.pkl",
    "*.log",
    "*.sqlite3",
    "*.db",
    "data",
    "venv",
    "env",
    ".venv",
    ".env",
    ".vscode",
    ".idea",
    "*.iml",
    ".gitignore",
    ".ruff_cache",
    ".autodoc",
    "*.pyc",
    "__pycache__",
    ".git",
    ".coverage",
    "htmlcov",
    "migrations",
    "*.md",
    "static",
    "staticfiles",
    ".mypy_cache",
    "target",
    "node_modules",
];

const STRUCTURE_HEADER: &str = "Repository Structure:\n";
const SECTION_RULE_WIDTH: usize = 20;

/// Builder for the code mix of one project root.
#[derive(Debug, Clone)]
pub struct CodeMix {
    root: PathBuf,
    patterns: Vec<Pattern>,
}

impl CodeMix {
    /// Harvester for `root` ignoring the built-in patterns plus `extra`.
    pub fn new(root: impl Into<PathBuf>, extra: &[String]) -> Result<Self> {
        let mut patterns = Vec::with_capacity(DEFAULT_IGNORE_PATTERNS.len() + extra.len());
        let builtin = DEFAULT_IGNORE_PATTERNS.iter().copied();
        for raw in builtin.chain(extra.iter().map(String::as_str)) {
            let pattern = Pattern::new(raw)
                .with_context(|| format!("Invalid ignore pattern '{}'", raw))?;
            patterns.push(pattern);
        }
        Ok(Self {
            root: root.into(),
            patterns,
        })
    }

    /// Whether a path relative to the root is excluded.
    ///
    /// A pattern excludes a path when it matches the whole relative path,
    /// its file name, or any single component.
    pub fn should_ignore(&self, relative: &Path) -> bool {
        let full = display_path(relative);
        let name = relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.patterns.iter().any(|pattern| {
            pattern.matches(&full)
                || pattern.matches(&name)
                || relative
                    .components()
                    .any(|c| pattern.matches(&c.as_os_str().to_string_lossy()))
        })
    }

    /// Entries under the root that survive the ignore list, sorted by path.
    /// Ignored directories are not descended into.
    fn entries(&self) -> Vec<DirEntry> {
        WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry
                    .path()
                    .strip_prefix(&self.root)
                    .map(|rel| !self.should_ignore(rel))
                    .unwrap_or(false)
            })
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    None
                }
            })
            .collect()
    }

    /// Build the code mix in memory.
    pub fn build(&self) -> Result<String> {
        let root = &self.root;
        if !root.is_dir() {
            anyhow::bail!("Project directory not found: {}", root.display());
        }

        let entries = self.entries();
        let mut out = String::from(STRUCTURE_HEADER);

        for entry in &entries {
            let indent = "  ".repeat(entry.depth().saturating_sub(1));
            let name = entry.file_name().to_string_lossy();
            if entry.file_type().is_dir() {
                let _ = writeln!(out, "{}{}/", indent, name);
            } else {
                let _ = writeln!(out, "{}{}", indent, name);
            }
        }

        out.push('\n');
        out.push_str(&"=".repeat(SECTION_RULE_WIDTH));
        out.push_str("\n\n");

        let mut files = 0usize;
        for entry in entries.iter().filter(|e| e.file_type().is_file()) {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            match fs::read(entry.path()) {
                Ok(bytes) => {
                    let _ = write!(
                        out,
                        "<file path=\"{}\">\n{}\n{}\n\n",
                        display_path(relative),
                        String::from_utf8_lossy(&bytes),
                        UNIT_BOUNDARY
                    );
                    files += 1;
                }
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "Failed to read file");
                    let _ = writeln!(out, "Error reading {}: {}", entry.path().display(), e);
                }
            }
            debug!(path = %relative.display(), "Harvested file");
        }

        info!(root = %root.display(), files, chars = out.len(), "Code mix built");
        Ok(out)
    }

    /// Build the code mix and write it to `path`.
    pub fn write_to(&self, path: &Path) -> Result<String> {
        let mix = self.build()?;
        fs::write(path, &mix)
            .with_context(|| format!("Failed to write code mix to {}", path.display()))?;
        Ok(mix)
    }
}

/// Relative path with `/` separators on every platform.
fn display_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn project() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("src/nested/util.rs"), "pub fn util() {}").unwrap();
        fs::write(dir.path().join("README.md"), "# readme").unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref").unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]").unwrap();
        dir
    }

    #[test]
    fn test_build_layout() {
        let dir = project();
        let mix = CodeMix::new(dir.path(), &[]).unwrap().build().unwrap();

        assert!(mix.starts_with(
            "Repository Structure:\nCargo.toml\nsrc/\n  main.rs\n  nested/\n    util.rs\n"
        ));
        assert!(mix.contains("\n====================\n\n"));
        assert!(mix.contains("<file path=\"src/main.rs\">\nfn main() {}\n</file>\n\n"));
        assert!(mix.contains("<file path=\"src/nested/util.rs\">"));
    }

    #[test]
    fn test_default_ignores_apply() {
        let dir = project();
        let mix = CodeMix::new(dir.path(), &[]).unwrap().build().unwrap();
        assert!(!mix.contains("README.md"));
        assert!(!mix.contains(".git"));
        assert!(!mix.contains("ref"));
    }

    #[test]
    fn test_extra_patterns() {
        let dir = project();
        let mix = CodeMix::new(dir.path(), &["nested".to_string(), "*.toml".to_string()])
            .unwrap()
            .build()
            .unwrap();
        assert!(!mix.contains("util.rs"));
        assert!(!mix.contains("Cargo.toml"));
        assert!(mix.contains("main.rs"));
    }

    #[test]
    fn test_should_ignore_matches_components() {
        let mix = CodeMix::new(".", &[]).unwrap();
        assert!(mix.should_ignore(Path::new("a/__pycache__/x.py")));
        assert!(mix.should_ignore(Path::new("docs/guide.md")));
        assert!(!mix.should_ignore(Path::new("src/lib.rs")));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        assert!(CodeMix::new(".", &["[".to_string()]).is_err());
    }

    #[test]
    fn test_missing_root_is_error() {
        let dir = tempdir().unwrap();
        let mix = CodeMix::new(dir.path().join("nope"), &[]).unwrap();
        assert!(mix.build().is_err());
    }

    #[test]
    fn test_write_to_file() {
        let dir = project();
        let out = dir.path().join("mix.txt");
        let mix = CodeMix::new(dir.path(), &["mix.txt".to_string()])
            .unwrap()
            .write_to(&out)
            .unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), mix);
    }
}
