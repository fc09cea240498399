//! Documentation generation: `autodoc run`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use autodoc::model::LanguageModel;

/// Command-line options for `autodoc run`.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub language: Option<String>,
    pub parallel: bool,
    pub max_part_size: Option<usize>,
    pub output: Option<PathBuf>,
}

/// Load `<project>/.env` into the process environment if it exists.
pub fn load_env(project_dir: &Path) {
    let env_file = project_dir.join(".env");
    if env_file.exists()
        && let Err(e) = dotenvy::from_path(&env_file)
    {
        eprintln!("Warning: failed to load {}: {}", env_file.display(), e);
    }
}

/// Build the failover client described by `[model]`.
pub fn build_model(config: &autodoc::config::Config) -> Result<Arc<dyn LanguageModel>> {
    use autodoc::model::{FailoverClient, OpenAiCompatBackend};

    let section = &config.toml.model;
    let api_key = section.api_key().with_context(|| {
        format!(
            "No API key found. Set {} in the environment or in {}",
            section.api_key_env,
            config.project_dir.join(".env").display()
        )
    })?;

    let backend = OpenAiCompatBackend::new(section.base_url.clone(), api_key);
    let models: Vec<String> = section
        .models
        .iter()
        .filter(|m| !m.trim().is_empty())
        .cloned()
        .collect();
    let client = if section.shuffle {
        FailoverClient::new(backend, models)
    } else {
        FailoverClient::ordered(backend, models)
    }
    .with_policy(section.failover)
    .with_backoff(section.backoff());

    Ok(Arc::new(client))
}

pub async fn cmd_run(project_dir: &Path, verbose: bool, args: RunArgs) -> Result<()> {
    use autodoc::config::{Config, Overrides};
    use autodoc::logging::{self, LogSettings};
    use autodoc::pipeline::{Manager, planned_stages};
    use autodoc::ui::ConsoleProgress;
    use autodoc::ui::icons::PAGE;

    load_env(project_dir);

    let config = Config::new(project_dir.to_path_buf(), verbose)?.with_overrides(Overrides {
        language: args.language,
        parallel: args.parallel,
        max_part_size: args.max_part_size,
    });
    config.toml.validate_strict()?;
    for warning in config.validate() {
        eprintln!("Warning: {}", warning);
    }

    let model = build_model(&config)?;
    config.ensure_directories()?;

    let _log_guard = logging::init(
        &LogSettings::new(config.toml.build.log_level)
            .with_log_dir(&config.cache_dir)
            .with_stderr(verbose),
    )?;

    let output = match &args.output {
        Some(path) => config.resolve(path),
        None => config.default_output_file(),
    };

    let stages = planned_stages(&config);
    let progress = Arc::new(ConsoleProgress::new(stages.len() as u64, verbose));
    let mut manager = Manager::new(config, model, progress.clone())?;

    let document = match manager.run().await {
        Ok(document) => document,
        Err(e) => {
            progress.fail(&format!("Documentation run failed: {}", e));
            return Err(e);
        }
    };

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&output, &document)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    progress.finish(&format!("Documentation written to {}", output.display()));
    println!();
    println!(
        "{}Output: {} ({} chars)",
        PAGE,
        output.display(),
        document.chars().count()
    );
    if verbose {
        for stage in &manager.report().stages {
            println!("  {:<22} {:>7} ms", stage.name, stage.duration_ms);
        }
    }

    Ok(())
}
