//! Configuration view and validation commands: `autodoc config`.

use anyhow::Result;

use super::super::ConfigCommands;

pub fn cmd_config(project_dir: &std::path::Path, command: Option<ConfigCommands>) -> Result<()> {
    use autodoc::autodoc_config::{AutodocToml, CONFIG_FILE_NAME};
    use autodoc::config::Config;
    use autodoc::init::{default_config, get_autodoc_dir};

    let autodoc_dir = get_autodoc_dir(project_dir);
    let config_path = autodoc_dir.join(CONFIG_FILE_NAME);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Autodoc Configuration");
            println!("=====================");
            println!();

            let toml = if config_path.exists() {
                println!("Config file: {}", config_path.display());
                AutodocToml::load(&config_path)?
            } else {
                println!("No autodoc.toml found at {}", config_path.display());
                println!("Using default configuration:");
                AutodocToml::default()
            };
            println!();

            println!("[project]");
            if let Some(name) = &toml.project.name {
                println!("  name = \"{}\"", name);
            }
            println!("  language = \"{}\"", toml.project.language);
            for (key, value) in &toml.project.additional_info {
                println!("  additional_info.{} = \"{}\"", key, value);
            }
            println!();

            println!("[build]");
            println!("  log_level = {}", toml.build.log_level);
            println!("  save_logs = {}", toml.build.save_logs);
            println!("  use_global_file = {}", toml.build.use_global_file);
            println!("  parallel_parts = {}", toml.build.parallel_parts);
            println!("  max_doc_part_size = {}", toml.build.max_doc_part_size);
            println!("  global_part_size = {}", toml.build.global_part_size);
            println!("  branching_factor = {}", toml.build.branching_factor);
            println!("  concurrency = {}", toml.build.concurrency);
            if !toml.build.ignore_patterns.is_empty() {
                println!("  ignore_patterns = {:?}", toml.build.ignore_patterns);
            }
            println!();

            println!("[structure]");
            println!("  include_order = {}", toml.structure.include_order);
            println!("  include_intro_links = {}", toml.structure.include_intro_links);
            println!("  include_intro_text = {}", toml.structure.include_intro_text);
            for description in &toml.structure.custom_descriptions {
                println!("  custom_description: {}", description);
            }
            for rewrite in &toml.structure.custom_rewrites {
                println!("  custom_rewrite: {}", rewrite);
            }
            println!();

            println!("[model]");
            println!("  base_url = \"{}\"", toml.model.base_url);
            println!("  api_key_env = \"{}\"", toml.model.api_key_env);
            println!("  models = {:?}", toml.model.models);
            println!("  shuffle = {}", toml.model.shuffle);
            println!("  failover = \"{}\"", toml.model.failover);
            println!(
                "  backoff = {}ms..{}ms",
                toml.model.backoff_initial_ms, toml.model.backoff_max_ms
            );
            println!();

            println!("Effective values:");
            let config = Config::from_toml(project_dir.to_path_buf(), toml, false);
            println!("  project name = \"{}\"", config.project_name());
            println!(
                "  API key ({}) = {}",
                config.toml.model.api_key_env,
                if config.toml.model.api_key().is_some() { "set" } else { "not set" }
            );
            println!();

            if !config_path.exists() {
                println!("Run 'autodoc config init' to create an autodoc.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No autodoc.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = AutodocToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in &warnings {
                    println!("  - {}", warning);
                }
            }
            println!();

            toml.validate_strict()?;
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("autodoc.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if !autodoc_dir.exists() {
                std::fs::create_dir_all(&autodoc_dir)?;
            }

            default_config(project_dir).save(&config_path)?;

            println!("Created autodoc.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [project] name, language, additional_info");
            println!("  - [build] chunk sizes, global summary, parallel parts");
            println!("  - [structure] ordering, intro sections, custom sections");
            println!("  - [model] endpoint and failover pool");
            println!();
        }
    }

    Ok(())
}
