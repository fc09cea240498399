//! Section reordering for an existing document: `autodoc order`.

use anyhow::{Context, Result};
use std::path::Path;

pub async fn cmd_order(
    project_dir: &Path,
    verbose: bool,
    doc: &Path,
    output: Option<&Path>,
) -> Result<()> {
    use autodoc::config::Config;
    use autodoc::logging::{self, LogSettings};
    use autodoc::postprocess::{order_document, split_by_anchor};

    use super::run::{build_model, load_env};

    load_env(project_dir);
    let config = Config::new(project_dir.to_path_buf(), verbose)?;
    let _log_guard =
        logging::init(&LogSettings::new(config.toml.build.log_level).with_stderr(verbose))?;

    let doc_path = config.resolve(doc);
    let document = std::fs::read_to_string(&doc_path)
        .with_context(|| format!("Failed to read {}", doc_path.display()))?;

    let ordered = match split_by_anchor(&document) {
        Some(sections) if sections.len() >= 2 => {
            let model = build_model(&config)?;
            order_document(&document, model.as_ref()).await?
        }
        _ => {
            eprintln!("No reorderable anchored sections found; document left unchanged.");
            document
        }
    };

    match output {
        Some(path) => {
            let path = config.resolve(path);
            std::fs::write(&path, &ordered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Ordered document written to {}", path.display());
        }
        None => print!("{}", ordered),
    }

    Ok(())
}
