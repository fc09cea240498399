//! Chunking preview: `autodoc chunk`.

use anyhow::{Context, Result};
use std::path::Path;

pub fn cmd_chunk(
    project_dir: &Path,
    input: Option<&Path>,
    max_symbols: Option<usize>,
) -> Result<()> {
    use autodoc::chunk::Chunker;
    use autodoc::config::Config;
    use autodoc::harvest::CodeMix;
    use autodoc::util::char_len;

    let config = Config::new(project_dir.to_path_buf(), false)?;
    let max_symbols = max_symbols.unwrap_or(config.toml.build.max_doc_part_size);
    if max_symbols == 0 {
        anyhow::bail!("--max-symbols must be greater than 0");
    }

    let (source, text) = match input {
        Some(path) => {
            let path = config.resolve(path);
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            (path.display().to_string(), text)
        }
        None => {
            let mix = CodeMix::new(&config.project_dir, &config.toml.build.ignore_patterns)?;
            (format!("{} (code mix)", config.project_dir.display()), mix.build()?)
        }
    };

    let chunks = Chunker::new(max_symbols).split(&text);

    println!();
    println!("Source: {}", source);
    println!("Input: {} chars, limit {} chars per chunk", char_len(&text), max_symbols);
    println!();
    println!("{:>6}  {:>8}", "Chunk", "Chars");
    for (i, chunk) in chunks.iter().enumerate() {
        println!("{:>6}  {:>8}", i + 1, char_len(chunk));
    }
    println!();
    println!("{} chunk(s)", chunks.len());

    Ok(())
}
