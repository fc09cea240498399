use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "autodoc")]
#[command(version, about = "Generate repository documentation with a language model")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create .autodoc/ with a default autodoc.toml
    Init,
    /// Generate documentation for the project
    Run {
        /// Output language (overrides autodoc.toml)
        #[arg(short, long)]
        language: Option<String>,

        /// Generate parts concurrently, without carrying context between them
        #[arg(long)]
        parallel: bool,

        /// Maximum chunk size in characters for documentation parts
        #[arg(long)]
        max_part_size: Option<usize>,

        /// Where to write the final document (default: .autodoc/output.md)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show how the project (or a file) would be chunked, without model calls
    Chunk {
        /// Chunk this file instead of harvesting the project
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Maximum chunk size in characters (default: build.max_doc_part_size)
        #[arg(short, long)]
        max_symbols: Option<usize>,
    },
    /// Reorder the anchored sections of an existing document
    Order {
        /// Markdown document to reorder
        doc: PathBuf,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default autodoc.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Init => cmd::cmd_init(&project_dir)?,
        Commands::Run {
            language,
            parallel,
            max_part_size,
            output,
        } => {
            let args = cmd::RunArgs {
                language: language.clone(),
                parallel: *parallel,
                max_part_size: *max_part_size,
                output: output.clone(),
            };
            cmd::cmd_run(&project_dir, cli.verbose, args).await?;
        }
        Commands::Chunk { input, max_symbols } => {
            cmd::cmd_chunk(&project_dir, input.as_deref(), *max_symbols)?
        }
        Commands::Order { doc, output } => {
            cmd::cmd_order(&project_dir, cli.verbose, doc, output.as_deref()).await?
        }
        Commands::Config { command } => cmd::cmd_config(&project_dir, command.clone())?,
    }

    Ok(())
}
