//! Pipeline manager.
//!
//! The [`Manager`] runs the documentation stages against the cache directory
//! (`.autodoc/cache/`). Each stage reads the artifacts it needs from disk and
//! writes its result back, so a stage can be rerun on its own:
//!
//! ```text
//! generate_code_mix     project tree        -> code_mix.txt
//! generate_global_info  code_mix.txt        -> global_info.md
//! generate_doc_parts    code_mix.txt (+gi)  -> output_doc.md
//! factory_generate_doc  output_doc.md (+..) -> output_doc.md (sections prepended)
//! order_doc             output_doc.md       -> output_doc.md (reordered)
//! clear_cache           report.log removed unless save_logs
//! ```

use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::chunk::Chunker;
use crate::config::Config;
use crate::errors::PipelineError;
use crate::factory::{CustomModule, CustomRewriteModule, DocFactory, DocInfo, IntroLinks, IntroText};
use crate::generate::DocGenerator;
use crate::harvest::CodeMix;
use crate::logging::LOG_FILE_NAME;
use crate::model::LanguageModel;
use crate::postprocess::order_document;
use crate::reduce::HierarchicalReducer;
use crate::ui::Progress;

pub mod report;

pub use report::{REPORT_FILE_NAME, RunReport, StageRecord};

/// Files kept in the cache directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    CodeMix,
    GlobalInfo,
    OutputDoc,
    Logs,
    Report,
}

impl Artifact {
    pub fn file_name(self) -> &'static str {
        match self {
            Artifact::CodeMix => "code_mix.txt",
            Artifact::GlobalInfo => "global_info.md",
            Artifact::OutputDoc => "output_doc.md",
            Artifact::Logs => LOG_FILE_NAME,
            Artifact::Report => REPORT_FILE_NAME,
        }
    }
}

/// Names of the stages [`Manager::run`] executes for `config`, in order.
pub fn planned_stages(config: &Config) -> Vec<&'static str> {
    let build = &config.toml.build;
    let structure = &config.toml.structure;

    let mut stages = vec!["generate_code_mix"];
    if build.use_global_file {
        stages.push("generate_global_info");
    }
    stages.push("generate_doc_parts");
    if !structure.custom_descriptions.is_empty() || !structure.custom_rewrites.is_empty() {
        stages.push("custom_sections");
    }
    if structure.include_order {
        stages.push("order_doc");
    }
    if structure.include_intro_links || structure.include_intro_text {
        stages.push("intro_sections");
    }
    stages.push("clear_cache");
    stages
}

/// Runs the documentation stages for one project.
pub struct Manager {
    config: Config,
    model: Arc<dyn LanguageModel>,
    progress: Arc<dyn Progress>,
    report: RunReport,
}

impl Manager {
    /// Create a manager and make sure the cache directory exists.
    pub fn new(
        config: Config,
        model: Arc<dyn LanguageModel>,
        progress: Arc<dyn Progress>,
    ) -> Result<Self> {
        config.ensure_directories()?;
        let report = RunReport::new(config.language());
        Ok(Self {
            config,
            model,
            progress,
            report,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn artifact_path(&self, artifact: Artifact) -> PathBuf {
        self.config.cache_dir.join(artifact.file_name())
    }

    /// Read a cached artifact, failing with `MissingArtifact` if no earlier
    /// stage produced it.
    pub fn read_artifact(&self, artifact: Artifact) -> Result<String> {
        let path = self.artifact_path(artifact);
        if !path.exists() {
            return Err(PipelineError::MissingArtifact { path }.into());
        }
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    fn write_artifact(&self, artifact: Artifact, content: &str) -> Result<()> {
        let path = self.artifact_path(artifact);
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    fn global_info(&self) -> Result<Option<String>> {
        if !self.config.toml.build.use_global_file {
            return Ok(None);
        }
        self.read_artifact(Artifact::GlobalInfo).map(Some)
    }

    fn finish_stage(
        &mut self,
        name: &str,
        started_at: chrono::DateTime<Utc>,
        output_chars: usize,
        chunks: Option<usize>,
    ) {
        self.report.record(name, started_at, output_chars, chunks);
        self.progress.stage_done(name);
        info!(stage = name, output_chars, "Stage completed");
    }

    /// Harvest the project into `code_mix.txt`.
    pub fn generate_code_mix(&mut self) -> Result<()> {
        let started_at = Utc::now();
        info!("Starting code mix generation");
        let harvester =
            CodeMix::new(&self.config.project_dir, &self.config.toml.build.ignore_patterns)?;
        let mix = harvester.write_to(&self.artifact_path(Artifact::CodeMix))?;
        self.finish_stage("generate_code_mix", started_at, mix.len(), None);
        Ok(())
    }

    /// Reduce the code mix into `global_info.md`.
    pub async fn generate_global_info(&mut self) -> Result<()> {
        let started_at = Utc::now();
        let build = &self.config.toml.build;
        let code_mix = self.read_artifact(Artifact::CodeMix)?;
        let chunks = Chunker::new(build.global_part_size).split(&code_mix);
        let chunk_count = chunks.len();
        info!(
            chunks = chunk_count,
            branching_factor = build.branching_factor,
            "Starting global summary"
        );

        let reducer =
            HierarchicalReducer::new(build.branching_factor).with_concurrency(build.concurrency);
        let context = self.config.project_settings().prompt();
        let summary = if build.concurrency > 1 {
            reducer
                .reduce_concurrent(chunks, &context, self.model.as_ref(), self.progress.as_ref())
                .await?
        } else {
            reducer
                .reduce(chunks, &context, self.model.as_ref(), self.progress.as_ref())
                .await?
        };

        self.write_artifact(Artifact::GlobalInfo, &summary)?;
        self.finish_stage("generate_global_info", started_at, summary.len(), Some(chunk_count));
        Ok(())
    }

    /// Document the code mix part by part into `output_doc.md`.
    pub async fn generate_doc_parts(&mut self) -> Result<()> {
        let started_at = Utc::now();
        let build = &self.config.toml.build;
        let code_mix = self.read_artifact(Artifact::CodeMix)?;
        let global_info = self.global_info()?;
        let chunks = Chunker::new(build.max_doc_part_size).split(&code_mix);
        let context = self.config.project_settings().prompt();

        let generator =
            DocGenerator::new(self.config.language()).with_concurrency(build.concurrency);
        let document = if build.parallel_parts {
            generator
                .generate_parallel(
                    &chunks,
                    &context,
                    global_info.as_deref(),
                    self.model.as_ref(),
                    self.progress.as_ref(),
                )
                .await
        } else {
            generator
                .generate(
                    &chunks,
                    &context,
                    global_info.as_deref(),
                    self.model.as_ref(),
                    self.progress.as_ref(),
                )
                .await
        }
        .map_err(PipelineError::from)?;

        self.write_artifact(Artifact::OutputDoc, &document)?;
        self.finish_stage("generate_doc_parts", started_at, document.len(), Some(chunks.len()));
        Ok(())
    }

    /// Run `factory` and prepend its output to `output_doc.md`.
    pub async fn factory_generate_doc(&mut self, factory: &DocFactory, stage: &str) -> Result<()> {
        let started_at = Utc::now();
        let document = self.read_artifact(Artifact::OutputDoc)?;
        let info = DocInfo {
            language: self.config.language().to_string(),
            full_data: document,
            code_mix: self.read_artifact(Artifact::CodeMix)?,
            global_info: self.global_info()?,
        };

        let sections = factory
            .generate_doc(&info, self.model.as_ref(), self.progress.as_ref())
            .await
            .map_err(PipelineError::from)?;

        let combined = if sections.is_empty() {
            info.full_data
        } else {
            format!("{}\n\n{}", sections, info.full_data)
        };
        self.write_artifact(Artifact::OutputDoc, &combined)?;
        self.finish_stage(stage, started_at, sections.len(), None);
        Ok(())
    }

    /// Reorder the anchored sections of `output_doc.md`.
    pub async fn order_doc(&mut self) -> Result<()> {
        let started_at = Utc::now();
        let document = self.read_artifact(Artifact::OutputDoc)?;
        let ordered = order_document(&document, self.model.as_ref())
            .await
            .map_err(PipelineError::from)?;
        self.write_artifact(Artifact::OutputDoc, &ordered)?;
        self.finish_stage("order_doc", started_at, ordered.len(), None);
        Ok(())
    }

    /// Remove the run log unless `save_logs` is set.
    pub fn clear_cache(&mut self) -> Result<()> {
        let started_at = Utc::now();
        if !self.config.toml.build.save_logs {
            let path = self.artifact_path(Artifact::Logs);
            if path.exists()
                && let Err(e) = fs::remove_file(&path)
            {
                warn!(path = %path.display(), error = %e, "Failed to remove run log");
            }
        }
        self.finish_stage("clear_cache", started_at, 0, None);
        Ok(())
    }

    /// Modules answering the configured custom descriptions and rewrites.
    pub fn custom_factory(&self) -> DocFactory {
        let structure = &self.config.toml.structure;
        let mut factory = DocFactory::new();
        for description in &structure.custom_descriptions {
            factory.push(Box::new(CustomModule::new(description.clone())));
        }
        for text in &structure.custom_rewrites {
            factory.push(Box::new(CustomRewriteModule::new(text.clone())));
        }
        factory
    }

    /// Navigation and overview modules enabled in the configuration.
    pub fn intro_factory(&self) -> DocFactory {
        let structure = &self.config.toml.structure;
        let mut factory = DocFactory::new();
        if structure.include_intro_links {
            factory.push(Box::new(IntroLinks));
        }
        if structure.include_intro_text {
            factory.push(Box::new(IntroText));
        }
        factory
    }

    /// Run every configured stage and return the final document.
    pub async fn run(&mut self) -> Result<String> {
        info!(
            project = %self.config.project_dir.display(),
            stages = ?planned_stages(&self.config),
            "Starting documentation run"
        );

        self.generate_code_mix()?;
        if self.config.toml.build.use_global_file {
            self.generate_global_info().await?;
        }
        self.generate_doc_parts().await?;

        let custom = self.custom_factory();
        if !custom.is_empty() {
            self.factory_generate_doc(&custom, "custom_sections").await?;
        }
        if self.config.toml.structure.include_order {
            self.order_doc().await?;
        }
        let intro = self.intro_factory();
        if !intro.is_empty() {
            self.factory_generate_doc(&intro, "intro_sections").await?;
        }
        self.clear_cache()?;

        self.report.finish();
        self.report.save(&self.artifact_path(Artifact::Report))?;
        self.read_artifact(Artifact::OutputDoc)
    }
}
