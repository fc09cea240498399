//! Document factory: extra sections composed around the generated docs.
//!
//! A [`DocFactory`] runs a list of [`DocModule`]s in order against the same
//! [`DocInfo`] snapshot. Each module produces one markdown block; the blocks
//! are joined with blank lines and the caller prepends them to the document.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::errors::ModelError;
use crate::model::LanguageModel;
use crate::ui::Progress;

pub mod modules;

pub use modules::{CustomModule, CustomRewriteModule, IntroLinks, IntroText};

/// Separator between module outputs.
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Snapshot of pipeline artifacts a module can draw from.
#[derive(Debug, Clone, Default)]
pub struct DocInfo {
    pub language: String,
    /// Current state of the generated document.
    pub full_data: String,
    /// Raw harvested repository text.
    pub code_mix: String,
    /// Global summary, when one was produced.
    pub global_info: Option<String>,
}

/// One generator of an extra document section.
#[async_trait]
pub trait DocModule: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn generate(
        &self,
        info: &DocInfo,
        model: &dyn LanguageModel,
    ) -> Result<String, ModelError>;
}

/// Ordered list of modules run as one stage.
#[derive(Default)]
pub struct DocFactory {
    modules: Vec<Box<dyn DocModule>>,
}

impl DocFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, module: impl DocModule + 'static) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    pub fn push(&mut self, module: Box<dyn DocModule>) {
        self.modules.push(module);
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    /// Run every module in order and join the non-empty outputs.
    pub async fn generate_doc(
        &self,
        info: &DocInfo,
        model: &dyn LanguageModel,
        progress: &dyn Progress,
    ) -> Result<String, ModelError> {
        info!(
            modules = ?self.names(),
            doc_chars = info.full_data.len(),
            code_mix_chars = info.code_mix.len(),
            "Running document factory"
        );
        progress.start_subtask("Generate extra sections", self.modules.len() as u64);

        let mut blocks = Vec::with_capacity(self.modules.len());
        for module in &self.modules {
            let block = module.generate(info, model).await?;
            if block.trim().is_empty() {
                debug!(module = module.name(), "Module produced nothing");
            } else {
                blocks.push(block);
            }
            progress.advance();
        }

        progress.finish_subtask();
        Ok(blocks.join(BLOCK_SEPARATOR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mock::ScriptedModel;
    use crate::ui::NoProgress;

    struct Fixed(&'static str);

    #[async_trait]
    impl DocModule for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate(
            &self,
            _info: &DocInfo,
            _model: &dyn LanguageModel,
        ) -> Result<String, ModelError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_factory_joins_in_order_and_skips_empty() {
        let factory = DocFactory::new()
            .with_module(Fixed("first"))
            .with_module(Fixed("  "))
            .with_module(Fixed("second"));
        assert_eq!(factory.len(), 3);

        let model = ScriptedModel::failing();
        let out = factory
            .generate_doc(&DocInfo::default(), &model, &NoProgress)
            .await
            .unwrap();
        assert_eq!(out, "first\n\nsecond");
    }

    #[tokio::test]
    async fn test_empty_factory_produces_nothing() {
        let factory = DocFactory::new();
        assert!(factory.is_empty());
        let out = factory
            .generate_doc(&DocInfo::default(), &ScriptedModel::failing(), &NoProgress)
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_module_failure_aborts() {
        let factory = DocFactory::new().with_module(IntroText);
        let info = DocInfo {
            global_info: Some("summary".into()),
            ..Default::default()
        };
        let result = factory
            .generate_doc(&info, &ScriptedModel::failing(), &NoProgress)
            .await;
        assert!(result.is_err());
    }
}
