use async_trait::async_trait;

use super::{DocInfo, DocModule};
use crate::chunk::Chunker;
use crate::errors::ModelError;
use crate::model::LanguageModel;
use crate::postprocess::{
    custom_description, custom_rewrite, extract_html_links, intro_text, links_intro,
};

/// Chunk size used when searching the code mix for a custom description.
pub const CUSTOM_CONTEXT_CHARS: usize = 7000;

/// Navigation tree over the document's anchors.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntroLinks;

#[async_trait]
impl DocModule for IntroLinks {
    fn name(&self) -> &str {
        "intro_links"
    }

    async fn generate(
        &self,
        info: &DocInfo,
        model: &dyn LanguageModel,
    ) -> Result<String, ModelError> {
        let links = extract_html_links(&info.full_data);
        if links.is_empty() {
            return Ok(String::new());
        }
        links_intro(&links, model, &info.language).await
    }
}

/// Project overview. Written from the global summary, or from the document
/// itself when no summary was produced.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntroText;

#[async_trait]
impl DocModule for IntroText {
    fn name(&self) -> &str {
        "intro_text"
    }

    async fn generate(
        &self,
        info: &DocInfo,
        model: &dyn LanguageModel,
    ) -> Result<String, ModelError> {
        let source = info.global_info.as_deref().unwrap_or(&info.full_data);
        intro_text(source, model, &info.language).await
    }
}

/// Section answering a user question from the code mix.
#[derive(Debug, Clone)]
pub struct CustomModule {
    description: String,
    max_symbols: usize,
}

impl CustomModule {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            max_symbols: CUSTOM_CONTEXT_CHARS,
        }
    }

    pub fn with_max_symbols(mut self, max_symbols: usize) -> Self {
        self.max_symbols = max_symbols;
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

#[async_trait]
impl DocModule for CustomModule {
    fn name(&self) -> &str {
        "custom_description"
    }

    async fn generate(
        &self,
        info: &DocInfo,
        model: &dyn LanguageModel,
    ) -> Result<String, ModelError> {
        let chunks = Chunker::new(self.max_symbols).split(&info.code_mix);
        custom_description(&chunks, model, &self.description, &info.language).await
    }
}

/// Section rewritten from user text alone.
#[derive(Debug, Clone)]
pub struct CustomRewriteModule {
    description: String,
}

impl CustomRewriteModule {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

#[async_trait]
impl DocModule for CustomRewriteModule {
    fn name(&self) -> &str {
        "custom_rewrite"
    }

    async fn generate(
        &self,
        info: &DocInfo,
        model: &dyn LanguageModel,
    ) -> Result<String, ModelError> {
        custom_rewrite(model, &self.description, &info.language).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::mock::ScriptedModel;

    fn info() -> DocInfo {
        DocInfo {
            language: "en".into(),
            full_data: "<a name=\"setup-guide\"></a>\nSetup".into(),
            code_mix: "<file path=\"a.rs\">\nfn main() {}\n</file>".into(),
            global_info: None,
        }
    }

    #[tokio::test]
    async fn test_intro_links_without_anchors_skips_model() {
        let model = ScriptedModel::failing();
        let info = DocInfo {
            full_data: "no anchors".into(),
            ..info()
        };
        assert_eq!(IntroLinks.generate(&info, &model).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_intro_links_uses_document_anchors() {
        let model = ScriptedModel::echo();
        let out = IntroLinks.generate(&info(), &model).await.unwrap();
        assert_eq!(out, "[0] #setup-guide");
    }

    #[tokio::test]
    async fn test_intro_text_falls_back_to_document() {
        let model = ScriptedModel::echo();
        let out = IntroText.generate(&info(), &model).await.unwrap();
        assert!(out.contains("Setup"));

        let with_summary = DocInfo {
            global_info: Some("GLOBAL".into()),
            ..info()
        };
        let out = IntroText.generate(&with_summary, &model).await.unwrap();
        assert!(out.ends_with("GLOBAL"));
    }

    #[tokio::test]
    async fn test_custom_module_searches_code_mix() {
        let model = ScriptedModel::fixed("<a name=\"entry-point\"></a>main");
        let module = CustomModule::new("what is the entry point");
        assert_eq!(module.description(), "what is the entry point");

        let out = module.generate(&info(), &model).await.unwrap();
        assert!(out.contains("main"));
        assert!(model.calls()[0][2].content.contains("fn main()"));
    }

    #[tokio::test]
    async fn test_custom_rewrite_module() {
        let model = ScriptedModel::echo();
        let out = CustomRewriteModule::new("MIT license")
            .generate(&info(), &model)
            .await
            .unwrap();
        assert!(out.ends_with("MIT license"));
    }
}
