//! Documentation generation for chunked code.
//!
//! The sequential generator walks the chunks in order and writes one
//! documentation fragment per chunk. Every request after the first carries
//! the tail of the previous fragment so consecutive parts read as one text.
//!
//! The fan-out variant drops that continuity: each chunk is documented
//! independently, at most `concurrency` requests at a time, and the
//! fragments are joined back in chunk order.

use futures::future::try_join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::errors::ModelError;
use crate::model::{LanguageModel, Message};
use crate::prompts::{PART_DOC_PROMPT, build_language_prompt, build_previous_part_prompt};
use crate::reduce::DEFAULT_CONCURRENCY;
use crate::ui::Progress;
use crate::util::{char_len, strip_code_fence, tail_chars};

/// Number of trailing chars of the previous fragment carried forward.
pub const ROLLING_CONTEXT_CHARS: usize = 3000;

/// Separator appended after every fragment in the assembled document.
pub const FRAGMENT_SEPARATOR: &str = "\n\n";

/// Tail of the previously generated fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollingContext(String);

impl RollingContext {
    /// Keep the last [`ROLLING_CONTEXT_CHARS`] chars of a cleaned fragment.
    pub fn from_fragment(fragment: &str) -> Self {
        Self(tail_chars(fragment, ROLLING_CONTEXT_CHARS).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Writes documentation fragments for a sequence of chunks.
#[derive(Debug, Clone)]
pub struct DocGenerator {
    language: String,
    concurrency: usize,
}

impl DocGenerator {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Build the request for one chunk.
    ///
    /// Message order: language, part instruction, project context, global
    /// summary, previous fragment tail, then the chunk itself as the user turn.
    /// Empty context strings are left out.
    pub fn part_messages(
        &self,
        chunk: &str,
        project_context: &str,
        global_summary: Option<&str>,
        previous: Option<&RollingContext>,
    ) -> Vec<Message> {
        let mut messages = vec![
            Message::system(build_language_prompt(&self.language)),
            Message::system(PART_DOC_PROMPT),
        ];
        if !project_context.is_empty() {
            messages.push(Message::system(project_context));
        }
        if let Some(summary) = global_summary.filter(|s| !s.is_empty()) {
            messages.push(Message::system(summary));
        }
        if let Some(previous) = previous {
            messages.push(Message::system(build_previous_part_prompt(previous.as_str())));
        }
        messages.push(Message::user(chunk));
        messages
    }

    /// Document a single chunk and return the fence-stripped fragment.
    pub async fn write_part(
        &self,
        chunk: &str,
        project_context: &str,
        global_summary: Option<&str>,
        previous: Option<&RollingContext>,
        model: &dyn LanguageModel,
    ) -> Result<String, ModelError> {
        let messages = self.part_messages(chunk, project_context, global_summary, previous);
        let answer = model.answer(&messages).await?;
        Ok(strip_code_fence(&answer).to_string())
    }

    /// Generate the document sequentially, carrying a rolling context.
    ///
    /// A failure on any chunk aborts the run; no partial document is returned.
    pub async fn generate(
        &self,
        chunks: &[String],
        project_context: &str,
        global_summary: Option<&str>,
        model: &dyn LanguageModel,
        progress: &dyn Progress,
    ) -> Result<String, ModelError> {
        info!(parts = chunks.len(), language = %self.language, "Generating documentation parts");
        progress.start_subtask("Generate doc parts", chunks.len() as u64);

        let mut document = String::new();
        let mut context: Option<RollingContext> = None;

        for (index, chunk) in chunks.iter().enumerate() {
            let fragment = self
                .write_part(chunk, project_context, global_summary, context.as_ref(), model)
                .await?;
            debug!(part = index, chars = char_len(&fragment), "Part documented");

            document.push_str(&fragment);
            document.push_str(FRAGMENT_SEPARATOR);
            context = Some(RollingContext::from_fragment(&fragment));
            progress.advance();
        }

        progress.finish_subtask();
        Ok(document)
    }

    /// Generate one fragment per chunk concurrently, without rolling context.
    pub async fn generate_parallel(
        &self,
        chunks: &[String],
        project_context: &str,
        global_summary: Option<&str>,
        model: &dyn LanguageModel,
        progress: &dyn Progress,
    ) -> Result<String, ModelError> {
        info!(
            parts = chunks.len(),
            concurrency = self.concurrency,
            "Generating documentation parts concurrently"
        );
        progress.start_subtask("Generate doc parts (parallel)", chunks.len() as u64);

        let semaphore = Semaphore::new(self.concurrency);
        let calls = chunks.iter().map(|chunk| {
            let semaphore = &semaphore;
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .expect("generator semaphore is never closed");
                let fragment = self
                    .write_part(chunk, project_context, global_summary, None, model)
                    .await;
                progress.advance();
                fragment
            }
        });
        let fragments = try_join_all(calls).await?;

        progress.finish_subtask();
        Ok(fragments
            .iter()
            .map(|fragment| format!("{}{}", fragment, FRAGMENT_SEPARATOR))
            .collect())
    }
}
