//! Hierarchical reducer: collapse many chunks into one global summary.
//!
//! Each level groups the current items into runs of `branching_factor`,
//! summarizes every group with one model call, and uses the summaries as the
//! next level's items. The loop stops when a single item remains.
//!
//! ```text
//! level 0: c0 c1 c2 c3 | c4 c5 c6 c7 | c8 c9 c10 c11     (3 calls)
//! level 1:      s0     |      s1     |       s2          (1 call)
//! level 2:                  summary
//! ```
//!
//! The concurrent variant issues the calls of one level in parallel, bounded
//! by a semaphore. Grouping and merging stay sequential, and level N+1 only
//! starts once every call of level N has resolved.

use std::ops::Range;

use futures::future::try_join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::errors::{ModelError, PipelineError};
use crate::model::{LanguageModel, Message};
use crate::prompts::build_compress_prompt;
use crate::ui::Progress;
use crate::util::char_len;

/// Default number of items merged into one summary per level.
pub const DEFAULT_BRANCHING_FACTOR: usize = 4;

/// Default number of in-flight model calls in the concurrent variant.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Smallest branching factor that still shrinks every level.
pub const MIN_BRANCHING_FACTOR: usize = 2;

/// Reduces an ordered list of chunks to a single summary.
#[derive(Debug, Clone)]
pub struct HierarchicalReducer {
    branching_factor: usize,
    concurrency: usize,
}

impl Default for HierarchicalReducer {
    fn default() -> Self {
        Self::new(DEFAULT_BRANCHING_FACTOR)
    }
}

impl HierarchicalReducer {
    pub fn new(branching_factor: usize) -> Self {
        Self {
            branching_factor,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Branching factor actually applied to each level.
    pub fn effective_factor(&self) -> usize {
        self.branching_factor.max(MIN_BRANCHING_FACTOR)
    }

    /// Compression ratio requested in the prompt for a level of `items`.
    ///
    /// The last level (one that fits into a single group) asks for half its
    /// input instead of `1 / factor`, so the final summary keeps more detail.
    pub fn prompt_factor(&self, items: usize) -> usize {
        let factor = self.effective_factor();
        if items <= factor { MIN_BRANCHING_FACTOR } else { factor }
    }

    /// Reduce sequentially, one model call at a time.
    pub async fn reduce(
        &self,
        chunks: Vec<String>,
        project_context: &str,
        model: &dyn LanguageModel,
        progress: &dyn Progress,
    ) -> Result<String, PipelineError> {
        let factor = self.effective_factor();
        let mut level = chunks;
        let mut depth = 0usize;

        while level.len() > 1 {
            let groups = group_ranges(level.len(), factor);
            let target_factor = self.prompt_factor(level.len());
            info!(depth, items = level.len(), groups = groups.len(), "Reducing level");
            progress.start_subtask(&format!("Compress level {}", depth + 1), groups.len() as u64);

            let mut next = Vec::with_capacity(groups.len());
            for range in groups {
                let summary =
                    compress_group(&level[range], project_context, target_factor, model).await?;
                next.push(summary);
                progress.advance();
            }

            progress.finish_subtask();
            level = next;
            depth += 1;
        }

        level.into_iter().next().ok_or(PipelineError::EmptyInput)
    }

    /// Reduce with the calls of each level running concurrently.
    pub async fn reduce_concurrent(
        &self,
        chunks: Vec<String>,
        project_context: &str,
        model: &dyn LanguageModel,
        progress: &dyn Progress,
    ) -> Result<String, PipelineError> {
        let factor = self.effective_factor();
        let semaphore = Semaphore::new(self.concurrency);
        let mut level = chunks;
        let mut depth = 0usize;

        while level.len() > 1 {
            let groups = group_ranges(level.len(), factor);
            let target_factor = self.prompt_factor(level.len());
            info!(
                depth,
                items = level.len(),
                groups = groups.len(),
                concurrency = self.concurrency,
                "Reducing level concurrently"
            );
            progress.start_subtask(&format!("Compress level {}", depth + 1), groups.len() as u64);

            let calls = groups.into_iter().map(|range| {
                let group = &level[range];
                let semaphore = &semaphore;
                async move {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .expect("reducer semaphore is never closed");
                    let summary =
                        compress_group(group, project_context, target_factor, model).await;
                    progress.advance();
                    summary
                }
            });
            let next = try_join_all(calls).await?;

            progress.finish_subtask();
            level = next;
            depth += 1;
        }

        level.into_iter().next().ok_or(PipelineError::EmptyInput)
    }
}

/// Split `len` items into consecutive runs of `factor` (the last may be shorter).
pub fn group_ranges(len: usize, factor: usize) -> Vec<Range<usize>> {
    let factor = factor.max(1);
    (0..len)
        .step_by(factor)
        .map(|start| start..(start + factor).min(len))
        .collect()
}

/// Summarize one group with a single model call, asking for about
/// `1 / target_factor` of its length.
async fn compress_group(
    group: &[String],
    project_context: &str,
    target_factor: usize,
    model: &dyn LanguageModel,
) -> Result<String, ModelError> {
    let data = group.join("\n");
    let input_chars = char_len(&data);
    debug!(items = group.len(), input_chars, "Compressing group");

    let messages = [
        Message::system(project_context),
        Message::system(build_compress_prompt(input_chars, target_factor)),
        Message::user(data),
    ];
    model.answer(&messages).await
}
