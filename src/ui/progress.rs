use crate::ui::icons::{CHECK, CROSS, SPARKLE};
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Progress sink threaded through the pipeline stages.
///
/// A stage opens a subtask with a known number of steps, advances it once per
/// model call, and closes it when done. Implementations must tolerate
/// `advance` being called from concurrent fan-out tasks.
pub trait Progress: Send + Sync {
    /// Open a subtask of `total` steps, replacing any open one.
    fn start_subtask(&self, name: &str, total: u64);

    /// Advance the open subtask by one step.
    fn advance(&self);

    /// Close the open subtask.
    fn finish_subtask(&self);

    /// Mark one top-level pipeline stage as done.
    fn stage_done(&self, _name: &str) {}
}

/// Progress sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn start_subtask(&self, _name: &str, _total: u64) {}
    fn advance(&self) {}
    fn finish_subtask(&self) {}
}

/// Terminal progress for the pipeline, rendered via `indicatif` progress bars.
///
/// Two bars are stacked vertically:
/// - Stage bar: tracks how many pipeline stages have completed
/// - Subtask bar: steps of the running stage (one per model call)
pub struct ConsoleProgress {
    multi: MultiProgress,
    stage_bar: ProgressBar,
    subtask_bar: Mutex<Option<ProgressBar>>,
    verbose: bool,
}

impl ConsoleProgress {
    /// Create the UI with a stage bar sized for `total_stages`.
    pub fn new(total_stages: u64, verbose: bool) -> Self {
        let multi = MultiProgress::new();

        let stage_style = ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("progress bar template is a valid static string")
            .progress_chars("█▓▒░");

        let stage_bar = multi.add(ProgressBar::new(total_stages));
        stage_bar.set_style(stage_style);
        stage_bar.set_prefix("Stages");

        Self {
            multi,
            stage_bar,
            subtask_bar: Mutex::new(None),
            verbose,
        }
    }

    /// Print a line via `MultiProgress`, falling back to `eprintln!` if the rich UI fails.
    fn print_line(&self, msg: impl AsRef<str>) {
        if self.multi.println(msg.as_ref()).is_err() {
            eprintln!("{}", msg.as_ref());
        }
    }

    /// Finish the stage bar with a success line.
    pub fn finish(&self, message: &str) {
        self.stage_bar.finish_and_clear();
        self.print_line(format!("{} {}", SPARKLE, style(message).green().bold()));
    }

    /// Finish the stage bar with an error line.
    pub fn fail(&self, message: &str) {
        self.stage_bar.abandon();
        self.print_line(format!("{} {}", CROSS, style(message).red().bold()));
    }
}

impl Progress for ConsoleProgress {
    fn start_subtask(&self, name: &str, total: u64) {
        let subtask_style = ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} {spinner} [{bar:30.green/white}] {pos}/{len} {msg}")
            .expect("progress bar template is a valid static string");

        let bar = self.multi.add(ProgressBar::new(total));
        bar.set_style(subtask_style);
        bar.set_prefix("  Task");
        bar.set_message(name.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        let mut slot = self.subtask_bar.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = slot.replace(bar) {
            previous.finish_and_clear();
        }
        self.stage_bar.set_message(style(name).yellow().to_string());
    }

    fn advance(&self) {
        let slot = self.subtask_bar.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(bar) = slot.as_ref() {
            bar.inc(1);
        }
    }

    fn finish_subtask(&self) {
        let mut slot = self.subtask_bar.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(bar) = slot.take() {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }
    }

    fn stage_done(&self, name: &str) {
        self.stage_bar.inc(1);
        if self.verbose {
            self.print_line(format!("    {} {}", CHECK, style(name).dim()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_progress_is_inert() {
        let progress = NoProgress;
        progress.start_subtask("x", 3);
        progress.advance();
        progress.finish_subtask();
        progress.stage_done("x");
    }

    #[test]
    fn test_console_progress_subtask_lifecycle() {
        let progress = ConsoleProgress::new(2, false);
        progress.start_subtask("Reduce", 2);
        progress.advance();
        progress.advance();
        progress.finish_subtask();
        progress.stage_done("Reduce");
        assert_eq!(progress.stage_bar.position(), 1);
        assert!(progress.subtask_bar.lock().unwrap().is_none());
    }

    #[test]
    fn test_console_progress_replaces_open_subtask() {
        let progress = ConsoleProgress::new(1, true);
        progress.start_subtask("first", 5);
        progress.start_subtask("second", 1);
        let slot = progress.subtask_bar.lock().unwrap();
        assert_eq!(slot.as_ref().unwrap().length(), Some(1));
    }
}
