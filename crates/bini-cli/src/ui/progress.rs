//! Progress bar for `bini create`.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

/// Progress over the files written while scaffolding a project.
pub struct ScaffoldProgress {
    bar: ProgressBar,
}

impl ScaffoldProgress {
    /// Create a bar for `total` files.
    pub fn new(total: u64) -> Self {
        let bar = if Self::should_show() {
            ProgressBar::new(total)
        } else {
            ProgressBar::hidden()
        };
        let style = ProgressStyle::default_bar()
            .template("{prefix:.bold} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        bar.set_prefix("Creating");

        Self { bar }
    }

    /// Record one written file.
    pub fn file_written(&self, relative: &str) {
        self.bar.set_message(relative.dimmed().to_string());
        self.bar.inc(1);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Complete the bar and clear it.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Progress bars are shown only on an attended terminal outside CI.
    pub fn should_show() -> bool {
        console::user_attended_stderr() && !super::is_ci()
    }
}

impl Drop for ScaffoldProgress {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
