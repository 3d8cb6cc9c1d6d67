//! Progress indicators for metadata resolution.
//!
//! Bars are hidden when the `PLUGIN_DEPS_NO_PROGRESS` environment variable is
//! set, when the caller asks for them to be hidden (`--no-progress`, `--quiet`),
//! or when stderr is not a terminal (indicatif draws nothing then).

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};

use crate::constants::NO_PROGRESS_ENV;

/// Whether progress output is disabled through the environment.
pub fn is_progress_disabled() -> bool {
    std::env::var_os(NO_PROGRESS_ENV).is_some()
}

/// A progress bar counting resolved identifiers.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Bar over `len` steps, hidden when `hidden` is set or progress is disabled.
    pub fn new(len: u64, hidden: bool) -> Self {
        let inner = if hidden || is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new(len);
            if let Ok(style) =
                ProgressStyle::default_bar().template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                bar.set_style(style.progress_chars("━╸━"));
            }
            bar
        };
        Self {
            inner,
        }
    }

    /// Set the bold prefix shown before the bar.
    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.inner.set_prefix(prefix.into());
    }

    /// Set the trailing message.
    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    /// Advance by `delta` steps.
    pub fn inc(&self, delta: u64) {
        self.inner.inc(delta);
    }

    /// Current position.
    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    /// Remove the bar from the terminal.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }

    /// Whether the bar draws nothing.
    pub fn is_hidden(&self) -> bool {
        self.inner.is_hidden()
    }
}
