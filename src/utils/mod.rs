//! Filesystem and terminal helpers.
//!
//! - [`fs`] - Atomic writes and directory creation
//! - [`progress`] - Progress bars for metadata resolution

pub mod fs;
pub mod progress;

pub use fs::{atomic_write, ensure_dir};
pub use progress::{ProgressBar, is_progress_disabled};
