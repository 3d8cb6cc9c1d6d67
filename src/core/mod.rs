//! Core types for plugin-deps
//!
//! - [`error`] - [`PluginDepsError`], [`ErrorContext`] and [`user_friendly_error`]
//! - [`unit`] - The [`Unit`] data model supplied by the host

pub mod error;
pub mod unit;

pub use error::{ErrorContext, PluginDepsError, user_friendly_error};
pub use unit::{Unit, slug_from_id};
