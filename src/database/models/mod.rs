//! Database module exports.

pub mod settings;

pub use settings::{MediaPreference, RenameMode, UserSettings};
