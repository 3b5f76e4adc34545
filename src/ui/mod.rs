//! User interface components for terminal interaction.
//!
//! # Modules
//!
//! - [`display`]: Banner, file and findings tables, outcome messages
//! - [`progress`]: Upload progress bar
//! - [`prompt`]: Interactive selection, message and password dialogs

pub mod display;
pub mod progress;
pub mod prompt;
