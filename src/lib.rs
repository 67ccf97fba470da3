//! # Harmonist
//!
//! Interactive shell over `harmonist-core`: enter or load a melody,
//! harmonize it, then edit the generated progression with undo and redo
//! before saving the per-note chord labels.
//!
//! ## Modules
//!
//! - `commands`: The command registry, session context and the handlers for
//!   melody input, configuration and progression editing.
//! - `repl`: The line-editor loop and the file watcher that re-harmonizes
//!   a melody file whenever it changes.

pub mod commands;
pub mod repl;

pub use crate::commands::{create_registry, CommandContext, CommandRegistry, CommandResult};
