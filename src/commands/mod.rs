//! Command registry for REPL commands
//!
//! Provides a clean, extensible pattern for handling REPL commands.

pub mod edit;
pub mod general;
pub mod harmonize;

use anyhow::{anyhow, Context, Result};
use harmonist_core::{
    harmonize as run_pipeline, parse_melody, Beats, HarmonizedPart, HarmonyParams, Melody,
    ProgressionEditor,
};
use std::path::Path;
use tracing::debug;

/// Result of executing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Command executed successfully, continue REPL
    Success,
    /// Command executed, show this message
    Message(String),
    /// Exit the REPL
    Exit,
    /// Input did not match any registered command
    NotACommand,
    /// Error occurred
    Error(String),
    /// Watch a file for changes
    Watch(String),
}

impl CommandResult {
    /// Report an error with its full context chain
    pub fn from_error(err: anyhow::Error) -> Self {
        CommandResult::Error(format!("{:#}", err))
    }
}

/// Session state shared by command handlers
#[derive(Debug, Default)]
pub struct CommandContext {
    /// Melody and rhythm awaiting (or used by) the last harmonization
    pub melody: Option<(Melody, Vec<Beats>)>,
    pub params: HarmonyParams,
    /// Editing session over the last harmonized part
    pub editor: Option<ProgressionEditor>,
    /// Part returned by the most recent save
    pub saved: Option<HarmonizedPart>,
}

impl CommandContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the session melody; any editing session over the old one ends
    pub fn set_melody(&mut self, notation: &str) -> Result<usize> {
        let (melody, rhythm) = parse_melody(notation)?;
        let len = melody.len();
        self.melody = Some((melody, rhythm));
        self.editor = None;
        self.saved = None;
        debug!(positions = len, "melody set");
        Ok(len)
    }

    /// Read melody notation from a file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        self.set_melody(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Run the pipeline on the session melody and open an editing session
    pub fn harmonize(&mut self) -> Result<&HarmonizedPart> {
        let (melody, rhythm) = self
            .melody
            .as_ref()
            .ok_or_else(|| anyhow!("No melody set. Use 'melody <notes>' or 'load <file>'"))?;
        let part = run_pipeline(melody, rhythm, &self.params)?;
        let editor = self.editor.insert(ProgressionEditor::new(part));
        Ok(editor.current())
    }

    /// Reload a watched file and re-harmonize it
    pub fn reload(&mut self, path: impl AsRef<Path>) -> Result<&HarmonizedPart> {
        self.load_file(path)?;
        self.harmonize()
    }

    pub fn editor(&self) -> Result<&ProgressionEditor> {
        self.editor
            .as_ref()
            .ok_or_else(|| anyhow!("Nothing to edit. Run 'harmonize' first"))
    }

    pub fn editor_mut(&mut self) -> Result<&mut ProgressionEditor> {
        self.editor
            .as_mut()
            .ok_or_else(|| anyhow!("Nothing to edit. Run 'harmonize' first"))
    }
}

/// A command handler function
pub type CommandHandler = fn(&str, &mut CommandContext) -> CommandResult;

/// Registry of available commands
pub struct CommandRegistry {
    /// Commands indexed by their prefix (e.g., "insert before")
    /// Sorted by prefix length descending for longest-match-first lookup
    commands: Vec<(String, CommandHandler)>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Register a command with its prefix
    pub fn register(&mut self, prefix: &str, handler: CommandHandler) {
        self.commands.push((prefix.to_string(), handler));
        // Sort by prefix length descending for longest-match-first
        self.commands.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    /// Execute a command, returning NotACommand if no match found
    pub fn execute(&self, input: &str, ctx: &mut CommandContext) -> CommandResult {
        let input = input.trim();
        for (prefix, handler) in &self.commands {
            if input == prefix || input.starts_with(&format!("{} ", prefix)) {
                let args = input[prefix.len()..].trim();
                return handler(args, ctx);
            }
        }
        CommandResult::NotACommand
    }

    /// Get all registered command prefixes
    pub fn list_commands(&self) -> Vec<&str> {
        self.commands.iter().map(|(p, _)| p.as_str()).collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a fully populated command registry with all built-in commands
pub fn create_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    // Melody and pipeline
    registry.register("melody", harmonize::cmd_melody);
    registry.register("load", harmonize::cmd_load);
    registry.register("harmonize", harmonize::cmd_harmonize);
    registry.register("show", harmonize::cmd_show);
    registry.register("analysis", harmonize::cmd_analysis);
    registry.register("parts", harmonize::cmd_parts);

    // Editing
    registry.register("change", edit::cmd_change);
    registry.register("delete", edit::cmd_delete);
    registry.register("insert before", edit::cmd_insert_before);
    registry.register("insert after", edit::cmd_insert_after);
    registry.register("undo", edit::cmd_undo);
    registry.register("redo", edit::cmd_redo);
    registry.register("save", edit::cmd_save);
    registry.register("saved", edit::cmd_saved);
    registry.register("discard", edit::cmd_discard);
    registry.register("history", edit::cmd_history);

    // General commands
    registry.register("set", general::cmd_set);
    registry.register("params", general::cmd_params);
    registry.register("qualities", general::cmd_qualities);
    registry.register("help", general::cmd_help);
    registry.register("quit", general::cmd_quit);
    registry.register("exit", general::cmd_quit);
    registry.register("watch", general::cmd_watch);

    registry
}
