//! Progression editing commands (change, delete, insert, undo, redo, save, saved, discard, history)

use crate::commands::{CommandContext, CommandResult};
use anyhow::{anyhow, Result};
use colored::*;
use harmonist_core::{ChordQuality, HarmonizedPart, ProgressionEditor};

fn parse_index(s: &str) -> Result<usize> {
    s.parse()
        .map_err(|_| anyhow!("Invalid chord index: {} (see 'show')", s))
}

/// Split `<index> <quality>` arguments
fn parse_index_and_quality(args: &str) -> Result<(usize, ChordQuality)> {
    let (index, quality) = args
        .split_once(char::is_whitespace)
        .ok_or_else(|| anyhow!("Expected <index> <quality>"))?;
    Ok((parse_index(index)?, quality.trim().parse()?))
}

/// Run an edit against the session's editor and print the resulting part
fn edit<F>(ctx: &mut CommandContext, op: F) -> CommandResult
where
    F: FnOnce(&mut ProgressionEditor) -> Result<String>,
{
    let result = ctx.editor_mut().and_then(op);
    match result {
        Ok(out) => CommandResult::Message(out),
        Err(e) => CommandResult::from_error(e),
    }
}

fn summary(part: &HarmonizedPart) -> String {
    part.labels_for(part.progression()).join(" ")
}

/// Handle `change <i> <quality>` command
pub fn cmd_change(args: &str, ctx: &mut CommandContext) -> CommandResult {
    edit(ctx, |editor| {
        let (index, quality) = parse_index_and_quality(args)?;
        Ok(summary(editor.change(index, quality)?))
    })
}

/// Handle `delete <i>` command
pub fn cmd_delete(args: &str, ctx: &mut CommandContext) -> CommandResult {
    edit(ctx, |editor| {
        let index = parse_index(args)?;
        Ok(summary(editor.delete(index)?))
    })
}

/// Handle `insert before <i> <quality>` command
pub fn cmd_insert_before(args: &str, ctx: &mut CommandContext) -> CommandResult {
    edit(ctx, |editor| {
        let (index, quality) = parse_index_and_quality(args)?;
        Ok(summary(editor.insert_before(index, quality)?))
    })
}

/// Handle `insert after <i> <quality>` command
pub fn cmd_insert_after(args: &str, ctx: &mut CommandContext) -> CommandResult {
    edit(ctx, |editor| {
        let (index, quality) = parse_index_and_quality(args)?;
        Ok(summary(editor.insert_after(index, quality)?))
    })
}

/// Handle `undo` command
pub fn cmd_undo(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    edit(ctx, |editor| {
        editor
            .undo()
            .map(summary)
            .ok_or_else(|| anyhow!("Nothing to undo"))
    })
}

/// Handle `redo` command
pub fn cmd_redo(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    edit(ctx, |editor| {
        editor
            .redo()
            .map(summary)
            .ok_or_else(|| anyhow!("Nothing to redo"))
    })
}

/// Handle `save` command
pub fn cmd_save(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let saved = match ctx.editor_mut().and_then(|editor| Ok(editor.save()?)) {
        Ok(saved) => saved,
        Err(e) => return CommandResult::from_error(e),
    };
    let out = format!(
        "{} {}",
        "✓ Saved:".bright_green(),
        saved.chord_labels.labels().join(" ")
    );
    ctx.saved = Some(saved);
    CommandResult::Message(out)
}

/// Handle `saved` command
pub fn cmd_saved(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    match &ctx.saved {
        Some(part) => CommandResult::Message(part.to_string()),
        None => CommandResult::Error("Nothing saved yet. Use 'save' after editing".to_string()),
    }
}

/// Handle `discard` command
pub fn cmd_discard(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    edit(ctx, |editor| Ok(summary(editor.discard())))
}

/// Handle `history` command
pub fn cmd_history(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let editor = match ctx.editor() {
        Ok(editor) => editor,
        Err(e) => return CommandResult::from_error(e),
    };
    let history = editor.history();
    let lines: Vec<String> = history
        .iter()
        .enumerate()
        .map(|(i, snapshot)| {
            let marker = if i == history.cursor() { "▶" } else { " " };
            format!(
                "{} {:>2}  {}  {}",
                marker.bright_cyan(),
                i,
                snapshot.timestamp.format("%H:%M:%S").to_string().bright_black(),
                snapshot.chord_labels.join(" ")
            )
        })
        .collect();
    CommandResult::Message(lines.join("\n"))
}
