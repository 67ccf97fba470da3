//! Melody input and pipeline commands (melody, load, harmonize, show, analysis, parts)

use crate::commands::{CommandContext, CommandResult};
use colored::*;
use harmonist_core::harmony::EditorState;
use harmonist_core::parser::format_melody;
use harmonist_core::HarmonizedPart;

/// Handle `melody <notation>` command
pub fn cmd_melody(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return match &ctx.melody {
            Some((melody, rhythm)) => CommandResult::Message(format_melody(melody, rhythm)),
            None => CommandResult::Error("Usage: melody <notes>".to_string()),
        };
    }
    match ctx.set_melody(args) {
        Ok(len) => CommandResult::Message(
            format!("🎵 Melody set ({} positions)", len)
                .bright_green()
                .to_string(),
        ),
        Err(e) => CommandResult::from_error(e),
    }
}

/// Handle `load <file>` command
pub fn cmd_load(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: load <file>".to_string());
    }
    match ctx.load_file(args) {
        Ok(len) => CommandResult::Message(
            format!("🎵 Loaded {} ({} positions)", args, len)
                .bright_green()
                .to_string(),
        ),
        Err(e) => CommandResult::from_error(e),
    }
}

/// Handle `harmonize` command
pub fn cmd_harmonize(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    match ctx.harmonize() {
        Ok(part) => CommandResult::Message(part.to_string()),
        Err(e) => CommandResult::from_error(e),
    }
}

/// Handle `show` command
pub fn cmd_show(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let editor = match ctx.editor() {
        Ok(editor) => editor,
        Err(e) => return CommandResult::from_error(e),
    };
    let state = match editor.state() {
        EditorState::Clean => "clean".bright_black(),
        EditorState::Dirty => "modified".yellow(),
    };
    CommandResult::Message(format!("{}\n{}", editor.current(), state))
}

/// Handle `analysis` command
pub fn cmd_analysis(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    match ctx.editor() {
        Ok(editor) => CommandResult::Message(format_analysis(editor.current())),
        Err(e) => CommandResult::from_error(e),
    }
}

/// Handle `parts` command
pub fn cmd_parts(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    let editor = match ctx.editor() {
        Ok(editor) => editor,
        Err(e) => return CommandResult::from_error(e),
    };
    let parts = editor.current().to_playback_parts();
    let lines: Vec<String> = parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let name = if i == 0 {
                "melody".to_string()
            } else {
                format!("voice {}", i - 1)
            };
            format!(
                "{:<8} {}",
                name.green(),
                format_melody(&part.melody, &part.rhythm)
            )
        })
        .collect();
    CommandResult::Message(lines.join("\n"))
}

fn format_analysis(part: &HarmonizedPart) -> String {
    let key = part.key();
    let mut out = format!(
        "{} {}  {} {:.2}\n",
        "Key:".bright_black(),
        part.key_name().cyan().bold(),
        "confidence".bright_black(),
        key.confidence
    );
    let labels = part.labels_for(part.progression());
    for (i, (label, numeral)) in labels.iter().zip(part.roman_numerals()).enumerate() {
        out.push_str(&format!(
            "  {:>3}  {:<10} {}\n",
            i.to_string().bright_black(),
            label.green(),
            numeral.to_string().yellow()
        ));
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::create_registry;

    fn harmonized() -> CommandContext {
        let registry = create_registry();
        let mut ctx = CommandContext::new();
        registry.execute("melody C4 E4 G4 F4 A4 C5 G4 C4", &mut ctx);
        registry.execute("harmonize", &mut ctx);
        ctx
    }

    #[test]
    fn test_melody_without_args_echoes_current() {
        let mut ctx = CommandContext::new();
        assert!(matches!(cmd_melody("", &mut ctx), CommandResult::Error(_)));
        cmd_melody("C4 D4:2 _:1/2", &mut ctx);
        assert_eq!(
            cmd_melody("", &mut ctx),
            CommandResult::Message("C4 D4:2 _:1/2".to_string())
        );
    }

    #[test]
    fn test_analysis_lists_numerals() {
        let mut ctx = harmonized();
        let CommandResult::Message(out) = cmd_analysis("", &mut ctx) else {
            panic!("expected message");
        };
        assert!(out.contains("C major"), "{}", out);
        assert!(out.contains("Imaj7"), "{}", out);
    }

    #[test]
    fn test_parts_has_melody_and_voices() {
        let mut ctx = harmonized();
        let CommandResult::Message(out) = cmd_parts("", &mut ctx) else {
            panic!("expected message");
        };
        // Melody plus four voices at the default density
        assert_eq!(out.lines().count(), 5);
    }

    #[test]
    fn test_show_reports_state() {
        let mut ctx = harmonized();
        let CommandResult::Message(out) = cmd_show("", &mut ctx) else {
            panic!("expected message");
        };
        assert!(out.contains("clean"), "{}", out);
        assert!(out.contains("Cmaj7"), "{}", out);
    }
}
