//! General REPL commands (help, quit, configuration, watch)

use crate::commands::{CommandContext, CommandResult};
use colored::*;
use harmonist_core::{ChordQuality, Complexity, Doubling, KeyCenter, VoicingStyle};

/// Handle `help` command
pub fn cmd_help(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    print_help();
    CommandResult::Success
}

/// Handle `quit` or `exit` command
pub fn cmd_quit(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Exit
}

/// Handle `set <option> <value>` command
pub fn cmd_set(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let Some((option, value)) = args.split_once(char::is_whitespace) else {
        return CommandResult::Error("Usage: set <option> <value> (see 'params')".to_string());
    };

    let mut params = ctx.params.clone();
    if let Err(e) = params.set(option, value) {
        return CommandResult::from_error(e);
    }
    if let Err(e) = params.validate() {
        let hint = if matches!(option, "lowest" | "lowest-note" | "highest" | "highest-note") {
            " (bounds are checked one at a time; use 'set range <low> <high>' to move both)"
        } else {
            ""
        };
        return CommandResult::Error(format!("{}{}", e, hint));
    }
    ctx.params = params;
    CommandResult::Message(
        format!("✓ {} = {}", option, value.trim())
            .bright_green()
            .to_string(),
    )
}

/// Handle `params` command
pub fn cmd_params(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Message(ctx.params.to_string())
}

/// Handle `qualities` command
pub fn cmd_qualities(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    let mut out = String::new();
    for tier in Complexity::ALL {
        let names: Vec<String> = ChordQuality::ALL
            .iter()
            .filter(|q| q.tier() == *tier)
            .map(|q| format!("{} ({})", q.symbol(), q.suffix()))
            .collect();
        if names.is_empty() {
            continue;
        }
        out.push_str(&format!("{:<10} {}\n", tier.to_string().green(), names.join(", ")));
    }
    CommandResult::Message(out.trim_end().to_string())
}

/// Handle `watch [file]` command
pub fn cmd_watch(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: watch <file>".to_string());
    }
    match ctx.reload(args) {
        Ok(part) => println!("{}", part),
        Err(e) => return CommandResult::from_error(e),
    }
    CommandResult::Watch(args.to_string())
}

fn tokens<T: ToString>(all: &[T]) -> String {
    all.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(" | ")
}

/// Print help information
fn print_help() {
    println!("{}", "🎵 Harmonist Help".bold());
    println!("{}", "=================".bold());
    println!();
    println!("{}", "Melody:".green());
    println!(
        "  {}  - Set the melody",
        "melody C4 E4 G4:2 _ | F4:1/2 A4:3/2".cyan()
    );
    println!("  {}                 - Read melody notation from a file", "load <file>".cyan());
    println!("  {}                - Load and re-harmonize on every change", "watch <file>".cyan());
    println!("  Notes are NAME[OCTAVE][:BEATS]; {} is a rest, {} a bar line.", "_".cyan(), "|".cyan());
    println!();
    println!("{}", "Harmony:".green());
    println!("  {}                   - Harmonize the melody and start editing", "harmonize".cyan());
    println!("  {}                        - Show the working progression", "show".cyan());
    println!("  {}                    - Key, confidence and Roman numerals", "analysis".cyan());
    println!("  {}                       - Melody and harmony voices as parts", "parts".cyan());
    println!();
    println!("{}", "Editing:".green());
    println!("  {}         - Change chord i's quality", "change <i> <quality>".cyan());
    println!("  {}                  - Remove chord i", "delete <i>".cyan());
    println!("  {}  - Insert a chord on chord i's root", "insert before <i> <quality>".cyan());
    println!("  {}   - Insert a chord on chord i's root", "insert after <i> <quality>".cyan());
    println!("  {} / {}                 - Step through edit history", "undo".cyan(), "redo".cyan());
    println!("  {}                        - Commit edits, print per-note labels", "save".cyan());
    println!("  {}                       - Show the last saved part", "saved".cyan());
    println!("  {}                     - Drop edits since the last save", "discard".cyan());
    println!("  {}                     - List snapshots", "history".cyan());
    println!();
    println!("{}", "Configuration:".green());
    println!("  {}       - Change an option", "set <option> <value>".cyan());
    println!("  {}                      - Show current options", "params".cyan());
    println!("  {}                   - List chord qualities by complexity", "qualities".cyan());
    println!("    key:        {}", tokens(KeyCenter::ALL));
    println!("    style:      {}", tokens(VoicingStyle::ALL));
    println!("    complexity: {}", tokens(Complexity::ALL));
    println!("    doubling:   {}", tokens(Doubling::ALL));
    println!("    density 3-7, bias -1..1, lowest/highest <note>, range <low> <high>,");
    println!("    closed/inversions on|off,");
    println!("    quality <symbol>|auto");
    println!();
    println!("{}", "Other Commands:".green());
    println!("  {}              - Show this help", "help".bright_green());
    println!("  {}              - Exit the REPL", "quit".bright_red());
}
