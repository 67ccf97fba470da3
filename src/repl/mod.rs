//! REPL (Read-Eval-Print Loop) for harmonizing melodies

use crate::commands::{create_registry, CommandContext, CommandRegistry, CommandResult};
use crate::repl::watcher::FileWatcher;
use anyhow::{anyhow, Result};
use colored::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use notify::{Event, EventKind};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RustylineResult};
use std::thread;
use tracing::{debug, warn};

pub mod watcher;

/// Types of events the REPL loop handles
enum ReplEvent {
    Input(Result<String, ReadlineError>),
}

/// Interactive harmonizer session
pub struct Repl {
    editor: Option<DefaultEditor>,
    registry: CommandRegistry,
    ctx: CommandContext,

    // Event channels
    tx_input: Sender<ReplEvent>,
    rx_input: Receiver<ReplEvent>,
    tx_watcher: Sender<notify::Result<Event>>,
    rx_watcher: Receiver<notify::Result<Event>>,

    // File watcher
    watcher: Option<FileWatcher>,
}

impl Repl {
    /// Create a new REPL instance
    pub fn new() -> RustylineResult<Self> {
        let editor = DefaultEditor::new()?;
        let (tx_input, rx_input) = unbounded();
        let (tx_watcher, rx_watcher) = unbounded();

        Ok(Repl {
            editor: Some(editor),
            registry: create_registry(),
            ctx: CommandContext::new(),
            tx_input,
            rx_input,
            tx_watcher,
            rx_watcher,
            watcher: None,
        })
    }

    /// Run one line through the command registry. Returns false to exit.
    fn handle_line(&mut self, line: &str) -> bool {
        match self.registry.execute(line, &mut self.ctx) {
            CommandResult::Success => {}
            CommandResult::Message(msg) => println!("{}", msg),
            CommandResult::Exit => {
                println!("{} 🎵", "Goodbye!".bright_cyan());
                return false;
            }
            CommandResult::Error(e) => {
                println!("{} {}", "Error:".bright_red().bold(), e.red());
            }
            CommandResult::Watch(path) => self.start_watching(&path),
            CommandResult::NotACommand => println!(
                "{} Unknown command '{}'. Type '{}' for a list.",
                "Error:".bright_red().bold(),
                line,
                "help".bright_green()
            ),
        }
        true
    }

    fn start_watching(&mut self, path: &str) {
        // Initialize watcher if needed
        if self.watcher.is_none() {
            match FileWatcher::new(self.tx_watcher.clone()) {
                Ok(w) => self.watcher = Some(w),
                Err(e) => println!("{} Failed to create watcher: {}", "Error:".red(), e),
            }
        }

        if let Some(w) = &mut self.watcher {
            if let Err(e) = w.watch(path) {
                println!("{} Failed to watch {}: {}", "Error:".red(), path, e);
            } else {
                println!(
                    "{} Watching {} for changes...",
                    "👀".bright_cyan(),
                    path.bright_green()
                );
            }
        }
    }

    fn handle_file_event(&mut self, event: Event) {
        // Only care about modifications or creations
        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            return;
        }
        for path in event.paths {
            println!("{} File changed: {}", "⚡".bright_yellow(), path.display());
            match self.ctx.reload(&path) {
                Ok(part) => println!("{}", part),
                Err(e) => println!("{} {:#}", "Error:".red(), e),
            }
        }
    }

    /// Start the REPL loop
    pub fn run(&mut self) -> Result<()> {
        println!(
            "{} {}",
            "🎵".bright_yellow(),
            "Harmonist".bright_cyan().bold()
        );
        println!(
            "Try: {}, then {}",
            "melody E4 E4 F4 G4 | G4 F4 E4 D4".cyan(),
            "harmonize".cyan()
        );
        println!(
            "Type '{}' for more information, '{}' or {} to exit.\n",
            "help".bright_green(),
            "quit".bright_red(),
            "Ctrl+C".bright_red()
        );

        // Move editor to thread
        let mut editor = self
            .editor
            .take()
            .ok_or_else(|| anyhow!("REPL is already running"))?;
        let tx_input = self.tx_input.clone();

        thread::spawn(move || loop {
            let prompt = format!("{} ", "harmonist>".bright_magenta().bold());
            let readline = editor.readline(&prompt);

            match readline {
                Ok(line) => {
                    let line = line.trim().to_string();
                    if !line.is_empty() {
                        let _ = editor.add_history_entry(&line);
                    }
                    if tx_input.send(ReplEvent::Input(Ok(line))).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    let _ = tx_input.send(ReplEvent::Input(Err(err)));
                    break;
                }
            }
        });

        loop {
            crossbeam_channel::select! {
                recv(self.rx_input) -> msg => match msg {
                    Ok(ReplEvent::Input(Ok(line))) => {
                        if line.is_empty() {
                            continue;
                        }
                        debug!(%line, "input");
                        if !self.handle_line(&line) {
                            break;
                        }
                    }
                    Ok(ReplEvent::Input(Err(ReadlineError::Interrupted)))
                    | Ok(ReplEvent::Input(Err(ReadlineError::Eof))) => {
                        println!("{} 🎵", "Goodbye!".bright_cyan());
                        break;
                    }
                    Ok(ReplEvent::Input(Err(err))) => {
                        println!(
                            "{} {}",
                            "Error reading input:".bright_red().bold(),
                            err.to_string().red()
                        );
                        break;
                    }
                    Err(_) => break, // Channel closed
                },

                recv(self.rx_watcher) -> msg => match msg {
                    Ok(Ok(event)) => self.handle_file_event(event),
                    Ok(Err(e)) => warn!(error = %e, "watch error"),
                    Err(_) => break, // Channel closed
                }
            }
        }

        Ok(())
    }
}

/// Convenience function to start the REPL
pub fn start() -> Result<()> {
    let mut repl = Repl::new().map_err(|e| anyhow!("Failed to initialize REPL: {}", e))?;
    repl.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repl() -> Repl {
        let (tx_input, rx_input) = unbounded();
        let (tx_watcher, rx_watcher) = unbounded();
        Repl {
            editor: None,
            registry: create_registry(),
            ctx: CommandContext::new(),
            tx_input,
            rx_input,
            tx_watcher,
            rx_watcher,
            watcher: None,
        }
    }

    #[test]
    fn test_lines_drive_session() {
        let mut repl = repl();
        assert!(repl.handle_line("melody C4 E4 G4 F4 A4 C5 G4 C4"));
        assert!(repl.handle_line("harmonize"));
        assert!(repl.handle_line("not a command"));
        assert!(repl.handle_line("delete 42"));
        assert!(repl.ctx.editor.is_some());
        assert!(!repl.handle_line("quit"));
    }

    #[test]
    fn test_file_event_reharmonizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tune.txt");
        std::fs::write(&path, "C4 E4 G4 F4 A4 C5 G4 C4").unwrap();

        let mut repl = repl();
        let event = Event::new(EventKind::Modify(notify::event::ModifyKind::Any))
            .add_path(path.clone());
        repl.handle_file_event(event);
        assert!(repl.ctx.editor.is_some());

        // Access events are ignored
        std::fs::write(&path, "D4").unwrap();
        let event = Event::new(EventKind::Access(notify::event::AccessKind::Any)).add_path(path);
        repl.handle_file_event(event);
        let (melody, _) = repl.ctx.melody.as_ref().unwrap();
        assert_eq!(melody.len(), 8);
    }
}
