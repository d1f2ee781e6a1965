//! Command-line interface and REPL
//!
//! The REPL runs on a blocking thread and forwards parsed [`HostCommand`]s to
//! the main loop, which owns the parameter panel and the bridge.

use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::sync::mpsc;

use crate::bridge::{CycleState, DiagnosticsTable, SourceMenu};
use crate::panel::{ParameterPanel, Pulse};
use crate::state::CameraState;

/// A request from the operator to the host loop
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    /// Set a named parameter from text
    Set { name: String, value: String },
    /// Change the source selection
    Select(String),
    /// Fire a momentary action
    Pulse(Pulse),
    /// Overwrite the diagnostics offset
    Offset(f64),
    Sources,
    State,
    Info,
    Params,
    Help,
    Quit,
}

impl HostCommand {
    /// Parse one REPL line; `Ok(None)` for blank input
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let rest: Vec<&str> = words.collect();

        let command = match verb.to_ascii_lowercase().as_str() {
            "set" => match rest.as_slice() {
                [name, value @ ..] if !value.is_empty() => HostCommand::Set {
                    name: name.to_string(),
                    value: value.join(" "),
                },
                _ => return Err("usage: set <param> <value>".to_string()),
            },
            "select" => {
                if rest.is_empty() {
                    return Err("usage: select <index|#index|address|none>".to_string());
                }
                HostCommand::Select(rest.join(" "))
            },
            "refresh" | "updatesources" => HostCommand::Pulse(Pulse::UpdateSources),
            "reset" => HostCommand::Pulse(Pulse::Reset),
            "offset" => match rest.as_slice() {
                [value] => value
                    .parse()
                    .map(HostCommand::Offset)
                    .map_err(|_| format!("invalid offset '{}'", value))?,
                _ => return Err("usage: offset <value>".to_string()),
            },
            "sources" | "ls" => HostCommand::Sources,
            "state" => HostCommand::State,
            "info" => HostCommand::Info,
            "params" => HostCommand::Params,
            "help" | "?" => HostCommand::Help,
            "quit" | "exit" => HostCommand::Quit,
            other => return Err(format!("unknown command '{}' (try 'help')", other)),
        };

        Ok(Some(command))
    }
}

pub fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  set <param> <value>   set a parameter (see 'params')");
    println!("  select <id>           select a source by #index, index or address");
    println!("  refresh               refresh discovery and rebuild the source menu");
    println!("  reset                 zero the diagnostics offset");
    println!("  offset <value>        set the diagnostics offset");
    println!("  sources               list known sources");
    println!("  state                 show connection state and last sent values");
    println!("  info                  show the diagnostics table");
    println!("  params                show parameter values");
    println!("  quit                  stop the bridge");
}

/// Print the source menu, marking the bound source
pub fn print_sources(menu: &SourceMenu, state: &CycleState) {
    println!("\n{}", "=== Available Sources ===".bold().cyan());

    let bound = match state {
        CycleState::Bound { source } => Some(source.address.as_str()),
        CycleState::Idle => None,
    };
    // The first choice is the default "None" entry
    for (i, entry) in menu.choices().iter().enumerate() {
        let marker = if bound == Some(entry.address.as_str()) {
            "[BOUND]".green()
        } else {
            "       ".normal()
        };
        let id = match i.checked_sub(1) {
            Some(index) => format!("#{}", index),
            None => String::new(),
        };
        println!(
            "  {} {:>4}  {}  {}",
            marker,
            id,
            entry.label.bright_white(),
            entry.address.dimmed()
        );
    }

    if menu.is_empty() {
        println!("  {}", "No sources found (try 'refresh')".dimmed());
    }
}

/// Print the connection state and the last dispatched values
pub fn print_state(state: &CycleState, sent: &CameraState) {
    let status = match state {
        CycleState::Idle => state.to_string().yellow(),
        CycleState::Bound { .. } => state.to_string().green(),
    };
    println!("\n{} {}", "State:".bold(), status);
    for (name, value) in sent.named_channels() {
        println!("  {:<16} {}", name, value);
    }
}

pub fn print_diagnostics(table: &DiagnosticsTable) {
    println!("\n{}", "Diagnostics:".bold());
    for line in table.to_string().lines() {
        println!("  {}", line);
    }
}

pub fn print_params(panel: &ParameterPanel) {
    println!("\n{}", "Parameters:".bold());
    println!("  {:<16} {}", crate::panel::SELECTION_PARAMETER, panel.selection().bright_white());
    for (def, value) in panel.entries() {
        println!(
            "  {:<16} {:<8} {}",
            def.name,
            value,
            format!("{} [{}, {}]", def.label, def.slider.0, def.slider.1).dimmed()
        );
    }
}

/// Read lines until `quit`, EOF or the host loop goes away
///
/// Blocking; run it on a dedicated thread.
pub fn run_repl(tx: mpsc::Sender<HostCommand>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline("ptz> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                match HostCommand::parse(&line) {
                    Ok(Some(HostCommand::Help)) => print_help(),
                    Ok(Some(command)) => {
                        let quit = command == HostCommand::Quit;
                        if tx.blocking_send(command).is_err() || quit {
                            break;
                        }
                    },
                    Ok(None) => {},
                    Err(e) => println!("{}", e.yellow()),
                }
            },
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                let _ = tx.blocking_send(HostCommand::Quit);
                break;
            },
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> HostCommand {
        HostCommand::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_parse_set() {
        assert_eq!(
            parse("set Abspan 0.5"),
            HostCommand::Set {
                name: "Abspan".to_string(),
                value: "0.5".to_string()
            }
        );
        assert!(HostCommand::parse("set Abspan").is_err());
    }

    #[test]
    fn test_parse_select_keeps_full_argument() {
        assert_eq!(parse("select #2"), HostCommand::Select("#2".to_string()));
        assert_eq!(parse("SELECT 10.0.0.1:52381"), HostCommand::Select("10.0.0.1:52381".to_string()));
        assert!(HostCommand::parse("select").is_err());
    }

    #[test]
    fn test_parse_pulses_and_queries() {
        assert_eq!(parse("refresh"), HostCommand::Pulse(Pulse::UpdateSources));
        assert_eq!(parse("reset"), HostCommand::Pulse(Pulse::Reset));
        assert_eq!(parse("offset -2.5"), HostCommand::Offset(-2.5));
        assert_eq!(parse("  sources  "), HostCommand::Sources);
        assert_eq!(parse("exit"), HostCommand::Quit);
        assert!(HostCommand::parse("offset abc").is_err());
    }

    #[test]
    fn test_parse_blank_and_unknown() {
        assert_eq!(HostCommand::parse("   "), Ok(None));
        assert!(HostCommand::parse("dance").is_err());
    }
}
