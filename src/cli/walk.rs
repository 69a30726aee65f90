//! Walk subcommand - interactive fork walk over stdin.
//!
//! The reference host for the progression engine: every navigation goes
//! through the session, so the gate, resolver, and event reporting are
//! exercised end to end.

use std::io::Write as _;
use std::sync::Arc;

use clap::Parser;

use crate::config::Config;
use crate::loader::DataLoader;
use crate::models::{Dimension, ViewMode};
use crate::services::{NavOutcome, ProgressionEvent, Session};

/// Walk the graph interactively through the progression gate.
#[derive(Parser)]
pub struct WalkCommand {
    /// View mode: fullbright, tease, or player
    #[arg(long, default_value = "tease")]
    pub mode: String,

    /// Enable the dual-gate progression system
    #[arg(long)]
    pub gating: bool,

    /// Bypass every gate (dev escape hatch)
    #[arg(long)]
    pub ghost: bool,
}

impl WalkCommand {
    /// Run the walk command.
    pub async fn run(self) -> color_eyre::Result<()> {
        let view_mode: ViewMode = self
            .mode
            .parse()
            .map_err(|err: String| color_eyre::eyre::eyre!(err))?;

        let mut config = Config::load()?;
        if self.gating {
            config.progression.gating_enabled = true;
        }
        if self.ghost {
            config.progression.override_all_gates = true;
        }
        let config = Arc::new(config);

        let report = DataLoader::new(config.clone()).load_or_fallback().await;
        let mut session = Session::new(config, Arc::new(report.atlas));
        session.set_view_mode(view_mode);

        println!("Commands: <number> take fork, r reset, u <dim> raise clearance, q quit");

        let stdin = std::io::stdin();
        loop {
            print_position(&session);
            print!("> ");
            std::io::stdout().flush()?;

            let mut line = String::new();
            if stdin.read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim();

            match line {
                "" => continue,
                "q" | "quit" => break,
                "r" | "reset" => {
                    session.reset();
                    println!("Progression reset.");
                }
                _ => {
                    if let Some(rest) = line.strip_prefix("u ") {
                        raise_clearance(&mut session, rest);
                    } else if let Ok(choice) = line.parse::<usize>() {
                        take_fork(&mut session, choice);
                    } else {
                        println!("Unrecognized command '{}'", line);
                    }
                }
            }
        }

        Ok(())
    }
}

fn raise_clearance(session: &mut Session, raw: &str) {
    match raw.parse::<Dimension>() {
        Ok(dimension) => match session.force_clearance(dimension) {
            Some(_) => println!("Clearance raised to {}", dimension),
            None => println!("Clearance already at or above {}", dimension),
        },
        Err(err) => println!("{}", err),
    }
}

fn take_fork(session: &mut Session, choice: usize) {
    let Some(target) = session
        .current_node()
        .and_then(|node| node.forks.get(choice.wrapping_sub(1)))
        .map(|fork| fork.target.clone())
    else {
        println!("No fork #{}", choice);
        return;
    };

    match session.choose_fork(&target) {
        NavOutcome::Moved { target, events } => {
            println!("-> {}", target);
            for event in events {
                print_event(&event);
            }
        }
        NavOutcome::Blocked { denial, hint } => {
            println!("Blocked: {}", denial);
            if let Some(hint) = hint {
                println!("  hint: {}", hint);
            }
        }
        NavOutcome::LockedFork { target, hint } => {
            println!("Fork to {} is locked", target);
            if let Some(hint) = hint {
                println!("  hint: {}", hint);
            }
        }
        NavOutcome::UnknownNode { target } => {
            println!("Unknown node '{}'", target);
        }
    }
}

fn print_event(event: &ProgressionEvent) {
    match event {
        ProgressionEvent::NodeUnlocked { id } => println!("  unlocked {}", id),
        ProgressionEvent::DepthAdvanced { source, layer } => {
            println!("  depth in {} now L{}", source, layer)
        }
        ProgressionEvent::AnchorCompleted { dimension } => {
            println!("  anchor {} complete", dimension)
        }
        ProgressionEvent::ClearanceRaised { level } => {
            println!("  clearance raised to {}D", level)
        }
    }
}

fn print_position(session: &Session) {
    let clearance = session.player().clearance_level;
    match session.current_node() {
        Some(node) => {
            let dimension = node
                .dimension
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string());
            let layer = node
                .layer
                .map(|l| format!("L{}", l))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "\n@ {} [{} {}]  clearance {}D",
                node.id, dimension, layer, clearance
            );
            if node.forks.is_empty() {
                println!("  (terminal)");
            }
            for (index, fork) in node.forks.iter().enumerate() {
                let marker = if fork.locked {
                    'x'
                } else if session.player().is_unlocked(&fork.target) {
                    '*'
                } else if session.is_reachable(&fork.target) {
                    '+'
                } else {
                    '.'
                };
                println!("  {}. [{}] {}", index + 1, marker, fork.target);
            }
        }
        None => println!(
            "\n@ {} (unresolved)  clearance {}D",
            session.current(),
            clearance
        ),
    }
}
