//! Budget-gated handoff orchestrator for iteration-based agent loops.
//!
//! Meters consumption against `.baton/state/ledger.json`, gates each action,
//! tracks iterations across process restarts, and checkpoints + hands off to
//! a fresh worker when the budget runs out.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use baton::admit::admit_action;
use baton::core::types::SessionStatus;
use baton::cycle::start_cycle;
use baton::exit_codes;
use baton::io::checkpoint::GitCheckpoint;
use baton::io::config::{ResolvedConfig, resolve};
use baton::io::init::{BatonPaths, InitOptions, init_baton};
use baton::io::ledger::load_ledger;
use baton::io::protocol::{
    EventRequest, GateRequest, read_optional_request, read_request, write_response,
};
use baton::io::session::load_session;
use baton::io::spawner::ProcessSpawner;
use baton::stop::handle_stop;

#[derive(Parser)]
#[command(
    name = "baton",
    version,
    about = "Budget-gated admission control and session handoff for agent loops"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.baton/` state and document scaffolding if missing.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// Gate one action: JSON request on stdin, JSON decision on stdout.
    Gate,
    /// Start a work cycle: advance the iteration if the budget admits it.
    Cycle,
    /// Handle a session stop: verify completion or hand off.
    Stop,
    /// Print a ledger and session snapshot.
    Status,
}

fn main() {
    baton::logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => {
            init_baton(&workspace_root(None)?, &InitOptions { force })?;
            Ok(exit_codes::OK)
        }
        Command::Gate => cmd_gate(),
        Command::Cycle => cmd_cycle(),
        Command::Stop => cmd_stop(),
        Command::Status => cmd_status(),
    }
}

fn cmd_gate() -> Result<i32> {
    let request: GateRequest = read_request(std::io::stdin().lock())?;
    let root = request.workspace_root.clone();
    let resolved = resolve_for(&root)?;
    let response = admit_action(
        &root,
        &resolved,
        &request,
        &GitCheckpoint::new(&root),
        &ProcessSpawner,
    )?;
    write_response(std::io::stdout().lock(), &response)?;
    Ok(exit_codes::OK)
}

fn cmd_cycle() -> Result<i32> {
    let request: EventRequest = read_optional_request(std::io::stdin().lock())?;
    let root = workspace_root(request.workspace_root.clone())?;
    let resolved = resolve_for(&root)?;
    let response = start_cycle(&root, &resolved, &GitCheckpoint::new(&root), &ProcessSpawner)?;
    write_response(std::io::stdout().lock(), &response)?;
    Ok(exit_codes::OK)
}

fn cmd_stop() -> Result<i32> {
    let request: EventRequest = read_optional_request(std::io::stdin().lock())?;
    let root = workspace_root(request.workspace_root.clone())?;
    let resolved = resolve_for(&root)?;
    let response = handle_stop(
        &root,
        &resolved,
        &request,
        &GitCheckpoint::new(&root),
        &ProcessSpawner,
    )?;
    write_response(std::io::stdout().lock(), &response)?;
    Ok(exit_codes::OK)
}

fn cmd_status() -> Result<i32> {
    let root = workspace_root(None)?;
    let paths = BatonPaths::new(&root);
    let resolved = resolve_for(&root)?;
    let cfg = &resolved.config;

    let ledger = load_ledger(&paths.ledger_path, cfg.threshold, cfg.warn_fraction);
    let session = load_session(&paths.session_path);

    println!(
        "budget: {} / {} units ({:?})",
        ledger.allocated, ledger.threshold, ledger.status
    );
    println!("iteration: {} ({:?})", session.iteration, session.status);
    if let Some(started_at) = session.started_at {
        println!("started_at: {}", started_at.to_rfc3339());
    }
    if let Some(previous) = session.previous_context {
        println!("previous_context: {previous} units");
    }

    Ok(match session.status {
        SessionStatus::Complete => exit_codes::COMPLETE,
        SessionStatus::HandoffPending => exit_codes::HANDOFF,
        SessionStatus::Initialized | SessionStatus::Active => exit_codes::OK,
    })
}

fn workspace_root(requested: Option<PathBuf>) -> Result<PathBuf> {
    match requested {
        Some(root) => Ok(root),
        None => std::env::current_dir().context("resolve current directory"),
    }
}

fn resolve_for(root: &std::path::Path) -> Result<ResolvedConfig> {
    let paths = BatonPaths::new(root);
    resolve(&paths.config_path)
}
