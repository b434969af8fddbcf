//! trnotes: write day notes to a Trilium server from the terminal.
//!
//! `trnotes [NAME]` opens the editor and saves the result as a new note under
//! today's day note; `--edit NAME` reopens an existing one; `--list` prints
//! the day's titles. Prefix the name with `YYYY-MM-DD/` to work on another day.

mod args;
mod commands;
mod config;
mod editor;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use trnotes_core::NoteClient;

use crate::args::Args;
use crate::config::Config;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr. `RUST_LOG` wins; otherwise `-v` selects debug, else warn.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(args: Args) -> Result<()> {
    let path = config::resolve_path(args.config.as_deref())?;
    let config = match Config::load(&path)? {
        Some(config) => config,
        None => {
            let config = commands::setup(&mut io::stdin().lock(), &mut io::stdout())?;
            config.save(&path)?;
            info!(path = %path.display(), "saved new config");
            config
        }
    };

    let client =
        NoteClient::with_options(&config.url, config.client_options())?.with_token(config.token);
    let target = args.target(Local::now().date_naive())?;
    let mut stdout = io::stdout();

    if args.debug {
        return commands::debug(&client, target.date, &mut stdout);
    }
    if args.list {
        return commands::list(&client, target.date, &mut stdout);
    }
    if args.edit {
        let note = commands::edit(
            &client,
            &target,
            |notes| commands::prompt_choice(notes, &mut io::stdin().lock(), &mut io::stdout()),
            editor::edit,
        )?;
        info!(id = %note.id, "note updated");
        return Ok(());
    }
    if let Some(note) = commands::create(&client, &target, editor::edit)? {
        info!(id = %note.id, title = %note.title, "note saved");
    }
    Ok(())
}
