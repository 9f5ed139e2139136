#![deny(dead_code)] // DO NOT REMOVE THIS EVER
use anyhow::Result;
use clap::Parser;
use log::{info, warn, LevelFilter};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;

mod ui;
mod utils;

use crate::ui::{parse_command, Command, ConsoleUI};
use parley::attachments::SelectedFile;
use parley::{config, ChatSession};

/// Command line arguments for Parley
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Parley: a console chat with a simulated counterpart.",
    long_about = "Parley is a single-conversation console chat. Every message you send \
    gets a scripted reply after a short typing pause.\n\n\
    Use -h or --help to see all options."
)]
struct Args {
    /// JSON config file (defaults to the per-user config directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Where log lines go
    #[arg(long, value_name = "PATH", default_value = "parley.log")]
    log_file: PathBuf,

    /// Contact to open first
    #[arg(long, value_name = "ID")]
    contact: Option<u32>,

    /// Log at debug level
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    utils::setup_logging(args.log_file.to_str(), level)?;
    info!("Parley starting up");
    info!("System information: {} {}", std::env::consts::OS, std::env::consts::ARCH);

    if let Some(path) = &args.config {
        config::set_config_path_override(path.clone());
        info!("Config path overridden to: {}", path.display());
    }
    let mut session_config = config::load_config(None)?;
    if let Some(contact) = args.contact {
        session_config.initial_contact = contact;
    }

    let mut session = ChatSession::from_config(&session_config);
    let mut events = session.subscribe();
    let ui = ConsoleUI::new(&session_config.contact_name);

    ui.print_header(session.contacts());
    ui.print_history(session.messages());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    // Main event loop
    loop {
        let deadline = session.next_deadline();

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_command(&mut session, &ui, parse_command(&line)) {
                    break;
                }
            }
            _ = sleep_until(deadline) => {
                session.fire_due_timers();
            }
        }

        while let Ok(event) = events.try_recv() {
            ui.print_event(&event);
        }
    }

    session.close();
    while let Ok(event) = events.try_recv() {
        ui.print_event(&event);
    }

    info!("Parley shutting down");
    Ok(())
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Apply one command. Returns false when the user wants to leave.
fn handle_command(session: &mut ChatSession, ui: &ConsoleUI, command: Command) -> bool {
    match command {
        Command::Send(text) => {
            // Keep anything added with /emoji in front of the typed line
            let draft = format!("{}{}", session.composer().text(), text);
            session.set_text(draft);
            if session.send().is_none() {
                // Empty line with nothing staged
                return true;
            }
        }
        Command::Attach { kind, path } => match SelectedFile::from_path(&path) {
            Ok(file) => {
                let staged = session.stage_attachment(file, kind);
                ui.print_staged(staged);
            }
            Err(e) => {
                warn!("Could not attach {}: {}", path.display(), e);
                ui.print_error(&format!("Could not attach {}: {}", path.display(), e));
            }
        },
        Command::Discard => session.clear_staged_attachment(),
        Command::Contacts(query) => ui.print_contacts(session.contacts(), query.as_deref()),
        Command::Open(contact_id) => match session.select_contact(contact_id) {
            Ok(()) => {
                ui.print_header(session.contacts());
                ui.print_history(session.messages());
            }
            Err(e) => ui.print_error(&e.to_string()),
        },
        Command::Emoji(emoji) => {
            session.insert_emoji(&emoji);
            println!("  Draft: {}", session.composer().text());
        }
        Command::History => ui.print_history(session.messages()),
        Command::Help => ui.print_help(),
        Command::Quit => return false,
        Command::Invalid(reason) => ui.print_error(&reason),
    }
    true
}
