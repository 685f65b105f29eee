pub mod context;
pub mod convert_command;
pub mod upload_command;
pub mod run_command;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::SyncResult;
use context::CLIContext;

#[derive(Debug, Parser)]
#[command(name = "carddav2fb", version, about = "Sync a CardDAV address book into a Fritz!Box phonebook")]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long, global = true, default_value = "config.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert downloaded contacts into a phonebook file, without touching the router
    Convert {
        /// Contacts exported by the CardDAV client (JSON)
        #[arg(long)]
        contacts: PathBuf,
        /// Previously exported phonebook to take quick dials from
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Where to write the phonebook XML (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Upload an existing phonebook XML file to the router
    Upload {
        filename: PathBuf,
    },
    /// Full sync: convert, upload images, upload the phonebook
    Run {
        /// Contacts exported by the CardDAV client (JSON)
        #[arg(long)]
        contacts: PathBuf,
    },
}

/// Dispatch a parsed command line.
pub fn run(cli: Cli) -> SyncResult<()> {
    let ctx = CLIContext::load(&cli.config)?;

    match cli.command {
        Command::Convert {
            contacts,
            snapshot,
            output,
        } => convert_command::convert(&ctx, &contacts, snapshot.as_deref(), output.as_deref()),
        Command::Upload { filename } => upload_command::upload(&ctx, &filename),
        Command::Run { contacts } => run_command::run(&ctx, &contacts),
    }
}
