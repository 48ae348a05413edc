//! Command-line interface definition for the `bini` tool.
//!
//! # Command Structure
//!
//! - `bini create` - Scaffold a new Bini.js project
//! - `bini routes` - Regenerate the router and print the route table
//! - `bini dev` - Keep the router in sync with `src/app` and push reloads

mod commands;
mod validation;

use clap::Parser;

pub use commands::{Command, CreateArgs, DevArgs, RoutesArgs};
pub use validation::{parse_port, parse_project_name};

/// Bini.js project tooling
#[derive(Parser, Debug)]
#[command(
    name = "bini",
    version,
    about = "File-based routing toolchain for Bini.js projects",
    long_about = "Scaffolds Bini.js projects and keeps their React Router file in sync\n\
                  with the pages under src/app."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
