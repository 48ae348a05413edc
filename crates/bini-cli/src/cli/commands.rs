//! Subcommands and their arguments.

use super::validation::{parse_port, parse_project_name};
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new Bini.js project
    ///
    /// Writes a Vite + React project with file-based routing under src/app
    /// and generates the initial router file.
    Create(CreateArgs),

    /// Regenerate the router file and print the discovered routes
    Routes(RoutesArgs),

    /// Watch src/app and regenerate the router on every change
    ///
    /// Also serves a Server-Sent Events endpoint that tells connected
    /// browsers to reload after each regeneration.
    Dev(DevArgs),
}

/// Arguments for `bini create`
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Project name, also used as the directory name
    #[arg(value_name = "NAME", value_parser = parse_project_name)]
    pub name: String,

    /// Generate a TypeScript project
    #[arg(long)]
    pub typescript: bool,

    /// Generate a JavaScript project (the default)
    #[arg(long)]
    pub javascript: bool,

    /// Style with Tailwind CSS
    #[arg(long, conflicts_with = "css_modules")]
    pub tailwind: bool,

    /// Style with CSS Modules
    #[arg(long)]
    pub css_modules: bool,

    /// Replace the target directory if it already exists
    #[arg(short, long)]
    pub force: bool,

    /// Skip the README and the example API route
    #[arg(long)]
    pub minimal: bool,
}

impl CreateArgs {
    /// `--typescript` wins over `--javascript`; JavaScript is the default.
    pub fn use_typescript(&self) -> bool {
        self.typescript
    }
}

/// Arguments for `bini routes`
#[derive(Args, Debug)]
pub struct RoutesArgs {
    /// Project root (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Print the routes as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `bini dev`
#[derive(Args, Debug)]
pub struct DevArgs {
    /// Project root (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Port for the reload server (overrides bini.config.json)
    #[arg(short, long, value_name = "PORT", value_parser = parse_port)]
    pub port: Option<u16>,

    /// Only regenerate the router; do not start the reload server
    #[arg(long)]
    pub no_server: bool,

    /// Do not start Vite (run it yourself with `npx vite`)
    #[arg(long)]
    pub no_vite: bool,
}
