//! `bini` command-line entry point.

use bini_cli::{cli, commands, error, logger, ui};
use clap::Parser;
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors();

    let result = match args.command {
        cli::Command::Create(create_args) => commands::create::execute(create_args).await,
        cli::Command::Routes(routes_args) => commands::routes::execute(routes_args).await,
        cli::Command::Dev(dev_args) => commands::dev::execute(dev_args).await,
    };

    result.map_err(error::cli_error_to_miette)
}
