mod bot;
mod cli;
mod commands;
mod config;
mod console;
mod events;
mod game;
mod geometry;
mod graph;
mod ledger;
mod logging;
mod multiplayer;
mod session;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    logging::init(cli.verbose, cli.quiet, cli.no_color);
    cli.run()
}
