use anyhow::Result;
use clap::Parser;

use fluidic::cli::Cli;

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    cli.run()
}
