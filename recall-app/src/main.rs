mod cli;

use anyhow::Result;
use clap::Parser;

use cli::commands::run_cli;
use cli::opts::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Cli::parse();
    run_cli(args).await
}
