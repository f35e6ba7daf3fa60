//! CLI entry point for lfring.

use clap::Parser;
use lfring_cli::CliConfig;

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    config.run()
}
