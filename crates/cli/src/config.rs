//! Command-line configuration.

use crate::commands::Command;
use crate::logging::{init_logging, LogLevel};
use anyhow::Context;
use clap::Parser;
use lfring::ring::{DEFAULT_REPLICATION_FACTOR, DEFAULT_VIRTUAL_NODE_COUNT};
use lfring::{HashRing, HasherKind};
use tracing::info;

/// Build a consistent hashing ring and inspect key placement.
#[derive(Parser, Debug)]
#[command(name = "ring", version, about)]
pub struct CliConfig {
    /// Hash function placing virtual nodes and keys
    #[arg(long, value_enum, default_value_t = HasherKind::Xxh3)]
    pub hasher: HasherKind,

    /// Number of distinct nodes responsible for each key
    #[arg(short = 'r', long, default_value_t = DEFAULT_REPLICATION_FACTOR)]
    pub replication_factor: usize,

    /// Virtual nodes per distinct node
    #[arg(short = 'v', long = "vnodes", default_value_t = DEFAULT_VIRTUAL_NODE_COUNT)]
    pub virtual_node_count: usize,

    /// Node to insert; repeat for every member of the ring
    #[arg(short = 'n', long = "node")]
    pub nodes: Vec<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    pub fn build_ring(&self) -> anyhow::Result<HashRing> {
        let ring = HashRing::builder()
            .hasher_kind(self.hasher)
            .replication_factor(self.replication_factor)
            .virtual_node_count(self.virtual_node_count)
            .nodes(self.nodes.iter().map(String::as_str))
            .build()
            .context("failed to build ring")?;
        info!(
            nodes = ring.size(),
            virtual_nodes = ring.len_virtual_nodes(),
            "ring ready"
        );
        Ok(ring)
    }

    pub fn run(self) -> anyhow::Result<()> {
        init_logging(self.log_level)?;
        let ring = self.build_ring()?;
        let result = self.command.execute(&ring)?;
        let stdout = std::io::stdout();
        result.write(&mut stdout.lock(), self.json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lookup() {
        let config = CliConfig::try_parse_from([
            "ring", "--hasher", "blake3", "-r", "2", "--vnodes", "8", "-n", "a", "-n", "b",
            "lookup", "k1", "k2", "--json",
        ])
        .unwrap();
        assert_eq!(config.hasher, HasherKind::Blake3);
        assert_eq!(config.replication_factor, 2);
        assert_eq!(config.virtual_node_count, 8);
        assert_eq!(config.nodes, vec!["a", "b"]);
        assert!(config.json);
        assert!(matches!(config.command, Command::Lookup { ref keys } if keys.len() == 2));

        let ring = config.build_ring().unwrap();
        assert_eq!(ring.size(), 2);
        assert_eq!(ring.len_virtual_nodes(), 16);
    }

    #[test]
    fn rejects_bad_replication_factor() {
        let config =
            CliConfig::try_parse_from(["ring", "-r", "0", "-n", "a", "show"]).unwrap();
        assert!(config.build_ring().is_err());
    }
}
