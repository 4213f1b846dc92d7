//! Shared plumbing of the deploy binaries

use std::path::PathBuf;

use clap::Args;
use tracing_subscriber::EnvFilter;

use crate::{
    artifact::Artifacts,
    config::{DEFAULT_NETWORK, Networks},
    provider::{self, Connection},
};

#[derive(Debug, Clone, Args)]
pub struct NetworkArgs {
    /// Network to deploy to
    #[arg(long, env = "NETWORK", default_value = DEFAULT_NETWORK)]
    pub network: String,

    /// Directory holding the compiled contract artifacts
    #[arg(long, env = "ARTIFACTS_DIR", default_value = "artifacts")]
    pub artifacts: PathBuf,
}

impl NetworkArgs {
    /// Resolve the requested network from the environment and connect to it.
    pub async fn connect(&self) -> anyhow::Result<(Connection, Artifacts)> {
        let networks = Networks::from_env()?;
        let network = networks.get(&self.network)?;
        let conn = provider::connect(network).await?;
        Ok((conn, Artifacts::new(self.artifacts.clone())))
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`). Stdout is left to results.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, Parser};

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        net: NetworkArgs,
    }

    fn default_of(id: &str) -> String {
        let cmd = Cli::command();
        let arg = cmd.get_arguments().find(|a| a.get_id() == id).unwrap();
        arg.get_default_values()[0].to_string_lossy().into_owned()
    }

    #[test]
    fn test_defaults() {
        assert_eq!(default_of("network"), "hardhat");
        assert_eq!(default_of("artifacts"), "artifacts");

        let cmd = Cli::command();
        let env_of = |id: &str| {
            cmd.get_arguments()
                .find(|a| a.get_id() == id)
                .and_then(|a| a.get_env())
                .map(|e| e.to_string_lossy().into_owned())
        };
        assert_eq!(env_of("network").as_deref(), Some("NETWORK"));
        assert_eq!(env_of("artifacts").as_deref(), Some("ARTIFACTS_DIR"));
    }

    #[test]
    fn test_explicit_network() {
        let cli = Cli::try_parse_from(["deploy", "--network", "bsc_testnet", "--artifacts", "out"])
            .unwrap();
        assert_eq!(cli.net.network, "bsc_testnet");
        assert_eq!(cli.net.artifacts, PathBuf::from("out"));
    }
}
