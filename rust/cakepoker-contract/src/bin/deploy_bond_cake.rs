//! Deploy BondCake behind an upgradeable proxy.

use std::process::ExitCode;

use alloy::primitives::Address;
use cakepoker_contract::{
    cli::{NetworkArgs, init_logging},
    deployer::{self, BSC_TESTNET_CAKE, BSC_TESTNET_CAKE_POOL},
};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(about = "Deploy the upgradeable BondCake contract")]
struct Cli {
    #[command(flatten)]
    net: NetworkArgs,

    /// Cake token the bond is denominated in
    #[arg(long, default_value_t = BSC_TESTNET_CAKE)]
    cake: Address,

    /// CakePool the bond stakes into
    #[arg(long, default_value_t = BSC_TESTNET_CAKE_POOL)]
    cake_pool: Address,
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let (conn, artifacts) = cli.net.connect().await?;
    let deployed = deployer::deploy_bond_cake(
        &conn.provider,
        &conn.tx_options(),
        &artifacts,
        cli.cake,
        cli.cake_pool,
    )
    .await?;
    tracing::info!(implementation = %deployed.implementation, "implementation");
    println!("Deployed BondCake contract at: {:#x}", deployed.proxy);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
