//! Deploy the Helper library, then PokerHand linked against it.

use std::process::ExitCode;

use cakepoker_contract::{
    cli::{NetworkArgs, init_logging},
    deployer,
};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(about = "Deploy the PokerHand NFT contract with its Helper library")]
struct Cli {
    #[command(flatten)]
    net: NetworkArgs,
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let (conn, artifacts) = cli.net.connect().await?;
    let deployed =
        deployer::deploy_poker_hand(&conn.provider, &conn.tx_options(), &artifacts).await?;
    println!("Deployed PokerHand contract at: {:#x}", deployed.contract);
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
