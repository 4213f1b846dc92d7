//! BondCake and PokerHand: network selection, deployers and a behavioral model.
//!
//! This crate deploys the contracts to a configured network, talks to deployed
//! instances, and models the PokerHand minting contract so its behavior can be
//! checked without a chain.

use alloy::{
    primitives::{Address, U256},
    providers::{Provider, ext::AnvilApi},
};
use anyhow::Result;

mod sol_types;

pub mod artifact;
pub mod cards;
pub mod cli;
pub mod client;
pub mod config;
pub mod deployer;
pub mod error;
pub mod metadata;
pub mod minting;
pub mod provider;

pub use sol_types::*;

use crate::{
    artifact::Artifacts,
    config::Network,
    deployer::LinkedDeployment,
    provider::Connection,
};

/// Spawn a local test blockchain and deploy PokerHand (with its Helper library).
/// Returns the connection to the chain and the deployed addresses.
pub async fn init_test_chain(artifacts: &Artifacts) -> Result<(Connection, LinkedDeployment)> {
    // the connection owns the chain instance, which exits on drop
    let conn = provider::connect(&Network::local()).await?;
    let deployed = deployer::deploy_poker_hand(&conn.provider, &conn.tx_options(), artifacts).await?;
    Ok((conn, deployed))
}

/// Set native balances on a local chain.
pub async fn fund_accounts<P: Provider>(provider: &P, balances: &[(Address, U256)]) -> Result<()> {
    for (account, amount) in balances {
        provider.anvil_set_balance(*account, *amount).await?;
        tracing::debug!(%account, %amount, "funded");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{client::PokerHandClient, error::ContractError, provider::dev_signer};
    use alloy::{
        network::EthereumWallet,
        primitives::utils::parse_ether,
        providers::{ProviderBuilder, WalletProvider},
        signers::local::PrivateKeySigner,
    };

    /// Behavioral probe of a real PokerHand build; point `POKER_HAND_ARTIFACTS` at
    /// the Hardhat artifacts directory.
    #[tokio::test]
    #[ignore = "requires anvil and compiled PokerHand artifacts"]
    async fn test_poker_hand_minting() {
        let dir = std::env::var("POKER_HAND_ARTIFACTS").unwrap_or_else(|_| "artifacts".into());
        let (conn, deployed) = init_test_chain(&Artifacts::new(dir)).await.unwrap();
        let owner = conn.sender;

        let buyer_signer = dev_signer(1).unwrap();
        let invalid_signer = dev_signer(2).unwrap();
        let (buyer, invalid_buyer) = (buyer_signer.address(), invalid_signer.address());
        fund_accounts(
            &conn.provider,
            &[
                (buyer, parse_ether("100").unwrap()),
                (owner, parse_ether("100").unwrap()),
                (invalid_buyer, parse_ether("1").unwrap()),
            ],
        )
        .await
        .unwrap();

        let connect_as = |signer: PrivateKeySigner| {
            ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect_provider(conn.provider.clone())
        };
        let opts = provider::TxOptions::default();
        let as_buyer = connect_as(buyer_signer);
        let as_invalid = connect_as(invalid_signer);
        assert_eq!(as_buyer.default_signer_address(), buyer);

        let invalid = PokerHandClient::new(deployed.contract, &as_invalid, opts);
        assert!(matches!(
            invalid.mint(U256::ZERO).await,
            Err(ContractError::InsufficientPayment { .. })
        ));

        let initial_owner = conn.provider.get_balance(owner).await.unwrap();
        let initial_buyer = conn.provider.get_balance(buyer).await.unwrap();

        let client = PokerHandClient::new(deployed.contract, &as_buyer, opts);
        let mut gas_cost = U256::ZERO;
        for _ in 0..2 {
            let receipt = client.mint(parse_ether("50").unwrap()).await.unwrap();
            gas_cost += U256::from(receipt.gas_used) * U256::from(receipt.effective_gas_price);
        }

        let hundred = parse_ether("100").unwrap();
        assert_eq!(conn.provider.get_balance(owner).await.unwrap(), initial_owner + hundred);
        assert_eq!(
            conn.provider.get_balance(buyer).await.unwrap(),
            initial_buyer - hundred - gas_cost
        );
        assert_eq!(client.owner_of(U256::ZERO).await.unwrap(), buyer);
        assert_eq!(client.balance_of(buyer).await.unwrap(), U256::from(2));

        let meta = client.token_metadata(U256::ZERO).await.unwrap();
        meta.validate().unwrap();
    }
}
