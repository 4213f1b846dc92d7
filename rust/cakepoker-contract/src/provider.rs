//! Helper functions to build Ethereum [providers](https://docs.rs/alloy/latest/alloy/providers/trait.Provider.html)
//! for a configured [`Network`].

use alloy::{
    contract::{CallBuilder, CallDecoder},
    network::{Ethereum, EthereumWallet},
    node_bindings::NodeError,
    primitives::Address,
    providers::{
        DynProvider, Provider, ProviderBuilder, RootProvider, WalletProvider,
        fillers::{FillProvider, JoinFill, WalletFiller},
        utils::JoinedRecommendedFillers,
    },
    signers::local::{LocalSignerError, MnemonicBuilder, PrivateKeySigner, coins_bip39::English},
    transports::{TransportError, http::reqwest::Url},
};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{Accounts, Endpoint, Network};

/// Mnemonic behind the funded development accounts of a local chain.
pub const DEV_MNEMONIC: &str = "test test test test test test test test test test test junk";

pub type HttpProviderWithWallet = FillProvider<
    JoinFill<JoinedRecommendedFillers, WalletFiller<EthereumWallet>>,
    RootProvider,
    Ethereum,
>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Signer(#[from] LocalSignerError),

    #[error("failed to spawn local chain: {0}")]
    Node(#[from] NodeError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("node at {0} exposes no accounts")]
    NoAccounts(Url),

    #[error("network `{network}` expects chain id {expected}, node reports {actual}")]
    ChainIdMismatch {
        network: String,
        expected: u64,
        actual: u64,
    },
}

/// Build a local signer from wallet mnemonic and account index
pub fn build_signer(
    mnemonic: String,
    account_index: u32,
) -> Result<PrivateKeySigner, LocalSignerError> {
    MnemonicBuilder::<English>::default()
        .phrase(mnemonic)
        .index(account_index)?
        .build()
}

/// Development account `index` of a local chain.
pub fn dev_signer(index: u32) -> Result<PrivateKeySigner, LocalSignerError> {
    build_signer(DEV_MNEMONIC.to_owned(), index)
}

/// a handy thin wrapper around wallet builder and provider builder that directly
/// returns an instantiated `Provider` with default fillers with wallet, ready to send tx
pub fn build_provider(signer: PrivateKeySigner, url: Url) -> HttpProviderWithWallet {
    let wallet = EthereumWallet::from(signer);
    ProviderBuilder::new().wallet(wallet).connect_http(url)
}

/// Per-transaction settings derived from the network's sender and gas policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct TxOptions {
    pub from: Option<Address>,
    pub gas: Option<u64>,
    pub gas_price: Option<u128>,
}

impl TxOptions {
    pub fn apply<P: Provider, D: CallDecoder>(&self, mut tx: CallBuilder<P, D>) -> CallBuilder<P, D> {
        if let Some(from) = self.from {
            tx = tx.from(from);
        }
        if let Some(gas) = self.gas {
            tx = tx.gas(gas);
        }
        if let Some(gas_price) = self.gas_price {
            tx = tx.gas_price(gas_price);
        }
        tx
    }
}

/// A provider bound to a network, together with the account that sends transactions.
/// A spawned local chain lives as long as the provider does.
#[derive(Clone)]
pub struct Connection {
    pub provider: DynProvider,
    pub sender: Address,
    pub chain_id: u64,
    pub network: Network,
}

impl Connection {
    pub fn tx_options(&self) -> TxOptions {
        TxOptions {
            from: Some(self.sender),
            gas: self.network.gas.fixed(),
            gas_price: self.network.gas_price.fixed(),
        }
    }
}

/// Connect to `network`, resolve its sending account and check the chain id.
pub async fn connect(network: &Network) -> Result<Connection, ProviderError> {
    let (provider, sender) = match (&network.endpoint, &network.accounts) {
        (Endpoint::Local { fork }, _) => {
            let chain_id = network.chain_id;
            let fork = fork.clone();
            let provider = ProviderBuilder::new().connect_anvil_with_wallet_and_config(|anvil| {
                let anvil = match chain_id {
                    Some(id) => anvil.chain_id(id),
                    None => anvil,
                };
                match fork {
                    Some(url) => anvil.fork(url.to_string()),
                    None => anvil,
                }
            })?;
            let sender = provider.default_signer_address();
            (provider.erased(), sender)
        }
        (Endpoint::Http(url), Accounts::PrivateKey(signer)) => {
            let sender = signer.address();
            (build_provider(signer.clone(), url.clone()).erased(), sender)
        }
        (Endpoint::Http(url), Accounts::Dev) => {
            let signer = dev_signer(0)?;
            let sender = signer.address();
            (build_provider(signer, url.clone()).erased(), sender)
        }
        (Endpoint::Http(url), Accounts::Remote) => {
            let provider = ProviderBuilder::new().connect_http(url.clone());
            let sender = provider
                .get_accounts()
                .await?
                .first()
                .copied()
                .ok_or_else(|| ProviderError::NoAccounts(url.clone()))?;
            (provider.erased(), sender)
        }
    };

    let chain_id = provider.get_chain_id().await?;
    if let Some(expected) = network.chain_id {
        if expected != chain_id {
            warn!(network = %network.name, expected, actual = chain_id, "chain id mismatch");
            return Err(ProviderError::ChainIdMismatch {
                network: network.name.clone(),
                expected,
                actual: chain_id,
            });
        }
    }
    info!(network = %network.name, chain_id, %sender, "connected");

    Ok(Connection {
        provider,
        sender,
        chain_id,
        network: network.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GasPolicy, LOCAL_CHAIN_ID};
    use alloy::node_bindings::Anvil;

    #[test]
    fn test_dev_signer() {
        // first account of the standard development mnemonic
        let signer = dev_signer(0).unwrap();
        assert_eq!(
            signer.address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
                .parse::<Address>()
                .unwrap()
        );
        assert_ne!(dev_signer(1).unwrap().address(), signer.address());
    }

    #[tokio::test]
    #[ignore = "requires an anvil binary on PATH"]
    async fn test_connect_local_chain() {
        let mut network = Network::local();
        network.gas_price = GasPolicy::Fixed(0);
        let conn = connect(&network).await.unwrap();
        assert_eq!(conn.chain_id, LOCAL_CHAIN_ID);
        assert_eq!(conn.sender, dev_signer(0).unwrap().address());

        let opts = conn.tx_options();
        assert_eq!(opts.from, Some(conn.sender));
        assert_eq!(opts.gas_price, Some(0));
        assert_eq!(opts.gas, None);
    }

    #[tokio::test]
    #[ignore = "requires an anvil binary on PATH"]
    async fn test_chain_id_mismatch() {
        let anvil = Anvil::new().spawn();
        let mut network = Network::local();
        network.name = "mainnet".into();
        network.endpoint = Endpoint::Http(anvil.endpoint_url());
        network.chain_id = Some(1);

        match connect(&network).await {
            Err(ProviderError::ChainIdMismatch {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 1);
                assert_eq!(actual, LOCAL_CHAIN_ID);
            }
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("chain id mismatch not detected"),
        }

        network.chain_id = None;
        let conn = connect(&network).await.unwrap();
        assert_eq!(conn.chain_id, LOCAL_CHAIN_ID);
    }
}
