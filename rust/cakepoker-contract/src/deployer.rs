//! Contract deployment: plain, library-linked and behind an ERC-1967 proxy
use alloy::{
    contract::RawCallBuilder,
    primitives::{Address, B256, Bytes, U256, address, b256},
    providers::Provider,
    sol_types::{SolCall, SolValue},
};
use thiserror::Error;

use crate::{
    IBondCake, IUUPSUpgradeable,
    artifact::{Artifact, ArtifactError, Artifacts},
    provider::TxOptions,
};

/// Source and contract name of each artifact the deploy scripts use.
pub const HELPER: (&str, &str) = ("contracts/Helper.sol", "Helper");
pub const POKER_HAND: (&str, &str) = ("contracts/PokerHand.sol", "PokerHand");
pub const BOND_CAKE: (&str, &str) = ("contracts/BondCake.sol", "BondCake");
pub const ERC1967_PROXY: (&str, &str) = (
    "@openzeppelin/contracts/proxy/ERC1967/ERC1967Proxy.sol",
    "ERC1967Proxy",
);

/// Native Cake token on BSC testnet.
pub const BSC_TESTNET_CAKE: Address = address!("0xFa60D973F7642B748046464e165A65B7323b0DEE");
/// CakePool on BSC testnet.
pub const BSC_TESTNET_CAKE_POOL: Address = address!("0x683433ba14e8F26774D43D3E90DA6Dd7a22044Fe");

/// `bytes32(uint256(keccak256("eip1967.proxy.implementation")) - 1)`
pub const IMPLEMENTATION_SLOT: B256 =
    b256!("0x360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");

#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Contract(#[from] alloy::contract::Error),

    #[error(transparent)]
    Transport(#[from] alloy::transports::TransportError),

    #[error(transparent)]
    Pending(#[from] alloy::providers::PendingTransactionError),

    #[error("{0} reverted")]
    Reverted(String),
}

/// Deploy a contract (with logging)
pub(crate) async fn deploy<P: Provider>(
    name: &str,
    tx: RawCallBuilder<P>,
) -> Result<Address, DeployError> {
    tracing::info!("deploying {name}");
    let pending_tx = tx.send().await?;
    let tx_hash = *pending_tx.tx_hash();
    tracing::info!(%tx_hash, "waiting for tx to be mined");

    let receipt = pending_tx.get_receipt().await?;
    tracing::info!(%receipt.gas_used, %tx_hash, "tx mined");
    if !receipt.status() {
        return Err(DeployError::Reverted(name.to_owned()));
    }
    let addr = receipt
        .contract_address
        .ok_or(alloy::contract::Error::ContractNotDeployed)?;

    tracing::info!("deployed {name} at {addr:#x}");
    Ok(addr)
}

/// Submit the creation transaction of `artifact`, linked against `libraries`.
pub async fn deploy_artifact<P: Provider>(
    provider: &P,
    opts: &TxOptions,
    artifact: &Artifact,
    libraries: &[(&str, Address)],
    constructor_args: &[u8],
) -> Result<Address, DeployError> {
    let code = artifact.creation_code(libraries, constructor_args)?;
    let tx = opts.apply(RawCallBuilder::new_raw_deploy(provider, code));
    deploy(&artifact.contract_name, tx).await
}

/// Addresses produced by a library-linked deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkedDeployment {
    pub library: Address,
    pub contract: Address,
}

/// Deploy `library`, then `dependent` with the library's address linked in.
///
/// The dependent creation is only submitted once the library receipt is in.
pub async fn deploy_linked<P: Provider>(
    provider: &P,
    opts: &TxOptions,
    library: &Artifact,
    dependent: &Artifact,
) -> Result<LinkedDeployment, DeployError> {
    let library_addr = deploy_artifact(provider, opts, library, &[], &[]).await?;
    let fq_name = library.fully_qualified_name();
    let contract = deploy_artifact(
        provider,
        opts,
        dependent,
        &[(fq_name.as_str(), library_addr)],
        &[],
    )
    .await?;
    Ok(LinkedDeployment {
        library: library_addr,
        contract,
    })
}

/// Addresses produced by a proxy deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyDeployment {
    pub implementation: Address,
    pub proxy: Address,
}

/// Deploy `implementation`, then an ERC-1967 proxy pointing at it that runs `init_data`
/// in its constructor.
pub async fn deploy_proxy<P: Provider>(
    provider: &P,
    opts: &TxOptions,
    implementation: &Artifact,
    proxy: &Artifact,
    init_data: Bytes,
) -> Result<ProxyDeployment, DeployError> {
    // first deploy the implementation contract
    let impl_addr = deploy_artifact(provider, opts, implementation, &[], &[]).await?;

    // then deploy the proxy, point to the implementation contract and initialize it
    let args = (impl_addr, init_data).abi_encode_params();
    let proxy_addr = deploy_artifact(provider, opts, proxy, &[], &args).await?;
    tracing::info!(
        "deployed {}Proxy at {proxy_addr:#x}",
        implementation.contract_name
    );
    Ok(ProxyDeployment {
        implementation: impl_addr,
        proxy: proxy_addr,
    })
}

/// Read the implementation address stored in an ERC-1967 proxy.
pub async fn implementation_of<P: Provider>(
    provider: &P,
    proxy: Address,
) -> Result<Address, DeployError> {
    let word = provider
        .get_storage_at(proxy, slot_value(IMPLEMENTATION_SLOT))
        .await?;
    Ok(Address::from_word(B256::from(word.to_be_bytes::<32>())))
}

/// Deploy a new implementation from `artifact` and switch the UUPS `proxy` to it.
pub async fn upgrade_proxy<P: Provider>(
    provider: &P,
    opts: &TxOptions,
    proxy: Address,
    artifact: &Artifact,
) -> Result<Address, DeployError> {
    let new_impl = deploy_artifact(provider, opts, artifact, &[], &[]).await?;
    let proxy_contract = IUUPSUpgradeable::new(proxy, provider);
    let call = proxy_contract.upgradeToAndCall(new_impl, Bytes::new());
    let receipt = opts.apply(call).send().await?.get_receipt().await?;
    if !receipt.status() {
        return Err(DeployError::Reverted("upgradeToAndCall".to_owned()));
    }
    tracing::info!(%proxy, %new_impl, "upgraded proxy");
    Ok(new_impl)
}

/// Deploy the Helper library and PokerHand linked against it.
pub async fn deploy_poker_hand<P: Provider>(
    provider: &P,
    opts: &TxOptions,
    artifacts: &Artifacts,
) -> Result<LinkedDeployment, DeployError> {
    let helper = artifacts.load(HELPER.0, HELPER.1)?;
    let poker_hand = artifacts.load(POKER_HAND.0, POKER_HAND.1)?;
    deploy_linked(provider, opts, &helper, &poker_hand).await
}

/// Deploy BondCake behind a proxy, initialized with the Cake token and CakePool.
pub async fn deploy_bond_cake<P: Provider>(
    provider: &P,
    opts: &TxOptions,
    artifacts: &Artifacts,
    cake: Address,
    cake_pool: Address,
) -> Result<ProxyDeployment, DeployError> {
    let bond_cake = artifacts.load(BOND_CAKE.0, BOND_CAKE.1)?;
    let proxy = artifacts.load(ERC1967_PROXY.0, ERC1967_PROXY.1)?;
    let init_data = IBondCake::initializeCall {
        cake,
        cakePool: cake_pool,
    }
    .abi_encode();
    deploy_proxy(provider, opts, &bond_cake, &proxy, init_data.into()).await
}

fn slot_value(slot: B256) -> U256 {
    U256::from_be_bytes(slot.0)
}
