//! Named networks and signing credentials
//!
//! The network table is built from the process environment (a `.env` file is loaded
//! first when present). Without `PRIVATE_KEY`, or with `ENV=test`, only the in-process
//! `hardhat` chain is available and it does not fork.

use std::{collections::BTreeMap, env, fmt};

use alloy::{signers::local::PrivateKeySigner, transports::http::reqwest::Url};
use thiserror::Error;

/// Network used when none is requested.
pub const DEFAULT_NETWORK: &str = "hardhat";

/// Chain id of a plain (non-forking) local development chain.
pub const LOCAL_CHAIN_ID: u64 = 31337;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown network `{name}`, available: {available}")]
    UnknownNetwork { name: String, available: String },

    #[error("invalid PRIVATE_KEY: {0}")]
    InvalidKey(#[from] alloy::signers::local::LocalSignerError),

    #[error("invalid url for network `{network}`: {reason}")]
    InvalidUrl { network: String, reason: String },
}

/// Gas price (or gas limit) policy of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GasPolicy<T> {
    /// Let the node estimate.
    #[default]
    Auto,
    Fixed(T),
}

impl<T: Copy> GasPolicy<T> {
    pub fn fixed(&self) -> Option<T> {
        match self {
            GasPolicy::Auto => None,
            GasPolicy::Fixed(v) => Some(*v),
        }
    }
}

/// Where transactions go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A node reachable over JSON-RPC.
    Http(Url),
    /// A chain spawned for this process, optionally forking a remote one.
    Local { fork: Option<Url> },
}

/// Who signs transactions.
#[derive(Clone)]
pub enum Accounts {
    /// Node-managed accounts, signed by the node itself.
    Remote,
    /// The development accounts of the spawned chain.
    Dev,
    PrivateKey(PrivateKeySigner),
}

impl fmt::Debug for Accounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accounts::Remote => f.write_str("Remote"),
            Accounts::Dev => f.write_str("Dev"),
            Accounts::PrivateKey(signer) => write!(f, "PrivateKey({:#x})", signer.address()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Network {
    pub name: String,
    pub endpoint: Endpoint,
    /// `None` accepts whatever the node reports.
    pub chain_id: Option<u64>,
    pub accounts: Accounts,
    pub gas: GasPolicy<u64>,
    pub gas_price: GasPolicy<u128>,
}

impl Network {
    fn new(name: &str, endpoint: Endpoint, chain_id: Option<u64>, accounts: Accounts) -> Self {
        Self {
            name: name.to_owned(),
            endpoint,
            chain_id,
            accounts,
            gas: GasPolicy::Auto,
            gas_price: GasPolicy::Auto,
        }
    }

    fn with_gas_price(mut self, gas_price: GasPolicy<u128>) -> Self {
        self.gas_price = gas_price;
        self
    }

    /// Plain local chain used by tests.
    pub fn local() -> Self {
        Self::new(
            DEFAULT_NETWORK,
            Endpoint::Local { fork: None },
            Some(LOCAL_CHAIN_ID),
            Accounts::Dev,
        )
    }
}

/// Raw environment inputs, kept separate so the table can be built without touching
/// the process environment.
#[derive(Debug, Clone, Default)]
pub struct Env {
    pub private_key: Option<String>,
    pub test: bool,
    pub alchemy_id: Option<String>,
    pub infura_id: Option<String>,
}

impl Env {
    /// Load `.env` (if any) and read the process environment.
    pub fn load() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded environment file");
        }
        let var = |key: &str| env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            private_key: var("PRIVATE_KEY"),
            test: var("ENV").as_deref() == Some("test"),
            alchemy_id: var("ALCHEMY_ID"),
            infura_id: var("INFURA_ID"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Networks {
    networks: BTreeMap<String, Network>,
}

impl Networks {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::build(&Env::load())
    }

    pub fn build(env: &Env) -> Result<Self, ConfigError> {
        let mut networks = BTreeMap::new();
        let key = match (&env.private_key, env.test) {
            (Some(key), false) => key.parse::<PrivateKeySigner>()?,
            _ => {
                networks.insert(DEFAULT_NETWORK.to_owned(), Network::local());
                return Ok(Self { networks });
            }
        };

        let url = |name: &str, raw: String| {
            Url::parse(&raw).map_err(|err| ConfigError::InvalidUrl {
                network: name.to_owned(),
                reason: err.to_string(),
            })
        };
        let alchemy = env.alchemy_id.clone().unwrap_or_default();
        let infura = env.infura_id.clone().unwrap_or_default();
        let signer = Accounts::PrivateKey(key);
        let remote = |name: &str, raw: &str, chain_id: u64| -> Result<Network, ConfigError> {
            Ok(Network::new(
                name,
                Endpoint::Http(url(name, raw.to_owned())?),
                Some(chain_id),
                signer.clone(),
            ))
        };

        let fork = url(
            DEFAULT_NETWORK,
            format!("https://eth-mainnet.alchemyapi.io/v2/{alchemy}"),
        )?;
        let entries = [
            Network::new(
                DEFAULT_NETWORK,
                Endpoint::Local { fork: Some(fork) },
                Some(1),
                Accounts::Dev,
            ),
            Network::new(
                "ganache",
                Endpoint::Http(url("ganache", "http://127.0.0.1:7545".into())?),
                Some(5777),
                Accounts::Remote,
            ),
            Network::new(
                "hardhat_local",
                Endpoint::Http(url("hardhat_local", "http://127.0.0.1:8545".into())?),
                None,
                signer.clone(),
            )
            .with_gas_price(GasPolicy::Fixed(gwei(250))),
            remote(
                "rinkeby",
                &format!("https://rinkeby.infura.io/v3/{infura}"),
                4,
            )?,
            remote(
                "mainnet",
                &format!("https://mainnet.infura.io/v3/{infura}"),
                1,
            )?,
            remote(
                "bsc_testnet",
                "https://data-seed-prebsc-1-s1.binance.org:8545",
                97,
            )?,
            remote("bsc", "https://bsc-dataseed1.binance.org", 56)?,
            remote("hamsterbox", "https://rpc.hamsterbox.xyz", 5722)?
                .with_gas_price(GasPolicy::Fixed(0)),
        ];
        for network in entries {
            networks.insert(network.name.clone(), network);
        }
        Ok(Self { networks })
    }

    pub fn get(&self, name: &str) -> Result<&Network, ConfigError> {
        self.networks
            .get(name)
            .ok_or_else(|| ConfigError::UnknownNetwork {
                name: name.to_owned(),
                available: self.names().join(", "),
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.networks.keys().map(String::as_str).collect()
    }
}

fn gwei(amount: u64) -> u128 {
    u128::from(amount) * 1_000_000_000
}
