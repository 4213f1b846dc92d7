//! Error types shared by the local contract model and the on-chain client

use alloy::primitives::{Address, B256, U256};
use thiserror::Error;

/// Revert reason emitted by PokerHand when the attached payment is below the fee.
pub const BELOW_MINT_FEE: &str = "Error: below mint fee";

/// Failures observable through the minting contract interface.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("Error: below mint fee")]
    InsufficientPayment {
        paid: U256,
        /// Known for the local model, not reported by a chain revert.
        fee: Option<U256>,
    },

    #[error("account {account} holds {balance} wei, cannot attach {value}")]
    InsufficientFunds {
        account: Address,
        balance: U256,
        value: U256,
    },

    #[error("token {0} does not exist")]
    NotFound(U256),

    #[error("crediting {0} would overflow its balance")]
    BalanceOverflow(Address),

    #[error("transaction {0} reverted")]
    Reverted(B256),

    #[error(transparent)]
    Call(#[from] alloy::contract::Error),

    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

/// Failures while decoding or checking a token metadata document.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("token uri carries no payload")]
    EmptyUri,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid metadata json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("metadata field `{0}` is empty")]
    EmptyField(&'static str),

    #[error("expected {expected} attributes, found {found}")]
    AttributeCount { expected: usize, found: usize },
}
