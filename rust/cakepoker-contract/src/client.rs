//! Client for a deployed PokerHand contract
//!
//! Mirrors [`MintingContract`](crate::minting::MintingContract): reverts are mapped onto
//! the same [`ContractError`] variants so behavioral assertions read the same against
//! the model and against a chain.

use alloy::{
    contract::Error as CallError,
    primitives::{Address, U256},
    providers::Provider,
    rpc::types::TransactionReceipt,
    sol_types::{SolError, decode_revert_reason},
};

use crate::{
    IPokerHand::{self, ERC721NonexistentToken, IPokerHandInstance},
    error::{BELOW_MINT_FEE, ContractError},
    metadata::TokenMetadata,
    provider::TxOptions,
};

/// Revert reasons of OpenZeppelin 4.x ERC-721 for an unknown token.
const NONEXISTENT_TOKEN_REASONS: [&str; 2] = ["invalid token ID", "nonexistent token"];

pub struct PokerHandClient<P> {
    contract: IPokerHandInstance<P>,
    opts: TxOptions,
}

impl<P: Provider> PokerHandClient<P> {
    pub fn new(address: Address, provider: P, opts: TxOptions) -> Self {
        Self {
            contract: IPokerHand::new(address, provider),
            opts,
        }
    }

    pub fn address(&self) -> Address {
        *self.contract.address()
    }

    /// Mint one token to the sender, attaching `value` wei.
    pub async fn mint(&self, value: U256) -> Result<TransactionReceipt, ContractError> {
        let call = self.opts.apply(self.contract.mint().value(value));
        let pending = call.send().await.map_err(|err| classify(err, Call::Mint(value)))?;
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|err| classify(err.into(), Call::Mint(value)))?;
        if !receipt.status() {
            tracing::warn!(tx_hash = %receipt.transaction_hash, %value, "mint reverted");
            return Err(ContractError::Reverted(receipt.transaction_hash));
        }
        tracing::info!(tx_hash = %receipt.transaction_hash, %value, "minted");
        Ok(receipt)
    }

    pub async fn owner_of(&self, token_id: U256) -> Result<Address, ContractError> {
        self.contract
            .ownerOf(token_id)
            .call()
            .await
            .map_err(|err| classify(err, Call::Token(token_id)))
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256, ContractError> {
        self.contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(|err| classify(err, Call::Other))
    }

    pub async fn token_uri(&self, token_id: U256) -> Result<String, ContractError> {
        self.contract
            .tokenURI(token_id)
            .call()
            .await
            .map_err(|err| classify(err, Call::Token(token_id)))
    }

    /// Fetch and decode the metadata document of `token_id`.
    pub async fn token_metadata(&self, token_id: U256) -> Result<TokenMetadata, ContractError> {
        let uri = self.token_uri(token_id).await?;
        Ok(TokenMetadata::from_data_uri(&uri)?)
    }
}

#[derive(Debug, Clone, Copy)]
enum Call {
    Mint(U256),
    Token(U256),
    Other,
}

/// Map a failed call onto the contract's error taxonomy.
fn classify(err: CallError, call: Call) -> ContractError {
    let revert = err.as_revert_data();
    let reason = revert
        .as_ref()
        .and_then(|data| decode_revert_reason(data))
        .unwrap_or_else(|| err.to_string());

    if reason.contains(BELOW_MINT_FEE) {
        let paid = match call {
            Call::Mint(value) => value,
            _ => U256::ZERO,
        };
        return ContractError::InsufficientPayment { paid, fee: None };
    }
    if let Call::Token(token_id) = call {
        let custom = revert
            .as_ref()
            .is_some_and(|data| ERC721NonexistentToken::abi_decode(data).is_ok());
        if custom || NONEXISTENT_TOKEN_REASONS.iter().any(|r| reason.contains(r)) {
            return ContractError::NotFound(token_id);
        }
    }
    ContractError::Call(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Network, deployer, provider::connect};
    use alloy::{
        contract::RawCallBuilder,
        hex,
        primitives::Bytes,
        rpc::json_rpc::ErrorPayload,
        sol_types::Revert,
        transports::TransportError,
    };

    fn revert(reason: &str) -> Vec<u8> {
        Revert {
            reason: reason.into(),
        }
        .abi_encode()
    }

    fn reverted(data: Vec<u8>) -> CallError {
        let payload = ErrorPayload {
            code: 3,
            message: "execution reverted".into(),
            data: Some(
                serde_json::value::to_raw_value(&Bytes::from(data)).unwrap(),
            ),
        };
        CallError::TransportError(TransportError::ErrorResp(payload))
    }

    #[test]
    fn test_classify_below_fee() {
        let data = revert(BELOW_MINT_FEE);
        assert!(matches!(
            classify(reverted(data), Call::Mint(U256::from(1))),
            ContractError::InsufficientPayment { paid, fee: None } if paid == U256::from(1)
        ));
    }

    #[test]
    fn test_classify_nonexistent_token() {
        let id = U256::from(9);
        let custom = ERC721NonexistentToken { tokenId: id }.abi_encode();
        assert!(matches!(
            classify(reverted(custom), Call::Token(id)),
            ContractError::NotFound(t) if t == id
        ));

        let legacy = revert("ERC721: invalid token ID");
        assert!(matches!(
            classify(reverted(legacy), Call::Token(id)),
            ContractError::NotFound(_)
        ));
    }

    #[test]
    fn test_classify_other() {
        let data = revert("Ownable: caller is not the owner");
        assert!(matches!(
            classify(reverted(data), Call::Token(U256::ZERO)),
            ContractError::Call(_)
        ));
    }

    /// Deploys runtime code `PUSH1 0 PUSH1 0 REVERT`: every call reverts.
    const ALWAYS_REVERTS_INIT: &str = "0x6460006000fd6000526005601bf3";

    #[tokio::test]
    #[ignore = "requires an anvil binary on PATH"]
    async fn test_reverted_mint_is_an_error() {
        let conn = connect(&Network::local()).await.unwrap();
        let code = Bytes::from(hex::decode(ALWAYS_REVERTS_INIT).unwrap());
        let tx = RawCallBuilder::new_raw_deploy(&conn.provider, code);
        let address = deployer::deploy("AlwaysReverts", tx).await.unwrap();

        // a fixed gas limit skips estimation, so the mint is mined with failed status
        let opts = TxOptions {
            gas: Some(100_000),
            ..conn.tx_options()
        };
        let client = PokerHandClient::new(address, &conn.provider, opts);
        assert!(matches!(
            client.mint(U256::ZERO).await,
            Err(ContractError::Reverted(_))
        ));
        // the mint was mined: deployment plus mint
        let nonce = conn
            .provider
            .get_transaction_count(conn.sender)
            .await
            .unwrap();
        assert_eq!(nonce, 2);
    }
}
