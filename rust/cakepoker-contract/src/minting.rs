//! In-memory model of the PokerHand minting contract
//!
//! The contract is a state transition over two tables: native balances of accounts and
//! the token ownership table. Commands mutate both atomically, queries never mutate.
//! Behavioral tests drive this model exactly as they would drive a deployed instance.

use std::collections::HashMap;

use alloy::primitives::{Address, U256, utils::parse_ether};

use crate::{cards::Hand, error::ContractError};

pub type TokenId = U256;

/// Native-currency balances by account.
#[derive(Debug, Default, Clone)]
pub struct Ledger {
    balances: HashMap<Address, U256>,
}

impl Ledger {
    pub fn balance(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    pub fn set_balance(&mut self, account: Address, amount: U256) {
        self.balances.insert(account, amount);
    }

    /// Move `amount` from `from` to `to`. Both balances are checked before either changes.
    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), ContractError> {
        let from_balance = self.balance(from);
        let debited = from_balance
            .checked_sub(amount)
            .ok_or(ContractError::InsufficientFunds {
                account: from,
                balance: from_balance,
                value: amount,
            })?;
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance(to)
            .checked_add(amount)
            .ok_or(ContractError::BalanceOverflow(to))?;
        self.balances.insert(from, debited);
        self.balances.insert(to, credited);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Mint { caller: Address, value: U256 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Minted { token_id: TokenId, owner: Address },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    OwnerOf(TokenId),
    BalanceOf(Address),
    TokenUri(TokenId),
    TotalSupply,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Owner(Address),
    Count(U256),
    Uri(String),
}

#[derive(Debug, Clone)]
pub struct MintingContract {
    owner: Address,
    fee: U256,
    accounts: Ledger,
    owners: Vec<Address>,
    counts: HashMap<Address, U256>,
}

impl MintingContract {
    /// Mint fee charged by the deployed PokerHand contract.
    pub fn default_fee() -> U256 {
        parse_ether("50").unwrap_or_default()
    }

    /// A contract owned by `owner`, who also receives every mint fee.
    pub fn new(owner: Address, fee: U256) -> Self {
        Self {
            owner,
            fee,
            accounts: Ledger::default(),
            owners: Vec::new(),
            counts: HashMap::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn fee(&self) -> U256 {
        self.fee
    }

    pub fn balance(&self, account: Address) -> U256 {
        self.accounts.balance(account)
    }

    pub fn set_balance(&mut self, account: Address, amount: U256) {
        self.accounts.set_balance(account, amount);
    }

    /// Mint the next token to `caller`, charging exactly the fee. Any excess stays with the caller.
    pub fn mint(&mut self, caller: Address, value: U256) -> Result<TokenId, ContractError> {
        if value < self.fee {
            return Err(ContractError::InsufficientPayment {
                paid: value,
                fee: Some(self.fee),
            });
        }
        let balance = self.accounts.balance(caller);
        if value > balance {
            return Err(ContractError::InsufficientFunds {
                account: caller,
                balance,
                value,
            });
        }

        let token_id = U256::from(self.owners.len());
        self.accounts.transfer(caller, self.owner, self.fee)?;
        self.owners.push(caller);
        *self.counts.entry(caller).or_default() += U256::from(1);
        tracing::debug!(%token_id, %caller, %value, "minted");
        Ok(token_id)
    }

    pub fn owner_of(&self, token_id: TokenId) -> Result<Address, ContractError> {
        usize::try_from(token_id)
            .ok()
            .and_then(|idx| self.owners.get(idx))
            .copied()
            .ok_or(ContractError::NotFound(token_id))
    }

    pub fn balance_of(&self, owner: Address) -> U256 {
        self.counts.get(&owner).copied().unwrap_or_default()
    }

    pub fn total_supply(&self) -> U256 {
        U256::from(self.owners.len())
    }

    pub fn token_uri(&self, token_id: TokenId) -> Result<String, ContractError> {
        let minter = self.owner_of(token_id)?;
        let uri = Hand::deal(token_id, minter)
            .metadata(token_id)
            .to_data_uri()?;
        Ok(uri)
    }

    pub fn execute(&mut self, cmd: Command) -> Result<Outcome, ContractError> {
        match cmd {
            Command::Mint { caller, value } => {
                let token_id = self.mint(caller, value)?;
                Ok(Outcome::Minted {
                    token_id,
                    owner: caller,
                })
            }
        }
    }

    pub fn query(&self, query: Query) -> Result<Answer, ContractError> {
        Ok(match query {
            Query::OwnerOf(id) => Answer::Owner(self.owner_of(id)?),
            Query::BalanceOf(owner) => Answer::Count(self.balance_of(owner)),
            Query::TokenUri(id) => Answer::Uri(self.token_uri(id)?),
            Query::TotalSupply => Answer::Count(self.total_supply()),
        })
    }
}
