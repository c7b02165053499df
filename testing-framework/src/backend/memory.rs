//! In-memory node for tests
//!
//! Behaves like a node as far as the runner can tell: it checks the chain
//! id, recovers the sender from the signature and enforces the sender's
//! nonce sequence. Call results and failing transactions are programmed by
//! call data prefix. Balances are tracked for every account; with balance
//! checks on, a sender must hold `gas_limit * gas_price + value` up front.

use super::{Backend, CallOutcome, CallRequest, TxOutcome};
use crate::config::NetworkConfig;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use zion_common::{crypto::Address, transaction::SignedTransaction};

// Every transaction is charged as a plain transfer
const GAS_USED: u64 = 21_000;

#[derive(Default)]
struct MemoryState {
    nonces: HashMap<Address, u64>,
    balances: HashMap<Address, u128>,
    submitted: Vec<SignedTransaction>,
    calls: Vec<CallRequest>,
    height: u64,
}

pub struct InMemoryBackend {
    chain_id: u64,
    responses: Vec<(Vec<u8>, CallOutcome)>,
    failing: Vec<Vec<u8>>,
    check_funds: bool,
    state: Mutex<MemoryState>,
}

impl InMemoryBackend {
    pub fn new(network: &NetworkConfig) -> Self {
        Self {
            chain_id: network.chain_id,
            responses: Vec::new(),
            failing: Vec::new(),
            check_funds: false,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Genesis balance of `address`
    pub fn with_balance(mut self, address: Address, amount: u128) -> Self {
        self.state.get_mut().balances.insert(address, amount);
        self
    }

    /// Reject transactions whose sender cannot pay for them
    pub fn with_balance_checks(mut self) -> Self {
        self.check_funds = true;
        self
    }

    /// Calls whose data starts with `prefix` return `output`
    pub fn with_response(mut self, prefix: impl Into<Vec<u8>>, output: impl Into<Vec<u8>>) -> Self {
        self.responses
            .push((prefix.into(), CallOutcome::Returned(output.into())));
        self
    }

    /// Calls whose data starts with `prefix` revert
    pub fn with_revert(mut self, prefix: impl Into<Vec<u8>>, reason: impl Into<String>) -> Self {
        self.responses
            .push((prefix.into(), CallOutcome::Reverted(reason.into())));
        self
    }

    /// Transactions whose data starts with `prefix` are included but fail
    pub fn with_failing(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.failing.push(prefix.into());
        self
    }

    /// Transactions accepted so far, in inclusion order
    pub fn submitted(&self) -> Vec<SignedTransaction> {
        self.state.lock().submitted.clone()
    }

    /// Calls served so far
    pub fn calls(&self) -> Vec<CallRequest> {
        self.state.lock().calls.clone()
    }

    /// Next nonce the node expects from `sender`
    pub fn nonce(&self, sender: &Address) -> u64 {
        self.state.lock().nonces.get(sender).copied().unwrap_or(0)
    }

    pub fn balance(&self, address: &Address) -> u128 {
        self.state.lock().balances.get(address).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn call(&self, request: &CallRequest) -> Result<CallOutcome> {
        self.state.lock().calls.push(request.clone());
        let outcome = self
            .responses
            .iter()
            .find(|(prefix, _)| request.data.starts_with(prefix))
            .map(|(_, outcome)| outcome.clone())
            .unwrap_or_else(|| CallOutcome::Reverted("no response programmed".to_string()));
        Ok(outcome)
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<TxOutcome> {
        if tx.chain_id() != self.chain_id {
            bail!(
                "Invalid chain id {}, expected {}",
                tx.chain_id(),
                self.chain_id
            );
        }
        let sender = tx
            .recover_sender()
            .context("Invalid transaction signature")?;

        let mut state = self.state.lock();
        let expected = state.nonces.get(&sender).copied().unwrap_or(0);
        if tx.nonce() != expected {
            bail!(
                "Invalid nonce for {}: got {}, expected {}",
                sender,
                tx.nonce(),
                expected
            );
        }

        let body = tx.tx();
        let balance = state.balances.get(&sender).copied().unwrap_or(0);
        let upfront = u128::from(body.gas_limit)
            .checked_mul(body.gas_price)
            .and_then(|gas| gas.checked_add(body.value))
            .unwrap_or(u128::MAX);
        if self.check_funds && upfront > balance {
            bail!("Insufficient funds for {}: balance {}, need {}", sender, balance, upfront);
        }

        let success = !self.failing.iter().any(|prefix| body.data.starts_with(prefix));
        let fee = u128::from(GAS_USED).saturating_mul(body.gas_price);
        let spent = if success {
            fee.saturating_add(body.value)
        } else {
            fee
        };
        state.balances.insert(sender, balance.saturating_sub(spent));
        if success && body.value > 0 {
            let credited = state.balances.entry(body.to).or_insert(0);
            *credited = credited.saturating_add(body.value);
        }

        // Failed execution still consumes the nonce
        state.nonces.insert(sender, expected + 1);
        state.height += 1;
        state.submitted.push(tx.clone());

        Ok(TxOutcome {
            hash: *tx.hash(),
            success,
            block_number: Some(state.height),
            gas_used: Some(GAS_USED),
        })
    }

    async fn pending_nonce(&self, address: &Address) -> Result<u64> {
        Ok(self.nonce(address))
    }
}
