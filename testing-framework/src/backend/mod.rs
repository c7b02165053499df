// File: testing-framework/src/backend/mod.rs
//
// Node backends
//
// The runner only talks to the node through the `Backend` trait: a JSON-RPC
// implementation for real nodes and an in-memory one for tests.

pub mod memory;
pub mod rpc;

pub use memory::InMemoryBackend;
pub use rpc::JsonRpcBackend;

use anyhow::Result;
use async_trait::async_trait;
use zion_common::{
    crypto::{Address, TxHash},
    transaction::SignedTransaction,
};

/// Read-only contract call (`eth_call`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub data: Vec<u8>,
}

/// Result of a read-only call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// Call returned normally with these bytes
    Returned(Vec<u8>),
    /// Call reverted, with the node's reason
    Reverted(String),
}

/// Inclusion result of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    pub hash: TxHash,
    pub success: bool,
    pub block_number: Option<u64>,
    pub gas_used: Option<u64>,
}

/// Node the packed actions are dispatched to
///
/// Errors returned here are transport or node-rejection errors. A reverted
/// call or a failed transaction is not an error, it is reported through
/// `CallOutcome` / `TxOutcome` and judged by the runner.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Execute a read-only call against the latest state
    ///
    /// # Errors
    ///
    /// Returns an error if the node is unreachable or the request times out.
    async fn call(&self, request: &CallRequest) -> Result<CallOutcome>;

    /// Submit a signed transaction and wait until it is included
    ///
    /// # Errors
    ///
    /// Returns an error if the node rejects the transaction (bad nonce,
    /// bad signature) or no receipt shows up before the timeout.
    async fn submit(&self, tx: &SignedTransaction) -> Result<TxOutcome>;

    /// Next nonce the node expects from `address`, pending transactions included
    async fn pending_nonce(&self, address: &Address) -> Result<u64>;
}
