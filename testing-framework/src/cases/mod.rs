//! Raw (author-facing) and packed (executable) cases
//!
//! ```text
//! RawCase --CasePacker--> Case --CaseRunner--> CaseReport
//!             |  NonceAllocator (one per pack)
//!             |  MethodRegistry (mutating / read-only)
//!             `  Param::encode + SenderIdentity::sign_hash
//! ```

mod error;
mod nonce;
mod packer;
mod registry;

pub use error::{EncodingError, PackingError, SigningError};
pub use nonce::NonceAllocator;
pub use packer::CasePacker;
pub use registry::{MethodKind, MethodRegistry};

use crate::{
    accounts::SenderIdentity, assertions::Assertion, backend::CallRequest, params::Param,
};
use serde::Serialize;
use std::sync::Arc;
use zion_common::{crypto::Address, transaction::SignedTransaction};

/// Metadata shared by a raw action and its packed form, used in reports
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionBase {
    pub index: usize,
    pub label: String,
}

/// One declared contract call
#[derive(Debug, Clone)]
pub struct RawAction {
    pub method: String,
    pub input: Arc<dyn Param>,
    pub should_succeed: bool,
    pub assertions: Vec<Arc<dyn Assertion>>,
    pub sender: Arc<dyn SenderIdentity>,
    pub base: ActionBase,
}

impl RawAction {
    /// Action expected to succeed, without assertions
    pub fn new(
        method: impl Into<String>,
        input: impl Param + 'static,
        sender: Arc<dyn SenderIdentity>,
    ) -> Self {
        let method = method.into();
        Self {
            base: ActionBase {
                index: 0,
                label: method.clone(),
            },
            method,
            input: Arc::new(input),
            should_succeed: true,
            assertions: Vec::new(),
            sender,
        }
    }

    pub fn expect_success(mut self, should_succeed: bool) -> Self {
        self.should_succeed = should_succeed;
        self
    }

    pub fn with_assertion(mut self, assertion: impl Assertion + 'static) -> Self {
        self.assertions.push(Arc::new(assertion));
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.base.label = label.into();
        self
    }
}

/// Ordered list of actions; order decides nonce assignment
#[derive(Debug, Clone, Default)]
pub struct RawCase {
    pub index: u64,
    pub actions: Vec<RawAction>,
}

impl RawCase {
    pub fn new(index: u64) -> Self {
        Self {
            index,
            actions: Vec::new(),
        }
    }

    /// Append an action, numbering it by its position
    pub fn with_action(mut self, mut action: RawAction) -> Self {
        action.base.index = self.actions.len();
        self.actions.push(action);
        self
    }
}

/// Read-only call plus the assertions on its result
#[derive(Debug, Clone)]
pub struct Query {
    pub base: ActionBase,
    pub method: String,
    pub sender: Address,
    pub request: CallRequest,
    pub assertions: Vec<Arc<dyn Assertion>>,
}

/// Signed transaction plus the expected execution status
#[derive(Debug, Clone)]
pub struct SendTx {
    pub base: ActionBase,
    pub method: String,
    pub sender: Address,
    pub tx: SignedTransaction,
    pub should_succeed: bool,
}

/// Packed, executable action
#[derive(Debug, Clone)]
pub enum Action {
    Query(Query),
    SendTx(SendTx),
}

impl Action {
    pub fn base(&self) -> &ActionBase {
        match self {
            Action::Query(query) => &query.base,
            Action::SendTx(send) => &send.base,
        }
    }

    pub fn method(&self) -> &str {
        match self {
            Action::Query(query) => &query.method,
            Action::SendTx(send) => &send.method,
        }
    }

    pub fn sender(&self) -> Address {
        match self {
            Action::Query(query) => query.sender,
            Action::SendTx(send) => send.sender,
        }
    }

    pub fn kind(&self) -> MethodKind {
        match self {
            Action::Query(_) => MethodKind::ReadOnly,
            Action::SendTx(_) => MethodKind::Mutating,
        }
    }

    /// Nonce of a transaction, `None` for queries
    pub fn nonce(&self) -> Option<u64> {
        match self {
            Action::Query(_) => None,
            Action::SendTx(send) => Some(send.tx.nonce()),
        }
    }
}

/// Packed case, consumed by value when run
#[derive(Debug, Clone)]
pub struct Case {
    index: u64,
    actions: Vec<Action>,
}

impl Case {
    pub(crate) fn new(index: u64, actions: Vec<Action>) -> Self {
        Self { index, actions }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn into_actions(self) -> Vec<Action> {
        self.actions
    }

    /// Nonces of the transactions, in dispatch order
    pub fn nonces(&self) -> Vec<Option<u64>> {
        self.actions.iter().map(Action::nonce).collect()
    }
}
