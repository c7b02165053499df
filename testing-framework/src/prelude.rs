//! Commonly used types, re-exported for `use zion_testing_framework::prelude::*`

pub use crate::accounts::{DevKeyring, SenderIdentity, WatchOnly};
pub use crate::assertions::{Assertion, CompareOp, ReturnExpect};
pub use crate::backend::{
    Backend, CallOutcome, CallRequest, InMemoryBackend, JsonRpcBackend, TxOutcome,
};
pub use crate::cases::{
    Action, ActionBase, Case, CasePacker, EncodingError, MethodKind, MethodRegistry,
    NonceAllocator, PackingError, Query, RawAction, RawCase, SendTx, SigningError,
};
pub use crate::config::{HarnessConfig, NetworkConfig, TransportConfig};
pub use crate::funding::Funder;
pub use crate::params::{HexParam, Param, SelectorParam};
pub use crate::scenarios::{
    load_case_file, parse_case_file, ActionReport, CaseReport, CaseRunner, Outcome,
};
pub use zion_common::crypto::{Address, KeyPair};
