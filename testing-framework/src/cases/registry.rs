use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Whether calling a method changes contract state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    /// Requires a signed, nonce-bound transaction
    Mutating,
    /// Served by `eth_call`, no nonce and no signature
    ReadOnly,
}

// Entry points of the node manager contract that change state
const NODE_MANAGER_MUTATING: &[&str] = &[
    "createValidator",
    "updateValidator",
    "updateCommission",
    "stake",
    "unStake",
    "withdraw",
    "cancelValidator",
    "withdrawValidator",
    "changeEpoch",
    "withdrawStakeRewards",
    "withdrawCommission",
    "endBlock",
];

// Entry points of the node manager contract that only read state
const NODE_MANAGER_READ_ONLY: &[&str] = &[
    "getGlobalConfig",
    "getCommunityInfo",
    "getCurrentEpochInfo",
    "getEpochInfo",
    "getAllValidators",
    "getValidator",
    "getStakeInfo",
    "getUnlockingInfo",
    "getStakeStartingInfo",
    "getAccumulatedCommission",
    "getValidatorSnapshot",
    "getValidatorAccumulatedRewards",
    "getValidatorOutstandingRewards",
    "getTotalPool",
    "getOutstandingRewards",
    "getStakeRewards",
];

/// Explicit method name -> kind table
///
/// Classification is a pure lookup. A name that was never registered has no
/// kind at all, the packer refuses it instead of guessing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodRegistry {
    methods: IndexMap<String, MethodKind>,
}

impl MethodRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of the node manager contract interface
    pub fn node_manager() -> Self {
        let mut registry = Self::new();
        for name in NODE_MANAGER_MUTATING {
            registry.register(*name, MethodKind::Mutating);
        }
        for name in NODE_MANAGER_READ_ONLY {
            registry.register(*name, MethodKind::ReadOnly);
        }
        registry
    }

    /// Register or re-classify a method, returning the previous kind
    pub fn register(&mut self, name: impl Into<String>, kind: MethodKind) -> Option<MethodKind> {
        self.methods.insert(name.into(), kind)
    }

    pub fn with_mutating(mut self, name: impl Into<String>) -> Self {
        self.register(name, MethodKind::Mutating);
        self
    }

    pub fn with_read_only(mut self, name: impl Into<String>) -> Self {
        self.register(name, MethodKind::ReadOnly);
        self
    }

    pub fn classify(&self, name: &str) -> Option<MethodKind> {
        self.methods.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Registered methods in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, MethodKind)> {
        self.methods.iter().map(|(name, kind)| (name.as_str(), *kind))
    }
}
