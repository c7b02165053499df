use thiserror::Error;
use zion_common::{
    crypto::{Address, CryptoError},
    transaction::TransactionError,
};

/// Input parameters could not be turned into call data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("Invalid hex input: {0}")]
    InvalidHex(String),
    #[error("Invalid function signature '{0}'")]
    InvalidSignature(String),
    #[error("{0}")]
    Custom(String),
}

/// The sender could not produce a signature
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    #[error("No signing key available for {0}")]
    KeyUnavailable(Address),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

/// Packing a case failed, nothing was produced
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackingError {
    #[error("Unknown method '{0}': not registered as mutating or read-only")]
    UnknownMethod(String),
    #[error("Failed to encode input: {0}")]
    Encoding(#[from] EncodingError),
    #[error("Failed to sign transaction: {0}")]
    Signing(#[from] SigningError),
    #[error("Case {case}, action {index} ({method}): {source}")]
    Action {
        case: u64,
        index: usize,
        method: String,
        #[source]
        source: Box<PackingError>,
    },
}

impl PackingError {
    /// Position of the failing action inside its case, if known
    pub fn action_index(&self) -> Option<usize> {
        match self {
            Self::Action { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Innermost error kind, without the action context
    pub fn kind(&self) -> &PackingError {
        match self {
            Self::Action { source, .. } => source.kind(),
            other => other,
        }
    }
}
