use thiserror::Error;

/// Errors that can occur during cryptographic operations
///
/// Every fallible operation of the crypto module reports through this type
/// so callers never have to unwrap key or signature parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Invalid hexadecimal string format
    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    /// Hash has invalid length
    #[error("Invalid hash length: {len} bytes, expected: {expected} bytes")]
    InvalidHashLength { len: usize, expected: usize },

    /// Address has invalid length
    #[error("Invalid address length: {len} bytes, expected: {expected} bytes")]
    InvalidAddressLength { len: usize, expected: usize },

    /// Secret key bytes are not a valid secp256k1 scalar
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// Signature bytes or recovery id are malformed
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Signing the prehash failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Public key recovery from a signature failed
    #[error("Recovery failed: {0}")]
    RecoveryFailed(String),
}
