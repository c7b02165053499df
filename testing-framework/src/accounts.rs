//! Test actors
//!
//! A sender identity resolves to exactly one address and one signing
//! capability. Development accounts are derived from a seed, a run id and
//! the case index, so every case of every run starts from fresh accounts
//! whose on-chain nonce is 0.

use crate::cases::SigningError;
use std::{collections::HashMap, fmt, sync::Arc};
use zion_common::crypto::{keccak256, Address, CryptoError, Hash, KeyPair, RecoverableSignature};

/// Logical actor that sends actions
pub trait SenderIdentity: Send + Sync + fmt::Debug {
    /// Address that owns the actor's transactions
    fn address(&self) -> Address;

    /// Sign a transaction prehash
    fn sign_hash(&self, hash: &Hash) -> Result<RecoverableSignature, SigningError>;
}

impl SenderIdentity for KeyPair {
    fn address(&self) -> Address {
        KeyPair::address(self)
    }

    fn sign_hash(&self, hash: &Hash) -> Result<RecoverableSignature, SigningError> {
        Ok(KeyPair::sign_hash(self, hash)?)
    }
}

/// Known address without a key: can query, cannot send transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOnly(pub Address);

impl SenderIdentity for WatchOnly {
    fn address(&self) -> Address {
        self.0
    }

    fn sign_hash(&self, _hash: &Hash) -> Result<RecoverableSignature, SigningError> {
        Err(SigningError::KeyUnavailable(self.0))
    }
}

/// Deterministic development key derivation
///
/// key(case, name) = keccak256(seed || case_be || name). A run id replaces
/// the seed with keccak256(seed || 0x00 || run_id).
#[derive(Clone)]
pub struct DevKeyring {
    seed: Vec<u8>,
}

impl DevKeyring {
    pub fn new(seed: impl AsRef<[u8]>) -> Self {
        Self {
            seed: seed.as_ref().to_vec(),
        }
    }

    /// Keyring whose accounts are private to one run of the harness
    pub fn with_run_id(self, run_id: &str) -> Self {
        let mut material = self.seed;
        material.push(0);
        material.extend_from_slice(run_id.as_bytes());
        Self {
            seed: keccak256(&material).as_bytes().to_vec(),
        }
    }

    /// Key of actor `name` within case `case_index`
    pub fn derive(&self, case_index: u64, name: &str) -> Result<KeyPair, CryptoError> {
        let mut material = Vec::with_capacity(self.seed.len() + 8 + name.len());
        material.extend_from_slice(&self.seed);
        material.extend_from_slice(&case_index.to_be_bytes());
        material.extend_from_slice(name.as_bytes());
        KeyPair::from_bytes(keccak256(&material).as_bytes())
    }

    /// Account book for a single case
    pub fn for_case(&self, case_index: u64) -> CaseAccounts {
        CaseAccounts {
            keyring: self.clone(),
            case_index,
            resolved: HashMap::new(),
        }
    }
}

impl fmt::Debug for DevKeyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DevKeyring")
            .field("seed_len", &self.seed.len())
            .finish()
    }
}

/// Named actors of one case, resolved lazily and shared between actions
#[derive(Debug)]
pub struct CaseAccounts {
    keyring: DevKeyring,
    case_index: u64,
    resolved: HashMap<String, Arc<KeyPair>>,
}

impl CaseAccounts {
    pub fn resolve(&mut self, name: &str) -> Result<Arc<KeyPair>, CryptoError> {
        if let Some(key) = self.resolved.get(name) {
            return Ok(key.clone());
        }

        let key = Arc::new(self.keyring.derive(self.case_index, name)?);
        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "Case {}: actor '{}' is {}",
                self.case_index,
                name,
                key.address()
            );
        }
        self.resolved.insert(name.to_string(), key.clone());
        Ok(key)
    }

    /// Actors resolved so far, by name
    pub fn addresses(&self) -> impl Iterator<Item = (&str, Address)> {
        self.resolved
            .iter()
            .map(|(name, key)| (name.as_str(), key.address()))
    }
}
