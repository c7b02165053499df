use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{keccak256, Address, CryptoError, Hash, RecoverableSignature, TxHash};

mod encoding;


#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Chain id {0} is too large for an EIP-155 signature")]
    ChainIdOverflow(u64),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Pre-EIP-1559 transaction with a fixed gas price
///
/// Every contract call the harness sends has this shape: no fee market
/// estimation, the gas values come from configuration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: Address,
    pub value: u128,
    #[serde(with = "hex::serde")]
    pub data: Vec<u8>,
}

impl LegacyTransaction {
    /// Hash signed over under EIP-155 for `chain_id`
    pub fn signing_hash(&self, chain_id: u64) -> Hash {
        keccak256(&self.encode_for_signing(chain_id))
    }

    /// Attach a signature made over `signing_hash(chain_id)`
    pub fn into_signed(
        self,
        chain_id: u64,
        signature: RecoverableSignature,
    ) -> Result<SignedTransaction, TransactionError> {
        // v = recovery_id + chain_id * 2 + 35
        let v = chain_id
            .checked_mul(2)
            .and_then(|v| v.checked_add(35 + signature.recovery_id as u64))
            .ok_or(TransactionError::ChainIdOverflow(chain_id))?;

        let raw = self.encode_signed(v, &signature);
        let hash = keccak256(&raw);
        Ok(SignedTransaction {
            tx: self,
            chain_id,
            v,
            signature,
            hash,
            raw,
        })
    }
}

/// Signed, nonce-bound transaction ready for `eth_sendRawTransaction`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    tx: LegacyTransaction,
    chain_id: u64,
    v: u64,
    signature: RecoverableSignature,
    hash: TxHash,
    raw: Vec<u8>,
}

impl SignedTransaction {
    pub fn tx(&self) -> &LegacyTransaction {
        &self.tx
    }

    pub fn nonce(&self) -> u64 {
        self.tx.nonce
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn v(&self) -> u64 {
        self.v
    }

    pub fn signature(&self) -> &RecoverableSignature {
        &self.signature
    }

    pub fn hash(&self) -> &TxHash {
        &self.hash
    }

    /// RLP encoding of the signed transaction
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn raw_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.raw))
    }

    /// Recover the sender address from the signature
    pub fn recover_sender(&self) -> Result<Address, TransactionError> {
        let hash = self.tx.signing_hash(self.chain_id);
        Ok(self.signature.recover(&hash)?)
    }
}
