use super::{Address, CryptoError, Hash};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use std::fmt;

pub const PRIVATE_KEY_SIZE: usize = 32;
pub const SIGNATURE_SIZE: usize = 65;

/// secp256k1 key pair bound to the address it controls
#[derive(Clone)]
pub struct KeyPair {
    secret: SigningKey,
    address: Address,
}

impl KeyPair {
    /// Build a key pair from raw big-endian scalar bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let secret = SigningKey::from_slice(bytes).map_err(|_| CryptoError::InvalidPrivateKey)?;
        let address = address_of(secret.verifying_key());
        Ok(Self { secret, address })
    }

    pub fn from_hex(hex_key: &str) -> Result<Self, CryptoError> {
        let hex_key = hex_key.strip_prefix("0x").unwrap_or(hex_key);
        let bytes = hex::decode(hex_key).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte prehash
    ///
    /// Nonces are derived with RFC 6979 so the same key and hash always
    /// yield the same signature.
    pub fn sign_hash(&self, hash: &Hash) -> Result<RecoverableSignature, CryptoError> {
        let (signature, recovery_id) = self
            .secret
            .sign_prehash_recoverable(hash.as_bytes())
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        Ok(RecoverableSignature::from_parts(&signature, recovery_id))
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the secret
        f.debug_struct("KeyPair")
            .field("address", &self.address)
            .finish()
    }
}

fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let mut uncompressed = [0u8; 65];
    uncompressed.copy_from_slice(point.as_bytes());
    Address::from_uncompressed_public_key(&uncompressed)
}

/// ECDSA signature with its public key recovery id
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub recovery_id: u8,
}

impl RecoverableSignature {
    fn from_parts(signature: &Signature, recovery_id: RecoveryId) -> Self {
        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Self {
            r,
            s,
            recovery_id: recovery_id.to_byte(),
        }
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_SIZE] {
        let mut bytes = [0u8; SIGNATURE_SIZE];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.recovery_id;
        bytes
    }

    /// Recover the address that produced this signature over `hash`
    pub fn recover(&self, hash: &Hash) -> Result<Address, CryptoError> {
        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&self.r);
        rs[32..].copy_from_slice(&self.s);
        let signature = Signature::from_slice(&rs)
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        let recovery_id = RecoveryId::from_byte(self.recovery_id).ok_or_else(|| {
            CryptoError::InvalidSignature(format!("recovery id {}", self.recovery_id))
        })?;
        let key = VerifyingKey::recover_from_prehash(hash.as_bytes(), &signature, recovery_id)
            .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))?;
        Ok(address_of(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keccak256;

    // Well-known development key (secret = 1)
    const KEY_ONE: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn test_address_of_secret_one() {
        let pair = KeyPair::from_hex(KEY_ONE).unwrap();
        assert_eq!(
            pair.address().to_string(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_zero_key_is_rejected() {
        let err = KeyPair::from_bytes(&[0u8; PRIVATE_KEY_SIZE]).unwrap_err();
        assert_eq!(err, CryptoError::InvalidPrivateKey);
    }

    #[test]
    fn test_sign_is_deterministic_and_recoverable() {
        let pair = KeyPair::from_hex(KEY_ONE).unwrap();
        let hash = keccak256(b"node manager");
        let first = pair.sign_hash(&hash).unwrap();
        let second = pair.sign_hash(&hash).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.recover(&hash).unwrap(), pair.address());
    }

    #[test]
    fn test_debug_hides_secret() {
        let pair = KeyPair::from_hex(KEY_ONE).unwrap();
        let printed = format!("{:?}", pair);
        assert!(printed.contains("address"));
        assert!(!printed.contains("secret"));
    }
}
