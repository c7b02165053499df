//! Contract call input encoders
//!
//! The packer never looks inside call data: anything that can turn itself
//! into bytes (or fail trying) can be used as action input.

use crate::cases::EncodingError;
use std::fmt;
use zion_common::crypto::keccak256;

/// Encoder of a contract call's input
pub trait Param: Send + Sync + fmt::Debug {
    /// Produce the call data bytes
    fn encode(&self) -> Result<Vec<u8>, EncodingError>;
}

impl Param for Vec<u8> {
    fn encode(&self) -> Result<Vec<u8>, EncodingError> {
        Ok(self.clone())
    }
}

/// Call data given as a hex string, `0x` prefix optional
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexParam(pub String);

impl Param for HexParam {
    fn encode(&self) -> Result<Vec<u8>, EncodingError> {
        decode_hex(&self.0)
    }
}

/// 4-byte function selector followed by already encoded arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorParam {
    signature: String,
    args: String,
}

impl SelectorParam {
    /// `signature` is the canonical form, e.g. `stake(address,uint256)`;
    /// `args` is the hex of the encoded argument words (may be empty)
    pub fn new(signature: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            args: args.into(),
        }
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }
}

impl Param for SelectorParam {
    fn encode(&self) -> Result<Vec<u8>, EncodingError> {
        let mut data = selector(&self.signature)?.to_vec();
        data.extend(decode_hex(&self.args)?);
        Ok(data)
    }
}

/// First 4 bytes of the Keccak hash of a canonical function signature
pub fn selector(signature: &str) -> Result<[u8; 4], EncodingError> {
    let well_formed = signature
        .find('(')
        .is_some_and(|open| open > 0 && signature.ends_with(')'))
        && !signature.contains(char::is_whitespace);
    if !well_formed {
        return Err(EncodingError::InvalidSignature(signature.to_string()));
    }

    let hash = keccak256(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash.as_bytes()[..4]);
    Ok(out)
}

fn decode_hex(value: &str) -> Result<Vec<u8>, EncodingError> {
    let value = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(value).map_err(|e| EncodingError::InvalidHex(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_known_value() {
        assert_eq!(
            selector("transfer(address,uint256)").unwrap(),
            [0xa9, 0x05, 0x9c, 0xbb]
        );
    }

    #[test]
    fn test_selector_rejects_malformed_signature() {
        for bad in ["transfer", "(address)", "transfer(address, uint256)", "transfer(address"] {
            assert_eq!(
                selector(bad),
                Err(EncodingError::InvalidSignature(bad.to_string()))
            );
        }
    }

    #[test]
    fn test_selector_param_appends_args() {
        let param = SelectorParam::new("getValidator(address)", "0x00ff");
        let data = param.encode().unwrap();
        assert_eq!(&data[..4], &selector("getValidator(address)").unwrap());
        assert_eq!(&data[4..], &[0x00, 0xff]);
    }

    #[test]
    fn test_hex_param() {
        assert_eq!(HexParam("0xdeadbeef".into()).encode().unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(HexParam(String::new()).encode().unwrap(), Vec::<u8>::new());
        assert!(matches!(
            HexParam("0xzz".into()).encode(),
            Err(EncodingError::InvalidHex(_))
        ));
    }
}
