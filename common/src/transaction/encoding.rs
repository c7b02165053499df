// RLP encoding of legacy transactions
//
// Signing payload (EIP-155):
//   rlp([nonce, gas_price, gas_limit, to, value, data, chain_id, 0, 0])
// Signed payload:
//   rlp([nonce, gas_price, gas_limit, to, value, data, v, r, s])

use alloy_rlp::{BufMut, Encodable, Header};

use super::LegacyTransaction;
use crate::crypto::RecoverableSignature;

impl LegacyTransaction {
    fn fields_length(&self) -> usize {
        self.nonce.length()
            + self.gas_price.length()
            + self.gas_limit.length()
            + self.to.as_bytes().length()
            + self.value.length()
            + self.data.as_slice().length()
    }

    fn encode_fields(&self, out: &mut dyn BufMut) {
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        self.to.as_bytes().encode(out);
        self.value.encode(out);
        self.data.as_slice().encode(out);
    }

    pub(super) fn encode_for_signing(&self, chain_id: u64) -> Vec<u8> {
        let payload_length = self.fields_length() + chain_id.length() + 0u8.length() * 2;
        let mut out = Vec::with_capacity(payload_length + 9);
        Header {
            list: true,
            payload_length,
        }
        .encode(&mut out);
        self.encode_fields(&mut out);
        chain_id.encode(&mut out);
        0u8.encode(&mut out);
        0u8.encode(&mut out);
        out
    }

    pub(super) fn encode_signed(&self, v: u64, signature: &RecoverableSignature) -> Vec<u8> {
        // r and s are integers: leading zero bytes are not part of the encoding
        let r = trim_leading_zeros(&signature.r);
        let s = trim_leading_zeros(&signature.s);

        let payload_length = self.fields_length() + v.length() + r.length() + s.length();
        let mut out = Vec::with_capacity(payload_length + 9);
        Header {
            list: true,
            payload_length,
        }
        .encode(&mut out);
        self.encode_fields(&mut out);
        v.encode(&mut out);
        r.encode(&mut out);
        s.encode(&mut out);
        out
    }
}

fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

#[cfg(test)]
mod tests {
    use super::trim_leading_zeros;

    #[test]
    fn test_trim_leading_zeros() {
        assert_eq!(trim_leading_zeros(&[0, 0, 1, 0]), &[1, 0]);
        assert!(trim_leading_zeros(&[0, 0]).is_empty());
    }
}
