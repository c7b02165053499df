//! Expectations on query results
//!
//! Assertions are evaluated by the runner after dispatch, never by the packer.
//! The built-in [`ReturnExpect`] forms can be written directly in case files:
//!
//! ```yaml
//! assertions:
//!   - not_empty: true
//!   - len: 64
//!   - eq: "0x0000000000000000000000000000000000000000000000000000000000000001"
//!   - word: 1
//!     compare:
//!       gte: "1000"
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Predicate over the bytes returned by a read-only call
pub trait Assertion: Send + Sync + fmt::Debug {
    /// `Err` carries a human readable reason
    fn check(&self, output: &[u8]) -> Result<(), String>;
}

/// Comparison against a 32-byte big-endian word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompareOp {
    Eq {
        #[serde(deserialize_with = "de_amount")]
        eq: u128,
    },
    Gte {
        #[serde(deserialize_with = "de_amount")]
        gte: u128,
    },
    Lte {
        #[serde(deserialize_with = "de_amount")]
        lte: u128,
    },
    Gt {
        #[serde(deserialize_with = "de_amount")]
        gt: u128,
    },
    Lt {
        #[serde(deserialize_with = "de_amount")]
        lt: u128,
    },
}

impl CompareOp {
    // `actual` is None when the word does not fit in 128 bits,
    // which is greater than any operand.
    fn holds(&self, actual: Option<u128>) -> bool {
        match (self, actual) {
            (CompareOp::Eq { eq }, Some(actual)) => actual == *eq,
            (CompareOp::Gte { gte }, Some(actual)) => actual >= *gte,
            (CompareOp::Lte { lte }, Some(actual)) => actual <= *lte,
            (CompareOp::Gt { gt }, Some(actual)) => actual > *gt,
            (CompareOp::Lt { lt }, Some(actual)) => actual < *lt,
            (CompareOp::Gte { .. } | CompareOp::Gt { .. }, None) => true,
            (CompareOp::Eq { .. } | CompareOp::Lte { .. } | CompareOp::Lt { .. }, None) => false,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq { eq } => write!(f, "== {}", eq),
            CompareOp::Gte { gte } => write!(f, ">= {}", gte),
            CompareOp::Lte { lte } => write!(f, "<= {}", lte),
            CompareOp::Gt { gt } => write!(f, "> {}", gt),
            CompareOp::Lt { lt } => write!(f, "< {}", lt),
        }
    }
}

/// Built-in, data-driven assertions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReturnExpect {
    /// Exact returned bytes, hex encoded
    Eq { eq: String },
    /// Returned data length in bytes
    Len { len: usize },
    /// Non-empty (or empty) return data
    NotEmpty { not_empty: bool },
    /// Word `word` (0-based, 32 bytes each) compared as an unsigned integer
    Word { word: usize, compare: CompareOp },
}

impl Assertion for ReturnExpect {
    fn check(&self, output: &[u8]) -> Result<(), String> {
        match self {
            ReturnExpect::Eq { eq } => {
                let expected = hex::decode(eq.strip_prefix("0x").unwrap_or(eq))
                    .map_err(|e| format!("Invalid expected hex '{}': {}", eq, e))?;
                if output != expected.as_slice() {
                    return Err(format!(
                        "Return data mismatch: expected 0x{}, got 0x{}",
                        hex::encode(&expected),
                        hex::encode(output)
                    ));
                }
            }
            ReturnExpect::Len { len } => {
                if output.len() != *len {
                    return Err(format!(
                        "Return length mismatch: expected {}, got {}",
                        len,
                        output.len()
                    ));
                }
            }
            ReturnExpect::NotEmpty { not_empty } => {
                if output.is_empty() == *not_empty {
                    return Err(if *not_empty {
                        "Expected return data, got none".to_string()
                    } else {
                        format!("Expected no return data, got {} bytes", output.len())
                    });
                }
            }
            ReturnExpect::Word { word, compare } => {
                let bytes = word
                    .checked_mul(32)
                    .and_then(|start| output.get(start..start.checked_add(32)?))
                    .ok_or_else(|| {
                        format!(
                            "Word {} out of range: return data is {} bytes",
                            word,
                            output.len()
                        )
                    })?;
                let actual = word_to_u128(bytes);
                if !compare.holds(actual) {
                    return Err(format!(
                        "Word {} is 0x{}, expected {}",
                        word,
                        hex::encode(bytes),
                        compare
                    ));
                }
            }
        }
        Ok(())
    }
}

fn word_to_u128(word: &[u8]) -> Option<u128> {
    let (high, low) = word.split_at(16);
    if high.iter().any(|b| *b != 0) {
        return None;
    }
    let mut buf = [0u8; 16];
    buf.copy_from_slice(low);
    Some(u128::from_be_bytes(buf))
}

/// Amounts may be written as numbers or as decimal strings
pub(crate) fn de_amount<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(u64),
        Text(String),
    }

    match Amount::deserialize(deserializer)? {
        Amount::Number(value) => Ok(value as u128),
        Amount::Text(text) => text.parse::<u128>().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(value: u128) -> Vec<u8> {
        let mut out = vec![0u8; 16];
        out.extend_from_slice(&value.to_be_bytes());
        out
    }

    #[test]
    fn test_eq_assertion() {
        let expect = ReturnExpect::Eq {
            eq: "0x0102".to_string(),
        };
        assert!(expect.check(&[1, 2]).is_ok());
        let err = expect.check(&[1, 3]).unwrap_err();
        assert!(err.contains("0x0103"));
    }

    #[test]
    fn test_len_and_not_empty() {
        assert!(ReturnExpect::Len { len: 2 }.check(&[0, 0]).is_ok());
        assert!(ReturnExpect::Len { len: 2 }.check(&[0]).is_err());
        assert!(ReturnExpect::NotEmpty { not_empty: true }.check(&[0]).is_ok());
        assert!(ReturnExpect::NotEmpty { not_empty: true }.check(&[]).is_err());
        assert!(ReturnExpect::NotEmpty { not_empty: false }.check(&[]).is_ok());
    }

    #[test]
    fn test_word_comparisons() {
        let mut output = word(5);
        output.extend(word(1_000));

        let check = |index: usize, compare: CompareOp| {
            ReturnExpect::Word {
                word: index,
                compare,
            }
            .check(&output)
        };

        assert!(check(0, CompareOp::Eq { eq: 5 }).is_ok());
        assert!(check(1, CompareOp::Gte { gte: 1_000 }).is_ok());
        assert!(check(1, CompareOp::Gt { gt: 1_000 }).is_err());
        assert!(check(1, CompareOp::Lt { lt: 1_001 }).is_ok());
        assert!(check(0, CompareOp::Lte { lte: 4 }).is_err());
        assert!(check(2, CompareOp::Eq { eq: 0 })
            .unwrap_err()
            .contains("out of range"));
    }

    #[test]
    fn test_word_larger_than_u128() {
        let output = vec![0xff; 32];
        let expect = |compare| ReturnExpect::Word { word: 0, compare };
        assert!(expect(CompareOp::Gt { gt: u128::MAX }).check(&output).is_ok());
        assert!(expect(CompareOp::Eq { eq: u128::MAX }).check(&output).is_err());
    }

    #[test]
    fn test_parse_assertions_from_yaml() {
        let yaml = r#"
- not_empty: true
- len: 64
- eq: "0x01"
- word: 1
  compare:
    gte: "1000"
- word: 0
  compare:
    lt: 7
"#;
        let parsed: Vec<ReturnExpect> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            parsed,
            vec![
                ReturnExpect::NotEmpty { not_empty: true },
                ReturnExpect::Len { len: 64 },
                ReturnExpect::Eq {
                    eq: "0x01".to_string()
                },
                ReturnExpect::Word {
                    word: 1,
                    compare: CompareOp::Gte { gte: 1000 }
                },
                ReturnExpect::Word {
                    word: 0,
                    compare: CompareOp::Lt { lt: 7 }
                },
            ]
        );
    }
}
