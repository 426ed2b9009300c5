//! Human-readable ballot receipt codes.
//!
//! A receipt code has the form `XXXXX-NNNNN`: five uppercase ASCII letters,
//! a dash, and five ASCII digits. Voters keep it to audit their ballot.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{RECEIPT_CODE_LEN, RECEIPT_DIGITS, RECEIPT_LETTERS, RECEIPT_MAX_ATTEMPTS};
use crate::error::ReceiptError;

const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReceiptCode(String);

impl ReceiptCode {
    /// Draw a fresh random code. Uniqueness is the caller's concern.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut code = String::with_capacity(RECEIPT_CODE_LEN);
        for _ in 0..RECEIPT_LETTERS {
            code.push(LETTERS[rng.gen_range(0..LETTERS.len())] as char);
        }
        code.push('-');
        for _ in 0..RECEIPT_DIGITS {
            code.push(DIGITS[rng.gen_range(0..DIGITS.len())] as char);
        }
        Self(code)
    }

    pub fn parse(s: &str) -> Result<Self, ReceiptError> {
        let bytes = s.as_bytes();
        let well_formed = bytes.len() == RECEIPT_CODE_LEN
            && bytes[..RECEIPT_LETTERS].iter().all(u8::is_ascii_uppercase)
            && bytes[RECEIPT_LETTERS] == b'-'
            && bytes[RECEIPT_LETTERS + 1..].iter().all(u8::is_ascii_digit);

        if well_formed {
            Ok(Self(s.to_string()))
        } else {
            Err(ReceiptError::Malformed(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReceiptCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ReceiptCode {
    type Error = ReceiptError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReceiptCode> for String {
    fn from(code: ReceiptCode) -> Self {
        code.0
    }
}

/// Draw codes until `is_taken` reports a free one.
///
/// Gives up with [`ReceiptError::Exhausted`] after
/// [`RECEIPT_MAX_ATTEMPTS`] collisions. Lookup errors from `is_taken` are
/// propagated unchanged.
pub fn generate_unique<R, F, E>(rng: &mut R, mut is_taken: F) -> Result<ReceiptCode, E>
where
    R: Rng + ?Sized,
    F: FnMut(&str) -> Result<bool, E>,
    E: From<ReceiptError>,
{
    for _ in 0..RECEIPT_MAX_ATTEMPTS {
        let code = ReceiptCode::generate(rng);
        if !is_taken(code.as_str())? {
            return Ok(code);
        }
    }
    Err(ReceiptError::Exhausted(RECEIPT_MAX_ATTEMPTS).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_code_is_well_formed() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let code = ReceiptCode::generate(&mut rng);
            assert!(ReceiptCode::parse(code.as_str()).is_ok(), "bad code {code}");
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(ReceiptCode::parse("ABCDE-12345").is_ok());
        assert!(ReceiptCode::parse("abcde-12345").is_err());
        assert!(ReceiptCode::parse("ABCDE12345").is_err());
        assert!(ReceiptCode::parse("ABCD1-12345").is_err());
        assert!(ReceiptCode::parse("ABCDE-1234X").is_err());
        assert!(ReceiptCode::parse("").is_err());
    }

    #[test]
    fn test_generate_unique_has_no_collisions() {
        let mut rng = rand::thread_rng();
        let mut issued: HashSet<String> = HashSet::new();

        for _ in 0..5_000 {
            let code = generate_unique(&mut rng, |c| {
                Ok::<_, ReceiptError>(issued.contains(c))
            })
            .unwrap();
            assert!(issued.insert(code.to_string()));
        }
        assert_eq!(issued.len(), 5_000);
    }

    #[test]
    fn test_generate_unique_gives_up() {
        let mut rng = rand::thread_rng();
        let mut calls = 0;
        let err = generate_unique(&mut rng, |_| {
            calls += 1;
            Ok::<_, ReceiptError>(true)
        })
        .unwrap_err();

        assert!(matches!(err, ReceiptError::Exhausted(n) if n == RECEIPT_MAX_ATTEMPTS));
        assert_eq!(calls, RECEIPT_MAX_ATTEMPTS);
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let json = serde_json::to_string(&ReceiptCode::parse("QWERT-00042").unwrap()).unwrap();
        assert_eq!(json, "\"QWERT-00042\"");
        assert!(serde_json::from_str::<ReceiptCode>("\"nope\"").is_err());
    }
}
