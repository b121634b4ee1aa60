//! Fixed-width byte values and arbitrary-precision amounts.
//!
//! Everything here renders the way the settlement ledger expects it on the
//! wire: `0x`-prefixed lowercase hex for byte strings, base-10 for amounts.

use std::{fmt, str::FromStr};

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{Result, RfqError, constants};

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Decode a hex string (with or without `0x`) for the named field.
pub fn decode_hex(field: &'static str, s: &str) -> Result<Vec<u8>> {
    hex::decode(strip_0x(s.trim())).map_err(|e| RfqError::InvalidHex {
        field,
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account or token address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; constants::ADDRESS_LEN]);

impl Address {
    pub const ZERO: Self = Self([0u8; constants::ADDRESS_LEN]);

    /// Parse an address for the named field.
    ///
    /// Accepts 40 hex digits in any case, with or without `0x`.
    pub fn parse(field: &'static str, s: &str) -> Result<Self> {
        let misconfigured = || RfqError::MisconfiguredAddress {
            field,
            value: s.to_string(),
        };
        let raw = strip_0x(s.trim());
        if raw.len() != constants::ADDRESS_LEN * 2 {
            return Err(misconfigured());
        }
        let mut out = [0u8; constants::ADDRESS_LEN];
        hex::decode_to_slice(raw, &mut out).map_err(|_| misconfigured())?;
        Ok(Self(out))
    }

    /// Like [`Address::parse`], additionally rejecting the zero address.
    pub fn parse_nonzero(field: &'static str, s: &str) -> Result<Self> {
        let addr = Self::parse(field, s)?;
        if addr.is_zero() {
            return Err(RfqError::MisconfiguredAddress {
                field,
                value: s.to_string(),
            });
        }
        Ok(addr)
    }

    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; constants::ADDRESS_LEN] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; constants::ADDRESS_LEN]
    }

    /// Left-pad to a 32-byte word.
    #[must_use]
    pub fn to_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&self.0);
        word
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = RfqError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse("address", s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Bytes32
// ---------------------------------------------------------------------------

/// A 32-byte digest or opaque identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Bytes32(pub [u8; 32]);

/// Deterministic digest of an order's sanitized fields.
pub type OrderHash = Bytes32;

/// Opaque identifier returned by the attestation issuer.
pub type AttestationId = Bytes32;

impl Bytes32 {
    pub const ZERO: Self = Self([0u8; 32]);

    /// Parse a 32-byte hex value for the named field.
    pub fn parse(field: &'static str, s: &str) -> Result<Self> {
        let bytes = decode_hex(field, s)?;
        let arr: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| RfqError::InvalidHex {
            field,
            reason: format!("expected 32 bytes, got {}", b.len()),
        })?;
        Ok(Self(arr))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// First four bytes as hex, for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl From<[u8; 32]> for Bytes32 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bytes32({self})")
    }
}

impl FromStr for Bytes32 {
    type Err = RfqError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse("bytes32", s)
    }
}

impl Serialize for Bytes32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Bytes32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// RawSignature
// ---------------------------------------------------------------------------

/// Signature bytes exactly as supplied by the caller.
///
/// Length is not checked here. The signature verifier reports it as
/// `InvalidSignatureLength`.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct RawSignature(pub Vec<u8>);

impl RawSignature {
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<[u8; constants::SIGNATURE_LEN]> for RawSignature {
    fn from(bytes: [u8; constants::SIGNATURE_LEN]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Display for RawSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl fmt::Debug for RawSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawSignature({self})")
    }
}

impl FromStr for RawSignature {
    type Err = RfqError;

    fn from_str(s: &str) -> Result<Self> {
        decode_hex("signature", s).map(Self)
    }
}

impl Serialize for RawSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RawSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Amount
// ---------------------------------------------------------------------------

/// Arbitrary-precision unsigned integer in asset base units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Amount(pub BigUint);

impl Amount {
    #[must_use]
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Parse a base-10 (or `0x` hex) amount for the named field.
    pub fn parse(field: &'static str, s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = |reason: &str| RfqError::InvalidAmount {
            field,
            reason: format!("{reason}: {s:?}"),
        };
        let parsed = if let Some(hex_digits) = s.strip_prefix("0x") {
            if hex_digits.is_empty() || !hex_digits.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid("not a hex integer"));
            }
            BigUint::parse_bytes(hex_digits.as_bytes(), 16)
        } else {
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("not a base-10 integer"));
            }
            BigUint::parse_bytes(s.as_bytes(), 10)
        };
        parsed.map(Self).ok_or_else(|| invalid("unparseable integer"))
    }

    /// Encode as a big-endian 32-byte word.
    ///
    /// # Errors
    /// `InvalidAmount` if the value does not fit in 256 bits.
    pub fn to_word(&self, field: &'static str) -> Result<[u8; 32]> {
        let bytes = self.0.to_bytes_be();
        if bytes.len() > 32 {
            return Err(RfqError::InvalidAmount {
                field,
                reason: format!("{} bits exceeds uint256", self.0.bits()),
            });
        }
        let mut word = [0u8; 32];
        word[32 - bytes.len()..].copy_from_slice(&bytes);
        Ok(word)
    }

    #[must_use]
    pub fn to_u128(&self) -> Option<u128> {
        self.0.to_u128()
    }
}

impl From<u64> for Amount {
    fn from(v: u64) -> Self {
        Self(BigUint::from(v))
    }
}

impl From<u128> for Amount {
    fn from(v: u128) -> Self {
        Self(BigUint::from(v))
    }
}

impl From<BigUint> for Amount {
    fn from(v: BigUint) -> Self {
        Self(v)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = RfqError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse("amount", s)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct AmountVisitor;

        impl de::Visitor<'_> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or a decimal string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Amount, E> {
                Ok(Amount::from(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Amount, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_parse_is_case_insensitive() {
        let lower = Address::parse("maker", "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266").unwrap();
        let mixed = Address::parse("maker", "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap();
        assert_eq!(lower, mixed);
        assert_eq!(
            mixed.to_string(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn address_rejects_placeholder_names() {
        let err = Address::parse("maker", "0xMaker").unwrap_err();
        assert!(
            matches!(err, RfqError::MisconfiguredAddress { field: "maker", .. }),
            "Got: {err:?}"
        );
    }

    #[test]
    fn address_rejects_wrong_length() {
        assert!(Address::parse("base", "0x1234").is_err());
        assert!(Address::parse("base", &format!("0x{}", "ab".repeat(21))).is_err());
    }

    #[test]
    fn address_nonzero_guard() {
        let zero = format!("0x{}", "00".repeat(20));
        assert!(Address::parse("taker", &zero).is_ok());
        assert!(Address::parse_nonzero("taker", &zero).is_err());
    }

    #[test]
    fn address_word_is_left_padded() {
        let addr = Address([0xAB; 20]);
        let word = addr.to_word();
        assert_eq!(&word[..12], &[0u8; 12]);
        assert_eq!(&word[12..], &[0xAB; 20]);
    }

    #[test]
    fn bytes32_roundtrip() {
        let b = Bytes32([0x5A; 32]);
        let back: Bytes32 = b.to_string().parse().unwrap();
        assert_eq!(b, back);
        assert!(Bytes32::parse("order_hash", "0x1234").is_err());
    }

    #[test]
    fn amount_parses_decimal_and_hex() {
        assert_eq!(Amount::parse("size", "1000000").unwrap(), Amount::from(1_000_000u64));
        assert_eq!(Amount::parse("size", "0x0f4240").unwrap(), Amount::from(1_000_000u64));
        assert!(Amount::parse("size", "-1").is_err());
        assert!(Amount::parse("size", "1e18").is_err());
        assert!(Amount::parse("size", "").is_err());
    }

    #[test]
    fn amount_word_encoding() {
        let word = Amount::from(0x0102u64).to_word("nonce").unwrap();
        assert_eq!(word[30], 0x01);
        assert_eq!(word[31], 0x02);
        assert!(word[..30].iter().all(|b| *b == 0));
    }

    #[test]
    fn amount_wider_than_uint256_rejected() {
        let huge = Amount(BigUint::from(1u8) << 256usize);
        let err = huge.to_word("quote_amount").unwrap_err();
        assert!(matches!(err, RfqError::InvalidAmount { field: "quote_amount", .. }));
        let max = Amount((BigUint::from(1u8) << 256usize) - 1u8);
        assert_eq!(max.to_word("quote_amount").unwrap(), [0xFF; 32]);
    }

    #[test]
    fn amount_serde_accepts_numbers_and_strings() {
        let from_num: Amount = serde_json::from_str("42").unwrap();
        let from_str: Amount = serde_json::from_str("\"1000000000000000000\"").unwrap();
        assert_eq!(from_num, Amount::from(42u64));
        assert_eq!(from_str.to_string(), "1000000000000000000");
        assert_eq!(serde_json::to_string(&from_str).unwrap(), "\"1000000000000000000\"");
    }

    #[test]
    fn signature_hex_keeps_any_length() {
        let sig: RawSignature = "0xdeadbeef".parse().unwrap();
        assert_eq!(sig.len(), 4);
        assert!("0xzz".parse::<RawSignature>().is_err());
    }
}
