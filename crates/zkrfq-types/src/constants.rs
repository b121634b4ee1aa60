//! System-wide constants for the zkrfq engine.

/// Fixed-point scale for quote prices: quote-asset units per base unit × `PRICE_SCALE`.
pub const PRICE_SCALE: u64 = 1_000_000;

/// KYC attestation bit.
pub const KYC_BIT: u8 = 0b001;

/// Solvency attestation bit.
pub const SOLVENCY_BIT: u8 = 0b010;

/// Whitelist attestation bit.
pub const WHITELIST_BIT: u8 = 0b100;

/// Mask an order must reach before it may be quoted or settled.
///
/// Bit-compatible with the settlement ledger's own attestation mask.
pub const REQUIRED_MASK: u8 = KYC_BIT | SOLVENCY_BIT | WHITELIST_BIT;

/// Struct-schema description whose keccak256 is the quote type tag.
pub const QUOTE_COMMITMENT_TYPE: &str = "QuoteCommitment(bytes32 orderHash,address maker,uint256 quoteAmount,uint64 validUntil,uint256 nonce)";

/// Two-byte prefix of every typed-data signing digest.
pub const SIGNING_PREFIX: [u8; 2] = [0x19, 0x01];

/// Length of a raw `r ‖ s ‖ v` signature.
pub const SIGNATURE_LEN: usize = 65;

/// Length of an account address.
pub const ADDRESS_LEN: usize = 20;

/// Default lifetime of a server-signed quote, in seconds.
pub const DEFAULT_QUOTE_TTL_SECS: u64 = 60;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "zkrfq";
