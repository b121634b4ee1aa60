//! Error types for the zkrfq engine.
//!
//! All errors use the `RFQ_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Lookup errors
//! - 2xx: Lifecycle / guard errors
//! - 3xx: Signature errors
//! - 4xx: Quote errors
//! - 5xx: Input / address errors
//! - 6xx: External collaborator errors
//! - 9xx: General / internal errors
//!
//! No variant is fatal to the process: the store and state machine remain
//! usable after any single failed operation.

use thiserror::Error;

use crate::{Address, Amount, QuoteId, RfqId, RfqOperation, RfqStatus, TradeId};

/// Stable classification of an [`RfqError`], for mapping to transport codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    RfqExpired,
    AttestationMissing,
    InvalidState,
    InvalidSignatureLength,
    SignatureMismatch,
    QuoteAmountMismatch,
    QuoteExpired,
    MisconfiguredAddress,
    InvalidInput,
    External,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::RfqExpired => "RfqExpired",
            Self::AttestationMissing => "AttestationMissing",
            Self::InvalidState => "InvalidState",
            Self::InvalidSignatureLength => "InvalidSignatureLength",
            Self::SignatureMismatch => "SignatureMismatch",
            Self::QuoteAmountMismatch => "QuoteAmountMismatch",
            Self::QuoteExpired => "QuoteExpired",
            Self::MisconfiguredAddress => "MisconfiguredAddress",
            Self::InvalidInput => "InvalidInput",
            Self::External => "External",
            Self::Internal => "Internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Central error enum for all zkrfq operations.
#[derive(Debug, Error)]
pub enum RfqError {
    // =================================================================
    // Lookup Errors (1xx)
    // =================================================================
    #[error("RFQ_ERR_100: RFQ not found: {0}")]
    RfqNotFound(RfqId),

    #[error("RFQ_ERR_101: Quote not found: {0}")]
    QuoteNotFound(QuoteId),

    #[error("RFQ_ERR_102: Trade not found: {0}")]
    TradeNotFound(TradeId),

    // =================================================================
    // Lifecycle Errors (2xx)
    // =================================================================
    /// Guard found `expiry <= now`.
    #[error("RFQ_ERR_200: RFQ {rfq_id} expired at {expiry} (now {now})")]
    RfqExpired { rfq_id: RfqId, expiry: u64, now: u64 },

    /// Guard found the attestation mask incomplete.
    #[error("RFQ_ERR_201: Attestations incomplete for {rfq_id}: mask {mask:#05b}, required {required:#05b}")]
    AttestationMissing { rfq_id: RfqId, mask: u8, required: u8 },

    /// The operation's status precondition was not met.
    #[error("RFQ_ERR_202: Cannot {operation} RFQ {rfq_id} in status {status}")]
    InvalidState {
        rfq_id: RfqId,
        operation: RfqOperation,
        status: RfqStatus,
    },

    /// The quote exists but was issued for another RFQ.
    #[error("RFQ_ERR_203: Quote {quote_id} belongs to {quote_rfq}, not {rfq_id}")]
    QuoteRfqMismatch {
        quote_id: QuoteId,
        quote_rfq: RfqId,
        rfq_id: RfqId,
    },

    /// Another settlement attempt for this trade is in flight or completed.
    #[error("RFQ_ERR_204: Settlement already claimed for trade {0}")]
    SettlementInFlight(TradeId),

    // =================================================================
    // Signature Errors (3xx)
    // =================================================================
    #[error("RFQ_ERR_300: Invalid signature length: expected 65 bytes, got {len}")]
    InvalidSignatureLength { len: usize },

    #[error(
        "RFQ_ERR_301: Signature mismatch: expected signer {expected}, recovered {}",
        .recovered.map_or_else(|| "nothing".to_string(), |a| a.to_string())
    )]
    SignatureMismatch {
        expected: Address,
        recovered: Option<Address>,
    },

    // =================================================================
    // Quote Errors (4xx)
    // =================================================================
    #[error("RFQ_ERR_400: Quote amount mismatch: expected {expected}, provided {provided}")]
    QuoteAmountMismatch { expected: Amount, provided: Amount },

    #[error("RFQ_ERR_401: Quote expired: validUntil {valid_until} <= now {now}")]
    QuoteExpired { valid_until: u64, now: u64 },

    #[error("RFQ_ERR_402: Quote size {quote_size} does not match order size {order_size}")]
    QuoteSizeMismatch { order_size: Amount, quote_size: Amount },

    #[error("RFQ_ERR_403: Quote price {price} below order minimum {min_price}")]
    PriceBelowMinimum { min_price: Amount, price: Amount },

    // =================================================================
    // Input Errors (5xx)
    // =================================================================
    #[error("RFQ_ERR_500: Misconfigured address for {field}: {value:?}")]
    MisconfiguredAddress { field: &'static str, value: String },

    #[error("RFQ_ERR_501: Invalid amount for {field}: {reason}")]
    InvalidAmount { field: &'static str, reason: String },

    #[error("RFQ_ERR_502: Invalid hex for {field}: {reason}")]
    InvalidHex { field: &'static str, reason: String },

    #[error("RFQ_ERR_503: Invalid identifier {value:?}: expected prefix {expected_prefix}")]
    InvalidIdentifier {
        value: String,
        expected_prefix: &'static str,
    },

    #[error("RFQ_ERR_504: Unknown attestation kind: {0}")]
    UnknownAttestationKind(String),

    #[error("RFQ_ERR_505: Missing public inputs for attestation submission")]
    MissingPublicInputs,

    // =================================================================
    // External Collaborator Errors (6xx)
    // =================================================================
    /// The settlement ledger rejected or failed a call.
    #[error("RFQ_ERR_600: Ledger call {call} failed: {reason}")]
    Ledger { call: &'static str, reason: String },

    /// The attestation issuer failed to produce an identifier.
    #[error("RFQ_ERR_601: Attestation issuer failed for {circuit}: {reason}")]
    AttestationIssuer { circuit: String, reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    #[error("RFQ_ERR_900: Internal error: {0}")]
    Internal(String),

    #[error("RFQ_ERR_901: Serialization error: {0}")]
    Serialization(String),

    #[error("RFQ_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl RfqError {
    /// Stable classification for transport-level mapping.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RfqNotFound(_) | Self::QuoteNotFound(_) | Self::TradeNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::RfqExpired { .. } => ErrorKind::RfqExpired,
            Self::AttestationMissing { .. } => ErrorKind::AttestationMissing,
            Self::InvalidState { .. } | Self::QuoteRfqMismatch { .. } | Self::SettlementInFlight(_) => {
                ErrorKind::InvalidState
            }
            Self::InvalidSignatureLength { .. } => ErrorKind::InvalidSignatureLength,
            Self::SignatureMismatch { .. } => ErrorKind::SignatureMismatch,
            Self::QuoteAmountMismatch { .. } => ErrorKind::QuoteAmountMismatch,
            Self::QuoteExpired { .. } => ErrorKind::QuoteExpired,
            Self::MisconfiguredAddress { .. } => ErrorKind::MisconfiguredAddress,
            Self::QuoteSizeMismatch { .. }
            | Self::PriceBelowMinimum { .. }
            | Self::InvalidAmount { .. }
            | Self::InvalidHex { .. }
            | Self::InvalidIdentifier { .. }
            | Self::UnknownAttestationKind(_)
            | Self::MissingPublicInputs
            | Self::Serialization(_) => ErrorKind::InvalidInput,
            Self::Ledger { .. } | Self::AttestationIssuer { .. } => ErrorKind::External,
            Self::Internal(_) | Self::Configuration(_) => ErrorKind::Internal,
        }
    }

    /// The `RFQ_ERR_NNN` code at the start of the message.
    #[must_use]
    pub fn code(&self) -> String {
        let msg = self.to_string();
        msg.split(':').next().unwrap_or_default().to_string()
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, RfqError>;

impl From<serde_json::Error> for RfqError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = RfqError::RfqNotFound(RfqId::new());
        let msg = format!("{err}");
        assert!(msg.starts_with("RFQ_ERR_100"), "Got: {msg}");
        assert_eq!(err.code(), "RFQ_ERR_100");
    }

    #[test]
    fn quote_amount_mismatch_display() {
        let err = RfqError::QuoteAmountMismatch {
            expected: Amount::from(1_000_000_000_000u64),
            provided: Amount::from(999u64),
        };
        let msg = format!("{err}");
        assert!(msg.contains("RFQ_ERR_400"));
        assert!(msg.contains("1000000000000"));
        assert!(msg.contains("999"));
        assert_eq!(err.kind(), ErrorKind::QuoteAmountMismatch);
    }

    #[test]
    fn attestation_missing_shows_masks() {
        let err = RfqError::AttestationMissing {
            rfq_id: RfqId::new(),
            mask: 0b011,
            required: 0b111,
        };
        let msg = format!("{err}");
        assert!(msg.contains("0b011"), "Got: {msg}");
        assert!(msg.contains("0b111"), "Got: {msg}");
    }

    #[test]
    fn signature_mismatch_without_recovery() {
        let err = RfqError::SignatureMismatch {
            expected: Address([1; 20]),
            recovered: None,
        };
        let msg = format!("{err}");
        assert!(msg.contains("recovered nothing"), "Got: {msg}");
        assert_eq!(err.kind(), ErrorKind::SignatureMismatch);
    }

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(RfqError::TradeNotFound(TradeId::new()).kind(), ErrorKind::NotFound);
        assert_eq!(
            RfqError::InvalidState {
                rfq_id: RfqId::new(),
                operation: RfqOperation::Settle,
                status: RfqStatus::Open,
            }
            .kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            RfqError::MisconfiguredAddress {
                field: "taker",
                value: "0xTaker".into(),
            }
            .kind(),
            ErrorKind::MisconfiguredAddress
        );
        assert_eq!(
            RfqError::Ledger {
                call: "settle",
                reason: "reverted".into(),
            }
            .kind(),
            ErrorKind::External
        );
    }

    #[test]
    fn all_errors_have_rfq_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(RfqError::InvalidSignatureLength { len: 64 }),
            Box::new(RfqError::QuoteExpired {
                valid_until: 1,
                now: 2,
            }),
            Box::new(RfqError::MissingPublicInputs),
            Box::new(RfqError::Internal("test".into())),
            Box::new(RfqError::Configuration("bad".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("RFQ_ERR_"),
                "Error missing RFQ_ERR_ prefix: {msg}"
            );
        }
    }
}
