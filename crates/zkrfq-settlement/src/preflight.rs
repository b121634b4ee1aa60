//! Preflight validator.
//!
//! Answers "can this order/quote pair be settled right now" without
//! mutating anything. Only a wrong quote amount or an expired quote reject
//! the call; every other problem is returned as an advisory
//! [`PreflightIssue`] and folded into [`PreflightReport::settleable`].

use std::fmt;

use serde::{Deserialize, Serialize};
use zkrfq_codec::{quote_struct_hash, signing_digest};
use zkrfq_ingress::{is_complete, missing_kinds};
use zkrfq_types::{
    Amount, AttestationKind, Bytes32, Order, OrderHash, QuoteCommitment, QuoteTerms, Result,
    RfqError, RfqId, RfqStatus, constants, expected_quote_amount,
};

use crate::ledger::LedgerReadings;

/// The commitment a preflight is about, with its ledger `quoteHash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedQuote {
    pub commitment: QuoteCommitment,
    pub quote_hash: Bytes32,
}

/// A non-fatal reason the pair is not settleable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum PreflightIssue {
    RfqExpired { expiry: u64, now: u64 },
    AttestationsIncomplete { mask: u8, missing: Vec<AttestationKind> },
    NotQuotable { status: RfqStatus },
    QuoteSizeMismatch { order_size: Amount, quote_size: Amount },
    PriceBelowMinimum { min_price: Amount, price: Amount },
    LedgerMaskMismatch { local: u8, ledger: u8 },
    LedgerAttestationNotOk,
    NotOpenOnLedger,
    OrderAlreadyUsed,
    QuoteAlreadyUsed,
}

impl fmt::Display for PreflightIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RfqExpired { expiry, now } => write!(f, "RFQ expired at {expiry} (now {now})"),
            Self::AttestationsIncomplete { mask, missing } => {
                write!(f, "attestations incomplete: mask {mask:#05b}, missing {missing:?}")
            }
            Self::NotQuotable { status } => write!(f, "RFQ is {status}"),
            Self::QuoteSizeMismatch { order_size, quote_size } => {
                write!(f, "quote size {quote_size} != order size {order_size}")
            }
            Self::PriceBelowMinimum { min_price, price } => {
                write!(f, "price {price} below minimum {min_price}")
            }
            Self::LedgerMaskMismatch { local, ledger } => {
                write!(f, "ledger mask {ledger:#05b} != local mask {local:#05b}")
            }
            Self::LedgerAttestationNotOk => write!(f, "ledger reports attestations not OK"),
            Self::NotOpenOnLedger => write!(f, "RFQ not open on ledger"),
            Self::OrderAlreadyUsed => write!(f, "order already used on ledger"),
            Self::QuoteAlreadyUsed => write!(f, "quote already used on ledger"),
        }
    }
}

/// Outcome of a preflight check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreflightReport {
    pub rfq_id: RfqId,
    pub order_hash: OrderHash,
    pub status: RfqStatus,
    pub commitment: QuoteCommitment,
    /// Struct hash of the commitment; the ledger's `quoteHash`.
    pub quote_hash: Bytes32,
    pub domain_separator: Bytes32,
    /// The exact payload the maker must sign.
    pub signing_digest: Bytes32,
    pub local_mask: u8,
    pub ledger: LedgerReadings,
    pub issues: Vec<PreflightIssue>,
    pub settleable: bool,
}

/// Build the commitment for `terms` against `order`.
///
/// # Errors
/// - `QuoteAmountMismatch` if a supplied amount disagrees with `floor(size * price / PRICE_SCALE)`
/// - `QuoteExpired` if `validUntil <= now`
/// - `InvalidAmount` if a word exceeds 256 bits
pub fn prepare(order: &Order, terms: &QuoteTerms, now: u64) -> Result<PreparedQuote> {
    let quote_amount = expected_quote_amount(&terms.size, &terms.price);
    if let Some(provided) = &terms.quote_amount {
        if *provided != quote_amount {
            return Err(RfqError::QuoteAmountMismatch {
                expected: quote_amount,
                provided: provided.clone(),
            });
        }
    }
    if terms.valid_until <= now {
        return Err(RfqError::QuoteExpired {
            valid_until: terms.valid_until,
            now,
        });
    }
    let commitment = QuoteCommitment {
        order_hash: order.order_hash,
        maker: order.maker,
        quote_amount,
        valid_until: terms.valid_until,
        nonce: terms.nonce.clone(),
    };
    let quote_hash = quote_struct_hash(&commitment)?;
    Ok(PreparedQuote {
        commitment,
        quote_hash,
    })
}

/// Combine local state and ledger readings into a report.
#[must_use]
pub fn evaluate(
    order: &Order,
    terms: &QuoteTerms,
    prepared: PreparedQuote,
    domain_separator: Bytes32,
    ledger: LedgerReadings,
    now: u64,
) -> PreflightReport {
    let mut issues = Vec::new();

    if order.is_expired_at(now) {
        issues.push(PreflightIssue::RfqExpired {
            expiry: order.expiry,
            now,
        });
    }
    if !is_complete(order.attest_mask) {
        issues.push(PreflightIssue::AttestationsIncomplete {
            mask: order.attest_mask,
            missing: missing_kinds(order.attest_mask),
        });
    }
    if !matches!(order.status, RfqStatus::Open | RfqStatus::Matched) {
        issues.push(PreflightIssue::NotQuotable {
            status: order.status,
        });
    }
    if terms.size != order.size {
        issues.push(PreflightIssue::QuoteSizeMismatch {
            order_size: order.size.clone(),
            quote_size: terms.size.clone(),
        });
    }
    if terms.price < order.min_price {
        issues.push(PreflightIssue::PriceBelowMinimum {
            min_price: order.min_price.clone(),
            price: terms.price.clone(),
        });
    }

    let local_required = order.attest_mask & constants::REQUIRED_MASK;
    let ledger_required = ledger.mask & constants::REQUIRED_MASK;
    if local_required != ledger_required {
        issues.push(PreflightIssue::LedgerMaskMismatch {
            local: local_required,
            ledger: ledger_required,
        });
    }
    if !ledger.attestation_ok {
        issues.push(PreflightIssue::LedgerAttestationNotOk);
    }
    if !ledger.is_open {
        issues.push(PreflightIssue::NotOpenOnLedger);
    }
    if ledger.used_order {
        issues.push(PreflightIssue::OrderAlreadyUsed);
    }
    if ledger.used_quote {
        issues.push(PreflightIssue::QuoteAlreadyUsed);
    }

    for issue in &issues {
        tracing::warn!(rfq_id = %order.rfq_id, %issue, "preflight issue");
    }

    let signing_digest = signing_digest(&domain_separator, &prepared.quote_hash);
    PreflightReport {
        rfq_id: order.rfq_id,
        order_hash: order.order_hash,
        status: order.status,
        commitment: prepared.commitment,
        quote_hash: prepared.quote_hash,
        domain_separator,
        signing_digest,
        local_mask: order.attest_mask,
        ledger,
        settleable: issues.is_empty(),
        issues,
    }
}
