//! Quote types: the maker-signed price commitment for one order.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, OrderHash, QuoteId, RawSignature, RfqId, constants};

/// `floor(size * price / PRICE_SCALE)`.
#[must_use]
pub fn expected_quote_amount(size: &Amount, price: &Amount) -> Amount {
    Amount((&size.0 * &price.0) / constants::PRICE_SCALE)
}

/// The tuple a maker signs to authorize one price for one order.
///
/// Field order and widths are fixed by the ledger's struct hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteCommitment {
    pub order_hash: OrderHash,
    pub maker: Address,
    pub quote_amount: Amount,
    /// Unix seconds; encoded as `uint64`.
    pub valid_until: u64,
    pub nonce: Amount,
}

/// Caller-supplied quote terms, already resolved and validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteTerms {
    pub taker: Address,
    pub price: Amount,
    pub size: Amount,
    /// When present, must equal [`expected_quote_amount`].
    pub quote_amount: Option<Amount>,
    /// Unix seconds.
    pub valid_until: u64,
    pub nonce: Amount,
}

/// A signed quote offered for one RFQ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSubmission {
    pub rfq_id: RfqId,
    pub terms: QuoteTerms,
    pub signature: RawSignature,
}

/// A stored, signature-verified quote. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub quote_id: QuoteId,
    /// Owning RFQ (reference, not ownership).
    pub rfq_id: RfqId,
    pub taker: Address,
    /// Quote-asset units per base unit × `PRICE_SCALE`.
    pub price: Amount,
    pub size: Amount,
    pub quote_amount: Amount,
    /// Unix seconds.
    pub valid_until: u64,
    pub nonce: Amount,
    pub signature: RawSignature,
}

impl Quote {
    /// Rebuild the commitment this quote's signature covers.
    #[must_use]
    pub fn commitment(&self, order_hash: OrderHash, maker: Address) -> QuoteCommitment {
        QuoteCommitment {
            order_hash,
            maker,
            quote_amount: self.quote_amount.clone(),
            valid_until: self.valid_until,
            nonce: self.nonce.clone(),
        }
    }

    #[must_use]
    pub fn is_valid_at(&self, now: u64) -> bool {
        self.valid_until > now
    }
}
