//! Trade types produced by matching an order with a quote.
//!
//! A [`Trade`] is created only from an `OPEN` order and is consumed by
//! settlement. It is never mutated afterward; the outcome of settlement is
//! recorded separately as a [`SettlementReceipt`].

use serde::{Deserialize, Serialize};

use crate::{Amount, AttestationMap, Bytes32, OrderHash, QuoteId, RfqId, TradeId};

/// The result of matching an order with one of its quotes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub trade_id: TradeId,
    pub rfq_id: RfqId,
    pub quote_id: QuoteId,
    pub order_hash: OrderHash,
    pub price: Amount,
    pub size: Amount,
    /// Snapshot of the order's attestations at match time.
    pub attestations: AttestationMap,
    /// Unix seconds.
    pub matched_at: u64,
}

impl std::fmt::Display for Trade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Trade[{}] {} {} @ {} (order {})",
            self.trade_id,
            self.rfq_id,
            self.size,
            self.price,
            self.order_hash.short(),
        )
    }
}

/// Outcome of a submitted settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReceipt {
    pub trade_id: TradeId,
    pub rfq_id: RfqId,
    /// Ledger transaction hash (deterministic placeholder when writes are skipped).
    pub tx_hash: Bytes32,
    /// Whether the settlement was actually sent to the ledger.
    pub submitted: bool,
    /// Unix seconds.
    pub settled_at: u64,
}
