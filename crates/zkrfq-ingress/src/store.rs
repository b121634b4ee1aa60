//! The RFQ store: sole owner of every order, quote, trade and receipt.
//!
//! The store is an explicit repository object. Callers own its lifetime
//! and serialize access to it; every mutating method refreshes and guards
//! the affected order before it changes anything.

use std::collections::HashMap;

use zkrfq_codec::{order_digest, quote_digest, verify_signer};
use zkrfq_types::{
    AttestationId, AttestationKind, AttestationMap, Bytes32, Order, OrderFields, OrderHash, Quote,
    QuoteCommitment, QuoteId, QuoteSubmission, Result, RfqError, RfqId, RfqOperation, RfqStatus,
    RfqSummary, SettlementReceipt, Trade, TradeId, expected_quote_amount,
};

use crate::lifecycle::{guard, refresh, transition};

/// Everything settlement needs, captured after the settle guard passed.
#[derive(Debug, Clone)]
pub struct SettleContext {
    pub order: Order,
    pub quote: Quote,
    pub trade: Trade,
}

/// In-memory repository of RFQ entities.
#[derive(Debug, Default)]
pub struct RfqStore {
    orders: HashMap<RfqId, Order>,
    quotes: HashMap<QuoteId, Quote>,
    trades: HashMap<TradeId, Trade>,
    receipts: HashMap<TradeId, SettlementReceipt>,
}

/// Look up an order and bring its status up to date.
fn refreshed(orders: &mut HashMap<RfqId, Order>, rfq_id: RfqId, now: u64) -> Result<&mut Order> {
    let order = orders
        .get_mut(&rfq_id)
        .ok_or(RfqError::RfqNotFound(rfq_id))?;
    refresh(order, now);
    Ok(order)
}

impl RfqStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------

    /// Create an order in `PENDING_ATTESTATION`.
    ///
    /// # Errors
    /// - `InvalidAmount` if `size` is zero
    /// - `RfqExpired` if `expiry <= now`
    pub fn create_order(&mut self, fields: OrderFields, now: u64) -> Result<Order> {
        if fields.size.is_zero() {
            return Err(RfqError::InvalidAmount {
                field: "size",
                reason: "must be > 0".to_string(),
            });
        }
        let rfq_id = RfqId::new();
        if fields.expiry <= now {
            return Err(RfqError::RfqExpired {
                rfq_id,
                expiry: fields.expiry,
                now,
            });
        }

        let order_hash = order_digest(&fields);
        let order = Order::new(rfq_id, order_hash, fields, now);
        tracing::info!(
            %rfq_id,
            order_hash = %order_hash,
            maker = %order.maker,
            size = %order.size,
            expiry = order.expiry,
            "RFQ created"
        );
        self.orders.insert(rfq_id, order.clone());
        Ok(order)
    }

    /// Record one attestation identifier and refresh the order.
    ///
    /// A second identifier for the same kind replaces the first.
    pub fn record_attestation(
        &mut self,
        rfq_id: RfqId,
        kind: AttestationKind,
        attestation_id: AttestationId,
        now: u64,
    ) -> Result<Order> {
        let order = refreshed(&mut self.orders, rfq_id, now)?;
        guard(order, RfqOperation::Attest, now)?;

        order.attestations.insert(kind, attestation_id);
        refresh(order, now);
        tracing::info!(
            %rfq_id,
            %kind,
            attestation_id = %attestation_id.short(),
            mask = order.attest_mask,
            status = %order.status,
            "attestation recorded"
        );
        Ok(order.clone())
    }

    /// Verify and store a maker-signed quote.
    ///
    /// The signature must recover to the order's maker over the signing
    /// digest built with `domain_separator`. Nothing is stored on failure.
    ///
    /// # Errors
    /// - guard errors (`RfqExpired`, `AttestationMissing`, `InvalidState`)
    /// - `QuoteSizeMismatch`, `PriceBelowMinimum`
    /// - `QuoteAmountMismatch` if a supplied amount disagrees with `floor(size * price / PRICE_SCALE)`
    /// - `QuoteExpired` if `validUntil <= now`
    /// - `InvalidSignatureLength`, `SignatureMismatch`
    pub fn submit_quote(
        &mut self,
        submission: QuoteSubmission,
        domain_separator: &Bytes32,
        now: u64,
    ) -> Result<Quote> {
        let QuoteSubmission {
            rfq_id,
            terms,
            signature,
        } = submission;
        let order = refreshed(&mut self.orders, rfq_id, now)?;
        guard(order, RfqOperation::Quote, now)?;

        if terms.size != order.size {
            return Err(RfqError::QuoteSizeMismatch {
                order_size: order.size.clone(),
                quote_size: terms.size,
            });
        }
        if terms.price < order.min_price {
            return Err(RfqError::PriceBelowMinimum {
                min_price: order.min_price.clone(),
                price: terms.price,
            });
        }
        let quote_amount = expected_quote_amount(&terms.size, &terms.price);
        if let Some(provided) = terms.quote_amount {
            if provided != quote_amount {
                tracing::warn!(%rfq_id, expected = %quote_amount, %provided, "quote amount mismatch");
                return Err(RfqError::QuoteAmountMismatch {
                    expected: quote_amount,
                    provided,
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
            quote_amount: quote_amount.clone(),
            valid_until: terms.valid_until,
            nonce: terms.nonce.clone(),
        };
        let (_, digest) = quote_digest(domain_separator, &commitment)?;
        if let Err(e) = verify_signer(&digest, signature.as_slice(), &order.maker) {
            tracing::warn!(%rfq_id, error = %e, "quote signature rejected");
            return Err(e);
        }

        let quote = Quote {
            quote_id: QuoteId::new(),
            rfq_id,
            taker: terms.taker,
            price: terms.price,
            size: terms.size,
            quote_amount,
            valid_until: terms.valid_until,
            nonce: terms.nonce,
            signature,
        };
        tracing::info!(
            %rfq_id,
            quote_id = %quote.quote_id,
            price = %quote.price,
            quote_amount = %quote.quote_amount,
            valid_until = quote.valid_until,
            "quote accepted"
        );
        self.quotes.insert(quote.quote_id, quote.clone());
        Ok(quote)
    }

    /// Match an `OPEN` order with one of its live quotes.
    ///
    /// # Errors
    /// - guard errors
    /// - `QuoteNotFound`, `QuoteRfqMismatch`, `QuoteExpired`
    pub fn match_quote(&mut self, rfq_id: RfqId, quote_id: QuoteId, now: u64) -> Result<Trade> {
        let order = refreshed(&mut self.orders, rfq_id, now)?;
        guard(order, RfqOperation::Match, now)?;

        let quote = self
            .quotes
            .get(&quote_id)
            .ok_or(RfqError::QuoteNotFound(quote_id))?;
        if quote.rfq_id != rfq_id {
            return Err(RfqError::QuoteRfqMismatch {
                quote_id,
                quote_rfq: quote.rfq_id,
                rfq_id,
            });
        }
        if !quote.is_valid_at(now) {
            return Err(RfqError::QuoteExpired {
                valid_until: quote.valid_until,
                now,
            });
        }

        transition(order, RfqStatus::Matched, RfqOperation::Match)?;
        let trade = Trade {
            trade_id: TradeId::new(),
            rfq_id,
            quote_id,
            order_hash: order.order_hash,
            price: quote.price.clone(),
            size: quote.size.clone(),
            attestations: order.attestations.clone(),
            matched_at: now,
        };
        tracing::info!(%trade, "trade matched");
        self.trades.insert(trade.trade_id, trade.clone());
        Ok(trade)
    }

    /// Refresh, guard and snapshot a trade for settlement.
    ///
    /// Nothing is mutated besides the lazy status refresh.
    ///
    /// # Errors
    /// - `TradeNotFound`, `RfqNotFound`, `QuoteNotFound`
    /// - guard errors (`RfqExpired` applies even to `MATCHED`)
    /// - `QuoteExpired` if the quote's `validUntil <= now`
    pub fn settle_context(&mut self, trade_id: TradeId, now: u64) -> Result<SettleContext> {
        let trade = self
            .trades
            .get(&trade_id)
            .ok_or(RfqError::TradeNotFound(trade_id))?
            .clone();
        let order = refreshed(&mut self.orders, trade.rfq_id, now)?;
        guard(order, RfqOperation::Settle, now)?;

        let quote = self
            .quotes
            .get(&trade.quote_id)
            .ok_or(RfqError::QuoteNotFound(trade.quote_id))?;
        if !quote.is_valid_at(now) {
            tracing::warn!(%trade_id, valid_until = quote.valid_until, now, "settle rejected: quote expired");
            return Err(RfqError::QuoteExpired {
                valid_until: quote.valid_until,
                now,
            });
        }
        Ok(SettleContext {
            order: order.clone(),
            quote: quote.clone(),
            trade,
        })
    }

    /// Commit `MATCHED → SETTLED` and keep the receipt.
    pub fn complete_settlement(&mut self, receipt: SettlementReceipt) -> Result<Order> {
        let order = self
            .orders
            .get_mut(&receipt.rfq_id)
            .ok_or(RfqError::RfqNotFound(receipt.rfq_id))?;
        transition(order, RfqStatus::Settled, RfqOperation::Settle)?;
        tracing::info!(
            rfq_id = %receipt.rfq_id,
            trade_id = %receipt.trade_id,
            tx_hash = %receipt.tx_hash,
            submitted = receipt.submitted,
            "RFQ settled"
        );
        let order = order.clone();
        self.receipts.insert(receipt.trade_id, receipt);
        Ok(order)
    }

    /// Cancel an order from any pre-`SETTLED` non-terminal status.
    pub fn cancel(&mut self, rfq_id: RfqId, now: u64) -> Result<Order> {
        let order = refreshed(&mut self.orders, rfq_id, now)?;
        guard(order, RfqOperation::Cancel, now)?;
        transition(order, RfqStatus::Cancelled, RfqOperation::Cancel)?;
        Ok(order.clone())
    }

    /// Remove an order that was never registered, with its quotes.
    pub fn discard(&mut self, rfq_id: &RfqId) -> Option<Order> {
        let order = self.orders.remove(rfq_id)?;
        self.quotes.retain(|_, q| q.rfq_id != *rfq_id);
        tracing::info!(%rfq_id, "RFQ discarded");
        Some(order)
    }

    /// Drop every entity.
    pub fn clear(&mut self) {
        let orders = self.orders.len();
        self.orders.clear();
        self.quotes.clear();
        self.trades.clear();
        self.receipts.clear();
        tracing::warn!(orders, "RFQ store cleared");
    }

    // ---------------------------------------------------------------
    // Reads (refreshing)
    // ---------------------------------------------------------------

    /// Current view of an order.
    pub fn status(&mut self, rfq_id: RfqId, now: u64) -> Result<Order> {
        refreshed(&mut self.orders, rfq_id, now).map(|o| o.clone())
    }

    /// The order hash and the attestation identifiers recorded so far.
    pub fn attestations(&mut self, rfq_id: RfqId, now: u64) -> Result<(OrderHash, AttestationMap)> {
        let order = refreshed(&mut self.orders, rfq_id, now)?;
        Ok((order.order_hash, order.attestations.clone()))
    }

    /// Summaries of orders in `status` (default `OPEN`), oldest first.
    pub fn list(&mut self, status: Option<RfqStatus>, now: u64) -> Vec<RfqSummary> {
        let wanted = status.unwrap_or(RfqStatus::Open);
        let mut out: Vec<RfqSummary> = self
            .orders
            .values_mut()
            .filter_map(|order| {
                refresh(order, now);
                (order.status == wanted).then(|| order.summary())
            })
            .collect();
        out.sort_by_key(|s| s.rfq_id);
        out
    }

    // ---------------------------------------------------------------
    // Plain lookups (no refresh)
    // ---------------------------------------------------------------

    #[must_use]
    pub fn order(&self, rfq_id: &RfqId) -> Option<&Order> {
        self.orders.get(rfq_id)
    }

    #[must_use]
    pub fn quote(&self, quote_id: &QuoteId) -> Option<&Quote> {
        self.quotes.get(quote_id)
    }

    #[must_use]
    pub fn trade(&self, trade_id: &TradeId) -> Option<&Trade> {
        self.trades.get(trade_id)
    }

    #[must_use]
    pub fn receipt(&self, trade_id: &TradeId) -> Option<&SettlementReceipt> {
        self.receipts.get(trade_id)
    }

    #[must_use]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    #[must_use]
    pub fn quote_count(&self) -> usize {
        self.quotes.len()
    }
}
