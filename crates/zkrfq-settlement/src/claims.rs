//! Settlement claims: make settlement at-most-once.
//!
//! A trade is claimed under the store lock in the same critical section as
//! the `MATCHED` guard, before the ledger is called. A second attempt sees
//! the claim and is refused with [`RfqError::SettlementInFlight`]. A failed
//! ledger call releases the claim; a successful one commits it.
//!
//! Committed trades are kept in a bounded history with oldest-first
//! eviction. Once evicted, the `SETTLED` status guard still blocks replays.

use std::collections::{HashMap, HashSet, VecDeque};

use zkrfq_types::{Result, RfqError, RfqId, TradeId};

/// Default number of committed trades remembered.
pub const DEFAULT_HISTORY: usize = 10_000;

pub struct SettlementClaims {
    /// Trades whose ledger call has not returned yet.
    in_flight: HashMap<TradeId, RfqId>,
    /// Trades already settled.
    settled: HashSet<TradeId>,
    /// Insertion order for eviction (front = oldest).
    order: VecDeque<TradeId>,
    max_history: usize,
}

impl SettlementClaims {
    /// # Panics
    /// Panics if `max_history` is zero.
    #[must_use]
    pub fn new(max_history: usize) -> Self {
        assert!(max_history > 0, "SettlementClaims max_history must be > 0");
        Self {
            in_flight: HashMap::new(),
            settled: HashSet::with_capacity(max_history),
            order: VecDeque::with_capacity(max_history),
            max_history,
        }
    }

    /// Claim `trade_id` for settlement.
    ///
    /// # Errors
    /// `SettlementInFlight` if the trade is already claimed or settled.
    pub fn claim(&mut self, trade_id: TradeId, rfq_id: RfqId) -> Result<()> {
        if self.in_flight.contains_key(&trade_id) || self.settled.contains(&trade_id) {
            return Err(RfqError::SettlementInFlight(trade_id));
        }
        self.in_flight.insert(trade_id, rfq_id);
        Ok(())
    }

    /// Drop an in-flight claim after a failed ledger call.
    pub fn release(&mut self, trade_id: &TradeId) -> bool {
        self.in_flight.remove(trade_id).is_some()
    }

    /// Move an in-flight claim into the settled history.
    pub fn commit(&mut self, trade_id: TradeId) {
        self.in_flight.remove(&trade_id);
        if !self.settled.insert(trade_id) {
            return;
        }
        if self.order.len() >= self.max_history {
            if let Some(oldest) = self.order.pop_front() {
                self.settled.remove(&oldest);
            }
        }
        self.order.push_back(trade_id);
    }

    /// The in-flight trade for `rfq_id`, if any.
    #[must_use]
    pub fn in_flight_for(&self, rfq_id: &RfqId) -> Option<TradeId> {
        self.in_flight
            .iter()
            .find_map(|(trade, rfq)| (rfq == rfq_id).then_some(*trade))
    }

    #[must_use]
    pub fn is_in_flight(&self, trade_id: &TradeId) -> bool {
        self.in_flight.contains_key(trade_id)
    }

    #[must_use]
    pub fn is_settled(&self, trade_id: &TradeId) -> bool {
        self.settled.contains(trade_id)
    }

    pub fn clear(&mut self) {
        self.in_flight.clear();
        self.settled.clear();
        self.order.clear();
    }
}

impl Default for SettlementClaims {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY)
    }
}
