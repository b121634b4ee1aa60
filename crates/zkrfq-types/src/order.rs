//! Order (RFQ) types.
//!
//! An [`Order`] is a maker's intent to trade a fixed base/quote pair. Its
//! `order_hash` is computed once at creation from the sanitized
//! [`OrderFields`] and never changes afterward.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, AttestationMap, OrderHash, RfqId};

/// Lifecycle status of an RFQ.
///
/// ```text
///   PENDING_ATTESTATION ──▶ OPEN ──▶ MATCHED ──▶ SETTLED
///          │                 │          │
///          └──────┬──────────┴──────────┘
///                 ▼
///        EXPIRED / CANCELLED   (MATCHED is exempt from expiry)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RfqStatus {
    PendingAttestation,
    Open,
    Matched,
    Settled,
    Expired,
    Cancelled,
}

impl RfqStatus {
    /// No further transitions are possible from a terminal status.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Settled | Self::Expired | Self::Cancelled)
    }

    /// Can this status transition to the given target?
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::PendingAttestation, Self::Open | Self::Expired | Self::Cancelled)
                | (Self::Open, Self::Matched | Self::Expired | Self::Cancelled)
                | (Self::Matched, Self::Settled | Self::Cancelled)
        )
    }
}

impl std::fmt::Display for RfqStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PendingAttestation => write!(f, "PENDING_ATTESTATION"),
            Self::Open => write!(f, "OPEN"),
            Self::Matched => write!(f, "MATCHED"),
            Self::Settled => write!(f, "SETTLED"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// A state-changing operation, named in guard failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RfqOperation {
    Attest,
    Quote,
    Match,
    Settle,
    Cancel,
}

impl std::fmt::Display for RfqOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attest => write!(f, "attest"),
            Self::Quote => write!(f, "quote"),
            Self::Match => write!(f, "match"),
            Self::Settle => write!(f, "settle"),
            Self::Cancel => write!(f, "cancel"),
        }
    }
}

/// The maker-supplied fields an order hash commits to, already resolved
/// and validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFields {
    pub maker: Address,
    pub base: Address,
    pub quote: Address,
    pub size: Amount,
    pub min_price: Amount,
    /// Unix seconds.
    pub expiry: u64,
}

/// Core RFQ record. Exclusively owns its attestation map and mask.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub rfq_id: RfqId,
    pub order_hash: OrderHash,
    pub maker: Address,
    pub base: Address,
    pub quote: Address,
    pub size: Amount,
    pub min_price: Amount,
    /// Unix seconds.
    pub expiry: u64,
    pub status: RfqStatus,
    pub attest_mask: u8,
    pub attestations: AttestationMap,
    /// Unix seconds.
    pub created_at: u64,
}

impl Order {
    /// Build a fresh order in `PENDING_ATTESTATION`.
    #[must_use]
    pub fn new(rfq_id: RfqId, order_hash: OrderHash, fields: OrderFields, created_at: u64) -> Self {
        Self {
            rfq_id,
            order_hash,
            maker: fields.maker,
            base: fields.base,
            quote: fields.quote,
            size: fields.size,
            min_price: fields.min_price,
            expiry: fields.expiry,
            status: RfqStatus::PendingAttestation,
            attest_mask: 0,
            attestations: AttestationMap::new(),
            created_at,
        }
    }

    /// The fields the order hash commits to.
    #[must_use]
    pub fn fields(&self) -> OrderFields {
        OrderFields {
            maker: self.maker,
            base: self.base,
            quote: self.quote,
            size: self.size.clone(),
            min_price: self.min_price.clone(),
            expiry: self.expiry,
        }
    }

    #[must_use]
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expiry <= now
    }

    /// Seconds until expiry, saturating at zero.
    #[must_use]
    pub fn seconds_left(&self, now: u64) -> u64 {
        self.expiry.saturating_sub(now)
    }

    #[must_use]
    pub fn summary(&self) -> RfqSummary {
        RfqSummary {
            rfq_id: self.rfq_id,
            order_hash: self.order_hash,
            base: self.base,
            quote: self.quote,
            size: self.size.clone(),
            min_price: self.min_price.clone(),
            expiry: self.expiry,
            status: self.status,
            attest_mask: self.attest_mask,
        }
    }
}

/// Listing view of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RfqSummary {
    pub rfq_id: RfqId,
    pub order_hash: OrderHash,
    pub base: Address,
    pub quote: Address,
    pub size: Amount,
    pub min_price: Amount,
    pub expiry: u64,
    pub status: RfqStatus,
    pub attest_mask: u8,
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl OrderFields {
    /// One base unit (1e18) at a minimum price of 1.0, expiring at `expiry`.
    pub fn dummy(maker: Address, expiry: u64) -> Self {
        Self {
            maker,
            base: Address([0x10; 20]),
            quote: Address([0x20; 20]),
            size: Amount::from(1_000_000_000_000_000_000u64),
            min_price: Amount::from(1_000_000u64),
            expiry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_matches_wire_form() {
        for status in [
            RfqStatus::PendingAttestation,
            RfqStatus::Open,
            RfqStatus::Matched,
            RfqStatus::Settled,
            RfqStatus::Expired,
            RfqStatus::Cancelled,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }

    #[test]
    fn terminal_statuses() {
        assert!(RfqStatus::Settled.is_terminal());
        assert!(RfqStatus::Expired.is_terminal());
        assert!(RfqStatus::Cancelled.is_terminal());
        assert!(!RfqStatus::Matched.is_terminal());
    }

    #[test]
    fn transitions_valid() {
        assert!(RfqStatus::PendingAttestation.can_transition_to(RfqStatus::Open));
        assert!(RfqStatus::Open.can_transition_to(RfqStatus::Matched));
        assert!(RfqStatus::Matched.can_transition_to(RfqStatus::Settled));
        assert!(RfqStatus::Matched.can_transition_to(RfqStatus::Cancelled));
    }

    #[test]
    fn transitions_invalid() {
        assert!(!RfqStatus::PendingAttestation.can_transition_to(RfqStatus::Matched));
        assert!(!RfqStatus::Open.can_transition_to(RfqStatus::PendingAttestation));
        assert!(!RfqStatus::Matched.can_transition_to(RfqStatus::Expired));
        assert!(!RfqStatus::Settled.can_transition_to(RfqStatus::Cancelled));
        assert!(!RfqStatus::Expired.can_transition_to(RfqStatus::Open));
    }

    #[test]
    fn new_order_is_pending() {
        let fields = OrderFields::dummy(Address([1; 20]), 1_000);
        let order = Order::new(RfqId::new(), OrderHash::ZERO, fields.clone(), 400);
        assert_eq!(order.status, RfqStatus::PendingAttestation);
        assert_eq!(order.attest_mask, 0);
        assert_eq!(order.fields(), fields);
        assert_eq!(order.seconds_left(400), 600);
        assert!(order.is_expired_at(1_000));
        assert!(!order.is_expired_at(999));
    }
}
