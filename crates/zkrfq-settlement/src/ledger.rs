//! Settlement ledger seam.
//!
//! The ledger is the external system of record. Its reads feed preflight,
//! its writes register RFQs, record attestations and settle trades. The
//! ledger's own enforcement is not reimplemented here; [`DryRunLedger`]
//! only keeps the bookkeeping the reads report.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use zkrfq_codec::{SplitSignature, keccak256, quote_struct_hash, split_signature};
use zkrfq_ingress::SettleContext;
use zkrfq_types::{
    Address, Amount, AttestationId, AttestationKind, Bytes32, OrderHash, QuoteCommitment, Result,
    RfqError, constants,
};

/// Arguments of the ledger's `settle` call.
#[derive(Debug, Clone)]
pub struct SettleCall {
    pub commitment: QuoteCommitment,
    pub signature: SplitSignature,
    pub solvency_att: AttestationId,
    pub kyc_att: AttestationId,
    pub whitelist_att: AttestationId,
    /// Zero when no best-execution proof was recorded.
    pub best_exec_att: AttestationId,
    pub taker: Address,
    pub base: Address,
    pub quote: Address,
    pub size: Amount,
    pub price: Amount,
}

impl SettleCall {
    /// Assemble the call from a guarded settlement snapshot.
    pub fn from_context(ctx: &SettleContext) -> Result<Self> {
        let atts = &ctx.trade.attestations;
        Ok(Self {
            commitment: ctx.quote.commitment(ctx.order.order_hash, ctx.order.maker),
            signature: split_signature(ctx.quote.signature.as_slice())?,
            solvency_att: atts.get_or_zero(AttestationKind::Solvency),
            kyc_att: atts.get_or_zero(AttestationKind::Kyc),
            whitelist_att: atts.get_or_zero(AttestationKind::Whitelist),
            best_exec_att: atts.get_or_zero(AttestationKind::BestExec),
            taker: ctx.quote.taker,
            base: ctx.order.base,
            quote: ctx.order.quote,
            size: ctx.trade.size.clone(),
            price: ctx.trade.price.clone(),
        })
    }
}

/// Ledger-reported flags for one order/quote pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReadings {
    pub mask: u8,
    pub attestation_ok: bool,
    pub is_open: bool,
    pub used_order: bool,
    pub used_quote: bool,
}

#[async_trait]
pub trait SettlementLedger: Send + Sync {
    async fn attestation_mask(&self, order_hash: &OrderHash) -> Result<u8>;
    async fn attestation_ok(&self, order_hash: &OrderHash) -> Result<bool>;
    async fn is_open(&self, order_hash: &OrderHash) -> Result<bool>;
    async fn used_order(&self, order_hash: &OrderHash) -> Result<bool>;
    async fn used_quote(&self, quote_hash: &Bytes32) -> Result<bool>;
    async fn domain_separator(&self) -> Result<Bytes32>;

    /// Returns the transaction hash.
    async fn record_attestation(
        &self,
        attestation_id: &AttestationId,
        order_hash: &OrderHash,
        type_code: u8,
    ) -> Result<Bytes32>;
    async fn create_rfq(&self, order_hash: &OrderHash, expiry: u64) -> Result<Bytes32>;
    async fn cancel_rfq(&self, order_hash: &OrderHash) -> Result<Bytes32>;
    async fn settle(&self, call: &SettleCall) -> Result<Bytes32>;

    /// All preflight reads for one order/quote pair.
    async fn readings(&self, order_hash: &OrderHash, quote_hash: &Bytes32) -> Result<LedgerReadings> {
        Ok(LedgerReadings {
            mask: self.attestation_mask(order_hash).await?,
            attestation_ok: self.attestation_ok(order_hash).await?,
            is_open: self.is_open(order_hash).await?,
            used_order: self.used_order(order_hash).await?,
            used_quote: self.used_quote(quote_hash).await?,
        })
    }
}

// ---------------------------------------------------------------------------
// DryRunLedger
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct DryRunState {
    masks: HashMap<OrderHash, u8>,
    open: HashSet<OrderHash>,
    used_orders: HashSet<OrderHash>,
    used_quotes: HashSet<Bytes32>,
    tx_count: u64,
}

impl DryRunState {
    fn next_tx(&mut self, call: &str) -> Bytes32 {
        self.tx_count += 1;
        keccak256(format!("dry-run:{call}:{}", self.tx_count))
    }
}

/// In-memory ledger for `skip_onchain` deployments and tests.
#[derive(Debug)]
pub struct DryRunLedger {
    domain_separator: Bytes32,
    state: Mutex<DryRunState>,
}

impl DryRunLedger {
    #[must_use]
    pub fn new(domain_separator: Bytes32) -> Self {
        Self {
            domain_separator,
            state: Mutex::new(DryRunState::default()),
        }
    }

    /// Number of write calls accepted so far.
    #[must_use]
    pub fn tx_count(&self) -> u64 {
        self.state.lock().tx_count
    }
}

impl Default for DryRunLedger {
    fn default() -> Self {
        Self::new(keccak256(format!("{}:dry-run-domain", constants::ENGINE_NAME)))
    }
}

fn rejected(call: &'static str, reason: &str) -> RfqError {
    RfqError::Ledger {
        call,
        reason: reason.to_string(),
    }
}

#[async_trait]
impl SettlementLedger for DryRunLedger {
    async fn attestation_mask(&self, order_hash: &OrderHash) -> Result<u8> {
        Ok(self.state.lock().masks.get(order_hash).copied().unwrap_or(0))
    }

    async fn attestation_ok(&self, order_hash: &OrderHash) -> Result<bool> {
        let mask = self.attestation_mask(order_hash).await?;
        Ok(mask & constants::REQUIRED_MASK == constants::REQUIRED_MASK)
    }

    async fn is_open(&self, order_hash: &OrderHash) -> Result<bool> {
        Ok(self.state.lock().open.contains(order_hash))
    }

    async fn used_order(&self, order_hash: &OrderHash) -> Result<bool> {
        Ok(self.state.lock().used_orders.contains(order_hash))
    }

    async fn used_quote(&self, quote_hash: &Bytes32) -> Result<bool> {
        Ok(self.state.lock().used_quotes.contains(quote_hash))
    }

    async fn domain_separator(&self) -> Result<Bytes32> {
        Ok(self.domain_separator)
    }

    async fn record_attestation(
        &self,
        attestation_id: &AttestationId,
        order_hash: &OrderHash,
        type_code: u8,
    ) -> Result<Bytes32> {
        if type_code > 7 {
            return Err(rejected("recordAttestation", "type code out of range"));
        }
        let mut state = self.state.lock();
        *state.masks.entry(*order_hash).or_default() |= 1u8 << type_code;
        let tx = state.next_tx("recordAttestation");
        tracing::debug!(
            order_hash = %order_hash.short(),
            attestation_id = %attestation_id.short(),
            type_code,
            "dry-run recordAttestation"
        );
        Ok(tx)
    }

    async fn create_rfq(&self, order_hash: &OrderHash, expiry: u64) -> Result<Bytes32> {
        let mut state = self.state.lock();
        if state.used_orders.contains(order_hash) {
            return Err(rejected("createRFQ", "order already used"));
        }
        state.open.insert(*order_hash);
        tracing::debug!(order_hash = %order_hash.short(), expiry, "dry-run createRFQ");
        Ok(state.next_tx("createRFQ"))
    }

    async fn cancel_rfq(&self, order_hash: &OrderHash) -> Result<Bytes32> {
        let mut state = self.state.lock();
        state.open.remove(order_hash);
        Ok(state.next_tx("cancelRFQ"))
    }

    async fn settle(&self, call: &SettleCall) -> Result<Bytes32> {
        let quote_hash = quote_struct_hash(&call.commitment)?;
        let order_hash = call.commitment.order_hash;
        let mut state = self.state.lock();
        if state.used_orders.contains(&order_hash) {
            return Err(rejected("settle", "order already used"));
        }
        if state.used_quotes.contains(&quote_hash) {
            return Err(rejected("settle", "quote already used"));
        }
        state.used_orders.insert(order_hash);
        state.used_quotes.insert(quote_hash);
        state.open.remove(&order_hash);
        let tx = state.next_tx("settle");
        tracing::debug!(
            order_hash = %order_hash.short(),
            taker = %call.taker,
            size = %call.size,
            price = %call.price,
            v = call.signature.v,
            "dry-run settle"
        );
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commitment(nonce: u64) -> QuoteCommitment {
        QuoteCommitment {
            order_hash: Bytes32([0xAB; 32]),
            maker: Address([1; 20]),
            quote_amount: Amount::from(10u64),
            valid_until: 100,
            nonce: Amount::from(nonce),
        }
    }

    fn call(nonce: u64) -> SettleCall {
        SettleCall {
            commitment: commitment(nonce),
            signature: SplitSignature {
                r: [1; 32],
                s: [2; 32],
                v: 27,
            },
            solvency_att: Bytes32([3; 32]),
            kyc_att: Bytes32([4; 32]),
            whitelist_att: Bytes32([5; 32]),
            best_exec_att: Bytes32::ZERO,
            taker: Address([6; 20]),
            base: Address([7; 20]),
            quote: Address([8; 20]),
            size: Amount::from(10u64),
            price: Amount::from(1_000_000u64),
        }
    }

    #[tokio::test]
    async fn attestation_mask_accumulates() {
        let ledger = DryRunLedger::default();
        let oh = Bytes32([0xAB; 32]);
        for kind in AttestationKind::REQUIRED {
            assert!(!ledger.attestation_ok(&oh).await.unwrap());
            ledger
                .record_attestation(&Bytes32([9; 32]), &oh, kind.type_code())
                .await
                .unwrap();
        }
        assert_eq!(ledger.attestation_mask(&oh).await.unwrap(), constants::REQUIRED_MASK);
        assert!(ledger.attestation_ok(&oh).await.unwrap());

        // bestexec sets its own bit without disturbing the required ones
        ledger
            .record_attestation(&Bytes32([9; 32]), &oh, AttestationKind::BestExec.type_code())
            .await
            .unwrap();
        assert_eq!(ledger.attestation_mask(&oh).await.unwrap(), 0b1111);
        assert!(ledger.attestation_ok(&oh).await.unwrap());
    }

    #[tokio::test]
    async fn open_then_settle_marks_used() {
        let ledger = DryRunLedger::default();
        let oh = Bytes32([0xAB; 32]);
        ledger.create_rfq(&oh, 100).await.unwrap();
        assert!(ledger.is_open(&oh).await.unwrap());

        let c = call(1);
        let quote_hash = quote_struct_hash(&c.commitment).unwrap();
        let tx = ledger.settle(&c).await.unwrap();
        assert!(!tx.is_zero());

        let readings = ledger.readings(&oh, &quote_hash).await.unwrap();
        assert!(!readings.is_open);
        assert!(readings.used_order);
        assert!(readings.used_quote);
    }

    #[tokio::test]
    async fn replayed_settle_rejected() {
        let ledger = DryRunLedger::default();
        ledger.settle(&call(1)).await.unwrap();
        let err = ledger.settle(&call(2)).await.unwrap_err();
        assert!(matches!(err, RfqError::Ledger { call: "settle", .. }), "Got: {err:?}");
    }

    #[tokio::test]
    async fn tx_hashes_unique() {
        let ledger = DryRunLedger::default();
        let oh = Bytes32([1; 32]);
        let a = ledger.create_rfq(&oh, 10).await.unwrap();
        let b = ledger.cancel_rfq(&oh).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(ledger.tx_count(), 2);
        assert!(!ledger.is_open(&oh).await.unwrap());
    }
}
