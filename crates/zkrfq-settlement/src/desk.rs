//! The RFQ desk: the engine's public surface.
//!
//! The desk owns the store and the settlement claims behind one lock and
//! talks to the attestation issuer and the settlement ledger. Those calls
//! are the only suspension points, and the lock is never held across them.
//! Every state-changing operation re-locks, refreshes and guards
//! immediately before it commits.
//!
//! ```text
//! settle:  read domain ─▶ lock{refresh, guard, re-verify, claim} ─▶ ledger.settle
//!            ─▶ lock{MATCHED → SETTLED, commit claim}   (failure: release claim)
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use zkrfq_codec::{LocalSigner, keccak256, quote_digest, verify_signer};
use zkrfq_ingress::{AttestationIssuer, DeterministicIssuer, RfqStore, guard};
use zkrfq_types::{
    Address, Amount, AttestationKind, AttestationMap, Clock, EngineConfig, Order, OrderFields,
    OrderHash, Quote, QuoteCommitment, QuoteId, QuoteSubmission, QuoteTerms, RawSignature,
    Result, RfqError, RfqId, RfqOperation, RfqRequest, RfqStatus, RfqSummary, SettlementReceipt,
    SystemClock, Trade, TradeId, expected_quote_amount,
};

use crate::{
    claims::SettlementClaims,
    ledger::{DryRunLedger, SettleCall, SettlementLedger},
    preflight::{PreflightReport, evaluate, prepare},
};

/// Successful outcome of [`RfqDesk::handle`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RfqResponse {
    Order(Order),
    Quote(Quote),
    Preflight(PreflightReport),
    Trade(Trade),
    Settlement(SettlementReceipt),
    #[serde(rename_all = "camelCase")]
    Attestations {
        order_hash: OrderHash,
        attestations: AttestationMap,
    },
    Rfqs {
        rfqs: Vec<RfqSummary>,
    },
    Reset,
}

/// Store and claims, always locked together.
#[derive(Default)]
struct DeskState {
    store: RfqStore,
    claims: SettlementClaims,
}

pub struct RfqDesk {
    config: EngineConfig,
    state: Mutex<DeskState>,
    ledger: Arc<dyn SettlementLedger>,
    issuer: Arc<dyn AttestationIssuer>,
    clock: Arc<dyn Clock>,
    /// Nonce source for server-signed quotes.
    nonce: AtomicU64,
}

impl RfqDesk {
    /// Create a desk over the given collaborators.
    pub fn new(
        config: EngineConfig,
        ledger: Arc<dyn SettlementLedger>,
        issuer: Arc<dyn AttestationIssuer>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let nonce = AtomicU64::new(clock.now());
        tracing::info!(
            quote_ttl_secs = config.quote_ttl_secs,
            skip_onchain = config.skip_onchain,
            register_rfq_onchain = config.register_rfq_onchain,
            "RFQ desk ready"
        );
        Ok(Self {
            config,
            state: Mutex::new(DeskState::default()),
            ledger,
            issuer,
            clock,
            nonce,
        })
    }

    /// A desk with no external dependencies: in-memory ledger,
    /// hash-derived attestations and the system clock.
    pub fn dry_run(config: EngineConfig) -> Result<Self> {
        Self::new(
            config,
            Arc::new(DryRunLedger::default()),
            Arc::new(DeterministicIssuer),
            Arc::new(SystemClock),
        )
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn now(&self) -> u64 {
        self.clock.now()
    }

    fn writes_enabled(&self, call: &'static str) -> bool {
        let enabled = self.config.ledger_writes_enabled();
        if !enabled {
            tracing::warn!(call, "skip_onchain set: ledger write skipped");
        }
        enabled
    }

    // ---------------------------------------------------------------
    // Operations
    // ---------------------------------------------------------------

    /// Create an RFQ and, if configured, register it on the ledger.
    ///
    /// A failed registration removes the order again.
    pub async fn create_rfq(&self, fields: OrderFields) -> Result<Order> {
        let order = self.state.lock().store.create_order(fields, self.now())?;

        if self.config.register_rfq_onchain && self.writes_enabled("createRFQ") {
            if let Err(e) = self.ledger.create_rfq(&order.order_hash, order.expiry).await {
                tracing::warn!(rfq_id = %order.rfq_id, error = %e, "createRFQ failed, discarding order");
                self.state.lock().store.discard(&order.rfq_id);
                return Err(e);
            }
        }
        Ok(order)
    }

    /// Obtain an attestation per circuit from the issuer, record each on
    /// the ledger, then on the order.
    pub async fn submit_attestations(
        &self,
        rfq_id: RfqId,
        inputs: Vec<(AttestationKind, serde_json::Value)>,
    ) -> Result<Order> {
        if inputs.is_empty() {
            return Err(RfqError::MissingPublicInputs);
        }
        let order_hash = {
            let mut state = self.state.lock();
            let now = self.now();
            let order = state.store.status(rfq_id, now)?;
            guard(&order, RfqOperation::Attest, now)?;
            order.order_hash
        };

        let mut order = None;
        for (kind, public_inputs) in inputs {
            let attestation_id = self
                .issuer
                .submit_proof(kind, &public_inputs)
                .await
                .map_err(|e| match e {
                    err @ RfqError::AttestationIssuer { .. } => err,
                    other => RfqError::AttestationIssuer {
                        circuit: kind.circuit().to_string(),
                        reason: other.to_string(),
                    },
                })?;
            if self.writes_enabled("recordAttestation") {
                self.ledger
                    .record_attestation(&attestation_id, &order_hash, kind.type_code())
                    .await?;
            }
            order = Some(self.state.lock().store.record_attestation(
                rfq_id,
                kind,
                attestation_id,
                self.now(),
            )?);
        }
        order.ok_or(RfqError::MissingPublicInputs)
    }

    /// Verify and store a maker-signed quote.
    pub async fn submit_quote(&self, submission: QuoteSubmission) -> Result<Quote> {
        let domain = self.ledger.domain_separator().await?;
        self.state
            .lock()
            .store
            .submit_quote(submission, &domain, self.now())
    }

    /// Build, sign and submit a quote on the maker's behalf.
    ///
    /// The quote covers the full order size, expires `quote_ttl_secs` from
    /// now and uses a fresh nonce.
    pub async fn issue_signed_quote(
        &self,
        rfq_id: RfqId,
        signer: &LocalSigner,
        taker: Address,
        price: Amount,
    ) -> Result<Quote> {
        let domain = self.ledger.domain_separator().await?;
        let now = self.now();
        let order = self.state.lock().store.status(rfq_id, now)?;
        if signer.address() != order.maker {
            return Err(RfqError::SignatureMismatch {
                expected: order.maker,
                recovered: Some(signer.address()),
            });
        }

        let terms = QuoteTerms {
            taker,
            quote_amount: Some(expected_quote_amount(&order.size, &price)),
            price,
            size: order.size.clone(),
            valid_until: now + self.config.quote_ttl_secs,
            nonce: Amount::from(self.nonce.fetch_add(1, Ordering::Relaxed)),
        };
        let commitment = QuoteCommitment {
            order_hash: order.order_hash,
            maker: order.maker,
            quote_amount: expected_quote_amount(&terms.size, &terms.price),
            valid_until: terms.valid_until,
            nonce: terms.nonce.clone(),
        };
        let (_, digest) = quote_digest(&domain, &commitment)?;
        let signature = RawSignature::from(signer.sign_digest(&digest)?);

        self.state.lock().store.submit_quote(
            QuoteSubmission {
                rfq_id,
                terms,
                signature,
            },
            &domain,
            self.now(),
        )
    }

    /// Non-mutating settleability check.
    pub async fn preflight(&self, rfq_id: RfqId, terms: QuoteTerms) -> Result<PreflightReport> {
        let now = self.now();
        let order = self.state.lock().store.status(rfq_id, now)?;
        let prepared = prepare(&order, &terms, now)?;

        let domain = self.ledger.domain_separator().await?;
        let readings = self
            .ledger
            .readings(&order.order_hash, &prepared.quote_hash)
            .await?;
        let report = evaluate(&order, &terms, prepared, domain, readings, now);
        tracing::info!(
            %rfq_id,
            settleable = report.settleable,
            issues = report.issues.len(),
            "preflight evaluated"
        );
        Ok(report)
    }

    /// Match an `OPEN` order with one of its quotes.
    pub fn match_quote(&self, rfq_id: RfqId, quote_id: QuoteId) -> Result<Trade> {
        self.state
            .lock()
            .store
            .match_quote(rfq_id, quote_id, self.now())
    }

    /// Settle a matched trade on the ledger, at most once.
    pub async fn settle(&self, trade_id: TradeId) -> Result<SettlementReceipt> {
        let domain = self.ledger.domain_separator().await?;

        let ctx = {
            let mut state = self.state.lock();
            let now = self.now();
            let ctx = state.store.settle_context(trade_id, now)?;
            let (_, digest) =
                quote_digest(&domain, &ctx.quote.commitment(ctx.order.order_hash, ctx.order.maker))?;
            verify_signer(&digest, ctx.quote.signature.as_slice(), &ctx.order.maker)?;
            state.claims.claim(trade_id, ctx.order.rfq_id)?;
            ctx
        };
        tracing::info!(%trade_id, rfq_id = %ctx.order.rfq_id, "settlement claimed");

        let submitted = self.writes_enabled("settle");
        let tx_hash = if submitted {
            let call = SettleCall::from_context(&ctx);
            let result = match call {
                Ok(call) => self.ledger.settle(&call).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(tx) => tx,
                Err(e) => {
                    self.state.lock().claims.release(&trade_id);
                    tracing::warn!(%trade_id, error = %e, "settlement failed, claim released");
                    return Err(e);
                }
            }
        } else {
            keccak256(format!("skipped:{trade_id}"))
        };

        let mut state = self.state.lock();
        let receipt = SettlementReceipt {
            trade_id,
            rfq_id: ctx.order.rfq_id,
            tx_hash,
            submitted,
            settled_at: self.now(),
        };
        // the ledger has accepted; never let this trade be claimed again
        state.claims.commit(trade_id);
        state.store.complete_settlement(receipt.clone())?;
        Ok(receipt)
    }

    /// Cancel an order. Refused while a settlement is in flight.
    pub async fn cancel(&self, rfq_id: RfqId) -> Result<Order> {
        let order_hash = {
            let mut state = self.state.lock();
            if let Some(trade_id) = state.claims.in_flight_for(&rfq_id) {
                return Err(RfqError::SettlementInFlight(trade_id));
            }
            let now = self.now();
            let order = state.store.status(rfq_id, now)?;
            guard(&order, RfqOperation::Cancel, now)?;
            order.order_hash
        };

        if self.config.register_rfq_onchain && self.writes_enabled("cancelRFQ") {
            self.ledger.cancel_rfq(&order_hash).await?;
        }

        let mut state = self.state.lock();
        if let Some(trade_id) = state.claims.in_flight_for(&rfq_id) {
            return Err(RfqError::SettlementInFlight(trade_id));
        }
        state.store.cancel(rfq_id, self.now())
    }

    /// Current view of an order.
    pub fn status(&self, rfq_id: RfqId) -> Result<Order> {
        self.state.lock().store.status(rfq_id, self.now())
    }

    pub fn attestations(&self, rfq_id: RfqId) -> Result<(OrderHash, AttestationMap)> {
        self.state.lock().store.attestations(rfq_id, self.now())
    }

    /// Orders in `status` (default `OPEN`).
    pub fn list_rfqs(&self, status: Option<RfqStatus>) -> Vec<RfqSummary> {
        self.state.lock().store.list(status, self.now())
    }

    /// Drop every order, quote, trade and claim.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.store.clear();
        state.claims.clear();
    }

    // ---------------------------------------------------------------
    // Boundary
    // ---------------------------------------------------------------

    /// Dispatch one validated boundary request.
    pub async fn handle(&self, request: RfqRequest) -> Result<RfqResponse> {
        tracing::debug!(?request, "handling request");
        Ok(match request {
            RfqRequest::CreateRfq(body) => RfqResponse::Order(self.create_rfq(body.validate()?).await?),
            RfqRequest::SubmitAttestations(body) => {
                let inputs = body.validate()?;
                RfqResponse::Order(self.submit_attestations(body.rfq_id, inputs).await?)
            }
            RfqRequest::SubmitQuote(body) => {
                RfqResponse::Quote(self.submit_quote(body.submission()?).await?)
            }
            RfqRequest::Preflight(body) => {
                RfqResponse::Preflight(self.preflight(body.rfq_id, body.terms()?).await?)
            }
            RfqRequest::Match { rfq_id, quote_id } => {
                RfqResponse::Trade(self.match_quote(rfq_id, quote_id)?)
            }
            RfqRequest::Settle { trade_id } => RfqResponse::Settlement(self.settle(trade_id).await?),
            RfqRequest::Cancel { rfq_id } => RfqResponse::Order(self.cancel(rfq_id).await?),
            RfqRequest::Status { rfq_id } => RfqResponse::Order(self.status(rfq_id)?),
            RfqRequest::Attestations { rfq_id } => {
                let (order_hash, attestations) = self.attestations(rfq_id)?;
                RfqResponse::Attestations {
                    order_hash,
                    attestations,
                }
            }
            RfqRequest::ListRfqs { status } => RfqResponse::Rfqs {
                rfqs: self.list_rfqs(status),
            },
            RfqRequest::Reset => {
                self.reset();
                RfqResponse::Reset
            }
        })
    }

    /// Decode, dispatch and render one JSON request.
    ///
    /// Failures render as `{"error": {"code", "kind", "message"}}`.
    pub async fn handle_json(&self, body: &str) -> serde_json::Value {
        let outcome = match RfqRequest::from_json(body) {
            Ok(request) => self.handle(request).await,
            Err(e) => Err(e),
        };
        match outcome.and_then(|resp| Ok(serde_json::to_value(resp)?)) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(code = %e.code(), kind = %e.kind(), error = %e, "request rejected");
                serde_json::json!({
                    "error": {
                        "code": e.code(),
                        "kind": e.kind().as_str(),
                        "message": e.to_string(),
                    }
                })
            }
        }
    }
}
