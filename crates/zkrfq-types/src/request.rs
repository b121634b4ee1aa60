//! Boundary request schema.
//!
//! The transport layer deserializes one [`RfqRequest`] per call. Bodies carry
//! raw strings for addresses and amounts; `validate` resolves them into the
//! typed inputs the core accepts, so a malformed address surfaces as
//! `MisconfiguredAddress` rather than an opaque decode failure.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    Address, Amount, AttestationKind, OrderFields, QuoteId, QuoteSubmission, QuoteTerms,
    RawSignature, Result, RfqError, RfqId, RfqStatus, TradeId,
};

/// One operation against the RFQ engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RfqRequest {
    CreateRfq(CreateRfqRequest),
    SubmitAttestations(AttestationRequest),
    SubmitQuote(QuoteRequest),
    Preflight(QuoteRequest),
    #[serde(rename_all = "camelCase")]
    Match { rfq_id: RfqId, quote_id: QuoteId },
    #[serde(rename_all = "camelCase")]
    Settle { trade_id: TradeId },
    #[serde(rename_all = "camelCase")]
    Cancel { rfq_id: RfqId },
    #[serde(rename_all = "camelCase")]
    Status { rfq_id: RfqId },
    #[serde(rename_all = "camelCase")]
    Attestations { rfq_id: RfqId },
    ListRfqs {
        #[serde(default)]
        status: Option<RfqStatus>,
    },
    Reset,
}

impl RfqRequest {
    /// Decode a JSON request body.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Body of `create_rfq`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRfqRequest {
    pub maker: String,
    pub base: String,
    pub quote: String,
    pub size: String,
    pub min_price: String,
    pub expiry: u64,
}

impl CreateRfqRequest {
    pub fn validate(&self) -> Result<OrderFields> {
        let size = Amount::parse("size", &self.size)?;
        if size.is_zero() {
            return Err(RfqError::InvalidAmount {
                field: "size",
                reason: "must be > 0".to_string(),
            });
        }
        Ok(OrderFields {
            maker: Address::parse_nonzero("maker", &self.maker)?,
            base: Address::parse_nonzero("base", &self.base)?,
            quote: Address::parse_nonzero("quote", &self.quote)?,
            size,
            min_price: Amount::parse("minPrice", &self.min_price)?,
            expiry: self.expiry,
        })
    }
}

/// Body of `submit_attestations`: public inputs per circuit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationRequest {
    pub rfq_id: RfqId,
    pub public_inputs: BTreeMap<String, serde_json::Value>,
}

impl AttestationRequest {
    /// Resolve circuit names into kinds, in ascending kind order.
    pub fn validate(&self) -> Result<Vec<(AttestationKind, serde_json::Value)>> {
        if self.public_inputs.is_empty() {
            return Err(RfqError::MissingPublicInputs);
        }
        let mut inputs = self
            .public_inputs
            .iter()
            .map(|(name, value)| Ok((name.parse::<AttestationKind>()?, value.clone())))
            .collect::<Result<Vec<_>>>()?;
        inputs.sort_by_key(|(kind, _)| *kind);
        inputs.dedup_by_key(|(kind, _)| *kind);
        Ok(inputs)
    }
}

/// Body of `submit_quote` and `preflight`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub rfq_id: RfqId,
    pub taker: String,
    pub price: String,
    pub size: String,
    #[serde(default)]
    pub quote_amount: Option<String>,
    pub valid_until: u64,
    pub nonce: String,
    #[serde(default)]
    pub signature: Option<String>,
}

impl QuoteRequest {
    /// Resolve the quote terms; the signature is not required.
    pub fn terms(&self) -> Result<QuoteTerms> {
        Ok(QuoteTerms {
            taker: Address::parse_nonzero("taker", &self.taker)?,
            price: Amount::parse("price", &self.price)?,
            size: Amount::parse("size", &self.size)?,
            quote_amount: self
                .quote_amount
                .as_deref()
                .map(|s| Amount::parse("quoteAmount", s))
                .transpose()?,
            valid_until: self.valid_until,
            nonce: Amount::parse("nonce", &self.nonce)?,
        })
    }

    /// Resolve a full signed submission.
    ///
    /// A missing signature is reported as a zero-length signature.
    pub fn submission(&self) -> Result<QuoteSubmission> {
        let signature = match self.signature.as_deref() {
            Some(s) => s.parse::<RawSignature>()?,
            None => return Err(RfqError::InvalidSignatureLength { len: 0 }),
        };
        Ok(QuoteSubmission {
            rfq_id: self.rfq_id,
            terms: self.terms()?,
            signature,
        })
    }
}
