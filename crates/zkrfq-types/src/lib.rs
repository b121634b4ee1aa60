//! # zkrfq-types
//!
//! Shared types, errors, and configuration for the **zkrfq** RFQ engine.
//!
//! This crate is the leaf dependency of the workspace: every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`RfqId`], [`QuoteId`], [`TradeId`]
//! - **Primitives**: [`Address`], [`Bytes32`], [`Amount`], [`RawSignature`]
//! - **Order model**: [`Order`], [`OrderFields`], [`RfqStatus`], [`RfqOperation`]
//! - **Attestations**: [`AttestationKind`], [`AttestationMap`]
//! - **Quote model**: [`Quote`], [`QuoteCommitment`], [`QuoteTerms`], [`QuoteSubmission`]
//! - **Trade model**: [`Trade`], [`SettlementReceipt`]
//! - **Requests**: [`RfqRequest`], the tagged request schema of the transport boundary
//! - **Configuration**: [`EngineConfig`], [`ChainConfig`]
//! - **Time**: [`Clock`], [`SystemClock`], [`ManualClock`]
//! - **Errors**: [`RfqError`] with `RFQ_ERR_` prefix codes
//! - **Constants**: fixed wire values (`PRICE_SCALE`, `REQUIRED_MASK`, ...)

pub mod attestation;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod order;
pub mod primitives;
pub mod quote;
pub mod request;
pub mod trade;

// Re-export all primary types at crate root for ergonomic imports:
//   use zkrfq_types::{Order, Quote, Trade, RfqError, ...};

pub use attestation::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use order::*;
pub use primitives::*;
pub use quote::*;
pub use request::*;
pub use trade::*;

// Constants are accessed via `zkrfq_types::constants::FOO`
// (not re-exported to avoid name collisions).
