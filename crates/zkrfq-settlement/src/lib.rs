//! # zkrfq-settlement
//!
//! **Finality plane**: preflight checks, the settlement ledger seam,
//! at-most-once settlement, and the [`RfqDesk`] that fronts the engine.
//!
//! ## Architecture
//!
//! The desk receives requests from the transport boundary and:
//! 1. Drives the intake store (create, attest, quote, match)
//! 2. Compares local state with ledger readings in a preflight
//! 3. Claims a trade before calling the ledger, so it settles at most once
//! 4. Commits `MATCHED → SETTLED` with the ledger's transaction hash
//!
//! ## Ledger writes
//!
//! With `skip_onchain` set, no ledger write is sent. Reads still are, and
//! settlement produces a receipt marked `submitted: false`.

pub mod claims;
pub mod desk;
pub mod ledger;
pub mod preflight;

pub use claims::SettlementClaims;
pub use desk::{RfqDesk, RfqResponse};
pub use ledger::{DryRunLedger, LedgerReadings, SettleCall, SettlementLedger};
pub use preflight::{PreflightIssue, PreflightReport, PreparedQuote, evaluate, prepare};
