//! # zkrfq-ingress
//!
//! **Order intake plane**: attestation tracking, the lifecycle state
//! machine, and the process-wide RFQ store.
//!
//! ## Architecture
//!
//! 1. **Attestation tracker**: folds per-kind identifiers into a bitmask
//! 2. **Lifecycle**: lazy refresh, guard checks, and status transitions
//! 3. **RfqStore**: sole owner of orders, quotes, trades and receipts
//! 4. **AttestationIssuer**: the seam to the external proof service
//!
//! ## Operation Flow
//!
//! ```text
//! create → attest (×3) → refresh → OPEN → quote (sig verified) → match → MATCHED
//! ```
//!
//! Every state-changing store call refreshes and guards the order
//! immediately before it mutates anything.

pub mod attestation;
pub mod issuer;
pub mod lifecycle;
pub mod store;

pub use attestation::{compute_mask, is_complete, missing_kinds};
pub use issuer::{AttestationIssuer, DeterministicIssuer};
pub use lifecycle::{guard, next_status, refresh, transition};
pub use store::{RfqStore, SettleContext};
