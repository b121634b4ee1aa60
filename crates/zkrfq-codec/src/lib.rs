//! # zkrfq-codec
//!
//! **Pure commitment codec and signature verifier for zkrfq.**
//!
//! The codec is the crypto plane -- it produces the exact bytes the
//! settlement ledger hashes, and decides who signed them. It has:
//!
//! - **Zero side effects**: no store access, no ledger calls, no clock
//! - **Wire-exact output**: digests match the ledger's own struct hash byte for byte
//! - **One hash function**: keccak256 for orders, quotes, digests and attestation ids
//! - **Concurrency-safe**: every function is free of shared mutable state

pub mod commitment;
pub mod signature;
pub mod signer;

pub use commitment::{
    attestation_id_from, encode_quote, keccak256, order_digest, order_digest_preimage,
    quote_digest, quote_struct_hash, quote_typehash, signing_digest,
};
pub use signature::{SplitSignature, recover_signer, split_signature, verify_signer};
pub use signer::LocalSigner;
