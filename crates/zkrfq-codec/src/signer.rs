//! Local secp256k1 maker signer.
//!
//! Signs prehashed signing digests and emits the 65-byte `r ‖ s ‖ v` form
//! the verifier and the ledger accept.

use std::fmt;

use k256::ecdsa::SigningKey;
use zkrfq_types::{Address, Bytes32, Result, RfqError, constants, decode_hex};

use crate::signature::address_from_verifying_key;

/// A maker key held in process.
pub struct LocalSigner {
    key: SigningKey,
    address: Address,
}

impl LocalSigner {
    /// Create from a hex private key (with or without `0x`).
    pub fn from_hex(private_key_hex: &str) -> Result<Self> {
        let bytes = decode_hex("private_key", private_key_hex)?;
        let key = SigningKey::from_slice(&bytes)
            .map_err(|e| RfqError::Configuration(format!("invalid signing key: {e}")))?;
        let address = address_from_verifying_key(key.verifying_key());
        Ok(Self { key, address })
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte digest. `v` is 27 or 28.
    pub fn sign_digest(&self, digest: &Bytes32) -> Result<[u8; constants::SIGNATURE_LEN]> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|e| RfqError::Internal(format!("signing failed: {e}")))?;
        let mut out = [0u8; constants::SIGNATURE_LEN];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = 27 + recovery_id.to_byte();
        Ok(out)
    }
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Well-known development keys. Never fund these.
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_keys {
    pub const MAKER_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    pub const MAKER_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    pub const OTHER_KEY: &str =
        "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
    pub const OTHER_ADDRESS: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
}
