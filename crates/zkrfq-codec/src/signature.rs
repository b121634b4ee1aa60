//! Signature verifier: recover the signer of a signing digest.
//!
//! Signatures are 65 bytes `r ‖ s ‖ v`. Legacy `v` values (0/1) are
//! normalized to 27/28 before recovery.

use k256::{
    PublicKey,
    ecdsa::{RecoveryId, Signature, VerifyingKey},
    elliptic_curve::sec1::ToEncodedPoint,
};
use zkrfq_types::{Address, Bytes32, Result, RfqError, constants};

use crate::commitment::keccak256;

/// A signature split into its ledger call arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// Always 27 or higher.
    pub v: u8,
}

/// Split a 65-byte signature, normalizing `v`.
///
/// # Errors
/// `InvalidSignatureLength` for any other length.
pub fn split_signature(sig: &[u8]) -> Result<SplitSignature> {
    if sig.len() != constants::SIGNATURE_LEN {
        return Err(RfqError::InvalidSignatureLength { len: sig.len() });
    }
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&sig[..32]);
    s.copy_from_slice(&sig[32..64]);
    let mut v = sig[64];
    if v < 27 {
        v += 27;
    }
    Ok(SplitSignature { r, s, v })
}

/// Address of a secp256k1 public key: the last 20 bytes of the keccak of
/// its uncompressed point.
#[must_use]
pub fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let point = PublicKey::from(key).to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut addr = [0u8; constants::ADDRESS_LEN];
    addr.copy_from_slice(&hash.as_bytes()[12..]);
    Address(addr)
}

/// Recover the address that signed `digest`.
///
/// Returns `Ok(None)` when the bytes have the right length but do not
/// recover to any key, or when `s` is in the upper half of the curve order.
pub fn recover_signer(digest: &Bytes32, sig: &[u8]) -> Result<Option<Address>> {
    let split = split_signature(sig)?;
    let Some(recovery_id) = split.v.checked_sub(27).and_then(RecoveryId::from_byte) else {
        return Ok(None);
    };
    let Ok(signature) = Signature::from_slice(&sig[..64]) else {
        return Ok(None);
    };
    // The ledger rejects high-s signatures, so the malleated twin of a valid
    // signature must not verify here either.
    if signature.normalize_s().is_some() {
        tracing::debug!(digest = %digest.short(), "high-s signature rejected");
        return Ok(None);
    }
    Ok(
        VerifyingKey::recover_from_prehash(digest.as_bytes(), &signature, recovery_id)
            .ok()
            .map(|key| address_from_verifying_key(&key)),
    )
}

/// Check that `sig` over `digest` was produced by `expected`.
///
/// # Errors
/// - `InvalidSignatureLength` if `sig` is not 65 bytes.
/// - `SignatureMismatch` if it recovers to another address, or to none.
pub fn verify_signer(digest: &Bytes32, sig: &[u8], expected: &Address) -> Result<Address> {
    let recovered = recover_signer(digest, sig)?;
    match recovered {
        Some(addr) if addr == *expected => Ok(addr),
        _ => {
            tracing::debug!(
                %expected,
                recovered = ?recovered,
                digest = %digest.short(),
                "signature does not recover to expected signer"
            );
            Err(RfqError::SignatureMismatch {
                expected: *expected,
                recovered,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;
    use crate::signer::{LocalSigner, test_keys};

    fn digest() -> Bytes32 {
        keccak256(b"zkrfq signature test")
    }

    #[test]
    fn length_checked_first() {
        for len in [0usize, 64, 66, 130] {
            let err = verify_signer(&digest(), &vec![0u8; len], &Address([1; 20])).unwrap_err();
            assert!(
                matches!(err, RfqError::InvalidSignatureLength { len: l } if l == len),
                "Got: {err:?}"
            );
        }
    }

    #[test]
    fn legacy_v_normalized() {
        let mut sig = [0u8; 65];
        sig[64] = 1;
        assert_eq!(split_signature(&sig).unwrap().v, 28);
        sig[64] = 27;
        assert_eq!(split_signature(&sig).unwrap().v, 27);
    }

    #[test]
    fn known_key_address() {
        let signer = LocalSigner::from_hex(test_keys::MAKER_KEY).unwrap();
        assert_eq!(signer.address().to_string(), test_keys::MAKER_ADDRESS);
    }

    #[test]
    fn round_trip_recovers_signer() {
        let signer = LocalSigner::from_hex(test_keys::MAKER_KEY).unwrap();
        let sig = signer.sign_digest(&digest()).unwrap();
        assert_eq!(
            verify_signer(&digest(), &sig, &signer.address()).unwrap(),
            signer.address()
        );
    }

    #[test]
    fn legacy_v_signature_still_verifies() {
        let signer = LocalSigner::from_hex(test_keys::MAKER_KEY).unwrap();
        let mut sig = signer.sign_digest(&digest()).unwrap();
        sig[64] -= 27;
        assert!(verify_signer(&digest(), &sig, &signer.address()).is_ok());
    }

    #[test]
    fn wrong_signer_is_mismatch() {
        let maker = LocalSigner::from_hex(test_keys::MAKER_KEY).unwrap();
        let other = LocalSigner::from_hex(test_keys::OTHER_KEY).unwrap();
        let sig = other.sign_digest(&digest()).unwrap();
        let err = verify_signer(&digest(), &sig, &maker.address()).unwrap_err();
        match err {
            RfqError::SignatureMismatch { expected, recovered } => {
                assert_eq!(expected, maker.address());
                assert_eq!(recovered, Some(other.address()));
            }
            other => panic!("expected SignatureMismatch, got {other:?}"),
        }
    }

    #[test]
    fn any_flipped_byte_is_mismatch() {
        let signer = LocalSigner::from_hex(test_keys::MAKER_KEY).unwrap();
        let sig = signer.sign_digest(&digest()).unwrap();
        let mut rng = rand::thread_rng();
        for idx in 0..65 {
            let mut tampered = sig;
            tampered[idx] ^= 1u8 << rng.gen_range(0..8);
            let err = verify_signer(&digest(), &tampered, &signer.address()).unwrap_err();
            assert!(
                matches!(err, RfqError::SignatureMismatch { .. }),
                "byte {idx}: {err:?}"
            );
        }
    }

    #[test]
    fn different_digest_is_mismatch() {
        let signer = LocalSigner::from_hex(test_keys::MAKER_KEY).unwrap();
        let sig = signer.sign_digest(&digest()).unwrap();
        let other = keccak256(b"another payload");
        assert!(matches!(
            verify_signer(&other, &sig, &signer.address()),
            Err(RfqError::SignatureMismatch { .. })
        ));
    }

    #[test]
    fn zero_signature_recovers_nothing() {
        let mut sig = [0u8; 65];
        sig[64] = 27;
        assert_eq!(recover_signer(&digest(), &sig).unwrap(), None);
    }

    #[test]
    fn malleated_high_s_twin_is_rejected() {
        let signer = LocalSigner::from_hex(test_keys::MAKER_KEY).unwrap();
        let sig = signer.sign_digest(&digest()).unwrap();
        let parsed = Signature::from_slice(&sig[..64]).unwrap();
        assert!(parsed.normalize_s().is_none(), "signer emits low-s");

        // (r, n - s, v ^ 1) recovers the same key under lax rules
        let s: k256::Scalar = *parsed.s().as_ref();
        let mut twin = sig;
        twin[32..64].copy_from_slice(&(-s).to_bytes());
        twin[64] ^= 1;
        assert_ne!(twin, sig);

        assert_eq!(recover_signer(&digest(), &twin).unwrap(), None);
        let err = verify_signer(&digest(), &twin, &signer.address()).unwrap_err();
        assert!(
            matches!(err, RfqError::SignatureMismatch { recovered: None, .. }),
            "Got: {err:?}"
        );
    }
}
