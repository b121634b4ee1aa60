//! Commitment codec: the byte sequences whose hashes are authoritative both
//! here and on the settlement ledger.
//!
//! Field order, widths and textual forms below are a wire contract. Changing
//! any of them invalidates every signature already issued.

use serde_json::json;
use sha3::{Digest, Keccak256};
use zkrfq_types::{
    AttestationId, Bytes32, OrderFields, OrderHash, QuoteCommitment, Result, constants,
};

/// Keccak-256 of `data`.
#[must_use]
pub fn keccak256(data: impl AsRef<[u8]>) -> Bytes32 {
    let result = Keccak256::digest(data.as_ref());
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    Bytes32(out)
}

/// `maker|base|quote|size|minPrice|expiry` with lowercase hex addresses
/// and base-10 integers.
#[must_use]
pub fn order_digest_preimage(fields: &OrderFields) -> String {
    format!(
        "{}|{}|{}|{}|{}|{}",
        fields.maker, fields.base, fields.quote, fields.size, fields.min_price, fields.expiry
    )
}

/// Deterministic order hash.
#[must_use]
pub fn order_digest(fields: &OrderFields) -> OrderHash {
    let digest = keccak256(order_digest_preimage(fields));
    tracing::debug!(order_hash = %digest, "order digest computed");
    digest
}

/// Hash of the commitment struct schema.
#[must_use]
pub fn quote_typehash() -> Bytes32 {
    keccak256(constants::QUOTE_COMMITMENT_TYPE)
}

/// ABI-style encoding of `(typehash, orderHash, maker, quoteAmount,
/// validUntil, nonce)`: six big-endian 32-byte words.
///
/// # Errors
/// `InvalidAmount` if `quoteAmount` or `nonce` exceeds 256 bits.
pub fn encode_quote(commitment: &QuoteCommitment) -> Result<Vec<u8>> {
    let mut valid_until = [0u8; 32];
    valid_until[24..].copy_from_slice(&commitment.valid_until.to_be_bytes());

    let mut out = Vec::with_capacity(6 * 32);
    out.extend_from_slice(quote_typehash().as_bytes());
    out.extend_from_slice(commitment.order_hash.as_bytes());
    out.extend_from_slice(&commitment.maker.to_word());
    out.extend_from_slice(&commitment.quote_amount.to_word("quoteAmount")?);
    out.extend_from_slice(&valid_until);
    out.extend_from_slice(&commitment.nonce.to_word("nonce")?);
    Ok(out)
}

/// Struct hash of a quote commitment. Also the ledger's `quoteHash`.
pub fn quote_struct_hash(commitment: &QuoteCommitment) -> Result<Bytes32> {
    Ok(keccak256(encode_quote(commitment)?))
}

/// `keccak256(0x1901 ‖ domainSeparator ‖ structHash)`.
#[must_use]
pub fn signing_digest(domain_separator: &Bytes32, struct_hash: &Bytes32) -> Bytes32 {
    let mut buf = [0u8; 2 + 32 + 32];
    buf[..2].copy_from_slice(&constants::SIGNING_PREFIX);
    buf[2..34].copy_from_slice(domain_separator.as_bytes());
    buf[34..].copy_from_slice(struct_hash.as_bytes());
    keccak256(buf)
}

/// Struct hash and signing digest of a commitment in one pass.
pub fn quote_digest(
    domain_separator: &Bytes32,
    commitment: &QuoteCommitment,
) -> Result<(Bytes32, Bytes32)> {
    let struct_hash = quote_struct_hash(commitment)?;
    let digest = signing_digest(domain_separator, &struct_hash);
    tracing::debug!(
        struct_hash = %struct_hash.short(),
        digest = %digest.short(),
        "quote digest computed"
    );
    Ok((struct_hash, digest))
}

/// Identifier for a proof over `public_inputs` in the named circuit.
///
/// Hash of the compact JSON `{"body": .., "circuit": ..}`.
#[must_use]
pub fn attestation_id_from(circuit: &str, public_inputs: &serde_json::Value) -> AttestationId {
    let payload = json!({ "circuit": circuit, "body": public_inputs });
    keccak256(payload.to_string())
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;
    use zkrfq_types::{Address, Amount};

    use super::*;

    fn hex32(s: &str) -> Bytes32 {
        Bytes32::parse("golden", s).unwrap()
    }

    fn golden_commitment() -> QuoteCommitment {
        QuoteCommitment {
            order_hash: Bytes32([0x11; 32]),
            maker: "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap(),
            quote_amount: Amount::from(1_000_000_000_000u64),
            valid_until: 1_700_000_060,
            nonce: Amount::from(42u64),
        }
    }

    fn golden_order() -> OrderFields {
        OrderFields {
            maker: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap(),
            base: "0x1000000000000000000000000000000000000001".parse().unwrap(),
            quote: "0x1000000000000000000000000000000000000002".parse().unwrap(),
            size: Amount::from(1_000_000_000_000_000_000u64),
            min_price: Amount::from(1_000_000u64),
            expiry: 1_700_000_600,
        }
    }

    #[test]
    fn keccak_empty_input() {
        assert_eq!(
            keccak256(b""),
            hex32("0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );
    }

    #[test]
    fn typehash_golden() {
        assert_eq!(
            quote_typehash(),
            hex32("0xf32945f6b3eb2b09799c78fbeec53b1fef625f199cd632615bad17d51a3d5350")
        );
    }

    #[test]
    fn struct_hash_golden() {
        assert_eq!(
            quote_struct_hash(&golden_commitment()).unwrap(),
            hex32("0x81dd04fbe57e3bad0847c5724a8ecd546051563c362c3033e86b0972f0e49082")
        );
    }

    #[test]
    fn signing_digest_golden() {
        let (struct_hash, digest) =
            quote_digest(&Bytes32([0x22; 32]), &golden_commitment()).unwrap();
        assert_eq!(signing_digest(&Bytes32([0x22; 32]), &struct_hash), digest);
        assert_eq!(
            digest,
            hex32("0x7506c97dc41db41f9b4c2a80b2d79706b5251dd1cbde8a9159177eb11415f5fb")
        );
    }

    #[test]
    fn encoding_layout() {
        let encoded = encode_quote(&golden_commitment()).unwrap();
        assert_eq!(encoded.len(), 192);
        assert_eq!(&encoded[32..64], &[0x11; 32]);
        // maker is left-padded
        assert_eq!(&encoded[64..76], &[0u8; 12]);
        // validUntil occupies the low 8 bytes of its word
        assert_eq!(&encoded[128..152], &[0u8; 24]);
        assert_eq!(&encoded[152..160], &1_700_000_060u64.to_be_bytes());
        assert_eq!(encoded[191], 42);
    }

    #[test]
    fn oversized_amount_rejected() {
        let mut c = golden_commitment();
        c.nonce = Amount(BigUint::from(1u8) << 256usize);
        assert!(quote_struct_hash(&c).is_err());
    }

    #[test]
    fn order_preimage_is_canonical() {
        assert_eq!(
            order_digest_preimage(&golden_order()),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266|\
             0x1000000000000000000000000000000000000001|\
             0x1000000000000000000000000000000000000002|\
             1000000000000000000|1000000|1700000600"
        );
    }

    #[test]
    fn order_digest_golden() {
        assert_eq!(
            order_digest(&golden_order()),
            hex32("0x9c8e5a9bc69879698ac97da2372cd610b99663f3f2c821bc21bf98071e5a851c")
        );
    }

    #[test]
    fn order_digest_sensitive_to_every_field() {
        let base = order_digest(&golden_order());
        let mut variants = Vec::new();

        let mut f = golden_order();
        f.maker = Address([0x33; 20]);
        variants.push(f);
        let mut f = golden_order();
        f.base = Address([0x44; 20]);
        variants.push(f);
        let mut f = golden_order();
        f.quote = Address([0x55; 20]);
        variants.push(f);
        let mut f = golden_order();
        f.size = Amount::from(1u64);
        variants.push(f);
        let mut f = golden_order();
        f.min_price = Amount::from(2u64);
        variants.push(f);
        let mut f = golden_order();
        f.expiry += 1;
        variants.push(f);

        for v in &variants {
            assert_ne!(order_digest(v), base);
            assert_eq!(order_digest(v), order_digest(v));
        }
    }

    #[test]
    fn attestation_id_is_deterministic_per_circuit() {
        let inputs = json!({ "commitment": "0x02", "threshold": 5 });
        let a = attestation_id_from("kyc", &inputs);
        assert_eq!(a, attestation_id_from("kyc", &inputs));
        assert_ne!(a, attestation_id_from("solvency", &inputs));
        assert_ne!(a, attestation_id_from("kyc", &json!({ "commitment": "0x03" })));
        assert!(!a.is_zero());
    }
}
