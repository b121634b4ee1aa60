//! Attestation tracker.
//!
//! The mask is always recomputed from the attestation map, never cached
//! across refreshes.

use zkrfq_types::{AttestationKind, AttestationMap, constants};

/// OR of the bit for every kind present with a non-zero identifier.
#[must_use]
pub fn compute_mask(attestations: &AttestationMap) -> u8 {
    attestations
        .iter()
        .filter(|(_, id)| !id.is_zero())
        .fold(0u8, |mask, (kind, _)| mask | kind.mask_bit())
}

/// Whether every required kind is present.
#[must_use]
pub fn is_complete(mask: u8) -> bool {
    mask == constants::REQUIRED_MASK
}

/// Required kinds not yet reflected in `mask`.
#[must_use]
pub fn missing_kinds(mask: u8) -> Vec<AttestationKind> {
    AttestationKind::REQUIRED
        .into_iter()
        .filter(|k| mask & k.mask_bit() == 0)
        .collect()
}
