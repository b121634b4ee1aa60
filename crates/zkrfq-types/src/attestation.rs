//! Attestation kinds and the per-order kind → identifier map.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{AttestationId, RfqError, constants};

/// The property an attestation proves about an order's maker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationKind {
    Kyc,
    Solvency,
    Whitelist,
    /// Best-execution proof. Carried through settlement but never counted
    /// toward [`constants::REQUIRED_MASK`].
    #[serde(rename = "bestexec")]
    BestExec,
}

impl AttestationKind {
    /// Kinds that must all be present before an order opens.
    pub const REQUIRED: [Self; 3] = [Self::Kyc, Self::Solvency, Self::Whitelist];

    pub const ALL: [Self; 4] = [Self::Kyc, Self::Solvency, Self::Whitelist, Self::BestExec];

    /// Bit contributed to the attestation mask (zero for `BestExec`).
    #[must_use]
    pub fn mask_bit(self) -> u8 {
        match self {
            Self::Kyc => constants::KYC_BIT,
            Self::Solvency => constants::SOLVENCY_BIT,
            Self::Whitelist => constants::WHITELIST_BIT,
            Self::BestExec => 0,
        }
    }

    /// Type code passed to the ledger's `recordAttestation`.
    ///
    /// The bit index of the kind, so `1 << code == mask_bit()` for counted kinds.
    #[must_use]
    pub fn type_code(self) -> u8 {
        match self {
            Self::Kyc => 0,
            Self::Solvency => 1,
            Self::Whitelist => 2,
            Self::BestExec => 3,
        }
    }

    /// Circuit name used by the attestation issuer.
    #[must_use]
    pub fn circuit(self) -> &'static str {
        match self {
            Self::Kyc => "kyc",
            Self::Solvency => "solvency",
            Self::Whitelist => "whitelist",
            Self::BestExec => "bestexec",
        }
    }
}

impl fmt::Display for AttestationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.circuit())
    }
}

impl FromStr for AttestationKind {
    type Err = RfqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.circuit().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RfqError::UnknownAttestationKind(s.to_string()))
    }
}

/// At most one attestation identifier per kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttestationMap(BTreeMap<AttestationKind, AttestationId>);

impl AttestationMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an identifier, replacing any previous one for the same kind.
    pub fn insert(&mut self, kind: AttestationKind, id: AttestationId) -> Option<AttestationId> {
        self.0.insert(kind, id)
    }

    #[must_use]
    pub fn get(&self, kind: AttestationKind) -> Option<&AttestationId> {
        self.0.get(&kind)
    }

    /// Identifier for `kind`, or the zero word if absent.
    #[must_use]
    pub fn get_or_zero(&self, kind: AttestationKind) -> AttestationId {
        self.0.get(&kind).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttestationKind, &AttestationId)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(AttestationKind, AttestationId)> for AttestationMap {
    fn from_iter<T: IntoIterator<Item = (AttestationKind, AttestationId)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
