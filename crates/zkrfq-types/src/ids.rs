//! Server-assigned identifiers for RFQs, quotes and trades.
//!
//! All entity IDs use UUIDv7 for time-ordered sorting. On the wire they
//! carry a short kind prefix (`rfq_`, `q_`, `t_`) so an identifier pasted
//! into the wrong endpoint fails to parse instead of silently missing.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::RfqError;

macro_rules! prefixed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Wire prefix, including the trailing underscore.
            pub const PREFIX: &'static str = concat!($prefix, "_");

            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            #[must_use]
            pub fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(Uuid::from_bytes(bytes))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", Self::PREFIX, self.0.simple())
            }
        }

        impl FromStr for $name {
            type Err = RfqError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix(Self::PREFIX).ok_or_else(|| RfqError::InvalidIdentifier {
                    value: s.to_string(),
                    expected_prefix: Self::PREFIX,
                })?;
                Uuid::parse_str(raw)
                    .map(Self)
                    .map_err(|_| RfqError::InvalidIdentifier {
                        value: s.to_string(),
                        expected_prefix: Self::PREFIX,
                    })
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

prefixed_id!(
    /// Identifier of an RFQ (one maker order).
    RfqId,
    "rfq"
);

prefixed_id!(
    /// Identifier of a signed quote.
    QuoteId,
    "q"
);

prefixed_id!(
    /// Identifier of a matched trade.
    TradeId,
    "t"
);
