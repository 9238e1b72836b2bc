//! Value types shared by the claim and fulfillment paths.
//!
//! Identities, key hashes and request ids are fixed-width byte strings that
//! travel as `0x`-prefixed hex. Amounts are 18-decimal token quantities held
//! in base units.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A 32-byte random word delivered by the oracle.
pub type Randomness = [u8; 32];

/// Base units per whole token (ETH and LINK both use 18 decimals).
pub const UNITS_PER_TOKEN: u128 = 1_000_000_000_000_000_000;

/// Error returned when a hex-encoded identifier cannot be parsed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseHexError {
    #[error("expected {expected} bytes, got {found}")]
    InvalidLength { expected: usize, found: usize },
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], ParseHexError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if digits.len() != N * 2 {
        return Err(ParseHexError::InvalidLength {
            expected: N,
            found: digits.len() / 2,
        });
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(digits, &mut out)?;
    Ok(out)
}

macro_rules! hex_identifier {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = ParseHexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_fixed::<$len>(s.trim()).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
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

hex_identifier!(
    /// A 20-byte account or contract identity.
    Address,
    20
);

hex_identifier!(
    /// Selects which oracle key (and proving path) serves a request.
    KeyHash,
    32
);

hex_identifier!(
    /// Opaque identifier the oracle issues at request time and echoes back
    /// on fulfillment.
    RequestId,
    32
);

/// An 18-decimal token amount in base units (wei for ETH).
///
/// `Display` renders whole-token units with trailing zeros trimmed, so
/// `Amount::from_wei(100_000_000_000_000_000)` prints as `0.1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_wei(wei: u128) -> Self {
        Self(wei)
    }

    pub const fn wei(self) -> u128 {
        self.0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / UNITS_PER_TOKEN;
        let frac = self.0 % UNITS_PER_TOKEN;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let frac = format!("{frac:018}");
        write!(f, "{whole}.{}", frac.trim_end_matches('0'))
    }
}

/// Parses a decimal base-unit string (`"100000000000000000"`).
impl FromStr for Amount {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u128>().map(Amount)
    }
}

// u128 does not survive JSON number round-trips, so amounts travel as strings.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
