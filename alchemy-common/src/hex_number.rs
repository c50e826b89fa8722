//! Unsigned 256 bit quantities as they travel over JSON-RPC.
//!
//! Nodes send quantities as `0x` prefixed hex strings, users tend to type
//! decimal strings and code mostly deals in native integers. [`HexNumber`]
//! accepts all three and always writes the canonical hex form.
use std::{fmt, str::FromStr};

use alloy_primitives::{hex, U256};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum HexNumberError {
    #[error("Invalid numeric format: {0:?}. Expected a decimal integer or a 0x prefixed hex integer")]
    InvalidFormat(String),
    #[error("Numeric value does not fit into 256 bits: {0}")]
    Overflow(String),
}

/// An unsigned 256 bit integer that compares by value regardless of the
/// representation it was created from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HexNumber(U256);

impl HexNumber {
    pub const ZERO: HexNumber = HexNumber(U256::ZERO);

    /// Lowercase `0x` hex without leading zeros, `"0x0"` for zero.
    pub fn as_hex(&self) -> String {
        let encoded = hex::encode(self.0.to_be_bytes::<32>());
        let trimmed = encoded.trim_start_matches('0');
        if trimmed.is_empty() {
            "0x0".to_string()
        } else {
            format!("0x{trimmed}")
        }
    }

    pub fn as_int(&self) -> U256 {
        self.0
    }

    pub fn as_decimal_string(&self) -> String {
        self.0.to_string()
    }

    /// Returns `None` if the value does not fit into a `u64`.
    pub fn try_as_u64(&self) -> Option<u64> {
        if self.0 > U256::from(u64::MAX) {
            return None;
        }
        Some(self.0.as_limbs()[0])
    }
}

impl FromStr for HexNumber {
    type Err = HexNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (digits, radix) = match s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
        {
            Some(hex_digits) => (hex_digits, 16u64),
            None => (s, 10u64),
        };

        // `from_str_radix` tolerates `_` separators, so validate upfront.
        let valid = !digits.is_empty() &&
            digits.chars().all(|c| match radix {
                16 => c.is_ascii_hexdigit(),
                _ => c.is_ascii_digit(),
            });
        if !valid {
            return Err(HexNumberError::InvalidFormat(s.to_string()));
        }

        U256::from_str_radix(digits, radix)
            .map(HexNumber)
            .map_err(|_| HexNumberError::Overflow(s.to_string()))
    }
}

macro_rules! impl_from_native {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for HexNumber {
                fn from(value: $ty) -> Self {
                    HexNumber(U256::from(value))
                }
            }
        )*
    };
}

impl_from_native!(u8, u16, u32, u64, u128, usize);

impl From<U256> for HexNumber {
    fn from(value: U256) -> Self {
        HexNumber(value)
    }
}

impl From<HexNumber> for U256 {
    fn from(value: HexNumber) -> Self {
        value.0
    }
}

impl fmt::Display for HexNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_hex())
    }
}

impl Serialize for HexNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_hex())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Text(String),
    Native(u64),
}

impl<'de> Deserialize<'de> for HexNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawNumber::deserialize(deserializer)? {
            RawNumber::Text(text) => text
                .parse()
                .map_err(de::Error::custom),
            RawNumber::Native(value) => Ok(HexNumber::from(value)),
        }
    }
}

/// Serde adapter for `u64` fields that nodes encode as hex quantities.
///
/// Use with `#[serde(with = "crate::hex_number::quantity")]`.
pub mod quantity {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::HexNumber;

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&HexNumber::from(*value).as_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let number = HexNumber::deserialize(deserializer)?;
        number
            .try_as_u64()
            .ok_or_else(|| de::Error::custom(format!("quantity {number} exceeds u64")))
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        use super::super::HexNumber;

        pub fn serialize<S: Serializer>(
            value: &Option<u64>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => super::serialize(v, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<u64>, D::Error> {
            let number = Option::<HexNumber>::deserialize(deserializer)?;
            number
                .map(|n| {
                    n.try_as_u64()
                        .ok_or_else(|| serde::de::Error::custom(format!("quantity {n} exceeds u64")))
                })
                .transpose()
        }
    }
}
