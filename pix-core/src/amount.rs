//! This module defines the `Amount` struct, a charge value in centavos (the minor unit of BRL).
//!
//! An `Amount` is always greater than zero. It can be parsed from the loosely typed `value` field
//! sent by the web front end, which may arrive as a JSON number or as a numeric string.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::PixCoreError;

/// Largest integer a JSON number can carry without losing precision in a browser.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "u64", into = "u64")]
pub struct Amount(u64);

impl Amount {
    /// Charged when the request carries no `value`.
    pub const DEFAULT_CHARGE: Self = Self(1_000);

    pub fn new(centavos: u64) -> Result<Self, PixCoreError> {
        if centavos == 0 {
            return Err(PixCoreError::InvalidAmount(Value::from(centavos)));
        }
        Ok(Self(centavos))
    }

    pub const fn centavos(&self) -> u64 {
        self.0
    }

    /// Parses the `value` field of an incoming request.
    ///
    /// Accepts positive integers, floats without a fractional part and strings holding a positive
    /// integer. Everything else is rejected with [`PixCoreError::InvalidAmount`].
    pub fn from_json(value: &Value) -> Result<Self, PixCoreError> {
        let invalid = || PixCoreError::InvalidAmount(value.clone());

        match value {
            Value::Number(number) => {
                if let Some(centavos) = number.as_u64() {
                    return Self::new(centavos).map_err(|_| invalid());
                }
                if number.is_i64() {
                    return Err(invalid());
                }
                match number.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 && f > 0.0 && f <= MAX_SAFE_INTEGER => {
                        Ok(Self(f as u64))
                    }
                    _ => Err(invalid()),
                }
            }
            Value::String(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| invalid())
                .and_then(|centavos| Self::new(centavos).map_err(|_| invalid())),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<u64> for Amount {
    type Error = PixCoreError;

    fn try_from(centavos: u64) -> Result<Self, Self::Error> {
        Self::new(centavos)
    }
}

impl From<Amount> for u64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "R$ {},{:02}", self.0 / 100, self.0 % 100)
    }
}
