use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::number::Number;

/// A value of kilo watt hours.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Default)]
#[serde(transparent)]
pub struct Kwh(Number);

impl Kwh {
    pub(crate) fn zero() -> Self {
        Self(Number::zero())
    }

    /// Saturating addition
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl From<Kwh> for rust_decimal::Decimal {
    fn from(value: Kwh) -> Self {
        value.0.into()
    }
}

impl From<rust_decimal::Decimal> for Kwh {
    fn from(value: rust_decimal::Decimal) -> Self {
        Self(value.into())
    }
}

impl From<Kwh> for Number {
    fn from(value: Kwh) -> Self {
        value.0
    }
}

impl From<Number> for Kwh {
    fn from(value: Number) -> Self {
        Self(value)
    }
}

impl Display for Kwh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// A value of kilo watts.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Default)]
#[serde(transparent)]
pub struct Kw(Number);

impl From<Kw> for rust_decimal::Decimal {
    fn from(value: Kw) -> Self {
        value.0.into()
    }
}

impl From<rust_decimal::Decimal> for Kw {
    fn from(value: rust_decimal::Decimal) -> Self {
        Self(value.into())
    }
}

/// A value of amperes.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Default)]
#[serde(transparent)]
pub struct Ampere(Number);

impl From<Number> for Ampere {
    fn from(value: Number) -> Self {
        Self(value)
    }
}

impl From<Ampere> for rust_decimal::Decimal {
    fn from(value: Ampere) -> Self {
        value.0.into()
    }
}

impl From<rust_decimal::Decimal> for Ampere {
    fn from(value: rust_decimal::Decimal) -> Self {
        Self(value.into())
    }
}

/// A value of volts, reported by the meter but not restricted on.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Default)]
#[serde(transparent)]
pub struct Volt(Number);

impl From<rust_decimal::Decimal> for Volt {
    fn from(value: rust_decimal::Decimal) -> Self {
        Self(value.into())
    }
}
