use std::{
    fmt::Display,
    ops::{Add, AddAssign, Mul, Sub},
};

use serde::{Deserialize, Serialize};

use super::{electricity::Kwh, number::Number};

/// A price consisting of a value excluding VAT, and a value including VAT.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Price {
    /// The price excluding VAT.
    pub excl_vat: Money,
    /// The price including VAT.
    pub incl_vat: Money,
}

impl Price {
    /// A price of zero in both fields.
    pub fn zero() -> Self {
        Self {
            excl_vat: Money::zero(),
            incl_vat: Money::zero(),
        }
    }

    /// Tariff clamp bounds use an all-zero price to mean "no bound".
    pub fn is_unset(&self) -> bool {
        self.excl_vat.is_zero() && self.incl_vat.is_zero()
    }
}

impl Add for Price {
    type Output = Price;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            excl_vat: self.excl_vat + rhs.excl_vat,
            incl_vat: self.incl_vat + rhs.incl_vat,
        }
    }
}

impl AddAssign for Price {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// A monetary amount in minor currency units, the currency is specified by the
/// tariff.
#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Money(Number);

impl Money {
    pub(crate) fn zero() -> Self {
        Self(Number::zero())
    }

    /// Whether this amount is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// The cost of `energy` at this price per kWh, floored to whole minor
    /// units.
    pub(crate) fn energy_cost(self, energy: Kwh) -> Money {
        Self(self.0.saturating_mul(energy.into()).floor())
    }

    /// The cost of a whole number of `minutes` at this price per minute.
    pub(crate) fn minutes_cost(self, minutes: i64) -> Money {
        Self(self.0.saturating_mul(Number::from(minutes)).floor())
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Mul<Number> for Money {
    type Output = Money;

    fn mul(self, rhs: Number) -> Self::Output {
        Self(self.0.saturating_mul(rhs))
    }
}

impl From<Money> for Number {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl From<Number> for Money {
    fn from(value: Number) -> Self {
        Self(value)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value.into())
    }
}

impl From<rust_decimal::Decimal> for Money {
    fn from(value: rust_decimal::Decimal) -> Self {
        Self(value.into())
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A VAT percentage, restricted to whole percents between 0 and 100.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize)]
#[serde(transparent)]
pub struct Vat(u8);

impl Vat {
    /// Construct a VAT percentage, rejecting values above 100.
    pub fn new(percent: u8) -> Option<Self> {
        (percent <= 100).then_some(Self(percent))
    }

    /// The whole percent value.
    pub fn percent(self) -> u8 {
        self.0
    }

    /// Add VAT on top of `amount`: the increment is floored to whole minor
    /// units before adding, so the result stays on the integer grid.
    pub(crate) fn apply(self, amount: Money) -> Money {
        let increment = Number::from(amount)
            .saturating_mul(Number::from(self.0))
            .checked_div(Number::from(100u64))
            .unwrap_or_else(|| unreachable!("divisor is non-zero"))
            .floor();

        amount + Money::from(increment)
    }
}

impl<'de> Deserialize<'de> for Vat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let percent = u8::deserialize(deserializer)?;
        Vat::new(percent).ok_or_else(|| D::Error::custom("VAT percentage out of range"))
    }
}

impl Display for Vat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}
