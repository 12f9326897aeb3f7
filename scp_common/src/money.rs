use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------       Money         ---------------------------------------------------------
/// A monetary amount in minor currency units (cents). Stored as a signed 64-bit integer so that order arithmetic is
/// exact; fractional results of percentage operations round half away from zero to the nearest cent.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a monetary amount: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {} is too large to convert to Money", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.abs();
        write!(f, "{sign}{}.{:02}", cents / 100, cents % 100)
    }
}

impl Money {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Whole major units, e.g. `Money::from_major(100)` is 100.00.
    pub fn from_major(units: i64) -> Self {
        Self(units * 100)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// `percent` percent of this amount, rounded half away from zero to the nearest cent.
    pub fn percentage(&self, percent: f64) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        Self((self.0 as f64 * percent / 100.0).round() as i64)
    }

    /// This amount reduced by `percent` percent. A 10% discount on 100.00 yields 90.00.
    pub fn discounted(&self, percent: f64) -> Self {
        *self - self.percentage(percent)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic_and_sum() {
        let a = Money::from_major(4) + Money::from_cents(50);
        assert_eq!(a.value(), 450);
        assert_eq!((a - Money::from_cents(50)).value(), 400);
        assert_eq!((a * 2).value(), 900);
        let total: Money = vec![Money::from_cents(100), Money::from_cents(23)].into_iter().sum();
        assert_eq!(total.value(), 123);
    }

    #[test]
    fn percentage_rounds_to_nearest_cent() {
        assert_eq!(Money::from_major(450).percentage(10.0), Money::from_major(45));
        // 33.33 * 15% = 4.9995 -> 5.00
        assert_eq!(Money::from_cents(3333).percentage(15.0), Money::from_cents(500));
    }

    #[test]
    fn discount_matches_order_pricing_example() {
        // 100.00 at 10% discount -> 90.00; five units -> 450.00; 10% tax -> 45.00
        let unit = Money::from_major(100).discounted(10.0);
        assert_eq!(unit, Money::from_major(90));
        let subtotal = unit * 5;
        assert_eq!(subtotal, Money::from_major(450));
        assert_eq!(subtotal.percentage(10.0), Money::from_major(45));
        assert_eq!(subtotal + subtotal.percentage(10.0), Money::from_major(495));
    }

    #[test]
    fn display_formats_minor_units() {
        assert_eq!(Money::from_cents(49500).to_string(), "495.00");
        assert_eq!(Money::from_cents(-101).to_string(), "-1.01");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
    }
}
