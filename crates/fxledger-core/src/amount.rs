//! Amount type representing a decimal quantity of a commodity.
//!
//! An [`Amount`] is the "monetary" value handed between the rate core and
//! report code: a signed decimal paired with the [`Commodity`] it is counted
//! in. Arithmetic is only meaningful between equivalent commodities.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use crate::Commodity;

/// A quantity paired with a commodity.
///
/// # Examples
///
/// ```
/// use fxledger_core::{Amount, Commodity};
/// use rust_decimal_macros::dec;
///
/// let usd = Commodity::currency("USD");
/// let amount = Amount::new(dec!(100.00), usd.clone());
/// let other = Amount::new(dec!(50.00), usd);
///
/// let sum = &amount + &other;
/// assert_eq!(sum.number, dec!(150.00));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    /// The decimal quantity
    pub number: Decimal,
    /// The commodity the quantity is counted in
    pub commodity: Commodity,
}

impl Amount {
    /// Create a new amount.
    #[must_use]
    pub const fn new(number: Decimal, commodity: Commodity) -> Self {
        Self { number, commodity }
    }

    /// Create a zero amount of the given commodity.
    #[must_use]
    pub const fn zero(commodity: Commodity) -> Self {
        Self {
            number: Decimal::ZERO,
            commodity,
        }
    }

    /// Check if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.number.is_zero()
    }

    /// Get the absolute value of this amount.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self {
            number: self.number.abs(),
            commodity: self.commodity.clone(),
        }
    }

    /// Re-express this quantity in another commodity at `rate` units of
    /// `commodity` per unit of `self.commodity`.
    ///
    /// Returns `None` if the product overflows.
    #[must_use]
    pub fn convert(&self, rate: Decimal, commodity: Commodity) -> Option<Self> {
        Some(Self {
            number: self.number.checked_mul(rate)?,
            commodity,
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.commodity)
    }
}

impl Add for &Amount {
    type Output = Amount;

    fn add(self, other: &Amount) -> Amount {
        debug_assert!(
            self.commodity.equiv(&other.commodity),
            "Cannot add amounts of different commodities"
        );
        Amount {
            number: self.number + other.number,
            commodity: self.commodity.clone(),
        }
    }
}

impl Sub for &Amount {
    type Output = Amount;

    fn sub(self, other: &Amount) -> Amount {
        debug_assert!(
            self.commodity.equiv(&other.commodity),
            "Cannot subtract amounts of different commodities"
        );
        Amount {
            number: self.number - other.number,
            commodity: self.commodity.clone(),
        }
    }
}

impl Neg for &Amount {
    type Output = Amount;

    fn neg(self) -> Amount {
        Amount {
            number: -self.number,
            commodity: self.commodity.clone(),
        }
    }
}

impl Mul<Decimal> for &Amount {
    type Output = Amount;

    fn mul(self, factor: Decimal) -> Amount {
        Amount {
            number: self.number * factor,
            commodity: self.commodity.clone(),
        }
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        &self + &other
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self {
        -&self
    }
}

impl AddAssign<&Self> for Amount {
    fn add_assign(&mut self, other: &Self) {
        debug_assert!(
            self.commodity.equiv(&other.commodity),
            "Cannot add amounts of different commodities"
        );
        self.number += other.number;
    }
}
