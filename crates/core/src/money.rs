//! Monetary amounts in integer minor units.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Non-negative monetary amount in cents.
///
/// All stock valuation runs on integer cents so that repeated aggregation is
/// exact and independent of summation order. Conversion from and to decimal
/// numbers happens only at the transport boundary.
///
/// Single amounts (a price, one product's stock value) are bounded by
/// [`Money::MAX_CENTS`]; totals are accumulated in 128 bits so summing any
/// realistic number of bounded amounts cannot overflow.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u128);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    /// Largest amount a single price or stock value may carry (`i64::MAX` cents,
    /// the range of a signed 64-bit database column).
    pub const MAX_CENTS: u64 = i64::MAX as u64;

    pub fn from_cents(cents: u64) -> Self {
        Self(u128::from(cents))
    }

    pub fn cents(self) -> u128 {
        self.0
    }

    /// `Validation` error naming `what` when the amount exceeds [`Money::MAX_CENTS`].
    pub fn ensure_bounded(self, what: &str) -> DomainResult<Self> {
        if self.0 > u128::from(Self::MAX_CENTS) {
            return Err(DomainError::validation(format!("{what} is too large")));
        }
        Ok(self)
    }

    /// Parse a decimal amount (e.g. `10.5`), rounding to the nearest cent.
    pub fn from_decimal(amount: f64) -> DomainResult<Self> {
        if !amount.is_finite() {
            return Err(DomainError::validation("price must be a finite number"));
        }
        if amount < 0.0 {
            return Err(DomainError::validation("price cannot be negative"));
        }
        let cents = (amount * 100.0).round();
        // `MAX_CENTS as f64` rounds up to 2^63, which is itself out of range.
        if cents >= Self::MAX_CENTS as f64 {
            return Err(DomainError::validation("price is too large"));
        }
        Ok(Self(cents as u128))
    }

    /// Decimal representation for transport (e.g. JSON numbers).
    pub fn as_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// `self * quantity`; the unit of all stock aggregation.
    pub fn times(self, quantity: u64) -> DomainResult<Self> {
        self.0
            .checked_mul(u128::from(quantity))
            .map(Self)
            .ok_or_else(|| DomainError::invariant("stock value overflow"))
    }

    pub fn checked_add(self, other: Money) -> DomainResult<Self> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or_else(|| DomainError::invariant("stock value overflow"))
    }

    /// Sum of non-negative amounts. Overflow depends only on the final total,
    /// never on iteration order.
    pub fn try_sum<I>(amounts: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = DomainResult<Money>>,
    {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, amount| acc.checked_add(amount?))
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}
