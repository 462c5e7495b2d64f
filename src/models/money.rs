use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Amount of money with two decimal places, stored as `NUMERIC(10, 2)`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Accepts a decimal with at most two fractional digits.
    pub fn try_from_decimal(value: Decimal) -> Option<Self> {
        (value.normalize().scale() <= 2).then(|| Money(value))
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Price of `count` units at this unit price.
    pub fn times(self, count: usize) -> Money {
        Money(self.0 * Decimal::from(count))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn displays_two_decimals() {
        assert_eq!(Money::from_cents(8000).to_string(), "80.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn times_multiplies_exactly() {
        assert_eq!(Money::from_cents(8000).times(2), Money::from_cents(16000));
        assert_eq!(Money::from_cents(1999).times(3), Money::from_cents(5997));
        assert_eq!(Money::from_cents(8000).times(0), Money::ZERO);
    }

    #[test]
    fn rejects_sub_cent_precision() {
        assert!(Money::try_from_decimal(Decimal::new(12345, 3)).is_none());
        assert!(Money::try_from_decimal(Decimal::new(12340, 3)).is_some());
        assert!(Money::try_from_decimal(Decimal::new(80, 0)).is_some());
    }

    #[test]
    fn serializes_as_decimal_string() {
        let json = serde_json::to_string(&Money::from_cents(16000)).unwrap();
        assert_eq!(json, "\"160.00\"");
    }

    proptest! {
        #[test]
        fn times_matches_repeated_addition(cents in 1i64..1_000_000, count in 0usize..40) {
            let price = Money::from_cents(cents);
            let summed = (0..count).fold(Decimal::ZERO, |acc, _| acc + price.as_decimal());
            prop_assert_eq!(price.times(count).as_decimal(), summed);
        }
    }
}
