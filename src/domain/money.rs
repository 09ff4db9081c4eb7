use bigdecimal::rounding::RoundingMode;
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Monetary amount with exact decimal arithmetic.
///
/// All arithmetic normalizes to scale 2 with banker's rounding, so equal
/// values compare equal regardless of how they were produced.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(BigDecimal);

impl Money {
    pub fn new(amount: BigDecimal) -> Self {
        Self(amount.with_scale_round(2, RoundingMode::HalfEven))
    }

    pub fn zero() -> Self {
        Self(BigDecimal::zero().with_scale(2))
    }

    pub fn amount(&self) -> &BigDecimal {
        &self.0
    }

    pub fn into_amount(self) -> BigDecimal {
        self.0
    }

    pub fn is_greater_than_zero(&self) -> bool {
        self.0 > BigDecimal::zero()
    }

    pub fn is_greater_than(&self, other: &Money) -> bool {
        self.0 > other.0
    }

    pub fn add(&self, other: &Money) -> Money {
        Money::new(&self.0 + &other.0)
    }

    pub fn subtract(&self, other: &Money) -> Money {
        Money::new(&self.0 - &other.0)
    }

    pub fn multiply(&self, quantity: i32) -> Money {
        Money::new(&self.0 * BigDecimal::from(quantity))
    }
}

impl FromStr for Money {
    type Err = bigdecimal::ParseBigDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Money::new(BigDecimal::from_str(s)?))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        Money::from_str(s).expect("valid decimal")
    }

    #[test]
    fn equal_values_with_different_scales_compare_equal() {
        assert_eq!(money("50"), money("50.00"));
        assert_eq!(money("50.0"), money("50.00"));
    }

    #[test]
    fn add_is_exact() {
        assert_eq!(money("50.00").add(&money("150.00")), money("200.00"));
        assert_eq!(money("0.10").add(&money("0.20")), money("0.30"));
    }

    #[test]
    fn subtract_is_exact() {
        assert_eq!(money("200.00").subtract(&money("50.00")), money("150.00"));
    }

    #[test]
    fn multiply_by_quantity() {
        assert_eq!(money("50.00").multiply(3), money("150.00"));
        assert_eq!(money("9.99").multiply(2), money("19.98"));
    }

    #[test]
    fn zero_is_not_greater_than_zero() {
        assert!(!Money::zero().is_greater_than_zero());
        assert!(money("0.01").is_greater_than_zero());
        assert!(!money("-1.00").is_greater_than_zero());
    }

    #[test]
    fn greater_than_compares_by_value() {
        assert!(money("100.00").is_greater_than(&money("99.99")));
        assert!(!money("99.99").is_greater_than(&money("100")));
        assert!(!money("100").is_greater_than(&money("100.00")));
    }

    #[test]
    fn new_rounds_to_scale_two_half_even() {
        assert_eq!(Money::new(BigDecimal::from_str("1.005").unwrap()), money("1.00"));
        assert_eq!(Money::new(BigDecimal::from_str("1.015").unwrap()), money("1.02"));
    }

    #[test]
    fn parses_from_string() {
        assert!(Money::from_str("19.99").is_ok());
        assert!(Money::from_str("not-a-number").is_err());
    }
}
