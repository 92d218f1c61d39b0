//! # Money
//!
//! Fixed-point money in integer minor units (cents for USD).
//! Amounts are never represented as binary floating point; all arithmetic
//! is checked and exact.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    USD,
    EUR,
    GBP,
    JPY,
    CAD,
    AUD,
    CHF,
    MXN,
}

impl Currency {
    /// Returns the lowercase ISO 4217 currency code, as the gateway wire
    /// format expects
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::USD => "usd",
            Currency::EUR => "eur",
            Currency::GBP => "gbp",
            Currency::JPY => "jpy",
            Currency::CAD => "cad",
            Currency::AUD => "aud",
            Currency::CHF => "chf",
            Currency::MXN => "mxn",
        }
    }

    /// Returns the number of decimal places for this currency
    /// (JPY has 0 decimals, most others have 2)
    pub fn decimal_places(&self) -> u8 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    /// Minor units per major unit (100 for USD, 1 for JPY)
    fn minor_per_major(&self) -> i64 {
        10_i64.pow(self.decimal_places() as u32)
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::USD
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Money with the amount held in the smallest currency unit.
///
/// The gateway conversion (`minor_units`) is the identity, so sending an
/// amount to the provider involves no rounding at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in smallest currency unit (cents for USD)
    pub amount: i64,
    /// Currency
    pub currency: Currency,
}

impl Money {
    /// Create from an amount already in minor units
    pub fn from_minor(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Create from whole major units (e.g. whole dollars)
    pub fn from_major(units: i64, currency: Currency) -> StoreResult<Self> {
        let amount = units
            .checked_mul(currency.minor_per_major())
            .ok_or_else(|| StoreError::InvalidAmount(format!("{units} {currency} overflows")))?;
        Ok(Self { amount, currency })
    }

    /// Zero in the given currency
    pub fn zero(currency: Currency) -> Self {
        Self { amount: 0, currency }
    }

    /// Parse a decimal string like `"9.99"` without ever touching binary
    /// floating point. Rejects more fractional digits than the currency
    /// carries, so the result is always exact.
    pub fn parse_decimal(input: &str, currency: Currency) -> StoreResult<Self> {
        let input = input.trim();
        let bad = |msg: &str| StoreError::InvalidAmount(format!("{input:?}: {msg}"));

        let (negative, digits) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(bad("no digits"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(bad("non-digit character"));
        }
        let places = currency.decimal_places() as usize;
        if frac.len() > places {
            return Err(bad("more fractional digits than the currency carries"));
        }

        let whole_part: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| bad("whole part overflows"))?
        };
        let mut frac_part: i64 = if frac.is_empty() {
            0
        } else {
            frac.parse().map_err(|_| bad("fraction overflows"))?
        };
        // "9.9" in USD means 90 cents of fraction, not 9.
        for _ in frac.len()..places {
            frac_part *= 10;
        }

        let amount = whole_part
            .checked_mul(currency.minor_per_major())
            .and_then(|w| w.checked_add(frac_part))
            .ok_or_else(|| bad("amount overflows"))?;

        Ok(Self {
            amount: if negative { -amount } else { amount },
            currency,
        })
    }

    /// Amount in minor units, the representation payment providers expect.
    /// Exact: the amount is already stored this way.
    pub fn minor_units(&self) -> i64 {
        self.amount
    }

    /// Checked addition; fails on currency mismatch or overflow
    pub fn checked_add(self, other: Money) -> StoreResult<Money> {
        if self.currency != other.currency {
            return Err(StoreError::CurrencyMismatch {
                left: self.currency.to_string(),
                right: other.currency.to_string(),
            });
        }
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| StoreError::InvalidAmount("sum overflows".into()))?;
        Ok(Money { amount, currency: self.currency })
    }

    /// Checked multiplication by a quantity; fails on overflow
    pub fn checked_mul(self, quantity: u32) -> StoreResult<Money> {
        let amount = self
            .amount
            .checked_mul(i64::from(quantity))
            .ok_or_else(|| StoreError::InvalidAmount("product overflows".into()))?;
        Ok(Money { amount, currency: self.currency })
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self.currency {
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::GBP => "£",
            Currency::JPY => "¥",
            Currency::CAD => "C$",
            Currency::AUD => "A$",
            Currency::CHF => "CHF ",
            Currency::MXN => "MX$",
        };
        let places = self.currency.decimal_places() as usize;
        if places == 0 {
            return write!(f, "{}{}", symbol, self.amount);
        }
        let per_major = 10_i64.pow(places as u32);
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        let major = abs / per_major as u64;
        let minor = abs % per_major as u64;
        write!(f, "{sign}{symbol}{major}.{minor:0places$}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal() {
        assert_eq!(
            Money::parse_decimal("10.99", Currency::USD).unwrap(),
            Money::from_minor(1099, Currency::USD)
        );
        assert_eq!(
            Money::parse_decimal("9.9", Currency::USD).unwrap(),
            Money::from_minor(990, Currency::USD)
        );
        assert_eq!(
            Money::parse_decimal("10", Currency::USD).unwrap(),
            Money::from_minor(1000, Currency::USD)
        );
        assert_eq!(
            Money::parse_decimal("1000", Currency::JPY).unwrap(),
            Money::from_minor(1000, Currency::JPY)
        );
        assert_eq!(
            Money::parse_decimal("-0.05", Currency::USD).unwrap(),
            Money::from_minor(-5, Currency::USD)
        );
    }

    #[test]
    fn test_parse_decimal_rejects_excess_precision() {
        assert!(Money::parse_decimal("1.999", Currency::USD).is_err());
        assert!(Money::parse_decimal("1.5", Currency::JPY).is_err());
        assert!(Money::parse_decimal("", Currency::USD).is_err());
        assert!(Money::parse_decimal("1.2.3", Currency::USD).is_err());
        assert!(Money::parse_decimal("1e3", Currency::USD).is_err());
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Money::from_minor(999, Currency::USD);
        let b = Money::from_minor(1, Currency::USD);
        assert_eq!(a.checked_add(b).unwrap().amount, 1000);
        assert_eq!(a.checked_mul(5).unwrap().amount, 4995);

        let eur = Money::from_minor(100, Currency::EUR);
        assert!(matches!(
            a.checked_add(eur),
            Err(StoreError::CurrencyMismatch { .. })
        ));

        let big = Money::from_minor(i64::MAX, Currency::USD);
        assert!(big.checked_add(b).is_err());
        assert!(big.checked_mul(2).is_err());
    }

    #[test]
    fn test_from_major() {
        assert_eq!(
            Money::from_major(10, Currency::USD).unwrap(),
            Money::from_minor(1000, Currency::USD)
        );
        assert_eq!(
            Money::from_major(1000, Currency::JPY).unwrap(),
            Money::from_minor(1000, Currency::JPY)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor(1099, Currency::USD).to_string(), "$10.99");
        assert_eq!(Money::from_minor(990, Currency::USD).to_string(), "$9.90");
        assert_eq!(Money::from_minor(5, Currency::USD).to_string(), "$0.05");
        assert_eq!(Money::from_minor(1000, Currency::JPY).to_string(), "¥1000");
        assert_eq!(Money::from_minor(-150, Currency::EUR).to_string(), "-€1.50");
    }
}
