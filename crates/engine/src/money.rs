use std::fmt;

use crate::{Currency, EngineError, ResultEngine};

/// Signed money amount represented as integer **minor units** of a currency.
///
/// Ledger amounts, account totals and statistic buckets are all plain `i64`
/// minor units; `Money` only pairs such a value with its [`Currency`] for
/// parsing user input and formatting output.
///
/// # Examples
///
/// ```rust
/// use engine::{Currency, Money};
///
/// let amount = Money::parse("12,5", Currency::Eur).unwrap();
/// assert_eq!(amount.minor(), 1250);
/// assert_eq!(amount.to_string(), "12.50 EUR");
/// assert!(Money::parse("1.5", Currency::Jpy).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Money {
    minor: i64,
    currency: Currency,
}

impl Money {
    #[must_use]
    pub const fn new(minor: i64, currency: Currency) -> Self {
        Self { minor, currency }
    }

    #[must_use]
    pub const fn minor(self) -> i64 {
        self.minor
    }

    #[must_use]
    pub const fn currency(self) -> Currency {
        self.currency
    }

    /// Parses a decimal string into minor units of `currency`.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    /// Rejects more fractional digits than the currency has minor units.
    pub fn parse(input: &str, currency: Currency) -> ResultEngine<Self> {
        let invalid = || EngineError::InvalidAmount(format!("invalid amount: {input:?}"));
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = input.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let rest = rest.trim().replace(',', ".");
        let (major_str, frac_str) = match rest.split_once('.') {
            Some((major, frac)) => (major, frac),
            None => (rest.as_str(), ""),
        };

        if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if !frac_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let digits = usize::from(currency.minor_units());
        if frac_str.len() > digits {
            return Err(EngineError::InvalidAmount(format!(
                "{} allows at most {digits} decimals",
                currency.code()
            )));
        }

        let scale = 10i64.pow(u32::from(currency.minor_units()));
        let major: i64 = major_str.parse().map_err(|_| overflow())?;
        let frac: i64 = if frac_str.is_empty() {
            0
        } else {
            let padded = format!("{frac_str:0<digits$}");
            padded.parse().map_err(|_| invalid())?
        };

        let total = major
            .checked_mul(scale)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(overflow)?;

        Ok(Self::new(if negative { -total } else { total }, currency))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.minor < 0 { "-" } else { "" };
        let abs = self.minor.unsigned_abs();
        let digits = u32::from(self.currency.minor_units());
        if digits == 0 {
            return write!(f, "{sign}{abs} {}", self.currency);
        }
        let scale = 10u64.pow(digits);
        let width = digits as usize;
        write!(
            f,
            "{sign}{}.{:0width$} {}",
            abs / scale,
            abs % scale,
            self.currency
        )
    }
}
