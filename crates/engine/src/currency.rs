use serde::{Deserialize, Serialize};

use crate::EngineError;

/// ISO currency code of an account.
///
/// Amounts are stored as an `i64` number of **minor units** (see [`Money`]).
/// `minor_units()` returns how many decimal digits separate major and minor
/// units, e.g. EUR has 2 so `10.50 EUR` ⇄ `1050`, JPY has 0.
///
/// [`Money`]: crate::Money
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Gbp,
    Jpy,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
        }
    }

    /// Number of fraction digits used when formatting/parsing amounts.
    #[must_use]
    pub const fn minor_units(self) -> u8 {
        match self {
            Currency::Eur | Currency::Usd | Currency::Gbp => 2,
            Currency::Jpy => 0,
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            "GBP" => Ok(Currency::Gbp),
            "JPY" => Ok(Currency::Jpy),
            other => Err(EngineError::InvalidInput(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}
