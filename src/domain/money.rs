use crate::utils::error::{PosError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

pub const DEFAULT_CURRENCY_SYMBOL: &str = "₱";

/// An amount in centavos.
///
/// Stored records carry prices as plain JSON numbers (`110.0`) or, in older
/// exports, as formatted strings (`"₱110.00"`). Both deserialize here and
/// are rounded to the nearest centavo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_centavos(centavos: i64) -> Self {
        Money(centavos)
    }

    pub fn from_pesos(pesos: f64) -> Self {
        Money((pesos * 100.0).round() as i64)
    }

    pub fn centavos(self) -> i64 {
        self.0
    }

    pub fn as_pesos(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn times(self, qty: u32) -> Money {
        Money(self.0 * i64::from(qty))
    }

    /// Parses `"150"`, `"150.5"`, `"₱1,250.00"`.
    pub fn parse(input: &str) -> Result<Money> {
        let cleaned: String = input
            .trim()
            .trim_start_matches(DEFAULT_CURRENCY_SYMBOL)
            .chars()
            .filter(|c| *c != ',' && !c.is_whitespace())
            .collect();

        let value: f64 = cleaned
            .parse()
            .map_err(|_| PosError::validation(format!("'{}' is not a valid amount", input)))?;

        if !value.is_finite() {
            return Err(PosError::validation(format!(
                "'{}' is not a valid amount",
                input
            )));
        }
        Ok(Money::from_pesos(value))
    }

    pub fn display_with(self, symbol: &str) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        format!("{}{}{}.{:02}", sign, symbol, abs / 100, abs % 100)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_with(DEFAULT_CURRENCY_SYMBOL))
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_pesos())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) if n.is_finite() => Ok(Money::from_pesos(n)),
            Raw::Number(n) => Err(serde::de::Error::custom(format!("invalid amount {}", n))),
            Raw::Text(s) => Money::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}
