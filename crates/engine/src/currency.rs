use std::{fmt, str::FromStr};

use crate::EngineError;

/// ISO-like currency code carried by balances and flows.
///
/// A wallet may hold any number of currencies at once, so the engine does not
/// restrict codes to a closed set. The only requirement is three ASCII
/// letters; the code is normalized to upper case on parse. Codes do not need
/// to be present in the rate table: conversions for unknown codes fall back to
/// identity.
///
/// ```rust
/// use engine::Currency;
///
/// let cny: Currency = " cny ".parse().unwrap();
/// assert_eq!(cny.code(), "CNY");
/// assert!("EURO".parse::<Currency>().is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Currency([u8; 3]);

impl Currency {
    pub const USD: Currency = Currency(*b"USD");
    pub const EUR: Currency = Currency(*b"EUR");
    pub const CNY: Currency = Currency(*b"CNY");

    /// Canonical currency code.
    #[must_use]
    pub fn code(&self) -> &str {
        // Only ASCII letters are ever stored.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({})", self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let code = value.trim();
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(EngineError::InvalidCurrency(format!(
                "unsupported currency: {code}"
            )));
        }
        let mut upper = [0u8; 3];
        for (dst, src) in upper.iter_mut().zip(bytes) {
            *dst = src.to_ascii_uppercase();
        }
        Ok(Currency(upper))
    }
}

impl FromStr for Currency {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::try_from(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        assert_eq!(Currency::try_from("usd").unwrap(), Currency::USD);
        assert_eq!(Currency::try_from(" Cny\t").unwrap(), Currency::CNY);
        assert_eq!(Currency::EUR.to_string(), "EUR");
    }

    #[test]
    fn parse_rejects_non_codes() {
        for input in ["", "US", "USDT", "U$D", "12A", "€UR"] {
            assert!(
                matches!(
                    Currency::try_from(input),
                    Err(EngineError::InvalidCurrency(_))
                ),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn ordering_follows_code() {
        let mut codes = vec![Currency::USD, Currency::CNY, Currency::EUR];
        codes.sort();
        assert_eq!(codes, vec![Currency::CNY, Currency::EUR, Currency::USD]);
    }
}
