//! Exchange rates.
//!
//! A [`RateTable`] is an immutable snapshot mapping a currency to the value of
//! one unit of it in the reference currency (the reference itself is `1`).
//! [`Rates`] owns the current snapshot and swaps it wholesale, so a reader
//! always sees one complete table. The snapshot is refreshed from a
//! [`RateSource`] by [`refresh`] or by the long running [`run_refresher`].

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::Currency;

/// Errors raised while fetching or validating a rate snapshot.
///
/// They never reach request handlers: the refresher logs them and keeps the
/// previous table.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RateError {
    #[error("rate source failed: {0}")]
    Source(String),
    #[error("rate snapshot is empty")]
    Empty,
    #[error("rate for {0} must be positive")]
    NonPositive(String),
    #[error("reference currency {0} must have rate 1")]
    Reference(String),
}

/// Versioned snapshot of currency values in the reference currency.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateTable {
    version: u64,
    reference: Currency,
    rates: BTreeMap<Currency, Decimal>,
}

impl RateTable {
    /// Table that only knows the reference currency.
    #[must_use]
    pub fn reference_only(reference: Currency) -> Self {
        Self {
            version: 0,
            reference,
            rates: BTreeMap::from([(reference, Decimal::ONE)]),
        }
    }

    /// Validate a raw snapshot.
    ///
    /// Entries whose key is not a currency code are skipped. The snapshot must
    /// contain at least one valid entry and every rate must be strictly
    /// positive. The reference currency is added with rate `1` when missing
    /// and rejected when present with any other value.
    pub fn new(
        reference: Currency,
        raw: impl IntoIterator<Item = (String, Decimal)>,
    ) -> Result<Self, RateError> {
        let mut rates = BTreeMap::new();
        for (code, rate) in raw {
            let Ok(currency) = Currency::try_from(code.as_str()) else {
                tracing::debug!(code, "skipping rate with invalid currency code");
                continue;
            };
            if rate <= Decimal::ZERO {
                return Err(RateError::NonPositive(currency.to_string()));
            }
            rates.insert(currency, rate);
        }
        if rates.is_empty() {
            return Err(RateError::Empty);
        }
        match rates.get(&reference) {
            Some(rate) if *rate != Decimal::ONE => {
                return Err(RateError::Reference(reference.to_string()));
            }
            Some(_) => {}
            None => {
                rates.insert(reference, Decimal::ONE);
            }
        }
        Ok(Self {
            version: 0,
            reference,
            rates,
        })
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn reference(&self) -> Currency {
        self.reference
    }

    /// Value of one unit of `currency` in the reference currency.
    #[must_use]
    pub fn rate(&self, currency: Currency) -> Option<Decimal> {
        self.rates.get(&currency).copied()
    }

    /// Known currency codes, sorted.
    #[must_use]
    pub fn codes(&self) -> Vec<Currency> {
        self.rates.keys().copied().collect()
    }

    /// Convert `amount` from one currency to another.
    ///
    /// Returns `amount` unchanged when either code is unknown.
    #[must_use]
    pub fn convert(&self, amount: Decimal, from: Currency, to: Currency) -> Decimal {
        if from == to {
            return amount;
        }
        let (Some(rate_from), Some(rate_to)) = (self.rate(from), self.rate(to)) else {
            return amount;
        };
        // Overflow is treated like an unknown code.
        amount
            .checked_mul(rate_from)
            .and_then(|value| value.checked_div(rate_to))
            .unwrap_or(amount)
    }
}

/// Process-scoped holder of the current [`RateTable`].
#[derive(Debug)]
pub struct Rates {
    current: RwLock<Arc<RateTable>>,
}

impl Rates {
    #[must_use]
    pub fn new(table: RateTable) -> Self {
        Self {
            current: RwLock::new(Arc::new(table)),
        }
    }

    /// The snapshot in use right now.
    #[must_use]
    pub fn current(&self) -> Arc<RateTable> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in a new snapshot and return its version.
    pub fn replace(&self, mut table: RateTable) -> u64 {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        table.version = current.version + 1;
        let version = table.version;
        *current = Arc::new(table);
        version
    }

    /// See [`RateTable::codes`].
    #[must_use]
    pub fn codes(&self) -> Vec<Currency> {
        self.current().codes()
    }
}

/// Transport that yields a raw snapshot: currency code to value of one unit
/// in the reference currency.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self) -> Result<HashMap<String, Decimal>, RateError>;
}

/// Fetch, validate and install one snapshot. On error the previous table
/// stays in place.
pub async fn refresh(rates: &Rates, source: &dyn RateSource) -> Result<u64, RateError> {
    let reference = rates.current().reference();
    let raw = source.fetch().await?;
    let table = RateTable::new(reference, raw)?;
    let codes = table.rates.len();
    let version = rates.replace(table);
    tracing::info!(version, codes, "rate table refreshed");
    Ok(version)
}

/// Refresh immediately, then every `every`. Never returns.
pub async fn run_refresher(rates: Arc<Rates>, source: Arc<dyn RateSource>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Err(err) = refresh(&rates, source.as_ref()).await {
            let version = rates.current().version();
            tracing::warn!(%err, version, "rate refresh failed, keeping previous table");
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use tokio::sync::Mutex;

    use super::*;

    fn table() -> RateTable {
        RateTable::new(
            Currency::USD,
            [
                ("USD".to_string(), dec!(1)),
                ("CNY".to_string(), dec!(0.14)),
                ("EUR".to_string(), dec!(1.08)),
            ],
        )
        .unwrap()
    }

    struct Scripted(Mutex<Vec<Result<HashMap<String, Decimal>, RateError>>>);

    #[async_trait]
    impl RateSource for Scripted {
        async fn fetch(&self) -> Result<HashMap<String, Decimal>, RateError> {
            self.0
                .lock()
                .await
                .pop()
                .unwrap_or_else(|| Err(RateError::Source("exhausted".to_string())))
        }
    }

    #[test]
    fn unknown_code_converts_to_itself() {
        let table = table();
        let xyz = Currency::try_from("XYZ").unwrap();
        assert_eq!(table.convert(dec!(100), xyz, Currency::USD), dec!(100));
        assert_eq!(table.convert(dec!(100), Currency::USD, xyz), dec!(100));
    }

    #[test]
    fn convert_uses_reference_values() {
        let table = table();
        assert_eq!(table.convert(dec!(100), Currency::CNY, Currency::USD), dec!(14));
        assert_eq!(table.convert(dec!(14), Currency::USD, Currency::CNY), dec!(100));
    }

    #[test]
    fn round_trip_stays_within_tolerance() {
        let table = table();
        let there = table.convert(dec!(123.4567), Currency::EUR, Currency::CNY);
        let back = table.convert(there, Currency::CNY, Currency::EUR);
        assert!((back - dec!(123.4567)).abs() < dec!(0.000001));
    }

    #[test]
    fn new_validates_snapshot() {
        assert_eq!(
            RateTable::new(Currency::USD, Vec::new()),
            Err(RateError::Empty)
        );
        assert_eq!(
            RateTable::new(Currency::USD, [("CNY".to_string(), dec!(0))]),
            Err(RateError::NonPositive("CNY".to_string()))
        );
        assert_eq!(
            RateTable::new(Currency::USD, [("USD".to_string(), dec!(2))]),
            Err(RateError::Reference("USD".to_string()))
        );

        let table = RateTable::new(
            Currency::USD,
            [("cny".to_string(), dec!(0.14)), ("bogus".to_string(), dec!(3))],
        )
        .unwrap();
        assert_eq!(table.codes(), vec![Currency::CNY, Currency::USD]);
        assert_eq!(table.rate(Currency::USD), Some(Decimal::ONE));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_table() {
        let rates = Rates::new(RateTable::reference_only(Currency::USD));
        let source = Scripted(Mutex::new(vec![
            Err(RateError::Source("boom".to_string())),
            Ok(HashMap::from([("CNY".to_string(), dec!(0.14))])),
        ]));

        assert_eq!(refresh(&rates, &source).await, Ok(1));
        assert_eq!(rates.codes(), vec![Currency::CNY, Currency::USD]);

        assert!(refresh(&rates, &source).await.is_err());
        let current = rates.current();
        assert_eq!(current.version(), 1);
        assert_eq!(current.rate(Currency::CNY), Some(dec!(0.14)));
    }
}
