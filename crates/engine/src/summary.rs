//! Category and currency aggregates.
//!
//! Aggregates are computed from the flow journal on every read and are never
//! persisted. Conversions use whatever rate table is current at read time.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::{
    Amount, Currency, EngineError, Flow, FlowEntry, RateTable, ResultEngine, Wallet,
    money::AMOUNT_SCALE,
};

/// Flow sums grouped by category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryTotals {
    /// Currency of every converted figure.
    pub base: Currency,
    /// Version of the rate table used for the conversion.
    pub rates_version: u64,
    /// Exact sum per category and currency.
    pub by_currency: BTreeMap<Uuid, BTreeMap<Currency, Amount>>,
    /// Per category: every currency sum converted to `base`, then added up.
    pub by_category: BTreeMap<Uuid, Decimal>,
}

impl CategoryTotals {
    /// Sum of every category in the base currency.
    #[must_use]
    pub fn total(&self) -> Decimal {
        add_up(self.by_category.values().copied())
    }
}

/// Everything a wallet page shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletSummary {
    pub wallet: Wallet,
    /// Newest first.
    pub flows: Vec<FlowEntry>,
    pub categories: CategoryTotals,
}

/// Overview of every wallet a user owns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dashboard {
    pub wallets: Vec<Wallet>,
    /// Balances added up per currency across the wallets, unconverted.
    pub currency_totals: BTreeMap<Currency, Amount>,
    /// `currency_totals` converted to the base currency.
    pub total: Decimal,
    pub categories: CategoryTotals,
}

fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Sum that saturates at the bounds of [`Decimal`] instead of panicking.
fn add_up(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values
        .into_iter()
        .fold(Decimal::ZERO, |sum, value| sum.saturating_add(value))
}

fn overflow() -> EngineError {
    EngineError::InvalidAmount("total overflow".to_string())
}

/// Group `flows` by (category, currency), sum, and convert every group to
/// `base`.
pub fn category_totals<'a>(
    flows: impl IntoIterator<Item = &'a Flow>,
    rates: &RateTable,
    base: Currency,
) -> ResultEngine<CategoryTotals> {
    let mut by_currency: BTreeMap<Uuid, BTreeMap<Currency, Amount>> = BTreeMap::new();
    for flow in flows {
        let sum = by_currency
            .entry(flow.category_id)
            .or_default()
            .entry(flow.currency)
            .or_default();
        *sum = sum.checked_add(flow.amount).ok_or_else(overflow)?;
    }

    let by_category = by_currency
        .iter()
        .map(|(category_id, sums)| {
            let converted = add_up(
                sums.iter()
                    .map(|(currency, sum)| rates.convert(sum.to_decimal(), *currency, base)),
            );
            (*category_id, round(converted))
        })
        .collect();

    Ok(CategoryTotals {
        base,
        rates_version: rates.version(),
        by_currency,
        by_category,
    })
}

/// Add up wallet balances per currency.
pub fn currency_totals<'a>(
    wallets: impl IntoIterator<Item = &'a Wallet>,
) -> ResultEngine<BTreeMap<Currency, Amount>> {
    let mut totals: BTreeMap<Currency, Amount> = BTreeMap::new();
    for wallet in wallets {
        for (currency, balance) in &wallet.balances {
            let total = totals.entry(*currency).or_default();
            *total = total.checked_add(*balance).ok_or_else(overflow)?;
        }
    }
    Ok(totals)
}

/// Convert per-currency figures to `base` and add them up.
#[must_use]
pub fn converted_total(
    totals: &BTreeMap<Currency, Amount>,
    rates: &RateTable,
    base: Currency,
) -> Decimal {
    round(add_up(
        totals
            .iter()
            .map(|(currency, amount)| rates.convert(amount.to_decimal(), *currency, base)),
    ))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use super::*;

    fn flow(category_id: Uuid, amount: &str, currency: Currency) -> Flow {
        Flow {
            id: Uuid::new_v4(),
            wallet_id: Uuid::nil(),
            amount: amount.parse().unwrap(),
            currency,
            category_id,
            description: String::new(),
            created_at: Utc::now(),
            operator_id: Uuid::nil(),
        }
    }

    fn rates() -> RateTable {
        RateTable::new(
            Currency::USD,
            [
                ("CNY".to_string(), dec!(0.14)),
                ("EUR".to_string(), dec!(1.10)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn single_currency_category_keeps_raw_sum() {
        let food = Uuid::new_v4();
        let flows = [
            flow(food, "100", Currency::CNY),
            flow(food, "-30", Currency::CNY),
        ];

        let totals = category_totals(&flows, &rates(), Currency::CNY).unwrap();

        assert_eq!(
            totals.by_currency[&food][&Currency::CNY],
            Amount::from_units(70).unwrap()
        );
        assert_eq!(totals.by_category[&food], dec!(70));
        assert_eq!(totals.total(), dec!(70));
    }

    #[test]
    fn currencies_are_converted_then_added() {
        let food = Uuid::new_v4();
        let rent = Uuid::new_v4();
        let flows = [
            flow(food, "-10", Currency::EUR),
            flow(food, "-50", Currency::CNY),
            flow(rent, "-3", Currency::USD),
            flow(rent, "5", Currency::try_from("XYZ").unwrap()),
        ];

        let totals = category_totals(&flows, &rates(), Currency::USD).unwrap();

        // -10 EUR = -11 USD, -50 CNY = -7 USD.
        assert_eq!(totals.by_category[&food], dec!(-18));
        // Unknown codes count at face value.
        assert_eq!(totals.by_category[&rent], dec!(2));
        assert_eq!(totals.by_currency[&food].len(), 2);
        assert_eq!(totals.base, Currency::USD);
    }

    #[test]
    fn empty_journal_has_no_categories() {
        let totals = category_totals(Vec::<Flow>::new().iter(), &rates(), Currency::CNY).unwrap();
        assert!(totals.by_category.is_empty());
        assert_eq!(totals.total(), Decimal::ZERO);
    }

    #[test]
    fn currency_totals_add_balances() {
        let owner = Uuid::new_v4();
        let mut cash = Wallet::new("Cash".to_string(), owner);
        cash.apply(Currency::CNY, Amount::from_units(70).unwrap()).unwrap();
        let mut bank = Wallet::new("Bank".to_string(), owner);
        bank.apply(Currency::CNY, Amount::from_units(30).unwrap()).unwrap();
        bank.apply(Currency::USD, Amount::from_units(2).unwrap()).unwrap();

        let totals = currency_totals([&cash, &bank]).unwrap();

        assert_eq!(totals[&Currency::CNY], Amount::from_units(100).unwrap());
        assert_eq!(totals[&Currency::USD], Amount::from_units(2).unwrap());
        // 100 CNY = 14 USD.
        assert_eq!(converted_total(&totals, &rates(), Currency::USD), dec!(16));
    }

    #[test]
    fn converted_sums_saturate_instead_of_overflowing() {
        let aaa = Currency::try_from("AAA").unwrap();
        let bbb = Currency::try_from("BBB").unwrap();
        let rates = RateTable::new(
            Currency::USD,
            [
                ("AAA".to_string(), dec!(50000000000000)),
                ("BBB".to_string(), dec!(50000000000000)),
            ],
        )
        .unwrap();
        let food = Uuid::new_v4();
        let mut flows = [flow(food, "0", aaa), flow(food, "0", bbb)];
        for flow in &mut flows {
            flow.amount = Amount::new(i64::MAX);
        }

        let totals = category_totals(&flows, &rates, Currency::USD).unwrap();
        assert_eq!(totals.by_category[&food], Decimal::MAX);
        assert_eq!(totals.total(), Decimal::MAX);

        let max = Amount::new(i64::MAX);
        let balances = BTreeMap::from([(aaa, max), (bbb, max)]);
        assert_eq!(converted_total(&balances, &rates, Currency::USD), Decimal::MAX);
    }
}
