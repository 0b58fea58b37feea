//! exchangerate-api.com rate source.

use std::{collections::HashMap, str::FromStr};

use async_trait::async_trait;
use engine::{Currency, RateError, RateSource};
use rust_decimal::Decimal;
use serde::Deserialize;

const BASE_URL: &str = "https://v6.exchangerate-api.com/v6";

/// Fetches `latest/{reference}` from exchangerate-api.com.
pub struct ExchangeRateApi {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct Latest {
    result: String,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    /// Units of each currency per one reference unit.
    #[serde(default)]
    conversion_rates: HashMap<String, serde_json::Number>,
}

impl ExchangeRateApi {
    pub fn new(api_key: &str, reference: Currency) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{BASE_URL}/{api_key}/latest/{reference}"),
        }
    }
}

#[async_trait]
impl RateSource for ExchangeRateApi {
    async fn fetch(&self) -> Result<HashMap<String, Decimal>, RateError> {
        let latest: Latest = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| RateError::Source(err.without_url().to_string()))?
            .json()
            .await
            .map_err(|err| RateError::Source(err.without_url().to_string()))?;

        if latest.result != "success" {
            return Err(RateError::Source(
                latest.error_type.unwrap_or(latest.result),
            ));
        }
        invert(latest.conversion_rates)
    }
}

/// Turn "units per reference" into "reference per unit".
fn invert(raw: HashMap<String, serde_json::Number>) -> Result<HashMap<String, Decimal>, RateError> {
    raw.into_iter()
        .map(|(code, number)| {
            let text = number.to_string();
            let rate = Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .map_err(|_| RateError::NonPositive(code.clone()))?;
            if rate <= Decimal::ZERO {
                return Err(RateError::NonPositive(code));
            }
            let value = Decimal::ONE
                .checked_div(rate)
                .ok_or_else(|| RateError::NonPositive(code.clone()))?;
            Ok((code, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn latest(body: &str) -> Latest {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn rates_are_inverted() {
        let body = latest(
            r#"{
                "result": "success",
                "base_code": "USD",
                "conversion_rates": { "USD": 1, "EUR": 0.8, "CNY": 7.25 }
            }"#,
        );
        let rates = invert(body.conversion_rates).unwrap();
        assert_eq!(rates["USD"], dec!(1));
        assert_eq!(rates["EUR"], dec!(1.25));
        assert_eq!(rates["CNY"].round_dp(6), dec!(0.137931));
    }

    #[test]
    fn zero_rate_is_rejected() {
        let body = latest(r#"{ "result": "success", "conversion_rates": { "XYZ": 0 } }"#);
        assert_eq!(
            invert(body.conversion_rates).unwrap_err(),
            RateError::NonPositive("XYZ".to_string())
        );
    }

    #[test]
    fn error_responses_carry_the_error_type() {
        let body = latest(r#"{ "result": "error", "error-type": "invalid-key" }"#);
        assert_eq!(body.result, "error");
        assert_eq!(body.error_type.as_deref(), Some("invalid-key"));
        assert!(body.conversion_rates.is_empty());
    }
}
