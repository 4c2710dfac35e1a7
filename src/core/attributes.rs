//! Computes the state and attributes a sensor exposes for one instrument.
use crate::core::conditions::{
    ChangePeriod, ConditionSource, MONITORED_CONDITIONS_DIVIDENDS, condition_source,
    is_currency_attribute,
};
use crate::core::currency::{
    ConversionResolution, REFERENCE_CURRENCY, currency_for_instrument, resolve_reference_pair,
};
use crate::core::entry::SensorConfig;
use crate::core::instrument::{InstrumentProvider, StockInfo, conversion_rate};
use anyhow::Result;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tracing::debug;

/// A rate to scale money attributes by, and the currency it yields.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub rate: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Unchanged,
}

impl Trend {
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 {
            Trend::Up
        } else if change < 0.0 {
            Trend::Down
        } else {
            Trend::Unchanged
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Unchanged => "unchanged",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Trend::Up => "mdi:trending-up",
            Trend::Down => "mdi:trending-down",
            Trend::Unchanged => "mdi:trending-neutral",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SensorState {
    pub name: String,
    pub state: f64,
    pub unit: String,
    pub icon: String,
    pub trending: Trend,
    pub attributes: BTreeMap<String, Value>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn root_value(info: &StockInfo, key: &str) -> Option<Value> {
    match key {
        "id" => Some(json!(info.id)),
        "name" => Some(json!(info.name)),
        "currency" => Some(json!(info.currency)),
        "lastPrice" => Some(json!(info.last_price)),
        "change" => Some(json!(info.change)),
        "changePercent" => Some(json!(info.change_percent)),
        _ => info.raw.get(key).cloned(),
    }
}

fn insert_dividends(attributes: &mut BTreeMap<String, Value>, dividends: &Value) {
    let Some(dividends) = dividends.as_array() else {
        return;
    };
    for (i, dividend) in dividends.iter().enumerate() {
        for field in MONITORED_CONDITIONS_DIVIDENDS {
            let key = if *field == "amount" {
                "amountPerShare"
            } else {
                field
            };
            if let Some(value) = dividend.get(key) {
                attributes.insert(format!("dividend{i}_{key}"), value.clone());
            }
        }
    }
}

fn copy_monitored_conditions(
    info: &StockInfo,
    conditions: &[String],
    attributes: &mut BTreeMap<String, Value>,
) {
    for condition in conditions {
        let value = match condition_source(condition).object_key() {
            None => root_value(info, condition),
            Some(object) => info
                .raw
                .get(object)
                .and_then(|o| o.get(condition.as_str()))
                .cloned(),
        };
        match value {
            Some(value) if condition == "dividends" => insert_dividends(attributes, &value),
            Some(Value::Null) | None => {
                debug!(condition = %condition, "Condition not present in stock info")
            }
            Some(value) => {
                attributes.insert(condition.clone(), value);
            }
        }
    }
}

/// Builds the sensor state for `info` with the given settings.
///
/// Money attributes are computed in the instrument's own currency and then
/// scaled by `conversion` when one is given.
pub fn compute(
    info: &StockInfo,
    settings: &SensorConfig,
    conversion: Option<&Conversion>,
) -> SensorState {
    let mut attributes = BTreeMap::new();
    copy_monitored_conditions(info, &settings.monitored_conditions, &mut attributes);

    let last = info.last_price;
    let shares = settings.shares;

    for period in ChangePeriod::ALL {
        let Some(historical) = info.number(period.price_field()) else {
            continue;
        };
        if historical <= 0.0 {
            continue;
        }
        let change = last - historical;
        let suffix = period.suffix();
        attributes.insert(format!("change{suffix}"), json!(change));
        attributes.insert(
            format!("changePercent{suffix}"),
            json!(round2(change / historical * 100.0)),
        );
        attributes.insert(format!("totalChange{suffix}"), json!(change * shares));
    }

    attributes.insert("shares".to_string(), json!(shares));
    attributes.insert("totalValue".to_string(), json!(last * shares));
    attributes.insert("totalChange".to_string(), json!(info.change * shares));

    if settings.purchase_price > 0.0 {
        let profit_loss = last - settings.purchase_price;
        attributes.insert("profitLoss".to_string(), json!(profit_loss));
        attributes.insert(
            "totalProfitLoss".to_string(),
            json!(profit_loss * shares),
        );
        attributes.insert(
            "profitLossPercentage".to_string(),
            json!(round2(profit_loss / settings.purchase_price * 100.0)),
        );
        attributes.insert(
            "purchasePrice".to_string(),
            json!(settings.purchase_price),
        );
    }
    if !settings.purchase_date.is_empty() {
        attributes.insert(
            "purchaseDate".to_string(),
            json!(settings.purchase_date.clone()),
        );
    }

    let trending = Trend::from_change(info.change);
    attributes.insert("trending".to_string(), json!(trending.as_str()));

    let mut state = last;
    let mut unit = info.currency.clone();
    if let Some(conversion) = conversion {
        for (key, value) in attributes.iter_mut() {
            if !is_currency_attribute(key) {
                continue;
            }
            if let Some(amount) = value.as_f64() {
                *value = json!(amount * conversion.rate);
            }
        }
        state = last * conversion.rate;
        unit = conversion.currency.clone();
        attributes.insert("currency".to_string(), json!(unit));
    }

    let icon = if settings.show_trending_icon {
        trending.icon()
    } else {
        "mdi:cash"
    };

    SensorState {
        name: settings.name.clone(),
        state: round2(state),
        unit,
        icon: icon.to_string(),
        trending,
        attributes,
    }
}

/// Works out which conversion applies to a sensor, if any, and fetches its
/// rate.
///
/// An explicit conversion instrument wins. Otherwise a display currency that
/// differs from the instrument's own is resolved against the rate table.
pub async fn resolve_conversion(
    provider: &(dyn InstrumentProvider + Send + Sync),
    settings: &SensorConfig,
    native_currency: &str,
) -> Result<Option<Conversion>> {
    if let Some(instrument_id) = settings.conversion_currency {
        let resolution = ConversionResolution {
            instrument_id: Some(instrument_id),
            invert: settings.invert_conversion_currency,
        };
        let rate = conversion_rate(provider, &resolution).await?;
        let currency = match &settings.currency {
            Some(currency) => currency.clone(),
            None if resolution.invert => currency_for_instrument(Some(instrument_id))
                .unwrap_or(native_currency)
                .to_string(),
            None => REFERENCE_CURRENCY.to_string(),
        };
        return Ok(Some(Conversion { rate, currency }));
    }

    let Some(target) = settings.currency.as_deref() else {
        return Ok(None);
    };
    let Some(resolution) = resolve_reference_pair(native_currency, target) else {
        return Ok(None);
    };
    let rate = conversion_rate(provider, &resolution).await?;
    Ok(Some(Conversion {
        rate,
        currency: target.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instrument::{InstrumentType, SearchHit};
    use anyhow::anyhow;
    use async_trait::async_trait;

    fn stock_info() -> StockInfo {
        serde_json::from_value(json!({
            "id": "238449",
            "name": "Apple Inc",
            "currency": "USD",
            "lastPrice": 200.0,
            "change": 2.0,
            "changePercent": 1.01,
            "highestPrice": 201.0,
            "lowestPrice": 195.0,
            "numberOfOwners": 12000,
            "priceOneWeekAgo": 190.0,
            "priceOneYearAgo": 160.0,
            "priceAtStartOfYear": 0.0,
            "keyRatios": {"directYield": 0.5, "volatility": null},
            "company": {"sector": "Technology"},
            "dividends": [
                {"amountPerShare": 0.25, "exDate": "2024-05-10", "paymentDate": "2024-05-16"}
            ]
        }))
        .unwrap()
    }

    fn settings() -> SensorConfig {
        let mut config = SensorConfig::new("238449", "Apple");
        config.shares = 10.0;
        config
    }

    #[test]
    fn test_compute_changes_and_totals() {
        let state = compute(&stock_info(), &settings(), None);
        let attrs = &state.attributes;

        assert_eq!(state.state, 200.0);
        assert_eq!(state.unit, "USD");
        assert_eq!(attrs["changeOneWeek"], json!(10.0));
        assert_eq!(attrs["changePercentOneWeek"], json!(5.26));
        assert_eq!(attrs["totalChangeOneWeek"], json!(100.0));
        assert_eq!(attrs["changeOneYear"], json!(40.0));
        assert_eq!(attrs["changePercentOneYear"], json!(25.0));
        // Zero historical prices are skipped.
        assert!(!attrs.contains_key("changeCurrentYear"));
        assert_eq!(attrs["totalValue"], json!(2000.0));
        assert_eq!(attrs["totalChange"], json!(20.0));
        assert!(!attrs.contains_key("profitLoss"));
        assert_eq!(attrs["trending"], json!("up"));
        assert_eq!(state.icon, "mdi:cash");
    }

    #[test]
    fn test_compute_copies_monitored_conditions() {
        let state = compute(&stock_info(), &settings(), None);
        let attrs = &state.attributes;

        assert_eq!(attrs["numberOfOwners"], json!(12000));
        assert_eq!(attrs["directYield"], json!(0.5));
        assert_eq!(attrs["sector"], json!("Technology"));
        assert_eq!(attrs["name"], json!("Apple Inc"));
        assert_eq!(attrs["dividend0_amountPerShare"], json!(0.25));
        assert_eq!(attrs["dividend0_exDate"], json!("2024-05-10"));
        assert!(!attrs.contains_key("volatility"));
        assert!(!attrs.contains_key("isin"));
    }

    #[test]
    fn test_compute_respects_selected_conditions() {
        let mut config = settings();
        config.monitored_conditions = vec!["highestPrice".to_string()];
        let state = compute(&stock_info(), &config, None);

        assert!(state.attributes.contains_key("highestPrice"));
        assert!(!state.attributes.contains_key("numberOfOwners"));
        // Computed attributes do not depend on the selection.
        assert!(state.attributes.contains_key("totalValue"));
    }

    #[test]
    fn test_compute_profit_loss() {
        let mut config = settings();
        config.purchase_price = 160.0;
        config.purchase_date = "2023-01-02".to_string();
        let state = compute(&stock_info(), &config, None);
        let attrs = &state.attributes;

        assert_eq!(attrs["profitLoss"], json!(40.0));
        assert_eq!(attrs["totalProfitLoss"], json!(400.0));
        assert_eq!(attrs["profitLossPercentage"], json!(25.0));
        assert_eq!(attrs["purchaseDate"], json!("2023-01-02"));
    }

    #[test]
    fn test_compute_with_conversion() {
        let mut config = settings();
        config.purchase_price = 150.0;
        config.show_trending_icon = true;
        let conversion = Conversion {
            rate: 10.0,
            currency: "SEK".to_string(),
        };
        let state = compute(&stock_info(), &config, Some(&conversion));
        let attrs = &state.attributes;

        assert_eq!(state.state, 2000.0);
        assert_eq!(state.unit, "SEK");
        assert_eq!(attrs["currency"], json!("SEK"));
        assert_eq!(attrs["lastPrice"], json!(2000.0));
        assert_eq!(attrs["totalValue"], json!(20000.0));
        assert_eq!(attrs["totalProfitLoss"], json!(5000.0));
        assert_eq!(attrs["dividend0_amountPerShare"], json!(2.5));
        // Percentages are currency independent.
        assert_eq!(attrs["changePercentOneYear"], json!(25.0));
        assert_eq!(attrs["profitLossPercentage"], json!(33.33));
        assert_eq!(state.icon, "mdi:trending-up");
    }

    #[test]
    fn test_trend() {
        assert_eq!(Trend::from_change(-0.1), Trend::Down);
        assert_eq!(Trend::from_change(0.0), Trend::Unchanged);
        assert_eq!(Trend::Down.icon(), "mdi:trending-down");
    }

    struct RateProvider;

    #[async_trait]
    impl InstrumentProvider for RateProvider {
        async fn search(&self, _: &str, _: InstrumentType) -> Result<Vec<SearchHit>> {
            Ok(vec![])
        }

        async fn get_stock_info(&self, id: &str) -> Result<StockInfo> {
            match id {
                "19000" => Ok(serde_json::from_value(json!({
                    "id": 19000, "name": "USD/SEK", "currency": "SEK", "lastPrice": 10.0
                }))?),
                _ => Err(anyhow!("Unknown instrument {id}")),
            }
        }
    }

    #[tokio::test]
    async fn test_resolve_conversion_from_display_currency() {
        let mut config = settings();
        config.currency = Some("SEK".to_string());
        let conversion = resolve_conversion(&RateProvider, &config, "USD")
            .await
            .unwrap();
        assert_eq!(
            conversion,
            Some(Conversion {
                rate: 10.0,
                currency: "SEK".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_resolve_conversion_inverted() {
        let mut config = settings();
        config.currency = Some("USD".to_string());
        let conversion = resolve_conversion(&RateProvider, &config, "SEK")
            .await
            .unwrap()
            .unwrap();
        assert!((conversion.rate - 0.1).abs() < 1e-12);
        assert_eq!(conversion.currency, "USD");
    }

    #[tokio::test]
    async fn test_resolve_conversion_explicit_instrument() {
        let mut config = settings();
        config.conversion_currency = Some(19000);
        config.invert_conversion_currency = true;
        let conversion = resolve_conversion(&RateProvider, &config, "SEK")
            .await
            .unwrap()
            .unwrap();
        assert!((conversion.rate - 0.1).abs() < 1e-12);
        assert_eq!(conversion.currency, "USD");
    }

    #[tokio::test]
    async fn test_resolve_conversion_not_needed() {
        let mut config = settings();
        assert!(
            resolve_conversion(&RateProvider, &config, "USD")
                .await
                .unwrap()
                .is_none()
        );

        config.currency = Some("USD".to_string());
        assert!(
            resolve_conversion(&RateProvider, &config, "USD")
                .await
                .unwrap()
                .is_none()
        );

        // Unknown and cross pairs fall back to unconverted values.
        config.currency = Some("SEK".to_string());
        assert!(
            resolve_conversion(&RateProvider, &config, "JPY")
                .await
                .unwrap()
                .is_none()
        );
        config.currency = Some("EUR".to_string());
        assert!(
            resolve_conversion(&RateProvider, &config, "USD")
                .await
                .unwrap()
                .is_none()
        );
    }
}
