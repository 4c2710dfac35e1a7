//! Configuration entries produced by the setup wizard.

use crate::core::conditions::default_monitored_conditions;
use serde::{Deserialize, Serialize};

pub const DOMAIN: &str = "avanza_stock";
pub const DEFAULT_NAME: &str = "Avanza Stock GUI";

fn default_purchase_date() -> String {
    String::new()
}

/// Settings captured when an instrument is added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub shares: f64,
    #[serde(default)]
    pub purchase_price: f64,
    #[serde(default = "default_purchase_date")]
    pub purchase_date: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub conversion_currency: Option<u64>,
    #[serde(default)]
    pub invert_conversion_currency: bool,
    #[serde(default = "default_monitored_conditions")]
    pub monitored_conditions: Vec<String>,
    #[serde(default)]
    pub show_trending_icon: bool,
}

impl SensorConfig {
    pub fn new(id: &str, name: &str) -> Self {
        SensorConfig {
            name: name.to_string(),
            id: id.to_string(),
            shares: 0.0,
            purchase_price: 0.0,
            purchase_date: default_purchase_date(),
            currency: None,
            conversion_currency: None,
            invert_conversion_currency: false,
            monitored_conditions: default_monitored_conditions(),
            show_trending_icon: false,
        }
    }
}

/// Overrides set through the options flow. Absent values fall back to the
/// entry data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_currency: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invert_conversion_currency: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitored_conditions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_trending_icon: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub entry_id: String,
    pub unique_id: String,
    pub title: String,
    pub data: SensorConfig,
    #[serde(default)]
    pub options: SensorOptions,
}

impl ConfigEntry {
    pub fn new(title: String, data: SensorConfig) -> Self {
        ConfigEntry {
            entry_id: format!("{DOMAIN}_{}", data.id),
            unique_id: data.id.clone(),
            title,
            data,
            options: SensorOptions::default(),
        }
    }

    /// The settings in effect, options layered over data.
    ///
    /// The conversion instrument of the data belongs to its display currency.
    /// Once the options pick another currency, only their own instrument
    /// applies.
    pub fn settings(&self) -> SensorConfig {
        let data = &self.data;
        let options = self.options.clone();
        let currency_overridden = options.currency.is_some() && options.currency != data.currency;
        let (data_conversion, data_invert) = if currency_overridden {
            (None, false)
        } else {
            (data.conversion_currency, data.invert_conversion_currency)
        };
        SensorConfig {
            name: data.name.clone(),
            id: data.id.clone(),
            shares: options.shares.unwrap_or(data.shares),
            purchase_price: options.purchase_price.unwrap_or(data.purchase_price),
            purchase_date: options
                .purchase_date
                .unwrap_or_else(|| data.purchase_date.clone()),
            currency: options.currency.or_else(|| data.currency.clone()),
            conversion_currency: options.conversion_currency.or(data_conversion),
            invert_conversion_currency: options.invert_conversion_currency.unwrap_or(data_invert),
            monitored_conditions: options
                .monitored_conditions
                .unwrap_or_else(|| data.monitored_conditions.clone()),
            show_trending_icon: options
                .show_trending_icon
                .unwrap_or(data.show_trending_icon),
        }
    }
}
