//! Migration of sensors configured in the legacy YAML platform format.
//!
//! ```yaml
//! sensor:
//!   - platform: avanza_stock
//!     stock:
//!       - id: 5361
//!         name: Avanza Bank Holding
//!         shares: 100
//!       - 8123
//!     currency: SEK
//! ```
use crate::core::entry::{ConfigEntry, DOMAIN, SensorConfig};
use crate::flow::{ConfigFlow, StepResult};
use crate::store::EntryStore;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_yaml::Value;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdValue {
    Number(u64),
    Text(String),
}

impl IdValue {
    fn into_string(self) -> String {
        match self {
            IdValue::Number(n) => n.to_string(),
            IdValue::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StockItemConfig {
    id: IdValue,
    name: Option<String>,
    shares: Option<f64>,
    purchase_price: Option<f64>,
    purchase_date: Option<String>,
    currency: Option<String>,
    conversion_currency: Option<u64>,
    invert_conversion_currency: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StockItem {
    Id(IdValue),
    Detailed(StockItemConfig),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StockSpec {
    Single(IdValue),
    Many(Vec<StockItem>),
}

#[derive(Debug, Deserialize)]
struct PlatformConfig {
    stock: StockSpec,
    name: Option<String>,
    shares: Option<f64>,
    purchase_price: Option<f64>,
    purchase_date: Option<String>,
    currency: Option<String>,
    conversion_currency: Option<u64>,
    invert_conversion_currency: Option<bool>,
    monitored_conditions: Option<Vec<String>>,
    show_trending_icon: Option<bool>,
}

impl PlatformConfig {
    fn base_record(&self, id: String) -> SensorConfig {
        let mut record = SensorConfig::new(&id, self.name.as_deref().unwrap_or_default());
        record.shares = self.shares.unwrap_or_default();
        record.purchase_price = self.purchase_price.unwrap_or_default();
        record.purchase_date = self.purchase_date.clone().unwrap_or_default();
        record.currency = self.currency.clone();
        record.conversion_currency = self.conversion_currency;
        record.invert_conversion_currency = self.invert_conversion_currency.unwrap_or_default();
        if let Some(conditions) = &self.monitored_conditions {
            record.monitored_conditions = conditions.clone();
        }
        record.show_trending_icon = self.show_trending_icon.unwrap_or_default();
        record
    }

    fn into_records(mut self) -> Vec<SensorConfig> {
        let stocks = match std::mem::replace(&mut self.stock, StockSpec::Many(Vec::new())) {
            StockSpec::Single(id) => return vec![self.base_record(id.into_string())],
            StockSpec::Many(stocks) => stocks,
        };
        // One platform name covers the whole list, so each stock gets its id.
        let list_record = |id: String| {
            let mut record = self.base_record(id.clone());
            if !record.name.trim().is_empty() {
                record.name = format!("{} {}", record.name, id);
            }
            record
        };
        stocks
            .into_iter()
            .map(|item| match item {
                StockItem::Id(id) => list_record(id.into_string()),
                StockItem::Detailed(stock) => {
                    let mut record = list_record(stock.id.into_string());
                    if let Some(name) = stock.name {
                        record.name = name;
                    }
                    if let Some(shares) = stock.shares {
                        record.shares = shares;
                    }
                    if let Some(price) = stock.purchase_price {
                        record.purchase_price = price;
                    }
                    if let Some(date) = stock.purchase_date {
                        record.purchase_date = date;
                    }
                    if stock.currency.is_some() {
                        record.currency = stock.currency;
                    }
                    if stock.conversion_currency.is_some() {
                        record.conversion_currency = stock.conversion_currency;
                    }
                    if let Some(invert) = stock.invert_conversion_currency {
                        record.invert_conversion_currency = invert;
                    }
                    record
                }
            })
            .collect()
    }
}

/// Extracts legacy sensor records from YAML text.
///
/// Only `sensor` items with `platform: avanza_stock` are considered; items
/// that do not parse are skipped with a warning.
pub fn scan_str(yaml: &str) -> Result<Vec<SensorConfig>> {
    let document: Value = serde_yaml::from_str(yaml).context("Failed to parse legacy YAML")?;
    let Some(sensors) = document.get("sensor").and_then(Value::as_sequence) else {
        debug!("No sensor section in legacy configuration");
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for (index, item) in sensors.iter().enumerate() {
        if item.get("platform").and_then(Value::as_str) != Some(DOMAIN) {
            continue;
        }
        match serde_yaml::from_value::<PlatformConfig>(item.clone()) {
            Ok(platform) => records.extend(platform.into_records()),
            Err(e) => warn!(index, error = %e, "Skipping malformed legacy sensor"),
        }
    }
    debug!(count = records.len(), "Scanned legacy configuration");
    Ok(records)
}

pub fn scan_file<P: AsRef<Path>>(path: P) -> Result<Vec<SensorConfig>> {
    let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
        format!(
            "Failed to read legacy config file: {}",
            path.as_ref().display()
        )
    })?;
    scan_str(&content)
}

#[derive(Debug, Default, PartialEq)]
pub struct ImportReport {
    pub imported: Vec<String>,
    pub skipped: Vec<String>,
}

/// Runs every legacy record through the import step and stores the results.
pub async fn migrate(
    records: Vec<SensorConfig>,
    flow: &mut ConfigFlow<'_>,
    store: &dyn EntryStore,
) -> Result<ImportReport> {
    let mut report = ImportReport::default();
    for record in records {
        let id = record.id.clone();
        match flow.step_import(record).await {
            StepResult::CreateEntry { title, data } => {
                match store.add(ConfigEntry::new(title.clone(), data)) {
                    Ok(()) => {
                        info!(id = %id, title = %title, "Imported legacy sensor");
                        report.imported.push(id);
                    }
                    Err(e) => {
                        warn!(id = %id, error = %e, "Could not store legacy sensor");
                        report.skipped.push(id);
                    }
                }
            }
            StepResult::Abort { reason } => {
                info!(id = %id, reason = %reason, "Skipped legacy sensor");
                report.skipped.push(id);
            }
            other => warn!(id = %id, result = ?other, "Unexpected import step result"),
        }
    }
    Ok(report)
}
