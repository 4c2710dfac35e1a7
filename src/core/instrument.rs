//! Instrument lookup abstractions and core types

use crate::core::currency::ConversionResolution;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentType {
    Stock,
    Fund,
    Index,
    Bond,
    Certificate,
    ExchangeRate,
    All,
}

impl InstrumentType {
    pub const ALL: [InstrumentType; 7] = [
        InstrumentType::Stock,
        InstrumentType::Fund,
        InstrumentType::Index,
        InstrumentType::Bond,
        InstrumentType::Certificate,
        InstrumentType::ExchangeRate,
        InstrumentType::All,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            InstrumentType::Stock => "stock",
            InstrumentType::Fund => "fund",
            InstrumentType::Index => "index",
            InstrumentType::Bond => "bond",
            InstrumentType::Certificate => "certificate",
            InstrumentType::ExchangeRate => "exchange_rate",
            InstrumentType::All => "all",
        }
    }

    /// Label used by the Avanza search endpoint.
    pub fn label(&self) -> &'static str {
        match self {
            InstrumentType::Stock => "Aktier",
            InstrumentType::Fund => "Fonder",
            InstrumentType::Index => "Index",
            InstrumentType::Bond => "Obligationer",
            InstrumentType::Certificate => "Certifikat",
            InstrumentType::ExchangeRate => "Valutor",
            InstrumentType::All => "Alla",
        }
    }

    /// Like `from_str`, but unknown keys search every instrument type.
    pub fn from_key_or_all(key: &str) -> Self {
        key.parse().unwrap_or(InstrumentType::All)
    }
}

impl Display for InstrumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for InstrumentType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InstrumentType::ALL
            .into_iter()
            .find(|t| t.key() == s.to_lowercase())
            .ok_or_else(|| anyhow::anyhow!("Invalid instrument type: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub currency: String,
}

impl SearchHit {
    pub fn display_label(&self) -> String {
        format!("{} ({})", self.name, self.currency)
    }
}

/// Quote and reference data for a single instrument.
///
/// Fields the crate computes with are typed; everything else the data source
/// returns is kept in `raw` so monitored conditions can be passed through.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockInfo {
    #[serde(deserialize_with = "crate::core::instrument::id_as_string")]
    pub id: String,
    pub name: String,
    pub currency: String,
    pub last_price: f64,
    #[serde(default)]
    pub change: f64,
    #[serde(default)]
    pub change_percent: f64,
    #[serde(flatten)]
    pub raw: Map<String, Value>,
}

impl StockInfo {
    /// Looks up a numeric field, including the typed ones.
    pub fn number(&self, key: &str) -> Option<f64> {
        match key {
            "lastPrice" => Some(self.last_price),
            "change" => Some(self.change),
            "changePercent" => Some(self.change_percent),
            _ => self.raw.get(key).and_then(Value::as_f64),
        }
    }
}

/// Accepts ids as either JSON numbers or strings.
pub fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected instrument id, found {other}"
        ))),
    }
}

#[async_trait]
pub trait InstrumentProvider: Send + Sync {
    async fn search(&self, term: &str, instrument_type: InstrumentType) -> Result<Vec<SearchHit>>;

    async fn get_stock_info(&self, id: &str) -> Result<StockInfo>;
}

/// Fetches the quote of the resolved rate instrument and turns it into a
/// conversion factor.
pub async fn conversion_rate(
    provider: &(dyn InstrumentProvider + Send + Sync),
    resolution: &ConversionResolution,
) -> Result<f64> {
    let Some(instrument_id) = resolution.instrument_id else {
        return Ok(1.0);
    };
    let info = provider.get_stock_info(&instrument_id.to_string()).await?;
    if info.last_price <= 0.0 {
        anyhow::bail!(
            "Invalid rate {} for conversion instrument {}",
            info.last_price,
            instrument_id
        );
    }
    Ok(resolution.apply(info.last_price))
}
