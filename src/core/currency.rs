//! Currency conversion abstractions
//!
//! Every conversion instrument known to Avanza is quoted against the Swedish
//! krona. Converting a holding into another currency therefore means picking
//! one of those rate instruments and deciding whether its raw rate has to be
//! inverted before it is applied.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::LazyLock;
use tracing::warn;

/// The currency every table entry is quoted against.
pub const REFERENCE_CURRENCY: &str = "SEK";

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    /// Returns the factor that converts an amount in `from` into `to`.
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        CurrencyCode(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(code: &str) -> Self {
        CurrencyCode::new(code)
    }
}

/// A directed pair of currencies, `from` priced in `to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurrencyPair {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

impl CurrencyPair {
    pub fn new(from: &str, to: &str) -> Self {
        CurrencyPair {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn reversed(&self) -> Self {
        CurrencyPair {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

impl Display for CurrencyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateInstrument {
    pub instrument_id: u64,
    pub invert: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableEntry {
    /// The reference currency itself. Nothing to convert.
    Reference,
    Rate(RateInstrument),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TableKey {
    Currency(CurrencyCode),
    Pair(CurrencyPair),
}

/// Rate instruments listed against the reference currency.
const LISTED_RATES: [(&str, u64); 4] = [
    ("USD", 19000),
    ("EUR", 18998),
    ("NOK", 53822),
    ("DKK", 53824),
];

static CURRENCY_TABLE: LazyLock<HashMap<TableKey, TableEntry>> = LazyLock::new(|| {
    let mut table = HashMap::new();
    table.insert(
        TableKey::Currency(REFERENCE_CURRENCY.into()),
        TableEntry::Reference,
    );
    for (code, instrument_id) in LISTED_RATES {
        table.insert(
            TableKey::Currency(code.into()),
            TableEntry::Rate(RateInstrument {
                instrument_id,
                invert: false,
            }),
        );
        // Going from the reference currency into a listed one uses the same
        // instrument upside down.
        table.insert(
            TableKey::Pair(CurrencyPair::new(REFERENCE_CURRENCY, code)),
            TableEntry::Rate(RateInstrument {
                instrument_id,
                invert: true,
            }),
        );
    }
    table
});

fn lookup(key: TableKey) -> Option<TableEntry> {
    CURRENCY_TABLE.get(&key).copied()
}

/// The instrument and inversion needed to convert between two currencies.
///
/// An absent `instrument_id` means no conversion applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConversionResolution {
    pub instrument_id: Option<u64>,
    pub invert: bool,
}

impl ConversionResolution {
    pub const IDENTITY: ConversionResolution = ConversionResolution {
        instrument_id: None,
        invert: false,
    };

    fn from_instrument(rate: RateInstrument, flip: bool) -> Self {
        ConversionResolution {
            instrument_id: Some(rate.instrument_id),
            invert: rate.invert != flip,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.instrument_id.is_none()
    }

    /// Turns the raw quote of the rate instrument into a conversion factor.
    pub fn apply(&self, raw_rate: f64) -> f64 {
        if self.invert { 1.0 / raw_rate } else { raw_rate }
    }
}

/// Resolves which rate instrument converts `source` into `target`.
///
/// Lookup order: identical currencies, the direct pair, the reversed pair
/// (with the inversion flipped), then the bare `source` code. The last step
/// answers as if `target` were the reference currency whatever was passed,
/// so `resolve("USD", "EUR")` yields the USD/SEK instrument. Pairs that match
/// nothing resolve to no conversion rather than an error.
pub fn resolve(source: &str, target: &str) -> ConversionResolution {
    if source == target {
        return ConversionResolution::IDENTITY;
    }

    let pair = CurrencyPair::new(source, target);
    if let Some(TableEntry::Rate(rate)) = lookup(TableKey::Pair(pair.clone())) {
        return ConversionResolution::from_instrument(rate, false);
    }

    if let Some(TableEntry::Rate(rate)) = lookup(TableKey::Pair(pair.reversed())) {
        return ConversionResolution::from_instrument(rate, true);
    }

    if let Some(TableEntry::Rate(rate)) = lookup(TableKey::Currency(pair.from)) {
        return ConversionResolution::from_instrument(rate, false);
    }

    ConversionResolution::IDENTITY
}

/// Same as [`resolve`] with the reference currency as target.
pub fn resolve_to_reference(source: &str) -> ConversionResolution {
    resolve(source, REFERENCE_CURRENCY)
}

/// Resolves a conversion for callers that act on the result.
///
/// Returns `None` when no conversion is needed, when the table has nothing
/// for the pair, and for cross pairs where neither side is the reference
/// currency, since [`resolve`] would answer those with a reference quote.
/// The last two cases are logged.
pub fn resolve_reference_pair(source: &str, target: &str) -> Option<ConversionResolution> {
    if source == target {
        return None;
    }
    if source != REFERENCE_CURRENCY && target != REFERENCE_CURRENCY {
        warn!(
            from = source,
            to = target,
            "Cross currency conversion is not supported"
        );
        return None;
    }
    let resolution = resolve(source, target);
    if resolution.is_identity() {
        warn!(
            from = source,
            to = target,
            "No conversion instrument for currency pair"
        );
        return None;
    }
    Some(resolution)
}

/// Finds the currency a rate instrument prices. No instrument means the
/// reference currency.
pub fn currency_for_instrument(instrument_id: Option<u64>) -> Option<&'static str> {
    match instrument_id {
        None => Some(REFERENCE_CURRENCY),
        Some(id) => LISTED_RATES
            .iter()
            .find(|(_, listed)| *listed == id)
            .map(|(code, _)| *code),
    }
}
