//! Catalogue of the attributes a sensor can expose.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Top-level fields copied straight from the stock info.
pub const MONITORED_CONDITIONS_BASE: &[&str] = &[
    "country",
    "currency",
    "dividends",
    "hasInvestmentFees",
    "highestPrice",
    "id",
    "isin",
    "lastPrice",
    "lastPriceUpdated",
    "loanFactor",
    "lowestPrice",
    "marketList",
    "marketMakerExpected",
    "marketTrades",
    "morningStarFactSheetUrl",
    "name",
    "numberOfOwners",
    "orderDepthReceivedTime",
    "pushPermitted",
    "quoteUpdated",
    "shortSellable",
    "superLoan",
    "tradable",
];

pub const MONITORED_CONDITIONS_KEYRATIOS: &[&str] =
    &["directYield", "priceEarningsRatio", "volatility"];

pub const MONITORED_CONDITIONS_LISTING: &[&str] = &["tickerSymbol", "marketPlace", "flagCode"];

pub const MONITORED_CONDITIONS_COMPANY: &[&str] = &[
    "description",
    "marketCapital",
    "sector",
    "totalNumberOfShares",
];

pub const MONITORED_CONDITIONS_QUOTE: &[&str] = &[
    "change",
    "changePercent",
    "totalValueTraded",
    "totalVolumeTraded",
];

pub const MONITORED_CONDITIONS_PRICE: &[&str] = &[
    "priceAtStartOfYear",
    "priceFiveYearsAgo",
    "priceOneMonthAgo",
    "priceOneWeekAgo",
    "priceOneYearAgo",
    "priceThreeMonthsAgo",
    "priceThreeYearsAgo",
];

/// Fields of a single dividend record.
pub const MONITORED_CONDITIONS_DIVIDENDS: &[&str] =
    &["amount", "exDate", "exDateStatus", "paymentDate"];

/// Where a monitored condition lives in the stock info payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionSource {
    Root,
    KeyRatios,
    Listing,
    Company,
}

impl ConditionSource {
    pub fn object_key(&self) -> Option<&'static str> {
        match self {
            ConditionSource::Root => None,
            ConditionSource::KeyRatios => Some("keyRatios"),
            ConditionSource::Listing => Some("listing"),
            ConditionSource::Company => Some("company"),
        }
    }
}

pub fn condition_source(condition: &str) -> ConditionSource {
    if MONITORED_CONDITIONS_KEYRATIOS.contains(&condition) {
        ConditionSource::KeyRatios
    } else if MONITORED_CONDITIONS_LISTING.contains(&condition) {
        ConditionSource::Listing
    } else if MONITORED_CONDITIONS_COMPANY.contains(&condition) {
        ConditionSource::Company
    } else {
        ConditionSource::Root
    }
}

/// Every selectable condition, in display order and without duplicates.
pub fn monitored_conditions() -> Vec<&'static str> {
    let mut all: Vec<&'static str> = Vec::new();
    for group in [
        MONITORED_CONDITIONS_BASE,
        MONITORED_CONDITIONS_KEYRATIOS,
        MONITORED_CONDITIONS_LISTING,
        MONITORED_CONDITIONS_COMPANY,
        MONITORED_CONDITIONS_QUOTE,
        MONITORED_CONDITIONS_PRICE,
    ] {
        for condition in group {
            if !all.contains(condition) {
                all.push(condition);
            }
        }
    }
    all
}

pub fn default_monitored_conditions() -> Vec<String> {
    monitored_conditions()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Periods a price change can be computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ChangePeriod {
    OneWeek,
    OneMonth,
    ThreeMonths,
    OneYear,
    ThreeYears,
    FiveYears,
    TenYears,
    CurrentYear,
}

impl ChangePeriod {
    pub const ALL: [ChangePeriod; 8] = [
        ChangePeriod::OneWeek,
        ChangePeriod::OneMonth,
        ChangePeriod::ThreeMonths,
        ChangePeriod::OneYear,
        ChangePeriod::ThreeYears,
        ChangePeriod::FiveYears,
        ChangePeriod::TenYears,
        ChangePeriod::CurrentYear,
    ];

    /// Attribute suffix, e.g. `changeOneWeek`.
    pub fn suffix(&self) -> &'static str {
        match self {
            ChangePeriod::OneWeek => "OneWeek",
            ChangePeriod::OneMonth => "OneMonth",
            ChangePeriod::ThreeMonths => "ThreeMonths",
            ChangePeriod::OneYear => "OneYear",
            ChangePeriod::ThreeYears => "ThreeYears",
            ChangePeriod::FiveYears => "FiveYears",
            ChangePeriod::TenYears => "TenYears",
            ChangePeriod::CurrentYear => "CurrentYear",
        }
    }

    /// Stock info field holding the historical price for the period.
    pub fn price_field(&self) -> &'static str {
        match self {
            ChangePeriod::OneWeek => "priceOneWeekAgo",
            ChangePeriod::OneMonth => "priceOneMonthAgo",
            ChangePeriod::ThreeMonths => "priceThreeMonthsAgo",
            ChangePeriod::OneYear => "priceOneYearAgo",
            ChangePeriod::ThreeYears => "priceThreeYearsAgo",
            ChangePeriod::FiveYears => "priceFiveYearsAgo",
            ChangePeriod::TenYears => "priceTenYearsAgo",
            ChangePeriod::CurrentYear => "priceAtStartOfYear",
        }
    }
}

impl Display for ChangePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ChangePeriod::OneWeek => "1W",
                ChangePeriod::OneMonth => "1M",
                ChangePeriod::ThreeMonths => "3M",
                ChangePeriod::OneYear => "1Y",
                ChangePeriod::ThreeYears => "3Y",
                ChangePeriod::FiveYears => "5Y",
                ChangePeriod::TenYears => "10Y",
                ChangePeriod::CurrentYear => "YTD",
            }
        )
    }
}

/// Attributes holding an amount of money. These are scaled when a sensor
/// converts into another currency.
pub const CURRENCY_ATTRIBUTES: &[&str] = &[
    "change",
    "highestPrice",
    "lastPrice",
    "lowestPrice",
    "priceAtStartOfYear",
    "priceFiveYearsAgo",
    "priceOneMonthAgo",
    "priceOneWeekAgo",
    "priceOneYearAgo",
    "priceSixMonthsAgo",
    "priceThreeMonthsAgo",
    "priceThreeYearsAgo",
    "totalValueTraded",
    "marketCapital",
    "changeOneWeek",
    "changeOneMonth",
    "changeThreeMonths",
    "changeSixMonths",
    "changeOneYear",
    "changeThreeYears",
    "changeFiveYears",
    "changeTenYears",
    "changeCurrentYear",
    "totalChangeOneWeek",
    "totalChangeOneMonth",
    "totalChangeThreeMonths",
    "totalChangeSixMonths",
    "totalChangeOneYear",
    "totalChangeThreeYears",
    "totalChangeFiveYears",
    "totalChangeTenYears",
    "totalChangeCurrentYear",
    "totalValue",
    "totalChange",
    "profitLoss",
    "totalProfitLoss",
];

/// Dividend amounts are indexed, `dividend0_amountPerShare` and onwards.
pub fn is_currency_attribute(name: &str) -> bool {
    CURRENCY_ATTRIBUTES.contains(&name)
        || (name.starts_with("dividend") && name.ends_with("_amountPerShare"))
}
