use super::ui;
use crate::core::attributes::{self, SensorState};
use crate::core::currency::CurrencyRateProvider;
use crate::core::entry::ConfigEntry;
use crate::core::instrument::InstrumentProvider;
use crate::store::EntryStore;
use anyhow::{Result, anyhow};
use comfy_table::Cell;
use futures::future::join_all;
use serde_json::Value;
use std::io::Write;
use tracing::{debug, warn};

async fn sensor_state(
    provider: &(dyn InstrumentProvider + Send + Sync),
    entry: &ConfigEntry,
) -> Result<SensorState> {
    let settings = entry.settings();
    let info = provider.get_stock_info(&settings.id).await?;
    let conversion = attributes::resolve_conversion(provider, &settings, &info.currency).await?;
    Ok(attributes::compute(&info, &settings, conversion.as_ref()))
}

fn attribute_f64(state: &SensorState, key: &str) -> Option<f64> {
    state.attributes.get(key).and_then(Value::as_f64)
}

fn attributes_table(state: &SensorState) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Attribute"), ui::header_cell("Value")]);
    for (key, value) in &state.attributes {
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        table.add_row(vec![Cell::new(key), Cell::new(text)]);
    }
    table.to_string()
}

/// Sums the holdings' values in `target_currency`. Any holding whose value or
/// rate is unavailable makes the total unavailable.
async fn grand_total(
    states: &[&SensorState],
    rates: &(dyn CurrencyRateProvider + Send + Sync),
    target_currency: &str,
) -> Option<f64> {
    let mut total = 0.0;
    for state in states {
        let value = attribute_f64(state, "totalValue")?;
        match rates.get_rate(&state.unit, target_currency).await {
            Ok(rate) => total += value * rate,
            Err(e) => {
                warn!(error = %e, from = %state.unit, to = target_currency, "Failed to convert total");
                return None;
            }
        }
    }
    Some(total)
}

/// Prints the sensor state of every entry, or of the one matching `key`.
pub async fn run(
    store: &dyn EntryStore,
    provider: &(dyn InstrumentProvider + Send + Sync),
    rates: &(dyn CurrencyRateProvider + Send + Sync),
    target_currency: &str,
    key: Option<&str>,
    output: &mut dyn Write,
) -> Result<()> {
    let entries = match key {
        Some(key) => vec![
            store
                .find(key)?
                .ok_or_else(|| anyhow!("No configured instrument matches '{}'", key))?,
        ],
        None => store.list()?,
    };
    if entries.is_empty() {
        writeln!(output, "No instruments configured. Add one with `avanza-stock add`.")?;
        return Ok(());
    }

    let pb = ui::new_progress_bar(entries.len() as u64);
    pb.set_message("Fetching quotes...");
    let futures = entries.iter().map(|entry| {
        let pb = pb.clone();
        async move {
            let result = sensor_state(provider, entry).await;
            pb.inc(1);
            (entry, result)
        }
    });
    let results = join_all(futures).await;
    pb.finish_and_clear();

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Sensor"),
        ui::header_cell("Price"),
        ui::header_cell("Change (%)"),
        ui::header_cell("Shares"),
        ui::header_cell("Value"),
        ui::header_cell("Profit/Loss"),
        ui::header_cell("Currency"),
    ]);

    let mut states = Vec::new();
    let mut all_valid = true;
    for (entry, result) in &results {
        match result {
            Ok(state) => {
                debug!(entry = %entry.entry_id, state = state.state, "Computed sensor state");
                table.add_row(vec![
                    Cell::new(&state.name),
                    ui::number_cell(state.state),
                    ui::format_optional_cell(attribute_f64(state, "changePercent"), |c| {
                        format!("{c:.2}%")
                    }),
                    ui::format_optional_cell(attribute_f64(state, "shares"), |s| format!("{s:.2}")),
                    ui::format_optional_cell(attribute_f64(state, "totalValue"), |v| {
                        format!("{v:.2}")
                    }),
                    attribute_f64(state, "totalProfitLoss")
                        .map_or_else(|| ui::na_cell(false), |p| ui::change_cell(p, "")),
                    Cell::new(&state.unit),
                ]);
                states.push(state);
            }
            Err(e) => {
                warn!(entry = %entry.entry_id, error = %e, "Failed to fetch sensor state");
                all_valid = false;
                table.add_row(vec![
                    Cell::new(&entry.title),
                    ui::na_cell(true),
                    ui::na_cell(true),
                    ui::number_cell(entry.settings().shares),
                    ui::na_cell(true),
                    ui::na_cell(true),
                    ui::na_cell(false),
                ]);
            }
        }
    }
    writeln!(output, "{table}")?;

    if let ([state], Some(_)) = (states.as_slice(), key) {
        writeln!(output, "\n{}", attributes_table(state))?;
    }

    let total = if all_valid {
        grand_total(&states, rates, target_currency).await
    } else {
        None
    };
    let (total_text, style) = match total {
        Some(total) => (format!("{total:.2}"), ui::StyleType::TotalValue),
        None => ("N/A".to_string(), ui::StyleType::Error),
    };
    writeln!(
        output,
        "\nTotal Value ({}): {}",
        ui::style_text(target_currency, ui::StyleType::TotalLabel),
        ui::style_text(&total_text, style)
    )?;
    Ok(())
}
