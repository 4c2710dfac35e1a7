use super::prompt::Prompt;
use super::ui;
use crate::core::entry::ConfigEntry;
use crate::core::instrument::InstrumentProvider;
use crate::flow::{OptionsFlow, StepResult};
use crate::store::EntryStore;
use anyhow::{Result, anyhow, bail};
use comfy_table::Cell;
use std::io::Write;
use tracing::{info, warn};

fn find_entry(store: &dyn EntryStore, key: &str) -> Result<ConfigEntry> {
    store
        .find(key)?
        .ok_or_else(|| anyhow!("No configured instrument matches '{}'", key))
}

pub fn list(store: &dyn EntryStore, output: &mut dyn Write) -> Result<()> {
    let entries = store.list()?;
    if entries.is_empty() {
        writeln!(output, "No instruments configured.")?;
        return Ok(());
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Entry"),
        ui::header_cell("Title"),
        ui::header_cell("Instrument"),
        ui::header_cell("Shares"),
        ui::header_cell("Currency"),
    ]);
    for entry in &entries {
        let settings = entry.settings();
        table.add_row(vec![
            Cell::new(&entry.entry_id),
            Cell::new(&entry.title),
            Cell::new(&entry.unique_id),
            ui::number_cell(settings.shares),
            Cell::new(settings.currency.as_deref().unwrap_or("-")),
        ]);
    }
    writeln!(output, "{table}")?;
    Ok(())
}

pub fn remove(store: &dyn EntryStore, key: &str, output: &mut dyn Write) -> Result<()> {
    let entry = find_entry(store, key)?;
    if !store.remove(&entry.entry_id)? {
        bail!("Entry {} disappeared before it could be removed", entry.entry_id);
    }
    info!(entry = %entry.entry_id, "Removed entry");
    writeln!(output, "Removed {} ({})", entry.title, entry.entry_id)?;
    Ok(())
}

/// Runs the options flow for one entry and saves the result.
pub async fn options(
    provider: &(dyn InstrumentProvider + Send + Sync),
    store: &dyn EntryStore,
    key: &str,
    prompt: &mut Prompt<'_>,
) -> Result<ConfigEntry> {
    let entry = find_entry(store, key)?;
    let mut flow = OptionsFlow::new(entry.clone());
    match provider.get_stock_info(&entry.unique_id).await {
        Ok(info) => flow = flow.with_native_currency(&info.currency),
        Err(e) => warn!(error = %e, id = %entry.unique_id, "Could not look up instrument currency"),
    }
    let mut result = flow.step_init(None);

    loop {
        result = match result {
            StepResult::Form {
                step_id,
                schema,
                errors,
            } => {
                let input = prompt.form(step_id, &schema, &errors)?;
                flow.step_init(Some(input))
            }
            StepResult::CreateEntry { data, .. } => {
                let updated = store.update_options(&entry.entry_id, data)?;
                writeln!(prompt.writer(), "Updated options for {}", updated.title)?;
                return Ok(updated);
            }
            StepResult::Abort { reason } => bail!("Options flow aborted: {}", reason),
            StepResult::Menu { .. } => bail!("Options flow has no menu"),
        };
    }
}
