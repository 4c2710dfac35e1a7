use super::prompt::{Prompt, error_message};
use super::ui::{StyleType, style_text};
use crate::core::entry::ConfigEntry;
use crate::core::instrument::InstrumentProvider;
use crate::flow::{ConfigFlow, StepResult};
use crate::store::EntryStore;
use anyhow::Result;
use std::io::Write;
use tracing::info;

/// Runs the setup wizard and stores the entry it creates.
///
/// Returns the new entry, or `None` when the wizard aborted.
pub async fn run(
    provider: &(dyn InstrumentProvider + Send + Sync),
    store: &dyn EntryStore,
    prompt: &mut Prompt<'_>,
) -> Result<Option<ConfigEntry>> {
    let mut flow = ConfigFlow::new(provider).with_configured_ids(store.configured_ids()?);
    let mut result = flow.step_user();

    loop {
        result = match result {
            StepResult::Menu { step_id, options } => {
                let choice = prompt.menu(step_id, &options)?;
                flow.choose(choice).await
            }
            StepResult::Form {
                step_id,
                schema,
                errors,
            } => {
                let input = prompt.form(step_id, &schema, &errors)?;
                flow.submit(input).await
            }
            StepResult::CreateEntry { title, data } => {
                let entry = ConfigEntry::new(title, data);
                store.add(entry.clone())?;
                info!(entry = %entry.entry_id, "Stored new entry");
                writeln!(
                    prompt.writer(),
                    "Added {} ({})",
                    style_text(&entry.title, StyleType::TotalLabel),
                    entry.entry_id
                )?;
                return Ok(Some(entry));
            }
            StepResult::Abort { reason } => {
                writeln!(
                    prompt.writer(),
                    "{}",
                    style_text(error_message(&reason), StyleType::Error)
                )?;
                return Ok(None);
            }
        };
    }
}
