use crate::core::instrument::InstrumentProvider;
use crate::flow::ConfigFlow;
use crate::legacy::{self, ImportReport};
use crate::store::EntryStore;
use anyhow::Result;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Imports the sensors found in a legacy YAML configuration.
pub async fn run(
    provider: &(dyn InstrumentProvider + Send + Sync),
    store: &dyn EntryStore,
    path: &Path,
    output: &mut dyn Write,
) -> Result<ImportReport> {
    let records = legacy::scan_file(path)?;
    info!(count = records.len(), path = %path.display(), "Found legacy sensors");
    if records.is_empty() {
        writeln!(output, "No avanza_stock sensors found in {}", path.display())?;
        return Ok(ImportReport::default());
    }

    let mut flow = ConfigFlow::new(provider).with_configured_ids(store.configured_ids()?);
    let report = legacy::migrate(records, &mut flow, store).await?;
    writeln!(
        output,
        "Imported {} instrument(s), skipped {}.",
        report.imported.len(),
        report.skipped.len()
    )?;
    for id in &report.skipped {
        writeln!(output, "  skipped {id}")?;
    }
    Ok(report)
}
