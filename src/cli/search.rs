use super::ui;
use crate::core::instrument::{InstrumentProvider, InstrumentType};
use anyhow::Result;
use comfy_table::Cell;
use std::io::Write;

pub async fn run(
    provider: &(dyn InstrumentProvider + Send + Sync),
    term: &str,
    instrument_type: InstrumentType,
    output: &mut dyn Write,
) -> Result<()> {
    let hits = provider.search(term, instrument_type).await?;
    if hits.is_empty() {
        writeln!(output, "No instruments found for '{term}'.")?;
        return Ok(());
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Id"),
        ui::header_cell("Name"),
        ui::header_cell("Currency"),
    ]);
    for hit in &hits {
        table.add_row(vec![
            Cell::new(&hit.id),
            Cell::new(&hit.name),
            Cell::new(&hit.currency),
        ]);
    }
    writeln!(output, "{table}")?;
    Ok(())
}
