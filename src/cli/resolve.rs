use super::ui;
use crate::core::currency::{self, CurrencyPair, REFERENCE_CURRENCY};
use anyhow::Result;
use comfy_table::Cell;
use std::io::Write;

/// Prints the conversion instrument for a currency pair. Without `to` the
/// pair is resolved against the reference currency.
pub fn run(from: &str, to: Option<&str>, output: &mut dyn Write) -> Result<()> {
    let from = from.to_uppercase();
    let (pair, resolution) = match to {
        Some(to) => {
            let to = to.to_uppercase();
            (CurrencyPair::new(&from, &to), currency::resolve(&from, &to))
        }
        None => (
            CurrencyPair::new(&from, REFERENCE_CURRENCY),
            currency::resolve_to_reference(&from),
        ),
    };

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Pair"),
        ui::header_cell("Instrument"),
        ui::header_cell("Invert"),
    ]);
    table.add_row(vec![
        Cell::new(pair.to_string()),
        ui::format_optional_cell(resolution.instrument_id, |id| id.to_string()),
        Cell::new(if resolution.invert { "yes" } else { "no" }),
    ]);
    writeln!(output, "{table}")?;

    if resolution.is_identity() {
        let note = "No conversion needed";
        writeln!(output, "{}", ui::style_text(note, ui::StyleType::Subtle))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(from: &str, to: Option<&str>) -> String {
        let mut output = Vec::new();
        run(from, to, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_resolve_output() {
        let text = render("usd", None);
        assert!(text.contains("USD/SEK"));
        assert!(text.contains("19000"));

        let text = render("SEK", Some("EUR"));
        assert!(text.contains("18998"));
        assert!(text.contains("yes"));

        let text = render("SEK", Some("sek"));
        assert!(text.contains("N/A"));
    }
}
