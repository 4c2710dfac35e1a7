use crate::api;
use crate::core::instrument::InstrumentProvider;
use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::debug;

/// Answers one JSON message per input line until the input ends.
pub async fn run(
    provider: &(dyn InstrumentProvider + Send + Sync),
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<usize> {
    let mut handled = 0;
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let response = api::handle_line(provider, line.trim()).await;
        writeln!(output, "{response}")?;
        output.flush()?;
        handled += 1;
    }
    debug!(handled, "Message input closed");
    Ok(handled)
}
