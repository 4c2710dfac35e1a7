//! Line based rendering of flow menus and forms.

use super::ui::{StyleType, style_text};
use crate::flow::{FieldKind, FormErrors, FormSchema, StepId};
use anyhow::{Result, bail};
use serde_json::{Map, Value};
use std::io::{BufRead, Write};

pub fn error_message(code: &str) -> &'static str {
    match code {
        "cannot_connect" => "Failed to connect to Avanza",
        "no_results" => "No instruments matched the search",
        "invalid_stock_id" => "No instrument with that id",
        "required" => "A value is required",
        "invalid_number" => "Expected a number",
        "invalid_boolean" => "Expected yes or no",
        "invalid_option" => "Not one of the listed options",
        "invalid_string" => "Expected text",
        "already_configured" => "The instrument is already configured",
        _ => "Unexpected error",
    }
}

fn step_title(step_id: StepId) -> &'static str {
    match step_id {
        StepId::User => "Add instrument",
        StepId::SearchInstrument => "Search for an instrument",
        StepId::SelectInstrument => "Select instrument",
        StepId::ManualEntry => "Enter instrument id",
        StepId::Configure => "Configure holding",
        StepId::Import => "Import",
        StepId::Init => "Holding options",
    }
}

fn default_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

/// Asks questions on `output` and reads the answers from `input`, one line
/// per answer.
pub struct Prompt<'a> {
    input: &'a mut dyn BufRead,
    output: &'a mut dyn Write,
}

impl<'a> Prompt<'a> {
    pub fn new(input: &'a mut dyn BufRead, output: &'a mut dyn Write) -> Self {
        Prompt { input, output }
    }

    fn read_answer(&mut self) -> Result<String> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            bail!("Input closed before the wizard finished");
        }
        Ok(line.trim().to_string())
    }

    /// Shows a numbered menu until one of `options` is picked.
    pub fn menu(&mut self, step_id: StepId, options: &[StepId]) -> Result<StepId> {
        writeln!(
            self.output,
            "{}",
            style_text(step_title(step_id), StyleType::Title)
        )?;
        for (i, option) in options.iter().enumerate() {
            writeln!(self.output, "  {}) {}", i + 1, step_title(*option))?;
        }
        loop {
            write!(self.output, "Choice: ")?;
            let answer = self.read_answer()?;
            let picked = answer
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| options.get(i));
            match picked {
                Some(option) => return Ok(*option),
                None => writeln!(
                    self.output,
                    "{}",
                    style_text("Pick one of the numbers above", StyleType::Error)
                )?,
            }
        }
    }

    /// Asks for every field of `schema`. Empty answers are left out so the
    /// schema defaults apply.
    pub fn form(
        &mut self,
        step_id: StepId,
        schema: &FormSchema,
        errors: &FormErrors,
    ) -> Result<Map<String, Value>> {
        writeln!(
            self.output,
            "{}",
            style_text(step_title(step_id), StyleType::Title)
        )?;
        for (key, code) in errors {
            let text = format!("{key}: {}", error_message(code));
            writeln!(self.output, "{}", style_text(&text, StyleType::Error))?;
        }

        let mut input = Map::new();
        for field in &schema.fields {
            match &field.kind {
                FieldKind::Select { options } => {
                    for (i, (_, label)) in options.iter().enumerate() {
                        writeln!(self.output, "  {}) {}", i + 1, label)?;
                    }
                }
                FieldKind::MultiSelect { options } => {
                    let hint = format!("  one or more of: {}", options.join(", "));
                    writeln!(self.output, "{}", style_text(&hint, StyleType::Subtle))?;
                }
                _ => {}
            }

            let marker = if field.required { "*" } else { "" };
            match field.default.as_ref().map(default_text) {
                Some(default) if !default.is_empty() => {
                    write!(self.output, "{}{} [{}]: ", field.key, marker, default)?
                }
                _ => write!(self.output, "{}{}: ", field.key, marker)?,
            }

            let answer = self.read_answer()?;
            if answer.is_empty() {
                continue;
            }
            let value = match &field.kind {
                // Select options can be picked by their position too.
                FieldKind::Select { options } => answer
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| options.get(i))
                    .filter(|_| !options.iter().any(|(key, _)| *key == answer))
                    .map_or_else(|| answer.clone(), |(key, _)| key.clone()),
                _ => answer,
            };
            input.insert(field.key.clone(), Value::String(value));
        }
        Ok(input)
    }

    pub fn writer(&mut self) -> &mut dyn Write {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::Field;
    use std::io::Cursor;

    fn schema() -> FormSchema {
        FormSchema::new(vec![
            Field::required("search", FieldKind::String),
            Field::required(
                "id",
                FieldKind::Select {
                    options: vec![
                        ("5361".to_string(), "Avanza Bank Holding (SEK)".to_string()),
                        ("238449".to_string(), "Apple Inc (USD)".to_string()),
                    ],
                },
            ),
            Field::optional("shares", FieldKind::Float).with_default(Some(Value::from(0.0))),
        ])
    }

    #[test]
    fn test_menu_retries_until_valid() -> Result<()> {
        let mut input = Cursor::new("9\nx\n2\n");
        let mut output = Vec::new();
        let mut prompt = Prompt::new(&mut input, &mut output);
        let picked = prompt.menu(
            StepId::User,
            &[StepId::SearchInstrument, StepId::ManualEntry],
        )?;
        assert_eq!(picked, StepId::ManualEntry);
        let text = String::from_utf8(output)?;
        assert!(text.contains("2) Enter instrument id"));
        Ok(())
    }

    #[test]
    fn test_form_collects_answers() -> Result<()> {
        let mut input = Cursor::new("volvo\n2\n\n");
        let mut output = Vec::new();
        let mut prompt = Prompt::new(&mut input, &mut output);
        let mut errors = FormErrors::new();
        errors.insert("base".to_string(), "no_results".to_string());

        let answers = prompt.form(StepId::SearchInstrument, &schema(), &errors)?;
        assert_eq!(answers["search"], "volvo");
        assert_eq!(answers["id"], "238449");
        assert!(!answers.contains_key("shares"));

        let text = String::from_utf8(output)?;
        assert!(text.contains("No instruments matched the search"));
        assert!(text.contains("shares [0.0]: "));
        Ok(())
    }

    #[test]
    fn test_form_fails_on_closed_input() {
        let mut input = Cursor::new("volvo\n");
        let mut output = Vec::new();
        let mut prompt = Prompt::new(&mut input, &mut output);
        let err = prompt
            .form(StepId::SearchInstrument, &schema(), &FormErrors::new())
            .unwrap_err();
        assert!(err.to_string().contains("Input closed"));
    }
}
