//! Form schemas shown by the wizard and coercion of submitted values.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Field key to error code. `base` holds errors not tied to a field.
pub type FormErrors = BTreeMap<String, String>;

pub const ERROR_REQUIRED: &str = "required";
pub const ERROR_INVALID_NUMBER: &str = "invalid_number";
pub const ERROR_INVALID_BOOLEAN: &str = "invalid_boolean";
pub const ERROR_INVALID_OPTION: &str = "invalid_option";
pub const ERROR_INVALID_STRING: &str = "invalid_string";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Float,
    Integer,
    Boolean,
    /// Options as (value, label) pairs.
    Select { options: Vec<(String, String)> },
    MultiSelect { options: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub key: String,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<Value>,
}

impl Field {
    pub fn required(key: &str, kind: FieldKind) -> Self {
        Field {
            key: key.to_string(),
            kind,
            required: true,
            default: None,
        }
    }

    pub fn optional(key: &str, kind: FieldKind) -> Self {
        Field {
            key: key.to_string(),
            kind,
            required: false,
            default: None,
        }
    }

    pub fn with_default(mut self, default: Option<Value>) -> Self {
        self.default = default.filter(|v| !v.is_null());
        self
    }

    /// Coerces a submitted value into the field's type.
    pub fn coerce(&self, value: &Value) -> Result<Value, &'static str> {
        match &self.kind {
            FieldKind::String => match value {
                Value::String(_) => Ok(value.clone()),
                Value::Number(n) => Ok(Value::String(n.to_string())),
                _ => Err(ERROR_INVALID_STRING),
            },
            FieldKind::Float => match value {
                Value::Number(n) => n.as_f64().map(Value::from).ok_or(ERROR_INVALID_NUMBER),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(Value::from)
                    .ok_or(ERROR_INVALID_NUMBER),
                _ => Err(ERROR_INVALID_NUMBER),
            },
            FieldKind::Integer => match value {
                Value::Number(n) => n.as_u64().map(Value::from).ok_or(ERROR_INVALID_NUMBER),
                Value::String(s) => s
                    .trim()
                    .parse::<u64>()
                    .map(Value::from)
                    .map_err(|_| ERROR_INVALID_NUMBER),
                _ => Err(ERROR_INVALID_NUMBER),
            },
            FieldKind::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                Value::Number(n) => match n.as_i64() {
                    Some(0) => Ok(Value::Bool(false)),
                    Some(1) => Ok(Value::Bool(true)),
                    _ => Err(ERROR_INVALID_BOOLEAN),
                },
                Value::String(s) => parse_boolean(s)
                    .map(Value::Bool)
                    .ok_or(ERROR_INVALID_BOOLEAN),
                _ => Err(ERROR_INVALID_BOOLEAN),
            },
            FieldKind::Select { options } => {
                let selected = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    _ => return Err(ERROR_INVALID_OPTION),
                };
                if options.iter().any(|(key, _)| *key == selected) {
                    Ok(Value::String(selected))
                } else {
                    Err(ERROR_INVALID_OPTION)
                }
            }
            FieldKind::MultiSelect { options } => {
                let selected: Vec<String> = match value {
                    Value::Array(items) => items
                        .iter()
                        .map(|item| item.as_str().map(str::to_string))
                        .collect::<Option<Vec<_>>>()
                        .ok_or(ERROR_INVALID_OPTION)?,
                    Value::String(s) => s
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect(),
                    _ => return Err(ERROR_INVALID_OPTION),
                };
                if selected.iter().all(|s| options.contains(s)) {
                    Ok(Value::from(selected))
                } else {
                    Err(ERROR_INVALID_OPTION)
                }
            }
        }
    }
}

fn parse_boolean(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enable" => Some(true),
        "0" | "false" | "no" | "off" | "disable" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormSchema {
    pub fields: Vec<Field>,
}

impl FormSchema {
    pub fn new(fields: Vec<Field>) -> Self {
        FormSchema { fields }
    }

    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Validates submitted values, filling defaults. Keys not in the schema
    /// are dropped.
    pub fn validate(&self, input: &Map<String, Value>) -> Result<Map<String, Value>, FormErrors> {
        let mut output = Map::new();
        let mut errors = FormErrors::new();

        for field in &self.fields {
            match input.get(&field.key).filter(|v| !v.is_null()) {
                Some(value) => match field.coerce(value) {
                    Ok(coerced) => {
                        output.insert(field.key.clone(), coerced);
                    }
                    Err(code) => {
                        errors.insert(field.key.clone(), code.to_string());
                    }
                },
                None => {
                    if let Some(default) = &field.default {
                        output.insert(field.key.clone(), default.clone());
                    } else if field.required {
                        errors.insert(field.key.clone(), ERROR_REQUIRED.to_string());
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(output)
        } else {
            Err(errors)
        }
    }
}
