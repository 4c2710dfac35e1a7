//! The guided setup wizard and the options flow.
//!
//! Every step either shows a menu or a form, finishes with a record, or
//! aborts. The host renders whatever comes back and feeds the user's answer
//! into the next call.

pub mod config_flow;
pub mod options_flow;
pub mod schema;

pub use config_flow::ConfigFlow;
pub use options_flow::OptionsFlow;
pub use schema::{Field, FieldKind, FormErrors, FormSchema};

use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub const CONF_ID: &str = "id";
pub const CONF_NAME: &str = "name";
pub const CONF_SEARCH: &str = "search";
pub const CONF_INSTRUMENT_TYPE: &str = "instrument_type";
pub const CONF_SHARES: &str = "shares";
pub const CONF_PURCHASE_PRICE: &str = "purchase_price";
pub const CONF_PURCHASE_DATE: &str = "purchase_date";
pub const CONF_CURRENCY: &str = "currency";
pub const CONF_CONVERSION_CURRENCY: &str = "conversion_currency";
pub const CONF_INVERT_CONVERSION_CURRENCY: &str = "invert_conversion_currency";
pub const CONF_MONITORED_CONDITIONS: &str = "monitored_conditions";
pub const CONF_SHOW_TRENDING_ICON: &str = "show_trending_icon";

/// Key for errors that concern the whole form.
pub const ERROR_BASE: &str = "base";
pub const ERROR_CANNOT_CONNECT: &str = "cannot_connect";
pub const ERROR_NO_RESULTS: &str = "no_results";
pub const ERROR_INVALID_STOCK_ID: &str = "invalid_stock_id";
pub const ERROR_UNKNOWN: &str = "unknown";
pub const ABORT_ALREADY_CONFIGURED: &str = "already_configured";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    User,
    SearchInstrument,
    SelectInstrument,
    ManualEntry,
    Configure,
    Import,
    Init,
}

impl Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                StepId::User => "user",
                StepId::SearchInstrument => "search_instrument",
                StepId::SelectInstrument => "select_instrument",
                StepId::ManualEntry => "manual_entry",
                StepId::Configure => "configure",
                StepId::Import => "import",
                StepId::Init => "init",
            }
        )
    }
}

/// Outcome of a single flow step. `T` is the record the flow produces.
#[derive(Debug, Clone, PartialEq)]
pub enum StepResult<T> {
    Menu {
        step_id: StepId,
        options: Vec<StepId>,
    },
    Form {
        step_id: StepId,
        schema: FormSchema,
        errors: FormErrors,
    },
    CreateEntry {
        title: String,
        data: T,
    },
    Abort {
        reason: String,
    },
}

impl<T> StepResult<T> {
    pub fn form(step_id: StepId, schema: FormSchema, errors: FormErrors) -> Self {
        StepResult::Form {
            step_id,
            schema,
            errors,
        }
    }

    pub fn base_error(step_id: StepId, schema: FormSchema, code: &str) -> Self {
        let mut errors = FormErrors::new();
        errors.insert(ERROR_BASE.to_string(), code.to_string());
        StepResult::form(step_id, schema, errors)
    }

    pub fn abort(reason: &str) -> Self {
        StepResult::Abort {
            reason: reason.to_string(),
        }
    }

    pub fn step_id(&self) -> Option<StepId> {
        match self {
            StepResult::Menu { step_id, .. } | StepResult::Form { step_id, .. } => Some(*step_id),
            _ => None,
        }
    }
}
