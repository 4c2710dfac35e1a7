use super::config_flow::{holding_fields, normalize_currency};
use super::schema::{FormErrors, FormSchema};
use super::{StepId, StepResult};
use crate::core::currency::resolve_reference_pair;
use crate::core::entry::{ConfigEntry, SensorOptions};
use serde_json::{Map, Value};
use tracing::{debug, error};

/// Lets the user change the holding settings of an existing entry.
pub struct OptionsFlow {
    entry: ConfigEntry,
    native_currency: Option<String>,
}

impl OptionsFlow {
    pub fn new(entry: ConfigEntry) -> Self {
        OptionsFlow {
            entry,
            native_currency: None,
        }
    }

    /// Currency the instrument trades in, used to pick a new conversion
    /// instrument when the display currency changes.
    pub fn with_native_currency(mut self, currency: &str) -> Self {
        self.native_currency = Some(currency.to_string());
        self
    }

    /// Defaults come from the current options, then the entry data.
    pub fn schema(&self) -> FormSchema {
        FormSchema::new(holding_fields(&self.entry.settings()))
    }

    pub fn step_init(&self, input: Option<Map<String, Value>>) -> StepResult<SensorOptions> {
        let schema = self.schema();
        let Some(input) = input else {
            return StepResult::form(StepId::Init, schema, FormErrors::new());
        };
        let mut values = match schema.validate(&input) {
            Ok(values) => values,
            Err(errors) => return StepResult::form(StepId::Init, schema, errors),
        };
        normalize_currency(&mut values);

        match serde_json::from_value::<SensorOptions>(Value::Object(values)) {
            Ok(mut options) => {
                self.refresh_conversion(&mut options);
                debug!(entry = %self.entry.entry_id, "Updating options");
                StepResult::CreateEntry {
                    title: String::new(),
                    data: options,
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to build options");
                StepResult::abort(super::ERROR_UNKNOWN)
            }
        }
    }

    /// Replaces a conversion instrument left over from the previous display
    /// currency. An instrument the user picked is kept.
    fn refresh_conversion(&self, options: &mut SensorOptions) {
        let current = self.entry.settings();
        if options.currency == current.currency
            || options.conversion_currency != current.conversion_currency
        {
            return;
        }

        let resolution = match (self.native_currency.as_deref(), options.currency.as_deref()) {
            (Some(native), Some(target)) => resolve_reference_pair(native, target),
            _ => None,
        };
        debug!(
            entry = %self.entry.entry_id,
            instrument = ?resolution.and_then(|r| r.instrument_id),
            "Display currency changed, replacing conversion instrument"
        );
        match resolution {
            Some(resolution) => {
                options.conversion_currency = resolution.instrument_id;
                options.invert_conversion_currency = Some(resolution.invert);
            }
            None => {
                options.conversion_currency = None;
                options.invert_conversion_currency = Some(false);
            }
        }
    }
}
