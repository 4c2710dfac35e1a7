use super::schema::{Field, FieldKind, FormErrors, FormSchema};
use super::{
    ABORT_ALREADY_CONFIGURED, CONF_CONVERSION_CURRENCY, CONF_CURRENCY, CONF_ID,
    CONF_INSTRUMENT_TYPE, CONF_INVERT_CONVERSION_CURRENCY, CONF_MONITORED_CONDITIONS, CONF_NAME,
    CONF_PURCHASE_DATE, CONF_PURCHASE_PRICE, CONF_SEARCH, CONF_SHARES, CONF_SHOW_TRENDING_ICON,
    ERROR_CANNOT_CONNECT, ERROR_INVALID_STOCK_ID, ERROR_NO_RESULTS, ERROR_UNKNOWN, StepId,
    StepResult,
};
use crate::core::conditions::{default_monitored_conditions, monitored_conditions};
use crate::core::currency::resolve_reference_pair;
use crate::core::entry::{DEFAULT_NAME, SensorConfig};
use crate::core::instrument::{InstrumentProvider, InstrumentType, SearchHit};
use crate::providers::util::is_connection_error;
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// The instrument picked by search or manual entry.
#[derive(Debug, Clone, PartialEq)]
struct SelectedInstrument {
    id: String,
    name: Option<String>,
}

pub const MENU_OPTIONS: [StepId; 2] = [StepId::SearchInstrument, StepId::ManualEntry];

pub fn search_schema() -> FormSchema {
    FormSchema::new(vec![
        Field::required(CONF_SEARCH, FieldKind::String),
        Field::required(
            CONF_INSTRUMENT_TYPE,
            FieldKind::Select {
                options: InstrumentType::ALL
                    .iter()
                    .map(|t| (t.key().to_string(), t.label().to_string()))
                    .collect(),
            },
        )
        .with_default(Some(json!(InstrumentType::All.key()))),
    ])
}

pub fn select_schema(hits: &[SearchHit]) -> FormSchema {
    FormSchema::new(vec![Field::required(
        CONF_ID,
        FieldKind::Select {
            options: hits
                .iter()
                .map(|hit| (hit.id.clone(), hit.display_label()))
                .collect(),
        },
    )])
}

pub fn manual_entry_schema() -> FormSchema {
    FormSchema::new(vec![
        Field::required(CONF_ID, FieldKind::String),
        Field::optional(CONF_NAME, FieldKind::String),
    ])
}

/// Holding settings shared by the configure step and the options flow.
pub(crate) fn holding_fields(defaults: &SensorConfig) -> Vec<Field> {
    vec![
        Field::optional(CONF_SHARES, FieldKind::Float).with_default(Some(json!(defaults.shares))),
        Field::optional(CONF_PURCHASE_PRICE, FieldKind::Float)
            .with_default(Some(json!(defaults.purchase_price))),
        Field::optional(CONF_PURCHASE_DATE, FieldKind::String)
            .with_default(Some(json!(defaults.purchase_date))),
        Field::optional(CONF_CURRENCY, FieldKind::String)
            .with_default(defaults.currency.as_ref().map(|c| json!(c))),
        Field::optional(CONF_CONVERSION_CURRENCY, FieldKind::Integer)
            .with_default(defaults.conversion_currency.map(|c| json!(c))),
        Field::optional(CONF_INVERT_CONVERSION_CURRENCY, FieldKind::Boolean)
            .with_default(Some(json!(defaults.invert_conversion_currency))),
        Field::optional(
            CONF_MONITORED_CONDITIONS,
            FieldKind::MultiSelect {
                options: monitored_conditions()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            },
        )
        .with_default(Some(json!(defaults.monitored_conditions))),
        Field::optional(CONF_SHOW_TRENDING_ICON, FieldKind::Boolean)
            .with_default(Some(json!(defaults.show_trending_icon))),
    ]
}

pub fn configure_schema(default_name: Option<&str>) -> FormSchema {
    let defaults = SensorConfig::new("", default_name.unwrap_or_default());
    let mut fields = vec![
        Field::optional(CONF_NAME, FieldKind::String).with_default(default_name.map(|n| json!(n))),
    ];
    fields.extend(holding_fields(&defaults));
    FormSchema::new(fields)
}

fn string_value(values: &Map<String, Value>, key: &str) -> Option<String> {
    values
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Stores the currency code trimmed and upper case. A blank code means none.
pub(crate) fn normalize_currency(values: &mut Map<String, Value>) {
    match string_value(values, CONF_CURRENCY) {
        Some(code) => {
            values.insert(CONF_CURRENCY.to_string(), json!(code.to_uppercase()));
        }
        None => {
            values.remove(CONF_CURRENCY);
        }
    }
}

/// Fills the conversion instrument from the display currency when the user
/// picked a currency but no instrument.
fn apply_display_currency(config: &mut SensorConfig, native_currency: &str) {
    if config.conversion_currency.is_some() {
        return;
    }
    let Some(target) = config.currency.as_deref() else {
        return;
    };
    if let Some(resolution) = resolve_reference_pair(native_currency, target) {
        debug!(
            from = native_currency,
            to = target,
            instrument = ?resolution.instrument_id,
            invert = resolution.invert,
            "Resolved conversion instrument"
        );
        config.conversion_currency = resolution.instrument_id;
        config.invert_conversion_currency = resolution.invert;
    }
}

/// Walks the user from search or manual id entry to a finished sensor
/// configuration.
pub struct ConfigFlow<'a> {
    provider: &'a (dyn InstrumentProvider + Send + Sync),
    configured_ids: HashSet<String>,
    search_results: Vec<SearchHit>,
    instrument: Option<SelectedInstrument>,
    current: StepId,
}

impl<'a> ConfigFlow<'a> {
    pub fn new(provider: &'a (dyn InstrumentProvider + Send + Sync)) -> Self {
        ConfigFlow {
            provider,
            configured_ids: HashSet::new(),
            search_results: Vec::new(),
            instrument: None,
            current: StepId::User,
        }
    }

    /// Instrument ids that already have an entry. Adding them again aborts.
    pub fn with_configured_ids<I: IntoIterator<Item = String>>(mut self, ids: I) -> Self {
        self.configured_ids.extend(ids);
        self
    }

    pub fn current_step(&self) -> StepId {
        self.current
    }

    pub fn search_results(&self) -> &[SearchHit] {
        &self.search_results
    }

    /// Runs `step`, with `input` when the user submitted its form.
    pub async fn step(
        &mut self,
        step: StepId,
        input: Option<Map<String, Value>>,
    ) -> StepResult<SensorConfig> {
        match step {
            StepId::User => self.step_user(),
            StepId::SearchInstrument => self.step_search_instrument(input).await,
            StepId::SelectInstrument => self.step_select_instrument(input).await,
            StepId::ManualEntry => self.step_manual_entry(input).await,
            StepId::Configure => self.step_configure(input).await,
            StepId::Import | StepId::Init => {
                error!(step = %step, "Step is not part of the setup wizard");
                StepResult::abort(ERROR_UNKNOWN)
            }
        }
    }

    /// Submits the user's answer to the step currently shown.
    pub async fn submit(&mut self, input: Map<String, Value>) -> StepResult<SensorConfig> {
        self.step(self.current, Some(input)).await
    }

    /// Follows a menu choice. Choices not on the menu show the menu again.
    pub async fn choose(&mut self, option: StepId) -> StepResult<SensorConfig> {
        if self.current != StepId::User || !MENU_OPTIONS.contains(&option) {
            debug!(option = %option, "Ignoring menu choice");
            return self.step_user();
        }
        self.step(option, None).await
    }

    pub fn step_user(&mut self) -> StepResult<SensorConfig> {
        self.current = StepId::User;
        StepResult::Menu {
            step_id: StepId::User,
            options: MENU_OPTIONS.to_vec(),
        }
    }

    pub async fn step_search_instrument(
        &mut self,
        input: Option<Map<String, Value>>,
    ) -> StepResult<SensorConfig> {
        self.current = StepId::SearchInstrument;
        let schema = search_schema();
        let Some(input) = input else {
            return StepResult::form(StepId::SearchInstrument, schema, FormErrors::new());
        };
        let values = match schema.validate(&input) {
            Ok(values) => values,
            Err(errors) => return StepResult::form(StepId::SearchInstrument, schema, errors),
        };

        let term = values
            .get(CONF_SEARCH)
            .and_then(Value::as_str)
            .unwrap_or_default();
        let instrument_type = InstrumentType::from_key_or_all(
            values
                .get(CONF_INSTRUMENT_TYPE)
                .and_then(Value::as_str)
                .unwrap_or_default(),
        );

        match self.provider.search(term, instrument_type).await {
            Ok(hits) if hits.is_empty() => {
                StepResult::base_error(StepId::SearchInstrument, schema, ERROR_NO_RESULTS)
            }
            Ok(hits) => {
                debug!(count = hits.len(), "Search returned instruments");
                self.search_results = hits;
                self.step_select_instrument(None).await
            }
            Err(e) if is_connection_error(&e) => {
                warn!(error = %e, "Failed to connect to Avanza");
                StepResult::base_error(StepId::SearchInstrument, schema, ERROR_CANNOT_CONNECT)
            }
            Err(e) => {
                error!(error = %e, "Unexpected error occurred");
                StepResult::base_error(StepId::SearchInstrument, schema, ERROR_UNKNOWN)
            }
        }
    }

    pub async fn step_select_instrument(
        &mut self,
        input: Option<Map<String, Value>>,
    ) -> StepResult<SensorConfig> {
        self.current = StepId::SelectInstrument;
        if let Some(input) = input {
            let selected_id = input.get(CONF_ID).map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
            let selected = self
                .search_results
                .iter()
                .find(|hit| Some(&hit.id) == selected_id.as_ref())
                .cloned();
            if let Some(hit) = selected {
                self.instrument = Some(SelectedInstrument {
                    id: hit.id,
                    name: Some(hit.name),
                });
                return self.step_configure(None).await;
            }
            debug!(selected = ?selected_id, "Selection is not among the search results");
        }

        StepResult::form(
            StepId::SelectInstrument,
            select_schema(&self.search_results),
            FormErrors::new(),
        )
    }

    pub async fn step_manual_entry(
        &mut self,
        input: Option<Map<String, Value>>,
    ) -> StepResult<SensorConfig> {
        self.current = StepId::ManualEntry;
        let schema = manual_entry_schema();
        let Some(input) = input else {
            return StepResult::form(StepId::ManualEntry, schema, FormErrors::new());
        };
        let values = match schema.validate(&input) {
            Ok(values) => values,
            Err(errors) => return StepResult::form(StepId::ManualEntry, schema, errors),
        };
        let Some(id) = string_value(&values, CONF_ID) else {
            return StepResult::base_error(StepId::ManualEntry, schema, ERROR_INVALID_STOCK_ID);
        };

        match self.provider.get_stock_info(&id).await {
            Ok(info) => {
                let name = string_value(&values, CONF_NAME).unwrap_or(info.name);
                self.instrument = Some(SelectedInstrument {
                    id,
                    name: Some(name),
                });
                self.step_configure(None).await
            }
            Err(e) if is_connection_error(&e) => {
                warn!(error = %e, "Failed to connect to Avanza");
                StepResult::base_error(StepId::ManualEntry, schema, ERROR_CANNOT_CONNECT)
            }
            Err(e) => {
                debug!(error = %e, id = %id, "Instrument lookup failed");
                StepResult::base_error(StepId::ManualEntry, schema, ERROR_INVALID_STOCK_ID)
            }
        }
    }

    pub async fn step_configure(
        &mut self,
        input: Option<Map<String, Value>>,
    ) -> StepResult<SensorConfig> {
        self.current = StepId::Configure;
        let Some(instrument) = self.instrument.clone() else {
            error!("Configure step reached without a selected instrument");
            return StepResult::abort(ERROR_UNKNOWN);
        };
        let schema = configure_schema(instrument.name.as_deref());
        let Some(input) = input else {
            return StepResult::form(StepId::Configure, schema, FormErrors::new());
        };
        let mut values = match schema.validate(&input) {
            Ok(values) => values,
            Err(errors) => return StepResult::form(StepId::Configure, schema, errors),
        };

        if self.configured_ids.contains(&instrument.id) {
            return StepResult::abort(ABORT_ALREADY_CONFIGURED);
        }

        let info = match self.provider.get_stock_info(&instrument.id).await {
            Ok(info) => info,
            Err(e) if is_connection_error(&e) => {
                error!(error = %e, "Failed to connect to Avanza");
                return StepResult::base_error(StepId::Configure, schema, ERROR_CANNOT_CONNECT);
            }
            Err(e) => {
                error!(error = %e, "Unexpected error occurred");
                return StepResult::base_error(StepId::Configure, schema, ERROR_UNKNOWN);
            }
        };

        let title = string_value(&values, CONF_NAME)
            .unwrap_or_else(|| format!("{DEFAULT_NAME} {}", instrument.id));
        values.insert(CONF_NAME.to_string(), json!(title));
        values.insert(CONF_ID.to_string(), json!(instrument.id));
        normalize_currency(&mut values);

        let mut data: SensorConfig = match serde_json::from_value(Value::Object(values)) {
            Ok(data) => data,
            Err(e) => {
                error!(error = %e, "Failed to build sensor configuration");
                return StepResult::base_error(StepId::Configure, schema, ERROR_UNKNOWN);
            }
        };
        apply_display_currency(&mut data, &info.currency);

        info!(id = %data.id, title = %title, "Creating entry");
        StepResult::CreateEntry { title, data }
    }

    /// Creates an entry from a migrated legacy record without showing forms.
    pub async fn step_import(&mut self, mut record: SensorConfig) -> StepResult<SensorConfig> {
        self.current = StepId::Import;
        if self.configured_ids.contains(&record.id) {
            debug!(id = %record.id, "Legacy instrument already configured");
            return StepResult::abort(ABORT_ALREADY_CONFIGURED);
        }

        record.currency = record
            .currency
            .map(|code| code.trim().to_uppercase())
            .filter(|code| !code.is_empty());
        if record.conversion_currency.is_none() && record.currency.is_some() {
            match self.provider.get_stock_info(&record.id).await {
                Ok(info) => apply_display_currency(&mut record, &info.currency),
                Err(e) => {
                    warn!(error = %e, id = %record.id, "Could not look up instrument currency")
                }
            }
        }

        let title = if record.name.trim().is_empty() {
            format!("{DEFAULT_NAME} {}", record.id)
        } else {
            record.name.clone()
        };
        record.name = title.clone();
        if record.monitored_conditions.is_empty() {
            record.monitored_conditions = default_monitored_conditions();
        }

        info!(id = %record.id, title = %title, "Importing legacy entry");
        StepResult::CreateEntry {
            title,
            data: record,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instrument::StockInfo;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behaviour {
        Normal,
        Offline,
        Broken,
    }

    struct MockProvider {
        behaviour: Behaviour,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(behaviour: Behaviour) -> Self {
            MockProvider {
                behaviour,
                calls: AtomicUsize::new(0),
            }
        }
    }

    async fn connection_error() -> anyhow::Error {
        // Nothing listens on port 9 locally.
        reqwest::get("http://127.0.0.1:9/").await.unwrap_err().into()
    }

    #[async_trait]
    impl InstrumentProvider for MockProvider {
        async fn search(&self, term: &str, _: InstrumentType) -> Result<Vec<SearchHit>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Offline => Err(connection_error().await),
                Behaviour::Broken => Err(anyhow!("Unexpected payload")),
                Behaviour::Normal if term == "apple" => Ok(vec![SearchHit {
                    id: "238449".to_string(),
                    name: "Apple Inc".to_string(),
                    currency: "USD".to_string(),
                }]),
                Behaviour::Normal => Ok(vec![]),
            }
        }

        async fn get_stock_info(&self, id: &str) -> Result<StockInfo> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Offline => Err(connection_error().await),
                Behaviour::Broken => Err(anyhow!("Unexpected payload")),
                Behaviour::Normal => match id {
                    "238449" => Ok(serde_json::from_value(json!({
                        "id": "238449", "name": "Apple Inc", "currency": "USD", "lastPrice": 200.0
                    }))?),
                    "5361" => Ok(serde_json::from_value(json!({
                        "id": "5361", "name": "Avanza Bank Holding", "currency": "SEK",
                        "lastPrice": 250.0
                    }))?),
                    _ => Err(anyhow!("HTTP status client error (404 Not Found)")),
                },
            }
        }
    }

    fn input(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn base_error<T>(result: &StepResult<T>) -> Option<&str> {
        match result {
            StepResult::Form { errors, .. } => errors.get("base").map(String::as_str),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_user_step_shows_menu() {
        let provider = MockProvider::new(Behaviour::Normal);
        let mut flow = ConfigFlow::new(&provider);
        let result = flow.step(StepId::User, None).await;
        assert_eq!(
            result,
            StepResult::Menu {
                step_id: StepId::User,
                options: vec![StepId::SearchInstrument, StepId::ManualEntry],
            }
        );
    }

    #[tokio::test]
    async fn test_search_select_configure_creates_entry() {
        let provider = MockProvider::new(Behaviour::Normal);
        let mut flow = ConfigFlow::new(&provider);
        flow.step_user();

        let result = flow.choose(StepId::SearchInstrument).await;
        assert_eq!(result.step_id(), Some(StepId::SearchInstrument));

        let result = flow
            .submit(input(json!({"search": "apple", "instrument_type": "stock"})))
            .await;
        match &result {
            StepResult::Form {
                step_id, schema, ..
            } => {
                assert_eq!(*step_id, StepId::SelectInstrument);
                let field = schema.field(CONF_ID).unwrap();
                assert_eq!(
                    field.kind,
                    FieldKind::Select {
                        options: vec![("238449".to_string(), "Apple Inc (USD)".to_string())]
                    }
                );
            }
            other => panic!("Unexpected step result: {other:?}"),
        }

        let result = flow.submit(input(json!({"id": "238449"}))).await;
        match &result {
            StepResult::Form {
                step_id, schema, ..
            } => {
                assert_eq!(*step_id, StepId::Configure);
                assert_eq!(
                    schema.field(CONF_NAME).unwrap().default,
                    Some(json!("Apple Inc"))
                );
            }
            other => panic!("Unexpected step result: {other:?}"),
        }

        let result = flow
            .submit(input(json!({"shares": "10", "purchase_price": 150, "currency": "SEK"})))
            .await;
        match result {
            StepResult::CreateEntry { title, data } => {
                assert_eq!(title, "Apple Inc");
                assert_eq!(data.name, "Apple Inc");
                assert_eq!(data.id, "238449");
                assert_eq!(data.shares, 10.0);
                assert_eq!(data.purchase_price, 150.0);
                assert_eq!(data.currency.as_deref(), Some("SEK"));
                // USD holding shown in SEK resolves to the USD/SEK instrument.
                assert_eq!(data.conversion_currency, Some(19000));
                assert!(!data.invert_conversion_currency);
                assert_eq!(data.monitored_conditions, default_monitored_conditions());
            }
            other => panic!("Unexpected step result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_search_without_results() {
        let provider = MockProvider::new(Behaviour::Normal);
        let mut flow = ConfigFlow::new(&provider);
        let result = flow
            .step_search_instrument(Some(input(json!({"search": "nothing"}))))
            .await;
        assert_eq!(base_error(&result), Some(ERROR_NO_RESULTS));
        assert_eq!(flow.current_step(), StepId::SearchInstrument);
    }

    #[tokio::test]
    async fn test_search_errors_are_classified() {
        let provider = MockProvider::new(Behaviour::Offline);
        let mut flow = ConfigFlow::new(&provider);
        let result = flow
            .step_search_instrument(Some(input(json!({"search": "apple"}))))
            .await;
        assert_eq!(base_error(&result), Some(ERROR_CANNOT_CONNECT));

        let provider = MockProvider::new(Behaviour::Broken);
        let mut flow = ConfigFlow::new(&provider);
        let result = flow
            .step_search_instrument(Some(input(json!({"search": "apple"}))))
            .await;
        assert_eq!(base_error(&result), Some(ERROR_UNKNOWN));
    }

    #[tokio::test]
    async fn test_search_form_validation() {
        let provider = MockProvider::new(Behaviour::Normal);
        let mut flow = ConfigFlow::new(&provider);
        let result = flow
            .step_search_instrument(Some(input(json!({"instrument_type": "crypto"}))))
            .await;
        match result {
            StepResult::Form { errors, .. } => {
                assert_eq!(errors["search"], "required");
                assert_eq!(errors["instrument_type"], "invalid_option");
            }
            other => panic!("Unexpected step result: {other:?}"),
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_selection_shows_form_again() {
        let provider = MockProvider::new(Behaviour::Normal);
        let mut flow = ConfigFlow::new(&provider);
        flow.step_search_instrument(Some(input(json!({"search": "apple"}))))
            .await;
        let result = flow.submit(input(json!({"id": "1"}))).await;
        assert_eq!(result.step_id(), Some(StepId::SelectInstrument));
        assert_eq!(flow.search_results().len(), 1);
    }

    #[tokio::test]
    async fn test_manual_entry_fills_name_from_instrument() {
        let provider = MockProvider::new(Behaviour::Normal);
        let mut flow = ConfigFlow::new(&provider);
        flow.step_user();
        flow.choose(StepId::ManualEntry).await;

        let result = flow.submit(input(json!({"id": "5361"}))).await;
        assert_eq!(result.step_id(), Some(StepId::Configure));

        let result = flow.submit(Map::new()).await;
        match result {
            StepResult::CreateEntry { title, data } => {
                assert_eq!(title, "Avanza Bank Holding");
                assert_eq!(data.shares, 0.0);
                assert_eq!(data.purchase_date, "");
                assert_eq!(data.conversion_currency, None);
                assert!(!data.show_trending_icon);
            }
            other => panic!("Unexpected step result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_manual_entry_with_explicit_conversion() {
        let provider = MockProvider::new(Behaviour::Normal);
        let mut flow = ConfigFlow::new(&provider);
        flow.step_manual_entry(Some(input(json!({"id": "5361", "name": "Bank"}))))
            .await;
        let result = flow
            .submit(input(json!({
                "currency": "EUR",
                "conversion_currency": "18998",
                "invert_conversion_currency": "true",
                "monitored_conditions": ["name", "lastPrice"]
            })))
            .await;
        match result {
            StepResult::CreateEntry { title, data } => {
                assert_eq!(title, "Bank");
                assert_eq!(data.conversion_currency, Some(18998));
                assert!(data.invert_conversion_currency);
                assert_eq!(data.monitored_conditions, vec!["name", "lastPrice"]);
            }
            other => panic!("Unexpected step result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_configure_normalizes_currency() {
        let provider = MockProvider::new(Behaviour::Normal);
        let mut flow = ConfigFlow::new(&provider);
        flow.step_manual_entry(Some(input(json!({"id": "238449"}))))
            .await;
        match flow.submit(input(json!({"currency": " sek "}))).await {
            StepResult::CreateEntry { data, .. } => {
                assert_eq!(data.currency.as_deref(), Some("SEK"));
                assert_eq!(data.conversion_currency, Some(19000));
            }
            other => panic!("Unexpected step result: {other:?}"),
        }

        let mut flow = ConfigFlow::new(&provider);
        flow.step_manual_entry(Some(input(json!({"id": "238449"}))))
            .await;
        match flow.submit(input(json!({"currency": ""}))).await {
            StepResult::CreateEntry { data, .. } => {
                assert_eq!(data.currency, None);
                assert_eq!(data.conversion_currency, None);
            }
            other => panic!("Unexpected step result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_manual_entry_invalid_id() {
        let provider = MockProvider::new(Behaviour::Normal);
        let mut flow = ConfigFlow::new(&provider);
        let result = flow
            .step_manual_entry(Some(input(json!({"id": "999"}))))
            .await;
        assert_eq!(base_error(&result), Some(ERROR_INVALID_STOCK_ID));

        let provider = MockProvider::new(Behaviour::Offline);
        let mut flow = ConfigFlow::new(&provider);
        let result = flow
            .step_manual_entry(Some(input(json!({"id": "5361"}))))
            .await;
        assert_eq!(base_error(&result), Some(ERROR_CANNOT_CONNECT));
    }

    #[tokio::test]
    async fn test_configure_aborts_when_already_configured() {
        let provider = MockProvider::new(Behaviour::Normal);
        let mut flow = ConfigFlow::new(&provider).with_configured_ids(["5361".to_string()]);
        flow.step_manual_entry(Some(input(json!({"id": "5361"}))))
            .await;
        let result = flow.submit(Map::new()).await;
        assert_eq!(result, StepResult::abort(ABORT_ALREADY_CONFIGURED));
    }

    #[tokio::test]
    async fn test_configure_without_instrument_aborts() {
        let provider = MockProvider::new(Behaviour::Normal);
        let mut flow = ConfigFlow::new(&provider);
        let result = flow.step_configure(None).await;
        assert_eq!(result, StepResult::abort(ERROR_UNKNOWN));
    }

    #[tokio::test]
    async fn test_menu_rejects_other_steps() {
        let provider = MockProvider::new(Behaviour::Normal);
        let mut flow = ConfigFlow::new(&provider);
        flow.step_user();
        let result = flow.choose(StepId::Configure).await;
        assert_eq!(result.step_id(), Some(StepId::User));
    }

    #[tokio::test]
    async fn test_import_creates_entry() {
        let provider = MockProvider::new(Behaviour::Normal);
        let mut flow = ConfigFlow::new(&provider);
        let mut record = SensorConfig::new("238449", "");
        record.shares = 3.0;
        record.currency = Some("sek".to_string());
        record.monitored_conditions = vec![];

        match flow.step_import(record).await {
            StepResult::CreateEntry { title, data } => {
                assert_eq!(title, "Avanza Stock GUI 238449");
                assert_eq!(data.name, title);
                assert_eq!(data.currency.as_deref(), Some("SEK"));
                assert_eq!(data.conversion_currency, Some(19000));
                assert_eq!(data.monitored_conditions, default_monitored_conditions());
            }
            other => panic!("Unexpected step result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_import_aborts_on_duplicate() {
        let provider = MockProvider::new(Behaviour::Normal);
        let mut flow = ConfigFlow::new(&provider).with_configured_ids(["5361".to_string()]);
        let result = flow.step_import(SensorConfig::new("5361", "Bank")).await;
        assert_eq!(result, StepResult::abort(ABORT_ALREADY_CONFIGURED));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
