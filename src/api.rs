//! JSON message API used by frontends to search for instruments.
//!
//! Requests look like
//! `{"id": 1, "type": "avanza_stock/search", "search_term": "volvo"}` and
//! every request gets exactly one `result` message back.

use crate::core::entry::DOMAIN;
use crate::core::instrument::{InstrumentProvider, InstrumentType, SearchHit};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

pub const ERROR_SEARCH_FAILED: &str = "search_failed";
pub const ERROR_INVALID_FORMAT: &str = "invalid_format";
pub const ERROR_UNKNOWN_COMMAND: &str = "unknown_command";

pub fn search_command() -> String {
    format!("{DOMAIN}/search")
}

fn default_instrument_type() -> String {
    InstrumentType::All.key().to_string()
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    search_term: String,
    #[serde(default = "default_instrument_type")]
    instrument_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: Option<u64>,
    #[serde(rename = "type")]
    pub kind: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<SearchHit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    fn result(id: u64, hits: Vec<SearchHit>) -> Self {
        Response {
            id: Some(id),
            kind: "result".to_string(),
            success: true,
            result: Some(hits),
            error: None,
        }
    }

    fn error(id: Option<u64>, code: &str, message: impl Into<String>) -> Self {
        Response {
            id,
            kind: "result".to_string(),
            success: false,
            result: None,
            error: Some(ErrorBody {
                code: code.to_string(),
                message: message.into(),
            }),
        }
    }
}

/// Handles one request message.
pub async fn handle_message(provider: &(dyn InstrumentProvider + Send + Sync), text: &str) -> Response {
    let message: Value = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "Message is not valid JSON");
            return Response::error(None, ERROR_INVALID_FORMAT, "Message incorrectly formatted.");
        }
    };

    let Some(id) = message.get("id").and_then(Value::as_u64) else {
        return Response::error(None, ERROR_INVALID_FORMAT, "Message is missing an id.");
    };
    let Some(kind) = message.get("type").and_then(Value::as_str) else {
        return Response::error(Some(id), ERROR_INVALID_FORMAT, "Message is missing a type.");
    };
    if kind != search_command() {
        debug!(id, kind, "Unknown command");
        return Response::error(Some(id), ERROR_UNKNOWN_COMMAND, "Unknown command.");
    }

    let request: SearchRequest = match serde_json::from_value(message.clone()) {
        Ok(request) => request,
        Err(e) => {
            return Response::error(
                Some(id),
                ERROR_INVALID_FORMAT,
                format!("Message incorrectly formatted: {e}"),
            );
        }
    };

    let instrument_type = InstrumentType::from_key_or_all(&request.instrument_type);
    debug!(id, term = %request.search_term, kind = %instrument_type, "Searching instruments");
    match provider.search(&request.search_term, instrument_type).await {
        Ok(hits) => Response::result(id, hits),
        Err(e) => {
            error!(error = %e, "Error searching instruments");
            Response::error(
                Some(id),
                ERROR_SEARCH_FAILED,
                "Failed to search for instruments",
            )
        }
    }
}

/// Handles one request line and serializes the response.
pub async fn handle_line(provider: &(dyn InstrumentProvider + Send + Sync), line: &str) -> String {
    let response = handle_message(provider, line).await;
    // Serializing plain strings and numbers cannot fail.
    serde_json::to_string(&response).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instrument::StockInfo;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingProvider {
        requests: Mutex<Vec<(String, InstrumentType)>>,
    }

    #[async_trait]
    impl InstrumentProvider for RecordingProvider {
        async fn search(&self, term: &str, instrument_type: InstrumentType) -> Result<Vec<SearchHit>> {
            self.requests
                .lock()
                .unwrap()
                .push((term.to_string(), instrument_type));
            if term == "fail" {
                return Err(anyhow!("Search backend unavailable"));
            }
            Ok(vec![SearchHit {
                id: "5247".to_string(),
                name: "Investor B".to_string(),
                currency: "SEK".to_string(),
            }])
        }

        async fn get_stock_info(&self, _: &str) -> Result<StockInfo> {
            Err(anyhow!("not used"))
        }
    }

    async fn send(provider: &RecordingProvider, message: Value) -> Value {
        let line = handle_line(provider, &message.to_string()).await;
        serde_json::from_str(&line).unwrap()
    }

    #[tokio::test]
    async fn test_search_result() {
        let provider = RecordingProvider::default();
        let response = send(
            &provider,
            json!({"id": 7, "type": "avanza_stock/search", "search_term": "investor"}),
        )
        .await;
        assert_eq!(
            response,
            json!({
                "id": 7,
                "type": "result",
                "success": true,
                "result": [{"id": "5247", "name": "Investor B", "currency": "SEK"}]
            })
        );
        assert_eq!(
            provider.requests.lock().unwrap()[0],
            ("investor".to_string(), InstrumentType::All)
        );
    }

    #[tokio::test]
    async fn test_search_with_instrument_type() {
        let provider = RecordingProvider::default();
        send(
            &provider,
            json!({"id": 1, "type": "avanza_stock/search", "search_term": "x", "instrument_type": "fund"}),
        )
        .await;
        send(
            &provider,
            json!({"id": 2, "type": "avanza_stock/search", "search_term": "x", "instrument_type": "crypto"}),
        )
        .await;
        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[0].1, InstrumentType::Fund);
        assert_eq!(requests[1].1, InstrumentType::All);
    }

    #[tokio::test]
    async fn test_search_failure() {
        let provider = RecordingProvider::default();
        let response = send(
            &provider,
            json!({"id": 3, "type": "avanza_stock/search", "search_term": "fail"}),
        )
        .await;
        assert_eq!(
            response,
            json!({
                "id": 3,
                "type": "result",
                "success": false,
                "error": {"code": "search_failed", "message": "Failed to search for instruments"}
            })
        );
    }

    #[tokio::test]
    async fn test_malformed_messages() {
        let provider = RecordingProvider::default();

        let response = handle_message(&provider, "{not json").await;
        assert_eq!(response.id, None);
        assert_eq!(response.error.unwrap().code, ERROR_INVALID_FORMAT);

        let response = handle_message(&provider, r#"{"type": "avanza_stock/search"}"#).await;
        assert_eq!(response.error.unwrap().code, ERROR_INVALID_FORMAT);

        let response = handle_message(&provider, r#"{"id": 4, "type": "avanza_stock/search"}"#).await;
        assert_eq!(response.id, Some(4));
        assert!(!response.success);
        assert_eq!(response.error.unwrap().code, ERROR_INVALID_FORMAT);

        let response = handle_message(
            &provider,
            r#"{"id": 5, "type": "avanza_stock/search", "search_term": 42}"#,
        )
        .await;
        assert_eq!(response.error.unwrap().code, ERROR_INVALID_FORMAT);
        assert!(provider.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let provider = RecordingProvider::default();
        let response = handle_message(&provider, r#"{"id": 6, "type": "avanza_stock/delete"}"#).await;
        assert_eq!(response.id, Some(6));
        assert_eq!(response.error.unwrap().code, ERROR_UNKNOWN_COMMAND);
    }
}
