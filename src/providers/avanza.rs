use super::util::with_retry;
use crate::core::cache::Cache;
use crate::core::currency::{CurrencyRateProvider, resolve_reference_pair};
use crate::core::instrument::{
    InstrumentProvider, InstrumentType, SearchHit, StockInfo, conversion_rate, id_as_string,
};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

const USER_AGENT: &str = "avanza-stock/0.1";

#[derive(Deserialize, Debug)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<SearchGroup>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SearchGroup {
    #[serde(default)]
    instrument_type: Option<String>,
    #[serde(default)]
    top_hits: Vec<TopHit>,
}

#[derive(Deserialize, Debug)]
struct TopHit {
    #[serde(deserialize_with = "id_as_string")]
    id: String,
    name: String,
    #[serde(default)]
    currency: String,
}

pub struct AvanzaProvider {
    base_url: String,
    cache: Arc<Cache<String, StockInfo>>,
}

impl AvanzaProvider {
    pub fn new(base_url: &str, cache: Arc<Cache<String, StockInfo>>) -> Self {
        AvanzaProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    async fn get(&self, url: reqwest::Url) -> Result<reqwest::Response> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        let response = with_retry(|| async { client.get(url.clone()).send().await }, 2, 300)
            .await
            .with_context(|| format!("Request failed for URL: {url}"))?;
        debug!(status = %response.status(), "Received Avanza response");
        Ok(response.error_for_status()?)
    }
}

#[async_trait]
impl InstrumentProvider for AvanzaProvider {
    #[instrument(name = "AvanzaSearch", skip(self), fields(term = %term, kind = %instrument_type))]
    async fn search(&self, term: &str, instrument_type: InstrumentType) -> Result<Vec<SearchHit>> {
        let url = reqwest::Url::parse_with_params(
            &format!(
                "{}/_mobile/market/search/{}",
                self.base_url,
                instrument_type.label()
            ),
            &[("query", term)],
        )?;
        debug!("Searching instruments at {}", url);

        let response = self.get(url).await?;
        let text = response.text().await?;
        let data: SearchResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse search response for {}: {}", term, e))?;

        let hits: Vec<SearchHit> = data
            .hits
            .into_iter()
            .inspect(|group| {
                debug!(
                    group = group.instrument_type.as_deref().unwrap_or("unknown"),
                    count = group.top_hits.len(),
                    "Search hit group"
                )
            })
            .flat_map(|group| group.top_hits)
            .map(|hit| SearchHit {
                id: hit.id,
                name: hit.name,
                currency: hit.currency,
            })
            .collect();

        debug!(count = hits.len(), "Search finished");
        Ok(hits)
    }

    #[instrument(name = "AvanzaStockInfo", skip(self), fields(id = %id))]
    async fn get_stock_info(&self, id: &str) -> Result<StockInfo> {
        if let Some(cached) = self.cache.get(&id.to_string()).await {
            return Ok(cached);
        }

        let url = reqwest::Url::parse(&format!("{}/_mobile/market/stock/{}", self.base_url, id))?;
        debug!("Requesting stock info from {}", url);

        let response = self.get(url).await?;
        let text = response.text().await?;
        let info: StockInfo = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse stock info for {}: {}", id, e))?;

        self.cache.put(id.to_string(), info.clone()).await;
        Ok(info)
    }
}

#[async_trait]
impl CurrencyRateProvider for AvanzaProvider {
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64> {
        if from == to {
            return Ok(1.0);
        }
        let resolution = resolve_reference_pair(from, to)
            .ok_or_else(|| anyhow!("No conversion instrument for {}/{}", from, to))?;
        conversion_rate(self, &resolution).await
    }
}
