//! Stock price lookup tool
//!
//! Fetches the latest trade price for a ticker symbol from a public chart
//! endpoint, retrying with linearly increasing backoff. Successful lookups
//! land in a bounded per-symbol LRU cache so repeated calls for the same
//! ticker skip the network round trip.

use crate::tools::registry::Tool;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

/// Public quote source queried by ticker.
pub const DEFAULT_QUOTE_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Attempts made by the tool-facing lookup.
pub const DEFAULT_RETRY: u32 = 3;

/// Backoff unit in seconds; attempt `n` sleeps `backoff * n` before the next try.
pub const DEFAULT_BACKOFF_SECS: f64 = 1.0;

// Cached prices per symbol.
const PRICE_CACHE_CAPACITY: usize = 128;

/// Quote client with a process-wide price cache.
///
/// The cache is not coordinated across concurrent misses: two simultaneous
/// lookups for the same symbol may both hit the network.
pub struct QuoteClient {
    http: reqwest::Client,
    base_url: String,
    cache: Mutex<LruCache<String, f64>>,
}

impl QuoteClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_QUOTE_BASE_URL)
    }

    /// Point the client at a different quote source (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(PRICE_CACHE_CAPACITY).unwrap(),
            )),
        }
    }

    /// One fetch of `chart.result[0].meta.regularMarketPrice`, no retries.
    async fn fetch_price(&self, symbol: &str) -> Result<f64> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Tool(format!("quote request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Tool(format!(
                "quote source returned {} for {}",
                response.status(),
                symbol
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Tool(format!("malformed quote response: {}", e)))?;

        body["chart"]["result"][0]["meta"]["regularMarketPrice"]
            .as_f64()
            .ok_or_else(|| AppError::Tool(format!("no price in quote response for {}", symbol)))
    }

    /// Look up `symbol` and render a human-readable price line.
    ///
    /// The symbol is uppercased before lookup. Cached prices are returned
    /// without touching the network. Otherwise the fetch is attempted up to
    /// `retry` times, sleeping `backoff_secs * attempt` seconds between
    /// consecutive attempts; the final error carries the last failure.
    pub async fn price_line(
        &self,
        symbol: &str,
        currency: &str,
        retry: u32,
        backoff_secs: f64,
    ) -> Result<String> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(AppError::InvalidInput(
                "ticker symbol must be non-empty".to_string(),
            ));
        }
        let currency = currency.trim().to_uppercase();

        {
            let mut cache = self.cache.lock();
            if let Some(&price) = cache.get(&symbol) {
                return Ok(format_price_line(&symbol, price, &currency));
            }
        }

        let mut last_err: Option<AppError> = None;
        for attempt in 1..=retry {
            match self.fetch_price(&symbol).await {
                Ok(price) => {
                    self.cache.lock().put(symbol.clone(), price);
                    return Ok(format_price_line(&symbol, price, &currency));
                }
                Err(e) => {
                    tracing::warn!(symbol = %symbol, attempt, error = %e, "quote fetch failed");
                    last_err = Some(e);
                    if attempt < retry {
                        tokio::time::sleep(Duration::from_secs_f64(
                            backoff_secs * attempt as f64,
                        ))
                        .await;
                    }
                }
            }
        }

        let last = last_err
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts were made".to_string());
        Err(AppError::Tool(format!(
            "no price for {} after {} attempts: {}",
            symbol, retry, last
        )))
    }
}

impl Default for QuoteClient {
    fn default() -> Self {
        Self::new()
    }
}

fn format_price_line(symbol: &str, price: f64, currency: &str) -> String {
    format!("The current price of {} is {:.2} {}.", symbol, price, currency)
}

/// `get_stock_price` exposed to agents.
pub struct StockPriceTool {
    client: Arc<QuoteClient>,
}

impl StockPriceTool {
    pub fn new() -> Self {
        Self {
            client: Arc::new(QuoteClient::new()),
        }
    }

    pub fn with_client(client: Arc<QuoteClient>) -> Self {
        Self { client }
    }
}

impl Default for StockPriceTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for StockPriceTool {
    fn name(&self) -> &str {
        "get_stock_price"
    }

    fn description(&self) -> &str {
        "Fetch the latest trade price for a stock ticker symbol"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "Ticker symbol, e.g. AAPL"
                },
                "currency": {
                    "type": "string",
                    "description": "Display currency code (default: USD)",
                    "default": "USD"
                }
            },
            "required": ["symbol"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let symbol = args
            .get("symbol")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::InvalidInput("Missing 'symbol' parameter".to_string()))?;

        let currency = args
            .get("currency")
            .and_then(|v| v.as_str())
            .unwrap_or("USD");

        let line = self
            .client
            .price_line(symbol, currency, DEFAULT_RETRY, DEFAULT_BACKOFF_SECS)
            .await?;

        Ok(json!({ "result": line }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_line_format() {
        let line = format_price_line("AAPL", 189.837, "USD");
        assert_eq!(line, "The current price of AAPL is 189.84 USD.");
    }

    #[test]
    fn test_tool_definition() {
        let tool = StockPriceTool::new();
        assert_eq!(tool.name(), "get_stock_price");
        assert!(!tool.description().is_empty());

        let schema = tool.parameters_schema();
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"]["symbol"].is_object());
        assert!(schema["required"]
            .as_array()
            .unwrap()
            .contains(&json!("symbol")));
    }

    #[tokio::test]
    async fn test_empty_symbol_rejected() {
        let client = QuoteClient::new();
        let result = client.price_line("   ", "USD", 1, 0.0).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_missing_symbol_parameter() {
        let tool = StockPriceTool::new();
        let result = tool.execute(json!({})).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_zero_retries_never_fetches() {
        // retry = 0 means no attempts at all; the consolidated error still reports it.
        let client = QuoteClient::with_base_url("http://127.0.0.1:9");
        let err = client.price_line("msft", "usd", 0, 0.0).await.unwrap_err();
        assert!(err.to_string().contains("after 0 attempts"));
    }
}
