//! Built-in Tools for Agent Capabilities
//!
//! This module provides the tool infrastructure that lets agents act beyond
//! text generation: a [`registry`](crate::tools::registry) for discovery and
//! dispatch, plus the two bundled lookup tools.
//!
//! # Available Tools
//!
//! ## Stock price
//! Fetches the latest trade price for a ticker, with retries and a bounded
//! per-symbol cache:
//! ```ignore
//! let client = QuoteClient::new();
//! let line = client.price_line("aapl", "USD", 3, 1.0).await?;
//! // "The current price of AAPL is 189.84 USD."
//! ```
//!
//! ## Weather
//! Reads the current temperature for a coordinate pair from Open-Meteo:
//! ```ignore
//! let client = WeatherClient::new();
//! let temp = client.current_temperature(40.7128, -74.0060).await?;
//! ```
//!
//! # Tool Registry
//!
//! The [`registry`](crate::tools::registry) module manages tool discovery and
//! execution:
//! ```ignore
//! let registry = ToolRegistry::with_default_tools();
//! let tools = registry.get_tool_definitions();
//! let result = registry.execute("get_weather", json!({"latitude": 52.52, "longitude": 13.41})).await?;
//! ```

/// Tool registry for managing available tools.
pub mod registry;
/// Stock price lookup tool.
pub mod stock;
/// Weather lookup tool.
pub mod weather;

pub use registry::{Tool, ToolRegistry};
pub use stock::{QuoteClient, StockPriceTool};
pub use weather::{WeatherClient, WeatherTool};
