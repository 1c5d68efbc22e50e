//! # chatlens-core
//!
//! Core library for chatlens - an aggregation engine over processed group chat
//! archives.
//!
//! This library provides:
//! - Record types and NDJSON loading into an in-memory store
//! - Dashboard views (summary, trends, heatmap, rankings, payments, histograms)
//! - A per-generation result cache
//! - The selection manager that swaps stores atomically
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through three layers:
//! - **Files:** processed NDJSON archives in the data directory (read only)
//! - **Store:** normalized [`MessageRecord`]s of the active selection
//! - **Views:** fixed-shape results computed from the store and cached until
//!   the next selection
//!
//! ## Example
//!
//! ```rust,no_run
//! use chatlens_core::{Config, SelectionManager, ViewKey};
//!
//! let config = Config::load().expect("failed to load config");
//! let manager = SelectionManager::from_config(&config);
//!
//! manager.select(&["2024-05.ndjson"]).expect("failed to select files");
//! let daily = manager.view(&ViewKey::DailyTrend);
//! println!("{}", serde_json::to_string_pretty(&*daily).unwrap());
//! ```

// Re-export commonly used items at the crate root
pub use analytics::{AggregateResult, Report, ViewKey};
pub use cache::AggregateCache;
pub use config::{AnalyticsConfig, Config};
pub use error::{Error, Result};
pub use selection::{SelectionManager, SelectionState, Snapshot};
pub use store::{FileLoadStats, LoadReport, RecordStore};
pub use types::*;

// Public modules
pub mod analytics;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod selection;
pub mod store;
pub mod types;
