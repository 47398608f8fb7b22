//! # iaq-dashboard
//!
//! A live terminal dashboard and library for simulated indoor air-quality
//! monitoring.
//!
//! Synthetic readings (CO₂, temperature, relative humidity, PM2.5) for a
//! small set of rooms are produced by a mean-reverting random walk, kept in a
//! bounded rolling history, classified into good / warn / bad bands, and
//! summarized into short natural-language insights.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐  │
//! │  │  app    │───▶│  store   │───▶│   ui    │───▶│ Terminal│  │
//! │  │ (state) │    │ (shared) │    │(render) │    │         │  │
//! │  └────┬────┘    └────▲─────┘    └─────────┘    └─────────┘  │
//! │       │              │                                      │
//! │       ▼              │                                      │
//! │  ┌─────────┐    ┌────┴─────┐                                │
//! │  │ source  │───▶│ session  │◀── LocalSource | BackgroundSource
//! │  │ (ticks) │    │(gen+store)                                │
//! │  └─────────┘    └──────────┘                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`data`]**: readings, the generator, the bounded store, status bands,
//!   window statistics and the [`Session`] that ties them together
//! - **[`source`]**: tick drivers behind the [`ReadingSource`] trait
//! - **[`insight`]**: cached summaries from a rule-based or OpenAI backend
//! - **[`app`]**, **[`events`]**, **[`ui`]**: the ratatui dashboard
//! - **[`config`]**, **[`export`]**: TOML/env configuration and JSON export
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Interactive dashboard, one reading per second
//! iaq-dashboard
//!
//! # Headless: log 60 readings, then export them
//! iaq-dashboard --headless --ticks 60 --export iaq.json
//! ```
//!
//! ### As a library
//!
//! ```
//! use iaq_dashboard::{overall, Generator, Overrides, Session, SharedStore, Status};
//!
//! let generator = Generator::with_seed(42, vec!["Lab".to_string()]);
//! let mut session = Session::new(generator, SharedStore::with_capacity(1440));
//!
//! session.set_overrides(Overrides { force_high_co2: true, ..Overrides::default() });
//! let outcome = session.tick();
//!
//! assert_eq!(outcome.reading().metrics.co2, 1200.0);
//! assert_ne!(overall(&outcome.reading().metrics), Status::Good);
//! assert_eq!(session.store().len(), 1);
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod export;
pub mod insight;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::{App, View};
pub use config::DashboardConfig;
pub use data::{
    classify, overall, Assessment, Co2Alert, FaultInjection, Generator, Metric, Metrics,
    Overrides, Reading, Session, SharedStore, Status, Store, TickOutcome, WindowStats,
};
pub use source::{BackgroundSource, LocalSource, ReadingSource};
