//! Data models, generation and classification.
//!
//! ## Submodules
//!
//! - [`reading`]: [`Reading`], [`Metric`] and the four-field [`Metrics`] vector
//! - [`generator`]: mean-reverting synthetic [`Generator`] with demo [`Overrides`]
//! - [`store`]: capacity-bounded [`Store`] and the lock-guarded [`SharedStore`]
//! - [`status`]: per-metric bands, overall badge and the CO₂ alert
//! - [`stats`]: window aggregates fed to insights and exports
//! - [`session`]: [`Session`], the single writer that ties the pieces together
//!
//! ## Data Flow
//!
//! ```text
//! tick ──▶ Session::tick()
//!            │
//!            ├──▶ Generator::next_reading()   (last_reading, overrides)
//!            │
//!            ├──▶ FaultInjection              (maybe skip)
//!            │
//!            └──▶ SharedStore::append()       (append + evict under lock)
//!
//! render ──▶ SharedStore::read() ──▶ latest() / window() ──▶ Assessment::of()
//! ```

pub mod generator;
pub mod reading;
pub mod session;
pub mod stats;
pub mod status;
pub mod store;

pub use generator::{Generator, MetricModel, Overrides};
pub use reading::{Metric, Metrics, Reading, DEFAULT_ROOMS};
pub use session::{FaultInjection, Session, TickOutcome};
pub use stats::{MetricStats, WindowStats};
pub use status::{classify, overall, Assessment, Co2Alert, Status};
pub use store::{Liveness, SharedStore, Store, Window, WindowPoint};
