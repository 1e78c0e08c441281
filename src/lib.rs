//! Resource regeneration and affordability prediction for a combat HUD.
//!
//! Answers one question for presentation code: in how many milliseconds
//! will this ability's resource cost have regenerated?
//!
//! Data flow: the sampling driver polls the host's pool query on a fixed
//! cadence and folds each reading into the per-pool trackers (suppression
//! window, per-phase tick histories, tick clock position). Prediction
//! reads run on demand and reduce that state to a single number. Missing
//! knowledge degrades through documented fallbacks (learned rate, sticky
//! last-good rate, rough heuristic, "no countdown"); nothing here can
//! fail in a way that would stop a HUD from rendering.

pub mod clock;
pub mod config;
pub mod engine;
pub mod estimator;
pub mod predict;
pub mod resource;
pub mod sampler;
pub mod state;

pub use clock::{SteadyClock, TickClock};
pub use config::EngineConfig;
pub use engine::{PoolProvider, PoolStats, RegenEngine};
pub use resource::{RegenModel, ResourceKind};
pub use sampler::{EngineGone, EngineHandle, PoolSnapshot, RegenSnapshot, SuppressionReading};
