pub mod event_driven;
pub mod fixed_tick;
pub mod learned;

use crate::clock::TickClock;
use crate::config::EngineConfig;
use crate::resource::RegenModel;
use crate::state::SuppressionTracker;

/// Read-only view handed to every prediction strategy.
pub struct PredictContext<'a> {
    pub now_ms:   u64,
    pub max_pool: u32,
    pub suppression: &'a SuppressionTracker,
    /// Learned per-tick gain while the window is open, via the
    /// conservative-then-last-good fallback chain. None = never observed.
    pub suppressed_rate: Option<u32>,
    /// Learned per-tick gain with the window closed, same chain.
    pub free_rate: Option<u32>,
    pub clock:  &'a dyn TickClock,
    pub config: &'a EngineConfig,
}

/// Milliseconds until `needed` more resource will have regenerated.
///
/// 0 means "affordable now" for the periodic models and "no honest
/// countdown exists" for the event-driven one; callers render both as the
/// absence of a timer. Missing knowledge degrades through documented
/// fallbacks, never into an error: this feeds a live display.
pub fn time_until_affordable(model: RegenModel, needed: u32, ctx: &PredictContext) -> u64 {
    if needed == 0 {
        return 0;
    }
    match model {
        RegenModel::FixedTick    => fixed_tick::evaluate(needed, ctx),
        RegenModel::LearnedPhase => learned::evaluate(needed, ctx),
        RegenModel::EventDriven  => event_driven::evaluate(needed),
    }
}

// ---------------------------------------------------------------------------
// Shared arithmetic
// ---------------------------------------------------------------------------

/// Ticks needed to cover `needed` at `rate` per tick, rounded up with the
/// safety margin folded into the need first. Rounding up on the padded
/// amount keeps every prediction on the late side of reality.
pub(crate) fn ticks_at_rate(needed: u32, rate: u32, margin: f64) -> u64 {
    let rate = rate.max(1) as f64;
    ((needed as f64 + margin * rate) / rate).ceil() as u64
}
