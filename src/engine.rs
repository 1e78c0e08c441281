/// The prediction engine — owns every per-pool tracker and clock,
/// consumes pool readings from the sampling driver, and answers
/// affordability queries on demand.
///
/// All state lives in a single RegenEngine owned by one task. No locking
/// is needed because nothing else can reach it. Prediction reads are pure
/// except for one deliberate side effect: a read that arrives with a
/// fresher pool value than the last sampling pass may arm the suppression
/// window itself, so a spend is never invisible for a whole sample
/// interval. That re-arm is idempotent.
use crate::clock::{SteadyClock, TickClock};
use crate::config::EngineConfig;
use crate::estimator::PoolTracker;
use crate::predict::{self, PredictContext};
use crate::resource::{RegenModel, ResourceKind, TICK_DEFAULTS};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Host-side queries
// ---------------------------------------------------------------------------

/// The host's pool and cost query. In a live HUD this fronts the game
/// client API; in tests and the demo it fronts a scripted timeline.
///
/// Every method may return None: abilities can be unknown or free, pools
/// can be unreadable during loading screens. Missing data always degrades
/// to "no countdown", never to an error.
pub trait PoolProvider {
    fn cost(&self, ability_id: u32) -> Option<(u32, ResourceKind)>;
    fn current(&self, kind: ResourceKind) -> Option<u32>;
    fn maximum(&self, kind: ResourceKind) -> Option<u32>;
}

// ---------------------------------------------------------------------------
// RegenEngine
// ---------------------------------------------------------------------------

struct TrackedPool {
    tracker: PoolTracker,
    clock:   Box<dyn TickClock>,
}

/// Read-only stats for one pool, consumed by snapshot builders.
#[derive(Debug, Clone, Copy)]
pub struct PoolStats {
    pub suppressed:               bool,
    pub suppression_remaining_ms: u64,
    pub ms_since_tick:            Option<u64>,
    pub suppressed_rate:          Option<u32>,
    pub free_rate:                Option<u32>,
}

pub struct RegenEngine {
    config: EngineConfig,
    pools:  HashMap<ResourceKind, TrackedPool>,
}

impl RegenEngine {
    pub fn new(config: EngineConfig) -> Self {
        let mut pools = HashMap::new();
        for kind in ResourceKind::all() {
            // Event-driven pools have no tick structure to track
            let Some(spec) = TICK_DEFAULTS.get(&kind) else { continue };
            pools.insert(
                kind,
                TrackedPool {
                    tracker: PoolTracker::new(&config),
                    clock:   Box::new(SteadyClock::new(spec.period_ms, spec.amount_per_tick)),
                },
            );
        }
        Self { config, pools }
    }

    /// Swap in a sharper tick clock for one resource. The default is a
    /// plain fixed-period clock anchored by observed ticks.
    pub fn set_clock(&mut self, kind: ResourceKind, clock: Box<dyn TickClock>) {
        if let Some(pool) = self.pools.get_mut(&kind) {
            pool.clock = clock;
        }
    }

    /// One sampling pass: read every tracked pool and fold the reading
    /// into its trackers. Runs even when pools sit at max, which is what
    /// keeps the tick clocks current through idle stretches.
    pub fn sample<P: PoolProvider>(&mut self, now_ms: u64, view: &P) {
        for (kind, pool) in self.pools.iter_mut() {
            let (Some(current), Some(max)) = (view.current(*kind), view.maximum(*kind)) else {
                continue;
            };
            pool.tracker
                .observe(now_ms, current, max, pool.clock.as_mut(), &self.config);
        }
    }

    /// Milliseconds until `ability_id` is affordable. 0 means castable
    /// now, or that no honest countdown exists; both render as the
    /// absence of a timer.
    pub fn time_until_affordable<P: PoolProvider>(
        &mut self,
        ability_id: u32,
        now_ms: u64,
        view: &P,
    ) -> u64 {
        let Some((cost, kind)) = view.cost(ability_id) else {
            tracing::trace!(ability_id, "unknown or free ability");
            return 0;
        };
        let (current, max) = match (view.current(kind), view.maximum(kind)) {
            (Some(c), Some(m)) => (c, m),
            _ => return 0, // pool unreadable, keep the HUD rendering
        };

        // This read may carry a fresher pool value than the last sampling
        // pass; let it arm the window before anything else so a spend is
        // registered even when the ability queried happens to be payable.
        if let Some(pool) = self.pools.get_mut(&kind) {
            pool.tracker
                .suppression
                .note_reading(now_ms, current, pool.tracker.sample.previous);
        }

        let needed = cost.saturating_sub(current);
        if needed == 0 {
            return 0;
        }

        let model = kind.model();
        if model == RegenModel::EventDriven {
            return predict::event_driven::evaluate(needed);
        }
        let Some(pool) = self.pools.get_mut(&kind) else {
            return 0;
        };

        let ctx = PredictContext {
            now_ms,
            max_pool:        max,
            suppression:     &pool.tracker.suppression,
            suppressed_rate: pool.tracker.suppressed.best_rate(),
            free_rate:       pool.tracker.free.best_rate(),
            clock:           pool.clock.as_ref(),
            config:          &self.config,
        };
        predict::time_until_affordable(model, needed, &ctx)
    }

    /// Suppression window state for presentation (a regen-tick indicator
    /// wants both the flag and the countdown). Reads the live pool first
    /// so a spend since the last pass is not missed.
    pub fn suppression<P: PoolProvider>(
        &mut self,
        kind: ResourceKind,
        now_ms: u64,
        view: &P,
    ) -> (bool, u64) {
        let Some(pool) = self.pools.get_mut(&kind) else {
            return (false, 0);
        };
        if let Some(current) = view.current(kind) {
            pool.tracker
                .suppression
                .note_reading(now_ms, current, pool.tracker.sample.previous);
        }
        (
            pool.tracker.suppression.is_active(now_ms),
            pool.tracker.suppression.remaining_ms(now_ms),
        )
    }

    /// Hint from the host that one of the player's actions just resolved.
    /// Only a nudge to re-check pools: a free action must not arm the
    /// window, so the pool delta stays the authoritative signal.
    pub fn action_succeeded<P: PoolProvider>(&mut self, now_ms: u64, view: &P) {
        for (kind, pool) in self.pools.iter_mut() {
            if let Some(current) = view.current(*kind) {
                pool.tracker
                    .suppression
                    .note_reading(now_ms, current, pool.tracker.sample.previous);
            }
        }
    }

    /// Drop the learned rates for one pool, e.g. after a regear. The
    /// sticky fallback rate survives so predictions stay available while
    /// fresh ticks are collected.
    pub fn reset_learned(&mut self, kind: ResourceKind) {
        if let Some(pool) = self.pools.get_mut(&kind) {
            pool.tracker.suppressed.reset();
            pool.tracker.free.reset();
            tracing::info!(kind = kind.label(), "learned rates reset");
        }
    }

    pub fn stats(&self, kind: ResourceKind, now_ms: u64) -> Option<PoolStats> {
        let pool = self.pools.get(&kind)?;
        Some(PoolStats {
            suppressed:               pool.tracker.suppression.is_active(now_ms),
            suppression_remaining_ms: pool.tracker.suppression.remaining_ms(now_ms),
            ms_since_tick:            pool.tracker.ms_since_tick(now_ms),
            suppressed_rate:          pool.tracker.suppressed.best_rate(),
            free_rate:                pool.tracker.free.best_rate(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
