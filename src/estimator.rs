/// Observed-rate estimation: turns the stream of periodic pool readings
/// into per-tick regen knowledge.
///
/// The estimator never sees "a tick happened" directly. It sees the pool
/// go up between two samples and has to decide whether that gain was a
/// real regen tick, a windfall (potion, drain refund), or sampling noise,
/// and whether the amount can be trusted (a gain recorded mid-spend is
/// really tick-minus-partial-spend and would corrupt the learned rate).
use crate::clock::TickClock;
use crate::config::EngineConfig;
use crate::state::{SampleState, SuppressionTracker, TickHistory};

// ---------------------------------------------------------------------------
// Gain classification
// ---------------------------------------------------------------------------

/// What a single observed pool increase turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainClass {
    /// Too large relative to the pool to be a tick. Worth a timing
    /// update, never worth recording as a rate.
    Spike,
    /// Too small relative to the pool to be a tick. Ignored outright.
    Noise,
    /// A believable regen tick.
    Tick,
}

pub fn classify(gain: u32, max_pool: u32, config: &EngineConfig) -> GainClass {
    let fraction = gain as f64 / max_pool as f64;
    if fraction < config.noise_fraction {
        GainClass::Noise
    } else if fraction > config.spike_fraction {
        GainClass::Spike
    } else {
        GainClass::Tick
    }
}

// ---------------------------------------------------------------------------
// PoolTracker
// ---------------------------------------------------------------------------

/// Everything the engine tracks for one regenerating pool: the raw sample
/// pair, the suppression window, and one tick history per phase.
#[derive(Debug)]
pub struct PoolTracker {
    pub sample:      SampleState,
    pub suppression: SuppressionTracker,
    /// Gains observed while the suppression window was open.
    pub suppressed:  TickHistory,
    /// Gains observed with the window closed.
    pub free:        TickHistory,
}

impl PoolTracker {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            sample:      SampleState::default(),
            suppression: SuppressionTracker::new(config.suppression_window_ms),
            suppressed:  TickHistory::new(config.history_capacity),
            free:        TickHistory::new(config.history_capacity),
        }
    }

    /// Fold one pool reading into the trackers. Runs once per sampling
    /// pass per pool; `clock` receives a sync hint for every gain that
    /// marks a tick boundary.
    pub fn observe(
        &mut self,
        now_ms: u64,
        current: u32,
        max: u32,
        clock: &mut dyn TickClock,
        config: &EngineConfig,
    ) {
        if !self.sample.primed {
            // First reading of the session seeds the pair; there is no
            // earlier sample to diff against.
            self.sample.prime(current);
            if max > 0 && current >= max {
                self.advance_through_cap(now_ms, clock.period_ms());
            }
            return;
        }

        let previous = self.sample.previous;
        self.suppression.note_reading(now_ms, current, previous);

        if current > previous && max > 0 {
            let gain = current - previous;
            match classify(gain, max, config) {
                GainClass::Noise => {}
                GainClass::Spike => {
                    // A windfall still lands on a tick boundary often
                    // enough to be worth the timing update; the amount is
                    // poison for the learned rate.
                    self.sample.last_tick_ms = Some(now_ms);
                    clock.note_tick(now_ms);
                    tracing::debug!(gain, max, "pool gain too large for a tick, timing only");
                }
                GainClass::Tick => {
                    self.sample.last_tick_ms = Some(now_ms);
                    clock.note_tick(now_ms);
                    if self.sample.was_passive() {
                        let bucket = if self.suppression.is_active(now_ms) {
                            &mut self.suppressed
                        } else {
                            &mut self.free
                        };
                        bucket.record(gain);
                        tracing::trace!(gain, "tick recorded");
                    } else {
                        tracing::trace!(gain, "tick seen mid-spend, timing only");
                    }
                }
            }
        }

        if max > 0 && current >= max {
            self.advance_through_cap(now_ms, clock.period_ms());
        }

        self.sample.shift(current);
    }

    /// While the pool sits at max, ticks keep happening but move nothing,
    /// so the clock position is advanced in whole periods. The first
    /// post-cap prediction then starts from a current phase instead of a
    /// stale one.
    fn advance_through_cap(&mut self, now_ms: u64, period_ms: u64) {
        if period_ms == 0 {
            return;
        }
        match self.sample.last_tick_ms {
            None => self.sample.last_tick_ms = Some(now_ms),
            Some(last) => {
                let behind = now_ms.saturating_sub(last);
                if behind >= period_ms {
                    self.sample.last_tick_ms = Some(last + (behind / period_ms) * period_ms);
                }
            }
        }
    }

    /// Milliseconds since the last confirmed or inferred tick. None until
    /// a tick has ever been placed.
    pub fn ms_since_tick(&self, now_ms: u64) -> Option<u64> {
        self.sample.last_tick_ms.map(|t| now_ms.saturating_sub(t))
    }
}
