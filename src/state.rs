/// Passive regen trackers — mutated by the sampling pass, read by the
/// affordability predictor.
///
/// Everything here is owned by a single engine instance and touched from
/// one task only, so no locking is needed. Timestamps are u64 milliseconds
/// on whatever monotonic clock the caller samples with.
use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// Suppression window
// ---------------------------------------------------------------------------

/// Fixed-length window that opens every time the pool is seen to drop.
/// While it is open, regeneration runs at the reduced post-spend rate, so
/// predictions must split time into inside-window and after-window phases.
///
/// The trigger is any observed decrease. A drain applied by an enemy is
/// indistinguishable from the player's own spend at this layer, and both
/// suppress regen in-game, so the ambiguity is accepted rather than
/// guessed at.
#[derive(Debug)]
pub struct SuppressionTracker {
    last_spend_ms: Option<u64>,
    window_ms:     u64,
}

impl SuppressionTracker {
    pub fn new(window_ms: u64) -> Self {
        Self { last_spend_ms: None, window_ms }
    }

    /// (Re)arm the window at `now_ms`.
    pub fn record_spend(&mut self, now_ms: u64) {
        self.last_spend_ms = Some(now_ms);
    }

    /// Re-arm from a fresh pool reading if it reveals a decrease the
    /// sampling pass has not registered yet. Called from the sampling path
    /// and from prediction reads; repeating it for the same reading is
    /// harmless.
    pub fn note_reading(&mut self, now_ms: u64, current: u32, previous: u32) {
        if current < previous {
            self.record_spend(now_ms);
        }
    }

    pub fn is_active(&self, now_ms: u64) -> bool {
        self.last_spend_ms
            .map(|t| now_ms.saturating_sub(t) < self.window_ms)
            .unwrap_or(false)
    }

    /// Milliseconds until the window closes. 0 when inactive or never armed.
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.last_spend_ms
            .map(|t| self.window_ms.saturating_sub(now_ms.saturating_sub(t)))
            .unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Per-phase tick history
// ---------------------------------------------------------------------------

/// Short rolling history of observed per-tick gains for one pool phase,
/// reduced to the minimum seen.
///
/// The reduction is a minimum, not an average: overestimating the rate
/// makes the HUD call an ability ready before it is, the single worst
/// thing this display can do. Undercounting only makes the countdown
/// finish late.
#[derive(Debug)]
pub struct TickHistory {
    samples:      VecDeque<u32>,
    capacity:     usize,
    conservative: Option<u32>,
    last_good:    Option<u32>,
}

impl TickHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples:      VecDeque::with_capacity(capacity),
            capacity,
            conservative: None,
            last_good:    None,
        }
    }

    /// Record one observed per-tick gain and recompute the minimum.
    pub fn record(&mut self, amount: u32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(amount);
        let min = self.samples.iter().copied().min();
        self.conservative = min;
        self.last_good    = min;
    }

    /// Minimum gain across the current history. None until first record.
    pub fn rate(&self) -> Option<u32> {
        self.conservative
    }

    /// Current rate, or the last non-empty rate this session.
    pub fn best_rate(&self) -> Option<u32> {
        self.conservative.or(self.last_good)
    }

    /// Drop the history. `last_good` survives so predictions stay
    /// available while fresh ticks are collected.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.conservative = None;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Raw sample bookkeeping
// ---------------------------------------------------------------------------

/// The last two pool readings plus the inferred tick clock position.
///
/// `prior` exists to answer "was the pool being spent right before this
/// sample": a gain seen while the previous sample was itself dropping can
/// be (tick minus partial spend), and its amount must not be trusted.
#[derive(Debug, Default)]
pub struct SampleState {
    pub previous: u32,
    pub prior:    u32,
    /// Time the last tick was confirmed or inferred. Advances through
    /// periods spent at full pool so timing is correct the moment the
    /// pool drops below max again.
    pub last_tick_ms: Option<u64>,
    /// False until the first reading has seeded the pair; that reading is
    /// a baseline, not a gain against a phantom zero.
    pub primed: bool,
}

impl SampleState {
    /// Seed both readings from the first sample of the session.
    pub fn prime(&mut self, current: u32) {
        self.previous = current;
        self.prior    = current;
        self.primed   = true;
    }

    /// Shift the reading pair. Runs once per sample, whatever else the
    /// sample was classified as.
    pub fn shift(&mut self, current: u32) {
        self.prior    = self.previous;
        self.previous = current;
    }

    /// True when the pool was not being spent in the sample immediately
    /// before the current one.
    pub fn was_passive(&self) -> bool {
        self.previous >= self.prior
    }
}
