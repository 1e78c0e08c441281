/// Resource pool taxonomy and the embedded per-resource tick defaults.
///
/// The engine only cares about the regeneration *shape* of a pool:
///
///   Energy refills by a known fixed amount on a fixed period, so the only
///   open question is tick phase. Mana refills periodically too, but the
///   per-tick amount depends on character stats the engine cannot read,
///   and it changes while the post-spend suppression window is open, so
///   both amounts are learned from observation. Rage is generated by
///   combat events with no periodic structure at all.
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Kinds and models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Mana,
    Energy,
    Rage,
}

/// How a pool refills, which selects the prediction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenModel {
    /// Fixed amount on a fixed period; tick phase is the whole question.
    FixedTick,
    /// Periodic, but the per-tick amount is only knowable from observed
    /// gains, with separate amounts inside and outside the suppression
    /// window.
    LearnedPhase,
    /// Event-generated. No periodic structure exists to extrapolate, so
    /// no countdown is ever produced.
    EventDriven,
}

impl ResourceKind {
    pub fn model(self) -> RegenModel {
        match self {
            ResourceKind::Mana   => RegenModel::LearnedPhase,
            ResourceKind::Energy => RegenModel::FixedTick,
            ResourceKind::Rage   => RegenModel::EventDriven,
        }
    }

    pub fn all() -> [ResourceKind; 3] {
        [ResourceKind::Mana, ResourceKind::Energy, ResourceKind::Rage]
    }

    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Mana   => "mana",
            ResourceKind::Energy => "energy",
            ResourceKind::Rage   => "rage",
        }
    }
}

// ---------------------------------------------------------------------------
// Tick defaults
// ---------------------------------------------------------------------------

/// Baseline tick timing for one periodic resource.
#[derive(Debug, Clone, Copy)]
pub struct TickSpec {
    pub period_ms:       u64,
    /// Known per-tick gain. 0 for pools whose amount is learned instead.
    pub amount_per_tick: u32,
}

/// Tick timing per periodic resource. Rage has no entry: it does not tick.
pub static TICK_DEFAULTS: Lazy<HashMap<ResourceKind, TickSpec>> = Lazy::new(|| {
    HashMap::from([
        (ResourceKind::Energy, TickSpec { period_ms: 2_000, amount_per_tick: 20 }),
        (ResourceKind::Mana,   TickSpec { period_ms: 2_000, amount_per_tick: 0 }),
    ])
});
