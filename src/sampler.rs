/// Sampling driver — a task that exclusively owns a RegenEngine, polls
/// the pool query on a fixed cadence, and answers prediction queries sent
/// over a command channel.
///
/// Collaborators hold a cheap `EngineHandle` (Clone + Send) and get
/// replies through oneshot slots, so the engine state itself never needs
/// a lock. After every sampling pass a serializable `RegenSnapshot` is
/// republished on a watch channel for widgets that render continuously.
use crate::engine::{PoolProvider, RegenEngine};
use crate::resource::ResourceKind;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Duration, Instant, MissedTickBehavior};

// ---------------------------------------------------------------------------
// Commands sent to the driver task
// ---------------------------------------------------------------------------

pub enum EngineCommand {
    Predict {
        ability_id: u32,
        reply:      oneshot::Sender<u64>,
    },
    Suppression {
        kind:  ResourceKind,
        reply: oneshot::Sender<SuppressionReading>,
    },
    ActionSucceeded,
    ResetLearned { kind: ResourceKind },
    Shutdown,
}

// ---------------------------------------------------------------------------
// Payload types (serialized for whatever IPC boundary the HUD uses)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SuppressionReading {
    pub active:       bool,
    pub remaining_ms: u64,
}

/// Per-pool block inside RegenSnapshot.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub current: u32,
    pub maximum: u32,
    pub suppressed: bool,
    pub suppression_remaining_ms: u64,
    /// Milliseconds since the last confirmed or inferred regen tick.
    pub ms_since_tick: Option<u64>,
    pub suppressed_rate: Option<u32>,
    pub free_rate: Option<u32>,
}

/// Published after every sampling pass for continuously-rendered widgets
/// (regen-tick spark, suppression bar).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RegenSnapshot {
    pub elapsed_ms: u64,
    pub mana:       PoolSnapshot,
    pub energy:     PoolSnapshot,
}

// ---------------------------------------------------------------------------
// EngineHandle — cheap handle, Clone + Send + Sync
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
#[error("regen engine task has terminated")]
pub struct EngineGone;

#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    /// Milliseconds until the ability is affordable. 0 renders as "no
    /// countdown".
    pub async fn time_until_affordable(&self, ability_id: u32) -> Result<u64, EngineGone> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::Predict { ability_id, reply })
            .await
            .map_err(|_| EngineGone)?;
        rx.await.map_err(|_| EngineGone)
    }

    pub async fn suppression(&self, kind: ResourceKind) -> Result<SuppressionReading, EngineGone> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::Suppression { kind, reply })
            .await
            .map_err(|_| EngineGone)?;
        rx.await.map_err(|_| EngineGone)
    }

    /// Hint that one of the player's actions resolved; nudges the engine
    /// to re-check pools for a spend ahead of the next pass.
    pub async fn action_succeeded(&self) -> Result<(), EngineGone> {
        self.tx
            .send(EngineCommand::ActionSucceeded)
            .await
            .map_err(|_| EngineGone)
    }

    pub async fn reset_learned(&self, kind: ResourceKind) -> Result<(), EngineGone> {
        self.tx
            .send(EngineCommand::ResetLearned { kind })
            .await
            .map_err(|_| EngineGone)
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(EngineCommand::Shutdown).await;
    }
}

// ---------------------------------------------------------------------------
// Driver task
// ---------------------------------------------------------------------------

/// Spawn the driver onto the current runtime. Returns the command handle
/// and the snapshot receiver.
pub fn spawn<P>(engine: RegenEngine, provider: P) -> (EngineHandle, watch::Receiver<RegenSnapshot>)
where
    P: PoolProvider + Send + 'static,
{
    let (tx, rx) = mpsc::channel(64);
    let (snap_tx, snap_rx) = watch::channel(RegenSnapshot::default());
    tokio::spawn(run(engine, provider, rx, snap_tx));
    (EngineHandle { tx }, snap_rx)
}

/// The driver loop. All engine mutation happens here, on one task;
/// command servicing and sampling interleave but never overlap.
pub async fn run<P>(
    mut engine: RegenEngine,
    provider: P,
    mut rx: mpsc::Receiver<EngineCommand>,
    snap_tx: watch::Sender<RegenSnapshot>,
) where
    P: PoolProvider + Send + 'static,
{
    let started  = Instant::now();
    let interval = engine.config().sample_interval_ms.max(1);
    let mut ticker = tokio::time::interval(Duration::from_millis(interval));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(interval_ms = interval, "sampling driver started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now_ms = started.elapsed().as_millis() as u64;
                engine.sample(now_ms, &provider);
                let _ = snap_tx.send(build_snapshot(&engine, &provider, now_ms));
            }

            cmd = rx.recv() => {
                let now_ms = started.elapsed().as_millis() as u64;
                match cmd {
                    Some(EngineCommand::Predict { ability_id, reply }) => {
                        let eta = engine.time_until_affordable(ability_id, now_ms, &provider);
                        let _ = reply.send(eta);
                    }
                    Some(EngineCommand::Suppression { kind, reply }) => {
                        let (active, remaining_ms) = engine.suppression(kind, now_ms, &provider);
                        let _ = reply.send(SuppressionReading { active, remaining_ms });
                    }
                    Some(EngineCommand::ActionSucceeded) => {
                        engine.action_succeeded(now_ms, &provider);
                    }
                    Some(EngineCommand::ResetLearned { kind }) => {
                        engine.reset_learned(kind);
                    }
                    Some(EngineCommand::Shutdown) | None => {
                        tracing::info!("sampling driver stopping");
                        break;
                    }
                }
            }
        }
    }
}

fn build_snapshot<P: PoolProvider>(engine: &RegenEngine, provider: &P, now_ms: u64) -> RegenSnapshot {
    let pool = |kind: ResourceKind| {
        let mut snap = PoolSnapshot {
            current: provider.current(kind).unwrap_or(0),
            maximum: provider.maximum(kind).unwrap_or(0),
            ..PoolSnapshot::default()
        };
        if let Some(stats) = engine.stats(kind, now_ms) {
            snap.suppressed               = stats.suppressed;
            snap.suppression_remaining_ms = stats.suppression_remaining_ms;
            snap.ms_since_tick            = stats.ms_since_tick;
            snap.suppressed_rate          = stats.suppressed_rate;
            snap.free_rate                = stats.free_rate;
        }
        snap
    };

    RegenSnapshot {
        elapsed_ms: now_ms,
        mana:       pool(ResourceKind::Mana),
        energy:     pool(ResourceKind::Energy),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    const BOLT:   u32 = 11; // mana
    const STRIKE: u32 = 12; // energy

    /// Scripted pools: piecewise-constant timelines keyed to virtual time.
    struct ScriptedPools {
        start:  Instant,
        mana:   &'static [(u64, u32)],
        energy: &'static [(u64, u32)],
    }

    impl ScriptedPools {
        fn value(&self, timeline: &[(u64, u32)]) -> u32 {
            let elapsed = self.start.elapsed().as_millis() as u64;
            timeline
                .iter()
                .take_while(|(at, _)| *at <= elapsed)
                .last()
                .map(|(_, v)| *v)
                .unwrap_or(0)
        }
    }

    impl PoolProvider for ScriptedPools {
        fn cost(&self, ability_id: u32) -> Option<(u32, ResourceKind)> {
            match ability_id {
                BOLT   => Some((2_000, ResourceKind::Mana)),
                STRIKE => Some((60, ResourceKind::Energy)),
                _      => None,
            }
        }

        fn current(&self, kind: ResourceKind) -> Option<u32> {
            match kind {
                ResourceKind::Mana   => Some(self.value(self.mana)),
                ResourceKind::Energy => Some(self.value(self.energy)),
                ResourceKind::Rage   => None,
            }
        }

        fn maximum(&self, kind: ResourceKind) -> Option<u32> {
            match kind {
                ResourceKind::Mana   => Some(10_000),
                ResourceKind::Energy => Some(100),
                ResourceKind::Rage   => None,
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn driver_samples_and_answers_predictions() {
        // Energy ramps 20 per 2s from 20; mana sits still
        let provider = ScriptedPools {
            start:  Instant::now(),
            mana:   &[(0, 8_000)],
            energy: &[(0, 20), (2_000, 40), (4_000, 60)],
        };
        let (handle, mut snapshots) =
            spawn(RegenEngine::new(EngineConfig::default()), provider);

        tokio::time::sleep(Duration::from_millis(5_000)).await;

        // Needs 60, has 60 at t=4_000: affordable now
        let eta = handle.time_until_affordable(STRIKE).await.unwrap();
        assert_eq!(eta, 0);

        // Snapshot reflects the sampled pools
        let snap = *snapshots.borrow_and_update();
        assert_eq!(snap.energy.current, 60);
        assert_eq!(snap.mana.current, 8_000);
        assert!(snap.energy.ms_since_tick.is_some(), "ticks were observed");

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn spend_seen_by_the_driver_opens_the_window() {
        let provider = ScriptedPools {
            start:  Instant::now(),
            mana:   &[(0, 8_000), (3_000, 6_500)],
            energy: &[(0, 100)],
        };
        let (handle, _snapshots) =
            spawn(RegenEngine::new(EngineConfig::default()), provider);

        tokio::time::sleep(Duration::from_millis(3_500)).await;

        let reading = handle.suppression(ResourceKind::Mana).await.unwrap();
        assert!(reading.active);
        assert!(
            reading.remaining_ms >= 4_000 && reading.remaining_ms <= 5_000,
            "window opened near the spend: {} ms left",
            reading.remaining_ms
        );

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn handle_reports_engine_gone_after_shutdown() {
        let provider = ScriptedPools {
            start:  Instant::now(),
            mana:   &[(0, 8_000)],
            energy: &[(0, 100)],
        };
        let (handle, _snapshots) =
            spawn(RegenEngine::new(EngineConfig::default()), provider);

        handle.shutdown().await;
        // Give the task a chance to drain the command and exit
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(handle.time_until_affordable(BOLT).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_serializes_for_ipc() {
        let provider = ScriptedPools {
            start:  Instant::now(),
            mana:   &[(0, 8_000)],
            energy: &[(0, 50)],
        };
        let (handle, mut snapshots) =
            spawn(RegenEngine::new(EngineConfig::default()), provider);

        tokio::time::sleep(Duration::from_millis(1_000)).await;

        let snap = *snapshots.borrow_and_update();
        let json = serde_json::to_string(&snap).unwrap();
        let back: RegenSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.energy.current, snap.energy.current);

        handle.shutdown().await;
    }
}
