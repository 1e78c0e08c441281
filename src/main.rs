/// Demo driver: replays a scripted combat moment through the engine and
/// logs the countdowns a HUD would paint on each ability icon.
///
/// The timelines below cover the interesting cases in one pass: mana
/// learning its free rate, a spend opening the suppression window, small
/// suppressed ticks, a potion spike that must not poison the learned
/// rate, energy ticking on its fixed schedule, and rage staying
/// unpredictable.
use anyhow::Result;
use mana_clock::{sampler, EngineConfig, PoolProvider, RegenEngine, ResourceKind};
use tokio::time::{Duration, Instant};
use tracing_subscriber::fmt::writer::MakeWriterExt;

// ---------------------------------------------------------------------------
// Scripted pools
// ---------------------------------------------------------------------------

// (elapsed_ms, pool value), piecewise constant
const MANA_TIMELINE: &[(u64, u32)] = &[
    (0, 9_100),
    (1_000, 9_220),  // free tick +120
    (3_000, 9_340),  // free tick +120
    (3_500, 6_740),  // Pyroblast spent 2_600, window opens
    (5_000, 6_775),  // suppressed tick +35
    (7_000, 6_810),  // suppressed tick +35
    (8_000, 8_110),  // mana potion +1_300, spike-filtered
    (9_000, 8_230),  // window closed, free ticks resume
    (11_000, 8_350),
    (13_000, 8_470),
];

const ENERGY_TIMELINE: &[(u64, u32)] = &[
    (0, 35),
    (2_000, 55),
    (4_000, 75),
    (6_000, 95),
    (8_000, 100),
    (9_000, 40), // Mutilate spent 60
    (10_000, 60),
    (12_000, 80),
    (14_000, 100),
];

const RAGE_TIMELINE: &[(u64, u32)] = &[(0, 12), (4_200, 34), (5_100, 58), (9_300, 21)];

struct ScriptedPools {
    start: Instant,
}

impl ScriptedPools {
    fn at(&self, timeline: &[(u64, u32)]) -> u32 {
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
            PYROBLAST => Some((2_600, ResourceKind::Mana)),
            FROSTBOLT => Some((1_100, ResourceKind::Mana)),
            MUTILATE  => Some((60, ResourceKind::Energy)),
            BLOODTHIRST => Some((30, ResourceKind::Rage)),
            _ => None,
        }
    }

    fn current(&self, kind: ResourceKind) -> Option<u32> {
        Some(match kind {
            ResourceKind::Mana   => self.at(MANA_TIMELINE),
            ResourceKind::Energy => self.at(ENERGY_TIMELINE),
            ResourceKind::Rage   => self.at(RAGE_TIMELINE),
        })
    }

    fn maximum(&self, kind: ResourceKind) -> Option<u32> {
        Some(match kind {
            ResourceKind::Mana   => 10_000,
            ResourceKind::Energy => 100,
            ResourceKind::Rage   => 100,
        })
    }
}

const PYROBLAST:   u32 = 101;
const FROSTBOLT:   u32 = 102;
const MUTILATE:    u32 = 201;
const BLOODTHIRST: u32 = 301;

const WATCHED: &[(u32, &str)] = &[
    (PYROBLAST, "Pyroblast"),
    (FROSTBOLT, "Frostbolt"),
    (MUTILATE, "Mutilate"),
    (BLOODTHIRST, "Bloodthirst"),
];

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = EngineConfig::default();
    tracing::info!(
        interval_ms = config.sample_interval_ms,
        window_ms = config.suppression_window_ms,
        "starting scripted session"
    );

    let provider = ScriptedPools { start: Instant::now() };
    let (handle, mut snapshots) = sampler::spawn(RegenEngine::new(config), provider);

    // Poll the way an icon layer would: a coarse read per render pass
    for step in 0..28u32 {
        tokio::time::sleep(Duration::from_millis(500)).await;

        for (ability_id, name) in WATCHED {
            let eta_ms = handle.time_until_affordable(*ability_id).await?;
            if eta_ms == 0 {
                tracing::info!("{:<12} ready", name);
            } else {
                tracing::info!("{:<12} ready in {:>5.1}s", name, eta_ms as f64 / 1_000.0);
            }
        }

        let reading = handle.suppression(ResourceKind::Mana).await?;
        if reading.active {
            tracing::info!(
                "mana regen suppressed for another {:.1}s",
                reading.remaining_ms as f64 / 1_000.0
            );
        }

        // Dump the full snapshot once in a while, as a HUD debug overlay
        // would
        if step % 8 == 7 {
            let snap = *snapshots.borrow_and_update();
            tracing::debug!(snapshot = %serde_json::to_string(&snap)?, "engine state");
        }
    }

    handle.shutdown().await;
    tracing::info!("scripted session complete");
    Ok(())
}

/// Write to both stderr and a daily-rolling log file so a crash report
/// always has context.
fn init_logging() {
    let log_dir = std::env::temp_dir().join("mana-clock").join("logs");
    let _ = std::fs::create_dir_all(&log_dir);

    let file_appender = tracing_appender::rolling::daily(&log_dir, "mana-clock.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the guard alive for the process lifetime; drop would flush and
    // close the writer while tasks still log.
    std::mem::forget(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mana_clock=debug".parse().expect("valid directive")),
        )
        .with_writer(non_blocking.and(std::io::stderr))
        .with_ansi(false)
        .init();

    // Route panics through tracing so they land in the log file too
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());
        let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        tracing::error!("PANIC at {}: {}", location, message);
    }));
}
