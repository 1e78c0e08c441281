/// Engine tuning constants — persisted as TOML next to the host HUD's own
/// configuration.
///
/// None of these are runtime-mutable: the engine copies its config at
/// construction and a changed file takes effect on the next start. Every
/// field has a serde default so a partial (or missing) file loads cleanly.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Sampling cadence for the pool poller. Coarser than frame rate on
    /// purpose; regen ticks are seconds apart.
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    /// Length of the post-spend regen suppression window.
    #[serde(default = "default_suppression_window_ms")]
    pub suppression_window_ms: u64,

    /// Gains above this fraction of max pool are windfalls (potion, drain
    /// refund), not ticks. They still update tick timing.
    #[serde(default = "default_spike_fraction")]
    pub spike_fraction: f64,

    /// Gains below this fraction of max pool are ignored as noise.
    #[serde(default = "default_noise_fraction")]
    pub noise_fraction: f64,

    /// Recorded tick gains kept per phase bucket.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Added to every countdown so the timer cannot reach zero a frame
    /// before the pool itself updates.
    #[serde(default = "default_tick_buffer_ms")]
    pub tick_buffer_ms: u64,

    /// Fraction of the regen rate added to the needed amount before tick
    /// counts are rounded up.
    #[serde(default = "default_safety_margin")]
    pub safety_margin: f64,

    /// Cold-start regen rate as a fraction of max pool, used until a real
    /// free-phase tick has been observed.
    #[serde(default = "default_heuristic_rate_fraction")]
    pub heuristic_rate_fraction: f64,
}

fn default_sample_interval_ms() -> u64 { 150 }
fn default_suppression_window_ms() -> u64 { 5_000 }
fn default_spike_fraction() -> f64 { 0.10 }
fn default_noise_fraction() -> f64 { 0.003 }
fn default_history_capacity() -> usize { 5 }
fn default_tick_buffer_ms() -> u64 { 150 }
fn default_safety_margin() -> f64 { 0.05 }
fn default_heuristic_rate_fraction() -> f64 { 0.02 }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms:      default_sample_interval_ms(),
            suppression_window_ms:   default_suppression_window_ms(),
            spike_fraction:          default_spike_fraction(),
            noise_fraction:          default_noise_fraction(),
            history_capacity:        default_history_capacity(),
            tick_buffer_ms:          default_tick_buffer_ms(),
            safety_margin:           default_safety_margin(),
            heuristic_rate_fraction: default_heuristic_rate_fraction(),
        }
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

pub fn load_or_default(config_dir: &Path) -> Result<EngineConfig> {
    let path = config_dir.join("regen.toml");
    if path.exists() {
        let raw = std::fs::read_to_string(&path)?;
        let cfg: EngineConfig = toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Config parse error: {}", e))?;
        Ok(cfg)
    } else {
        Ok(EngineConfig::default())
    }
}

pub fn save(config: &EngineConfig, config_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(config_dir)?;
    let raw = toml::to_string_pretty(config)
        .map_err(|e| anyhow::anyhow!("Config serialize error: {}", e))?;
    std::fs::write(config_dir.join("regen.toml"), raw)?;
    Ok(())
}
