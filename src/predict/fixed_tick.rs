/// Tick-perfect pools (energy): a known amount lands every period and the
/// suppression window does not apply, so the countdown is pure phase
/// arithmetic against the tick clock.
use super::PredictContext;

pub fn evaluate(needed: u32, ctx: &PredictContext) -> u64 {
    let per_tick = ctx.clock.amount_per_tick().max(1);
    let ticks    = needed.div_ceil(per_tick) as u64;
    let first    = ctx.clock.until_next_tick_ms(ctx.now_ms);

    // The buffer absorbs the gap between the timer hitting zero and the
    // tick actually registering in the sampled pool.
    first + (ticks - 1) * ctx.clock.period_ms() + ctx.config.tick_buffer_ms
}

#[cfg(test)]
mod tests {
    use super::super::PredictContext;
    use super::*;
    use crate::clock::{SteadyClock, TickClock};
    use crate::config::EngineConfig;
    use crate::state::SuppressionTracker;

    fn ctx<'a>(
        clock: &'a SteadyClock,
        suppression: &'a SuppressionTracker,
        config: &'a EngineConfig,
        now_ms: u64,
    ) -> PredictContext<'a> {
        PredictContext {
            now_ms,
            max_pool:        100,
            suppression,
            suppressed_rate: None,
            free_rate:       None,
            clock,
            config,
        }
    }

    #[test]
    fn single_tick_need_waits_for_next_tick() {
        let config = EngineConfig::default();
        let suppression = SuppressionTracker::new(config.suppression_window_ms);
        let mut clock = SteadyClock::new(2_000, 20);
        clock.note_tick(10_000);

        // Next tick in 1.2s, one tick covers the need
        let c = ctx(&clock, &suppression, &config, 10_800);
        assert_eq!(evaluate(20, &c), 1_200 + 150);
    }

    #[test]
    fn multi_tick_need_adds_whole_periods() {
        let config = EngineConfig::default();
        let suppression = SuppressionTracker::new(config.suppression_window_ms);
        let mut clock = SteadyClock::new(2_000, 20);
        clock.note_tick(10_000);

        // 45 needed at 20 per tick is 3 ticks
        let c = ctx(&clock, &suppression, &config, 10_800);
        assert_eq!(evaluate(45, &c), 1_200 + 2 * 2_000 + 150);
    }

    #[test]
    fn need_smaller_than_one_tick_still_waits_one() {
        let config = EngineConfig::default();
        let suppression = SuppressionTracker::new(config.suppression_window_ms);
        let mut clock = SteadyClock::new(2_000, 20);
        clock.note_tick(0);

        let c = ctx(&clock, &suppression, &config, 500);
        assert_eq!(evaluate(1, &c), 1_500 + 150);
    }
}
