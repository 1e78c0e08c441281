/// Event-generated pools (rage): refills come from combat events with no
/// periodic structure, so there is nothing defensible to extrapolate.
/// Always answers 0, which tells the caller to fall back to a plain fill
/// gauge instead of a countdown. This is a permanent decision, not a gap.

pub fn evaluate(needed: u32) -> u64 {
    tracing::trace!(needed, "event-driven pool, no countdown");
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_predicts() {
        assert_eq!(evaluate(1), 0);
        assert_eq!(evaluate(30), 0);
        assert_eq!(evaluate(u32::MAX), 0);
    }
}
