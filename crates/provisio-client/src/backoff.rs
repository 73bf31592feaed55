//! Reconnect backoff schedule.

use std::time::Duration;

/// Delay before reconnect attempt `attempt` (0-based): immediate, then 2s,
/// then 5s, then a steady 10s for every attempt after that. The schedule
/// restarts after each successful reconnect.
#[must_use]
pub fn reconnect_delay(attempt: u32) -> Duration {
    const LADDER: [u64; 3] = [0, 2, 5];
    const STEADY_SECS: u64 = 10;

    match LADDER.get(attempt as usize) {
        Some(&secs) => Duration::from_secs(secs),
        None => Duration::from_secs(STEADY_SECS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_ramps_then_steadies() {
        assert_eq!(reconnect_delay(0), Duration::ZERO);
        assert_eq!(reconnect_delay(1), Duration::from_secs(2));
        assert_eq!(reconnect_delay(2), Duration::from_secs(5));
        assert_eq!(reconnect_delay(3), Duration::from_secs(10));
        assert_eq!(reconnect_delay(100), Duration::from_secs(10));
    }
}
