use std::time::Duration;

/// Delay between convergence polls: starts at `base`, doubles per round,
/// never exceeds `max`.
#[derive(Debug, Clone)]
pub struct PollBackoff {
    base: Duration,
    max: Duration,
    rounds: u32,
}

impl PollBackoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
            rounds: 0,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let shift = self.rounds.min(20);
        self.rounds = self.rounds.saturating_add(1);

        let base_ms = self.base.as_millis();
        let max_ms = self.max.as_millis();
        let delay_ms = base_ms.saturating_mul(1u128 << shift).min(max_ms);
        Duration::from_millis(u64::try_from(delay_ms).unwrap_or(u64::MAX))
    }
}
