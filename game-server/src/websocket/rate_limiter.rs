use std::time::{Duration, Instant};

/// Token bucket applied to inbound client messages.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    tokens: u32,
    max_tokens: u32,
    refill_rate: Duration,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::new_with_limits(30, Duration::from_millis(200))
    }

    pub fn new_with_limits(max_tokens: u32, refill_rate: Duration) -> Self {
        Self {
            tokens: max_tokens,
            max_tokens,
            refill_rate,
            last_refill: Instant::now(),
        }
    }

    pub fn check_rate_limit(&mut self) -> bool {
        self.refill_tokens(Instant::now());

        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    pub fn remaining_tokens(&mut self) -> u32 {
        self.refill_tokens(Instant::now());
        self.tokens
    }

    fn refill_tokens(&mut self, now: Instant) {
        if self.refill_rate.is_zero() {
            self.tokens = self.max_tokens;
            return;
        }

        let elapsed = now.duration_since(self.last_refill);
        let earned = elapsed.as_nanos() / self.refill_rate.as_nanos();
        if earned == 0 {
            return;
        }

        let earned = u32::try_from(earned).unwrap_or(u32::MAX);
        self.tokens = self.tokens.saturating_add(earned).min(self.max_tokens);
        // Carry the partial interval over so slow trickles still earn tokens
        self.last_refill += self.refill_rate * earned;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
