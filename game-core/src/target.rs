use game_types::{GUESS_MAX, GUESS_MIN};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of secret numbers for new sessions.
pub trait TargetGenerator: Send {
    /// Draw a target in `GUESS_MIN..=GUESS_MAX`.
    fn next_target(&mut self) -> u8;
}

/// Uniform draw over the guessing range.
#[derive(Debug, Clone)]
pub struct RandomTargetGenerator {
    rng: StdRng,
}

impl RandomTargetGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomTargetGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetGenerator for RandomTargetGenerator {
    fn next_target(&mut self) -> u8 {
        self.rng.random_range(GUESS_MIN..=GUESS_MAX)
    }
}

/// Always hands out the same target. Used for scripted games and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedTargetGenerator(pub u8);

impl TargetGenerator for FixedTargetGenerator {
    fn next_target(&mut self) -> u8 {
        self.0
    }
}
