//! Policies for assigning an attendant to each pump of a new station.

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Picks one of `candidates` options and returns its index.
///
/// Implementations should return a value in `[0, candidates)`; anything else
/// is wrapped into range by the caller. `candidates` is never zero.
pub trait AttendantSelector {
    /// Choose an index for the next pump.
    fn select(&mut self, candidates: usize) -> usize;
}

impl<F> AttendantSelector for F
where
    F: FnMut(usize) -> usize,
{
    fn select(&mut self, candidates: usize) -> usize {
        self(candidates)
    }
}

/// Uniformly random choice.
#[derive(Debug)]
pub struct RandomSelector {
    rng: StdRng,
}

impl RandomSelector {
    /// Selector seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible selector.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl AttendantSelector for RandomSelector {
    fn select(&mut self, candidates: usize) -> usize {
        self.rng.gen_range(0..candidates)
    }
}

/// Hands pumps out to attendants in order, wrapping around.
#[derive(Debug, Default, Clone)]
pub struct RoundRobinSelector {
    next: usize,
}

impl AttendantSelector for RoundRobinSelector {
    fn select(&mut self, candidates: usize) -> usize {
        let choice = self.next % candidates;
        self.next = self.next.wrapping_add(1);
        choice
    }
}
