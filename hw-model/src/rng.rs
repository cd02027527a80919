// Licensed under the Apache-2.0 license

use mkek_drivers::RandomSource;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Deterministic random source for provisioning tests.
pub struct SimRng {
    rng: Option<StdRng>,
    draws: usize,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Some(StdRng::seed_from_u64(seed)),
            draws: 0,
        }
    }

    /// A source whose entropy is unavailable. Every draw yields zeros.
    pub fn failing() -> Self {
        Self {
            rng: None,
            draws: 0,
        }
    }

    /// Number of buffers filled so far.
    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl RandomSource for SimRng {
    fn fill_random(&mut self, buf: &mut [u8]) {
        self.draws += 1;
        match self.rng.as_mut() {
            Some(rng) => rng.fill_bytes(buf),
            None => buf.fill(0),
        }
    }
}
