use rand::Rng;
use std::sync::Arc;

/// Reorders a catalog in place. Background selection is cosmetic, so implementations
/// are free to be predictable.
pub trait Shuffle: Send + Sync {
    fn shuffle(&self, items: &mut [String]);
}

/// Fisher-Yates driven by a 32-bit linear congruential generator.
///
/// Each call draws a fresh 8 byte seed from the thread RNG unless a fixed seed was
/// given. Not suitable for anything security related.
#[derive(Debug, Clone, Copy, Default)]
pub struct LcgShuffle {
    seed: Option<u64>,
}

impl LcgShuffle {
    const MULTIPLIER: u64 = 1_664_525;
    const INCREMENT: u64 = 1_013_904_223;
    const MODULUS_MASK: u64 = 0xffff_ffff;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    fn draw_seed(&self) -> u64 {
        if let Some(seed) = self.seed {
            return seed;
        }

        let mut bytes = [0u8; 8];
        rand::rng().fill(&mut bytes);
        bytes
            .iter()
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
    }
}

impl Shuffle for LcgShuffle {
    fn shuffle(&self, items: &mut [String]) {
        if items.len() <= 1 {
            return;
        }

        let mut state = self.draw_seed();
        for i in (1..items.len()).rev() {
            let j = (state % (i as u64 + 1)) as usize;
            items.swap(i, j);
            state = (state
                .wrapping_mul(Self::MULTIPLIER)
                .wrapping_add(Self::INCREMENT))
                & Self::MODULUS_MASK;
        }
    }
}

/// Keeps the incoming order. Used where deterministic output matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoShuffle;

impl Shuffle for NoShuffle {
    fn shuffle(&self, _items: &mut [String]) {}
}

#[derive(Clone)]
pub struct BackgroundSelector {
    shuffle: Arc<dyn Shuffle>,
    pool_size: usize,
}

impl Default for BackgroundSelector {
    fn default() -> Self {
        Self::new(Arc::new(LcgShuffle::new()))
    }
}

impl BackgroundSelector {
    pub fn new(shuffle: Arc<dyn Shuffle>) -> Self {
        Self {
            shuffle,
            pool_size: super::BACKGROUND_POOL_SIZE,
        }
    }

    /// Permutes the catalog and keeps at most the pool size of entries.
    pub fn select(&self, mut catalog: Vec<String>) -> Vec<String> {
        self.shuffle.shuffle(&mut catalog);
        catalog.truncate(self.pool_size);
        catalog
    }
}
