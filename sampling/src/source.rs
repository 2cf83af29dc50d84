use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_core::RngCore;

/// Seeded, forkable randomness stream.
///
/// Every random quantity of the scheme (secret, masks, errors) is drawn from
/// its own [Source] so that tests can replay an exact transcript from a
/// fixed seed.
pub struct Source {
    source: ChaCha8Rng,
}

/// Returns a fresh 32 bytes seed drawn from the thread local OS-seeded rng.
pub fn new_seed() -> [u8; 32] {
    let mut seed: [u8; 32] = [0u8; 32];
    rand::rng().fill_bytes(&mut seed);
    seed
}

impl Source {
    pub fn new(seed: [u8; 32]) -> Source {
        Source {
            source: ChaCha8Rng::from_seed(seed),
        }
    }

    pub fn new_seed(&mut self) -> [u8; 32] {
        let mut seed: [u8; 32] = [0u8; 32];
        self.source.fill_bytes(&mut seed);
        seed
    }

    /// Derives an independent [Source] from this one.
    pub fn branch(&mut self) -> Self {
        Source::new(self.new_seed())
    }

    /// Returns a uniform value in [0, max) by rejection sampling on `mask`.
    #[inline(always)]
    pub fn next_u64n(&mut self, max: u64, mask: u64) -> u64 {
        let mut x: u64 = self.next_u64() & mask;
        while x >= max {
            x = self.next_u64() & mask;
        }
        x
    }

    /// Returns a uniform index in [0, n).
    #[inline(always)]
    pub fn next_index(&mut self, n: usize) -> usize {
        debug_assert!(n > 0, "invalid argument n: n=0");
        let mask: u64 = (n as u64).next_power_of_two() - 1;
        self.next_u64n(n as u64, mask) as usize
    }
}

impl RngCore for Source {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        self.source.next_u32()
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        self.source.next_u64()
    }

    #[inline(always)]
    fn fill_bytes(&mut self, bytes: &mut [u8]) {
        self.source.fill_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a: Source = Source::new([7u8; 32]);
        let mut b: Source = Source::new([7u8; 32]);
        (0..64).for_each(|_| assert_eq!(a.next_u64(), b.next_u64()));
    }

    #[test]
    fn branches_diverge() {
        let mut root: Source = Source::new([1u8; 32]);
        let mut a: Source = root.branch();
        let mut b: Source = root.branch();
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn next_u64n_in_range() {
        let mut source: Source = Source::new([3u8; 32]);
        let max: u64 = 1000;
        let mask: u64 = max.next_power_of_two() - 1;
        (0..4096).for_each(|_| assert!(source.next_u64n(max, mask) < max));
        (0..4096).for_each(|_| assert!(source.next_index(17) < 17));
    }
}
