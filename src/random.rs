use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DEFAULT_SEED: u64 = 3819201;

/// Source of the uniform random choices made during expansion and rollouts.
///
/// Passed explicitly into the search so that runs can be made reproducible.
pub trait RandomGenerator {
    /// Returns a uniformly distributed value in `from..to`. `to` must exceed `from`.
    fn next_range(&mut self, from: usize, to: usize) -> usize;

    /// Picks a uniformly random element of `items`, or `None` if it is empty.
    fn pick<'a, K>(&mut self, items: &'a [K]) -> Option<&'a K> {
        if items.is_empty() {
            None
        } else {
            items.get(self.next_range(0, items.len()))
        }
    }
}

impl<R: RandomGenerator> RandomGenerator for &mut R {
    fn next_range(&mut self, from: usize, to: usize) -> usize {
        (**self).next_range(from, to)
    }
}

/// Draws from the thread-local generator; not reproducible.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardRandomGenerator;

impl RandomGenerator for StandardRandomGenerator {
    fn next_range(&mut self, from: usize, to: usize) -> usize {
        rand::rng().random_range(from..to)
    }
}

/// A seeded generator: the same seed always yields the same sequence.
#[derive(Debug, Clone)]
pub struct SeededRandomGenerator {
    rng: StdRng,
}

impl Default for SeededRandomGenerator {
    fn default() -> Self {
        SeededRandomGenerator::new(DEFAULT_SEED)
    }
}

impl RandomGenerator for SeededRandomGenerator {
    fn next_range(&mut self, from: usize, to: usize) -> usize {
        self.rng.random_range(from..to)
    }
}

impl SeededRandomGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::random::{RandomGenerator, SeededRandomGenerator, StandardRandomGenerator};

    #[test]
    fn same_seed_outputs_same_numbers() {
        let mut first = SeededRandomGenerator::new(42);
        let mut second = SeededRandomGenerator::new(42);
        let a: Vec<usize> = (0..32).map(|_| first.next_range(0, 10)).collect();
        let b: Vec<usize> = (0..32).map(|_| second.next_range(0, 10)).collect();
        assert_eq!(a, b);
        assert!(a.iter().all(|&x| x < 10));
    }

    #[test]
    fn pick_stays_inside_slice() {
        let vec = vec![432, 6542, 534, 6, 13, 645, 88, 2352, 345, 2667, 8287];
        let mut crg = SeededRandomGenerator::default();
        for _ in 0..100 {
            assert!(vec.contains(crg.pick(&vec).unwrap()));
        }
        let empty: Vec<u8> = Vec::new();
        assert!(StandardRandomGenerator.pick(&empty).is_none());
    }

    #[test]
    fn borrowed_generator_advances_owner() {
        fn draw<R: RandomGenerator>(mut rg: R) -> usize {
            rg.next_range(0, 1000)
        }

        let mut owner = SeededRandomGenerator::new(7);
        let mut reference = SeededRandomGenerator::new(7);
        assert_eq!(draw(&mut owner), reference.next_range(0, 1000));
        assert_eq!(owner.next_range(0, 1000), reference.next_range(0, 1000));
    }
}
