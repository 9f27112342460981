use rand::Rng;

/// Source of the randomness the annealer consumes.
///
/// Any [`rand::Rng`] qualifies, so a seeded `StdRng` gives reproducible runs.
pub trait RandomSource {
    /// Uniform value in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// Uniform index in `[0, n)`. `n` must be non-zero.
    fn index(&mut self, n: usize) -> usize;

    /// Two distinct uniform indices in `[0, n)`, resampling the second until
    /// it differs from the first. `n` must be at least 2.
    fn distinct_pair(&mut self, n: usize) -> (usize, usize) {
        debug_assert!(n >= 2);
        let first = self.index(n);
        let mut second = self.index(n);
        while second == first {
            second = self.index(n);
        }
        (first, second)
    }
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn unit(&mut self) -> f64 {
        self.gen::<f64>()
    }

    fn index(&mut self, n: usize) -> usize {
        self.gen_range(0..n)
    }
}

/// Replays scripted draws, for steering the annealer in tests.
#[cfg(test)]
pub(crate) struct Scripted {
    pub units: Vec<f64>,
    pub indices: Vec<usize>,
}

#[cfg(test)]
impl RandomSource for Scripted {
    fn unit(&mut self) -> f64 {
        self.units.remove(0)
    }

    fn index(&mut self, n: usize) -> usize {
        let i = self.indices.remove(0);
        assert!(i < n);
        i
    }
}
