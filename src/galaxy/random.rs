use rand::prelude::*;

/// Uniform `[0, 1)` draws consumed by the generator.
pub trait RandomSource {
    fn unit(&mut self) -> f32;

    /// `1.0` or `-1.0` with equal probability.
    fn sign(&mut self) -> f32 {
        if self.unit() < 0.5 {
            1.0
        } else {
            -1.0
        }
    }
}

impl<R: RngCore> RandomSource for R {
    fn unit(&mut self) -> f32 {
        self.random::<f32>()
    }
}

/// Replays a fixed list of draws, cycling when it runs out.
#[derive(Clone, Debug)]
pub struct SequenceRandom {
    values: Vec<f32>,
    next: usize,
}

impl SequenceRandom {
    pub fn new(values: impl Into<Vec<f32>>) -> Self {
        let values = values.into();
        assert!(!values.is_empty(), "SequenceRandom needs at least one value");
        Self { values, next: 0 }
    }

    /// Number of draws handed out so far.
    pub fn draws(&self) -> usize {
        self.next
    }
}

impl RandomSource for SequenceRandom {
    fn unit(&mut self) -> f32 {
        let value = self.values[self.next % self.values.len()];
        self.next += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    #[test]
    fn sequence_cycles_and_counts() {
        let mut rng = SequenceRandom::new([0.25, 0.75]);
        assert_eq!(rng.unit(), 0.25);
        assert_eq!(rng.unit(), 0.75);
        assert_eq!(rng.unit(), 0.25);
        assert_eq!(rng.draws(), 3);
    }

    #[test]
    fn sign_splits_at_one_half() {
        let mut rng = SequenceRandom::new([0.0, 0.49, 0.5, 0.99]);
        assert_eq!(rng.sign(), 1.0);
        assert_eq!(rng.sign(), 1.0);
        assert_eq!(rng.sign(), -1.0);
        assert_eq!(rng.sign(), -1.0);
    }

    #[test]
    fn rng_draws_stay_in_unit_interval() {
        let mut rng = StdRng::seed_from_u64(0x6A1A_C71C);
        for _ in 0..10_000 {
            let u = rng.unit();
            assert!((0.0..1.0).contains(&u));
        }
    }
}
