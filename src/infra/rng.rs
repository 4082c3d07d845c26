use crate::engine::RandomSource;

/// Системный RNG: порядок кандидатов на спаривание каждый раз новый.
#[derive(Clone, Debug, Default)]
pub struct SystemRng;

impl RandomSource for SystemRng {
    fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        use rand::thread_rng;

        slice.shuffle(&mut thread_rng());
    }
}

/// Детерминированный RNG для тестов.
/// Одинаковый seed -> одинаковый порядок спаривания.
#[derive(Clone, Debug)]
pub struct DeterministicRng {
    inner: rand::rngs::StdRng,
}

impl DeterministicRng {
    pub fn from_seed(seed: u64) -> Self {
        use rand::SeedableRng;
        Self {
            inner: rand::rngs::StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for DeterministicRng {
    fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.inner);
    }
}

/// Ничего не перемешивает: порядок кандидатов как есть.
#[derive(Clone, Debug, Default)]
pub struct IdentityRng;

impl RandomSource for IdentityRng {
    fn shuffle<T>(&mut self, _slice: &mut [T]) {}
}
