//! Seeded random stream owned by the world and threaded explicitly into every consumer.
//! Serializes its exact ChaCha position so a restored run draws the same numbers.

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::{Rng, SeedableRng};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Clone, Debug)]
pub struct SimRng {
    inner: ChaCha8Rng,
}

impl SimRng {
    pub fn seed_from_u64(seed: u64) -> Self {
        Self { inner: ChaCha8Rng::seed_from_u64(seed) }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Uniform value in `0..bound`; zero when `bound` is zero.
    pub fn below(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        self.next_u64() % bound
    }

    /// Uniform value in `min..=max`. Returns `min` when the range is empty.
    pub fn range_i32(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (i64::from(max) - i64::from(min) + 1) as u64;
        (i64::from(min) + self.below(span) as i64) as i32
    }

    pub fn range_usize(&mut self, min: usize, max: usize) -> usize {
        if max <= min {
            return min;
        }
        min + self.below((max - min + 1) as u64) as usize
    }

    /// Uniform float in `[0, 1)` built from the top 53 bits.
    pub fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1_u64 << 53) as f64
    }

    pub fn chance(&mut self, probability: f64) -> bool {
        self.unit() < probability
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.below(items.len() as u64) as usize)
    }

    /// Index drawn proportionally to `weights`; `None` when every weight is zero.
    pub fn pick_weighted(&mut self, weights: &[u32]) -> Option<usize> {
        let total: u64 = weights.iter().map(|&weight| u64::from(weight)).sum();
        if total == 0 {
            return None;
        }
        let mut roll = self.below(total);
        for (index, &weight) in weights.iter().enumerate() {
            let weight = u64::from(weight);
            if roll < weight {
                return Some(index);
            }
            roll -= weight;
        }
        None
    }

    fn state(&self) -> RngState {
        let word_pos = self.inner.get_word_pos();
        RngState {
            seed: self.inner.get_seed(),
            stream: self.inner.get_stream(),
            word_pos_hi: (word_pos >> 64) as u64,
            word_pos_lo: word_pos as u64,
        }
    }

    fn from_state(state: &RngState) -> Self {
        let mut inner = ChaCha8Rng::from_seed(state.seed);
        inner.set_stream(state.stream);
        inner.set_word_pos((u128::from(state.word_pos_hi) << 64) | u128::from(state.word_pos_lo));
        Self { inner }
    }
}

#[derive(Serialize, Deserialize)]
struct RngState {
    seed: [u8; 32],
    stream: u64,
    word_pos_hi: u64,
    word_pos_lo: u64,
}

impl Serialize for SimRng {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.state().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SimRng {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let state = RngState::deserialize(deserializer)?;
        Ok(Self::from_state(&state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_stay_inside_requested_bounds() {
        let mut rng = SimRng::seed_from_u64(7);
        for _ in 0..500 {
            let value = rng.range_i32(-3, 3);
            assert!((-3..=3).contains(&value));
            let index = rng.range_usize(4, 12);
            assert!((4..=12).contains(&index));
            let unit = rng.unit();
            assert!((0.0..1.0).contains(&unit));
        }
        assert_eq!(rng.range_i32(5, 5), 5);
        assert_eq!(rng.below(0), 0);
    }

    #[test]
    fn weighted_pick_never_selects_zero_weight_entries() {
        let mut rng = SimRng::seed_from_u64(99);
        for _ in 0..200 {
            let index = rng.pick_weighted(&[0, 3, 0, 1]).expect("non-zero total");
            assert!(index == 1 || index == 3);
        }
        assert_eq!(rng.pick_weighted(&[0, 0]), None);
    }

    #[test]
    fn serialized_stream_resumes_at_the_exact_position() {
        let mut original = SimRng::seed_from_u64(42);
        for _ in 0..37 {
            original.next_u64();
        }
        let json = serde_json::to_string(&original).expect("rng should serialize");
        let mut restored: SimRng = serde_json::from_str(&json).expect("rng should deserialize");

        let expected: Vec<u64> = (0..16).map(|_| original.next_u64()).collect();
        let actual: Vec<u64> = (0..16).map(|_| restored.next_u64()).collect();
        assert_eq!(expected, actual, "restored rng must continue the same stream");
    }
}
