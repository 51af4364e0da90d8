//! PDM bit pattern generators. Each returns one decimation window of 0/1 bits.

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    AllZeros,
    AllOnes,
    Alternating,
    /// First `num`/`den` of the window is ones, the remainder zeros.
    DutyCycle { num: u32, den: u32 },
    Random,
    /// Crude one-period square, the bench's stand-in for a sine burst.
    HalfWindowSquare,
}

impl Pattern {
    pub fn generate<R: Rng>(&self, ratio: u32, rng: &mut R) -> Vec<u8> {
        match *self {
            Pattern::AllZeros => all_zeros(ratio),
            Pattern::AllOnes => all_ones(ratio),
            Pattern::Alternating => alternating(ratio),
            Pattern::DutyCycle { num, den } => duty_cycle(ratio, num, den),
            Pattern::Random => random(ratio, rng),
            Pattern::HalfWindowSquare => duty_cycle(ratio, 1, 2),
        }
    }
}

pub fn all_zeros(ratio: u32) -> Vec<u8> {
    vec![0; ratio as usize]
}

pub fn all_ones(ratio: u32) -> Vec<u8> {
    vec![1; ratio as usize]
}

pub fn alternating(ratio: u32) -> Vec<u8> {
    (0..ratio).map(|i| (i % 2) as u8).collect()
}

pub fn duty_cycle(ratio: u32, num: u32, den: u32) -> Vec<u8> {
    assert!(den > 0 && num <= den);
    let ones = (ratio * num / den) as usize;
    (0..ratio as usize).map(|i| u8::from(i < ones)).collect()
}

pub fn random<R: Rng>(ratio: u32, rng: &mut R) -> Vec<u8> {
    (0..ratio).map(|_| rng.gen_range(0..2) as u8).collect()
}

pub fn ones_count(bits: &[u8]) -> u32 {
    bits.iter().filter(|&&b| b != 0).count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn fixed_patterns_have_expected_density() {
        assert_eq!(ones_count(&all_zeros(16)), 0);
        assert_eq!(ones_count(&all_ones(16)), 16);
        assert_eq!(ones_count(&alternating(16)), 8);
        assert_eq!(ones_count(&duty_cycle(16, 1, 4)), 4);
        assert_eq!(ones_count(&duty_cycle(16, 3, 4)), 12);
    }

    #[test]
    fn patterns_are_window_sized_and_binary() {
        let mut rng = StdRng::seed_from_u64(7);
        for pattern in [
            Pattern::AllZeros,
            Pattern::AllOnes,
            Pattern::Alternating,
            Pattern::DutyCycle { num: 1, den: 4 },
            Pattern::Random,
            Pattern::HalfWindowSquare,
        ] {
            let bits = pattern.generate(48, &mut rng);
            assert_eq!(bits.len(), 48);
            assert!(bits.iter().all(|&b| b <= 1));
        }
    }

    #[test]
    fn random_is_reproducible_per_seed() {
        let a = random(32, &mut StdRng::seed_from_u64(42));
        let b = random(32, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
