//! Deterministic seed mixing for per-floor and per-attempt generation streams.

use crate::rng::SimRng;

pub fn mix_seed_stream(seed: u64, stream: u64) -> u64 {
    let mut mixed = seed ^ stream.wrapping_mul(0xD6E8_FD9A_5B89_7A4D);
    mixed ^= mixed >> 33;
    mixed = mixed.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    mixed ^= mixed >> 33;
    mixed = mixed.wrapping_mul(0xC4CE_B9FE_1A85_EC53);
    mixed ^ (mixed >> 33)
}

pub fn derive_floor_seed(run_seed: u64, floor: u32) -> u64 {
    let mut mixed = run_seed ^ 0x9E37_79B9_7F4A_7C15;
    mixed ^= u64::from(floor).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    mixed ^= mixed >> 30;
    mixed = mixed.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    mixed ^= mixed >> 27;
    mixed = mixed.wrapping_mul(0x94D0_49BB_1331_11EB);
    mixed ^ (mixed >> 31)
}

/// Generation stream for one attempt at one floor; independent of the run's world rng.
pub(super) fn attempt_rng(floor_seed: u64, attempt: u32) -> SimRng {
    SimRng::seed_from_u64(mix_seed_stream(floor_seed, u64::from(attempt) + 1))
}

/// Stream reserved for choices that must not vary between attempts, such as the algorithm.
pub(super) fn policy_rng(floor_seed: u64) -> SimRng {
    SimRng::seed_from_u64(mix_seed_stream(floor_seed, 0))
}
