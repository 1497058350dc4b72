pub mod drill;
pub mod init;
pub mod matching;
pub mod missed;
pub mod stats;
pub mod validate;

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Seeded RNG when a seed is given, otherwise one seeded from the OS.
pub(crate) fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
