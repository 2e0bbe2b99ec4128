use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Creates a random number generator. Given a seed the generated
/// sequence is reproducible, which is what tests and previews want.
pub fn create_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Random display color on the form `#rrggbb`
pub fn create_random_color_hex<R: Rng>(rng: &mut R) -> String {
    format!("#{:06x}", rng.gen_range(0..=0xFF_FF_FFu32))
}
