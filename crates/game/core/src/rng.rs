//! Dice and percentage rolls on top of any [`rand::Rng`].
//!
//! The engine takes its generator by reference so callers decide between a
//! seeded generator (tests, replays) and an entropy-seeded one.

use rand::Rng;

/// Rolls a die with `sides` faces (1..=sides). A zero-sided die rolls 0.
pub fn roll_die(rng: &mut (impl Rng + ?Sized), sides: u32) -> u32 {
    if sides == 0 {
        return 0;
    }
    rng.gen_range(1..=sides)
}

/// True with probability `chance` percent.
pub fn roll_percent(rng: &mut (impl Rng + ?Sized), chance: u32) -> bool {
    match chance {
        0 => false,
        100.. => true,
        _ => rng.gen_range(0..100) < chance,
    }
}
