//! Random sampling and think-time primitives shared by the scenario engines

use rand::Rng;
use std::time::Duration;

use stampede_config::domains::scenario::SecondsRange;

/// Reaction names the platform accepts, in pick order
pub const REACTION_NAMES: [&str; 7] = [
    "react_thumbs_up",
    "react_sparkling_heart",
    "react_partying_face",
    "react_grinning_face_with_smiling_eyes",
    "react_hugging_face",
    "react_clapping_hands",
    "react_fire",
];

/// Uniform sample from the inclusive range [min, max]
pub fn random_number(min: u64, max: u64) -> u64 {
    if min >= max {
        return min;
    }
    rand::thread_rng().gen_range(min..=max)
}

/// Uniform index into a non-empty slice of the given length
pub fn random_index(len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    rand::thread_rng().gen_range(0..len)
}

/// Sleep a uniform random number of whole seconds from the range
pub async fn think(range: SecondsRange) {
    let secs = random_number(range.min, range.max);
    if secs > 0 {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }
}

/// Fixed-length pause
pub async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

/// Random lowercase ascii text of the given length
pub fn random_text(length: u64) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
        .collect()
}
