use rand::Rng;

/// Durstenfeld shuffle: walk from the last index down to 1 and swap each slot
/// with a uniformly chosen slot in `[0, i]`.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}
