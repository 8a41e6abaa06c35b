//! Permutation Code
//!
//! Lehmer (factorial number system) code for orderings of the seven ranking
//! tags `1..=7`.

/// Number of tags in a ranking
pub const RANKING_LEN: usize = 7;

/// 7! distinct rankings
pub const NUM_PERMUTATIONS: usize = 5040;

/// Place values 6!, 5!, ..., 0!
const FACTORIALS: [usize; RANKING_LEN] = [720, 120, 24, 6, 2, 1, 1];

/// Encode a permutation of `1..=7` into `[0, 5040)`
///
/// For each position, count the still-unused tags smaller than the tag at
/// that position and weight the count by the position's factorial. Input
/// that is not a permutation of `1..=7` encodes as 0.
pub fn encode(ordering: &[usize]) -> usize {
    if ordering.len() != RANKING_LEN {
        return 0;
    }

    let mut used = [false; RANKING_LEN + 1];
    let mut index = 0;
    for (i, &tag) in ordering.iter().enumerate() {
        if tag == 0 || tag > RANKING_LEN || used[tag] {
            return 0;
        }
        let smaller_unused = (1..tag).filter(|&t| !used[t]).count();
        index += smaller_unused * FACTORIALS[i];
        used[tag] = true;
    }
    index
}

/// Decode an index back into its permutation of `1..=7`
///
/// Indices outside `[0, 5040)` wrap modulo 5040.
pub fn decode(index: usize) -> [usize; RANKING_LEN] {
    let mut remaining = index % NUM_PERMUTATIONS;
    let mut used = [false; RANKING_LEN + 1];
    let mut ordering = [0; RANKING_LEN];

    for (slot, &fact) in ordering.iter_mut().zip(FACTORIALS.iter()) {
        let rank = remaining / fact;
        remaining %= fact;

        if let Some(tag) = (1..=RANKING_LEN).filter(|&t| !used[t]).nth(rank) {
            *slot = tag;
            used[tag] = true;
        }
    }
    ordering
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identity_is_zero() {
        assert_eq!(encode(&[1, 2, 3, 4, 5, 6, 7]), 0);
        assert_eq!(decode(0), [1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_reverse_is_last() {
        assert_eq!(encode(&[7, 6, 5, 4, 3, 2, 1]), NUM_PERMUTATIONS - 1);
        assert_eq!(decode(NUM_PERMUTATIONS - 1), [7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_encode_is_bijection() {
        let mut seen = HashSet::new();
        for index in 0..NUM_PERMUTATIONS {
            let ordering = decode(index);
            assert_eq!(encode(&ordering), index);
            assert!(seen.insert(ordering));
        }
        assert_eq!(seen.len(), NUM_PERMUTATIONS);
    }

    #[test]
    fn test_invalid_input_is_zero() {
        assert_eq!(encode(&[1, 2, 3]), 0);
        assert_eq!(encode(&[1, 1, 2, 3, 4, 5, 6]), 0);
        assert_eq!(encode(&[0, 1, 2, 3, 4, 5, 6]), 0);
        assert_eq!(encode(&[8, 1, 2, 3, 4, 5, 6]), 0);
    }

    #[test]
    fn test_known_value() {
        // Swapping the last two tags is the smallest non-identity code
        assert_eq!(encode(&[1, 2, 3, 4, 5, 7, 6]), 1);
        assert_eq!(encode(&[2, 1, 3, 4, 5, 6, 7]), 720);
    }
}
