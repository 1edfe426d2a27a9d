//! Maximum bipartite matching between statement lists
//!
//! Statements can only be paired when they are field-equivalent. A greedy
//! first-fit pairing produces false negatives whenever an early pick steals the
//! only partner of a later statement, so pairs are found with augmenting paths
//! (Kuhn's algorithm), which always reaches a maximum matching.

/// Result of matching the left statements against the right statements
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Matching {
    /// `left_to_right[i]` is the right index paired with left statement `i`
    pub(crate) left_to_right: Vec<Option<usize>>,
    /// `right_to_left[j]` is the left index paired with right statement `j`
    pub(crate) right_to_left: Vec<Option<usize>>,
}

impl Matching {
    /// Every statement on both sides has a partner
    pub(crate) fn is_perfect(&self) -> bool {
        self.left_to_right.iter().all(Option::is_some)
            && self.right_to_left.iter().all(Option::is_some)
    }

    pub(crate) fn unmatched_left(&self) -> impl Iterator<Item = usize> + '_ {
        unmatched(&self.left_to_right)
    }

    pub(crate) fn unmatched_right(&self) -> impl Iterator<Item = usize> + '_ {
        unmatched(&self.right_to_left)
    }
}

fn unmatched(pairs: &[Option<usize>]) -> impl Iterator<Item = usize> + '_ {
    pairs
        .iter()
        .enumerate()
        .filter(|(_, partner)| partner.is_none())
        .map(|(index, _)| index)
}

/// Compute a maximum matching.
///
/// `compatible[i][j]` says whether left statement `i` may pair with right
/// statement `j`; every row must have `right_len` entries.
pub(crate) fn maximum_matching(compatible: &[Vec<bool>], right_len: usize) -> Matching {
    let mut right_to_left: Vec<Option<usize>> = vec![None; right_len];

    for left in 0..compatible.len() {
        let mut visited = vec![false; right_len];
        try_augment(left, compatible, &mut visited, &mut right_to_left);
    }

    let mut left_to_right = vec![None; compatible.len()];
    for (right, partner) in right_to_left.iter().enumerate() {
        if let Some(left) = partner {
            left_to_right[*left] = Some(right);
        }
    }

    Matching {
        left_to_right,
        right_to_left,
    }
}

/// Find an augmenting path starting at `left`, re-pairing earlier matches if needed
fn try_augment(
    left: usize,
    compatible: &[Vec<bool>],
    visited: &mut [bool],
    right_to_left: &mut [Option<usize>],
) -> bool {
    for right in 0..right_to_left.len() {
        if !compatible[left][right] || visited[right] {
            continue;
        }
        visited[right] = true;

        let free = match right_to_left[right] {
            None => true,
            Some(current) => try_augment(current, compatible, visited, right_to_left),
        };
        if free {
            right_to_left[right] = Some(left);
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_matching() {
        let compatible = vec![vec![true, false], vec![false, true]];
        let matching = maximum_matching(&compatible, 2);
        assert!(matching.is_perfect());
        assert_eq!(matching.left_to_right, vec![Some(0), Some(1)]);
    }

    #[test]
    fn test_greedy_trap_is_resolved() {
        // Left 0 fits both; left 1 fits only right 0. First-fit would give
        // left 0 -> right 0 and strand left 1.
        let compatible = vec![vec![true, true], vec![true, false]];
        let matching = maximum_matching(&compatible, 2);
        assert!(matching.is_perfect());
        assert_eq!(matching.left_to_right, vec![Some(1), Some(0)]);
    }

    #[test]
    fn test_longer_augmenting_path() {
        let compatible = vec![
            vec![true, true, false],
            vec![true, false, false],
            vec![false, true, true],
        ];
        let matching = maximum_matching(&compatible, 3);
        assert!(matching.is_perfect());
        assert_eq!(matching.left_to_right[1], Some(0));
    }

    #[test]
    fn test_no_double_assignment() {
        // Both left statements only fit right 0.
        let compatible = vec![vec![true, false], vec![true, false]];
        let matching = maximum_matching(&compatible, 2);
        assert!(!matching.is_perfect());
        assert_eq!(matching.unmatched_left().count(), 1);
        assert_eq!(matching.unmatched_right().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_uneven_sides() {
        let compatible = vec![vec![true], vec![true]];
        let matching = maximum_matching(&compatible, 1);
        assert!(!matching.is_perfect());
        assert_eq!(matching.right_to_left, vec![Some(0)]);
        assert_eq!(matching.unmatched_left().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_empty() {
        let matching = maximum_matching(&[], 0);
        assert!(matching.is_perfect());
    }
}
