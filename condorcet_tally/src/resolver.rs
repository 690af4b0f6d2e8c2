use log::debug;

use crate::config::*;

/// Finds the Condorcet winner of a snapshot.
///
/// Candidate `i` wins when `cell[i][j] > cell[j][i]` for every other candidate `j`.
/// A tie against any opponent disqualifies. At most one candidate can satisfy the
/// condition, so the first one found is returned.
///
/// This function only reads the snapshot: it can be called on any snapshot, including
/// old ones, and always returns the same outcome for the same matrix.
pub fn resolve_winner(snapshot: &StateSnapshot) -> Outcome {
    resolve_flat(snapshot.num_candidates, &snapshot.matrix)
}

/// Same as [`resolve_winner`], on the transmitted shape of a snapshot.
///
/// A matrix that does not have `n * n` cells has no winner.
pub fn resolve_flat(num_candidates: usize, matrix: &[u64]) -> Outcome {
    let n = num_candidates;
    if n.checked_mul(n) != Some(matrix.len()) {
        debug!(
            "resolve_flat: {} cells for {} candidates, no winner",
            matrix.len(),
            n
        );
        return Outcome::NoWinner;
    }
    for i in 0..n {
        let beats_everyone = (0..n)
            .filter(|&j| j != i)
            .all(|j| matrix[i * n + j] > matrix[j * n + i]);
        if beats_everyone {
            debug!("resolve_flat: candidate {} beats all the others", i);
            return Outcome::Winner(i);
        }
    }
    debug!("resolve_flat: no candidate beats all the others");
    Outcome::NoWinner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_winner() {
        // B beats A 2-1 and C 3-0, A beats C 2-1.
        let s = StateSnapshot::from_flat(3, vec![0, 1, 2, 2, 0, 3, 1, 0, 0]).unwrap();
        assert_eq!(resolve_winner(&s), Outcome::Winner(1));
    }

    #[test]
    fn cycle_has_no_winner() {
        let s = StateSnapshot::from_flat(3, vec![0, 2, 1, 1, 0, 2, 2, 1, 0]).unwrap();
        assert_eq!(resolve_winner(&s), Outcome::NoWinner);
    }

    #[test]
    fn ties_disqualify() {
        // A and B tied 1-1, both beat C.
        let s = StateSnapshot::from_flat(3, vec![0, 1, 2, 1, 0, 2, 0, 0, 0]).unwrap();
        assert_eq!(resolve_winner(&s), Outcome::NoWinner);
        // Empty poll: everything is tied.
        assert_eq!(resolve_flat(2, &[0, 0, 0, 0]), Outcome::NoWinner);
    }

    #[test]
    fn pure_and_repeatable() {
        let s = StateSnapshot::from_flat(2, vec![0, 3, 0, 0]).unwrap();
        let before = s.clone();
        let first = resolve_winner(&s);
        assert_eq!(first, Outcome::Winner(0));
        assert_eq!(resolve_winner(&s), first);
        assert_eq!(s, before);
    }

    #[test]
    fn malformed_matrix() {
        assert_eq!(resolve_flat(3, &[0, 1, 0, 0]), Outcome::NoWinner);
    }

    #[test]
    fn at_most_one_winner() {
        // Every matrix built from 3 ballots over 3 candidates, from all 6 permutations.
        let perms: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        for a in perms.iter() {
            for b in perms.iter() {
                for c in perms.iter() {
                    let mut m = vec![0u64; 9];
                    for p in [a, b, c] {
                        for x in 0..3 {
                            for y in (x + 1)..3 {
                                m[p[x] * 3 + p[y]] += 1;
                            }
                        }
                    }
                    let winners = (0..3)
                        .filter(|&i| {
                            (0..3)
                                .filter(|&j| j != i)
                                .all(|j| m[i * 3 + j] > m[j * 3 + i])
                        })
                        .count();
                    assert!(winners <= 1);
                    let expected = if winners == 1 { "winner" } else { "none" };
                    let got = match resolve_flat(3, &m) {
                        Outcome::Winner(_) => "winner",
                        Outcome::NoWinner => "none",
                    };
                    assert_eq!(expected, got);
                }
            }
        }
    }
}
