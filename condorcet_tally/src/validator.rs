use std::collections::HashSet;

use log::debug;

use crate::config::*;

/// A full ranking of the candidates: `order()[p]` is the candidate at position `p`,
/// position 0 being the most preferred.
///
/// Invariant: the order is a permutation of `0..n`.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Ranking {
    order: Vec<usize>,
}

impl Ranking {
    /// Checks that `order` is a permutation of `0..num_candidates`.
    pub fn new(order: &[usize], num_candidates: usize) -> TallyResult<Ranking> {
        check_permutation(order, num_candidates)?;
        Ok(Ranking {
            order: order.to_vec(),
        })
    }

    /// Builds a ranking from the position given to each candidate:
    /// `positions[c]` is the rank of candidate `c`.
    pub fn from_positions(positions: &[usize], num_candidates: usize) -> TallyResult<Ranking> {
        check_permutation(positions, num_candidates)?;
        let mut order = vec![0; num_candidates];
        for (candidate, &pos) in positions.iter().enumerate() {
            order[pos] = candidate;
        }
        Ok(Ranking { order })
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// The inverse permutation: the rank position of every candidate.
    pub fn positions(&self) -> Vec<usize> {
        let mut positions = vec![0; self.order.len()];
        for (pos, &candidate) in self.order.iter().enumerate() {
            positions[candidate] = pos;
        }
        positions
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn check_permutation(seq: &[usize], num_candidates: usize) -> TallyResult<()> {
    if seq.len() != num_candidates {
        return InvalidRankingSnafu {
            problem: RankingProblem::WrongLength {
                expected: num_candidates,
                got: seq.len(),
            },
        }
        .fail();
    }
    let mut seen = vec![false; num_candidates];
    for &index in seq.iter() {
        match seen.get_mut(index) {
            None => {
                return InvalidRankingSnafu {
                    problem: RankingProblem::OutOfRange {
                        index,
                        num_candidates,
                    },
                }
                .fail();
            }
            Some(true) => {
                return InvalidRankingSnafu {
                    problem: RankingProblem::Repeated { index },
                }
                .fail();
            }
            Some(s) => {
                *s = true;
            }
        }
    }
    Ok(())
}

/// The voters who already cast a ballot. It only grows.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct VoterRecord {
    voters: HashSet<VoterId>,
}

impl VoterRecord {
    pub fn new() -> VoterRecord {
        VoterRecord::default()
    }

    pub fn contains(&self, voter: &VoterId) -> bool {
        self.voters.contains(voter)
    }

    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }

    pub(crate) fn insert(&mut self, voter: VoterId) {
        self.voters.insert(voter);
    }
}

/// The kind of ballot sent by the voter.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum BallotEncoding {
    /// Candidate indices, most preferred first.
    Order,
    /// The rank position of each candidate, in registry order.
    Positions,
}

/// Checks a ballot against the voter record. Nothing is modified here: the caller
/// commits the returned ranking.
///
/// The voter is checked first, then the ranking.
pub fn validate_ballot(
    voters: &VoterRecord,
    voter: &VoterId,
    ballot: &[usize],
    encoding: BallotEncoding,
    num_candidates: usize,
) -> TallyResult<Ranking> {
    if voters.contains(voter) {
        debug!("validate_ballot: voter {} already in the record", voter);
        return AlreadyVotedSnafu {
            voter: voter.clone(),
        }
        .fail();
    }
    let ranking = match encoding {
        BallotEncoding::Order => Ranking::new(ballot, num_candidates),
        BallotEncoding::Positions => Ranking::from_positions(ballot, num_candidates),
    }?;
    debug!(
        "validate_ballot: voter {} ballot {:?} -> order {:?}",
        voter,
        ballot,
        ranking.order()
    );
    Ok(ranking)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem(r: TallyResult<Ranking>) -> RankingProblem {
        match r {
            Err(TallyError::InvalidRanking { problem }) => problem,
            x => panic!("expected an invalid ranking, got {:?}", x),
        }
    }

    #[test]
    fn permutations_are_accepted() {
        let r = Ranking::new(&[2, 0, 1], 3).unwrap();
        assert_eq!(r.order(), &[2, 0, 1]);
        assert_eq!(r.positions(), vec![1, 2, 0]);
    }

    #[test]
    fn malformed_rankings() {
        assert_eq!(
            problem(Ranking::new(&[0, 0, 2], 3)),
            RankingProblem::Repeated { index: 0 }
        );
        assert_eq!(
            problem(Ranking::new(&[0, 3, 1], 3)),
            RankingProblem::OutOfRange {
                index: 3,
                num_candidates: 3
            }
        );
        assert_eq!(
            problem(Ranking::new(&[0, 1], 3)),
            RankingProblem::WrongLength {
                expected: 3,
                got: 2
            }
        );
        assert_eq!(
            problem(Ranking::new(&[0, 1, 2, 3], 3)),
            RankingProblem::WrongLength {
                expected: 3,
                got: 4
            }
        );
    }

    #[test]
    fn positions_are_inverted() {
        // Candidate 0 ranked third, candidate 1 first, candidate 2 second.
        let r = Ranking::from_positions(&[2, 0, 1], 3).unwrap();
        assert_eq!(r.order(), &[1, 2, 0]);
        assert!(Ranking::from_positions(&[1, 1, 0], 3).is_err());
    }

    #[test]
    fn voter_checked_before_ranking() {
        let mut voters = VoterRecord::new();
        voters.insert("v1".into());
        // Both the voter and the ranking are wrong: the voter wins.
        let res = validate_ballot(&voters, &"v1".into(), &[0, 0], BallotEncoding::Order, 2);
        assert_eq!(
            res,
            Err(TallyError::AlreadyVoted {
                voter: "v1".into()
            })
        );
        let res = validate_ballot(&voters, &"v2".into(), &[1, 0], BallotEncoding::Order, 2);
        assert_eq!(res.map(|r| r.order().to_vec()), Ok(vec![1, 0]));
        // Validation alone does not record the voter.
        assert!(!voters.contains(&"v2".into()));
        assert_eq!(voters.len(), 1);
    }
}
