use log::debug;

use crate::config::*;
use crate::validator::Ranking;

/// The running head-to-head tally.
///
/// `cells[i * n + j]` counts the ballots ranking `i` above `j`.
///
/// Invariants:
/// - the diagonal is zero
/// - for every `i != j`, `cell[i][j] + cell[j][i] == total`
/// - counts never decrease
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PairwiseMatrix {
    num_candidates: usize,
    cells: Vec<u64>,
    total: u64,
}

impl PairwiseMatrix {
    pub fn new(num_candidates: usize) -> PairwiseMatrix {
        PairwiseMatrix {
            num_candidates,
            cells: vec![0; num_candidates * num_candidates],
            total: 0,
        }
    }

    pub fn num_candidates(&self) -> usize {
        self.num_candidates
    }

    /// The number of ballots folded in so far.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn cells(&self) -> &[u64] {
        &self.cells
    }

    /// Fails if one more ballot would go past the configured capacity or overflow
    /// the counters.
    ///
    /// No cell can be larger than the total, so checking the total is enough.
    pub fn check_capacity(&self, rules: &PollRules) -> TallyResult<()> {
        if self.total.checked_add(1).is_none() {
            return CapacityExceededSnafu { limit: u64::MAX }.fail();
        }
        if let Some(limit) = rules.ballot_capacity {
            if self.total >= limit {
                return CapacityExceededSnafu { limit }.fail();
            }
        }
        Ok(())
    }

    /// Folds one ranking into the tally.
    ///
    /// The ranking is inverted once, then every ordered pair is compared by position.
    /// Nothing changes when the ranking does not match the candidates or when the
    /// rules do not allow one more ballot.
    pub fn apply(&mut self, ranking: &Ranking, rules: &PollRules) -> TallyResult<()> {
        let n = self.num_candidates;
        if ranking.len() != n {
            return InvalidRankingSnafu {
                problem: RankingProblem::WrongLength {
                    expected: n,
                    got: ranking.len(),
                },
            }
            .fail();
        }
        self.check_capacity(rules)?;
        let positions = ranking.positions();
        for i in 0..n {
            for j in 0..n {
                if i != j && positions[i] < positions[j] {
                    self.cells[i * n + j] += 1;
                }
            }
        }
        self.total += 1;
        debug!(
            "PairwiseMatrix::apply: order {:?} total {} cells {:?}",
            ranking.order(),
            self.total,
            self.cells
        );
        Ok(())
    }

    pub fn snapshot(&self, digest: String) -> StateSnapshot {
        StateSnapshot {
            sequence: self.total,
            num_candidates: self.num_candidates,
            matrix: self.cells.clone(),
            digest,
        }
    }
}
