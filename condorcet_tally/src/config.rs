// ********* Input data structures ***********

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// The opaque identifier of a candidate.
///
/// Identifiers are arbitrary bytes. They are displayed as (lossy) UTF-8, which is
/// what most polls use in practice.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct Identifier(Vec<u8>);

impl Identifier {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Identifier {
        Identifier(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Identifier {
        Identifier(s.as_bytes().to_vec())
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Identifier {
        Identifier(s.into_bytes())
    }
}

impl From<Vec<u8>> for Identifier {
    fn from(b: Vec<u8>) -> Identifier {
        Identifier(b)
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// The opaque identifier of a voter, as provided by the identity layer.
///
/// The tally never interprets it, it only checks that it was not used before.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct VoterId(Vec<u8>);

impl VoterId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> VoterId {
        VoterId(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for VoterId {
    fn from(s: &str) -> VoterId {
        VoterId(s.as_bytes().to_vec())
    }
}

impl From<String> for VoterId {
    fn from(s: String) -> VoterId {
        VoterId(s.into_bytes())
    }
}

impl From<Vec<u8>> for VoterId {
    fn from(b: Vec<u8>) -> VoterId {
        VoterId(b)
    }
}

impl Display for VoterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// A registered candidate. The index is its position in the registry.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Candidate {
    pub index: usize,
    pub identifier: Identifier,
}

// ******** Output data structures *********

/// The result of resolving a snapshot.
///
/// `NoWinner` is a regular outcome: the ballots form a majority cycle, or
/// some pairs are tied.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Winner(usize),
    NoWinner,
}

impl Outcome {
    /// The index of the winning candidate, if any.
    pub fn winner(&self) -> Option<usize> {
        match self {
            Outcome::Winner(idx) => Some(*idx),
            Outcome::NoWinner => None,
        }
    }
}

/// An immutable capture of the pairwise matrix after some number of accepted ballots.
///
/// The matrix is stored flattened in row-major order: `cell[i][j]` is at
/// `matrix[i * num_candidates + j]` and counts the ballots ranking `i` above `j`.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// 1-based acceptance index of the last ballot folded in. Zero for the empty poll.
    pub sequence: u64,
    #[serde(rename = "numCandidates")]
    pub num_candidates: usize,
    #[serde(rename = "stateMatrix")]
    pub matrix: Vec<u64>,
    /// Hex digest chaining all the accepted ballots so far.
    /// Empty for snapshots rebuilt from a bare matrix.
    pub digest: String,
}

impl StateSnapshot {
    /// Rebuilds a snapshot from its transmitted shape, checking the tally invariants.
    pub fn from_flat(num_candidates: usize, matrix: Vec<u64>) -> Result<StateSnapshot, TallyError> {
        let n = num_candidates;
        if n < 2 {
            return InvalidSnapshotSnafu {
                reason: format!("{} candidates, at least 2 expected", n),
            }
            .fail();
        }
        let expected_len = n.checked_mul(n).unwrap_or(usize::MAX);
        if matrix.len() != expected_len {
            return InvalidSnapshotSnafu {
                reason: format!("matrix has {} cells, expected {}", matrix.len(), expected_len),
            }
            .fail();
        }
        let total = matrix[1].checked_add(matrix[n]);
        for i in 0..n {
            if matrix[i * n + i] != 0 {
                return InvalidSnapshotSnafu {
                    reason: format!("diagonal cell {} is not zero", i),
                }
                .fail();
            }
            for j in (i + 1)..n {
                let pair = matrix[i * n + j].checked_add(matrix[j * n + i]);
                if pair.is_none() || pair != total {
                    return InvalidSnapshotSnafu {
                        reason: format!(
                            "pair ({}, {}) does not add up to the {:?} ballots of pair (0, 1)",
                            i, j, total
                        ),
                    }
                    .fail();
                }
            }
        }
        Ok(StateSnapshot {
            // Checked in the loop above.
            sequence: total.unwrap_or_default(),
            num_candidates: n,
            matrix,
            digest: String::new(),
        })
    }

    /// The number of ballots reflected in this snapshot.
    pub fn ballots_counted(&self) -> u64 {
        self.sequence
    }

    /// The number of ballots ranking `i` above `j`.
    pub fn cell(&self, i: usize, j: usize) -> Result<u64, TallyError> {
        let n = self.num_candidates;
        for idx in [i, j] {
            if idx >= n {
                return UnknownCandidateSnafu {
                    candidate: format!("#{}", idx),
                }
                .fail();
            }
        }
        Ok(self.matrix[i * n + j])
    }

    /// How many more ballots prefer `i` over `j` than the reverse.
    pub fn margin(&self, i: usize, j: usize) -> Result<i128, TallyError> {
        let ij = self.cell(i, j)?;
        let ji = self.cell(j, i)?;
        Ok(ij as i128 - ji as i128)
    }

    /// The matrix as rows, mostly for display.
    pub fn rows(&self) -> Vec<Vec<u64>> {
        self.matrix
            .chunks(self.num_candidates.max(1))
            .map(|r| r.to_vec())
            .collect()
    }
}

/// Why a set of candidates cannot start a poll.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum CandidateSetProblem {
    TooFewCandidates { count: usize },
    Duplicate { identifier: Identifier },
    EmptyIdentifier { index: usize },
    IdentifierTooLong { identifier: Identifier, max: usize },
}

impl Display for CandidateSetProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateSetProblem::TooFewCandidates { count } => {
                write!(f, "at least 2 candidates are required, got {}", count)
            }
            CandidateSetProblem::Duplicate { identifier } => {
                write!(f, "candidate {:?} is registered twice", identifier.to_string())
            }
            CandidateSetProblem::EmptyIdentifier { index } => {
                write!(f, "candidate #{} has an empty identifier", index)
            }
            CandidateSetProblem::IdentifierTooLong { identifier, max } => write!(
                f,
                "candidate {:?} is {} bytes long, the limit is {}",
                identifier.to_string(),
                identifier.len(),
                max
            ),
        }
    }
}

/// Why a ranking is not a permutation of the candidates.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum RankingProblem {
    WrongLength { expected: usize, got: usize },
    OutOfRange { index: usize, num_candidates: usize },
    Repeated { index: usize },
}

impl Display for RankingProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankingProblem::WrongLength { expected, got } => {
                write!(f, "expected {} entries, got {}", expected, got)
            }
            RankingProblem::OutOfRange {
                index,
                num_candidates,
            } => write!(
                f,
                "index {} is out of range for {} candidates",
                index, num_candidates
            ),
            RankingProblem::Repeated { index } => {
                write!(f, "index {} appears more than once", index)
            }
        }
    }
}

/// Errors returned by the tally.
///
/// All the ballot rejections are detected before any state is touched: a rejected
/// ballot leaves the poll exactly as it was.
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TallyError {
    #[snafu(display("invalid candidate set: {problem}"))]
    InvalidCandidateSet { problem: CandidateSetProblem },

    #[snafu(display("voter {voter} has already voted"))]
    AlreadyVoted { voter: VoterId },

    #[snafu(display("invalid ranking: {problem}"))]
    InvalidRanking { problem: RankingProblem },

    #[snafu(display("unknown candidate {candidate}"))]
    UnknownCandidate { candidate: String },

    #[snafu(display("the poll cannot count more than {limit} ballots"))]
    CapacityExceeded { limit: u64 },

    #[snafu(display("the poll is closed"))]
    PollClosed,

    #[snafu(display("invalid snapshot: {reason}"))]
    InvalidSnapshot { reason: String },
}

pub type TallyResult<T> = Result<T, TallyError>;

// ********* Configuration **********

/// Limits applied to a poll. Both are disabled by default.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PollRules {
    /// Maximum length of a candidate identifier, in bytes.
    pub max_identifier_len: Option<usize>,
    /// Maximum number of ballots the poll accepts.
    pub ballot_capacity: Option<u64>,
}

impl PollRules {
    pub const DEFAULT_RULES: PollRules = PollRules {
        max_identifier_len: None,
        ballot_capacity: None,
    };

    /// Identifiers must fit in a fixed 32-byte slot.
    pub const BYTES32_RULES: PollRules = PollRules {
        max_identifier_len: Some(32),
        ballot_capacity: None,
    };
}

impl Default for PollRules {
    fn default() -> Self {
        PollRules::DEFAULT_RULES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_flat_accepts_consistent_matrix() {
        // Matrix from the three-ballot cycle A>B>C, B>C>A, C>A>B.
        let s = StateSnapshot::from_flat(3, vec![0, 2, 1, 1, 0, 2, 2, 1, 0]).unwrap();
        assert_eq!(s.ballots_counted(), 3);
        assert_eq!(s.cell(0, 1), Ok(2));
        assert_eq!(s.cell(2, 0), Ok(2));
        assert_eq!(s.margin(0, 2), Ok(-1));
        assert_eq!(s.rows(), vec![vec![0, 2, 1], vec![1, 0, 2], vec![2, 1, 0]]);
        assert!(s.digest.is_empty());
    }

    #[test]
    fn from_flat_rejects_broken_matrices() {
        let wrong_len = StateSnapshot::from_flat(2, vec![0, 1, 0]);
        assert!(matches!(wrong_len, Err(TallyError::InvalidSnapshot { .. })));

        let diagonal = StateSnapshot::from_flat(2, vec![1, 1, 0, 0]);
        assert!(matches!(diagonal, Err(TallyError::InvalidSnapshot { .. })));

        // cell[0][2] + cell[2][0] = 2 while cell[0][1] + cell[1][0] = 3
        let not_conserved = StateSnapshot::from_flat(3, vec![0, 2, 1, 1, 0, 2, 1, 1, 0]);
        assert!(matches!(
            not_conserved,
            Err(TallyError::InvalidSnapshot { .. })
        ));

        let single = StateSnapshot::from_flat(1, vec![0]);
        assert!(matches!(single, Err(TallyError::InvalidSnapshot { .. })));
    }

    #[test]
    fn cell_out_of_range() {
        let s = StateSnapshot::from_flat(2, vec![0, 3, 0, 0]).unwrap();
        assert_eq!(
            s.cell(0, 2),
            Err(TallyError::UnknownCandidate {
                candidate: "#2".to_string()
            })
        );
    }

    #[test]
    fn error_messages() {
        let e = TallyError::InvalidRanking {
            problem: RankingProblem::Repeated { index: 0 },
        };
        assert_eq!(
            e.to_string(),
            "invalid ranking: index 0 appears more than once"
        );
        let e = TallyError::AlreadyVoted {
            voter: VoterId::from("v1"),
        };
        assert_eq!(e.to_string(), "voter v1 has already voted");
    }

    #[test]
    fn outcome_winner() {
        assert_eq!(Outcome::Winner(2).winner(), Some(2));
        assert_eq!(Outcome::NoWinner.winner(), None);
    }
}
