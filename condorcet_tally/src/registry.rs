use std::collections::HashMap;

use log::debug;

use crate::config::*;

/// The fixed, ordered list of candidates of a poll.
///
/// There is no way to add, remove or rename a candidate once the registry is built.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CandidateRegistry {
    candidates: Vec<Candidate>,
    by_identifier: HashMap<Identifier, usize>,
}

impl CandidateRegistry {
    /// Registers the candidates in the given order.
    ///
    /// Fails with `InvalidCandidateSet` if there are fewer than 2 candidates, if an
    /// identifier is empty, duplicated or longer than the rules allow.
    pub fn new(identifiers: &[Identifier], rules: &PollRules) -> TallyResult<CandidateRegistry> {
        if identifiers.len() < 2 {
            return InvalidCandidateSetSnafu {
                problem: CandidateSetProblem::TooFewCandidates {
                    count: identifiers.len(),
                },
            }
            .fail();
        }

        let mut by_identifier: HashMap<Identifier, usize> = HashMap::new();
        let mut candidates: Vec<Candidate> = Vec::with_capacity(identifiers.len());
        for (index, identifier) in identifiers.iter().enumerate() {
            if identifier.is_empty() {
                return InvalidCandidateSetSnafu {
                    problem: CandidateSetProblem::EmptyIdentifier { index },
                }
                .fail();
            }
            if let Some(max) = rules.max_identifier_len {
                if identifier.len() > max {
                    return InvalidCandidateSetSnafu {
                        problem: CandidateSetProblem::IdentifierTooLong {
                            identifier: identifier.clone(),
                            max,
                        },
                    }
                    .fail();
                }
            }
            if by_identifier.insert(identifier.clone(), index).is_some() {
                return InvalidCandidateSetSnafu {
                    problem: CandidateSetProblem::Duplicate {
                        identifier: identifier.clone(),
                    },
                }
                .fail();
            }
            candidates.push(Candidate {
                index,
                identifier: identifier.clone(),
            });
        }
        debug!("CandidateRegistry::new: {:?}", candidates);
        Ok(CandidateRegistry {
            candidates,
            by_identifier,
        })
    }

    /// The number of candidates. Always at least 2.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// The candidates, in registration order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn identifier(&self, index: usize) -> TallyResult<&Identifier> {
        self.candidates
            .get(index)
            .map(|c| &c.identifier)
            .ok_or_else(|| TallyError::UnknownCandidate {
                candidate: format!("#{}", index),
            })
    }

    pub fn index_of(&self, identifier: &Identifier) -> TallyResult<usize> {
        self.by_identifier
            .get(identifier)
            .cloned()
            .ok_or_else(|| TallyError::UnknownCandidate {
                candidate: identifier.to_string(),
            })
    }

    /// Translates a most-preferred-first list of identifiers into candidate indices.
    ///
    /// Only the names are checked here. Whether the result is a full ranking is up
    /// to the validator.
    pub fn ranking_from_identifiers(&self, identifiers: &[Identifier]) -> TallyResult<Vec<usize>> {
        identifiers.iter().map(|id| self.index_of(id)).collect()
    }
}
