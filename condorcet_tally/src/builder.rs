pub use crate::config::*;
use crate::Poll;

/// A builder for setting up a poll.
///
/// ```
/// pub use condorcet_tally::builder::Builder;
/// pub use condorcet_tally::PollRules;
/// # use condorcet_tally::TallyError;
///
/// let poll = Builder::new(&PollRules::BYTES32_RULES)?
///     .candidates(&["Anna".to_string(), "Bob".to_string()])?
///     .build()?;
///
/// poll.submit_ballot(&"voter-1".into(), &[1, 0])?;
///
/// # Ok::<(), TallyError>(())
/// ```
pub struct Builder {
    pub(crate) _rules: PollRules,
    pub(crate) _candidates: Vec<Identifier>,
}

impl Builder {
    pub fn new(rules: &PollRules) -> Result<Builder, TallyError> {
        Ok(Builder {
            _rules: rules.clone(),
            _candidates: Vec::new(),
        })
    }

    /// Sets the candidates, in the order of their indices.
    pub fn candidates(self, cands: &[String]) -> Result<Builder, TallyError> {
        self.candidate_identifiers(
            &cands
                .iter()
                .map(|name| Identifier::from(name.as_str()))
                .collect::<Vec<Identifier>>(),
        )
    }

    /// Sets candidates with raw identifiers.
    pub fn candidate_identifiers(self, cands: &[Identifier]) -> Result<Builder, TallyError> {
        Ok(Builder {
            _rules: self._rules,
            _candidates: cands.to_vec(),
        })
    }

    /// Caps the number of ballots.
    pub fn ballot_capacity(self, capacity: u64) -> Result<Builder, TallyError> {
        Ok(Builder {
            _rules: PollRules {
                ballot_capacity: Some(capacity),
                ..self._rules
            },
            _candidates: self._candidates,
        })
    }

    /// Creates the poll. Fails if the candidates do not form a valid set.
    pub fn build(self) -> Result<Poll, TallyError> {
        Poll::new(&self._candidates, &self._rules)
    }
}
