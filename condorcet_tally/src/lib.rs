/*!
Pairwise tally of ranked ballots and Condorcet winner resolution.

A [`Poll`] is created once with a fixed list of candidates. Every voter then submits
one full ranking of the candidates. Each accepted ballot updates the pairwise matrix
and publishes an immutable [`StateSnapshot`]. The Condorcet winner (if any) is
computed from a snapshot with [`resolve_winner`].

```
use condorcet_tally::*;

let poll = initialize(&["Anna".into(), "Bob".into(), "Clara".into()])?;
poll.submit_ballot(&"voter-1".into(), &[0, 1, 2])?;
poll.submit_ballot(&"voter-2".into(), &[0, 2, 1])?;
let snapshot = poll.current_snapshot();
assert_eq!(resolve_winner(&snapshot), Outcome::Winner(0));
# Ok::<(), TallyError>(())
```
*/

mod audit;
pub mod builder;
mod config;
pub mod manual;
mod matrix;
mod publisher;
mod registry;
mod resolver;
mod validator;

use log::{info, warn};

use std::sync::{Arc, PoisonError, RwLock};

pub use crate::audit::{chain_digest, genesis_digest};
pub use crate::config::*;
pub use crate::matrix::PairwiseMatrix;
pub use crate::publisher::{StatePublisher, Subscription};
pub use crate::registry::CandidateRegistry;
pub use crate::resolver::{resolve_flat, resolve_winner};
pub use crate::validator::{validate_ballot, BallotEncoding, Ranking, VoterRecord};

// The only mutable state of a poll. Guarded by a single lock: one ballot is validated
// and applied at a time.
#[derive(Debug)]
struct TallyState {
    voters: VoterRecord,
    matrix: PairwiseMatrix,
    digest: String,
    closed: bool,
}

/// A running poll.
///
/// Ballots may be submitted from several threads: they are applied one at a time, in
/// the order in which they acquire the poll. Readers only see published snapshots.
#[derive(Debug)]
pub struct Poll {
    registry: CandidateRegistry,
    rules: PollRules,
    state: RwLock<TallyState>,
    publisher: StatePublisher,
    empty: Arc<StateSnapshot>,
}

/// Starts a poll with the default rules.
pub fn initialize(identifiers: &[Identifier]) -> TallyResult<Poll> {
    Poll::new(identifiers, &PollRules::DEFAULT_RULES)
}

impl Poll {
    pub fn new(identifiers: &[Identifier], rules: &PollRules) -> TallyResult<Poll> {
        let registry = CandidateRegistry::new(identifiers, rules)?;
        for c in registry.candidates() {
            info!("Candidate: {}: {}", c.index, c.identifier);
        }
        let matrix = PairwiseMatrix::new(registry.len());
        let digest = genesis_digest(identifiers);
        let empty = Arc::new(matrix.snapshot(digest.clone()));
        Ok(Poll {
            registry,
            rules: rules.clone(),
            state: RwLock::new(TallyState {
                voters: VoterRecord::new(),
                matrix,
                digest,
                closed: false,
            }),
            publisher: StatePublisher::new(),
            empty,
        })
    }

    pub fn registry(&self) -> &CandidateRegistry {
        &self.registry
    }

    pub fn rules(&self) -> &PollRules {
        &self.rules
    }

    pub fn num_candidates(&self) -> usize {
        self.registry.len()
    }

    /// The candidates, in registration order.
    pub fn list_candidates(&self) -> &[Candidate] {
        self.registry.candidates()
    }

    /// Submits a ranking: candidate indices, most preferred first.
    ///
    /// On success, the snapshot including this ballot is published and returned.
    /// On failure, nothing changed.
    pub fn submit_ballot(
        &self,
        voter: &VoterId,
        ranking: &[usize],
    ) -> TallyResult<Arc<StateSnapshot>> {
        self.submit(voter, ranking, BallotEncoding::Order)
    }

    /// Submits a ballot given as the rank position of each candidate.
    pub fn submit_ballot_positions(
        &self,
        voter: &VoterId,
        positions: &[usize],
    ) -> TallyResult<Arc<StateSnapshot>> {
        self.submit(voter, positions, BallotEncoding::Positions)
    }

    /// Translates candidate identifiers, most preferred first, into a ranking.
    pub fn ranking_from_identifiers(&self, identifiers: &[Identifier]) -> TallyResult<Vec<usize>> {
        self.registry.ranking_from_identifiers(identifiers)
    }

    fn submit(
        &self,
        voter: &VoterId,
        ballot: &[usize],
        encoding: BallotEncoding,
    ) -> TallyResult<Arc<StateSnapshot>> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let res = Self::check(
            &state,
            &self.rules,
            voter,
            ballot,
            encoding,
            self.num_candidates(),
        );
        let ranking = match res {
            Ok(r) => r,
            Err(e) => {
                warn!("submit_ballot: rejected ballot from {}: {}", voter, e);
                return Err(e);
            }
        };

        // Commit. The matrix only changes when the ballot fits, so it goes first.
        state.matrix.apply(&ranking, &self.rules)?;
        state.voters.insert(voter.clone());
        state.digest = chain_digest(&state.digest, voter, &ranking);
        let snapshot = Arc::new(state.matrix.snapshot(state.digest.clone()));
        // Published under the lock so that the history follows the acceptance order.
        self.publisher.publish(snapshot.clone());
        info!(
            "submit_ballot: accepted ballot #{} from {}",
            snapshot.sequence, voter
        );
        Ok(snapshot)
    }

    fn check(
        state: &TallyState,
        rules: &PollRules,
        voter: &VoterId,
        ballot: &[usize],
        encoding: BallotEncoding,
        num_candidates: usize,
    ) -> TallyResult<Ranking> {
        if state.closed {
            return PollClosedSnafu.fail();
        }
        let ranking = validate_ballot(&state.voters, voter, ballot, encoding, num_candidates)?;
        state.matrix.check_capacity(rules)?;
        Ok(ranking)
    }

    /// The latest snapshot, or the empty snapshot if no ballot was accepted yet.
    pub fn current_snapshot(&self) -> Arc<StateSnapshot> {
        self.publisher
            .latest()
            .unwrap_or_else(|| self.empty.clone())
    }

    /// The outcome of the latest snapshot.
    pub fn current_outcome(&self) -> Outcome {
        resolve_winner(&self.current_snapshot())
    }

    pub fn ballots_counted(&self) -> u64 {
        self.publisher.len() as u64
    }

    pub fn has_voted(&self, voter: &VoterId) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .voters
            .contains(voter)
    }

    /// Follows the snapshots, starting from the first accepted ballot.
    pub fn subscribe(&self) -> Subscription {
        self.publisher.subscribe()
    }

    /// All the snapshots published so far, in acceptance order.
    pub fn history(&self) -> Vec<Arc<StateSnapshot>> {
        self.publisher.history()
    }

    /// Stops accepting ballots. The subscriptions end after the last snapshot.
    pub fn close(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.closed {
            info!("close: poll closed after {} ballots", state.matrix.total());
        }
        state.closed = true;
        self.publisher.close();
    }

    pub fn is_closed(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .closed
    }
}
