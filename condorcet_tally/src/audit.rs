//! Digest chain over the accepted ballots.
//!
//! Every snapshot carries a SHA-256 digest of the previous digest, the voter and the
//! ranking. Replaying the same ballots in the same order reproduces the same digests.

use std::fmt::Write;

use crate::config::{Identifier, VoterId};
use crate::validator::Ranking;

fn to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        // Writing to a String does not fail.
        let _ = write!(s, "{:02x}", b);
    }
    s
}

/// The digest of a poll before any ballot: it only depends on the candidates.
pub fn genesis_digest(identifiers: &[Identifier]) -> String {
    let encoded: Vec<String> = identifiers.iter().map(|id| to_hex(id.as_bytes())).collect();
    sha256::digest(format!("condorcet-poll:{}", encoded.join(",")))
}

/// The digest after folding one more ballot.
pub fn chain_digest(previous: &str, voter: &VoterId, ranking: &Ranking) -> String {
    let order: Vec<String> = ranking.order().iter().map(|c| c.to_string()).collect();
    sha256::digest(format!(
        "{}:{}:{}",
        previous,
        to_hex(voter.as_bytes()),
        order.join(",")
    ))
}
