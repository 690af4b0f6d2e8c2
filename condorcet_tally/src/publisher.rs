//! Publication of the state snapshots.
//!
//! The publisher keeps the full history of snapshots, in acceptance order. A
//! subscription always starts from the first snapshot, however late it attaches,
//! and then follows new snapshots as they are published.

use std::sync::{Arc, Condvar, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use log::debug;

use crate::config::StateSnapshot;

#[derive(Debug, Default)]
struct Signal {
    published: usize,
    closed: bool,
}

#[derive(Debug, Default)]
struct Shared {
    history: RwLock<Vec<Arc<StateSnapshot>>>,
    // Mirrors the history length, for the subscribers waiting on `changed`.
    signal: Mutex<Signal>,
    changed: Condvar,
}

impl Shared {
    fn get(&self, idx: usize) -> Option<Arc<StateSnapshot>> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(idx)
            .cloned()
    }
}

/// Append-only log of snapshots with replaying subscribers.
#[derive(Debug, Clone, Default)]
pub struct StatePublisher {
    shared: Arc<Shared>,
}

impl StatePublisher {
    pub fn new() -> StatePublisher {
        StatePublisher::default()
    }

    /// Appends a snapshot and wakes up the waiting subscribers.
    ///
    /// Callers serialize the calls: the history order is the call order.
    pub(crate) fn publish(&self, snapshot: Arc<StateSnapshot>) {
        let published = {
            let mut history = self
                .shared
                .history
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            history.push(snapshot);
            history.len()
        };
        let mut signal = self
            .shared
            .signal
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        signal.published = signal.published.max(published);
        self.shared.changed.notify_all();
        debug!("StatePublisher::publish: {} snapshots", published);
    }

    /// Ends all the subscriptions once they have replayed the history.
    pub fn close(&self) {
        let mut signal = self
            .shared
            .signal
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        signal.closed = true;
        self.shared.changed.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.shared
            .signal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed
    }

    pub fn len(&self) -> usize {
        self.shared
            .history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn latest(&self) -> Option<Arc<StateSnapshot>> {
        self.shared
            .history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// All the snapshots published so far.
    pub fn history(&self) -> Vec<Arc<StateSnapshot>> {
        self.shared
            .history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            shared: self.shared.clone(),
            cursor: 0,
        }
    }
}

/// A replayable sequence of snapshots.
///
/// Iterating blocks until the next snapshot is published. The iteration only
/// ends when the publisher is closed and every snapshot has been returned.
#[derive(Debug, Clone)]
pub struct Subscription {
    shared: Arc<Shared>,
    cursor: usize,
}

impl Subscription {
    /// The next snapshot if it is already published.
    pub fn try_next(&mut self) -> Option<Arc<StateSnapshot>> {
        let res = self.shared.get(self.cursor);
        if res.is_some() {
            self.cursor += 1;
        }
        res
    }

    /// Waits at most `timeout` for the next snapshot.
    pub fn next_timeout(&mut self, timeout: Duration) -> Option<Arc<StateSnapshot>> {
        let deadline = Instant::now() + timeout;
        self.wait_next(Some(deadline))
    }

    /// Starts over from the first snapshot.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// How many snapshots were returned since the start (or the last rewind).
    pub fn position(&self) -> usize {
        self.cursor
    }

    fn wait_next(&mut self, deadline: Option<Instant>) -> Option<Arc<StateSnapshot>> {
        let mut signal = self
            .shared
            .signal
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while signal.published <= self.cursor && !signal.closed {
            signal = match deadline {
                None => self
                    .shared
                    .changed
                    .wait(signal)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(d) => {
                    let now = Instant::now();
                    if now >= d {
                        return None;
                    }
                    self.shared
                        .changed
                        .wait_timeout(signal, d - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
        drop(signal);
        // Either published, or closed with possibly nothing left.
        self.try_next()
    }
}

impl Iterator for Subscription {
    type Item = Arc<StateSnapshot>;

    fn next(&mut self) -> Option<Arc<StateSnapshot>> {
        self.wait_next(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn snap(sequence: u64) -> Arc<StateSnapshot> {
        Arc::new(StateSnapshot {
            sequence,
            num_candidates: 2,
            matrix: vec![0, sequence, 0, 0],
            digest: format!("d{}", sequence),
        })
    }

    #[test]
    fn late_subscribers_replay_everything() {
        let p = StatePublisher::new();
        p.publish(snap(1));
        p.publish(snap(2));
        let mut sub = p.subscribe();
        p.publish(snap(3));
        let seqs: Vec<u64> = std::iter::from_fn(|| sub.try_next())
            .map(|s| s.sequence)
            .collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(sub.position(), 3);
        assert!(sub.try_next().is_none());

        sub.rewind();
        assert_eq!(sub.try_next().map(|s| s.sequence), Some(1));
    }

    #[test]
    fn closed_publisher_ends_iteration() {
        let p = StatePublisher::new();
        p.publish(snap(1));
        p.close();
        let all: Vec<u64> = p.subscribe().map(|s| s.sequence).collect();
        assert_eq!(all, vec![1]);
        assert!(p.is_closed());
    }

    #[test]
    fn timeout_without_snapshot() {
        let p = StatePublisher::new();
        let mut sub = p.subscribe();
        assert!(sub.next_timeout(Duration::from_millis(10)).is_none());
    }

    #[test]
    fn blocking_subscriber_follows_publisher() {
        let p = StatePublisher::new();
        let sub = p.subscribe();
        let reader = thread::spawn(move || sub.map(|s| s.sequence).collect::<Vec<u64>>());
        for i in 1..=5 {
            p.publish(snap(i));
        }
        p.close();
        assert_eq!(reader.join().unwrap(), vec![1, 2, 3, 4, 5]);
        assert_eq!(p.latest().map(|s| s.sequence), Some(5));
        assert_eq!(p.history().len(), 5);
    }

    #[test]
    fn concurrent_publishers_never_lose_the_count() {
        let p = StatePublisher::new();
        thread::scope(|scope| {
            for t in 0..4 {
                let p = &p;
                scope.spawn(move || {
                    for k in 0..50 {
                        p.publish(snap(t * 50 + k));
                    }
                });
            }
        });
        assert_eq!(p.len(), 200);
        assert_eq!(p.shared.signal.lock().unwrap().published, 200);
        // Waiting subscribers see every snapshot without a close.
        let mut sub = p.subscribe();
        for _ in 0..200 {
            assert!(sub.next_timeout(Duration::from_millis(100)).is_some());
        }
        assert_eq!(sub.position(), 200);
        assert!(sub.next_timeout(Duration::from_millis(10)).is_none());
    }
}
