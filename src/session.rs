//! Generation-tagged state slot shared by both orchestrators.
//!
//! Every diagnosis attempt is stamped with a fresh [`Generation`] when it
//! starts. Later writes from that attempt only land if no newer attempt has
//! started since; otherwise they are dropped. The slot is published through
//! a `tokio::sync::watch` channel so presenters can follow each transition.

use tokio::sync::watch;

use crate::types::{Generation, Notice};

/// The state of a session together with the attempt that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<S> {
    /// Most recently started attempt.
    pub generation: Generation,
    pub state: S,
}

/// What a session action ended with, from the caller's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum RunResult<T> {
    /// The attempt ran to its terminal state and is now the current one.
    Completed(T),
    /// A newer attempt started while this one was in flight; its results
    /// were discarded.
    Superseded,
    /// The action was refused before any request was made.
    Rejected(Notice),
}

impl<T> RunResult<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            RunResult::Completed(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, RunResult::Superseded)
    }
}

/// Single-writer state slot with generation tagging.
#[derive(Debug)]
pub struct SessionCell<S> {
    tx: watch::Sender<Snapshot<S>>,
}

impl<S> SessionCell<S>
where
    S: Clone + Send + Sync,
{
    pub fn new(initial: S) -> Self {
        let (tx, _rx) = watch::channel(Snapshot {
            generation: Generation::default(),
            state: initial,
        });
        Self { tx }
    }

    /// Start a new attempt: bump the generation and install `state`.
    ///
    /// Allocation and the write happen under the same lock, so concurrent
    /// starts are totally ordered.
    pub fn begin(&self, state: S) -> Generation {
        let mut started = Generation::default();
        self.tx.send_modify(|snap| {
            snap.generation = snap.generation.next();
            snap.state = state;
            started = snap.generation;
        });
        started
    }

    /// Write `state` if `generation` is still current. Returns whether it
    /// was written.
    pub fn commit(&self, generation: Generation, state: S) -> bool {
        self.tx.send_if_modified(|snap| {
            if snap.generation != generation {
                return false;
            }
            snap.state = state;
            true
        })
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.tx.borrow().generation == generation
    }

    pub fn snapshot(&self) -> Snapshot<S> {
        self.tx.borrow().clone()
    }

    pub fn state(&self) -> S {
        self.tx.borrow().state.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<S>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_increments_generation() {
        let cell = SessionCell::new("idle");
        assert_eq!(cell.snapshot().generation, Generation(0));

        let g1 = cell.begin("working");
        let g2 = cell.begin("working again");
        assert_eq!(g1, Generation(1));
        assert_eq!(g2, Generation(2));
        assert_eq!(cell.state(), "working again");
    }

    #[test]
    fn test_stale_commit_is_dropped() {
        let cell = SessionCell::new(0u32);
        let old = cell.begin(1);
        let new = cell.begin(2);

        assert!(!cell.commit(old, 10));
        assert_eq!(cell.state(), 2);
        assert!(!cell.is_current(old));

        assert!(cell.commit(new, 20));
        assert_eq!(cell.state(), 20);
        assert!(cell.is_current(new));
    }

    #[tokio::test]
    async fn test_subscribers_see_commits() {
        let cell = SessionCell::new(String::from("idle"));
        let mut rx = cell.subscribe();

        let g = cell.begin("busy".to_string());
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().state, "busy");

        cell.commit(g, "done".to_string());
        rx.changed().await.unwrap();
        let snap = rx.borrow_and_update().clone();
        assert_eq!(snap.state, "done");
        assert_eq!(snap.generation, g);
    }

    #[tokio::test]
    async fn test_stale_commit_does_not_notify() {
        let cell = SessionCell::new(0u8);
        let old = cell.begin(1);
        let _new = cell.begin(2);
        let mut rx = cell.subscribe();

        cell.commit(old, 9);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_run_result_helpers() {
        let done: RunResult<u8> = RunResult::Completed(3);
        assert_eq!(done.completed(), Some(3));
        let stale: RunResult<u8> = RunResult::Superseded;
        assert!(stale.is_superseded());
        assert_eq!(stale.completed(), None);
    }
}
