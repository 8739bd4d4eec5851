//! Ownership of the per-submit streaming socket.
//!
//! A [`Session`] holds at most one open socket. Replacing it closes the
//! previous socket before the next one is opened, as a single operation, so
//! two sockets never feed the same output. Every socket gets a fresh
//! [`SessionId`]; events tagged with an id other than
//! [`Session::current`] belong to a replaced socket and are dropped.

use core::future::Future;

/// Identifies one opened socket for the lifetime of a [`Session`].
pub type SessionId = u64;

/// A socket that can be shut down by its owner.
pub trait SocketHandle {
    /// Closes the socket and waits until its reader has stopped.
    fn close(self) -> impl Future<Output = ()> + Send;
}

#[derive(Debug)]
pub struct Session<S> {
    active: Option<(SessionId, S)>,
    next_id: SessionId,
}

impl<S> Default for Session<S> {
    fn default() -> Self {
        Self {
            active: None,
            next_id: 1,
        }
    }
}

impl<S: SocketHandle> Session<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<SessionId> {
        self.active.as_ref().map(|(id, _)| *id)
    }

    pub fn is_current(&self, id: SessionId) -> bool {
        self.current() == Some(id)
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    /// Closes the open socket, if any, then opens a new one with `open`.
    ///
    /// The previous socket is closed even when opening fails; in that case
    /// the session is left without a socket.
    ///
    /// # Errors
    ///
    /// Whatever `open` fails with.
    pub async fn replace<F, Fut, E>(&mut self, open: F) -> Result<SessionId, E>
    where
        F: FnOnce(SessionId) -> Fut,
        Fut: Future<Output = Result<S, E>>,
    {
        self.close().await;

        let id = self.next_id;
        self.next_id += 1;

        let socket = open(id).await?;
        tracing::debug!("Session {id} opened");
        self.active = Some((id, socket));
        Ok(id)
    }

    /// Closes the open socket, if any.
    pub async fn close(&mut self) {
        if let Some((id, socket)) = self.active.take() {
            tracing::debug!("Closing session {id}");
            socket.close().await;
        }
    }

    /// Forgets socket `id` after it closed on its own.
    ///
    /// Returns `None` if `id` is not the current socket.
    pub fn release(&mut self, id: SessionId) -> Option<S> {
        if self.is_current(id) {
            self.active.take().map(|(_, socket)| socket)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Clone, Default)]
    struct Journal {
        entries: Arc<Mutex<Vec<String>>>,
        open: Arc<AtomicUsize>,
    }

    impl Journal {
        fn record(&self, entry: String) {
            self.entries.lock().unwrap().push(entry);
        }

        fn entries(&self) -> Vec<String> {
            self.entries.lock().unwrap().clone()
        }

        async fn open(&self, id: SessionId) -> Result<FakeSocket, &'static str> {
            let now_open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
            assert_eq!(now_open, 1, "two sockets open at once");
            self.record(format!("open {id}"));
            Ok(FakeSocket {
                id,
                journal: self.clone(),
            })
        }
    }

    struct FakeSocket {
        id: SessionId,
        journal: Journal,
    }

    impl SocketHandle for FakeSocket {
        async fn close(self) {
            self.journal.open.fetch_sub(1, Ordering::SeqCst);
            self.journal.record(format!("close {}", self.id));
        }
    }

    #[tokio::test]
    async fn replace_closes_before_opening() {
        let journal = Journal::default();
        let mut session = Session::new();

        let first = session.replace(|id| journal.open(id)).await.unwrap();
        let second = session.replace(|id| journal.open(id)).await.unwrap();
        let third = session.replace(|id| journal.open(id)).await.unwrap();

        assert!(first < second && second < third);
        assert!(session.is_current(third));
        assert!(!session.is_current(first));
        assert_eq!(
            journal.entries(),
            vec!["open 1", "close 1", "open 2", "close 2", "open 3"]
        );

        session.close().await;
        assert!(!session.is_open());
        assert_eq!(journal.open.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_open_leaves_no_socket() {
        let journal = Journal::default();
        let mut session = Session::new();
        session.replace(|id| journal.open(id)).await.unwrap();

        let failed = session
            .replace(|_| async { Err::<FakeSocket, _>("refused") })
            .await;

        assert_eq!(failed, Err("refused"));
        assert_eq!(session.current(), None);
        assert_eq!(journal.entries(), vec!["open 1", "close 1"]);
    }

    #[tokio::test]
    async fn release_only_forgets_the_current_socket() {
        let journal = Journal::default();
        let mut session = Session::new();
        let first = session.replace(|id| journal.open(id)).await.unwrap();
        let second = session.replace(|id| journal.open(id)).await.unwrap();

        assert!(session.release(first).is_none());
        assert!(session.is_open());

        let released = session.release(second).unwrap();
        assert_eq!(released.id, second);
        assert!(!session.is_open());
    }
}
