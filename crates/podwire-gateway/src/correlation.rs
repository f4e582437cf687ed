//! Reply routing back to waiting callers.
//!
//! - Tagged replies carry the id of their command and are matched against a
//!   `request id -> oneshot` map, so any number of calls may be in flight.
//! - Untagged replies carry nothing. They go through one small channel whose
//!   receiver sits behind a mutex; holding that mutex across write-then-wait is
//!   what keeps untagged calls single-flight.
//!
//! The handoff into the untagged channel is bounded: if no caller drains it
//! within the handoff timeout, the reply is dropped so the dispatcher loop never
//! stalls on a reply nobody is waiting for.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot, Mutex, MutexGuard};

use podwire_core::error::{PodwireError, Result};
use podwire_core::protocol::{Reply, RequestId};

type Waiter = oneshot::Sender<Result<Reply>>;

pub struct PendingReplies {
    waiters: DashMap<RequestId, Waiter>,
    next_id: AtomicU64,
    closed: AtomicBool,
    untagged_tx: StdMutex<Option<mpsc::Sender<Result<Reply>>>>,
    untagged_rx: Mutex<mpsc::Receiver<Result<Reply>>>,
    handoff_timeout: Duration,
}

impl PendingReplies {
    pub fn new(handoff_timeout: Duration) -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self {
            waiters: DashMap::new(),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            untagged_tx: StdMutex::new(Some(tx)),
            untagged_rx: Mutex::new(rx),
            handoff_timeout,
        }
    }

    /// Allocate an id and register a waiter for its reply.
    pub fn register(&self) -> Result<(RequestId, oneshot::Receiver<Result<Reply>>)> {
        if self.is_closed() {
            return Err(PodwireError::PeerClosed);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.waiters.insert(id, tx);

        // close() may have drained the map between the check and the insert.
        if self.is_closed() {
            self.waiters.remove(&id);
            return Err(PodwireError::PeerClosed);
        }
        Ok((id, rx))
    }

    /// Forget a waiter (timeout or failed write).
    pub fn unregister(&self, id: RequestId) {
        self.waiters.remove(&id);
    }

    /// Number of tagged calls waiting for a reply.
    pub fn in_flight(&self) -> usize {
        self.waiters.len()
    }

    /// Exclusive access to the untagged reply channel.
    ///
    /// The guard is the single-flight token: hold it from before the command is
    /// written until its reply has been received.
    pub async fn single_flight(&self) -> MutexGuard<'_, mpsc::Receiver<Result<Reply>>> {
        self.untagged_rx.lock().await
    }

    /// Route a reply to whoever is waiting for it.
    pub async fn deliver(&self, reply: Reply) {
        match reply.id {
            Some(id) => match self.waiters.remove(&id) {
                Some((_, waiter)) => {
                    if waiter.send(Ok(reply)).is_err() {
                        tracing::debug!(id, "caller gave up before reply arrived");
                    }
                }
                None => tracing::warn!(id, "reply for unknown or expired request; dropping"),
            },
            None => self.hand_off(Ok(reply)).await,
        }
    }

    async fn hand_off(&self, item: Result<Reply>) {
        let Some(tx) = self.untagged_sender() else {
            tracing::warn!("reply arrived after tunnel closed; dropping");
            return;
        };
        match tokio::time::timeout(self.handoff_timeout, tx.send(item)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => tracing::warn!("reply channel closed; dropping reply"),
            Err(_) => tracing::warn!(
                timeout_ms = self.handoff_timeout.as_millis() as u64,
                "failed to add response in channel; dropping reply"
            ),
        }
    }

    /// Fail every waiter and refuse new registrations.
    ///
    /// `reason` is what waiting callers see. Untagged callers see the channel
    /// close (reported as `PeerClosed`) unless `reason` could be queued first.
    pub fn close(&self, reason: Option<PodwireError>) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let ids: Vec<RequestId> = self.waiters.iter().map(|e| *e.key()).collect();
        for id in ids {
            if let Some((_, waiter)) = self.waiters.remove(&id) {
                let _ = waiter.send(Err(closed_error(&reason)));
            }
        }

        let tx = match self.untagged_tx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let (Some(tx), Some(reason)) = (tx, reason) {
            let _ = tx.try_send(Err(reason));
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn untagged_sender(&self) -> Option<mpsc::Sender<Result<Reply>>> {
        match self.untagged_tx.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

fn closed_error(reason: &Option<PodwireError>) -> PodwireError {
    match reason {
        Some(PodwireError::Transport(e)) => PodwireError::Transport(std::io::Error::new(e.kind(), e.to_string())),
        Some(PodwireError::PayloadTooLarge) => PodwireError::PayloadTooLarge,
        _ => PodwireError::PeerClosed,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;

    fn pending() -> PendingReplies {
        PendingReplies::new(Duration::from_millis(100))
    }

    #[tokio::test]
    async fn tagged_reply_reaches_its_waiter() {
        let p = pending();
        let (a, rx_a) = p.register().unwrap();
        let (b, rx_b) = p.register().unwrap();
        assert_ne!(a, b);
        assert_eq!(p.in_flight(), 2);

        p.deliver(Reply::ok(Some(b), &b"\"b\""[..])).await;
        p.deliver(Reply::ok(Some(a), &b"\"a\""[..])).await;

        assert_eq!(&rx_a.await.unwrap().unwrap().body[..], b"\"a\"");
        assert_eq!(&rx_b.await.unwrap().unwrap().body[..], b"\"b\"");
        assert_eq!(p.in_flight(), 0);
    }

    #[tokio::test]
    async fn unknown_id_is_dropped() {
        let p = pending();
        let (id, _rx) = p.register().unwrap();
        p.unregister(id);
        p.deliver(Reply::ok(Some(id), &b"1"[..])).await;
        p.deliver(Reply::ok(Some(999), &b"1"[..])).await;
        assert_eq!(p.in_flight(), 0);
    }

    #[tokio::test]
    async fn untagged_handoff_gives_up_when_nobody_reads() {
        let p = pending();
        p.deliver(Reply::ok(None, &b"1"[..])).await;

        let started = tokio::time::Instant::now();
        p.deliver(Reply::ok(None, &b"2"[..])).await;
        assert!(started.elapsed() >= Duration::from_millis(100));

        let mut rx = p.single_flight().await;
        assert_eq!(&rx.try_recv().unwrap().unwrap().body[..], b"1");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn close_fails_waiters_and_refuses_new_ones() {
        let p = pending();
        let (_, rx) = p.register().unwrap();

        p.close(None);
        assert!(p.is_closed());
        assert!(matches!(rx.await.unwrap(), Err(PodwireError::PeerClosed)));
        assert!(matches!(p.register(), Err(PodwireError::PeerClosed)));

        let mut untagged = p.single_flight().await;
        assert!(untagged.recv().await.is_none());
    }

    #[tokio::test]
    async fn close_reason_reaches_untagged_caller() {
        let p = pending();
        p.close(Some(PodwireError::PayloadTooLarge));

        let mut untagged = p.single_flight().await;
        assert!(matches!(untagged.recv().await, Some(Err(PodwireError::PayloadTooLarge))));
        assert!(untagged.recv().await.is_none());
    }
}
