// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound event loop.
//!
//! Each event runs on its own task. Events from the same user are chained
//! in arrival order so step transitions never race; different users proceed
//! concurrently.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use atelier_core::types::{InboundEvent, UserId};
use atelier_core::{AtelierError, MessagingGateway};

use crate::service::IntakeService;

/// Latest queued turn per user: its sequence number and completion signal.
type Tails = DashMap<UserId, (u64, oneshot::Receiver<()>)>;

/// Hands out per-user turns in the order events arrive.
#[derive(Default)]
struct Turns {
    tails: Arc<Tails>,
    next: u64,
}

impl Turns {
    fn take(&mut self, user: UserId) -> Turn {
        let seq = self.next;
        self.next += 1;
        let (done, tail) = oneshot::channel();
        let previous = self.tails.insert(user, (seq, tail)).map(|(_, rx)| rx);
        Turn {
            user,
            seq,
            previous,
            _done: done,
            tails: Arc::clone(&self.tails),
        }
    }

    #[cfg(test)]
    fn pending_users(&self) -> usize {
        self.tails.len()
    }
}

/// A place in one user's queue. Dropping it releases the next turn.
struct Turn {
    user: UserId,
    seq: u64,
    previous: Option<oneshot::Receiver<()>>,
    _done: oneshot::Sender<()>,
    tails: Arc<Tails>,
}

impl Turn {
    /// Waits until every earlier turn of the same user has finished.
    async fn wait(&mut self) {
        if let Some(previous) = self.previous.as_mut() {
            // Err only means the earlier turn is gone, which is what we wait for.
            let _ = previous.await;
            self.previous = None;
        }
    }
}

impl Drop for Turn {
    fn drop(&mut self) {
        let seq = self.seq;
        self.tails.remove_if(&self.user, |_, (tail, _)| *tail == seq);
    }
}

pub struct Dispatcher {
    gateway: Arc<dyn MessagingGateway>,
    service: Arc<IntakeService>,
    turns: Turns,
    tasks: TaskTracker,
}

impl Dispatcher {
    pub fn new(gateway: Arc<dyn MessagingGateway>, service: Arc<IntakeService>) -> Self {
        Self {
            gateway,
            service,
            turns: Turns::default(),
            tasks: TaskTracker::new(),
        }
    }

    /// Receives events until `cancel` fires or the gateway stream closes,
    /// then waits for in-flight handlers.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), AtelierError> {
        info!("dispatcher running");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping dispatcher");
                    break;
                }
                event = self.gateway.receive() => match event {
                    Ok(event) => self.spawn(event),
                    Err(e) => {
                        error!(error = %e, "gateway receive error");
                        if e.to_string().contains("closed") {
                            break;
                        }
                    }
                },
            }
        }

        self.tasks.close();
        info!(in_flight = self.tasks.len(), "waiting for in-flight updates");
        self.tasks.wait().await;
        info!("dispatcher stopped");
        Ok(())
    }

    fn spawn(&mut self, event: InboundEvent) {
        let service = Arc::clone(&self.service);
        let mut turn = self.turns.take(event.user_id);
        self.tasks.spawn(async move {
            let user = event.user_id;
            turn.wait().await;
            service.handle(event).await;
            drop(turn);
            debug!(user_id = %user, "update handled");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_user_turns_run_in_arrival_order() {
        let mut turns = Turns::default();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let tracker = TaskTracker::new();

        for i in 0..3u64 {
            let mut turn = turns.take(UserId(1));
            let order = Arc::clone(&order);
            tracker.spawn(async move {
                turn.wait().await;
                order.lock().unwrap().push(format!("start{i}"));
                // Earlier turns sleep longer; arrival order must still win.
                tokio::time::sleep(Duration::from_millis(15 - 5 * i)).await;
                order.lock().unwrap().push(format!("end{i}"));
            });
        }
        tracker.close();
        tracker.wait().await;

        let events = order.lock().unwrap().clone();
        assert_eq!(
            events,
            ["start0", "end0", "start1", "end1", "start2", "end2"]
        );
        assert_eq!(turns.pending_users(), 0);
    }

    #[tokio::test]
    async fn other_users_are_not_blocked() {
        let mut turns = Turns::default();
        let mut busy = turns.take(UserId(1));
        busy.wait().await;

        let mut other = turns.take(UserId(2));
        tokio::time::timeout(Duration::from_secs(1), other.wait())
            .await
            .unwrap();

        let mut queued = turns.take(UserId(1));
        assert!(
            tokio::time::timeout(Duration::from_millis(20), queued.wait())
                .await
                .is_err()
        );
        drop(busy);
        tokio::time::timeout(Duration::from_secs(1), queued.wait())
            .await
            .unwrap();
    }
}
