// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background notification dispatch.
//!
//! Handlers enqueue [`NotificationJob`]s without waiting. A single
//! [`NotificationWorker`] drains the bounded queue and calls the
//! [`Notifier`]. A full queue drops the job; every outcome is counted.

use std::sync::Arc;

use metrics::counter;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use atelier_core::Notifier;
use atelier_core::types::{Order, OrderStatus};

/// Work item for the notification worker. Orders are owned copies.
#[derive(Debug, Clone)]
pub enum NotificationJob {
    NewOrder { order: Order, display_name: String },
    StatusChanged { order: Order, previous: OrderStatus },
    PrivacyAgreement { display_name: String },
}

impl NotificationJob {
    fn kind(&self) -> &'static str {
        match self {
            Self::NewOrder { .. } => "new_order",
            Self::StatusChanged { .. } => "status_changed",
            Self::PrivacyAgreement { .. } => "privacy_agreement",
        }
    }
}

/// Sending half of the notification queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<NotificationJob>,
}

impl NotificationQueue {
    /// Creates a queue holding at most `capacity` pending jobs.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<NotificationJob>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Enqueues without waiting. Returns `false` if the job was dropped.
    pub fn enqueue(&self, job: NotificationJob) -> bool {
        let kind = job.kind();
        match self.tx.try_send(job) {
            Ok(()) => {
                debug!(kind, "notification queued");
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(kind, "notification queue full, dropping job");
                counter!("atelier_notifications_dropped_total").increment(1);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(kind, "notification worker stopped, dropping job");
                counter!("atelier_notifications_dropped_total").increment(1);
                false
            }
        }
    }
}

/// Consumes the queue until shutdown.
pub struct NotificationWorker {
    rx: mpsc::Receiver<NotificationJob>,
    notifier: Arc<dyn Notifier>,
}

impl NotificationWorker {
    pub fn new(rx: mpsc::Receiver<NotificationJob>, notifier: Arc<dyn Notifier>) -> Self {
        Self { rx, notifier }
    }

    /// Runs until `cancel` fires or every sender is dropped. Jobs already
    /// queued at cancellation are still delivered.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("notification worker running");
        loop {
            tokio::select! {
                job = self.rx.recv() => match job {
                    Some(job) => self.process(job).await,
                    None => break,
                },
                _ = cancel.cancelled() => {
                    self.rx.close();
                    while let Some(job) = self.rx.recv().await {
                        self.process(job).await;
                    }
                    break;
                }
            }
        }
        info!("notification worker stopped");
    }

    async fn process(&self, job: NotificationJob) {
        match job {
            NotificationJob::NewOrder {
                order,
                display_name,
            } => {
                record(
                    "admin",
                    order.id.0,
                    self.notifier.notify_admin(&order).await,
                );
                record(
                    "channel",
                    order.id.0,
                    self.notifier.notify_channel(&order, &display_name).await,
                );
            }
            NotificationJob::StatusChanged { order, previous } => {
                record(
                    "status",
                    order.id.0,
                    self.notifier.notify_status_change(&order, previous).await,
                );
            }
            NotificationJob::PrivacyAgreement { display_name } => {
                record(
                    "agreement",
                    0,
                    self.notifier.notify_privacy_agreement(&display_name).await,
                );
            }
        }
    }
}

fn record(sink: &'static str, order_id: i64, result: Result<(), atelier_core::AtelierError>) {
    match result {
        Ok(()) => {
            counter!("atelier_notifications_sent_total", "sink" => sink).increment(1);
        }
        Err(e) => {
            warn!(sink, order_id, error = %e, "notification failed");
            counter!("atelier_notifications_failed_total", "sink" => sink).increment(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use atelier_core::AtelierError;
    use atelier_core::types::{OrderId, PriceBreakdown, UserId};
    use chrono::Utc;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct RecordingNotifier {
        calls: Mutex<Vec<String>>,
        fail_admin: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify_admin(&self, order: &Order) -> Result<(), AtelierError> {
            self.calls.lock().unwrap().push(format!("admin:{}", order.id));
            if self.fail_admin {
                return Err(AtelierError::gateway("admin chat unreachable"));
            }
            Ok(())
        }

        async fn notify_channel(&self, order: &Order, name: &str) -> Result<(), AtelierError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("channel:{}:{name}", order.id));
            Ok(())
        }

        async fn notify_status_change(
            &self,
            order: &Order,
            previous: OrderStatus,
        ) -> Result<(), AtelierError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("status:{}:{previous}->{}", order.id, order.status));
            Ok(())
        }

        async fn notify_privacy_agreement(&self, name: &str) -> Result<(), AtelierError> {
            self.calls.lock().unwrap().push(format!("agreement:{name}"));
            Ok(())
        }

        async fn export_order(&self, _order: &Order) -> Result<PathBuf, AtelierError> {
            Ok(PathBuf::from("order.csv"))
        }

        async fn export_all_orders(&self) -> Result<PathBuf, AtelierError> {
            Ok(PathBuf::from("orders.csv"))
        }
    }

    fn order(id: i64) -> Order {
        Order {
            id: OrderId(id),
            user_id: UserId(5),
            width_cm: 30,
            height_cm: 40,
            texture_id: "t".into(),
            texture_name: "Замша".into(),
            price_per_dm2: 30.0,
            breakdown: PriceBreakdown {
                area_dm2: 12.0,
                material_cost: 360.0,
                processing_cost: 375.0,
                total_cost: 735.0,
                final_price: 1837.5,
                commission: 55.125,
                tax: 110.25,
                net_revenue: 1672.125,
                profit: 937.125,
            },
            contact: "+79161234567".into(),
            delivery_date: None,
            status: OrderStatus::New,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn worker_delivers_queued_jobs_in_order() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (queue, rx) = NotificationQueue::new(8);
        let cancel = CancellationToken::new();
        let worker = tokio::spawn(NotificationWorker::new(rx, notifier.clone()).run(cancel.clone()));

        assert!(queue.enqueue(NotificationJob::PrivacyAgreement {
            display_name: "@anna".into()
        }));
        assert!(queue.enqueue(NotificationJob::NewOrder {
            order: order(1),
            display_name: "@anna".into()
        }));
        let mut changed = order(1);
        changed.status = OrderStatus::Processing;
        assert!(queue.enqueue(NotificationJob::StatusChanged {
            order: changed,
            previous: OrderStatus::New
        }));

        cancel.cancel();
        worker.await.unwrap();

        assert_eq!(
            *notifier.calls.lock().unwrap(),
            [
                "agreement:@anna",
                "admin:1",
                "channel:1:@anna",
                "status:1:new->processing"
            ]
        );
    }

    #[traced_test]
    #[tokio::test]
    async fn full_queue_drops_jobs() {
        let (queue, _rx) = NotificationQueue::new(1);
        let job = NotificationJob::PrivacyAgreement {
            display_name: "id1".into(),
        };
        assert!(queue.enqueue(job.clone()));
        assert!(!queue.enqueue(job));
        assert!(logs_contain("notification queue full"));
    }

    #[tokio::test]
    async fn closed_queue_drops_jobs() {
        let (queue, rx) = NotificationQueue::new(4);
        drop(rx);
        assert!(!queue.enqueue(NotificationJob::PrivacyAgreement {
            display_name: "id1".into()
        }));
    }

    #[traced_test]
    #[tokio::test]
    async fn admin_failure_does_not_skip_channel() {
        let notifier = Arc::new(RecordingNotifier {
            fail_admin: true,
            ..Default::default()
        });
        let (queue, rx) = NotificationQueue::new(4);
        let cancel = CancellationToken::new();
        let worker = tokio::spawn(NotificationWorker::new(rx, notifier.clone()).run(cancel.clone()));

        queue.enqueue(NotificationJob::NewOrder {
            order: order(7),
            display_name: "id5".into(),
        });
        drop(queue);
        worker.await.unwrap();

        assert_eq!(
            *notifier.calls.lock().unwrap(),
            ["admin:7", "channel:7:id5"]
        );
        assert!(logs_contain("notification failed"));
    }
}
