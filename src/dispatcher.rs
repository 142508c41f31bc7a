//! # Notification Dispatcher
//!
//! Background worker that drains the notification queue. Each tick claims a
//! batch of due pending notifications, hands them to a [`NotificationSink`],
//! and either marks them sent or requeues them with exponential backoff.
//!
//! Delivery transports are pluggable through the sink trait; the default
//! [`LogSink`] just records deliveries, which is the whole story for the
//! `in_app` channel.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use rand::Rng;
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;

use crate::config::DispatcherConfig;
use crate::error::RepositoryError;
use crate::models::notification::Model as NotificationModel;
use crate::repositories::NotificationRepository;

/// Delivery transport for notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &NotificationModel) -> anyhow::Result<()>;
}

/// Default sink that records the delivery in the log stream. In-app
/// notifications need no external transport, so this marks them delivered.
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, notification: &NotificationModel) -> anyhow::Result<()> {
        tracing::info!(
            notification_id = %notification.id,
            user_id = %notification.user_id,
            channel = %notification.channel,
            title = %notification.title,
            "Delivering notification"
        );
        Ok(())
    }
}

/// Outcome counters for a single dispatcher tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickStats {
    pub claimed: usize,
    pub dispatched: usize,
    pub failed: usize,
}

/// Background dispatcher that polls the queue on a fixed interval.
pub struct Dispatcher {
    db: DatabaseConnection,
    config: DispatcherConfig,
    sink: Arc<dyn NotificationSink>,
}

impl Dispatcher {
    /// Create a dispatcher using the default [`LogSink`] transport.
    pub fn new(db: DatabaseConnection, config: DispatcherConfig) -> Self {
        Self::with_sink(db, config, Arc::new(LogSink))
    }

    /// Create a dispatcher with a custom delivery transport.
    pub fn with_sink(
        db: DatabaseConnection,
        config: DispatcherConfig,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self { db, config, sink }
    }

    /// Run the dispatch loop until the cancellation token fires.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(StdDuration::from_secs(self.config.tick_seconds));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        tracing::info!(
            tick_seconds = self.config.tick_seconds,
            batch_size = self.config.batch_size,
            "Notification dispatcher started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Notification dispatcher shutting down");
                    break;
                }
                _ = interval.tick() => {
                    match self.tick().await {
                        Ok(stats) if stats.claimed > 0 => {
                            tracing::info!(
                                claimed = stats.claimed,
                                dispatched = stats.dispatched,
                                failed = stats.failed,
                                "Dispatcher tick completed"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::error!(error = %e, "Dispatcher tick failed");
                        }
                    }
                }
            }
        }
    }

    /// Process one batch of due notifications.
    pub async fn tick(&self) -> Result<TickStats, RepositoryError> {
        let started = std::time::Instant::now();
        let repo = NotificationRepository::new(&self.db);

        let batch = repo
            .claim_due_batch(chrono::Utc::now(), self.config.batch_size)
            .await?;

        let mut stats = TickStats {
            claimed: batch.len(),
            ..TickStats::default()
        };

        for notification in batch {
            match self.sink.deliver(&notification).await {
                Ok(()) => {
                    repo.mark_sent(notification).await?;
                    stats.dispatched += 1;
                    metrics::counter!("waaed_notifications_dispatched_total").increment(1);
                }
                Err(e) => {
                    let backoff = self.backoff_for(notification.retry_count);
                    tracing::warn!(
                        notification_id = %notification.id,
                        retry_count = notification.retry_count,
                        backoff_seconds = backoff.num_seconds(),
                        error = %e,
                        "Notification delivery failed"
                    );
                    repo.mark_failed_or_requeue(notification, &e.to_string(), backoff)
                        .await?;
                    stats.failed += 1;
                    metrics::counter!("waaed_notifications_failed_total").increment(1);
                }
            }
        }

        let backlog = repo.count_pending().await?;
        metrics::gauge!("waaed_notifications_backlog").set(backlog as f64);
        metrics::histogram!("waaed_dispatcher_tick_seconds")
            .record(started.elapsed().as_secs_f64());

        Ok(stats)
    }

    /// Exponential backoff with jitter: base * 2^retry_count, capped at
    /// max_seconds, then scattered by +/- jitter_factor.
    fn backoff_for(&self, retry_count: i32) -> chrono::Duration {
        let exponent = retry_count.clamp(0, 30);
        let raw = self.config.base_seconds as f64 * 2f64.powi(exponent);
        let capped = raw.min(self.config.max_seconds as f64);

        let jitter_span = capped * self.config.jitter_factor;
        let jitter = if jitter_span > 0.0 {
            rand::thread_rng().gen_range(-jitter_span..=jitter_span)
        } else {
            0.0
        };

        let seconds = (capped + jitter).max(1.0);
        chrono::Duration::seconds(seconds.round() as i64)
    }
}
