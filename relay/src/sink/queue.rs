//! RabbitMQ sink for reports.
//!
//! Publishes each report to a durable queue so a separate chat bridge can
//! deliver it. The connection is opened lazily and re-established whenever
//! the channel is found closed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use lapin::{
    options::{BasicPublishOptions, QueueDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::{OutboundMessage, Sink};

/// Queue sink with connection management.
#[derive(Clone)]
pub struct QueueSink {
    inner: Arc<QueueSinkInner>,
}

struct QueueSinkInner {
    url: String,
    queue: String,
    /// Unix millis at creation; keeps message ids unique across restarts
    started_ms: u128,
    sequence: AtomicU64,
    connection: RwLock<Option<Connection>>,
    channel: RwLock<Option<Channel>>,
}

impl QueueSink {
    pub fn new(url: String, queue: String) -> Self {
        Self {
            inner: Arc::new(QueueSinkInner {
                url,
                queue,
                started_ms: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_millis(),
                sequence: AtomicU64::new(0),
                connection: RwLock::new(None),
                channel: RwLock::new(None),
            }),
        }
    }

    pub fn queue(&self) -> &str {
        &self.inner.queue
    }

    fn next_message_id(&self) -> String {
        format!(
            "report-{}-{}",
            self.inner.started_ms,
            self.inner.sequence.fetch_add(1, Ordering::Relaxed)
        )
    }

    /// Ensure we have a valid connection and channel.
    async fn ensure_connected(&self) -> Result<Channel> {
        {
            let channel = self.inner.channel.read().await;
            if let Some(ch) = channel.as_ref() {
                if ch.status().connected() {
                    return Ok(ch.clone());
                }
            }
        }

        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        // Another task may have reconnected while we waited for the locks.
        if let Some(ch) = channel.as_ref() {
            if ch.status().connected() {
                return Ok(ch.clone());
            }
        }

        info!("rabbitmq_sink_connecting");

        let conn = Connection::connect(&self.inner.url, ConnectionProperties::default())
            .await
            .context("Failed to connect to RabbitMQ")?;

        let ch = conn
            .create_channel()
            .await
            .context("Failed to create channel")?;

        ch.queue_declare(
            &self.inner.queue,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .context("Failed to declare report queue")?;

        info!(queue = %self.inner.queue, "rabbitmq_sink_connected");

        *connection = Some(conn);
        *channel = Some(ch.clone());

        Ok(ch)
    }

    async fn publish(&self, message: &OutboundMessage) -> Result<()> {
        let channel = self.ensure_connected().await?;

        let body = serde_json::to_vec(message).context("Failed to serialize report")?;
        let message_id = self.next_message_id();

        channel
            .basic_publish(
                "",
                &self.inner.queue,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default()
                    .with_delivery_mode(2) // Persistent
                    .with_content_type("application/json".into())
                    .with_message_id(message_id.clone().into()),
            )
            .await
            .context("Failed to publish report")?
            .await
            .context("Failed to confirm publish")?;

        info!(
            queue = %self.inner.queue,
            message_id = %message_id,
            body_length = body.len(),
            "rabbitmq_report_published"
        );

        Ok(())
    }

    async fn shutdown(&self) {
        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        if let Some(ch) = channel.take() {
            if let Err(e) = ch.close(200, "Normal shutdown").await {
                warn!(error = %e, "rabbitmq_channel_close_error");
            }
        }

        if let Some(conn) = connection.take() {
            if let Err(e) = conn.close(200, "Normal shutdown").await {
                warn!(error = %e, "rabbitmq_connection_close_error");
            }
        }

        info!("rabbitmq_sink_closed");
    }
}

impl Sink for QueueSink {
    fn send<'a>(&'a self, message: &'a OutboundMessage) -> BoxFuture<'a, Result<()>> {
        self.publish(message).boxed()
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        self.shutdown().boxed()
    }
}
