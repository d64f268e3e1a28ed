//! Outbound message sinks.
//!
//! A sink receives finished reports and delivers them somewhere people will
//! read them. Delivery semantics and retries belong to the sink; the web
//! handler only bounds how long it waits.
//!
//! ```text
//! Handler → Sink::send → (log | chat webhook | RabbitMQ queue)
//! ```

pub mod http;
pub mod queue;

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use tracing::info;

use crate::config::{Config, SinkKind};
use crate::report::Report;

pub use self::http::HttpSink;
pub use self::queue::QueueSink;

/// A report addressed to one or more destinations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub body: String,
    pub author: String,
    pub destinations: Vec<String>,
}

impl OutboundMessage {
    pub fn new(report: Report, destinations: &[String]) -> Self {
        Self {
            body: report.body,
            author: report.author.to_string(),
            destinations: destinations.to_vec(),
        }
    }
}

/// Delivery target for rendered reports.
///
/// Object safe so the web state can hold an `Arc<dyn Sink>`.
pub trait Sink: Send + Sync {
    fn send<'a>(&'a self, message: &'a OutboundMessage) -> BoxFuture<'a, Result<()>>;

    /// Release connections at shutdown.
    fn close(&self) -> BoxFuture<'_, ()> {
        async {}.boxed()
    }
}

/// Sink that only writes the report to the log.
#[derive(Debug, Clone, Default)]
pub struct LogSink;

impl Sink for LogSink {
    fn send<'a>(&'a self, message: &'a OutboundMessage) -> BoxFuture<'a, Result<()>> {
        async move {
            info!(
                author = %message.author,
                destinations = ?message.destinations,
                body = %message.body,
                "report_logged"
            );
            Ok(())
        }
        .boxed()
    }
}

/// Build the sink selected by `RELAY_SINK`.
pub fn build_sink(config: &Config) -> Result<Arc<dyn Sink>> {
    let sink: Arc<dyn Sink> = match config.sink {
        SinkKind::Log => Arc::new(LogSink),
        SinkKind::Http => {
            let url = config
                .sink_url
                .clone()
                .context("RELAY_SINK_URL must be set for the http sink")?;
            Arc::new(HttpSink::new(url, config.sink_timeout())?)
        }
        SinkKind::Queue => Arc::new(QueueSink::new(
            config.cloudamqp_url.clone(),
            config.queue_name.clone(),
        )),
    };

    info!(sink = ?config.sink, "sink_created");

    Ok(sink)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Sink doubles for handler and server tests.

    use super::*;
    use tokio::sync::Mutex;

    /// Records every message it is asked to send.
    #[derive(Default)]
    pub struct RecordingSink {
        pub sent: Mutex<Vec<OutboundMessage>>,
    }

    impl RecordingSink {
        pub async fn messages(&self) -> Vec<OutboundMessage> {
            self.sent.lock().await.clone()
        }
    }

    impl Sink for RecordingSink {
        fn send<'a>(&'a self, message: &'a OutboundMessage) -> BoxFuture<'a, Result<()>> {
            async move {
                self.sent.lock().await.push(message.clone());
                Ok(())
            }
            .boxed()
        }
    }

    /// Fails every delivery.
    pub struct FailingSink;

    impl Sink for FailingSink {
        fn send<'a>(&'a self, _message: &'a OutboundMessage) -> BoxFuture<'a, Result<()>> {
            async { Err(anyhow::anyhow!("chat service unavailable")) }.boxed()
        }
    }

    /// Never completes a delivery.
    pub struct StalledSink;

    impl Sink for StalledSink {
        fn send<'a>(&'a self, _message: &'a OutboundMessage) -> BoxFuture<'a, Result<()>> {
            futures::future::pending::<Result<()>>().boxed()
        }
    }
}
