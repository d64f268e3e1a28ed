//! Chat webhook sink.
//!
//! Posts each report as JSON to a single incoming-webhook URL, the way most
//! chat services accept bot messages.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use tracing::{error, info};
use url::Url;

use super::{OutboundMessage, Sink};

pub struct HttpSink {
    client: Client,
    url: Url,
}

impl HttpSink {
    pub fn new(url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, url })
    }

    async fn post(&self, message: &OutboundMessage) -> Result<()> {
        let response = match self.client.post(self.url.clone()).json(message).send().await {
            Ok(resp) => resp,
            Err(e) => {
                if e.is_timeout() {
                    error!(host = ?self.url.host_str(), error = %e, "http_sink_timeout");
                } else {
                    error!(host = ?self.url.host_str(), error = %e, "http_sink_request_error");
                }
                return Err(e).context("Failed to post report");
            }
        };

        let status = response.status();
        if !status.is_success() {
            bail!("chat webhook responded with {}", status);
        }

        info!(
            host = ?self.url.host_str(),
            status_code = status.as_u16(),
            destinations = message.destinations.len(),
            "http_sink_delivered"
        );

        Ok(())
    }
}

impl Sink for HttpSink {
    fn send<'a>(&'a self, message: &'a OutboundMessage) -> BoxFuture<'a, Result<()>> {
        self.post(message).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Report;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    async fn spawn_chat(status: StatusCode) -> (Url, Arc<Mutex<Vec<serde_json::Value>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let store = received.clone();
        let app = Router::new().route(
            "/hook",
            post(move |Json(body): Json<serde_json::Value>| {
                let store = store.clone();
                async move {
                    store.lock().await.push(body);
                    status
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let url = Url::parse(&format!("http://{}/hook", addr)).unwrap();
        (url, received)
    }

    #[tokio::test]
    async fn test_http_sink_posts_json() {
        let (url, received) = spawn_chat(StatusCode::OK).await;
        let sink = HttpSink::new(url, Duration::from_secs(5)).unwrap();
        let message = OutboundMessage::new(Report::new("hello".to_string()), &["ops".to_string()]);

        sink.send(&message).await.unwrap();

        let received = received.lock().await;
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["body"], "hello");
        assert_eq!(received[0]["author"], "system");
        assert_eq!(received[0]["destinations"][0], "ops");
    }

    #[tokio::test]
    async fn test_http_sink_error_status() {
        let (url, _received) = spawn_chat(StatusCode::INTERNAL_SERVER_ERROR).await;
        let sink = HttpSink::new(url, Duration::from_secs(5)).unwrap();
        let message = OutboundMessage::new(Report::new("hello".to_string()), &[]);

        assert!(sink.send(&message).await.is_err());
    }
}
