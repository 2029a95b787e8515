//! Server-push event stream.
//!
//! [`open`] connects to `/api/events`, passing the session credential as the
//! `token` query parameter, and registers the connection in the session so it
//! can be closed from anywhere. Events are forwarded as-is; their meaning is
//! up to the consumer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use eventsource_client::{self as es, Client};
use futures::StreamExt;
use reqwest::Url;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use recall_core::{Session, StreamHandle};

use crate::error::ClientError;

/// One server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    /// Event name (`message` when the server sent none).
    pub event_type: String,
    pub data: String,
}

/// Receiving end of an open push connection.
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<Result<StreamEvent, ClientError>>,
}

impl EventStream {
    /// Next event, or `None` once the connection has ended.
    ///
    /// A connection failure (including a refused credential) arrives as a
    /// final `Err` before the stream ends.
    pub async fn next(&mut self) -> Option<Result<StreamEvent, ClientError>> {
        self.rx.recv().await
    }

    /// Skip events until one named `event_type` arrives.
    pub async fn wait_for(
        &mut self,
        event_type: &str,
        timeout: Duration,
    ) -> Result<StreamEvent, ClientError> {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ClientError::EventStream(format!(
                    "timeout waiting for event: {event_type}"
                )));
            }

            match tokio::time::timeout(remaining, self.rx.recv()).await {
                Ok(Some(Ok(event))) if event.event_type == event_type => return Ok(event),
                Ok(Some(Ok(_))) => continue,
                Ok(Some(Err(e))) => return Err(e),
                Ok(None) => {
                    return Err(ClientError::EventStream("connection closed".to_string()))
                }
                Err(_) => {
                    return Err(ClientError::EventStream(format!(
                        "timeout waiting for event: {event_type}"
                    )))
                }
            }
        }
    }
}

struct ConnectionHandle {
    task: AbortHandle,
    finished: Arc<AtomicBool>,
}

impl StreamHandle for ConnectionHandle {
    fn close(&self) {
        self.task.abort();
        self.finished.store(true, Ordering::SeqCst);
        debug!("event stream closed");
    }

    fn is_closed(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

/// URL of the push endpoint for the session's current credential.
pub fn stream_url(session: &Session) -> Result<Url, ClientError> {
    let raw = format!("{}/api/events", session.api_url());
    let mut url = Url::parse(&raw).map_err(|e| ClientError::InvalidUrl {
        url: raw,
        message: e.to_string(),
    })?;
    url.query_pairs_mut()
        .append_pair("token", &session.authorization_header_value());
    Ok(url)
}

/// Open the push connection and register its handle in the session.
///
/// Must be called from within a tokio runtime. There is no reconnection: the
/// stream ends on the first error. A handle already registered is replaced
/// without being closed.
pub fn open(session: &Session) -> Result<EventStream, ClientError> {
    let url = stream_url(session)?;

    let client = es::ClientBuilder::for_url(url.as_str())
        .map_err(|e| ClientError::EventStream(format!("{e:?}")))?
        .reconnect(es::ReconnectOptions::reconnect(false).build())
        .build();

    let (tx, rx) = mpsc::unbounded_channel();
    let finished = Arc::new(AtomicBool::new(false));
    let done = finished.clone();

    let task = tokio::spawn(async move {
        let mut stream = client.stream();

        loop {
            match stream.next().await {
                Some(Ok(es::SSE::Event(event))) => {
                    debug!(event_type = %event.event_type, "event received");
                    let forwarded = StreamEvent {
                        event_type: event.event_type,
                        data: event.data,
                    };
                    if tx.send(Ok(forwarded)).is_err() {
                        debug!("event receiver dropped");
                        break;
                    }
                }
                Some(Ok(es::SSE::Comment(_))) => {
                    // keep-alive
                }
                Some(Err(e)) => {
                    warn!("event stream error: {e}");
                    let _ = tx.send(Err(ClientError::EventStream(e.to_string())));
                    break;
                }
                None => {
                    debug!("event stream ended");
                    break;
                }
            }
        }

        done.store(true, Ordering::SeqCst);
    });

    session.set_event_stream_handle(Box::new(ConnectionHandle {
        task: task.abort_handle(),
        finished,
    }));
    info!("event stream opened");

    Ok(EventStream { rx })
}
