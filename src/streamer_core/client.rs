use crate::streamer_core::sse::{SseDecoder, SseEvent};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use std::collections::VecDeque;
use std::time::Duration;

/// Connection-level failures; every variant leads to a reconnect
#[derive(Debug)]
pub enum StreamError {
    Connect(String),
    Status(u16),
    Stream(String),
    Timeout(Duration),
    Ended,
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamError::Connect(msg) => write!(f, "Connection error: {}", msg),
            StreamError::Status(code) => write!(f, "Unexpected HTTP status: {}", code),
            StreamError::Stream(msg) => write!(f, "Stream read error: {}", msg),
            StreamError::Timeout(after) => {
                write!(f, "No data received for {}s", after.as_secs_f64())
            }
            StreamError::Ended => write!(f, "Stream closed by server"),
        }
    }
}

impl std::error::Error for StreamError {}

impl From<reqwest::Error> for StreamError {
    fn from(e: reqwest::Error) -> Self {
        StreamError::Connect(e.to_string())
    }
}

pub type EventStream = BoxStream<'static, Result<SseEvent, StreamError>>;

/// Upstream server-push subscription
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Human-readable address for logs
    fn describe(&self) -> String;

    /// Open a fresh subscription
    async fn subscribe(&self) -> Result<EventStream, StreamError>;
}

pub struct HttpEventSource {
    url: String,
    client: reqwest::Client,
}

impl HttpEventSource {
    pub fn new(url: impl Into<String>, connect_timeout: Duration) -> Result<Self, StreamError> {
        // No overall request timeout: the response body is meant to stay open
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn subscribe(&self) -> Result<EventStream, StreamError> {
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::Status(status.as_u16()));
        }

        let body = Box::pin(response.bytes_stream());
        let events = stream::unfold(
            (body, SseDecoder::new(), VecDeque::<SseEvent>::new()),
            |(mut body, mut decoder, mut pending)| async move {
                loop {
                    if let Some(event) = pending.pop_front() {
                        return Some((Ok(event), (body, decoder, pending)));
                    }
                    match body.next().await {
                        Some(Ok(chunk)) => match decoder.feed(&chunk) {
                            Ok(events) => pending.extend(events),
                            Err(e) => {
                                return Some((
                                    Err(StreamError::Stream(e.to_string())),
                                    (body, decoder, pending),
                                ))
                            }
                        },
                        Some(Err(e)) => {
                            return Some((
                                Err(StreamError::Stream(e.to_string())),
                                (body, decoder, pending),
                            ))
                        }
                        None => return None,
                    }
                }
            },
        );

        Ok(events.boxed())
    }
}
