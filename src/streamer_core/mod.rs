pub mod backoff;
pub mod client;
pub mod consumer;
pub mod reading;
pub mod sse;

pub use backoff::{FixedBackoff, Sleeper, TokioSleeper};
pub use client::{EventSource, EventStream, HttpEventSource, StreamError};
pub use consumer::{ConsumerConfig, ConsumerHandle, ConsumerState, ConsumerStats, StreamConsumer};
pub use reading::DecodeError;
pub use sse::{LineTooLong, SseDecoder, SseEvent};
