//! Sliding-window processing of a server-pushed sensor stream.
//!
//! A [`streamer_core::StreamConsumer`] keeps an SSE subscription open and
//! feeds each decoded reading into a shared
//! [`aggregator_core::SlidingWindowAggregator`]; the [`api`] router serves
//! snapshots of it.

pub mod aggregator_core;
pub mod api;
pub mod config;
pub mod streamer_core;
