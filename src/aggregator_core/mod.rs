//! Aggregator Core - bounded rolling statistics over sensor readings
//!
//! # Architecture
//!
//! ```text
//! StreamConsumer ──append()──► SlidingWindowAggregator
//!                                 ├─ Window<f64> temperature (last N)
//!                                 ├─ Window<f64> humidity    (last N)
//!                                 └─ Summary (latest + rounded means)
//!                                        │
//! query handlers ◄──snapshot()───────────┘
//! ```

pub mod aggregator;
pub mod summary;
pub mod window;

pub use aggregator::SlidingWindowAggregator;
pub use summary::{round_half_even, Reading, Summary};
pub use window::Window;
