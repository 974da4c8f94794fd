//! Testing utilities and helpers
//!
//! Available with the `test-utils` feature:
//! - **[`mocks`]**: [`MockTransport`], a scripted in-memory
//!   [`HttpTransport`](crate::http::HttpTransport) that records every request
//! - **[`time`]**: [`MockClock`], a manually advanced wall clock
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//!
//! use subscriptions_common::testing::{MockClock, MockTransport};
//! use subscriptions_common::Clock;
//!
//! let transport = MockTransport::new();
//! transport.add_response("https://auth.example.com/token", 200, "{}");
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//! clock.advance(Duration::from_secs(51));
//! assert_eq!((clock.now() - start).num_seconds(), 51);
//! ```

pub mod mocks;
pub mod time;

pub use mocks::MockTransport;
pub use time::MockClock;
