//! Time abstraction for token expiry decisions
//!
//! The session manager never calls `Utc::now()` directly; it asks a
//! [`Clock`]. Production code uses [`SystemClock`], tests substitute the
//! manually advanced `MockClock` from the `testing` module.

pub mod clock;

pub use clock::{Clock, SystemClock};
