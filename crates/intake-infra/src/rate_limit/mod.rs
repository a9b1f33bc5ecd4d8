//! Upload rate limiting
//!
//! Sliding-window limiter keyed by client identity.

pub use limiter::{Admission, RateLimiter};

mod limiter;
