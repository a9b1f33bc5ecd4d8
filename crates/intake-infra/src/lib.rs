//! Intake Infrastructure Library
//!
//! Shared infrastructure used by the intake relay:
//! - Per-client upload rate limiting
//! - Telemetry (tracing subscriber) initialization

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-export commonly used types
#[cfg(feature = "observability-basic")]
pub use telemetry::init_telemetry;

#[cfg(feature = "rate-limit")]
pub use rate_limit::{Admission, RateLimiter};
