/// Service name reported in logs.
pub const SERVICE_NAME: &str = "intake-server";

/// Banner sent to clients on connect.
pub const GREETING: &str = "Welcome to the FTP Upload Service";

/// How long open sessions get to finish after a shutdown signal.
pub const SHUTDOWN_GRACE_PERIOD_SECS: u64 = 10;
