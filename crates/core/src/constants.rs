//! Default policy settings

use std::time::Duration;

/// Failures needed to open a circuit
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Time an open circuit waits before it is considered half-open
pub const DEFAULT_RESET_TIMEOUT: Duration = Duration::from_millis(20_000);

/// Attempts made by a retry policy before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Base delay between retry attempts
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(1_000);
