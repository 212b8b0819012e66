/// Tenant token used when no organization id can be found anywhere.
pub const DEFAULT_ORGANIZATION_ID: &str = "default";

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Post-save verification: total reads (initial read + retries).
pub const DEFAULT_VERIFY_MAX_ATTEMPTS: usize = 3;

pub const DEFAULT_VERIFY_BASE_DELAY_MS: u64 = 500;

/// Lead time for event reminders when the user picks nothing.
pub const DEFAULT_NOTIFICATION_MINUTES: u32 = 15;
