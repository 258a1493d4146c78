use std::time::Duration;

use selah_core::backoff::BackoffPolicy;

/// Notifier configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// How often the dispatcher polls for due jobs, in seconds (default: `1`).
    pub poll_interval_secs: u64,
    /// Timeout for a single delivery attempt, in seconds (default: `10`).
    pub send_timeout_secs: u64,
    /// Delay before the first retry, in seconds (default: `30`).
    pub backoff_base_secs: u64,
    /// Upper bound on any retry delay, in seconds (default: `3600`).
    pub backoff_cap_secs: u64,
    /// Total delivery attempts before a job fails terminally (default: `5`).
    pub max_attempts: u32,
    /// How long a claimed job is invisible to other workers, in seconds
    /// (default: `60`). Must comfortably exceed the send timeout.
    pub claim_lease_secs: u64,
    /// How often the reminder scanner runs, in seconds (default: `300`).
    pub reminder_scan_interval_secs: u64,
    /// SMS gateway endpoint, parsed from `SMS_GATEWAY_URL`. Required for the
    /// worker binary; library consumers may supply their own messenger.
    pub sms_gateway_url: Option<String>,
    /// Bearer token for the SMS gateway, if it needs one.
    pub sms_gateway_api_key: Option<String>,
}

impl NotifierConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default |
    /// |--------------------------------|---------|
    /// | `NOTIFIER_POLL_INTERVAL_SECS`  | `1`     |
    /// | `SMS_SEND_TIMEOUT_SECS`        | `10`    |
    /// | `SMS_BACKOFF_BASE_SECS`        | `30`    |
    /// | `SMS_BACKOFF_CAP_SECS`         | `3600`  |
    /// | `SMS_MAX_ATTEMPTS`             | `5`     |
    /// | `NOTIFIER_CLAIM_LEASE_SECS`    | `60`    |
    /// | `REMINDER_SCAN_INTERVAL_SECS`  | `300`   |
    /// | `SMS_GATEWAY_URL`              | unset   |
    /// | `SMS_GATEWAY_API_KEY`          | unset   |
    pub fn from_env() -> Self {
        Self {
            poll_interval_secs: env_u64("NOTIFIER_POLL_INTERVAL_SECS", 1),
            send_timeout_secs: env_u64("SMS_SEND_TIMEOUT_SECS", 10),
            backoff_base_secs: env_u64("SMS_BACKOFF_BASE_SECS", 30),
            backoff_cap_secs: env_u64("SMS_BACKOFF_CAP_SECS", 3600),
            max_attempts: env_u64("SMS_MAX_ATTEMPTS", 5) as u32,
            claim_lease_secs: env_u64("NOTIFIER_CLAIM_LEASE_SECS", 60),
            reminder_scan_interval_secs: env_u64("REMINDER_SCAN_INTERVAL_SECS", 300),
            sms_gateway_url: std::env::var("SMS_GATEWAY_URL").ok(),
            sms_gateway_api_key: std::env::var("SMS_GATEWAY_API_KEY").ok(),
        }
    }

    /// The retry policy these settings describe.
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            base: Duration::from_secs(self.backoff_base_secs),
            cap: Duration::from_secs(self.backoff_cap_secs),
            max_attempts: self.max_attempts,
        }
    }
}

impl Default for NotifierConfig {
    /// The documented defaults, independent of the environment.
    fn default() -> Self {
        Self {
            poll_interval_secs: 1,
            send_timeout_secs: 10,
            backoff_base_secs: 30,
            backoff_cap_secs: 3600,
            max_attempts: 5,
            claim_lease_secs: 60,
            reminder_scan_interval_secs: 300,
            sms_gateway_url: None,
            sms_gateway_api_key: None,
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|_| panic!("{name} must be a valid integer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_policy() {
        let config = NotifierConfig::default();
        let policy = config.backoff_policy();
        assert_eq!(policy.base, Duration::from_secs(30));
        assert_eq!(policy.cap, Duration::from_secs(3600));
        assert_eq!(policy.max_attempts, 5);
    }
}
