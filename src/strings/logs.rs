//! # Log Messages
//!
//! Format functions for operator-facing log lines.

pub const CONFIG_PARSE_ERROR: &str = "Failed to parse YAML";
pub const MISSING_SLACK_TOKEN: &str = "No Slack token provided - set token or token_env";
pub const STARTING: &str = "Starting Newsbot...";
pub const CONNECTED: &str = "Newsbot connected and running!";
pub const CONNECTION_FAILED: &str = "Connection failed. Invalid Slack token or bot ID?";
pub const SHUTDOWN: &str = "Shutting down...";
pub const NO_PRODUCERS: &str = "No content producers available; only commands will be served";

pub fn config_read_error(path: &str) -> String {
    format!("Failed to read {path}")
}

pub fn missing_env_var(var: &str) -> String {
    format!("Environment variable {var} is not set")
}

pub fn shutdown_fail(err: &str) -> String {
    format!("Unable to listen for shutdown signal: {err}")
}

pub fn identity_resolved(id: &str) -> String {
    format!("Bot identity resolved: {id}")
}

pub fn reconnecting(delay_secs: u64, err: &str) -> String {
    format!("Event stream lost ({err}); reconnecting in {delay_secs}s")
}
