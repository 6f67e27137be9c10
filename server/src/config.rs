//! Configuration for the Othello server
//!
//! Every tunable is read from the environment, falling back to a compiled-in
//! default. The data directory is resolved with the following precedence:
//! 1. OTHELLO_DATA_DIR environment variable
//! 2. ~/.config/othello/data (production default)
//! 3. ./data (fallback for development)

use std::path::PathBuf;
use std::time::Duration;

use crate::session::SessionConfig;

const DEFAULT_CONFIG_DIR: &str = ".config/othello/data";
const DEV_DATA_DIR: &str = "./data";

/// Idle time after which the waiting side may force the match to end.
pub const DEFAULT_INACTIVITY_SECS: u64 = 90;
/// Lifetime of an archived outcome for replay requests.
pub const DEFAULT_REPLAY_TTL_SECS: u64 = 3600;
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Get the data directory for player records.
///
/// Priority:
/// 1. OTHELLO_DATA_DIR env variable if set
/// 2. $HOME/.config/othello/data if HOME is set
/// 3. ./data as fallback
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("OTHELLO_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(DEFAULT_CONFIG_DIR);
    }

    PathBuf::from(DEV_DATA_DIR)
}

/// Directory for daily rolling log files. `None` logs to stderr only.
pub fn get_log_dir() -> Option<PathBuf> {
    std::env::var("OTHELLO_LOG_DIR").ok().map(PathBuf::from)
}

pub fn get_inactivity_threshold() -> Duration {
    Duration::from_secs(secs_from_env(
        "OTHELLO_INACTIVITY_SECS",
        DEFAULT_INACTIVITY_SECS,
    ))
}

pub fn get_replay_ttl() -> Duration {
    Duration::from_secs(secs_from_env(
        "OTHELLO_REPLAY_TTL_SECS",
        DEFAULT_REPLAY_TTL_SECS,
    ))
}

/// Session tunables as configured by the environment.
pub fn session_config() -> SessionConfig {
    SessionConfig {
        inactivity_threshold: get_inactivity_threshold(),
        replay_ttl: get_replay_ttl(),
        event_capacity: DEFAULT_EVENT_CAPACITY,
    }
}

fn secs_from_env(var: &str, default: u64) -> u64 {
    match std::env::var(var) {
        Ok(raw) => parse_secs(&raw).unwrap_or_else(|| {
            tracing::warn!("Ignoring invalid {}={:?}, using {}", var, raw, default);
            default
        }),
        Err(_) => default,
    }
}

fn parse_secs(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}
