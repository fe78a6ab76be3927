//! Runtime configuration read from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `CLINICDESK_DB_PATH` | `clinicdesk.db` (`:memory:` for a throwaway store) |
//! | `CLINICDESK_BIND_ADDR` | `127.0.0.1:5000` |
//! | `CLINICDESK_LOG_MODE` | `stdout` (or `file`) |
//! | `CLINICDESK_LOG_FILE` | `clinicdesk.log` |

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::ClinicError;

const DB_PATH_ENV: &str = "CLINICDESK_DB_PATH";
const BIND_ADDR_ENV: &str = "CLINICDESK_BIND_ADDR";
const LOG_MODE_ENV: &str = "CLINICDESK_LOG_MODE";
const LOG_FILE_ENV: &str = "CLINICDESK_LOG_FILE";

const DEFAULT_DB_PATH: &str = "clinicdesk.db";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_LOG_FILE: &str = "clinicdesk.log";

/// Path value that selects an in-memory database.
pub const IN_MEMORY_DB: &str = ":memory:";

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    #[default]
    Stdout,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: String,
    pub bind_addr: SocketAddr,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Config {
    /// Read configuration from process environment variables.
    ///
    /// # Errors
    /// Returns `ClinicError::Config` for an unparseable address or log mode.
    pub fn from_env() -> Result<Self, ClinicError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns `ClinicError::Config` for an unparseable address or log mode.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClinicError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = read(BIND_ADDR_ENV).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| ClinicError::Config(format!("{BIND_ADDR_ENV}={bind_raw}: {e}")))?;

        let log_mode = match read(LOG_MODE_ENV).as_deref() {
            None | Some("stdout") => LogMode::Stdout,
            Some("file") => LogMode::File,
            Some(other) => {
                return Err(ClinicError::Config(format!(
                    "{LOG_MODE_ENV}={other}: expected \"stdout\" or \"file\""
                )))
            }
        };

        Ok(Self {
            db_path: read(DB_PATH_ENV).unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            bind_addr,
            log_mode,
            log_file: read(LOG_FILE_ENV)
                .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string())
                .into(),
        })
    }

    /// Whether the store should live in memory only.
    #[must_use]
    pub fn in_memory(&self) -> bool {
        self.db_path == IN_MEMORY_DB
    }
}
