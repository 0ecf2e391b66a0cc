//! Server configuration from the environment.

use std::{env, path::PathBuf, time::Duration};

use wiifit_sync::sans::session::SessionConfig;

use crate::logging::LogFormat;

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8888;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: String,
    pub port: u16,
    /// Directory standing in for the console's NAND root.
    pub nand_root: PathBuf,
    /// A save file to read instead of searching the NAND root.
    pub save: Option<PathBuf>,
    pub session: SessionConfig,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from `WIIFIT_SYNC_*` variables and `LOG_FORMAT`.
    ///
    /// Unset or unparseable variables take their defaults.
    pub fn from_env() -> Self {
        let defaults = SessionConfig::default();

        let session = SessionConfig {
            request_timeout: env_duration_ms(
                "WIIFIT_SYNC_REQUEST_TIMEOUT_MS",
                defaults.request_timeout,
            ),
            ack_timeout: env_duration_ms("WIIFIT_SYNC_ACK_TIMEOUT_MS", defaults.ack_timeout),
            send_timeout: env_duration_ms("WIIFIT_SYNC_SEND_TIMEOUT_MS", defaults.send_timeout),
            ..defaults
        };

        Self {
            bind: env::var("WIIFIT_SYNC_BIND").unwrap_or_else(|_| DEFAULT_BIND.into()),
            port: env_u16("WIIFIT_SYNC_PORT", DEFAULT_PORT),
            nand_root: env::var_os("WIIFIT_SYNC_NAND_ROOT")
                .map_or_else(|| PathBuf::from("."), PathBuf::from),
            save: env::var_os("WIIFIT_SYNC_SAVE").map(PathBuf::from),
            session,
            log_format: LogFormat::from_env(),
        }
    }

    /// One-line description for the startup log.
    pub fn summary(&self) -> String {
        let source = match &self.save {
            Some(path) => format!("save={}", path.display()),
            None => format!("nand_root={}", self.nand_root.display()),
        };

        format!(
            "listen={}:{} {source} request_timeout={:?} ack_timeout={:?}",
            self.bind, self.port, self.session.request_timeout, self.session.ack_timeout,
        )
    }
}

fn env_u16(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(default)
}

fn env_duration_ms(name: &str, default: Duration) -> Duration {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}
