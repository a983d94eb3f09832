//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use streamtopo_config::ConfigError;
use streamtopo_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to controller at {url}")]
    #[diagnostic(
        code(streamtopo::connection_failed),
        help(
            "Check that the controller is running and accessible.\n\
             URL: {url}\n\
             Try: streamtopo snapshot --controller http://127.0.0.1:8080"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(streamtopo::timeout),
        help("Increase timeout with --timeout or check controller responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(streamtopo::not_found),
        help("Run: streamtopo snapshot --view {view} to see what the controller knows")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        view: String,
    },

    // ── Controller replies ───────────────────────────────────────────
    #[error("Controller rejected {action}: {stat}")]
    #[diagnostic(code(streamtopo::rejected))]
    Rejected { action: String, stat: String },

    #[error("API error: {message}")]
    #[diagnostic(code(streamtopo::api_error))]
    ApiError {
        message: String,
        status: Option<u16>,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(streamtopo::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(streamtopo::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: streamtopo config add <name> <url>"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No controller configured")]
    #[diagnostic(
        code(streamtopo::no_config),
        help(
            "Pass --controller <url>, set STREAMTOPO_CONTROLLER, or create a profile:\n\
             streamtopo config add default http://127.0.0.1:8080\n\
             Config file: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(streamtopo::config))]
    Config(ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(streamtopo::render))]
    Render(String),

    #[error("Internal error: {0}")]
    #[diagnostic(code(streamtopo::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Validation { .. } | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },

            CoreError::ControllerDisconnected => Self::ConnectionFailed {
                url: "(disconnected)".into(),
                reason: "controller connection was lost".into(),
            },

            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },

            CoreError::SwitchNotFound { dpid } => Self::NotFound {
                resource_type: "switch".into(),
                identifier: dpid,
                view: "switches".into(),
            },

            CoreError::HostNotFound { mac } => Self::NotFound {
                resource_type: "host".into(),
                identifier: mac,
                view: "hosts".into(),
            },

            CoreError::UnknownStream { stream_id } => Self::NotFound {
                resource_type: "stream".into(),
                identifier: stream_id.to_string(),
                view: "streams".into(),
            },

            CoreError::Rejected { action, stat } => Self::Rejected { action, stat },

            CoreError::Api { message, status } => Self::ApiError { message, status },

            CoreError::Config { message } => Self::Validation {
                field: "controller".into(),
                reason: message,
            },

            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name, available } => {
                Self::ProfileNotFound { name, available }
            }
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let cases = [
            (
                CoreError::HostNotFound { mac: "aa".into() },
                exit_code::NOT_FOUND,
            ),
            (
                CoreError::UnknownStream { stream_id: 4 },
                exit_code::NOT_FOUND,
            ),
            (
                CoreError::Rejected {
                    action: "source_for".into(),
                    stat: "fail".into(),
                },
                exit_code::REJECTED,
            ),
            (CoreError::Timeout { timeout_secs: 3 }, exit_code::TIMEOUT),
            (CoreError::ControllerDisconnected, exit_code::CONNECTION),
            (CoreError::Internal("x".into()), exit_code::GENERAL),
        ];
        for (core, code) in cases {
            assert_eq!(CliError::from(core).exit_code(), code);
        }
    }

    #[test]
    fn config_validation_is_usage_error() {
        let err = CliError::from(ConfigError::Validation {
            field: "ws_path".into(),
            reason: "bad".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
