//! Error types for `roulette`
//!
//! One top-level error aggregates the configuration, round-state and
//! platform errors, and maps each of them to a process exit code.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `roulette` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Chat platform error (mute or send failed)
    pub const PLATFORM_ERROR: i32 = 4;

    /// Round state invariant violated
    pub const ROUND_ERROR: i32 = 5;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `roulette` operations.
#[derive(Debug, Error)]
pub enum RouletteError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Round state machine misuse
    #[error(transparent)]
    Round(#[from] RoundError),

    /// Mute or messaging primitive failed
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RouletteError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => ExitCode::CONFIG_ERROR,
            Self::Round(_) => ExitCode::ROUND_ERROR,
            Self::Platform(_) => ExitCode::PLATFORM_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Configuration validation failed
    #[error("validation failed for {path}: {}", summarize(.errors))]
    ValidationError {
        /// Path to the configuration file
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },

    /// Environment variable referenced in configuration is not set
    #[error("environment variable '{var}' not set: {message}")]
    EnvVarNotSet {
        /// Name of the environment variable
        var: String,
        /// Message supplied with the `${VAR:?message}` form
        message: String,
    },
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during configuration validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "escalation.time_step_min")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Prevents the configuration from being used
    Error,
    /// Reported, but the configuration still loads
    Warning,
}

// ============================================================================
// Round Errors
// ============================================================================

/// Round state machine errors.
///
/// These indicate a logic bug in the caller, never a user mistake.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoundError {
    /// An operation that needs a live round ran while none was active
    #[error("no active round for {operation}")]
    NoActiveRound {
        /// The operation that was attempted
        operation: &'static str,
    },
}

// ============================================================================
// Platform Errors
// ============================================================================

/// Failures reported by the chat platform primitives.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The mute call was rejected or failed
    #[error("failed to mute {user} in {room}: {reason}")]
    MuteFailed {
        /// Room the mute targeted
        room: String,
        /// User the mute targeted
        user: String,
        /// Platform-supplied reason
        reason: String,
    },

    /// A message could not be delivered
    #[error("failed to send message to {room}: {reason}")]
    SendFailed {
        /// Destination room
        room: String,
        /// Platform-supplied reason
        reason: String,
    },

    /// I/O error on the platform connection
    #[error("platform I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error on the platform connection
    #[error("platform JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `roulette` operations.
pub type Result<T> = std::result::Result<T, RouletteError>;

// ============================================================================
// Tests
// ============================================================================
