//! Error types for screenblank.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for screenblank operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// The configuration file exists but could not be read.
    #[error("failed to read configuration at {path}: {source}")]
    ConfigRead {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`crate::AppConfig`].
    #[error("invalid configuration at {path}: {source}")]
    ConfigParse {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// A configuration value is out of range or malformed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Hotkey Errors ===
    /// An accelerator string could not be parsed.
    #[error("invalid hotkey '{accelerator}': {reason}")]
    HotkeyParse {
        /// The accelerator as written by the user.
        accelerator: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two actions share the same accelerator.
    #[error("hotkey {accelerator} is bound to more than one action")]
    DuplicateHotkey {
        /// Canonical form of the duplicated accelerator.
        accelerator: String,
    },

    /// The OS refused to register a global hotkey.
    #[error("failed to register hotkey {accelerator}: {message}")]
    HotkeyRegister {
        /// Canonical form of the accelerator.
        accelerator: String,
        /// Description of what went wrong.
        message: String,
    },

    // === Window Errors ===
    /// No displays were reported by the windowing system.
    #[error("no displays found")]
    NoDisplays,

    /// An overlay window could not be created.
    #[error("failed to create overlay window for display {display}: {message}")]
    WindowCreate {
        /// Display id the window was meant for.
        display: u32,
        /// Description of what went wrong.
        message: String,
    },

    // === Platform Errors ===
    /// Platform-specific operation failed.
    #[error("platform error: {0}")]
    Platform(String),

    /// The current OS has no windowing backend.
    #[error("{0} is not supported (screenblank runs on Windows and macOS)")]
    UnsupportedPlatform(&'static str),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for screenblank operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new platform error.
    #[must_use]
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform(message.into())
    }

    /// Create a hotkey parse error.
    #[must_use]
    pub fn hotkey_parse(accelerator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::HotkeyParse {
            accelerator: accelerator.into(),
            reason: reason.into(),
        }
    }

    /// Create a hotkey registration error.
    #[must_use]
    pub fn hotkey_register(accelerator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HotkeyRegister {
            accelerator: accelerator.into(),
            message: message.into(),
        }
    }

    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(Error::NoDisplays.to_string(), "no displays found");
        assert_eq!(
            Error::platform("boom").to_string(),
            "platform error: boom"
        );
    }

    #[test]
    fn test_hotkey_parse_error_display() {
        let err = Error::hotkey_parse("Ctrl+Hyper+X", "unknown modifier 'Hyper'");
        let msg = err.to_string();
        assert!(msg.contains("Ctrl+Hyper+X"));
        assert!(msg.contains("unknown modifier"));
    }

    #[test]
    fn test_unsupported_platform_display() {
        let msg = Error::UnsupportedPlatform("linux").to_string();
        assert!(msg.starts_with("linux is not supported"));
    }

    #[test]
    fn test_config_read_error_display() {
        let err = Error::ConfigRead {
            path: PathBuf::from("/etc/screenblank.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/etc/screenblank.json"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<i32>("nope").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
