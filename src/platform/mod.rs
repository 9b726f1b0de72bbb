// Native windowing and global hotkeys.
//
// Each backend exposes the same three entry points:
//   run(config)          -> create overlays, register hotkeys, run the event loop
//   list_displays()      -> connected displays in enumeration order
//   is_already_running() -> single-instance check
//
// plus attach_parent_console()/show_error() for reporting outside the event loop.

#[cfg(target_os = "windows")]
mod win32;
#[cfg(target_os = "windows")]
pub use win32::{attach_parent_console, is_already_running, list_displays, run, show_error};

/// Whether stdout/stderr reach a terminal. Only GUI-subsystem Windows builds
/// start without one.
#[cfg(not(target_os = "windows"))]
pub fn attach_parent_console() -> bool {
    true
}

/// Report a fatal error the user would otherwise never see.
#[cfg(not(target_os = "windows"))]
pub fn show_error(message: &str) {
    eprintln!("error: {message}");
}

#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "macos")]
pub use macos::{is_already_running, list_displays, run};

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
mod unsupported {
    use crate::config::AppConfig;
    use crate::display::DisplayInfo;
    use crate::error::{Error, Result};

    pub fn run(_config: AppConfig) -> Result<()> {
        Err(Error::UnsupportedPlatform(std::env::consts::OS))
    }

    pub fn list_displays() -> Result<Vec<DisplayInfo>> {
        Err(Error::UnsupportedPlatform(std::env::consts::OS))
    }

    pub fn is_already_running() -> bool {
        false
    }
}
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub use unsupported::{is_already_running, list_displays, run};

#[cfg(all(test, not(any(target_os = "windows", target_os = "macos"))))]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_run_reports_unsupported_platform() {
        let err = run(crate::AppConfig::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform(os) if os == std::env::consts::OS));
        assert!(list_displays().is_err());
        assert!(!is_already_running());
    }
}
