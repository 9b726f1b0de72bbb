//! screenblank: blank every connected display with a fullscreen overlay and
//! toggle the overlays with global keyboard shortcuts.
//!
//! The platform-neutral pieces live here (display ordering, accelerator
//! parsing, the per-window show/hide state machine, configuration). The
//! native windowing and hotkey plumbing lives under [`platform`].

pub mod blanker;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod hotkeys;
pub mod logging;
pub mod platform;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use logging::init_logging;
