use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::hotkeys;

/// Application configuration stored in JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Overlay fill color as `#RRGGBB`
    pub background: String,
    /// macOS only: how long to wait after leaving fullscreen before hiding
    pub hide_delay_ms: u64,
    /// Quit once every overlay window has been closed (ignored on macOS)
    pub quit_when_all_closed: bool,
    pub hotkeys: HotkeyConfig,
}

/// Accelerators for the global shortcuts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    pub hide_all: String,
    pub show_all: String,
    /// Modifiers combined with the digits 1-9 to toggle a single display
    pub toggle_prefix: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            background: "#FFFFFF".into(),
            hide_delay_ms: 750,
            quit_when_all_closed: true,
            hotkeys: HotkeyConfig::default(),
        }
    }
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            hide_all: "Esc".into(),
            show_all: "CmdOrCtrl+Shift+B".into(),
            toggle_prefix: "CmdOrCtrl+Shift".into(),
        }
    }
}

impl AppConfig {
    pub fn background_color(&self) -> Result<Rgb> {
        self.background.parse()
    }

    pub fn hide_delay(&self) -> Duration {
        Duration::from_millis(self.hide_delay_ms)
    }

    /// Check everything that would otherwise only fail once windows are up.
    ///
    /// Slot shortcuts depend on how many displays are connected, so clashes
    /// between them and the global pair are left to the binding table built
    /// at startup.
    pub fn validate(&self) -> Result<()> {
        self.background_color()?;
        if self.hide_delay_ms > 10_000 {
            return Err(Error::config_validation(format!(
                "hide_delay_ms must be at most 10000, got {}",
                self.hide_delay_ms
            )));
        }
        hotkeys::bindings(&self.hotkeys, 0)?;
        Ok(())
    }
}

/// An opaque 8-bit-per-channel color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// GDI `COLORREF` layout: 0x00BBGGRR.
    pub fn to_colorref(self) -> u32 {
        u32::from(self.r) | (u32::from(self.g) << 8) | (u32::from(self.b) << 16)
    }

    /// Components in 0.0..=1.0 for AppKit.
    pub fn to_unit(self) -> (f64, f64, f64) {
        (
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
        )
    }
}

impl FromStr for Rgb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Rgb> {
        let hex = s.trim().trim_start_matches('#');
        let invalid = || Error::config_validation(format!("background must be #RRGGBB, got '{s}'"));
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Rgb {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

pub fn config_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("screenblank").join("config.json")
}

/// Load and validate the config at `path`. A missing file means defaults.
pub fn load_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(AppConfig::default());
    }
    let data = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config: AppConfig = serde_json::from_str(&data).map_err(|source| Error::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

pub fn save_to(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(config)?;
    fs::write(path, data)?;
    Ok(())
}

/// Write defaults to `path` unless a file is already there. Returns whether
/// a file was written.
pub fn init_at(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_to(&AppConfig::default(), path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        AppConfig::default().validate().unwrap();
        assert_eq!(AppConfig::default().hide_delay(), Duration::from_millis(750));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let cfg: AppConfig =
            serde_json::from_str(r##"{ "background": "#000000", "hotkeys": { "hide_all": "F12" } }"##).unwrap();
        assert_eq!(cfg.background, "#000000");
        assert_eq!(cfg.hotkeys.hide_all, "F12");
        assert_eq!(cfg.hotkeys.show_all, "CmdOrCtrl+Shift+B");
        assert_eq!(cfg.hide_delay_ms, 750);
        assert!(cfg.quit_when_all_closed);
    }

    #[test]
    fn test_rgb_parse() {
        assert_eq!("#ff8000".parse::<Rgb>().unwrap(), Rgb { r: 255, g: 128, b: 0 });
        assert_eq!("00FF00".parse::<Rgb>().unwrap(), Rgb { r: 0, g: 255, b: 0 });
        for bad in ["#fff", "#gg0000", "", "#1234567", "#ÿÿÿ"] {
            assert!(bad.parse::<Rgb>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_rgb_conversions() {
        let c = Rgb { r: 0x11, g: 0x22, b: 0x33 };
        assert_eq!(c.to_colorref(), 0x0033_2211);
        assert_eq!(c.to_string(), "#112233");
        let (r, _, b) = Rgb { r: 255, g: 0, b: 0 }.to_unit();
        assert!((r - 1.0).abs() < f64::EPSILON);
        assert!(b.abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cfg = AppConfig {
            background: "white".into(),
            ..AppConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::ConfigValidation { .. })));

        let cfg = AppConfig {
            hide_delay_ms: 60_000,
            ..AppConfig::default()
        };
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.hotkeys.show_all = "Esc".into();
        assert!(matches!(cfg.validate(), Err(Error::DuplicateHotkey { .. })));

        let mut cfg = AppConfig::default();
        cfg.hotkeys.toggle_prefix = "Shift+Q".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_ignores_slot_shortcuts() {
        let mut cfg = AppConfig::default();
        cfg.hotkeys.hide_all = "CmdOrCtrl+Shift+5".into();
        cfg.validate().unwrap();

        // The clash only exists with a fifth display.
        assert!(hotkeys::bindings(&cfg.hotkeys, 2).is_ok());
        assert!(matches!(
            hotkeys::bindings(&cfg.hotkeys, 5),
            Err(Error::DuplicateHotkey { .. })
        ));
    }
}
