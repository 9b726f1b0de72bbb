// Global hotkey accelerators and the binding table.
//
// Accelerators are written as `Modifier+Modifier+Key`, e.g. `CmdOrCtrl+Shift+B`.
// `CmdOrCtrl` resolves to Command on macOS and Control everywhere else, so one
// config file works on both platforms.
//
// Default bindings:
//   Esc                  -> hide every overlay
//   CmdOrCtrl+Shift+B    -> show every overlay
//   CmdOrCtrl+Shift+1..9 -> toggle the overlay on the Nth display from the left

use std::collections::HashSet;
use std::fmt;

use crate::config::HotkeyConfig;
use crate::error::{Error, Result};

/// Only digits 1-9 exist as single keys, so that is the slot shortcut limit.
pub const MAX_SLOT_SHORTCUTS: usize = 9;

/// Which keyboard convention `CmdOrCtrl` and canonical names follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavor {
    Mac,
    Pc,
}

impl Flavor {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Flavor::Mac
        } else {
            Flavor::Pc
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub control: bool,
    pub command: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        control: false,
        command: false,
        shift: false,
        alt: false,
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }

    /// Parse a modifier-only prefix such as `CmdOrCtrl+Shift`. An empty string
    /// means no modifiers.
    pub fn parse(prefix: &str, flavor: Flavor) -> Result<Modifiers> {
        let mut mods = Modifiers::NONE;
        if prefix.trim().is_empty() {
            return Ok(mods);
        }
        for token in prefix.split('+') {
            let token = token.trim();
            if !mods.apply(token, flavor) {
                return Err(Error::hotkey_parse(
                    prefix,
                    format!("unknown modifier '{token}'"),
                ));
            }
        }
        Ok(mods)
    }

    /// Set the flag named by `token`. Returns false if it names no modifier.
    fn apply(&mut self, token: &str, flavor: Flavor) -> bool {
        match token.to_ascii_lowercase().as_str() {
            "cmdorctrl" | "commandorcontrol" => match flavor {
                Flavor::Mac => self.command = true,
                Flavor::Pc => self.control = true,
            },
            "ctrl" | "control" => self.control = true,
            "cmd" | "command" | "super" | "meta" | "win" => self.command = true,
            "shift" => self.shift = true,
            "alt" | "option" => self.alt = true,
            _ => return false,
        }
        true
    }

    /// `HOT_KEY_MODIFIERS` bits for `RegisterHotKey` (without `MOD_NOREPEAT`).
    pub fn win32_flags(&self) -> u32 {
        const MOD_ALT: u32 = 0x0001;
        const MOD_CONTROL: u32 = 0x0002;
        const MOD_SHIFT: u32 = 0x0004;
        const MOD_WIN: u32 = 0x0008;

        let mut flags = 0;
        if self.alt {
            flags |= MOD_ALT;
        }
        if self.control {
            flags |= MOD_CONTROL;
        }
        if self.shift {
            flags |= MOD_SHIFT;
        }
        if self.command {
            flags |= MOD_WIN;
        }
        flags
    }

    fn names(&self, flavor: Flavor) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(4);
        match flavor {
            Flavor::Mac => {
                if self.command {
                    names.push("Cmd");
                }
                if self.control {
                    names.push("Ctrl");
                }
                if self.alt {
                    names.push("Option");
                }
            }
            Flavor::Pc => {
                if self.control {
                    names.push("Ctrl");
                }
                if self.command {
                    names.push("Win");
                }
                if self.alt {
                    names.push("Alt");
                }
            }
        }
        if self.shift {
            names.push("Shift");
        }
        names
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// `A`-`Z`, stored uppercase.
    Letter(char),
    /// `0`-`9`.
    Digit(u8),
    /// `F1`-`F24`.
    Function(u8),
    Escape,
    Space,
    Enter,
    Tab,
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    pub fn parse(token: &str) -> Option<Key> {
        let mut chars = token.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_alphabetic() {
                return Some(Key::Letter(c.to_ascii_uppercase()));
            }
            if let Some(d) = c.to_digit(10) {
                return Some(Key::Digit(d as u8));
            }
            return None;
        }

        let lower = token.to_ascii_lowercase();
        if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
            return (1..=24).contains(&n).then_some(Key::Function(n));
        }
        match lower.as_str() {
            "esc" | "escape" => Some(Key::Escape),
            "space" => Some(Key::Space),
            "enter" | "return" => Some(Key::Enter),
            "tab" => Some(Key::Tab),
            "up" => Some(Key::Up),
            "down" => Some(Key::Down),
            "left" => Some(Key::Left),
            "right" => Some(Key::Right),
            _ => None,
        }
    }

    /// Win32 virtual-key code.
    pub fn win32_vk(&self) -> u32 {
        match *self {
            // VK_A..VK_Z and VK_0..VK_9 are their ASCII codes.
            Key::Letter(c) => c as u32,
            Key::Digit(d) => 0x30 + u32::from(d),
            Key::Function(n) => 0x70 + u32::from(n) - 1,
            Key::Escape => 0x1B,
            Key::Space => 0x20,
            Key::Enter => 0x0D,
            Key::Tab => 0x09,
            Key::Left => 0x25,
            Key::Up => 0x26,
            Key::Right => 0x27,
            Key::Down => 0x28,
        }
    }

    /// macOS virtual key code (ANSI layout). F21-F24 do not exist on Mac keyboards.
    pub fn mac_keycode(&self) -> Option<u16> {
        let code = match *self {
            Key::Letter(c) => match c {
                'A' => 0x00,
                'S' => 0x01,
                'D' => 0x02,
                'F' => 0x03,
                'H' => 0x04,
                'G' => 0x05,
                'Z' => 0x06,
                'X' => 0x07,
                'C' => 0x08,
                'V' => 0x09,
                'B' => 0x0B,
                'Q' => 0x0C,
                'W' => 0x0D,
                'E' => 0x0E,
                'R' => 0x0F,
                'Y' => 0x10,
                'T' => 0x11,
                'O' => 0x1F,
                'U' => 0x20,
                'I' => 0x22,
                'P' => 0x23,
                'L' => 0x25,
                'J' => 0x26,
                'K' => 0x28,
                'N' => 0x2D,
                'M' => 0x2E,
                _ => return None,
            },
            Key::Digit(d) => match d {
                1 => 0x12,
                2 => 0x13,
                3 => 0x14,
                4 => 0x15,
                5 => 0x17,
                6 => 0x16,
                7 => 0x1A,
                8 => 0x1C,
                9 => 0x19,
                0 => 0x1D,
                _ => return None,
            },
            Key::Function(n) => match n {
                1 => 0x7A,
                2 => 0x78,
                3 => 0x63,
                4 => 0x76,
                5 => 0x60,
                6 => 0x61,
                7 => 0x62,
                8 => 0x64,
                9 => 0x65,
                10 => 0x6D,
                11 => 0x67,
                12 => 0x6F,
                13 => 0x69,
                14 => 0x6B,
                15 => 0x71,
                16 => 0x6A,
                17 => 0x40,
                18 => 0x4F,
                19 => 0x50,
                20 => 0x5A,
                _ => return None,
            },
            Key::Escape => 0x35,
            Key::Space => 0x31,
            Key::Enter => 0x24,
            Key::Tab => 0x30,
            Key::Left => 0x7B,
            Key::Right => 0x7C,
            Key::Down => 0x7D,
            Key::Up => 0x7E,
        };
        Some(code)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Letter(c) => write!(f, "{c}"),
            Key::Digit(d) => write!(f, "{d}"),
            Key::Function(n) => write!(f, "F{n}"),
            Key::Escape => f.write_str("Esc"),
            Key::Space => f.write_str("Space"),
            Key::Enter => f.write_str("Enter"),
            Key::Tab => f.write_str("Tab"),
            Key::Up => f.write_str("Up"),
            Key::Down => f.write_str("Down"),
            Key::Left => f.write_str("Left"),
            Key::Right => f.write_str("Right"),
        }
    }
}

/// A parsed accelerator: a set of modifiers plus exactly one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub modifiers: Modifiers,
    pub key: Key,
    flavor: Flavor,
}

impl Hotkey {
    pub fn new(modifiers: Modifiers, key: Key, flavor: Flavor) -> Self {
        Self {
            modifiers,
            key,
            flavor,
        }
    }

    /// Parse using the current platform's meaning of `CmdOrCtrl`.
    pub fn parse(accelerator: &str) -> Result<Hotkey> {
        Self::parse_with(accelerator, Flavor::current())
    }

    pub fn parse_with(accelerator: &str, flavor: Flavor) -> Result<Hotkey> {
        let mut modifiers = Modifiers::NONE;
        let mut key = None;

        for token in accelerator.split('+') {
            let token = token.trim();
            if token.is_empty() {
                return Err(Error::hotkey_parse(accelerator, "empty key name"));
            }
            if modifiers.apply(token, flavor) {
                continue;
            }
            let parsed = Key::parse(token).ok_or_else(|| {
                Error::hotkey_parse(accelerator, format!("unknown key '{token}'"))
            })?;
            if key.replace(parsed).is_some() {
                return Err(Error::hotkey_parse(accelerator, "more than one key"));
            }
        }

        let key = key.ok_or_else(|| Error::hotkey_parse(accelerator, "no key given"))?;
        Ok(Hotkey::new(modifiers, key, flavor))
    }

    /// Same modifiers, different key.
    pub fn with_key(&self, key: Key) -> Hotkey {
        Hotkey { key, ..*self }
    }

    /// Exact match against a key press: extra held modifiers do not match.
    pub fn matches_mac(&self, keycode: u16, modifiers: Modifiers) -> bool {
        self.modifiers == modifiers && self.key.mac_keycode() == Some(keycode)
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in self.modifiers.names(self.flavor) {
            write!(f, "{name}+")?;
        }
        write!(f, "{}", self.key)
    }
}

/// What a hotkey does to the overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    HideAll,
    ShowAll,
    /// Toggle the overlay in the given 0-based slot.
    Toggle(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub hotkey: Hotkey,
    pub action: Action,
}

/// Build the binding table for `display_count` overlays.
pub fn bindings(config: &HotkeyConfig, display_count: usize) -> Result<Vec<Binding>> {
    bindings_with(config, display_count, Flavor::current())
}

pub fn bindings_with(
    config: &HotkeyConfig,
    display_count: usize,
    flavor: Flavor,
) -> Result<Vec<Binding>> {
    let mut table = vec![
        Binding {
            hotkey: Hotkey::parse_with(&config.hide_all, flavor)?,
            action: Action::HideAll,
        },
        Binding {
            hotkey: Hotkey::parse_with(&config.show_all, flavor)?,
            action: Action::ShowAll,
        },
    ];

    let prefix = Modifiers::parse(&config.toggle_prefix, flavor)?;
    if display_count > MAX_SLOT_SHORTCUTS {
        tracing::warn!(
            displays = display_count,
            "only the first {MAX_SLOT_SHORTCUTS} displays get a toggle shortcut"
        );
    }
    for slot in 0..display_count.min(MAX_SLOT_SHORTCUTS) {
        table.push(Binding {
            hotkey: Hotkey::new(prefix, Key::Digit(slot as u8 + 1), flavor),
            action: Action::Toggle(slot),
        });
    }

    let mut seen = HashSet::new();
    for binding in &table {
        if !seen.insert((binding.hotkey.modifiers, binding.hotkey.key)) {
            return Err(Error::DuplicateHotkey {
                accelerator: binding.hotkey.to_string(),
            });
        }
    }

    Ok(table)
}

/// Registration ids for OS hotkey APIs are `HOTKEY_ID_BASE + index` into
/// the binding table. Zero is avoided since some APIs treat it as "none".
pub const HOTKEY_ID_BASE: i32 = 1;

pub fn hotkey_id(index: usize) -> i32 {
    HOTKEY_ID_BASE + index as i32
}

/// Map a registration id back to its action.
pub fn action_for_id(bindings: &[Binding], id: i32) -> Option<Action> {
    let index = usize::try_from(id.checked_sub(HOTKEY_ID_BASE)?).ok()?;
    bindings.get(index).map(|b| b.action)
}

/// Find the action for a macOS key press.
pub fn match_mac(bindings: &[Binding], keycode: u16, modifiers: Modifiers) -> Option<Action> {
    bindings
        .iter()
        .find(|b| b.hotkey.matches_mac(keycode, modifiers))
        .map(|b| b.action)
}
