use std::fs;
use std::time::Duration;

use screenblank::blanker::{Blanker, HideStrategy, OverlayBackend, Screen};
use screenblank::config::{init_at, load_from, save_to, AppConfig};
use screenblank::display::{Bounds, DisplayInfo};
use screenblank::hotkeys::{bindings_with, Action, Flavor, Key};
use screenblank::Error;
use tempfile::TempDir;

#[test]
fn test_missing_config_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let config = load_from(&dir.path().join("absent.json")).unwrap();
    assert_eq!(config, AppConfig::default());
}

#[test]
fn test_config_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let mut config = AppConfig::default();
    config.background = "#101820".into();
    config.hide_delay_ms = 400;
    config.quit_when_all_closed = false;
    config.hotkeys.toggle_prefix = "Ctrl+Alt".into();

    save_to(&config, &path).unwrap();
    let loaded = load_from(&path).unwrap();

    assert_eq!(loaded, config);
    assert_eq!(loaded.hide_delay(), Duration::from_millis(400));
    assert_eq!(loaded.background_color().unwrap().to_string(), "#101820");
}

#[test]
fn test_partial_config_fills_in_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r##"{ "background": "#000000" }"##).unwrap();

    let loaded = load_from(&path).unwrap();
    assert_eq!(loaded.background, "#000000");
    assert_eq!(loaded.hide_delay_ms, 750);
    assert_eq!(loaded.hotkeys, AppConfig::default().hotkeys);
}

#[test]
fn test_init_never_overwrites() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    assert!(init_at(&path).unwrap());
    fs::write(&path, r#"{ "hide_delay_ms": 100 }"#).unwrap();
    assert!(!init_at(&path).unwrap());

    assert_eq!(load_from(&path).unwrap().hide_delay_ms, 100);
}

#[test]
fn test_malformed_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{ not json").unwrap();

    let err = load_from(&path).unwrap_err();
    assert!(matches!(err, Error::ConfigParse { .. }));
    assert!(err.to_string().contains("config.json"));
}

#[test]
fn test_invalid_values_are_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{ "background": "blue" }"#).unwrap();

    assert!(load_from(&path).is_err());
}

#[test]
fn test_global_key_on_unused_slot_digit_loads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{ "hotkeys": { "hide_all": "CmdOrCtrl+Shift+5" } }"#).unwrap();

    let config = load_from(&path).unwrap();
    let flavor = Flavor::current();
    assert_eq!(bindings_with(&config.hotkeys, 2, flavor).unwrap().len(), 4);
    assert!(matches!(
        bindings_with(&config.hotkeys, 5, flavor),
        Err(Error::DuplicateHotkey { .. })
    ));
}

#[test]
fn test_clashing_global_pair_is_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{ "hotkeys": { "hide_all": "F9", "show_all": "F9" } }"#).unwrap();

    assert!(matches!(load_from(&path), Err(Error::DuplicateHotkey { .. })));
}

#[test]
fn test_default_bindings_for_three_displays() {
    let table = bindings_with(&AppConfig::default().hotkeys, 3, Flavor::Pc).unwrap();

    let actions: Vec<Action> = table.iter().map(|b| b.action).collect();
    assert_eq!(
        actions,
        vec![
            Action::HideAll,
            Action::ShowAll,
            Action::Toggle(0),
            Action::Toggle(1),
            Action::Toggle(2),
        ]
    );
    assert_eq!(table[0].hotkey.key, Key::Escape);
    assert_eq!(table[4].hotkey.to_string(), "Ctrl+Shift+3");
}

#[test]
fn test_bindings_stop_at_nine_displays() {
    let table = bindings_with(&AppConfig::default().hotkeys, 12, Flavor::Mac).unwrap();
    assert_eq!(table.len(), 2 + 9);
    assert_eq!(table.last().unwrap().action, Action::Toggle(8));
}

/// Windows are display ids; fullscreen state is tracked, nothing is scheduled.
#[derive(Default)]
struct Headless {
    visible: Vec<u32>,
}

impl OverlayBackend for Headless {
    type Window = u32;

    fn show(&mut self, window: &u32) {
        if !self.visible.contains(window) {
            self.visible.push(*window);
        }
    }

    fn hide(&mut self, window: &u32) {
        self.visible.retain(|w| w != window);
    }

    fn set_fullscreen(&mut self, _window: &u32, _fullscreen: bool) {}

    fn is_fullscreen(&self, _window: &u32) -> bool {
        false
    }

    fn schedule_hide(&mut self, _slot: usize, _generation: u64, _delay: Duration) {}
}

fn screen(id: u32, x: i32) -> Screen<u32> {
    Screen::new(
        DisplayInfo {
            id,
            name: format!("Display {id}"),
            bounds: Bounds::new(x, 0, 1920, 1080),
            primary: x == 0,
        },
        id,
    )
}

#[test]
fn test_slot_shortcuts_follow_left_to_right_order() {
    let screens = vec![screen(1, 0), screen(2, -1920), screen(3, 1920)];
    let mut blanker = Blanker::new(Headless::default(), HideStrategy::Immediate, screens);
    blanker.show_all();

    let table = bindings_with(&AppConfig::default().hotkeys, blanker.len(), Flavor::Pc).unwrap();
    let toggle_first = table
        .iter()
        .find(|b| b.hotkey.key == Key::Digit(1))
        .unwrap()
        .action;

    blanker.dispatch(toggle_first);
    assert!(!blanker.backend().visible.contains(&2));
    assert!(blanker.screen(0).unwrap().is_hidden());

    blanker.dispatch(Action::HideAll);
    assert!(blanker.backend().visible.is_empty());

    blanker.dispatch(Action::ShowAll);
    assert_eq!(blanker.backend().visible.len(), 3);
}
