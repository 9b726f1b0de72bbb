// macOS backend: AppKit overlays, NSEvent key monitors, NSTimer deferred hides.
//
// All AppKit calls happen on the main thread. Callbacks (key monitors, timers,
// window and app delegates) reach the running app through a thread-local.

mod app;
mod hotkeys;
mod overlay;

use std::cell::RefCell;

use objc2::rc::Retained;
use objc2::MainThreadMarker;
use objc2_app_kit::NSRunningApplication;
use objc2_foundation::NSBundle;

use crate::blanker::{Blanker, HideStrategy, Screen};
use crate::config::AppConfig;
use crate::display::DisplayInfo;
use crate::error::{Error, Result};
use crate::hotkeys::{bindings as binding_table, Binding};
use overlay::{MacBackend, OverlayDelegate};

struct MacApp {
    blanker: Blanker<MacBackend>,
    bindings: Vec<Binding>,
    _delegates: Vec<Retained<OverlayDelegate>>,
}

thread_local! {
    static CONFIG: RefCell<Option<AppConfig>> = const { RefCell::new(None) };
    static APP: RefCell<Option<MacApp>> = const { RefCell::new(None) };
}

fn with_app<R>(f: impl FnOnce(&mut MacApp) -> R) -> Option<R> {
    APP.with(|cell| match cell.try_borrow_mut() {
        Ok(mut guard) => guard.as_mut().map(f),
        Err(_) => {
            tracing::warn!("app state busy, dropping re-entrant callback");
            None
        }
    })
}

fn main_thread() -> Result<MainThreadMarker> {
    MainThreadMarker::new().ok_or_else(|| Error::platform("screenblank must run on the main thread"))
}

/// Create overlays for every screen and make them the current app state.
fn start(mtm: MainThreadMarker) -> Result<()> {
    let config = CONFIG
        .with(|cell| cell.borrow().clone())
        .ok_or_else(|| Error::platform("configuration not set before launch"))?;
    let color = config.background_color()?;

    let mut screens = Vec::new();
    for (display, ns_screen) in overlay::enumerate(mtm) {
        if display.bounds.is_empty() {
            tracing::debug!(display = display.id, "skipping screen with empty frame");
            continue;
        }
        let window = overlay::create_overlay(mtm, &ns_screen, color);
        tracing::debug!(display = display.id, name = %display.name, bounds = %display.bounds, "overlay created");
        screens.push(Screen::new(display, window));
    }
    if screens.is_empty() {
        return Err(Error::NoDisplays);
    }

    let strategy = HideStrategy::for_current_platform(config.hide_delay());
    let mut blanker = Blanker::new(MacBackend::default(), strategy, screens);

    let delegates = blanker
        .screens()
        .iter()
        .enumerate()
        .map(|(slot, screen)| overlay::attach_delegate(mtm, screen.window(), slot))
        .collect();
    let bindings = binding_table(&config.hotkeys, blanker.len())?;

    blanker.show_all();
    tracing::info!(displays = blanker.len(), "screens blanked");

    APP.with(|cell| {
        *cell.borrow_mut() = Some(MacApp {
            blanker,
            bindings,
            _delegates: delegates,
        });
    });
    Ok(())
}

/// Dock click: rebuild the overlays if the user closed all of them.
fn reopen(mtm: MainThreadMarker) {
    let open = with_app(|app| app.blanker.open_count()).unwrap_or(0);
    if open > 0 {
        return;
    }
    tracing::info!("reactivated with no overlays, recreating");
    if let Err(e) = start(mtm) {
        tracing::error!(error = %e, "failed to recreate overlays");
    }
}

/// Called from the window delegate when a fullscreen animation ends.
fn fullscreen_settled(slot: usize) {
    with_app(|app| {
        let Some(window) = app.blanker.screen(slot).map(|s| s.window().clone()) else {
            return;
        };
        app.blanker.backend_mut().transition_finished(&window);
    });
}

/// Called from the window delegate. Closing every overlay does not quit on macOS.
fn overlay_closed(slot: usize) {
    with_app(|app| app.blanker.mark_closed(slot));
}

/// Blank every screen and run the AppKit event loop until Quit.
pub fn run(config: AppConfig) -> Result<()> {
    let mtm = main_thread()?;
    config.background_color()?;
    CONFIG.with(|cell| *cell.borrow_mut() = Some(config));
    app::run(mtm);
    tracing::info!("exiting");
    Ok(())
}

/// Screens in NSScreen order.
pub fn list_displays() -> Result<Vec<DisplayInfo>> {
    let mtm = main_thread()?;
    Ok(overlay::enumerate(mtm)
        .into_iter()
        .map(|(info, _)| info)
        .collect())
}

/// Another process with our bundle identifier. Unbundled builds never match.
pub fn is_already_running() -> bool {
    let Some(bundle_id) = NSBundle::mainBundle().bundleIdentifier() else {
        return false;
    };
    NSRunningApplication::runningApplicationsWithBundleIdentifier(&bundle_id).count() > 1
}
