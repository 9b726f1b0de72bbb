// Win32 backend: overlays, RegisterHotKey, tray icon and the message loop.
//
// Everything runs on the thread that calls `run`. Window procedures reach the
// running app through a thread-local, so hotkeys and menu commands land on
// the same `Blanker`.

mod console;
mod hotkeys;
mod monitors;
mod overlay;
mod tray;

pub use console::{attach_parent_console, show_error};
pub use monitors::list_displays;

use std::cell::RefCell;

use windows::core::PCWSTR;
use windows::Win32::Foundation::{GetLastError, ERROR_ALREADY_EXISTS, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::CreateMutexW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW, IsWindow,
    PostQuitMessage, RegisterClassW, TranslateMessage, MSG, WINDOW_EX_STYLE, WM_COMMAND,
    WM_HOTKEY, WM_LBUTTONUP, WM_RBUTTONUP, WNDCLASSW, WS_OVERLAPPED,
};

use crate::blanker::{Blanker, HideStrategy, LastClose, Screen};
use crate::config::AppConfig;
use crate::display;
use crate::error::{Error, Result};
use crate::hotkeys::{action_for_id, bindings as binding_table, Binding};
use overlay::{OverlayWindow, Win32Backend, WM_FINISH_HIDE};
use tray::{TrayCommand, TrayIcon};

/// Session-local, so each signed-in user gets their own instance.
const INSTANCE_MUTEX_NAME: &str = "Local\\screenblank-single-instance\0";
const HOST_CLASS_NAME: &str = "ScreenblankHost\0";

struct App {
    blanker: Blanker<Win32Backend>,
    bindings: Vec<Binding>,
    last_close: LastClose,
}

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
    // Separate from APP: the tray menu runs a modal loop that still
    // dispatches hotkeys.
    static TRAY: RefCell<Option<TrayIcon>> = const { RefCell::new(None) };
}

fn with_app(f: impl FnOnce(&mut App)) {
    APP.with(|cell| match cell.try_borrow_mut() {
        Ok(mut guard) => {
            if let Some(app) = guard.as_mut() {
                f(app);
            }
        }
        Err(_) => tracing::warn!("app state busy, dropping re-entrant window message"),
    });
}

/// Called from the overlay window proc on WM_DESTROY.
fn overlay_destroyed(hwnd: HWND) {
    with_app(|app| {
        let Some(slot) = app.blanker.find_slot(|w| w.hwnd == hwnd) else {
            return;
        };
        app.blanker.mark_closed(slot);
        if app.blanker.should_quit(app.last_close) {
            tracing::info!("all overlays closed, quitting");
            unsafe { PostQuitMessage(0) };
        }
    });
}

/// Hidden window that owns the hotkeys and the tray icon.
unsafe extern "system" fn host_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_HOTKEY => {
            let id = wparam.0 as i32;
            with_app(|app| {
                if let Some(action) = action_for_id(&app.bindings, id) {
                    app.blanker.dispatch(action);
                }
            });
            LRESULT(0)
        }
        WM_FINISH_HIDE => {
            let (slot, generation) = (wparam.0, lparam.0 as u64);
            with_app(|app| app.blanker.finish_hide(slot, generation));
            LRESULT(0)
        }
        tray::WM_TRAY_ICON => {
            let event = (lparam.0 & 0xFFFF) as u32;
            if event == WM_RBUTTONUP || event == WM_LBUTTONUP {
                TRAY.with(|cell| {
                    if let Ok(tray) = cell.try_borrow() {
                        if let Some(tray) = tray.as_ref() {
                            tray.show_menu();
                        }
                    }
                });
            }
            LRESULT(0)
        }
        WM_COMMAND => {
            match TrayCommand::from_id((wparam.0 & 0xFFFF) as u32) {
                Some(TrayCommand::Blank(action)) => with_app(|app| app.blanker.dispatch(action)),
                Some(TrayCommand::Quit) => PostQuitMessage(0),
                None => {}
            }
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

fn create_host_window() -> Result<HWND> {
    let class_name: Vec<u16> = HOST_CLASS_NAME.encode_utf16().collect();
    let title: Vec<u16> = "screenblank\0".encode_utf16().collect();

    unsafe {
        let hinstance = GetModuleHandleW(PCWSTR::null())
            .map_err(|e| Error::platform(format!("GetModuleHandleW: {e}")))?;

        let wc = WNDCLASSW {
            lpfnWndProc: Some(host_proc),
            hInstance: hinstance.into(),
            lpszClassName: PCWSTR(class_name.as_ptr()),
            ..Default::default()
        };
        if RegisterClassW(&wc) == 0 {
            return Err(Error::platform("RegisterClassW failed for host class"));
        }

        // Never shown.
        CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            PCWSTR(class_name.as_ptr()),
            PCWSTR(title.as_ptr()),
            WS_OVERLAPPED,
            0,
            0,
            0,
            0,
            None,
            None,
            Some(hinstance.into()),
            None,
        )
        .map_err(|e| Error::platform(format!("failed to create host window: {e}")))
    }
}

/// Blank every monitor and run the message loop until Quit.
pub fn run(config: AppConfig) -> Result<()> {
    let color = config.background_color()?;
    let displays = display::arrange(list_displays()?);
    if displays.is_empty() {
        return Err(Error::NoDisplays);
    }

    let host = create_host_window()?;
    overlay::register_class(color)?;

    let mut screens: Vec<Screen<OverlayWindow>> = Vec::with_capacity(displays.len());
    for display in displays {
        match overlay::create_overlay(&display) {
            Ok(window) => screens.push(Screen::new(display, window)),
            Err(e) => tracing::warn!(error = %e, "skipping display"),
        }
    }
    if screens.is_empty() {
        unsafe {
            let _ = DestroyWindow(host);
        }
        return Err(Error::platform("no overlay window could be created"));
    }

    let backend = Win32Backend::new(host);
    let strategy = HideStrategy::for_current_platform(config.hide_delay());
    let blanker = Blanker::new(backend, strategy, screens);

    let bindings = binding_table(&config.hotkeys, blanker.len())?;
    let registered = hotkeys::register_all(host, &bindings);
    let binding_count = bindings.len();
    let tray = TrayIcon::add(host, blanker.len(), &bindings);

    tracing::info!(
        displays = blanker.len(),
        hotkeys = registered,
        "screens blanked"
    );

    APP.with(|cell| {
        *cell.borrow_mut() = Some(App {
            blanker,
            bindings,
            last_close: LastClose::for_current_platform(config.quit_when_all_closed),
        });
    });
    TRAY.with(|cell| *cell.borrow_mut() = tray);

    // Win32 message loop
    unsafe {
        let mut msg = MSG::default();
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }

    // Cleanup
    hotkeys::unregister_all(host, binding_count);
    TRAY.with(|cell| drop(cell.borrow_mut().take()));
    let app = APP.with(|cell| cell.borrow_mut().take());
    if let Some(app) = app {
        let (_, overlays) = app.blanker.into_parts();
        for window in overlays {
            unsafe {
                if IsWindow(Some(window.hwnd)).as_bool() {
                    let _ = DestroyWindow(window.hwnd);
                }
            }
        }
    }
    unsafe {
        let _ = DestroyWindow(host);
    }
    tracing::info!("exiting");
    Ok(())
}

/// Whether another screenblank already holds the instance mutex. The first
/// caller keeps the mutex open until it exits.
pub fn is_already_running() -> bool {
    let name: Vec<u16> = INSTANCE_MUTEX_NAME.encode_utf16().collect();
    match unsafe { CreateMutexW(None, false, PCWSTR(name.as_ptr())) } {
        // The handle stays open for the life of the process.
        Ok(_mutex) => unsafe { GetLastError() } == ERROR_ALREADY_EXISTS,
        Err(e) => {
            tracing::warn!(error = %e, "could not create instance mutex");
            false
        }
    }
}
