// Fullscreen overlay windows, one per monitor.
//
// Each overlay is a borderless WS_POPUP covering its monitor's full rect,
// painted by the class background brush. "Fullscreen" on Win32 means sitting
// in the topmost z-band at the monitor's bounds; leaving it drops the window
// back to the normal band.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use windows::core::PCWSTR;
use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::Graphics::Gdi::CreateSolidBrush;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, GetWindowLongW, LoadCursorW, PostMessageW, RegisterClassW,
    SetWindowPos, ShowWindow, CS_HREDRAW, CS_VREDRAW, GWL_EXSTYLE, HWND_NOTOPMOST, HWND_TOPMOST,
    IDC_ARROW, SWP_NOACTIVATE, SW_HIDE, SW_SHOW, WM_APP, WM_DESTROY, WNDCLASSW, WS_EX_TOOLWINDOW,
    WS_EX_TOPMOST, WS_POPUP, WS_VISIBLE,
};

use crate::blanker::OverlayBackend;
use crate::config::Rgb;
use crate::display::{Bounds, DisplayInfo};
use crate::error::{Error, Result};

const CLASS_NAME: &str = "ScreenblankOverlay\0";

static CLASS_REGISTERED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayWindow {
    pub hwnd: HWND,
    pub bounds: Bounds,
}

unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if msg == WM_DESTROY {
        super::overlay_destroyed(hwnd);
        return LRESULT(0);
    }
    DefWindowProcW(hwnd, msg, wparam, lparam)
}

/// Register the overlay class once, filled with `color`.
pub fn register_class(color: Rgb) -> Result<()> {
    if CLASS_REGISTERED.load(Ordering::SeqCst) {
        return Ok(());
    }

    unsafe {
        let hinstance = GetModuleHandleW(PCWSTR::null())
            .map_err(|e| Error::platform(format!("GetModuleHandleW: {e}")))?;
        let class_name: Vec<u16> = CLASS_NAME.encode_utf16().collect();

        let wc = WNDCLASSW {
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(window_proc),
            hInstance: hinstance.into(),
            lpszClassName: PCWSTR(class_name.as_ptr()),
            hbrBackground: CreateSolidBrush(COLORREF(color.to_colorref())),
            hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
            ..Default::default()
        };

        if RegisterClassW(&wc) == 0 {
            return Err(Error::platform("RegisterClassW failed for overlay class"));
        }
    }

    CLASS_REGISTERED.store(true, Ordering::SeqCst);
    tracing::debug!(%color, "overlay window class registered");
    Ok(())
}

/// Create a visible overlay covering `display`.
pub fn create_overlay(display: &DisplayInfo) -> Result<OverlayWindow> {
    let b = display.bounds;
    let class_name: Vec<u16> = CLASS_NAME.encode_utf16().collect();
    let title: Vec<u16> = "screenblank\0".encode_utf16().collect();

    let hwnd = unsafe {
        let hinstance = GetModuleHandleW(PCWSTR::null()).unwrap_or_default();
        CreateWindowExW(
            WS_EX_TOPMOST | WS_EX_TOOLWINDOW,
            PCWSTR(class_name.as_ptr()),
            PCWSTR(title.as_ptr()),
            WS_POPUP | WS_VISIBLE,
            b.x,
            b.y,
            b.width,
            b.height,
            None,
            None,
            Some(hinstance.into()),
            None,
        )
    }
    .map_err(|e| Error::WindowCreate {
        display: display.id,
        message: e.to_string(),
    })?;

    tracing::debug!(display = display.id, name = %display.name, bounds = %b, "overlay created");
    Ok(OverlayWindow { hwnd, bounds: b })
}

/// Posted to the host window to finish a deferred hide. WPARAM is the slot,
/// LPARAM the generation.
pub const WM_FINISH_HIDE: u32 = WM_APP + 2;

/// Win32 implementation of the blanker's native operations.
///
/// Overlays never enter a native fullscreen mode here, so the blanker runs
/// with `HideStrategy::Immediate` and "fullscreen" is just the topmost band.
pub struct Win32Backend {
    host: HWND,
}

impl Win32Backend {
    /// `host` receives `WM_FINISH_HIDE`.
    pub fn new(host: HWND) -> Self {
        Self { host }
    }
}

impl OverlayBackend for Win32Backend {
    type Window = OverlayWindow;

    fn show(&mut self, window: &OverlayWindow) {
        unsafe {
            let _ = ShowWindow(window.hwnd, SW_SHOW);
        }
    }

    fn hide(&mut self, window: &OverlayWindow) {
        unsafe {
            let _ = ShowWindow(window.hwnd, SW_HIDE);
        }
    }

    fn set_fullscreen(&mut self, window: &OverlayWindow, fullscreen: bool) {
        let b = window.bounds;
        let insert_after = if fullscreen { HWND_TOPMOST } else { HWND_NOTOPMOST };
        let result = unsafe {
            SetWindowPos(
                window.hwnd,
                Some(insert_after),
                b.x,
                b.y,
                b.width,
                b.height,
                SWP_NOACTIVATE,
            )
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "SetWindowPos failed");
        }
    }

    fn is_fullscreen(&self, window: &OverlayWindow) -> bool {
        let ex_style = unsafe { GetWindowLongW(window.hwnd, GWL_EXSTYLE) } as u32;
        ex_style & WS_EX_TOPMOST.0 != 0
    }

    fn schedule_hide(&mut self, slot: usize, generation: u64, _delay: Duration) {
        // No exit animation to wait for; finish on the next loop turn.
        let posted = unsafe {
            PostMessageW(
                Some(self.host),
                WM_FINISH_HIDE,
                WPARAM(slot),
                LPARAM(generation as isize),
            )
        };
        if let Err(e) = posted {
            tracing::warn!(slot = slot + 1, error = %e, "could not queue deferred hide");
        }
    }
}
