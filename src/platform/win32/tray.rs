// Notification-area icon: the only UI left once every overlay is hidden.
//
// Left or right click opens a menu with the same actions as the hotkeys,
// labelled with the accelerators from the config, plus Quit.

use windows::core::PCWSTR;
use windows::Win32::Foundation::{HWND, POINT};
use windows::Win32::UI::Shell::{
    Shell_NotifyIconW, NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NOTIFYICONDATAW,
};
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreatePopupMenu, DestroyMenu, GetCursorPos, LoadIconW, SetForegroundWindow,
    TrackPopupMenu, HMENU, IDI_APPLICATION, MF_SEPARATOR, MF_STRING, TPM_BOTTOMALIGN,
    TPM_RIGHTBUTTON, WM_APP,
};

use crate::hotkeys::{Action, Binding};

/// Callback message for icon clicks. LPARAM carries the mouse message.
pub const WM_TRAY_ICON: u32 = WM_APP + 1;

const ICON_UID: u32 = 1;

const ID_SHOW_ALL: u32 = 1001;
const ID_HIDE_ALL: u32 = 1002;
const ID_QUIT: u32 = 1003;

/// A menu choice, decoded from a WM_COMMAND id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    Blank(Action),
    Quit,
}

impl TrayCommand {
    pub fn from_id(id: u32) -> Option<TrayCommand> {
        match id {
            ID_SHOW_ALL => Some(TrayCommand::Blank(Action::ShowAll)),
            ID_HIDE_ALL => Some(TrayCommand::Blank(Action::HideAll)),
            ID_QUIT => Some(TrayCommand::Quit),
            _ => None,
        }
    }
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// "Show all screens\tCtrl+Shift+B"; Win32 right-aligns text after the tab.
fn label(text: &str, action: Action, bindings: &[Binding]) -> Vec<u16> {
    match bindings.iter().find(|b| b.action == action) {
        Some(b) => wide(&format!("{text}\t{}", b.hotkey)),
        None => wide(text),
    }
}

/// Registered icon; removed from the notification area on drop.
pub struct TrayIcon {
    host: HWND,
    show_label: Vec<u16>,
    hide_label: Vec<u16>,
}

impl TrayIcon {
    fn data(host: HWND) -> NOTIFYICONDATAW {
        NOTIFYICONDATAW {
            cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
            hWnd: host,
            uID: ICON_UID,
            ..Default::default()
        }
    }

    /// Add the icon for `host`. `None` when the shell refuses it (no taskbar).
    pub fn add(host: HWND, displays: usize, bindings: &[Binding]) -> Option<TrayIcon> {
        let mut nid = Self::data(host);
        nid.uFlags = NIF_ICON | NIF_MESSAGE | NIF_TIP;
        nid.uCallbackMessage = WM_TRAY_ICON;
        if let Ok(icon) = unsafe { LoadIconW(None, IDI_APPLICATION) } {
            nid.hIcon = icon;
        }

        let noun = if displays == 1 { "display" } else { "displays" };
        let tip = wide(&format!("screenblank: {displays} {noun}"));
        let len = tip.len().min(nid.szTip.len() - 1);
        nid.szTip[..len].copy_from_slice(&tip[..len]);

        if !unsafe { Shell_NotifyIconW(NIM_ADD, &nid) }.as_bool() {
            tracing::warn!("notification area refused the tray icon");
            return None;
        }
        Some(TrayIcon {
            host,
            show_label: label("Show all screens", Action::ShowAll, bindings),
            hide_label: label("Hide all screens", Action::HideAll, bindings),
        })
    }

    fn build_menu(&self) -> Option<HMENU> {
        let quit = wide("Quit screenblank");
        unsafe {
            let menu = CreatePopupMenu().ok()?;
            let _ = AppendMenuW(menu, MF_STRING, ID_SHOW_ALL as usize, PCWSTR(self.show_label.as_ptr()));
            let _ = AppendMenuW(menu, MF_STRING, ID_HIDE_ALL as usize, PCWSTR(self.hide_label.as_ptr()));
            let _ = AppendMenuW(menu, MF_SEPARATOR, 0, PCWSTR::null());
            let _ = AppendMenuW(menu, MF_STRING, ID_QUIT as usize, PCWSTR(quit.as_ptr()));
            Some(menu)
        }
    }

    /// Pop the menu up at the cursor. The choice arrives as WM_COMMAND.
    pub fn show_menu(&self) {
        let Some(menu) = self.build_menu() else {
            tracing::warn!("could not build tray menu");
            return;
        };
        unsafe {
            let mut cursor = POINT::default();
            let _ = GetCursorPos(&mut cursor);
            // Without this the menu does not close when clicking elsewhere.
            let _ = SetForegroundWindow(self.host);
            let _ = TrackPopupMenu(
                menu,
                TPM_BOTTOMALIGN | TPM_RIGHTBUTTON,
                cursor.x,
                cursor.y,
                Some(0),
                self.host,
                None,
            );
            let _ = DestroyMenu(menu);
        }
    }
}

impl Drop for TrayIcon {
    fn drop(&mut self) {
        let nid = Self::data(self.host);
        unsafe {
            let _ = Shell_NotifyIconW(NIM_DELETE, &nid);
        }
    }
}
