// Monitor enumeration via EnumDisplayMonitors.

use windows::core::BOOL;
use windows::Win32::Foundation::{LPARAM, RECT};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFOEXW,
};

use crate::display::{Bounds, DisplayInfo};
use crate::error::{Error, Result};

const MONITORINFOF_PRIMARY: u32 = 0x0000_0001;

/// Callback for EnumDisplayMonitors. Appends one `DisplayInfo` per monitor
/// to the Vec behind `lparam`.
unsafe extern "system" fn monitor_enum_proc(
    hmonitor: HMONITOR,
    _hdc: HDC,
    _lprect: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    let displays = &mut *(lparam.0 as *mut Vec<DisplayInfo>);

    let mut info = MONITORINFOEXW::default();
    info.monitorInfo.cbSize = std::mem::size_of::<MONITORINFOEXW>() as u32;

    if GetMonitorInfoW(hmonitor, &mut info.monitorInfo).as_bool() {
        let rect = info.monitorInfo.rcMonitor;
        let len = info
            .szDevice
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(info.szDevice.len());

        displays.push(DisplayInfo {
            id: displays.len() as u32,
            name: String::from_utf16_lossy(&info.szDevice[..len]),
            bounds: Bounds::new(
                rect.left,
                rect.top,
                rect.right - rect.left,
                rect.bottom - rect.top,
            ),
            primary: info.monitorInfo.dwFlags & MONITORINFOF_PRIMARY != 0,
        });
    } else {
        tracing::warn!("GetMonitorInfoW failed, skipping monitor");
    }

    BOOL::from(true)
}

/// All monitors attached to the desktop, in enumeration order.
pub fn list_displays() -> Result<Vec<DisplayInfo>> {
    let mut displays: Vec<DisplayInfo> = Vec::new();
    let ok = unsafe {
        EnumDisplayMonitors(
            None,
            None,
            Some(monitor_enum_proc),
            LPARAM(&mut displays as *mut Vec<DisplayInfo> as isize),
        )
    };
    if !ok.as_bool() {
        return Err(Error::platform("EnumDisplayMonitors failed"));
    }
    tracing::debug!(count = displays.len(), "enumerated monitors");
    Ok(displays)
}
