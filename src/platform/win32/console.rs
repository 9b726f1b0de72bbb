// Console and error reporting for a GUI-subsystem binary.
//
// Release builds have no console of their own. When started from a shell we
// borrow the parent's so CLI output and errors land there; when started from
// Explorer there is none and fatal errors go to a message box instead.

use windows::core::PCWSTR;
use windows::Win32::System::Console::{AttachConsole, ATTACH_PARENT_PROCESS};
use windows::Win32::UI::WindowsAndMessaging::{MessageBoxW, MB_ICONERROR, MB_OK};

/// Attach to the launching shell's console. Returns whether stdout/stderr
/// now reach a console.
pub fn attach_parent_console() -> bool {
    if cfg!(debug_assertions) {
        // Console subsystem in debug builds.
        return true;
    }
    unsafe { AttachConsole(ATTACH_PARENT_PROCESS) }.is_ok()
}

pub fn show_error(message: &str) {
    let text: Vec<u16> = message.encode_utf16().chain(std::iter::once(0)).collect();
    let caption: Vec<u16> = "screenblank\0".encode_utf16().collect();
    unsafe {
        let _ = MessageBoxW(None, PCWSTR(text.as_ptr()), PCWSTR(caption.as_ptr()), MB_OK | MB_ICONERROR);
    }
}
