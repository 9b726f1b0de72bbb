// Global hotkeys using Win32 RegisterHotKey API

use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    RegisterHotKey, UnregisterHotKey, HOT_KEY_MODIFIERS, MOD_NOREPEAT,
};

use crate::error::Error;
use crate::hotkeys::{hotkey_id, Binding};

/// Register every binding on `hwnd`. A binding the OS refuses (usually
/// because another app owns it) is logged and skipped. Returns how many
/// were registered.
pub fn register_all(hwnd: HWND, bindings: &[Binding]) -> usize {
    let mut registered = 0;

    for (index, binding) in bindings.iter().enumerate() {
        let id = hotkey_id(index);
        let mods = HOT_KEY_MODIFIERS(binding.hotkey.modifiers.win32_flags() | MOD_NOREPEAT.0);
        let vk = binding.hotkey.key.win32_vk();

        match unsafe { RegisterHotKey(Some(hwnd), id, mods, vk) } {
            Ok(()) => {
                registered += 1;
                tracing::debug!(hotkey = %binding.hotkey, action = ?binding.action, "hotkey registered");
            }
            Err(e) => {
                let err = Error::hotkey_register(binding.hotkey.to_string(), e.to_string());
                tracing::warn!(error = %err, "hotkey unavailable");
            }
        }
    }

    registered
}

/// Unregister everything `register_all` may have registered.
pub fn unregister_all(hwnd: HWND, count: usize) {
    for index in 0..count {
        unsafe {
            let _ = UnregisterHotKey(Some(hwnd), hotkey_id(index));
        }
    }
}
