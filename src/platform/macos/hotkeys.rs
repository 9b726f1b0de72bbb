// macOS global hotkeys using NSEvent monitors.
//
// Global monitor: key presses while another app is active. Needs the
//   Accessibility permission, and cannot consume the event.
// Local monitor: key presses while one of our overlays is key. Matching
//   events are swallowed so Esc does not beep.
//
// Both run on the main thread and look the key up in the current binding
// table, so rebuilding the overlays does not require reinstalling them.

use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, Ordering};

use block2::RcBlock;
use objc2_app_kit::{NSEvent, NSEventMask, NSEventModifierFlags};

use crate::hotkeys::{match_mac, Modifiers};

static INSTALLED: AtomicBool = AtomicBool::new(false);

fn modifiers_of(flags: NSEventModifierFlags) -> Modifiers {
    Modifiers {
        control: flags.contains(NSEventModifierFlags::Control),
        command: flags.contains(NSEventModifierFlags::Command),
        shift: flags.contains(NSEventModifierFlags::Shift),
        alt: flags.contains(NSEventModifierFlags::Option),
    }
}

/// Dispatch a key-down to the blanker. Returns true if it matched a binding.
fn handle_key(event: &NSEvent) -> bool {
    if event.isARepeat() {
        return false;
    }
    let keycode = event.keyCode();
    let modifiers = modifiers_of(event.modifierFlags());

    super::with_app(|app| match match_mac(&app.bindings, keycode, modifiers) {
        Some(action) => {
            app.blanker.dispatch(action);
            true
        }
        None => false,
    })
    .unwrap_or(false)
}

/// Install the key monitors. Must be called from the main thread.
pub fn install() {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }

    request_accessibility_permission();

    let global = RcBlock::new(|event: NonNull<NSEvent>| {
        let event: &NSEvent = unsafe { event.as_ref() };
        handle_key(event);
    });
    let monitor =
        unsafe { NSEvent::addGlobalMonitorForEventsMatchingMask_handler(NSEventMask::KeyDown, &global) };
    if monitor.is_some() {
        tracing::debug!("global key monitor installed");
    } else {
        tracing::warn!("failed to install global key monitor; shortcuts only work while screenblank is active");
    }
    // Keep the monitor alive for the lifetime of the app by leaking it
    std::mem::forget(monitor);

    let local = RcBlock::new(|event: NonNull<NSEvent>| -> *mut NSEvent {
        let matched = handle_key(unsafe { event.as_ref() });
        if matched {
            std::ptr::null_mut()
        } else {
            event.as_ptr()
        }
    });
    let monitor =
        unsafe { NSEvent::addLocalMonitorForEventsMatchingMask_handler(NSEventMask::KeyDown, &local) };
    if monitor.is_none() {
        tracing::warn!("failed to install local key monitor");
    }
    std::mem::forget(monitor);
}

// ---- Accessibility permission -----------------------------------------------

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXIsProcessTrustedWithOptions(options: *const std::ffi::c_void) -> bool;
}

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    static kCFBooleanTrue: *const std::ffi::c_void;
    fn CFDictionaryCreate(
        allocator: *const std::ffi::c_void,
        keys: *const *const std::ffi::c_void,
        values: *const *const std::ffi::c_void,
        num_values: isize,
        key_callbacks: *const std::ffi::c_void,
        value_callbacks: *const std::ffi::c_void,
    ) -> *const std::ffi::c_void;
    fn CFRelease(cf: *const std::ffi::c_void);
    static kCFTypeDictionaryKeyCallBacks: std::ffi::c_void;
    static kCFTypeDictionaryValueCallBacks: std::ffi::c_void;
}

extern "C" {
    static kAXTrustedCheckOptionPrompt: *const std::ffi::c_void;
}

/// Ask for the Accessibility permission the global monitor depends on.
/// Shows the system prompt the first time.
fn request_accessibility_permission() {
    let trusted = unsafe {
        let keys = [kAXTrustedCheckOptionPrompt];
        let values = [kCFBooleanTrue];
        let options = CFDictionaryCreate(
            std::ptr::null(),
            keys.as_ptr(),
            values.as_ptr(),
            1,
            &kCFTypeDictionaryKeyCallBacks as *const _ as *const std::ffi::c_void,
            &kCFTypeDictionaryValueCallBacks as *const _ as *const std::ffi::c_void,
        );
        let trusted = AXIsProcessTrustedWithOptions(options);
        if !options.is_null() {
            CFRelease(options);
        }
        trusted
    };

    if trusted {
        tracing::debug!("accessibility permission granted");
    } else {
        tracing::warn!(
            "accessibility permission not granted; global shortcuts will not fire while other apps are active"
        );
    }
}
