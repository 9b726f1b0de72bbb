// macOS overlay windows, one per NSScreen.
//
// Each overlay is a titled-but-invisible-chrome NSWindow that can enter native
// fullscreen (its own Space). Hiding a fullscreen window directly leaves a
// black Space behind, which is why the blanker leaves fullscreen first and
// only orders the window out once the NSTimer below fires.

use std::ptr::NonNull;
use std::time::Duration;

use block2::RcBlock;
use objc2::rc::Retained;
use objc2::runtime::ProtocolObject;
use objc2::{define_class, msg_send, DefinedClass, MainThreadMarker};
use objc2_app_kit::{
    NSBackingStoreType, NSColor, NSScreen, NSWindow, NSWindowCollectionBehavior, NSWindowDelegate,
    NSWindowStyleMask, NSWindowTitleVisibility,
};
use objc2_foundation::{NSNotification, NSObject, NSObjectProtocol, NSString, NSTimer};

use crate::blanker::{FullscreenTransitions, OverlayBackend};
use crate::config::Rgb;
use crate::display::{Bounds, DisplayInfo};

/// Every screen with its display info. Index 0 is the menu-bar screen.
///
/// Bounds use Cocoa's global coordinates (origin bottom-left), which is fine
/// for left-to-right ordering since only x matters.
pub fn enumerate(mtm: MainThreadMarker) -> Vec<(DisplayInfo, Retained<NSScreen>)> {
    let screens = NSScreen::screens(mtm);
    let count = screens.count();
    let mut result = Vec::with_capacity(count);

    for i in 0..count {
        let screen = screens.objectAtIndex(i);
        let frame = screen.frame();
        let info = DisplayInfo {
            id: screen_number(&screen).unwrap_or(i as u32),
            name: screen.localizedName().to_string(),
            bounds: Bounds::new(
                frame.origin.x as i32,
                frame.origin.y as i32,
                frame.size.width as i32,
                frame.size.height as i32,
            ),
            primary: i == 0,
        };
        result.push((info, screen));
    }

    result
}

/// CGDirectDisplayID via deviceDescription["NSScreenNumber"].
fn screen_number(screen: &NSScreen) -> Option<u32> {
    let desc = screen.deviceDescription();
    let key = NSString::from_str("NSScreenNumber");
    let val = desc.objectForKey(&key)?;
    let did: u32 = unsafe { msg_send![&*val, unsignedIntValue] };
    Some(did)
}

/// Create an overlay covering `screen` and bring it to the front.
pub fn create_overlay(mtm: MainThreadMarker, screen: &NSScreen, color: Rgb) -> Retained<NSWindow> {
    let frame = screen.frame();

    let style = NSWindowStyleMask::Titled
        | NSWindowStyleMask::Closable
        | NSWindowStyleMask::Resizable
        | NSWindowStyleMask::FullSizeContentView;

    let window = unsafe {
        NSWindow::initWithContentRect_styleMask_backing_defer(
            mtm.alloc::<NSWindow>(),
            frame,
            style,
            NSBackingStoreType::Buffered,
            false,
        )
    };

    // We hold the Retained; AppKit must not release it again on close.
    unsafe { window.setReleasedWhenClosed(false) };

    window.setTitle(&NSString::from_str("screenblank"));
    window.setTitleVisibility(NSWindowTitleVisibility::Hidden);
    window.setTitlebarAppearsTransparent(true);

    let (r, g, b) = color.to_unit();
    window.setBackgroundColor(Some(&NSColor::colorWithRed_green_blue_alpha(r, g, b, 1.0)));
    window.setCollectionBehavior(NSWindowCollectionBehavior::FullScreenPrimary);

    window.setFrame_display(frame, true);
    window.makeKeyAndOrderFront(None);

    window
}

pub struct OverlayDelegateIvars {
    slot: usize,
}

define_class!(
    #[unsafe(super(NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "ScreenblankOverlayDelegate"]
    #[ivars = OverlayDelegateIvars]
    pub struct OverlayDelegate;

    unsafe impl NSObjectProtocol for OverlayDelegate {}

    unsafe impl NSWindowDelegate for OverlayDelegate {
        #[unsafe(method(windowWillClose:))]
        fn window_will_close(&self, _notification: &NSNotification) {
            super::overlay_closed(self.ivars().slot);
        }

        #[unsafe(method(windowDidEnterFullScreen:))]
        fn window_did_enter_full_screen(&self, _notification: &NSNotification) {
            super::fullscreen_settled(self.ivars().slot);
        }

        #[unsafe(method(windowDidExitFullScreen:))]
        fn window_did_exit_full_screen(&self, _notification: &NSNotification) {
            super::fullscreen_settled(self.ivars().slot);
        }

        #[unsafe(method(windowDidFailToEnterFullScreen:))]
        fn window_did_fail_to_enter_full_screen(&self, _window: &NSWindow) {
            super::fullscreen_settled(self.ivars().slot);
        }

        #[unsafe(method(windowDidFailToExitFullScreen:))]
        fn window_did_fail_to_exit_full_screen(&self, _window: &NSWindow) {
            super::fullscreen_settled(self.ivars().slot);
        }
    }
);

impl OverlayDelegate {
    fn new(mtm: MainThreadMarker, slot: usize) -> Retained<Self> {
        let this = mtm
            .alloc::<Self>()
            .set_ivars(OverlayDelegateIvars { slot });
        unsafe { msg_send![super(this), init] }
    }
}

/// Report closes of `window` as closes of `slot`. NSWindow holds its delegate
/// weakly, so the caller keeps the returned object alive.
pub fn attach_delegate(
    mtm: MainThreadMarker,
    window: &NSWindow,
    slot: usize,
) -> Retained<OverlayDelegate> {
    let delegate = OverlayDelegate::new(mtm, slot);
    window.setDelegate(Some(ProtocolObject::from_ref(&*delegate)));
    delegate
}

/// AppKit implementation of the blanker's native operations.
#[derive(Debug, Default)]
pub struct MacBackend {
    transitions: FullscreenTransitions<usize>,
}

fn window_key(window: &Retained<NSWindow>) -> usize {
    Retained::as_ptr(window) as usize
}

/// Fullscreen state once any animation has finished.
fn settled_fullscreen(window: &NSWindow) -> bool {
    window.styleMask().contains(NSWindowStyleMask::FullScreen)
}

fn toggle(window: &NSWindow, to_fullscreen: bool) {
    // toggleFullScreen: does nothing for an ordered-out window.
    if to_fullscreen && !window.isVisible() {
        window.makeKeyAndOrderFront(None);
    }
    window.toggleFullScreen(None);
}

impl MacBackend {
    /// A fullscreen animation on `window` ended. Replays a request that came
    /// in while it was running.
    pub fn transition_finished(&mut self, window: &Retained<NSWindow>) {
        let settled = settled_fullscreen(window);
        if self.transitions.finished(window_key(window), settled) {
            toggle(window, !settled);
        }
    }
}

impl OverlayBackend for MacBackend {
    type Window = Retained<NSWindow>;

    fn show(&mut self, window: &Retained<NSWindow>) {
        window.makeKeyAndOrderFront(None);
    }

    fn hide(&mut self, window: &Retained<NSWindow>) {
        window.orderOut(None);
    }

    fn set_fullscreen(&mut self, window: &Retained<NSWindow>, fullscreen: bool) {
        let settled = settled_fullscreen(window);
        if self.transitions.request(window_key(window), settled, fullscreen) {
            toggle(window, fullscreen);
        }
    }

    fn is_fullscreen(&self, window: &Retained<NSWindow>) -> bool {
        self.transitions
            .pending(&window_key(window))
            .unwrap_or_else(|| settled_fullscreen(window))
    }

    fn schedule_hide(&mut self, slot: usize, generation: u64, delay: Duration) {
        let block = RcBlock::new(move |_timer: NonNull<NSTimer>| {
            super::with_app(|app| app.blanker.finish_hide(slot, generation));
        });
        // The run loop retains scheduled timers.
        let _timer = unsafe {
            NSTimer::scheduledTimerWithTimeInterval_repeats_block(
                delay.as_secs_f64(),
                false,
                &block,
            )
        };
    }
}
