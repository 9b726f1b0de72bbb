// macOS application lifecycle: NSApplication setup, menu bar, and run loop.
//
//   • applicationDidFinishLaunching: install key monitors, blank the screens
//   • applicationShouldHandleReopen: (dock click) rebuild if every overlay was closed
//   • applicationShouldTerminateAfterLastWindowClosed: no, stay alive like a Mac app

use objc2::rc::Retained;
use objc2::runtime::{AnyObject, ProtocolObject};
use objc2::{define_class, msg_send, sel, MainThreadMarker};
use objc2_app_kit::{
    NSApplication, NSApplicationActivationPolicy, NSApplicationDelegate, NSMenu, NSMenuItem,
};
use objc2_foundation::{NSNotification, NSObject, NSObjectProtocol, NSString};

define_class!(
    #[unsafe(super(NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "ScreenblankAppDelegate"]
    struct AppDelegate;

    unsafe impl NSObjectProtocol for AppDelegate {}

    unsafe impl NSApplicationDelegate for AppDelegate {
        #[unsafe(method(applicationDidFinishLaunching:))]
        fn did_finish_launching(&self, _notification: &NSNotification) {
            let mtm = MainThreadMarker::from(self);

            super::hotkeys::install();

            if let Err(e) = super::start(mtm) {
                tracing::error!(error = %e, "failed to blank screens");
                NSApplication::sharedApplication(mtm).terminate(None);
            }
        }

        #[unsafe(method(applicationShouldHandleReopen:hasVisibleWindows:))]
        fn should_handle_reopen(&self, _sender: &NSApplication, _has_visible_windows: bool) -> bool {
            super::reopen(MainThreadMarker::from(self));
            true
        }

        #[unsafe(method(applicationShouldTerminateAfterLastWindowClosed:))]
        fn should_terminate_after_last_window_closed(&self, _sender: &NSApplication) -> bool {
            false
        }
    }

    // Menu actions, reached through the responder chain.
    impl AppDelegate {
        #[unsafe(method(showAllScreens:))]
        fn show_all_screens(&self, _sender: Option<&AnyObject>) {
            super::with_app(|app| app.blanker.show_all());
        }

        #[unsafe(method(hideAllScreens:))]
        fn hide_all_screens(&self, _sender: Option<&AnyObject>) {
            super::with_app(|app| app.blanker.hide_all());
        }
    }
);

impl AppDelegate {
    fn new(mtm: MainThreadMarker) -> Retained<Self> {
        let this = mtm.alloc::<Self>().set_ivars(());
        unsafe { msg_send![super(this), init] }
    }
}

fn menu_item(
    mtm: MainThreadMarker,
    title: &str,
    action: objc2::runtime::Sel,
    key: &str,
) -> Retained<NSMenuItem> {
    unsafe {
        NSMenuItem::initWithTitle_action_keyEquivalent(
            mtm.alloc::<NSMenuItem>(),
            &NSString::from_str(title),
            Some(action),
            &NSString::from_str(key),
        )
    }
}

/// App menu with Show/Hide All and Quit, so Cmd+Q works.
fn install_main_menu(mtm: MainThreadMarker, app: &NSApplication) {
    let menubar = NSMenu::new(mtm);
    let app_item = NSMenuItem::new(mtm);
    menubar.addItem(&app_item);

    let app_menu = NSMenu::new(mtm);
    app_menu.addItem(&menu_item(mtm, "Show All Screens", sel!(showAllScreens:), ""));
    app_menu.addItem(&menu_item(mtm, "Hide All Screens", sel!(hideAllScreens:), ""));
    app_menu.addItem(&NSMenuItem::separatorItem(mtm));
    app_menu.addItem(&menu_item(mtm, "Quit screenblank", sel!(terminate:), "q"));

    app_item.setSubmenu(Some(&app_menu));
    app.setMainMenu(Some(&menubar));
}

pub fn run(mtm: MainThreadMarker) {
    let app = NSApplication::sharedApplication(mtm);
    app.setActivationPolicy(NSApplicationActivationPolicy::Regular);
    install_main_menu(mtm, &app);

    let delegate = AppDelegate::new(mtm);
    let delegate_proto = ProtocolObject::from_ref(&*delegate);
    app.setDelegate(Some(delegate_proto));

    app.run();
}
