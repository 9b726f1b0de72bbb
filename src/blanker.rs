// Per-overlay show/hide state.
//
// The blanker owns one `Screen` per display, ordered left to right, and
// drives the platform windows through `OverlayBackend`. All calls happen on
// the UI thread from hotkey, timer, or menu callbacks.
//
// macOS fullscreen workaround:
//   Hiding a window that is in native fullscreen leaves its Space behind as a
//   black screen. So on macOS a hide first leaves fullscreen, then the real
//   hide runs after a delay (750ms by default) once the exit animation is
//   done. Each deferred hide carries the screen's generation; a `show` in the
//   meantime bumps the generation so the stale hide is ignored when it fires.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use crate::display::{self, DisplayInfo};
use crate::hotkeys::Action;

/// The native operations the blanker needs from a windowing system.
pub trait OverlayBackend {
    type Window;

    fn show(&mut self, window: &Self::Window);
    fn hide(&mut self, window: &Self::Window);
    fn set_fullscreen(&mut self, window: &Self::Window, fullscreen: bool);
    fn is_fullscreen(&self, window: &Self::Window) -> bool;

    /// Arrange for `Blanker::finish_hide(slot, generation)` to be called after `delay`.
    fn schedule_hide(&mut self, slot: usize, generation: u64, delay: Duration);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideStrategy {
    /// Hide straight away.
    Immediate,
    /// Leave fullscreen, then hide after `delay`.
    LeaveFullscreenFirst { delay: Duration },
}

impl HideStrategy {
    pub fn for_current_platform(delay: Duration) -> Self {
        if cfg!(target_os = "macos") {
            HideStrategy::LeaveFullscreenFirst { delay }
        } else {
            HideStrategy::Immediate
        }
    }
}

/// Animated fullscreen changes that cannot be redirected mid-flight.
///
/// AppKit ignores `toggleFullScreen:` while a window is still animating, so a
/// request that arrives during a transition is remembered and replayed when
/// the transition lands.
#[derive(Debug)]
pub struct FullscreenTransitions<K> {
    in_flight: HashMap<K, Transition>,
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    target: bool,
    wanted: bool,
}

impl<K> Default for FullscreenTransitions<K> {
    fn default() -> Self {
        Self {
            in_flight: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> FullscreenTransitions<K> {
    /// Ask for `wanted` on a window whose settled state is `settled`.
    /// Returns true when the caller should start a toggle now.
    pub fn request(&mut self, key: K, settled: bool, wanted: bool) -> bool {
        if let Some(t) = self.in_flight.get_mut(&key) {
            t.wanted = wanted;
            return false;
        }
        if settled == wanted {
            return false;
        }
        self.in_flight.insert(
            key,
            Transition {
                target: wanted,
                wanted,
            },
        );
        true
    }

    /// The state a window is heading to, while a transition is in flight.
    pub fn pending(&self, key: &K) -> Option<bool> {
        self.in_flight.get(key).map(|t| t.wanted)
    }

    /// A transition ended (or failed) with the window in `settled` state.
    /// Returns true when another toggle is needed to reach the latest request.
    pub fn finished(&mut self, key: K, settled: bool) -> bool {
        let Some(t) = self.in_flight.remove(&key) else {
            return false;
        };
        if t.target != settled {
            tracing::debug!(wanted = t.target, settled, "fullscreen transition did not land");
        }
        self.request(key, settled, t.wanted)
    }
}

/// What happens once the user has closed every overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastClose {
    Quit,
    /// Stay running; macOS apps outlive their windows.
    KeepRunning,
}

impl LastClose {
    pub fn new(quit_when_all_closed: bool, macos: bool) -> Self {
        if quit_when_all_closed && !macos {
            LastClose::Quit
        } else {
            LastClose::KeepRunning
        }
    }

    pub fn for_current_platform(quit_when_all_closed: bool) -> Self {
        Self::new(quit_when_all_closed, cfg!(target_os = "macos"))
    }
}

#[derive(Debug)]
pub struct Screen<W> {
    pub display: DisplayInfo,
    window: W,
    hidden: bool,
    hide_pending: bool,
    closed: bool,
    generation: u64,
}

impl<W> Screen<W> {
    pub fn new(display: DisplayInfo, window: W) -> Self {
        Self {
            display,
            window,
            hidden: false,
            hide_pending: false,
            closed: false,
            generation: 0,
        }
    }

    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_hide_pending(&self) -> bool {
        self.hide_pending
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

pub struct Blanker<B: OverlayBackend> {
    backend: B,
    screens: Vec<Screen<B::Window>>,
    strategy: HideStrategy,
}

impl<B: OverlayBackend> Blanker<B> {
    /// Takes screens in enumeration order and sorts them into slots.
    pub fn new(backend: B, strategy: HideStrategy, mut screens: Vec<Screen<B::Window>>) -> Self {
        display::sort_left_to_right(&mut screens, |s| s.display.bounds);
        for (slot, screen) in screens.iter().enumerate() {
            tracing::debug!(
                slot = slot + 1,
                display = screen.display.id,
                name = %screen.display.name,
                bounds = %screen.display.bounds,
                "overlay slot assigned"
            );
        }
        Self {
            backend,
            screens,
            strategy,
        }
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    /// Screens whose window has not been closed.
    pub fn open_count(&self) -> usize {
        self.screens.iter().filter(|s| !s.closed).count()
    }

    pub fn all_closed(&self) -> bool {
        self.open_count() == 0
    }

    /// True once every overlay is closed and `policy` says to quit.
    pub fn should_quit(&self, policy: LastClose) -> bool {
        policy == LastClose::Quit && !self.screens.is_empty() && self.all_closed()
    }

    pub fn screens(&self) -> &[Screen<B::Window>] {
        &self.screens
    }

    pub fn screen(&self, slot: usize) -> Option<&Screen<B::Window>> {
        self.screens.get(slot)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn strategy(&self) -> HideStrategy {
        self.strategy
    }

    /// Slot of the first open screen whose window satisfies `pred`.
    pub fn find_slot(&self, mut pred: impl FnMut(&B::Window) -> bool) -> Option<usize> {
        self.screens
            .iter()
            .position(|s| !s.closed && pred(&s.window))
    }

    /// Tear down into the backend and the windows, in slot order.
    pub fn into_parts(self) -> (B, Vec<B::Window>) {
        let windows = self.screens.into_iter().map(|s| s.window).collect();
        (self.backend, windows)
    }

    pub fn dispatch(&mut self, action: Action) {
        tracing::debug!(?action, "hotkey action");
        match action {
            Action::HideAll => self.hide_all(),
            Action::ShowAll => self.show_all(),
            Action::Toggle(slot) => self.toggle(slot),
        }
    }

    pub fn hide_all(&mut self) {
        for slot in 0..self.screens.len() {
            self.hide(slot);
        }
    }

    pub fn show_all(&mut self) {
        for slot in 0..self.screens.len() {
            self.show(slot);
        }
    }

    pub fn toggle(&mut self, slot: usize) {
        let Some(screen) = self.open_screen(slot) else {
            return;
        };
        if screen.hidden {
            self.show(slot);
        } else {
            self.hide(slot);
        }
    }

    pub fn hide(&mut self, slot: usize) {
        let strategy = self.strategy;
        let Some(screen) = open_mut(&mut self.screens, slot) else {
            return;
        };
        if screen.hide_pending {
            return;
        }

        match strategy {
            HideStrategy::LeaveFullscreenFirst { delay } if self.backend.is_fullscreen(&screen.window) => {
                screen.generation += 1;
                screen.hidden = true;
                screen.hide_pending = true;
                let generation = screen.generation;
                self.backend.set_fullscreen(&screen.window, false);
                self.backend.schedule_hide(slot, generation, delay);
                tracing::debug!(slot = slot + 1, generation, ?delay, "left fullscreen, hide deferred");
            }
            _ => {
                self.backend.hide(&screen.window);
                screen.hidden = true;
                tracing::debug!(slot = slot + 1, "overlay hidden");
            }
        }
    }

    pub fn show(&mut self, slot: usize) {
        let Some(screen) = open_mut(&mut self.screens, slot) else {
            return;
        };
        if screen.hide_pending {
            screen.hide_pending = false;
            screen.generation += 1;
        }
        self.backend.set_fullscreen(&screen.window, true);
        self.backend.show(&screen.window);
        screen.hidden = false;
        tracing::debug!(slot = slot + 1, "overlay shown");
    }

    /// Complete a deferred hide. Stale generations are ignored.
    pub fn finish_hide(&mut self, slot: usize, generation: u64) {
        let Some(screen) = open_mut(&mut self.screens, slot) else {
            return;
        };
        if !screen.hide_pending || screen.generation != generation {
            tracing::trace!(slot = slot + 1, generation, current = screen.generation, "stale deferred hide dropped");
            return;
        }
        screen.hide_pending = false;
        self.backend.hide(&screen.window);
        tracing::debug!(slot = slot + 1, generation, "deferred hide done");
    }

    /// Record that the user closed the window in `slot`.
    pub fn mark_closed(&mut self, slot: usize) {
        if let Some(screen) = self.screens.get_mut(slot) {
            screen.closed = true;
            screen.hide_pending = false;
            tracing::info!(slot = slot + 1, remaining = self.open_count(), "overlay closed");
        }
    }

    fn open_screen(&self, slot: usize) -> Option<&Screen<B::Window>> {
        match self.screens.get(slot) {
            Some(screen) if !screen.closed => Some(screen),
            _ => {
                tracing::debug!(slot = slot + 1, "no open overlay in slot");
                None
            }
        }
    }
}

fn open_mut<W>(screens: &mut [Screen<W>], slot: usize) -> Option<&mut Screen<W>> {
    match screens.get_mut(slot) {
        Some(screen) if !screen.closed => Some(screen),
        _ => {
            tracing::debug!(slot = slot + 1, "no open overlay in slot");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Bounds;
    use std::collections::HashSet;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Show(u32),
        Hide(u32),
        Fullscreen(u32, bool),
        Schedule { slot: usize, generation: u64 },
    }

    /// Records every native call; windows are plain display ids.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        fullscreen: HashSet<u32>,
    }

    impl OverlayBackend for Recorder {
        type Window = u32;

        fn show(&mut self, window: &u32) {
            self.calls.push(Call::Show(*window));
        }

        fn hide(&mut self, window: &u32) {
            self.calls.push(Call::Hide(*window));
        }

        fn set_fullscreen(&mut self, window: &u32, fullscreen: bool) {
            if fullscreen {
                self.fullscreen.insert(*window);
            } else {
                self.fullscreen.remove(window);
            }
            self.calls.push(Call::Fullscreen(*window, fullscreen));
        }

        fn is_fullscreen(&self, window: &u32) -> bool {
            self.fullscreen.contains(window)
        }

        fn schedule_hide(&mut self, slot: usize, generation: u64, _delay: Duration) {
            self.calls.push(Call::Schedule { slot, generation });
        }
    }

    const MAC: HideStrategy = HideStrategy::LeaveFullscreenFirst {
        delay: Duration::from_millis(750),
    };

    fn screen(id: u32, x: i32) -> Screen<u32> {
        let display = DisplayInfo {
            id,
            name: format!("Display {id}"),
            bounds: Bounds::new(x, 0, 1440, 900),
            primary: false,
        };
        Screen::new(display, id)
    }

    /// Three displays enumerated out of order; slot order is 20, 10, 30.
    fn blanker(strategy: HideStrategy) -> Blanker<Recorder> {
        let mut backend = Recorder::default();
        backend.fullscreen.extend([10, 20, 30]);
        Blanker::new(backend, strategy, vec![screen(10, 0), screen(20, -1440), screen(30, 1440)])
    }

    fn take_calls(b: &mut Blanker<Recorder>) -> Vec<Call> {
        std::mem::take(&mut b.backend_mut().calls)
    }

    #[test]
    fn test_slots_follow_left_edge() {
        let b = blanker(HideStrategy::Immediate);
        let order: Vec<u32> = b.screens().iter().map(|s| *s.window()).collect();
        assert_eq!(order, vec![20, 10, 30]);
    }

    #[test]
    fn test_immediate_hide_and_show() {
        let mut b = blanker(HideStrategy::Immediate);
        b.hide(0);
        assert!(b.screen(0).unwrap().is_hidden());
        assert_eq!(take_calls(&mut b), vec![Call::Hide(20)]);

        b.show(0);
        assert!(!b.screen(0).unwrap().is_hidden());
        assert_eq!(take_calls(&mut b), vec![Call::Fullscreen(20, true), Call::Show(20)]);
    }

    #[test]
    fn test_toggle_flips_one_slot() {
        let mut b = blanker(HideStrategy::Immediate);
        b.dispatch(Action::Toggle(2));
        assert!(b.screen(2).unwrap().is_hidden());
        assert!(!b.screen(0).unwrap().is_hidden());
        b.dispatch(Action::Toggle(2));
        assert!(!b.screen(2).unwrap().is_hidden());
        assert_eq!(
            take_calls(&mut b),
            vec![Call::Hide(30), Call::Fullscreen(30, true), Call::Show(30)]
        );
    }

    #[test]
    fn test_hide_all_then_show_all() {
        let mut b = blanker(HideStrategy::Immediate);
        b.dispatch(Action::HideAll);
        assert!(b.screens().iter().all(Screen::is_hidden));
        b.dispatch(Action::ShowAll);
        assert!(b.screens().iter().all(|s| !s.is_hidden()));
    }

    #[test]
    fn test_fullscreen_hide_is_deferred() {
        let mut b = blanker(MAC);
        b.hide(1);

        let s = b.screen(1).unwrap();
        assert!(s.is_hidden());
        assert!(s.is_hide_pending());
        assert_eq!(
            take_calls(&mut b),
            vec![Call::Fullscreen(10, false), Call::Schedule { slot: 1, generation: 1 }]
        );

        b.finish_hide(1, 1);
        assert!(!b.screen(1).unwrap().is_hide_pending());
        assert_eq!(take_calls(&mut b), vec![Call::Hide(10)]);
    }

    #[test]
    fn test_toggle_reshows_after_deferred_hide() {
        // The hidden flag is set on the deferred path too, so a second toggle shows.
        let mut b = blanker(MAC);
        b.toggle(0);
        b.finish_hide(0, 1);
        take_calls(&mut b);

        b.toggle(0);
        assert!(!b.screen(0).unwrap().is_hidden());
        assert_eq!(take_calls(&mut b), vec![Call::Fullscreen(20, true), Call::Show(20)]);
    }

    #[test]
    fn test_show_cancels_pending_hide() {
        let mut b = blanker(MAC);
        b.hide(0);
        b.show(0);
        take_calls(&mut b);

        // The timer from the first hide fires after the show.
        b.finish_hide(0, 1);
        assert!(take_calls(&mut b).is_empty());
        assert!(!b.screen(0).unwrap().is_hidden());
    }

    #[test]
    fn test_rehide_after_cancel_uses_new_generation() {
        let mut b = blanker(MAC);
        b.hide(0);
        b.show(0);
        b.hide(0);
        let calls = take_calls(&mut b);
        assert_eq!(calls.last(), Some(&Call::Schedule { slot: 0, generation: 3 }));

        b.finish_hide(0, 1);
        assert!(take_calls(&mut b).is_empty());
        b.finish_hide(0, 3);
        assert_eq!(take_calls(&mut b), vec![Call::Hide(20)]);
    }

    #[test]
    fn test_hide_while_pending_is_a_no_op() {
        let mut b = blanker(MAC);
        b.hide(2);
        take_calls(&mut b);
        b.hide_all();
        // Slots 0 and 1 start their own deferred hides; slot 2 is left alone.
        let calls = take_calls(&mut b);
        assert!(!calls.iter().any(|c| matches!(c, Call::Fullscreen(30, _) | Call::Schedule { slot: 2, .. })));
        assert_eq!(calls.len(), 4);
    }

    #[test]
    fn test_windowed_screen_hides_immediately_with_mac_strategy() {
        let mut b = blanker(MAC);
        b.backend_mut().fullscreen.remove(&10);
        b.hide(1);
        assert!(!b.screen(1).unwrap().is_hide_pending());
        assert_eq!(take_calls(&mut b), vec![Call::Hide(10)]);
    }

    #[test]
    fn test_unknown_slot_is_ignored() {
        let mut b = blanker(HideStrategy::Immediate);
        b.dispatch(Action::Toggle(7));
        b.finish_hide(42, 1);
        assert!(take_calls(&mut b).is_empty());
    }

    #[test]
    fn test_closed_screens_are_skipped() {
        let mut b = blanker(HideStrategy::Immediate);
        b.mark_closed(1);
        assert_eq!(b.open_count(), 2);
        b.show_all();
        let calls = take_calls(&mut b);
        assert!(!calls.contains(&Call::Show(10)));
        assert_eq!(b.find_slot(|w| *w == 10), None);
        assert_eq!(b.find_slot(|w| *w == 30), Some(2));
    }

    #[test]
    fn test_transition_toggles_only_when_state_differs() {
        let mut t = FullscreenTransitions::default();
        assert!(!t.request(1, true, true));
        assert_eq!(t.pending(&1), None);

        assert!(t.request(1, true, false));
        assert_eq!(t.pending(&1), Some(false));
        assert!(!t.finished(1, false));
        assert_eq!(t.pending(&1), None);
    }

    #[test]
    fn test_show_during_exit_animation_reenters_fullscreen() {
        let mut t = FullscreenTransitions::default();
        // Hide starts leaving fullscreen.
        assert!(t.request(7, true, false));
        // Show arrives while the window is still animating out.
        assert!(!t.request(7, true, true));
        assert_eq!(t.pending(&7), Some(true));

        // Exit lands; the show is replayed.
        assert!(t.finished(7, false));
        assert_eq!(t.pending(&7), Some(true));
        assert!(!t.finished(7, true));
        assert_eq!(t.pending(&7), None);
    }

    #[test]
    fn test_request_reverted_mid_flight_needs_no_replay() {
        let mut t = FullscreenTransitions::default();
        assert!(t.request(3, false, true));
        assert!(!t.request(3, false, false));
        assert!(!t.request(3, false, true));
        assert!(!t.finished(3, true));
        // Unknown window.
        assert!(!t.finished(9, true));
    }

    #[test]
    fn test_quits_only_after_last_close() {
        let mut b = blanker(HideStrategy::Immediate);
        let quit = LastClose::new(true, false);
        assert_eq!(quit, LastClose::Quit);

        b.mark_closed(0);
        b.mark_closed(2);
        assert!(!b.all_closed());
        assert!(!b.should_quit(quit));

        // Closing the same slot twice changes nothing.
        b.mark_closed(2);
        assert!(!b.should_quit(quit));

        b.mark_closed(1);
        assert!(b.all_closed());
        assert!(b.should_quit(quit));
        assert!(!b.should_quit(LastClose::KeepRunning));
    }

    #[test]
    fn test_last_close_policy() {
        assert_eq!(LastClose::new(true, false), LastClose::Quit);
        assert_eq!(LastClose::new(false, false), LastClose::KeepRunning);
        assert_eq!(LastClose::new(true, true), LastClose::KeepRunning);
        if cfg!(target_os = "macos") {
            assert_eq!(LastClose::for_current_platform(true), LastClose::KeepRunning);
        } else {
            assert_eq!(LastClose::for_current_platform(true), LastClose::Quit);
        }
    }

    #[test]
    fn test_closed_slot_ignores_actions() {
        let mut b = blanker(HideStrategy::Immediate);
        b.mark_closed(0);
        b.dispatch(Action::Toggle(0));
        b.hide(0);
        b.show(0);
        assert!(take_calls(&mut b).is_empty());
        assert!(b.screen(0).unwrap().is_closed());
    }

    #[test]
    fn test_into_parts_returns_windows_in_slot_order() {
        let b = blanker(HideStrategy::Immediate);
        let (_, windows) = b.into_parts();
        assert_eq!(windows, vec![20, 10, 30]);
    }

    #[test]
    fn test_strategy_for_current_platform() {
        let delay = Duration::from_millis(5);
        let strategy = HideStrategy::for_current_platform(delay);
        if cfg!(target_os = "macos") {
            assert_eq!(strategy, HideStrategy::LeaveFullscreenFirst { delay });
        } else {
            assert_eq!(strategy, HideStrategy::Immediate);
        }
    }
}
