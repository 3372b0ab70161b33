//! Host platform service traits.
//!
//! Everything the binding asks of the OS lives behind these traits: native
//! widget placement, the invisible edit view, native dialogs and device
//! services. Implementations wrap the platform's views and own the hop to
//! the OS UI thread where the platform requires one, ordinarily by posting
//! through [`crate::dispatch::UiDispatcher`]. Tests use recording fakes.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::warn;

use crate::{form::TextConstraint, px::PxRect};

/// A native widget wrapped by a toolkit peer component.
pub trait HostWidget: Send {
    /// Places the widget at `frame` in container coordinates, issuing a
    /// full native relayout.
    fn set_frame(&mut self, frame: PxRect);
    /// Shifts the widget's existing placement without relayout. Used for
    /// position-only changes, which happen on every scroll tick.
    fn offset_by(&mut self, dx: i32, dy: i32);
    fn set_visible(&mut self, visible: bool);
    /// Focusability as reported by the native widget itself.
    fn is_focusable(&self) -> bool;
    /// Requests native focus; `touch_mode` selects the focus-request
    /// variant appropriate to the device's current interaction mode.
    fn request_focus(&mut self, touch_mode: bool);
    /// Renders the widget's current native content into `pixels`
    /// (row-major ARGB, `width` pixels per row).
    fn draw(&mut self, pixels: &mut [u32], width: usize);
}

/// The view hierarchy native peer wrappers attach to.
pub trait HostContainer: Send {
    fn attach(&mut self, widget_id: u64);
    fn detach(&mut self, widget_id: u64);
    /// Whether the device is currently in touch interaction mode.
    fn in_touch_mode(&self) -> bool;
}

/// The invisible native edit view backing input-method sessions.
pub trait HostEditTarget: Send {
    fn set_focusable(&mut self, focusable: bool);
    /// Configures the native input type and editor action from the
    /// field's constraint bits before focus is requested.
    fn configure(&mut self, constraints: TextConstraint, single_line: bool);
    fn request_focus(&mut self);
    fn set_text(&mut self, text: &str);
    fn set_cursor(&mut self, position: usize);
    /// Caret position as the native editor currently reports it.
    fn cursor(&self) -> usize;
    fn show_keyboard(&mut self);
    fn hide_keyboard(&mut self);
}

/// Focusability control for the primary rendering surface.
///
/// Exactly one of the primary surface and the edit target holds native
/// focusability at any time.
pub trait HostSurfaceFocus: Send {
    fn set_focusable(&mut self, focusable: bool);
    fn request_focus(&mut self);
}

/// Native modal dialogs. Shown on the OS UI thread while the caller
/// blocks, so the handle is shared across threads.
pub trait HostDialogs: Send + Sync {
    /// Shows a modal error dialog and blocks until dismissed.
    fn show_error_blocking(&self, title: &str, message: &str);
    /// Shows a native text-edit dialog seeded with `initial`; blocks
    /// until dismissal and returns the final text, or `None` when
    /// cancelled.
    fn edit_text_blocking(&self, initial: &str, constraints: TextConstraint) -> Option<String>;
}

/// Miscellaneous device services.
pub trait HostServices: Send {
    /// Vibrates for `duration_ms`. May fail when the device lacks the
    /// service; callers do not see the failure.
    fn vibrate(&mut self, duration_ms: u32) -> Result<(), crate::error::BindingError>;
    fn clipboard_get(&mut self) -> Option<String>;
    fn clipboard_set(&mut self, text: &str);
}

/// Shared handle to the host's device services.
pub type ServicesHandle = std::sync::Arc<Mutex<Box<dyn HostServices>>>;

/// Vibration wrapper that probes the service once and caches absence.
///
/// After the first failed call every subsequent vibrate is a silent
/// no-op, so a missing service costs one warning rather than one per
/// keypress.
pub struct Vibrator {
    services: ServicesHandle,
    available: AtomicBool,
}

impl Vibrator {
    pub fn new(services: ServicesHandle) -> Self {
        Self {
            services,
            available: AtomicBool::new(true),
        }
    }

    pub fn vibrate(&self, duration_ms: u32) {
        if !self.available.load(Ordering::Relaxed) {
            return;
        }
        if let Err(err) = self.services.lock().vibrate(duration_ms) {
            warn!("vibration unavailable, disabling: {err}");
            self.available.store(false, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    //! Recording host fakes shared across binding tests.

    use std::sync::{Arc, Mutex as StdMutex};

    use super::*;
    use crate::error::BindingError;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum HostCall {
        SetFrame(PxRect),
        OffsetBy(i32, i32),
        SetVisible(bool),
        RequestFocus { touch_mode: bool },
        Attach(u64),
        Detach(u64),
        EditFocusable(bool),
        EditConfigure(u32, bool),
        EditRequestFocus,
        EditSetText(String),
        EditSetCursor(usize),
        ShowKeyboard,
        HideKeyboard,
        SurfaceFocusable(bool),
        SurfaceRequestFocus,
    }

    pub type CallLog = Arc<StdMutex<Vec<HostCall>>>;

    pub fn call_log() -> CallLog {
        Arc::new(StdMutex::new(Vec::new()))
    }

    pub struct FakeWidget {
        pub log: CallLog,
        pub focusable: bool,
        /// Pixel painted over the peer's buffer region by `draw`.
        pub fill: u32,
    }

    impl HostWidget for FakeWidget {
        fn set_frame(&mut self, frame: PxRect) {
            self.log.lock().unwrap().push(HostCall::SetFrame(frame));
        }
        fn offset_by(&mut self, dx: i32, dy: i32) {
            self.log.lock().unwrap().push(HostCall::OffsetBy(dx, dy));
        }
        fn set_visible(&mut self, visible: bool) {
            self.log.lock().unwrap().push(HostCall::SetVisible(visible));
        }
        fn is_focusable(&self) -> bool {
            self.focusable
        }
        fn request_focus(&mut self, touch_mode: bool) {
            self.log
                .lock()
                .unwrap()
                .push(HostCall::RequestFocus { touch_mode });
        }
        fn draw(&mut self, pixels: &mut [u32], _width: usize) {
            pixels.fill(self.fill);
        }
    }

    #[derive(Default)]
    pub struct FakeContainer {
        pub log: Vec<HostCall>,
        pub touch_mode: bool,
    }

    impl HostContainer for FakeContainer {
        fn attach(&mut self, widget_id: u64) {
            self.log.push(HostCall::Attach(widget_id));
        }
        fn detach(&mut self, widget_id: u64) {
            self.log.push(HostCall::Detach(widget_id));
        }
        fn in_touch_mode(&self) -> bool {
            self.touch_mode
        }
    }

    pub struct FakeEditTarget {
        pub log: CallLog,
        pub text: String,
        pub cursor: usize,
    }

    impl FakeEditTarget {
        pub fn new(log: CallLog) -> Self {
            Self {
                log,
                text: String::new(),
                cursor: 0,
            }
        }
    }

    impl HostEditTarget for FakeEditTarget {
        fn set_focusable(&mut self, focusable: bool) {
            self.log.lock().unwrap().push(HostCall::EditFocusable(focusable));
        }
        fn configure(&mut self, constraints: TextConstraint, single_line: bool) {
            self.log
                .lock()
                .unwrap()
                .push(HostCall::EditConfigure(constraints.0, single_line));
        }
        fn request_focus(&mut self) {
            self.log.lock().unwrap().push(HostCall::EditRequestFocus);
        }
        fn set_text(&mut self, text: &str) {
            self.text = text.to_string();
            self.log
                .lock()
                .unwrap()
                .push(HostCall::EditSetText(text.to_string()));
        }
        fn set_cursor(&mut self, position: usize) {
            self.cursor = position;
            self.log.lock().unwrap().push(HostCall::EditSetCursor(position));
        }
        fn cursor(&self) -> usize {
            self.cursor
        }
        fn show_keyboard(&mut self) {
            self.log.lock().unwrap().push(HostCall::ShowKeyboard);
        }
        fn hide_keyboard(&mut self) {
            self.log.lock().unwrap().push(HostCall::HideKeyboard);
        }
    }

    pub struct FakeSurfaceFocus {
        pub log: CallLog,
    }

    impl HostSurfaceFocus for FakeSurfaceFocus {
        fn set_focusable(&mut self, focusable: bool) {
            self.log
                .lock()
                .unwrap()
                .push(HostCall::SurfaceFocusable(focusable));
        }
        fn request_focus(&mut self) {
            self.log.lock().unwrap().push(HostCall::SurfaceRequestFocus);
        }
    }

    #[derive(Default)]
    pub struct FakeDialogs {
        pub errors: StdMutex<Vec<String>>,
        /// Canned reply for the edit dialog; `None` means cancelled.
        pub edit_reply: Option<String>,
    }

    impl HostDialogs for FakeDialogs {
        fn show_error_blocking(&self, _title: &str, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
        }
        fn edit_text_blocking(
            &self,
            _initial: &str,
            _constraints: TextConstraint,
        ) -> Option<String> {
            self.edit_reply.clone()
        }
    }

    pub struct FakeServices {
        pub vibrations: Arc<std::sync::atomic::AtomicUsize>,
        pub vibration_available: bool,
        pub clipboard: Option<String>,
    }

    impl Default for FakeServices {
        fn default() -> Self {
            Self {
                vibrations: Arc::new(std::sync::atomic::AtomicUsize::new(0)),
                vibration_available: true,
                clipboard: None,
            }
        }
    }

    impl HostServices for FakeServices {
        fn vibrate(&mut self, _duration_ms: u32) -> Result<(), BindingError> {
            if !self.vibration_available {
                return Err(BindingError::ServiceUnavailable("vibrator"));
            }
            self.vibrations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn clipboard_get(&mut self) -> Option<String> {
            self.clipboard.clone()
        }
        fn clipboard_set(&mut self, text: &str) {
            self.clipboard = Some(text.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{fakes::FakeServices, *};

    fn services(fake: FakeServices) -> ServicesHandle {
        Arc::new(Mutex::new(Box::new(fake) as Box<dyn HostServices>))
    }

    #[test]
    fn test_vibrator_caches_unavailability() {
        let vibrations = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let vibrator = Vibrator::new(services(FakeServices {
            vibrations: vibrations.clone(),
            vibration_available: false,
            clipboard: None,
        }));
        vibrator.vibrate(30);
        vibrator.vibrate(30);
        assert_eq!(vibrations.load(Ordering::SeqCst), 0);
        assert!(!vibrator.available.load(Ordering::Relaxed));
    }

    #[test]
    fn test_vibrator_passes_through_when_available() {
        let vibrations = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let vibrator = Vibrator::new(services(FakeServices {
            vibrations: vibrations.clone(),
            vibration_available: true,
            clipboard: None,
        }));
        vibrator.vibrate(30);
        vibrator.vibrate(30);
        assert_eq!(vibrations.load(Ordering::SeqCst), 2);
    }
}
