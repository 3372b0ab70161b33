//! # Peer Synchronization
//!
//! The orchestrator that ties surface lifecycle, resize propagation and
//! the framebuffer together. It owns the cross-cutting invariants:
//!
//! - the paint surface tracks the presentable surface's size, except
//!   while an edit session is underway, when resizes are deferred and
//!   the last one replays after the session ends (resizing mid-edit
//!   races with the input method's own layout assumptions);
//! - surface availability drives the toolkit's show/hide hooks, with
//!   the first repaint scheduled through the serialized task queue so
//!   it is not lost when the surface appears before the toolkit is
//!   ready to paint.
//!
//! All entry points run on the toolkit thread; platform glue marshals
//! native lifecycle callbacks here first. Lifecycle methods never call
//! into the form themselves: they return a [`FormNotice`] the caller
//! delivers after releasing the synchronizer's lock, because the form's
//! hooks routinely paint and [`flush`](PeerSynchronizer::flush)
//! synchronously, which re-enters the synchronizer.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::{
    dispatch::{UiDispatcher, post_and_wait},
    form::FormHandle,
    host::HostDialogs,
    paint::PaintSurface,
    presenter::{DirtyRegion, FrameBufferPresenter, PresentTarget},
    px::{Px, PxRect},
};

/// Shared handle to the main paint surface.
pub type SurfaceHandle = Arc<Mutex<PaintSurface>>;

/// A pending form lifecycle notification.
///
/// Produced by the synchronizer's lifecycle methods instead of calling
/// the form directly; deliver it only after releasing the synchronizer's
/// lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormNotice {
    /// The display came up at the given size.
    Shown { width: Px, height: Px },
    /// The display went away.
    Hidden,
    /// The display area changed size.
    Resized { width: Px, height: Px },
}

impl FormNotice {
    /// Fires the corresponding form hooks. The caller must not hold the
    /// synchronizer's lock: the hooks may paint and flush synchronously.
    pub fn deliver(self, form: &FormHandle) {
        let mut form = form.lock();
        match self {
            Self::Shown { width, height } => {
                form.size_changed(width.raw(), height.raw());
                form.show();
            }
            Self::Hidden => form.hide(),
            Self::Resized { width, height } => form.size_changed(width.raw(), height.raw()),
        }
    }
}

pub struct PeerSynchronizer {
    surface: SurfaceHandle,
    presenter: FrameBufferPresenter,
    /// Queries whether an edit session currently holds native focus.
    session_active: Box<dyn Fn() -> bool + Send>,
    /// Enqueues a repaint on the toolkit task queue.
    schedule_repaint: Box<dyn FnMut() + Send>,
    /// Resize held back during an edit session; last one wins.
    deferred_resize: Option<(Px, Px)>,
    shown: bool,
}

impl PeerSynchronizer {
    pub fn new(
        surface: SurfaceHandle,
        session_active: impl Fn() -> bool + Send + 'static,
        schedule_repaint: impl FnMut() + Send + 'static,
    ) -> Self {
        Self {
            surface,
            presenter: FrameBufferPresenter::new(),
            session_active: Box::new(session_active),
            schedule_repaint: Box::new(schedule_repaint),
            deferred_resize: None,
            shown: false,
        }
    }

    pub fn surface(&self) -> SurfaceHandle {
        self.surface.clone()
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    /// The host's presentable surface came up.
    ///
    /// Sizes the paint surface and schedules the first repaint through
    /// the task queue. The returned notice drives the form's resize and
    /// show hooks.
    #[must_use]
    pub fn surface_available(
        &mut self,
        target: Box<dyn PresentTarget>,
        width: Px,
        height: Px,
    ) -> FormNotice {
        info!(
            width = width.raw(),
            height = height.raw(),
            "presentable surface available"
        );
        self.presenter.attach_target(target);
        self.surface.lock().acquire(width, height);
        self.shown = true;
        (self.schedule_repaint)();
        FormNotice::Shown { width, height }
    }

    /// The host's presentable surface went away. Flushes become no-ops
    /// until it returns.
    #[must_use]
    pub fn surface_destroyed(&mut self) -> FormNotice {
        info!("presentable surface destroyed");
        self.presenter.detach_target();
        self.shown = false;
        FormNotice::Hidden
    }

    /// A confirmed size change from the host.
    ///
    /// Applied immediately unless an edit session is active, in which
    /// case it is deferred (returning `None`) and replayed once the
    /// session ends.
    #[must_use]
    pub fn size_changed(&mut self, width: Px, height: Px) -> Option<FormNotice> {
        if (self.session_active)() {
            self.deferred_resize = Some((width, height));
            return None;
        }
        Some(self.apply_resize(width, height))
    }

    /// Replays a deferred resize. Wired to the edit bridge's
    /// session-ended hook.
    #[must_use]
    pub fn on_session_ended(&mut self) -> Option<FormNotice> {
        self.deferred_resize
            .take()
            .map(|(width, height)| self.apply_resize(width, height))
    }

    fn apply_resize(&mut self, width: Px, height: Px) -> FormNotice {
        // Acquire discards the buffer contents; the form repaints fully.
        self.surface.lock().acquire(width, height);
        FormNotice::Resized { width, height }
    }

    /// Pushes the painted buffer to screen, confined to `region` when
    /// given. Re-entrant and safe without a live surface.
    pub fn flush(&mut self, region: Option<PxRect>) {
        let dirty = match region {
            Some(rect) => DirtyRegion::Partial(rect),
            None => DirtyRegion::Full,
        };
        let surface = self.surface.lock();
        self.presenter.present(&surface, dirty);
    }

    /// Presents the whole surface. Called by the repaint task scheduled
    /// from [`Self::surface_available`].
    pub fn present_full(&mut self) {
        let surface = self.surface.lock();
        self.presenter.present_full(&surface);
    }

    /// Shows the blocking native text-edit dialog and delivers the final
    /// text back into `field` on completion.
    ///
    /// Blocks the toolkit thread while the OS UI thread runs the dialog.
    /// This is the documented exception to the no-blocking rule: the
    /// host has no asynchronous presentation path for this dialog.
    pub fn edit_text_blocking(
        &mut self,
        ui: &dyn UiDispatcher,
        dialogs: Arc<dyn HostDialogs>,
        field: &crate::form::FieldHandle,
    ) {
        let (initial, constraints) = {
            let field = field.lock();
            (field.text(), field.constraints())
        };
        let edited = post_and_wait(ui, move || dialogs.edit_text_blocking(&initial, constraints));
        if let Some(text) = edited {
            self.on_editing_complete(field, &text);
        }
    }

    /// Delivers final edited text from a blocking native edit dialog.
    pub fn on_editing_complete(&mut self, field: &crate::form::FieldHandle, text: &str) {
        let mut field = field.lock();
        field.set_text(text);
        field.set_cursor(text.chars().count());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex as StdMutex,
        atomic::{AtomicBool, Ordering},
    };

    use super::*;
    use crate::form::fakes::{FakeForm, FormCall};
    use crate::error::PresentError;

    struct RecordingTarget {
        blits: Arc<StdMutex<Vec<PxRect>>>,
    }

    impl PresentTarget for RecordingTarget {
        fn blit(&mut self, _rows: &[u32], region: PxRect) -> Result<(), PresentError> {
            self.blits.lock().unwrap().push(region);
            Ok(())
        }
    }

    fn harness(session_active: Arc<AtomicBool>) -> (PeerSynchronizer, Arc<StdMutex<usize>>) {
        let surface: SurfaceHandle = Arc::new(Mutex::new(PaintSurface::new()));
        let repaints = Arc::new(StdMutex::new(0usize));
        let repaint_count = repaints.clone();
        let sync = PeerSynchronizer::new(
            surface,
            move || session_active.load(Ordering::SeqCst),
            move || *repaint_count.lock().unwrap() += 1,
        );
        (sync, repaints)
    }

    #[test]
    fn test_surface_available_notice_and_scheduled_repaint() {
        let (mut sync, repaints) = harness(Arc::new(AtomicBool::new(false)));
        let blits = Arc::new(StdMutex::new(Vec::new()));
        let notice = sync.surface_available(
            Box::new(RecordingTarget {
                blits: blits.clone(),
            }),
            Px(8),
            Px(6),
        );
        assert!(sync.is_shown());
        assert_eq!(
            notice,
            FormNotice::Shown {
                width: Px(8),
                height: Px(6)
            }
        );
        assert_eq!(*repaints.lock().unwrap(), 1);

        // The scheduled repaint task ends in a whole-surface present.
        sync.present_full();
        assert_eq!(
            *blits.lock().unwrap(),
            vec![PxRect::new(Px(0), Px(0), Px(8), Px(6))]
        );
    }

    #[test]
    fn test_notices_drive_form_hooks_in_order() {
        let form = Arc::new(Mutex::new(FakeForm::default()));
        let handle: FormHandle = form.clone();
        FormNotice::Shown {
            width: Px(8),
            height: Px(6),
        }
        .deliver(&handle);
        FormNotice::Resized {
            width: Px(4),
            height: Px(3),
        }
        .deliver(&handle);
        FormNotice::Hidden.deliver(&handle);
        assert_eq!(
            form.lock().calls,
            vec![
                FormCall::SizeChanged(8, 6),
                FormCall::Show,
                FormCall::SizeChanged(4, 3),
                FormCall::Hide,
            ]
        );
    }

    #[test]
    fn test_resize_during_session_is_deferred_last_wins() {
        let active = Arc::new(AtomicBool::new(true));
        let (mut sync, _) = harness(active.clone());
        assert_eq!(sync.size_changed(Px(100), Px(50)), None);
        assert_eq!(sync.size_changed(Px(120), Px(60)), None);
        assert!(sync.surface().lock().size().is_empty());

        active.store(false, Ordering::SeqCst);
        assert_eq!(
            sync.on_session_ended(),
            Some(FormNotice::Resized {
                width: Px(120),
                height: Px(60)
            }),
            "exactly one deferred resize, the last"
        );
        assert_eq!(
            sync.surface().lock().size(),
            crate::px::PxSize::new(Px(120), Px(60))
        );

        // Nothing left to replay.
        assert_eq!(sync.on_session_ended(), None);
    }

    #[test]
    fn test_resize_applies_immediately_outside_session() {
        let (mut sync, _) = harness(Arc::new(AtomicBool::new(false)));
        assert_eq!(
            sync.size_changed(Px(30), Px(40)),
            Some(FormNotice::Resized {
                width: Px(30),
                height: Px(40)
            })
        );
        assert_eq!(
            sync.surface().lock().size(),
            crate::px::PxSize::new(Px(30), Px(40))
        );
    }

    #[test]
    fn test_flush_without_surface_is_silent_noop() {
        let (mut sync, _) = harness(Arc::new(AtomicBool::new(false)));
        sync.flush(None);
        sync.flush(Some(PxRect::new(Px(0), Px(0), Px(1), Px(1))));
    }

    #[test]
    fn test_flush_confines_to_region() {
        let (mut sync, _) = harness(Arc::new(AtomicBool::new(false)));
        let blits = Arc::new(StdMutex::new(Vec::new()));
        let _ = sync.surface_available(
            Box::new(RecordingTarget {
                blits: blits.clone(),
            }),
            Px(10),
            Px(10),
        );
        blits.lock().unwrap().clear();
        let region = PxRect::new(Px(2), Px(2), Px(4), Px(4));
        sync.flush(Some(region));
        assert_eq!(*blits.lock().unwrap(), vec![region]);
    }

    #[test]
    fn test_surface_destroyed_stops_presenting() {
        let (mut sync, _) = harness(Arc::new(AtomicBool::new(false)));
        let blits = Arc::new(StdMutex::new(Vec::new()));
        let _ = sync.surface_available(
            Box::new(RecordingTarget {
                blits: blits.clone(),
            }),
            Px(4),
            Px(4),
        );
        assert_eq!(sync.surface_destroyed(), FormNotice::Hidden);
        assert!(!sync.is_shown());
        blits.lock().unwrap().clear();
        sync.flush(None);
        assert!(blits.lock().unwrap().is_empty());
    }

    #[test]
    fn test_editing_complete_writes_field() {
        let (mut sync, _) = harness(Arc::new(AtomicBool::new(false)));
        let field: crate::form::FieldHandle = Arc::new(Mutex::new(
            crate::form::fakes::FakeField::default(),
        ));
        sync.on_editing_complete(&field, "edited");
        assert_eq!(field.lock().text(), "edited");
        assert_eq!(field.lock().cursor(), 6);
    }
}
