//! # Binding Context
//!
//! One explicit context object wires the whole binding together at
//! startup: the host service handles, the toolkit thread, the edit
//! bridge, the peer registry and the synchronizer. Components receive
//! what they need through the context instead of reaching for
//! process-wide statics, and teardown has a single owner.
//!
//! The builder fails fast: a missing required host argument is an error
//! at [`BindingContextBuilder::build`] time, not a panic deep inside a
//! callback later.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::{
    dispatch::{ToolkitHandle, ToolkitThread, UiDispatcher, post_and_wait},
    edit_proxy::{EditBridge, EditorAction},
    error::BindingError,
    form::FormHandle,
    frame::FramePoller,
    host::{
        HostContainer, HostDialogs, HostEditTarget, HostServices, HostSurfaceFocus,
        ServicesHandle, Vibrator,
    },
    input_router::{InputRouter, RouterAction},
    keymap::RawKeyEvent,
    paint::PaintSurface,
    peer::{NativePeerRegistry, Peer},
    presenter::PresentTarget,
    px::{Px, PxRect},
    synchronizer::PeerSynchronizer,
};

/// Collects the host services required to bring the binding up.
#[derive(Default)]
pub struct BindingContextBuilder {
    form: Option<FormHandle>,
    ui: Option<Arc<dyn UiDispatcher>>,
    container: Option<Box<dyn HostContainer>>,
    edit_target: Option<Box<dyn HostEditTarget>>,
    surface_focus: Option<Box<dyn HostSurfaceFocus>>,
    dialogs: Option<Arc<dyn HostDialogs>>,
    services: Option<Box<dyn HostServices>>,
}

impl BindingContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(mut self, form: FormHandle) -> Self {
        self.form = Some(form);
        self
    }

    pub fn ui_dispatcher(mut self, ui: Arc<dyn UiDispatcher>) -> Self {
        self.ui = Some(ui);
        self
    }

    pub fn container(mut self, container: Box<dyn HostContainer>) -> Self {
        self.container = Some(container);
        self
    }

    pub fn edit_target(mut self, target: Box<dyn HostEditTarget>) -> Self {
        self.edit_target = Some(target);
        self
    }

    pub fn surface_focus(mut self, focus: Box<dyn HostSurfaceFocus>) -> Self {
        self.surface_focus = Some(focus);
        self
    }

    pub fn dialogs(mut self, dialogs: Arc<dyn HostDialogs>) -> Self {
        self.dialogs = Some(dialogs);
        self
    }

    pub fn services(mut self, services: Box<dyn HostServices>) -> Self {
        self.services = Some(services);
        self
    }

    /// Wires everything up and spawns the toolkit thread.
    pub fn build(self) -> Result<BindingContext, BindingError> {
        let form = self.form.ok_or(BindingError::MissingArgument("form"))?;
        let ui = self
            .ui
            .ok_or(BindingError::MissingArgument("ui_dispatcher"))?;
        let container = self
            .container
            .ok_or(BindingError::MissingArgument("container"))?;
        let edit_target = self
            .edit_target
            .ok_or(BindingError::MissingArgument("edit_target"))?;
        let surface_focus = self
            .surface_focus
            .ok_or(BindingError::MissingArgument("surface_focus"))?;
        let dialogs = self
            .dialogs
            .ok_or(BindingError::MissingArgument("dialogs"))?;
        let services = self
            .services
            .ok_or(BindingError::MissingArgument("services"))?;

        // Uncaught toolkit errors surface through the blocking native
        // error dialog, then the loop resumes.
        let panic_dialogs = dialogs.clone();
        let panic_ui = ui.clone();
        let toolkit = ToolkitThread::spawn(Arc::new(move |message: &str| {
            let dialogs = panic_dialogs.clone();
            let message = message.to_string();
            post_and_wait(panic_ui.as_ref(), move || {
                dialogs.show_error_blocking("Internal application error", &message);
            });
        }));
        let handle = toolkit.handle();

        let surface = Arc::new(Mutex::new(PaintSurface::new()));
        let bridge = Arc::new(Mutex::new(EditBridge::new(edit_target, surface_focus)));

        let session_bridge = bridge.clone();
        let repaint_handle = handle.clone();
        let synchronizer = Arc::new_cyclic(|weak: &std::sync::Weak<Mutex<PeerSynchronizer>>| {
            let weak = weak.clone();
            Mutex::new(PeerSynchronizer::new(
                surface.clone(),
                move || {
                    session_bridge.lock().state() != crate::edit_proxy::SessionState::Idle
                },
                move || {
                    let weak = weak.clone();
                    repaint_handle.invoke_later(move || {
                        if let Some(sync) = weak.upgrade() {
                            sync.lock().present_full();
                        }
                    });
                },
            ))
        });
        {
            let sync = Arc::downgrade(&synchronizer);
            let hook_form = form.clone();
            bridge.lock().set_session_ended_hook(move || {
                let Some(sync) = sync.upgrade() else {
                    return;
                };
                let notice = sync.lock().on_session_ended();
                if let Some(notice) = notice {
                    notice.deliver(&hook_form);
                }
            });
        }

        let services: ServicesHandle = Arc::new(Mutex::new(services));
        Ok(BindingContext {
            form,
            ui,
            handle,
            toolkit: Some(toolkit),
            poller: Arc::new(FramePoller::new()),
            router: Arc::new(Mutex::new(InputRouter::new())),
            bridge,
            registry: Arc::new(Mutex::new(NativePeerRegistry::new(container))),
            synchronizer,
            dialogs,
            vibrator: Vibrator::new(services.clone()),
            services,
            surface,
        })
    }
}

/// The assembled binding. One per host window.
pub struct BindingContext {
    form: FormHandle,
    ui: Arc<dyn UiDispatcher>,
    handle: ToolkitHandle,
    toolkit: Option<ToolkitThread>,
    poller: Arc<FramePoller>,
    router: Arc<Mutex<InputRouter>>,
    bridge: Arc<Mutex<EditBridge>>,
    registry: Arc<Mutex<NativePeerRegistry>>,
    synchronizer: Arc<Mutex<PeerSynchronizer>>,
    dialogs: Arc<dyn HostDialogs>,
    vibrator: Vibrator,
    services: ServicesHandle,
    surface: Arc<Mutex<PaintSurface>>,
}

impl std::fmt::Debug for BindingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingContext").finish_non_exhaustive()
    }
}

impl BindingContext {
    pub fn builder() -> BindingContextBuilder {
        BindingContextBuilder::new()
    }

    pub fn toolkit_handle(&self) -> ToolkitHandle {
        self.handle.clone()
    }

    pub fn surface(&self) -> Arc<Mutex<PaintSurface>> {
        self.surface.clone()
    }

    pub fn registry(&self) -> Arc<Mutex<NativePeerRegistry>> {
        self.registry.clone()
    }

    // --- surface lifecycle, called from the host's lifecycle glue ---

    pub fn surface_available(&self, target: Box<dyn PresentTarget>, width: Px, height: Px) {
        let sync = self.synchronizer.clone();
        let form = self.form.clone();
        self.handle.invoke_later(move || {
            // Release the synchronizer before the form hooks run; show()
            // may paint and flush straight back into it.
            let notice = sync.lock().surface_available(target, width, height);
            notice.deliver(&form);
        });
    }

    pub fn surface_destroyed(&self) {
        let sync = self.synchronizer.clone();
        let form = self.form.clone();
        self.handle.invoke_later(move || {
            let notice = sync.lock().surface_destroyed();
            notice.deliver(&form);
        });
    }

    pub fn surface_size_changed(&self, width: Px, height: Px) {
        let sync = self.synchronizer.clone();
        let form = self.form.clone();
        self.handle.invoke_later(move || {
            let notice = sync.lock().size_changed(width, height);
            if let Some(notice) = notice {
                notice.deliver(&form);
            }
        });
    }

    /// Pushes the painted buffer to screen. Toolkit-thread entry point,
    /// re-entrant from the form's paint pass.
    pub fn flush(&self, region: Option<PxRect>) {
        self.synchronizer.lock().flush(region);
    }

    /// Runs one toolkit frame's worth of housekeeping: per-frame polls,
    /// then peer compositing when a native redraw landed.
    pub fn run_frame(&self) {
        self.poller.run_frame();
        let mut registry = self.registry.lock();
        if registry.repaint_needed() {
            let mut surface = self.surface.lock();
            registry.composite_all(&mut surface);
            drop(surface);
            drop(registry);
            self.flush(None);
        }
    }

    // --- input, called from the host's event glue ---

    pub fn key_event(&self, event: RawKeyEvent) {
        let form = self.form.clone();
        let bridge = self.bridge.clone();
        let router = self.router.clone();
        self.handle.invoke_later(move || {
            let keyboard_visible = bridge.lock().keyboard_visible();
            let action = router
                .lock()
                .on_key(event, &mut *form.lock(), keyboard_visible);
            if action == Some(RouterAction::DismissKeyboard) {
                bridge.lock().dismiss_keyboard();
            }
        });
    }

    pub fn pointer_down(&self, x: i32, y: i32) {
        let form = self.form.clone();
        let router = self.router.clone();
        self.handle
            .invoke_later(move || router.lock().on_pointer_down(x, y, &mut *form.lock()));
    }

    pub fn pointer_move(&self, x: i32, y: i32) {
        let form = self.form.clone();
        let router = self.router.clone();
        self.handle
            .invoke_later(move || router.lock().on_pointer_move(x, y, &mut *form.lock()));
    }

    pub fn pointer_up(&self, x: i32, y: i32) {
        let form = self.form.clone();
        let router = self.router.clone();
        self.handle
            .invoke_later(move || router.lock().on_pointer_up(x, y, &mut *form.lock()));
    }

    // --- virtual keyboard, called from the form collaborator ---

    /// Shows or hides the virtual keyboard for the focused field.
    ///
    /// Safe to call from inside the form's own dispatch callbacks: the
    /// request is queued behind the current task instead of re-locking
    /// the form here.
    pub fn show_virtual_keyboard(&self, show: bool) {
        let form = self.form.clone();
        let bridge = self.bridge.clone();
        self.handle.invoke_later(move || {
            if !show {
                bridge.lock().dismiss_keyboard();
                return;
            }
            let field = form.lock().focused_editable();
            if let Some(field) = field {
                bridge.lock().begin_session(&field);
            }
        });
    }

    // --- edit proxy callbacks, called from the host's IME glue ---

    pub fn proxy_focus_gained(&self) {
        let bridge = self.bridge.clone();
        let poller = self.poller.clone();
        self.handle.invoke_later(move || {
            if bridge.lock().on_native_focus_gained() {
                let poll_bridge = Arc::downgrade(&bridge);
                poller.register(move || {
                    poll_bridge
                        .upgrade()
                        .is_some_and(|bridge| bridge.lock().poll_cursor())
                });
            }
        });
    }

    pub fn proxy_focus_lost(&self) {
        let bridge = self.bridge.clone();
        self.handle
            .invoke_later(move || bridge.lock().on_native_focus_lost());
    }

    pub fn proxy_text_changed(&self, text: String, cursor: usize) {
        let bridge = self.bridge.clone();
        self.handle
            .invoke_later(move || bridge.lock().on_text_changed(&text, cursor));
    }

    pub fn proxy_delete_surrounding(&self, before: usize, after: usize) {
        let bridge = self.bridge.clone();
        self.handle
            .invoke_later(move || bridge.lock().on_delete_surrounding(before, after));
    }

    pub fn proxy_editor_action(&self, action: EditorAction) {
        let bridge = self.bridge.clone();
        let form = self.form.clone();
        self.handle
            .invoke_later(move || bridge.lock().on_editor_action(action, &form));
    }

    // --- peers ---

    pub fn add_peer(&self, peer: Peer) {
        self.registry.lock().add(peer);
    }

    pub fn remove_peer(&self, id: u64) {
        self.registry.lock().remove(id);
    }

    pub fn reposition_peer(&self, id: u64, bounds: PxRect) {
        self.registry.lock().reposition(id, bounds);
    }

    /// Native redraw notification for one peer, from the OS UI thread.
    pub fn peer_redraw(&self, id: u64) {
        self.registry.lock().native_redraw(id);
    }

    // --- device services ---

    pub fn vibrate(&self, duration_ms: u32) {
        self.vibrator.vibrate(duration_ms);
    }

    /// Clipboard reads go through the OS UI thread.
    pub fn clipboard_get(&self) -> Option<String> {
        let services = self.services.clone();
        post_and_wait(self.ui.as_ref(), move || services.lock().clipboard_get())
    }

    pub fn clipboard_set(&self, text: String) {
        let services = self.services.clone();
        post_and_wait(self.ui.as_ref(), move || services.lock().clipboard_set(&text));
    }

    /// Shows the blocking native edit dialog for the focused field.
    pub fn edit_focused_field_blocking(&self) {
        let field = self.form.lock().focused_editable();
        if let Some(field) = field {
            self.synchronizer
                .lock()
                .edit_text_blocking(self.ui.as_ref(), self.dialogs.clone(), &field);
        }
    }

    /// Stops the toolkit thread after draining queued tasks.
    pub fn teardown(mut self) {
        info!("tearing down binding context");
        if let Some(toolkit) = self.toolkit.take() {
            toolkit.shutdown();
        }
    }

    #[cfg(test)]
    fn drain_toolkit(&self) {
        self.handle
            .invoke_and_wait(|| {})
            .expect("toolkit thread alive");
    }
}
