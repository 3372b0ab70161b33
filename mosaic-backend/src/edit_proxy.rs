//! # Input-Method Bridging
//!
//! The invisible edit proxy is a hidden native text view that exists only
//! to be the input-method framework's target, so a software-rendered text
//! field can receive the platform's soft keyboard and composition
//! features. This module owns the session state machine that hands native
//! focus back and forth between the primary rendering surface and the
//! proxy, and keeps the proxy's text/cursor and the toolkit field's in
//! step.
//!
//! All methods here run on the toolkit thread. Native callbacks (focus,
//! text change, editor action) are marshaled here by the platform glue
//! via [`crate::dispatch::ToolkitHandle::invoke_later`] before they land.

use std::sync::Weak;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{
    form::{EditableText, FieldHandle, FormHandle},
    host::{HostEditTarget, HostSurfaceFocus},
};

/// Where the edit bridge is in the focus handoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session. The proxy is not focusable and the primary surface
    /// holds native focus.
    Idle,
    /// The proxy has been made focusable and asked for focus; waiting
    /// for the native focus-gained callback.
    Starting,
    /// The proxy holds native focus and edits flow both ways.
    Active,
}

/// The editor action key the native keyboard reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    Done,
    Go,
    Next,
}

struct EditSession {
    /// Weak so the session never extends the field's life past its
    /// natural focus lifetime.
    field: Weak<Mutex<dyn EditableText>>,
    last_text: String,
    last_cursor: usize,
}

/// Bridges one focused toolkit text field to the native input method.
pub struct EditBridge {
    state: SessionState,
    session: Option<EditSession>,
    edit_target: Box<dyn HostEditTarget>,
    surface_focus: Box<dyn HostSurfaceFocus>,
    keyboard_visible: bool,
    /// Invoked after a session fully tears down, so deferred work (a
    /// resize held back during the session) can be replayed.
    session_ended: Option<Box<dyn FnMut() + Send>>,
}

impl EditBridge {
    pub fn new(
        edit_target: Box<dyn HostEditTarget>,
        surface_focus: Box<dyn HostSurfaceFocus>,
    ) -> Self {
        Self {
            state: SessionState::Idle,
            session: None,
            edit_target,
            surface_focus,
            keyboard_visible: false,
            session_ended: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn keyboard_visible(&self) -> bool {
        self.keyboard_visible
    }

    pub fn set_session_ended_hook(&mut self, hook: impl FnMut() + Send + 'static) {
        self.session_ended = Some(Box::new(hook));
    }

    /// Starts bridging `field` to the native input method.
    ///
    /// Sessions never overlap: a session already underway is driven
    /// through its full teardown before the new handoff begins.
    pub fn begin_session(&mut self, field: &FieldHandle) {
        if self.state != SessionState::Idle {
            self.end_session();
        }
        let (constraints, single_line) = {
            let field = field.lock();
            (field.constraints(), field.is_single_line())
        };
        self.session = Some(EditSession {
            field: std::sync::Arc::downgrade(field),
            last_text: String::new(),
            last_cursor: 0,
        });
        self.state = SessionState::Starting;
        self.edit_target.configure(constraints, single_line);
        self.edit_target.set_focusable(true);
        self.surface_focus.set_focusable(false);
        self.edit_target.request_focus();
        self.edit_target.show_keyboard();
        self.keyboard_visible = true;
    }

    /// Native focus landed on the proxy; seed it from the field and go
    /// Active.
    ///
    /// Returns `true` when a session actually activated, so the owner
    /// can register the cursor poll task.
    pub fn on_native_focus_gained(&mut self) -> bool {
        if self.state != SessionState::Starting {
            debug!("proxy focus gained outside a starting session; ignoring");
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(field) = session.field.upgrade() else {
            warn!("field dropped before session activation");
            self.end_session();
            return false;
        };
        let (text, cursor) = {
            let field = field.lock();
            (field.text(), field.cursor())
        };
        self.edit_target.set_text(&text);
        self.edit_target.set_cursor(cursor);
        session.last_text = text;
        session.last_cursor = cursor;
        self.state = SessionState::Active;
        true
    }

    /// Native focus left the proxy; tear the session down.
    pub fn on_native_focus_lost(&mut self) {
        if self.state == SessionState::Idle {
            return;
        }
        self.end_session();
    }

    /// Hides the keyboard without waiting for the focus-lost callback.
    pub fn dismiss_keyboard(&mut self) {
        self.edit_target.hide_keyboard();
        self.keyboard_visible = false;
        if self.state != SessionState::Idle {
            self.end_session();
        }
    }

    /// The user edited through the native input method.
    ///
    /// Runs on the toolkit thread after marshaling; the field is written
    /// here, never from the native callback thread.
    pub fn on_text_changed(&mut self, text: &str, cursor: usize) {
        if self.state != SessionState::Active {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(field) = session.field.upgrade() else {
            self.end_session();
            return;
        };
        // The native editor echoes programmatic set_text back through
        // this callback; writing it again would loop.
        if text == session.last_text && cursor == session.last_cursor {
            return;
        }
        {
            let mut field = field.lock();
            field.set_text(text);
            field.set_cursor(cursor);
        }
        session.last_text = text.to_string();
        session.last_cursor = cursor;
    }

    /// Handles the input method's delete-surrounding-text request.
    ///
    /// Some native keyboards report a plain backspace only as a
    /// zero-length delete-surrounding call, so `(0, 0)` is synthesized
    /// into a single backspace.
    pub fn on_delete_surrounding(&mut self, before: usize, after: usize) {
        if self.state != SessionState::Active {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(field) = session.field.upgrade() else {
            self.end_session();
            return;
        };
        let (before, after) = if before == 0 && after == 0 {
            (1, 0)
        } else {
            (before, after)
        };
        let (text, cursor) = {
            let mut field = field.lock();
            let chars: Vec<char> = field.text().chars().collect();
            let cursor = field.cursor().min(chars.len());
            let start = cursor.saturating_sub(before);
            let end = (cursor + after).min(chars.len());
            let text: String = chars[..start].iter().chain(chars[end..].iter()).collect();
            field.set_text(&text);
            field.set_cursor(start);
            (text, start)
        };
        self.edit_target.set_text(&text);
        self.edit_target.set_cursor(cursor);
        session.last_text = text;
        session.last_cursor = cursor;
    }

    /// Handles the keyboard's editor action key.
    ///
    /// Done/Go close the keyboard and then fire the field's default
    /// command when one is bound; Next advances focus and keeps the
    /// keyboard up. Takes the form handle rather than a locked form:
    /// closing the keyboard runs the session-ended hook, which locks the
    /// form itself to replay deferred work.
    pub fn on_editor_action(&mut self, action: EditorAction, form: &FormHandle) {
        if self.state != SessionState::Active {
            return;
        }
        match action {
            EditorAction::Done | EditorAction::Go => {
                let field = self
                    .session
                    .as_ref()
                    .and_then(|session| session.field.upgrade());
                let has_command = field
                    .as_ref()
                    .is_some_and(|field| field.lock().has_default_command());
                // The hide request must be in flight before the command
                // runs; the command may replace the whole form.
                self.dismiss_keyboard();
                if has_command && let Some(field) = field {
                    field.lock().dispatch_default_command();
                }
            }
            EditorAction::Next => {
                form.lock().focus_next_field();
            }
        }
    }

    /// Per-frame cursor poll, registered with
    /// [`crate::frame::FramePoller`] on activation.
    ///
    /// Pushes toolkit-side caret moves out to the native editor. Returns
    /// `false` once the session is no longer Active, deregistering
    /// itself.
    pub fn poll_cursor(&mut self) -> bool {
        if self.state != SessionState::Active {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(field) = session.field.upgrade() else {
            self.end_session();
            return false;
        };
        let cursor = field.lock().cursor();
        if cursor != session.last_cursor {
            self.edit_target.set_cursor(cursor);
            session.last_cursor = cursor;
        }
        true
    }

    fn end_session(&mut self) {
        self.edit_target.set_text("");
        self.edit_target.set_focusable(false);
        if self.keyboard_visible {
            self.edit_target.hide_keyboard();
            self.keyboard_visible = false;
        }
        self.surface_focus.set_focusable(true);
        self.surface_focus.request_focus();
        self.session = None;
        self.state = SessionState::Idle;
        if let Some(hook) = self.session_ended.as_mut() {
            hook();
        }
    }
}
