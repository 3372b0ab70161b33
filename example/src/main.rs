//! Headless walkthrough of the binding layer.
//!
//! Stands in for a host platform with in-process fakes: a worker thread
//! plays the OS UI thread, a console target receives framebuffer blits,
//! and a scripted "user" types into a text field through the edit bridge.
//! Run with `RUST_LOG=debug` to watch the marshaling.

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

use crossbeam_channel::{Sender, unbounded};
use parking_lot::Mutex;
use tracing::info;

use mosaic_backend::{
    BindingContext, BindingError, Color, EditableText, FieldHandle, FormModel, HostContainer,
    HostDialogs, HostEditTarget, HostKey, HostServices, HostSurfaceFocus, KeyState, PresentTarget,
    Px, PxRect, RawKeyEvent, TextConstraint, UiDispatcher, error::PresentError,
};

/// The pretend OS UI thread: a worker draining posted tasks.
struct UiThread {
    sender: Sender<Option<mosaic_backend::Task>>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl UiThread {
    fn start() -> Arc<Self> {
        let (sender, receiver) = unbounded::<Option<mosaic_backend::Task>>();
        let join = thread::spawn(move || {
            while let Ok(Some(task)) = receiver.recv() {
                task();
            }
        });
        Arc::new(Self {
            sender,
            join: Mutex::new(Some(join)),
        })
    }

    fn stop(&self) {
        let _ = self.sender.send(None);
        if let Some(join) = self.join.lock().take() {
            let _ = join.join();
        }
    }
}

impl UiDispatcher for UiThread {
    fn post(&self, task: mosaic_backend::Task) {
        let _ = self.sender.send(Some(task));
    }
}

#[derive(Default)]
struct DemoField {
    text: String,
    cursor: usize,
}

impl EditableText for DemoField {
    fn text(&self) -> String {
        self.text.clone()
    }
    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        info!(text = %self.text, "field updated");
    }
    fn cursor(&self) -> usize {
        self.cursor
    }
    fn set_cursor(&mut self, position: usize) {
        self.cursor = position.min(self.text.chars().count());
    }
    fn is_single_line(&self) -> bool {
        true
    }
    fn constraints(&self) -> TextConstraint {
        TextConstraint::ANY
    }
    fn has_default_command(&self) -> bool {
        false
    }
    fn dispatch_default_command(&mut self) {}
}

struct DemoForm {
    shown: bool,
    field: Arc<Mutex<DemoField>>,
}

impl FormModel for DemoForm {
    fn has_current_form(&self) -> bool {
        self.shown
    }
    fn focused_editable(&self) -> Option<FieldHandle> {
        Some(self.field.clone())
    }
    fn dispatch_key_press(&mut self, key_code: i32) {
        info!(key_code, "key press");
        if key_code > 0
            && let Some(ch) = char::from_u32(key_code as u32)
        {
            let mut field = self.field.lock();
            let cursor = field.cursor;
            let mut text = field.text.clone();
            let byte = text
                .char_indices()
                .nth(cursor)
                .map_or(text.len(), |(i, _)| i);
            text.insert(byte, ch);
            field.text = text;
            field.cursor = cursor + 1;
        }
    }
    fn dispatch_key_release(&mut self, _key_code: i32) {}
    fn dispatch_pointer_press(&mut self, x: i32, y: i32) {
        info!(x, y, "pointer press");
    }
    fn dispatch_pointer_drag(&mut self, x: i32, y: i32) {
        info!(x, y, "pointer drag");
    }
    fn dispatch_pointer_release(&mut self, x: i32, y: i32) {
        info!(x, y, "pointer release");
    }
    fn size_changed(&mut self, width: i32, height: i32) {
        info!(width, height, "form resized");
    }
    fn focus_next_field(&mut self) {}
    fn show(&mut self) {
        self.shown = true;
        info!("form shown");
    }
    fn hide(&mut self) {
        self.shown = false;
        info!("form hidden");
    }
}

struct ConsoleTarget;

impl PresentTarget for ConsoleTarget {
    fn blit(&mut self, rows: &[u32], region: PxRect) -> Result<(), PresentError> {
        info!(
            pixels = rows.len(),
            x = region.x.raw(),
            y = region.y.raw(),
            width = region.width.raw(),
            height = region.height.raw(),
            "framebuffer blit"
        );
        Ok(())
    }
}

#[derive(Default)]
struct DemoContainer;

impl HostContainer for DemoContainer {
    fn attach(&mut self, widget_id: u64) {
        info!(widget_id, "peer attached");
    }
    fn detach(&mut self, widget_id: u64) {
        info!(widget_id, "peer detached");
    }
    fn in_touch_mode(&self) -> bool {
        true
    }
}

#[derive(Default)]
struct DemoEditTarget {
    cursor: usize,
}

impl HostEditTarget for DemoEditTarget {
    fn set_focusable(&mut self, focusable: bool) {
        info!(focusable, "edit proxy focusable");
    }
    fn configure(&mut self, constraints: TextConstraint, single_line: bool) {
        info!(flags = constraints.0, single_line, "edit proxy configured");
    }
    fn request_focus(&mut self) {
        info!("edit proxy focus requested");
    }
    fn set_text(&mut self, text: &str) {
        info!(%text, "edit proxy text");
    }
    fn set_cursor(&mut self, position: usize) {
        self.cursor = position;
    }
    fn cursor(&self) -> usize {
        self.cursor
    }
    fn show_keyboard(&mut self) {
        info!("keyboard shown");
    }
    fn hide_keyboard(&mut self) {
        info!("keyboard hidden");
    }
}

#[derive(Default)]
struct DemoSurfaceFocus;

impl HostSurfaceFocus for DemoSurfaceFocus {
    fn set_focusable(&mut self, focusable: bool) {
        info!(focusable, "surface focusable");
    }
    fn request_focus(&mut self) {
        info!("surface focus requested");
    }
}

#[derive(Default)]
struct DemoDialogs;

impl HostDialogs for DemoDialogs {
    fn show_error_blocking(&self, title: &str, message: &str) {
        eprintln!("[dialog] {title}: {message}");
    }
    fn edit_text_blocking(&self, initial: &str, _constraints: TextConstraint) -> Option<String> {
        Some(format!("{initial} (edited)"))
    }
}

#[derive(Default)]
struct DemoServices {
    clipboard: Option<String>,
}

impl HostServices for DemoServices {
    fn vibrate(&mut self, _duration_ms: u32) -> Result<(), BindingError> {
        Err(BindingError::ServiceUnavailable("vibrator"))
    }
    fn clipboard_get(&mut self) -> Option<String> {
        self.clipboard.clone()
    }
    fn clipboard_set(&mut self, text: &str) {
        self.clipboard = Some(text.to_string());
    }
}

fn key(ch: char) -> RawKeyEvent {
    RawKeyEvent {
        key: HostKey::Character(ch),
        state: KeyState::Pressed,
        repeat: false,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let field = Arc::new(Mutex::new(DemoField::default()));
    let form = Arc::new(Mutex::new(DemoForm {
        shown: false,
        field: field.clone(),
    }));
    let ui = UiThread::start();

    let context = match BindingContext::builder()
        .form(form)
        .ui_dispatcher(ui.clone())
        .container(Box::new(DemoContainer))
        .edit_target(Box::new(DemoEditTarget::default()))
        .surface_focus(Box::new(DemoSurfaceFocus))
        .dialogs(Arc::new(DemoDialogs))
        .services(Box::new(DemoServices::default()))
        .build()
    {
        Ok(context) => context,
        Err(err) => {
            eprintln!("failed to assemble binding: {err}");
            return;
        }
    };

    // Host window comes up.
    context.surface_available(Box::new(ConsoleTarget), Px(320), Px(240));

    // Paint something and flush a dirty region.
    {
        let surface = context.surface();
        let mut surface = surface.lock();
        surface.set_color(Color::WHITE);
        surface.fill_rect(PxRect::new(Px(0), Px(0), Px(320), Px(240)));
        surface.set_color(Color::from_argb(0xff, 0x20, 0x60, 0xc0));
        surface.fill_rect(PxRect::new(Px(10), Px(10), Px(120), Px(32)));
    }
    context.flush(Some(PxRect::new(Px(0), Px(0), Px(320), Px(240))));

    // Type through the input router, with a dead-key composition.
    context.key_event(key('h'));
    context.key_event(key('i'));
    context.key_event(RawKeyEvent {
        key: HostKey::Dead(Some('\u{b4}')),
        state: KeyState::Pressed,
        repeat: false,
    });
    context.key_event(key('e'));

    // Bring up the virtual keyboard and edit through the IME path.
    context.show_virtual_keyboard(true);
    context.proxy_focus_gained();
    context.proxy_text_changed("hié!".to_string(), 4);
    context.proxy_focus_lost();

    // Vibration degrades silently after the first probe.
    context.vibrate(20);
    context.vibrate(20);

    context.clipboard_set("from the demo".to_string());
    info!(clipboard = ?context.clipboard_get(), "clipboard round trip");

    // Let the toolkit thread drain, then report the field.
    let handle = context.toolkit_handle();
    if handle.invoke_and_wait(|| {}).is_ok() {
        info!(text = %field.lock().text, "final field text");
    }

    context.surface_destroyed();
    context.teardown();
    ui.stop();
}
