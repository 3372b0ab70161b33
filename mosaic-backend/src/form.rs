//! Toolkit-side model traits.
//!
//! The binding never depends on the toolkit's widget classes directly; it
//! talks to the current form and the focused text field through these
//! traits. Tests substitute in-memory fakes.

use std::sync::Arc;

use parking_lot::Mutex;

/// Shared handle to an editable text field.
///
/// The form owns the strong reference; the edit bridge holds only a weak
/// one so a session never extends the field's life.
pub type FieldHandle = Arc<Mutex<dyn EditableText>>;

/// Shared handle to the toolkit form model.
pub type FormHandle = Arc<Mutex<dyn FormModel>>;

/// Input constraint flags carried by an editable text field.
///
/// Flags combine by bitwise OR, mirroring the toolkit's constraint
/// constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextConstraint(pub u32);

impl TextConstraint {
    pub const ANY: Self = Self(0);
    pub const NUMERIC: Self = Self(1);
    pub const DECIMAL: Self = Self(1 << 1);
    pub const PASSWORD: Self = Self(1 << 2);
    pub const PHONE: Self = Self(1 << 3);
    pub const EMAIL: Self = Self(1 << 4);
    pub const URL: Self = Self(1 << 5);
    /// Disables predictive/learning input.
    pub const NON_PREDICTIVE: Self = Self(1 << 6);

    pub fn contains(&self, flag: Self) -> bool {
        self.0 & flag.0 == flag.0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// The focused editable text field, as seen by the edit bridge.
pub trait EditableText: Send {
    fn text(&self) -> String;
    fn set_text(&mut self, text: &str);
    /// Caret position in chars from the start of the text.
    fn cursor(&self) -> usize;
    fn set_cursor(&mut self, position: usize);
    fn is_single_line(&self) -> bool;
    fn constraints(&self) -> TextConstraint;
    /// True when the field's form defines a default command for Enter.
    fn has_default_command(&self) -> bool;
    fn dispatch_default_command(&mut self);
}

/// The toolkit's current form, as seen by the input router and
/// synchronizer.
pub trait FormModel: Send {
    /// False until the application has shown its first form; input
    /// arriving before then is dropped.
    fn has_current_form(&self) -> bool;
    /// The focused text field, when one holds focus.
    fn focused_editable(&self) -> Option<FieldHandle>;
    fn dispatch_key_press(&mut self, key_code: i32);
    fn dispatch_key_release(&mut self, key_code: i32);
    fn dispatch_pointer_press(&mut self, x: i32, y: i32);
    fn dispatch_pointer_drag(&mut self, x: i32, y: i32);
    fn dispatch_pointer_release(&mut self, x: i32, y: i32);
    /// Notifies the form that the display area changed.
    fn size_changed(&mut self, width: i32, height: i32);
    /// Moves focus to the next focusable field, when one exists.
    fn focus_next_field(&mut self);
    /// Display became available; the form should prepare to paint.
    fn show(&mut self);
    /// Display went away.
    fn hide(&mut self);
}

#[cfg(test)]
pub(crate) mod fakes {
    //! Shared form/field fakes for binding tests.

    use super::*;

    /// Record of every call dispatched into the form.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum FormCall {
        KeyPress(i32),
        KeyRelease(i32),
        PointerPress(i32, i32),
        PointerDrag(i32, i32),
        PointerRelease(i32, i32),
        SizeChanged(i32, i32),
        FocusNext,
        Show,
        Hide,
    }

    #[derive(Default)]
    pub struct FakeField {
        pub text: String,
        pub cursor: usize,
        pub single_line: bool,
        pub constraints: TextConstraint,
        pub default_command: bool,
        pub default_command_fired: usize,
    }

    #[derive(Default)]
    pub struct FakeForm {
        pub shown: bool,
        pub field: Option<Arc<Mutex<FakeField>>>,
        pub calls: Vec<FormCall>,
    }

    impl FakeForm {
        pub fn focus_field(&mut self, field: FakeField) -> Arc<Mutex<FakeField>> {
            let field = Arc::new(Mutex::new(field));
            self.field = Some(field.clone());
            field
        }
    }

    impl EditableText for FakeField {
        fn text(&self) -> String {
            self.text.clone()
        }
        fn set_text(&mut self, text: &str) {
            self.text = text.to_string();
        }
        fn cursor(&self) -> usize {
            self.cursor
        }
        fn set_cursor(&mut self, position: usize) {
            self.cursor = position.min(self.text.chars().count());
        }
        fn is_single_line(&self) -> bool {
            self.single_line
        }
        fn constraints(&self) -> TextConstraint {
            self.constraints
        }
        fn has_default_command(&self) -> bool {
            self.default_command
        }
        fn dispatch_default_command(&mut self) {
            self.default_command_fired += 1;
        }
    }

    impl FormModel for FakeForm {
        fn has_current_form(&self) -> bool {
            self.shown
        }
        fn focused_editable(&self) -> Option<FieldHandle> {
            self.field
                .as_ref()
                .map(|f| f.clone() as FieldHandle)
        }
        fn dispatch_key_press(&mut self, key_code: i32) {
            self.calls.push(FormCall::KeyPress(key_code));
        }
        fn dispatch_key_release(&mut self, key_code: i32) {
            self.calls.push(FormCall::KeyRelease(key_code));
        }
        fn dispatch_pointer_press(&mut self, x: i32, y: i32) {
            self.calls.push(FormCall::PointerPress(x, y));
        }
        fn dispatch_pointer_drag(&mut self, x: i32, y: i32) {
            self.calls.push(FormCall::PointerDrag(x, y));
        }
        fn dispatch_pointer_release(&mut self, x: i32, y: i32) {
            self.calls.push(FormCall::PointerRelease(x, y));
        }
        fn size_changed(&mut self, width: i32, height: i32) {
            self.calls.push(FormCall::SizeChanged(width, height));
        }
        fn focus_next_field(&mut self) {
            self.calls.push(FormCall::FocusNext);
        }
        fn show(&mut self) {
            self.shown = true;
            self.calls.push(FormCall::Show);
        }
        fn hide(&mut self) {
            self.shown = false;
            self.calls.push(FormCall::Hide);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_flags_compose() {
        let c = TextConstraint::NUMERIC.union(TextConstraint::PASSWORD);
        assert!(c.contains(TextConstraint::NUMERIC));
        assert!(c.contains(TextConstraint::PASSWORD));
        assert!(!c.contains(TextConstraint::EMAIL));
        assert!(TextConstraint::default().0 == TextConstraint::ANY.0);
    }
}
