//! # Input Normalization
//!
//! Translates raw host key and pointer notifications into the toolkit's
//! event vocabulary before they reach the form. The router is stateful:
//! it tracks a pending dead key, whether fire is held, and the pointer
//! drag origin. It runs entirely on the toolkit thread; the host callback
//! side only enqueues [`RawKeyEvent`]s.

use tracing::debug;

use crate::{
    form::FormModel,
    keymap::{HostKey, KeyState, RawKeyEvent},
};

/// Pointer moves closer than this to the last dispatched point are
/// dropped as device jitter. Any small value works; this one keeps slow
/// deliberate drags responsive.
const JITTER_THRESHOLD_PX: i32 = 3;

/// Side effects the router asks its owner to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterAction {
    /// Hide the virtual keyboard instead of delivering the event.
    DismissKeyboard,
}

/// Stateful key/pointer normalizer in front of the form.
#[derive(Default)]
pub struct InputRouter {
    /// Accent of a buffered dead key awaiting its base character.
    pending_dead: Option<Option<char>>,
    fire_held: bool,
    /// Last dispatched drag point, present while a pointer is down.
    drag_last: Option<(i32, i32)>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes one key event. `keyboard_visible` reflects whether the
    /// virtual keyboard is currently showing.
    pub fn on_key(
        &mut self,
        event: RawKeyEvent,
        form: &mut dyn FormModel,
        keyboard_visible: bool,
    ) -> Option<RouterAction> {
        // Dispatching before the first form exists can deadlock the
        // toolkit queue; drop early input outright.
        if !form.has_current_form() {
            return None;
        }
        if event.repeat {
            return None;
        }
        // Only the immediately following character composes; a routed
        // control key pressed in between cancels the buffered accent.
        // Unrouted keys (modifiers) stay transparent so Shift can sit
        // between a dead key and an uppercase base.
        if event.state == KeyState::Pressed
            && !matches!(
                event.key,
                HostKey::Dead(_) | HostKey::Character(_) | HostKey::Unidentified
            )
        {
            self.pending_dead = None;
        }
        match event.key {
            HostKey::Dead(accent) => {
                if event.state == KeyState::Pressed {
                    self.pending_dead = Some(accent);
                }
                None
            }
            HostKey::Character(base) => {
                if event.state != KeyState::Pressed {
                    return None;
                }
                let ch = match self.pending_dead.take() {
                    Some(accent) => compose_dead_key(accent, base),
                    None => base,
                };
                form.dispatch_key_press(ch as i32);
                form.dispatch_key_release(ch as i32);
                None
            }
            HostKey::Enter => {
                if event.state == KeyState::Released {
                    self.fire_held = false;
                    return None;
                }
                self.fire_held = true;
                // Enter on a single-line field with the keyboard up means
                // "done", not a literal newline.
                if keyboard_visible
                    && form
                        .focused_editable()
                        .is_some_and(|field| field.lock().is_single_line())
                {
                    return Some(RouterAction::DismissKeyboard);
                }
                self.dispatch_control(event.key, form);
                None
            }
            key if key.is_directional() => {
                // Trackball hardware reports spurious direction events
                // while the select button is held.
                if event.state == KeyState::Pressed && !self.fire_held {
                    self.dispatch_control(key, form);
                }
                None
            }
            HostKey::Back
            | HostKey::ContextMenu
            | HostKey::Delete
            | HostKey::Backspace
            | HostKey::Symbol => {
                if event.state == KeyState::Pressed {
                    self.dispatch_control(event.key, form);
                }
                None
            }
            HostKey::Unidentified => {
                debug!("dropping unrecognized key event");
                None
            }
            _ => None,
        }
    }

    fn dispatch_control(&self, key: HostKey, form: &mut dyn FormModel) {
        if let Some(code) = key.to_key_code() {
            form.dispatch_key_press(code);
            form.dispatch_key_release(code);
        }
    }

    pub fn on_pointer_down(&mut self, x: i32, y: i32, form: &mut dyn FormModel) {
        if !form.has_current_form() {
            return;
        }
        self.drag_last = Some((x, y));
        form.dispatch_pointer_press(x, y);
    }

    /// Drag moves within [`JITTER_THRESHOLD_PX`] of the last dispatched
    /// point are dropped; down/up always pass through.
    pub fn on_pointer_move(&mut self, x: i32, y: i32, form: &mut dyn FormModel) {
        if !form.has_current_form() {
            return;
        }
        let Some((last_x, last_y)) = self.drag_last else {
            return;
        };
        let (dx, dy) = (x - last_x, y - last_y);
        if dx * dx + dy * dy <= JITTER_THRESHOLD_PX * JITTER_THRESHOLD_PX {
            return;
        }
        self.drag_last = Some((x, y));
        form.dispatch_pointer_drag(x, y);
    }

    pub fn on_pointer_up(&mut self, x: i32, y: i32, form: &mut dyn FormModel) {
        if !form.has_current_form() {
            return;
        }
        self.drag_last = None;
        form.dispatch_pointer_release(x, y);
    }
}

/// Merges a dead-key accent with the following base character.
///
/// Unknown combinations fall back to the base character unchanged rather
/// than dropping the keystroke.
fn compose_dead_key(accent: Option<char>, base: char) -> char {
    let Some(accent) = accent else {
        return base;
    };
    let composed = match accent {
        '`' | '\u{300}' => match base {
            'a' => 'à',
            'e' => 'è',
            'i' => 'ì',
            'o' => 'ò',
            'u' => 'ù',
            'A' => 'À',
            'E' => 'È',
            'I' => 'Ì',
            'O' => 'Ò',
            'U' => 'Ù',
            _ => return base,
        },
        '\u{b4}' | '\u{301}' => match base {
            'a' => 'á',
            'e' => 'é',
            'i' => 'í',
            'o' => 'ó',
            'u' => 'ú',
            'y' => 'ý',
            'A' => 'Á',
            'E' => 'É',
            'I' => 'Í',
            'O' => 'Ó',
            'U' => 'Ú',
            'Y' => 'Ý',
            _ => return base,
        },
        '^' | '\u{302}' => match base {
            'a' => 'â',
            'e' => 'ê',
            'i' => 'î',
            'o' => 'ô',
            'u' => 'û',
            'A' => 'Â',
            'E' => 'Ê',
            'I' => 'Î',
            'O' => 'Ô',
            'U' => 'Û',
            _ => return base,
        },
        '~' | '\u{303}' => match base {
            'a' => 'ã',
            'n' => 'ñ',
            'o' => 'õ',
            'A' => 'Ã',
            'N' => 'Ñ',
            'O' => 'Õ',
            _ => return base,
        },
        '\u{a8}' | '\u{308}' => match base {
            'a' => 'ä',
            'e' => 'ë',
            'i' => 'ï',
            'o' => 'ö',
            'u' => 'ü',
            'y' => 'ÿ',
            'A' => 'Ä',
            'E' => 'Ë',
            'I' => 'Ï',
            'O' => 'Ö',
            'U' => 'Ü',
            _ => return base,
        },
        '\u{2da}' | '\u{30a}' => match base {
            'a' => 'å',
            'A' => 'Å',
            _ => return base,
        },
        '\u{b8}' | '\u{327}' => match base {
            'c' => 'ç',
            'C' => 'Ç',
            _ => return base,
        },
        _ => return base,
    };
    composed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{
        TextConstraint,
        fakes::{FakeField, FakeForm, FormCall},
    };
    use crate::keymap::key_code;

    fn press(key: HostKey) -> RawKeyEvent {
        RawKeyEvent {
            key,
            state: KeyState::Pressed,
            repeat: false,
        }
    }

    fn release(key: HostKey) -> RawKeyEvent {
        RawKeyEvent {
            key,
            state: KeyState::Released,
            repeat: false,
        }
    }

    fn shown_form() -> FakeForm {
        FakeForm {
            shown: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_repeat_events_are_swallowed() {
        let mut router = InputRouter::new();
        let mut form = shown_form();
        let mut event = press(HostKey::Character('a'));
        event.repeat = true;
        router.on_key(event, &mut form, false);
        assert!(form.calls.is_empty());
    }

    #[test]
    fn test_character_dispatches_press_release_pair() {
        let mut router = InputRouter::new();
        let mut form = shown_form();
        router.on_key(press(HostKey::Character('a')), &mut form, false);
        router.on_key(release(HostKey::Character('a')), &mut form, false);
        assert_eq!(
            form.calls,
            vec![
                FormCall::KeyPress('a' as i32),
                FormCall::KeyRelease('a' as i32)
            ]
        );
    }

    #[test]
    fn test_dead_key_alone_dispatches_nothing() {
        let mut router = InputRouter::new();
        let mut form = shown_form();
        router.on_key(press(HostKey::Dead(Some('`'))), &mut form, false);
        assert!(form.calls.is_empty());
    }

    #[test]
    fn test_dead_key_composition_dispatches_once() {
        let mut router = InputRouter::new();
        let mut form = shown_form();
        router.on_key(press(HostKey::Dead(Some('`'))), &mut form, false);
        router.on_key(press(HostKey::Character('e')), &mut form, false);
        assert_eq!(
            form.calls,
            vec![
                FormCall::KeyPress('è' as i32),
                FormCall::KeyRelease('è' as i32)
            ]
        );
    }

    #[test]
    fn test_control_key_cancels_pending_dead_key() {
        let mut router = InputRouter::new();
        let mut form = shown_form();
        router.on_key(press(HostKey::Dead(Some('`'))), &mut form, false);
        router.on_key(press(HostKey::ArrowDown), &mut form, false);
        router.on_key(press(HostKey::Character('e')), &mut form, false);
        assert_eq!(
            form.calls,
            vec![
                FormCall::KeyPress(key_code::DOWN),
                FormCall::KeyRelease(key_code::DOWN),
                FormCall::KeyPress('e' as i32),
                FormCall::KeyRelease('e' as i32),
            ]
        );
    }

    #[test]
    fn test_unknown_dead_combination_falls_back_to_base() {
        let mut router = InputRouter::new();
        let mut form = shown_form();
        router.on_key(press(HostKey::Dead(Some('~'))), &mut form, false);
        router.on_key(press(HostKey::Character('x')), &mut form, false);
        assert_eq!(
            form.calls,
            vec![
                FormCall::KeyPress('x' as i32),
                FormCall::KeyRelease('x' as i32)
            ]
        );
    }

    #[test]
    fn test_directionals_suppressed_while_fire_held() {
        let mut router = InputRouter::new();
        let mut form = shown_form();
        router.on_key(press(HostKey::Enter), &mut form, false);
        router.on_key(press(HostKey::ArrowDown), &mut form, false);
        router.on_key(release(HostKey::Enter), &mut form, false);
        router.on_key(press(HostKey::ArrowDown), &mut form, false);
        assert_eq!(
            form.calls,
            vec![
                FormCall::KeyPress(key_code::FIRE),
                FormCall::KeyRelease(key_code::FIRE),
                FormCall::KeyPress(key_code::DOWN),
                FormCall::KeyRelease(key_code::DOWN),
            ]
        );
    }

    #[test]
    fn test_enter_dismisses_keyboard_on_single_line_field() {
        let mut router = InputRouter::new();
        let mut form = shown_form();
        form.focus_field(FakeField {
            single_line: true,
            constraints: TextConstraint::ANY,
            ..Default::default()
        });
        let action = router.on_key(press(HostKey::Enter), &mut form, true);
        assert_eq!(action, Some(RouterAction::DismissKeyboard));
        assert!(form.calls.is_empty());
    }

    #[test]
    fn test_enter_is_fire_when_keyboard_hidden() {
        let mut router = InputRouter::new();
        let mut form = shown_form();
        form.focus_field(FakeField {
            single_line: true,
            ..Default::default()
        });
        let action = router.on_key(press(HostKey::Enter), &mut form, false);
        assert_eq!(action, None);
        assert_eq!(
            form.calls,
            vec![
                FormCall::KeyPress(key_code::FIRE),
                FormCall::KeyRelease(key_code::FIRE)
            ]
        );
    }

    #[test]
    fn test_events_before_first_form_are_dropped() {
        let mut router = InputRouter::new();
        let mut form = FakeForm::default();
        router.on_key(press(HostKey::Character('a')), &mut form, false);
        router.on_pointer_down(5, 5, &mut form);
        assert!(form.calls.is_empty());
    }

    #[test]
    fn test_pointer_jitter_is_filtered() {
        let mut router = InputRouter::new();
        let mut form = shown_form();
        router.on_pointer_down(10, 10, &mut form);
        router.on_pointer_move(11, 11, &mut form);
        router.on_pointer_move(12, 10, &mut form);
        router.on_pointer_move(20, 10, &mut form);
        router.on_pointer_up(20, 10, &mut form);
        assert_eq!(
            form.calls,
            vec![
                FormCall::PointerPress(10, 10),
                FormCall::PointerDrag(20, 10),
                FormCall::PointerRelease(20, 10),
            ]
        );
    }

    #[test]
    fn test_move_without_down_is_ignored() {
        let mut router = InputRouter::new();
        let mut form = shown_form();
        router.on_pointer_move(50, 50, &mut form);
        assert!(form.calls.is_empty());
    }
}
