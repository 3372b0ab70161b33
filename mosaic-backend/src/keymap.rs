//! # Key Event Normalization
//!
//! This module translates host key events into the toolkit's key code
//! space. Events reach the toolkit thread through the serialized task
//! queue; nothing here buffers.
//!
//! The toolkit addresses keys with a single `i32`: printable keys carry
//! their Unicode code point (always positive), while action keys use
//! reserved negative codes. Negative codes can never collide with text
//! input, so no per-device game-action mapping table is needed.

use winit::keyboard::{Key, NamedKey};

/// Navigation and action key codes.
///
/// All reserved codes are negative so they are disjoint from printable
/// code points.
pub mod key_code {
    pub const UP: i32 = -1;
    pub const DOWN: i32 = -2;
    pub const LEFT: i32 = -3;
    pub const RIGHT: i32 = -4;
    /// Select / center / enter.
    pub const FIRE: i32 = -5;
    /// Hardware or gesture back.
    pub const BACK: i32 = -6;
    pub const MENU: i32 = -7;
    /// Forward delete.
    pub const CLEAR: i32 = -8;
    pub const BACKSPACE: i32 = -9;
    /// Symbol picker key on hardware keyboards.
    pub const SYMBOL: i32 = -10;
}

/// Whether a key transitioned down or up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

impl KeyState {
    pub fn from_winit(state: winit::event::ElementState) -> Self {
        match state {
            winit::event::ElementState::Pressed => Self::Pressed,
            winit::event::ElementState::Released => Self::Released,
        }
    }
}

/// The logical identity of a host key, before toolkit translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKey {
    /// A printable character.
    Character(char),
    /// A dead key; the payload is the standalone accent character, when
    /// the platform reports one.
    Dead(Option<char>),
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Enter,
    Back,
    ContextMenu,
    Delete,
    Backspace,
    Symbol,
    /// Any key the binding does not route.
    Unidentified,
}

impl HostKey {
    pub fn from_winit(key: &Key) -> Self {
        match key {
            Key::Character(text) => match text.chars().next() {
                Some(ch) => Self::Character(ch),
                None => Self::Unidentified,
            },
            Key::Dead(accent) => Self::Dead(*accent),
            Key::Named(named) => match named {
                NamedKey::ArrowUp => Self::ArrowUp,
                NamedKey::ArrowDown => Self::ArrowDown,
                NamedKey::ArrowLeft => Self::ArrowLeft,
                NamedKey::ArrowRight => Self::ArrowRight,
                NamedKey::Enter => Self::Enter,
                NamedKey::GoBack | NamedKey::BrowserBack => Self::Back,
                NamedKey::ContextMenu => Self::ContextMenu,
                NamedKey::Delete => Self::Delete,
                NamedKey::Backspace => Self::Backspace,
                NamedKey::Symbol => Self::Symbol,
                NamedKey::Space => Self::Character(' '),
                _ => Self::Unidentified,
            },
            _ => Self::Unidentified,
        }
    }

    /// Translates this key into the toolkit's key code space.
    ///
    /// Returns `None` for keys the binding does not route (modifiers,
    /// media keys) and for dead keys, which are resolved by composition
    /// before translation.
    pub fn to_key_code(&self) -> Option<i32> {
        match self {
            Self::Character(ch) => Some(*ch as i32),
            Self::Dead(_) => None,
            Self::ArrowUp => Some(key_code::UP),
            Self::ArrowDown => Some(key_code::DOWN),
            Self::ArrowLeft => Some(key_code::LEFT),
            Self::ArrowRight => Some(key_code::RIGHT),
            Self::Enter => Some(key_code::FIRE),
            Self::Back => Some(key_code::BACK),
            Self::ContextMenu => Some(key_code::MENU),
            Self::Delete => Some(key_code::CLEAR),
            Self::Backspace => Some(key_code::BACKSPACE),
            Self::Symbol => Some(key_code::SYMBOL),
            Self::Unidentified => None,
        }
    }

    /// True for the directional codes suppressed while FIRE is held.
    pub fn is_directional(&self) -> bool {
        matches!(
            self,
            Self::ArrowUp | Self::ArrowDown | Self::ArrowLeft | Self::ArrowRight
        )
    }
}

/// A host key event reduced to the fields the binding routes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEvent {
    pub key: HostKey,
    pub state: KeyState,
    /// Set by the host for auto-repeat; repeats are swallowed so held
    /// keys deliver exactly one press/release pair.
    pub repeat: bool,
}

impl RawKeyEvent {
    pub fn from_winit(event: &winit::event::KeyEvent) -> Self {
        Self {
            key: HostKey::from_winit(&event.logical_key),
            state: KeyState::from_winit(event.state),
            repeat: event.repeat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_codes_are_positive() {
        for ch in ['a', 'Z', '0', ' ', 'é'] {
            let code = HostKey::Character(ch).to_key_code().unwrap();
            assert!(code > 0, "{ch:?} mapped to {code}");
            assert_eq!(code, ch as i32);
        }
    }

    #[test]
    fn test_action_codes_are_negative_and_distinct() {
        let keys = [
            HostKey::ArrowUp,
            HostKey::ArrowDown,
            HostKey::ArrowLeft,
            HostKey::ArrowRight,
            HostKey::Enter,
            HostKey::Back,
            HostKey::ContextMenu,
            HostKey::Delete,
            HostKey::Backspace,
            HostKey::Symbol,
        ];
        let mut codes: Vec<i32> = keys.iter().map(|k| k.to_key_code().unwrap()).collect();
        assert!(codes.iter().all(|&c| c < 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), keys.len());
    }

    #[test]
    fn test_dead_and_unidentified_do_not_translate() {
        assert_eq!(HostKey::Dead(Some('`')).to_key_code(), None);
        assert_eq!(HostKey::Unidentified.to_key_code(), None);
    }
}
