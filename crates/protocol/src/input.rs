//! Synthesized input events.

use serde::{Deserialize, Serialize};

/// Mouse button for click events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    /// Left mouse button (default)
    #[default]
    Left,
    /// Middle mouse button
    Middle,
    /// Right mouse button
    Right,
}

/// Pointer position in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MouseEvent {
    pub x: i32,
    pub y: i32,
    /// Engine event-flag bitmask.
    pub modifiers: u32,
}

impl MouseEvent {
    pub fn at(x: i32, y: i32) -> Self {
        Self { x, y, modifiers: 0 }
    }
}

/// One half of a mouse click: the button going down or coming back up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseClick {
    pub event: MouseEvent,
    pub button: MouseButton,
    /// `false` for the press, `true` for the release.
    pub mouse_up: bool,
    pub click_count: u32,
}

impl MouseClick {
    pub fn press(event: MouseEvent, button: MouseButton) -> Self {
        Self {
            event,
            button,
            mouse_up: false,
            click_count: 1,
        }
    }

    pub fn release(event: MouseEvent, button: MouseButton) -> Self {
        Self {
            event,
            button,
            mouse_up: true,
            click_count: 1,
        }
    }
}

/// Key event class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyEventKind {
    RawKeyDown,
    KeyDown,
    KeyUp,
    /// A character was produced. Carries the character rather than a key.
    Char,
}

/// Keyboard event as the engine expects it.
///
/// Platforms disagree on which field identifies a character, so a
/// [`KeyEventKind::Char`] event carries the same UTF-16 unit in all four code
/// fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEvent {
    pub kind: KeyEventKind,
    pub modifiers: u32,
    pub windows_key_code: i32,
    pub native_key_code: i32,
    pub character: u16,
    pub unmodified_character: u16,
}

impl KeyEvent {
    /// Character event for one UTF-16 code unit.
    pub fn char_unit(unit: u16) -> Self {
        Self {
            kind: KeyEventKind::Char,
            modifiers: 0,
            windows_key_code: i32::from(unit),
            native_key_code: i32::from(unit),
            character: unit,
            unmodified_character: unit,
        }
    }
}
