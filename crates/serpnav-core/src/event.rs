#![forbid(unsafe_code)]

//! Canonical keyboard event types.
//!
//! Hosts translate their native keyboard events into [`KeyEvent`] before
//! handing them to the navigator. The web host uses [`normalize_dom_key`]
//! to map `KeyboardEvent.key` / `KeyboardEvent.code` pairs.
//!
//! # Design Notes
//!
//! - `KeyEventKind` defaults to `Press` when the host cannot tell
//! - `Modifiers` use bitflags for easy combination
//! - Printable keys carry the character the host produced (already shifted)

use bitflags::bitflags;

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// The type of key event (press, repeat, or release).
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a new key event with default modifiers and Press kind.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Create a key event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check if this is a specific character key.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        matches!(self.code, KeyCode::Char(ch) if ch == c)
    }

    /// True when Ctrl, Alt, or Super is held.
    ///
    /// Such chords are dispatched even while the user types in a text field.
    #[must_use]
    pub fn has_command_modifier(&self) -> bool {
        self.modifiers
            .intersects(Modifiers::CTRL | Modifiers::ALT | Modifiers::SUPER)
    }
}

/// Key codes for keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable character key (including space).
    Char(char),
    /// Enter/Return key.
    Enter,
    /// Escape key.
    Escape,
    /// Backspace key.
    Backspace,
    /// Tab key.
    Tab,
    /// Delete key.
    Delete,
    /// Insert key.
    Insert,
    /// Home key.
    Home,
    /// End key.
    End,
    /// Page Up key.
    PageUp,
    /// Page Down key.
    PageDown,
    /// Up arrow key.
    Up,
    /// Down arrow key.
    Down,
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
    /// Function key (F1-F24).
    F(u8),
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,

    /// Key is being held (repeat event).
    Repeat,

    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys that can be held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// Map a DOM `KeyboardEvent` (`key`, `code`) pair onto a [`KeyCode`].
///
/// The logical `key` is preferred because it already reflects the keyboard
/// layout and shift state; `code` is consulted for non-printable keys whose
/// `key` is unknown (e.g. `"Unidentified"` on some virtual keyboards).
/// Returns `None` for keys serpnav never binds (media keys, lone modifiers).
#[must_use]
pub fn normalize_dom_key(dom_key: &str, dom_code: &str) -> Option<KeyCode> {
    let mut chars = dom_key.chars();
    if let Some(first) = chars.next()
        && chars.next().is_none()
    {
        return Some(KeyCode::Char(first));
    }

    let code = match dom_key {
        "Enter" => KeyCode::Enter,
        "Escape" | "Esc" => KeyCode::Escape,
        "Backspace" => KeyCode::Backspace,
        "Tab" => KeyCode::Tab,
        "Delete" | "Del" => KeyCode::Delete,
        "Insert" => KeyCode::Insert,
        "Home" => KeyCode::Home,
        "End" => KeyCode::End,
        "PageUp" => KeyCode::PageUp,
        "PageDown" => KeyCode::PageDown,
        "ArrowUp" | "Up" => KeyCode::Up,
        "ArrowDown" | "Down" => KeyCode::Down,
        "ArrowLeft" | "Left" => KeyCode::Left,
        "ArrowRight" | "Right" => KeyCode::Right,
        "Spacebar" => KeyCode::Char(' '),
        _ => {
            if let Some(n) = parse_function_key(dom_key) {
                return Some(KeyCode::F(n));
            }
            return key_code_from_dom_code(dom_code);
        }
    };
    Some(code)
}

fn parse_function_key(s: &str) -> Option<u8> {
    let rest = s.strip_prefix('F')?;
    rest.parse::<u8>().ok().filter(|n| (1..=24).contains(n))
}

fn key_code_from_dom_code(dom_code: &str) -> Option<KeyCode> {
    Some(match dom_code {
        "Enter" | "NumpadEnter" => KeyCode::Enter,
        "Escape" => KeyCode::Escape,
        "Backspace" => KeyCode::Backspace,
        "Tab" => KeyCode::Tab,
        "Delete" => KeyCode::Delete,
        "Insert" => KeyCode::Insert,
        "Home" => KeyCode::Home,
        "End" => KeyCode::End,
        "PageUp" => KeyCode::PageUp,
        "PageDown" => KeyCode::PageDown,
        "ArrowUp" => KeyCode::Up,
        "ArrowDown" => KeyCode::Down,
        "ArrowLeft" => KeyCode::Left,
        "ArrowRight" => KeyCode::Right,
        "Space" => KeyCode::Char(' '),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_keys_use_logical_key() {
        assert_eq!(normalize_dom_key("j", "KeyJ"), Some(KeyCode::Char('j')));
        assert_eq!(normalize_dom_key("J", "KeyJ"), Some(KeyCode::Char('J')));
        assert_eq!(normalize_dom_key("?", "Slash"), Some(KeyCode::Char('?')));
        assert_eq!(normalize_dom_key(" ", "Space"), Some(KeyCode::Char(' ')));
    }

    #[test]
    fn named_keys() {
        assert_eq!(normalize_dom_key("ArrowDown", ""), Some(KeyCode::Down));
        assert_eq!(normalize_dom_key("Enter", "NumpadEnter"), Some(KeyCode::Enter));
        assert_eq!(normalize_dom_key("Esc", ""), Some(KeyCode::Escape));
        assert_eq!(normalize_dom_key("F12", ""), Some(KeyCode::F(12)));
        assert_eq!(normalize_dom_key("F25", ""), None);
    }

    #[test]
    fn falls_back_to_dom_code() {
        assert_eq!(
            normalize_dom_key("Unidentified", "ArrowUp"),
            Some(KeyCode::Up)
        );
        assert_eq!(normalize_dom_key("Shift", "ShiftLeft"), None);
        assert_eq!(normalize_dom_key("MediaPlayPause", ""), None);
    }

    #[test]
    fn command_modifier_detection() {
        let plain = KeyEvent::new(KeyCode::Char('j'));
        assert!(!plain.has_command_modifier());
        assert!(
            !plain
                .with_modifiers(Modifiers::SHIFT)
                .has_command_modifier()
        );
        assert!(plain.with_modifiers(Modifiers::CTRL).has_command_modifier());
        assert!(plain.with_modifiers(Modifiers::SUPER).has_command_modifier());
    }
}
