#![forbid(unsafe_code)]

//! DOM keyboard event decoding.
//!
//! [`DomKeyInput`] mirrors the `KeyboardEvent` fields serpnav reads. The
//! wasm host fills it from a live event; tests build it directly or from
//! JSON shaped like the DOM object.

use serde::{Deserialize, Serialize};
use serpnav_core::event::normalize_dom_key;
use serpnav_core::{KeyEvent, KeyEventKind, Modifiers};

/// Raw `KeyboardEvent` fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DomKeyInput {
    pub key: String,
    pub code: String,
    pub ctrl_key: bool,
    pub shift_key: bool,
    pub alt_key: bool,
    pub meta_key: bool,
    pub repeat: bool,
    pub is_composing: bool,
}

impl DomKeyInput {
    #[must_use]
    pub fn new(key: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            code: code.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_ctrl(mut self) -> Self {
        self.ctrl_key = true;
        self
    }

    #[must_use]
    pub fn with_shift(mut self) -> Self {
        self.shift_key = true;
        self
    }

    #[must_use]
    pub fn with_alt(mut self) -> Self {
        self.alt_key = true;
        self
    }

    #[must_use]
    pub fn with_meta(mut self) -> Self {
        self.meta_key = true;
        self
    }

    #[must_use]
    pub fn modifiers(&self) -> Modifiers {
        let mut mods = Modifiers::NONE;
        if self.shift_key {
            mods |= Modifiers::SHIFT;
        }
        if self.alt_key {
            mods |= Modifiers::ALT;
        }
        if self.ctrl_key {
            mods |= Modifiers::CTRL;
        }
        if self.meta_key {
            mods |= Modifiers::SUPER;
        }
        mods
    }

    /// Decode into a [`KeyEvent`].
    ///
    /// Returns `None` while an IME composition is active and for keys that
    /// have no [`KeyCode`](serpnav_core::KeyCode) (lone modifiers, media keys).
    #[must_use]
    pub fn to_key_event(&self) -> Option<KeyEvent> {
        if self.is_composing {
            return None;
        }
        let code = normalize_dom_key(&self.key, &self.code)?;
        let kind = if self.repeat {
            KeyEventKind::Repeat
        } else {
            KeyEventKind::Press
        };
        Some(
            KeyEvent::new(code)
                .with_modifiers(self.modifiers())
                .with_kind(kind),
        )
    }
}
