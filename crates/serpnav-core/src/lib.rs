#![forbid(unsafe_code)]

//! Host-independent vocabulary for serpnav.
//!
//! This crate holds everything the navigation runtime needs that does not
//! touch a page: key events and DOM key normalization, key-binding parsing
//! and multi-key sequence matching, the [`Intent`] set, the typed
//! [`Options`] record, and page geometry.
//!
//! # Role in serpnav
//! `serpnav-runtime` consumes these types to turn keyboard input into
//! focus-ledger operations; `serpnav-web` feeds it DOM keyboard events.

pub mod error;
pub mod event;
pub mod geometry;
pub mod intent;
pub mod keybinding;
pub mod options;

pub use error::{Error, Result};
pub use event::{KeyCode, KeyEvent, KeyEventKind, Modifiers};
pub use geometry::Rect;
pub use intent::{Intent, Tab, TimeRange};
pub use keybinding::{KeyBinding, KeyChord, MatchOutcome, SequenceMatcher};
pub use options::{OptionSource, Options};
