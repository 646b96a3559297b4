#![forbid(unsafe_code)]

//! Key-binding parsing and multi-key sequence matching.
//!
//! Bindings use the conventional notation found in browser extension
//! option pages: `+` joins modifiers to a key (`ctrl+shift+return`) and
//! whitespace separates the chords of a sequence (`z h`).
//!
//! # Key Concepts
//!
//! - **KeyChord**: one key plus its modifiers, normalized so that a chord
//!   parsed from a binding compares equal to the chord produced by the
//!   matching keyboard event.
//!
//! - **KeyBinding**: an ordered sequence of chords.
//!
//! - **SequenceMatcher**: state machine that buffers chords until they form
//!   a complete binding, a strict prefix of one, or nothing at all.
//!
//! # Normalization
//!
//! Alphabetic characters compare case-insensitively and keep SHIFT
//! significant (`shift+a` is not `a`). For every other printable character
//! SHIFT is dropped: it was needed to produce the character in the first
//! place (`?` on a US layout), so a binding of `?` must match it.
//!
//! # State Machine
//!
//! ```text
//!            chord completes a binding
//!   ┌──────┐ ─────────────────────────▶ Matched(intent), buffer cleared
//!   │ Idle │
//!   └──────┘ ─────────────────────────▶ Pending (buffer kept)
//!      ▲      chord is a strict prefix
//!      │
//!      └──── timeout elapsed / no binding starts with the buffer
//! ```
//!
//! When a buffered sequence dead-ends, the newest chord is retried on its
//! own so that `z` followed by `j` still moves the highlight.

use std::fmt;
use std::str::FromStr;

use web_time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::event::{KeyCode, KeyEvent, KeyEventKind, Modifiers};
use crate::intent::Intent;

/// Default window between the chords of a sequence.
pub const DEFAULT_SEQUENCE_TIMEOUT_MS: u64 = 1000;

/// Minimum allowed sequence window.
pub const MIN_SEQUENCE_TIMEOUT_MS: u64 = 100;

/// Maximum allowed sequence window.
pub const MAX_SEQUENCE_TIMEOUT_MS: u64 = 5000;

// ---------------------------------------------------------------------------
// Chords
// ---------------------------------------------------------------------------

/// One key plus modifiers, in normalized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyChord {
    /// Build a normalized chord.
    #[must_use]
    pub fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        match code {
            KeyCode::Char(c) if c.is_alphabetic() => Self {
                code: KeyCode::Char(lowercase(c)),
                modifiers,
            },
            KeyCode::Char(c) => Self {
                code: KeyCode::Char(c),
                modifiers: modifiers - Modifiers::SHIFT,
            },
            _ => Self { code, modifiers },
        }
    }

    /// The chord a keyboard event produces.
    #[must_use]
    pub fn from_event(event: &KeyEvent) -> Self {
        Self::new(event.code, event.modifiers)
    }

    /// Parse a single chord such as `ctrl+return` or `?`.
    pub fn parse(text: &str) -> Result<Self> {
        let lowered = text.trim().to_lowercase();
        if lowered.is_empty() {
            return Err(Error::key_binding(text, "empty chord"));
        }

        let (mods_part, key_part) = if lowered == "+" {
            ("", "+")
        } else if let Some(prefix) = lowered.strip_suffix("++") {
            (prefix, "+")
        } else {
            match lowered.rsplit_once('+') {
                Some((mods, key)) => (mods, key),
                None => ("", lowered.as_str()),
            }
        };

        let mut modifiers = Modifiers::NONE;
        if !mods_part.is_empty() {
            for name in mods_part.split('+') {
                modifiers |= parse_modifier(name)
                    .ok_or_else(|| Error::key_binding(text, format!("unknown modifier {name:?}")))?;
            }
        }

        let code = parse_key_name(key_part)
            .ok_or_else(|| Error::key_binding(text, format!("unknown key {key_part:?}")))?;
        Ok(Self::new(code, modifiers))
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, name) in [
            (Modifiers::CTRL, "ctrl"),
            (Modifiers::ALT, "alt"),
            (Modifiers::SHIFT, "shift"),
            (Modifiers::SUPER, "command"),
        ] {
            if self.modifiers.contains(flag) {
                write!(f, "{name}+")?;
            }
        }
        match self.code {
            KeyCode::Char(' ') => f.write_str("space"),
            KeyCode::Char('+') => f.write_str("plus"),
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::Enter => f.write_str("return"),
            KeyCode::Escape => f.write_str("escape"),
            KeyCode::Backspace => f.write_str("backspace"),
            KeyCode::Tab => f.write_str("tab"),
            KeyCode::Delete => f.write_str("del"),
            KeyCode::Insert => f.write_str("ins"),
            KeyCode::Home => f.write_str("home"),
            KeyCode::End => f.write_str("end"),
            KeyCode::PageUp => f.write_str("pageup"),
            KeyCode::PageDown => f.write_str("pagedown"),
            KeyCode::Up => f.write_str("up"),
            KeyCode::Down => f.write_str("down"),
            KeyCode::Left => f.write_str("left"),
            KeyCode::Right => f.write_str("right"),
            KeyCode::F(n) => write!(f, "f{n}"),
        }
    }
}

fn lowercase(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

fn parse_modifier(name: &str) -> Option<Modifiers> {
    Some(match name {
        "ctrl" | "control" => Modifiers::CTRL,
        "shift" => Modifiers::SHIFT,
        "alt" | "option" => Modifiers::ALT,
        "command" | "cmd" | "meta" | "super" => Modifiers::SUPER,
        _ => return None,
    })
}

fn parse_key_name(name: &str) -> Option<KeyCode> {
    let mut chars = name.chars();
    if let Some(first) = chars.next()
        && chars.next().is_none()
    {
        return Some(KeyCode::Char(first));
    }

    Some(match name {
        "return" | "enter" => KeyCode::Enter,
        "space" => KeyCode::Char(' '),
        "plus" => KeyCode::Char('+'),
        "escape" | "esc" => KeyCode::Escape,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "del" | "delete" => KeyCode::Delete,
        "ins" | "insert" => KeyCode::Insert,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        _ => {
            let n = name.strip_prefix('f')?.parse::<u8>().ok()?;
            if !(1..=24).contains(&n) {
                return None;
            }
            KeyCode::F(n)
        }
    })
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// A sequence of one or more chords.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    chords: Vec<KeyChord>,
}

impl KeyBinding {
    /// Parse a binding such as `ctrl+shift+return` or `z h`.
    pub fn parse(text: &str) -> Result<Self> {
        let chords = text
            .split_whitespace()
            .map(KeyChord::parse)
            .collect::<Result<Vec<_>>>()?;
        if chords.is_empty() {
            return Err(Error::key_binding(text, "empty binding"));
        }
        Ok(Self { chords })
    }

    /// A binding consisting of a single chord.
    #[must_use]
    pub fn single(chord: KeyChord) -> Self {
        Self {
            chords: vec![chord],
        }
    }

    #[must_use]
    pub fn chords(&self) -> &[KeyChord] {
        &self.chords
    }

    #[must_use]
    pub fn is_sequence(&self) -> bool {
        self.chords.len() > 1
    }
}

impl FromStr for KeyBinding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chord) in self.chords.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{chord}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sequence matching
// ---------------------------------------------------------------------------

/// Result of feeding one key event to a [`SequenceMatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// A binding completed.
    Matched(Intent),
    /// The buffered chords are a strict prefix of at least one binding.
    Pending,
    /// Nothing is bound to this input; the host should let it through.
    NoMatch,
}

/// Stateful matcher from key events to intents.
///
/// Call [`feed`](SequenceMatcher::feed) for every key event. Release events
/// never match; repeats do, so holding a navigation key keeps moving.
///
/// A binding that equals the buffer wins over longer bindings sharing the
/// same prefix: if both `z` and `z h` are bound, `z` fires immediately.
#[derive(Debug, Clone)]
pub struct SequenceMatcher {
    bindings: Vec<(KeyBinding, Intent)>,
    buffer: Vec<KeyChord>,
    last_input: Option<Instant>,
    timeout: Duration,
}

impl Default for SequenceMatcher {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_SEQUENCE_TIMEOUT_MS))
    }
}

impl SequenceMatcher {
    /// Create an empty matcher. The timeout is clamped to the allowed range.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        Self {
            bindings: Vec::new(),
            buffer: Vec::new(),
            last_input: None,
            timeout: Duration::from_millis(
                ms.clamp(MIN_SEQUENCE_TIMEOUT_MS, MAX_SEQUENCE_TIMEOUT_MS),
            ),
        }
    }

    /// Register a binding. The first registration of a binding wins.
    pub fn bind(&mut self, binding: KeyBinding, intent: Intent) {
        if let Some((_, existing)) = self.bindings.iter().find(|(b, _)| *b == binding) {
            tracing::debug!(
                message = "keybinding.duplicate",
                binding = %binding,
                kept = ?existing,
                dropped = ?intent
            );
            return;
        }
        self.bindings.push((binding, intent));
    }

    /// Builder-style [`bind`](Self::bind) over many bindings.
    #[must_use]
    pub fn with_bindings(mut self, bindings: impl IntoIterator<Item = (KeyBinding, Intent)>) -> Self {
        for (binding, intent) in bindings {
            self.bind(binding, intent);
        }
        self
    }

    /// Number of registered bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Effective sequence timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Process a key event.
    pub fn feed(&mut self, event: &KeyEvent, now: Instant) -> MatchOutcome {
        if event.kind == KeyEventKind::Release {
            return MatchOutcome::NoMatch;
        }

        if let Some(last) = self.last_input
            && now.saturating_duration_since(last) > self.timeout
        {
            self.buffer.clear();
        }
        self.last_input = Some(now);

        let chord = KeyChord::from_event(event);
        self.buffer.push(chord);
        if let Some(outcome) = self.resolve_buffer() {
            tracing::trace!(message = "keybinding.feed", chord = %chord, outcome = ?outcome);
            return outcome;
        }

        // The sequence dead-ended; give the newest chord a chance alone.
        if self.buffer.len() > 1 {
            self.buffer.clear();
            self.buffer.push(chord);
            if let Some(outcome) = self.resolve_buffer() {
                tracing::trace!(message = "keybinding.feed", chord = %chord, outcome = ?outcome);
                return outcome;
            }
        }

        self.buffer.clear();
        MatchOutcome::NoMatch
    }

    fn resolve_buffer(&mut self) -> Option<MatchOutcome> {
        if let Some((_, intent)) = self
            .bindings
            .iter()
            .find(|(binding, _)| binding.chords == self.buffer)
        {
            let intent = *intent;
            self.buffer.clear();
            return Some(MatchOutcome::Matched(intent));
        }

        let buffered = self.buffer.len();
        let is_prefix = self.bindings.iter().any(|(binding, _)| {
            binding.chords.len() > buffered && binding.chords[..buffered] == self.buffer[..]
        });
        is_prefix.then_some(MatchOutcome::Pending)
    }

    /// Whether a partial sequence is buffered.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Drop any buffered chords.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.last_input = None;
    }
}
