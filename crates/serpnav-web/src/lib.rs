#![forbid(unsafe_code)]

//! Browser host for serpnav.
//!
//! On `wasm32` this crate exports [`SerpNavWeb`], which detects the search
//! surface from `location.href`, wires a capture-phase `keydown` listener to
//! the [`Navigator`](serpnav_runtime::Navigator), and re-indexes results when
//! the watched subtree mutates.
//!
//! The DOM-free parts (keyboard event decoding) live in [`input`] and are
//! tested natively. On other targets [`SerpNavWeb`] is an inert stub so the
//! workspace builds everywhere.

pub mod input;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{DomPage, JsTabOpener, LocalStorageBackend, SerpNavWeb};

/// Native builds do not have a DOM; keep the type available so downstream
/// crates can reference it without cfg noise.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct SerpNavWeb {
    _private: (),
}

#[cfg(not(target_arch = "wasm32"))]
impl SerpNavWeb {
    #[must_use]
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Always false: there is no page to attach to.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        false
    }
}
