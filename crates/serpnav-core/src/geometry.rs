#![forbid(unsafe_code)]

//! Viewport-relative geometry.

/// A rectangle in CSS pixels, relative to the top-left of the viewport.
///
/// Mirrors what `Element.getBoundingClientRect()` reports: `y` is negative
/// once the element has been scrolled above the viewport.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Top edge.
    #[inline]
    #[must_use]
    pub const fn top(&self) -> f64 {
        self.y
    }

    /// Bottom edge (`y + height`).
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// True when the rectangle has no area (detached or hidden elements).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}
