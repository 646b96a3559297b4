#![forbid(unsafe_code)]

//! One navigable search result.

/// Element handles for one result, as extracted by a result source.
///
/// `container` frames the result and is what the scroller keeps visible.
/// `highlighted` receives `highlight_class`; it is often the container and
/// sometimes the anchor itself. All three are back-references into a page
/// the runtime does not own and may go stale.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord<E> {
    pub container: E,
    pub anchor: E,
    pub highlighted: E,
    pub highlight_class: String,
}

impl<E: PartialEq> ResultRecord<E> {
    /// Whether the anchor is distinct from the highlighted element.
    #[must_use]
    pub fn anchor_is_separate(&self) -> bool {
        self.anchor != self.highlighted
    }
}
