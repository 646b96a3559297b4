#![forbid(unsafe_code)]

//! Deterministic page simulator for testing.
//!
//! `PageSimulator` implements [`Page`] over a small in-memory node tree with
//! a vertical layout (each node has a document `top` and a `height`), a
//! scroll offset clamped to the document, native focus, and a log of every
//! side effect the runtime performs.
//!
//! # Example
//!
//! ```ignore
//! use serpnav_runtime::simulator::fixture_page;
//!
//! let page = fixture_page(5);
//! let results = page.query_all("div.result");
//! assert_eq!(results.len(), 5);
//! ```
//!
//! # Selectors
//!
//! Supports type, universal, `#id`, `.class`, `[attr]`, `[attr="v"]`,
//! `[attr*="v"]`, the descendant combinator, and comma-separated lists.
//! Anything else (child combinators, pseudo-classes) matches nothing.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::iter::Peekable;
use std::rc::Rc;
use std::str::Chars;

use serpnav_core::{Rect, Tab, TimeRange};

use crate::page::{Page, ScrollAlign};
use crate::source::{ChangeKind, ChangeWatch};
use crate::surfaces::{HighlightTarget, SurfaceProfile, TimeParam};

/// Width reported for every attached node.
const SIM_WIDTH: f64 = 800.0;

/// Handle to a simulated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimElement(usize);

/// Side effect recorded by the simulator.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    ScrollIntoView {
        element: SimElement,
        align: ScrollAlign,
    },
    ScrollBy(f64),
    ScrollToTop,
    Focus(SimElement),
    FocusForTyping(SimElement),
    Click(SimElement),
    Navigate(String),
}

/// Description of a node to insert.
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    top: f64,
    height: f64,
}

impl NodeSpec {
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_owned());
        self
    }

    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_owned());
        self
    }

    #[must_use]
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_owned(), value.to_owned());
        self
    }

    /// Document position and height.
    #[must_use]
    pub fn at(mut self, top: f64, height: f64) -> Self {
        self.top = top;
        self.height = height;
        self
    }
}

#[derive(Debug, Clone)]
struct SimNode {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    parent: Option<usize>,
    top: f64,
    height: f64,
    attached: bool,
}

#[derive(Debug)]
struct SimState {
    nodes: Vec<SimNode>,
    scroll_y: f64,
    viewport_height: f64,
    url: String,
    active: Option<usize>,
    events: Vec<SimEvent>,
}

impl SimState {
    fn is_connected(&self, mut idx: usize) -> bool {
        loop {
            let node = &self.nodes[idx];
            if !node.attached {
                return false;
            }
            match node.parent {
                Some(parent) => idx = parent,
                None => return true,
            }
        }
    }

    fn is_descendant(&self, idx: usize, ancestor: usize) -> bool {
        let mut cur = self.nodes[idx].parent;
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.nodes[p].parent;
        }
        false
    }

    fn document_height(&self) -> f64 {
        (0..self.nodes.len())
            .filter(|&i| self.is_connected(i))
            .map(|i| self.nodes[i].top + self.nodes[i].height)
            .fold(self.viewport_height, f64::max)
    }

    fn set_scroll(&mut self, y: f64) {
        let max = (self.document_height() - self.viewport_height).max(0.0);
        self.scroll_y = y.clamp(0.0, max);
    }
}

/// In-memory [`Page`] implementation.
///
/// Cloning yields another handle to the same document.
#[derive(Debug, Clone)]
pub struct PageSimulator {
    state: Rc<RefCell<SimState>>,
}

impl PageSimulator {
    /// Empty document containing only `body`.
    #[must_use]
    pub fn new(viewport_height: f64) -> Self {
        let body = SimNode {
            tag: "body".to_owned(),
            id: None,
            classes: Vec::new(),
            attrs: BTreeMap::new(),
            parent: None,
            top: 0.0,
            height: 0.0,
            attached: true,
        };
        Self {
            state: Rc::new(RefCell::new(SimState {
                nodes: vec![body],
                scroll_y: 0.0,
                viewport_height,
                url: "about:blank".to_owned(),
                active: None,
                events: Vec::new(),
            })),
        }
    }

    #[must_use]
    pub fn with_url(self, url: &str) -> Self {
        self.set_url(url);
        self
    }

    #[must_use]
    pub fn body(&self) -> SimElement {
        SimElement(0)
    }

    /// Append a node as the last child of `parent`.
    pub fn insert(&self, parent: SimElement, spec: NodeSpec) -> SimElement {
        let mut state = self.state.borrow_mut();
        state.nodes.push(SimNode {
            tag: spec.tag,
            id: spec.id,
            classes: spec.classes,
            attrs: spec.attrs,
            parent: Some(parent.0),
            top: spec.top,
            height: spec.height,
            attached: true,
        });
        SimElement(state.nodes.len() - 1)
    }

    /// Remove a node (and its subtree) from the document.
    pub fn detach(&self, element: SimElement) {
        let mut state = self.state.borrow_mut();
        state.nodes[element.0].attached = false;
        if state.active.is_some_and(|a| a == element.0 || state.is_descendant(a, element.0)) {
            state.active = None;
        }
    }

    /// Append a result (`div.result` wrapping `a[href]`) under `#results`,
    /// creating the list container on first use.
    pub fn push_result(&self, top: f64, height: f64, href: &str) -> (SimElement, SimElement) {
        let list = match self.query_first("#results") {
            Some(list) => list,
            None => self.insert(self.body(), NodeSpec::new("div").id("results")),
        };
        let container = self.insert(list, NodeSpec::new("div").class("result").at(top, height));
        let anchor = self.insert(
            container,
            NodeSpec::new("a").attr("href", href).at(top, height.min(20.0)),
        );
        (container, anchor)
    }

    /// Set the scroll offset directly (clamped); not logged.
    pub fn scroll_to(&self, y: f64) {
        self.state.borrow_mut().set_scroll(y);
    }

    /// Set native focus directly; not logged.
    pub fn set_active(&self, element: Option<SimElement>) {
        self.state.borrow_mut().active = element.map(|e| e.0);
    }

    pub fn set_url(&self, url: &str) {
        self.state.borrow_mut().url = url.to_owned();
    }

    #[must_use]
    pub fn events(&self) -> Vec<SimEvent> {
        self.state.borrow().events.clone()
    }

    pub fn clear_events(&self) {
        self.state.borrow_mut().events.clear();
    }

    #[must_use]
    pub fn classes(&self, element: SimElement) -> Vec<String> {
        self.state.borrow().nodes[element.0].classes.clone()
    }

    /// Connected elements currently carrying `class`.
    #[must_use]
    pub fn elements_with_class(&self, class: &str) -> Vec<SimElement> {
        let state = self.state.borrow();
        (0..state.nodes.len())
            .filter(|&i| state.is_connected(i) && state.nodes[i].classes.iter().any(|c| c == class))
            .map(SimElement)
            .collect()
    }

    fn record(&self, event: SimEvent) {
        self.state.borrow_mut().events.push(event);
    }

    fn query_filtered(&self, selector: &str, within: Option<usize>) -> Vec<SimElement> {
        let Some(chains) = parse_selector_list(selector) else {
            return Vec::new();
        };
        let state = self.state.borrow();
        (0..state.nodes.len())
            .filter(|&i| state.is_connected(i))
            .filter(|&i| within.is_none_or(|root| state.is_descendant(i, root)))
            .filter(|&i| chains.iter().any(|chain| chain_matches(&state, i, chain)))
            .map(SimElement)
            .collect()
    }
}

impl Page for PageSimulator {
    type Element = SimElement;

    fn bounding_rect(&self, element: &SimElement) -> Rect {
        let state = self.state.borrow();
        if !state.is_connected(element.0) {
            return Rect::default();
        }
        let node = &state.nodes[element.0];
        Rect::new(0.0, node.top - state.scroll_y, SIM_WIDTH, node.height)
    }

    fn scroll_y(&self) -> f64 {
        self.state.borrow().scroll_y
    }

    fn viewport_height(&self) -> f64 {
        self.state.borrow().viewport_height
    }

    fn scroll_into_view(&self, element: &SimElement, align: ScrollAlign) {
        {
            let mut state = self.state.borrow_mut();
            if state.is_connected(element.0) {
                let node = &state.nodes[element.0];
                let target = match align {
                    ScrollAlign::Top => node.top,
                    ScrollAlign::Bottom => node.top + node.height - state.viewport_height,
                };
                state.set_scroll(target);
            }
        }
        self.record(SimEvent::ScrollIntoView {
            element: *element,
            align,
        });
    }

    fn scroll_by(&self, dy: f64) {
        {
            let mut state = self.state.borrow_mut();
            let target = state.scroll_y + dy;
            state.set_scroll(target);
        }
        self.record(SimEvent::ScrollBy(dy));
    }

    fn scroll_to_top(&self) {
        self.state.borrow_mut().set_scroll(0.0);
        self.record(SimEvent::ScrollToTop);
    }

    fn add_class(&self, element: &SimElement, class: &str) {
        let mut state = self.state.borrow_mut();
        let classes = &mut state.nodes[element.0].classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_owned());
        }
    }

    fn remove_class(&self, element: &SimElement, class: &str) {
        self.state.borrow_mut().nodes[element.0]
            .classes
            .retain(|c| c != class);
    }

    fn has_class(&self, element: &SimElement, class: &str) -> bool {
        self.state.borrow().nodes[element.0]
            .classes
            .iter()
            .any(|c| c == class)
    }

    fn focus_without_scroll(&self, element: &SimElement) {
        self.state.borrow_mut().active = Some(element.0);
        self.record(SimEvent::Focus(*element));
    }

    fn focus_for_typing(&self, element: &SimElement) {
        self.state.borrow_mut().active = Some(element.0);
        self.record(SimEvent::FocusForTyping(*element));
    }

    fn active_element(&self) -> Option<SimElement> {
        let state = self.state.borrow();
        state
            .active
            .filter(|&i| i != 0 && state.is_connected(i))
            .map(SimElement)
    }

    fn is_editable(&self, element: &SimElement) -> bool {
        let state = self.state.borrow();
        let node = &state.nodes[element.0];
        matches!(node.tag.as_str(), "input" | "textarea" | "select")
            || node
                .attrs
                .get("contenteditable")
                .is_some_and(|v| v.is_empty() || v == "true")
    }

    fn link_address(&self, element: &SimElement) -> Option<String> {
        let state = self.state.borrow();
        let node = &state.nodes[element.0];
        if node.tag != "a" {
            return None;
        }
        node.attrs.get("href").filter(|h| !h.is_empty()).cloned()
    }

    fn click(&self, element: &SimElement) {
        self.record(SimEvent::Click(*element));
    }

    fn current_url(&self) -> String {
        self.state.borrow().url.clone()
    }

    fn navigate_to(&self, url: &str) {
        self.set_url(url);
        self.record(SimEvent::Navigate(url.to_owned()));
    }

    fn query_all(&self, selector: &str) -> Vec<SimElement> {
        self.query_filtered(selector, None)
    }

    fn query_within(&self, root: &SimElement, selector: &str) -> Vec<SimElement> {
        self.query_filtered(selector, Some(root.0))
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Address of the fixture search page.
pub const FIXTURE_URL: &str = "https://x/search?q=a";

/// Surface profile matching [`fixture_page`].
#[must_use]
pub fn fixture_profile() -> SurfaceProfile {
    SurfaceProfile {
        name: "fixture".to_owned(),
        url_pattern: r"^https://x/search".to_owned(),
        result_selector: "div.result".to_owned(),
        anchor_selector: "a".to_owned(),
        highlight: HighlightTarget::Container,
        highlight_class: "serpnav-focused".to_owned(),
        search_box_selector: "input#q".to_owned(),
        header_selector: None,
        bottom_overlay: false,
        change_watch: Some(ChangeWatch {
            selector: "#results".to_owned(),
            kind: ChangeKind::AppendedOnly,
        }),
        tabs: BTreeMap::from([(Tab::Images, "a#tab-images".to_owned())]),
        time_param: Some(TimeParam {
            name: "tbs".to_owned(),
            values: BTreeMap::from([
                (TimeRange::Hour, "qdr:h".to_owned()),
                (TimeRange::Day, "qdr:d".to_owned()),
                (TimeRange::Verbatim, "li:1".to_owned()),
            ]),
            toggles: BTreeSet::from([TimeRange::Verbatim]),
            separator: ",".to_owned(),
        }),
    }
}

/// Search page at [`FIXTURE_URL`]: a 600px viewport, a search box, an
/// Images tab, and `results` results 150px apart starting at y=200.
#[must_use]
pub fn fixture_page(results: usize) -> PageSimulator {
    let page = PageSimulator::new(600.0).with_url(FIXTURE_URL);
    let body = page.body();
    page.insert(body, NodeSpec::new("input").id("q").attr("type", "search").at(20.0, 30.0));
    page.insert(
        body,
        NodeSpec::new("a")
            .id("tab-images")
            .attr("href", "https://x/search?q=a&tbm=isch")
            .at(60.0, 20.0),
    );
    page.insert(body, NodeSpec::new("div").id("results"));
    for i in 0..results {
        page.push_result(fixture_result_top(i), 120.0, &format!("https://r/{i}"));
    }
    page
}

/// Document top of the `index`-th result on a [`fixture_page`].
#[must_use]
pub fn fixture_result_top(index: usize) -> f64 {
    200.0 + 150.0 * index as f64
}

// ---------------------------------------------------------------------------
// Selector engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum AttrCond {
    Exists(String),
    Equals(String, String),
    Contains(String, String),
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCond>,
}

/// Descendant chain, outermost first.
type Chain = Vec<Compound>;

fn split_outside_brackets(s: &str, is_sep: impl Fn(char) -> bool) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for c in s.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, c) if depth == 0 && is_sep(c) => {
                parts.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    parts.push(current);
    parts
}

fn parse_selector_list(selector: &str) -> Option<Vec<Chain>> {
    split_outside_brackets(selector, |c| c == ',')
        .iter()
        .map(|part| {
            let chain = split_outside_brackets(part, char::is_whitespace)
                .into_iter()
                .filter(|s| !s.is_empty())
                .map(|s| parse_compound(&s))
                .collect::<Option<Chain>>()?;
            (!chain.is_empty()).then_some(chain)
        })
        .collect()
}

fn take_ident(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            ident.push(c);
            chars.next();
        } else {
            break;
        }
    }
    ident
}

fn parse_compound(text: &str) -> Option<Compound> {
    let mut compound = Compound::default();
    let mut chars = text.chars().peekable();

    match chars.peek().copied() {
        Some('*') => {
            chars.next();
        }
        Some(c) if c.is_alphabetic() => {
            compound.tag = Some(take_ident(&mut chars).to_ascii_lowercase());
        }
        _ => {}
    }

    while let Some(c) = chars.next() {
        match c {
            '#' => {
                let id = take_ident(&mut chars);
                if id.is_empty() {
                    return None;
                }
                compound.id = Some(id);
            }
            '.' => {
                let class = take_ident(&mut chars);
                if class.is_empty() {
                    return None;
                }
                compound.classes.push(class);
            }
            '[' => {
                let mut body = String::new();
                loop {
                    match chars.next()? {
                        ']' => break,
                        c => body.push(c),
                    }
                }
                compound.attrs.push(parse_attr(&body)?);
            }
            _ => return None,
        }
    }
    Some(compound)
}

fn parse_attr(body: &str) -> Option<AttrCond> {
    let unquote = |v: &str| {
        let v = v.trim();
        v.strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| v.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
            .unwrap_or(v)
            .to_owned()
    };
    if let Some((name, value)) = body.split_once("*=") {
        return Some(AttrCond::Contains(name.trim().to_owned(), unquote(value)));
    }
    if let Some((name, value)) = body.split_once('=') {
        let name = name.trim();
        if name.ends_with(['~', '|', '^', '$']) {
            return None;
        }
        return Some(AttrCond::Equals(name.to_owned(), unquote(value)));
    }
    let name = body.trim();
    (!name.is_empty()).then(|| AttrCond::Exists(name.to_owned()))
}

fn compound_matches(node: &SimNode, compound: &Compound) -> bool {
    if compound.tag.as_ref().is_some_and(|t| *t != node.tag) {
        return false;
    }
    if compound.id.is_some() && compound.id != node.id {
        return false;
    }
    if !compound
        .classes
        .iter()
        .all(|class| node.classes.iter().any(|c| c == class))
    {
        return false;
    }
    compound.attrs.iter().all(|cond| match cond {
        AttrCond::Exists(name) => node.attrs.contains_key(name),
        AttrCond::Equals(name, value) => node.attrs.get(name) == Some(value),
        AttrCond::Contains(name, value) => node.attrs.get(name).is_some_and(|v| v.contains(value.as_str())),
    })
}

fn chain_matches(state: &SimState, idx: usize, chain: &[Compound]) -> bool {
    let Some((last, ancestors)) = chain.split_last() else {
        return false;
    };
    if !compound_matches(&state.nodes[idx], last) {
        return false;
    }
    let mut cursor = state.nodes[idx].parent;
    for compound in ancestors.iter().rev() {
        loop {
            let Some(p) = cursor else {
                return false;
            };
            cursor = state.nodes[p].parent;
            if compound_matches(&state.nodes[p], compound) {
                break;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_match_like_css() {
        let page = fixture_page(3);
        assert_eq!(page.query_all("div.result").len(), 3);
        assert_eq!(page.query_all("#results .result a").len(), 3);
        assert_eq!(page.query_all("input#q, a#tab-images").len(), 2);
        assert_eq!(page.query_all(r#"a[href*="tbm=isch"]"#).len(), 1);
        assert_eq!(page.query_all(r#"input[type="search"]"#).len(), 1);
        assert_eq!(page.query_all("[href]").len(), 4);
        assert!(page.query_all("div > a").is_empty());
        assert!(page.query_all("a:hover").is_empty());
    }

    #[test]
    fn query_within_only_sees_descendants() {
        let page = fixture_page(2);
        let results = page.query_all("div.result");
        let anchors = page.query_within(&results[1], "a");
        assert_eq!(anchors.len(), 1);
        assert_eq!(page.link_address(&anchors[0]).as_deref(), Some("https://r/1"));
    }

    #[test]
    fn detached_nodes_disappear() {
        let page = fixture_page(2);
        let first = page.query_all("div.result")[0];
        page.detach(first);
        assert_eq!(page.query_all("div.result").len(), 1);
        assert_eq!(page.query_all("div.result a").len(), 1);
        assert_eq!(page.bounding_rect(&first), Rect::default());
    }

    #[test]
    fn scroll_is_clamped_to_document() {
        let page = fixture_page(5);
        // Last result ends at 800 + 120.
        page.scroll_to(10_000.0);
        assert_eq!(page.scroll_y(), 920.0 - 600.0);
        page.scroll_by(-5_000.0);
        assert_eq!(page.scroll_y(), 0.0);
    }

    #[test]
    fn focus_and_editability() {
        let page = fixture_page(1);
        let input = page.query_first("input#q").unwrap();
        assert!(page.is_editable(&input));
        assert_eq!(page.active_element(), None);
        page.focus_for_typing(&input);
        assert_eq!(page.active_element(), Some(input));
        assert_eq!(page.events(), vec![SimEvent::FocusForTyping(input)]);
    }
}
