#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function, JSON, Promise};
use serpnav_core::{Options, Rect};
use serpnav_runtime::{
    ChangeKind, NavigationStore, Navigator, OpenTabRequest, Page, ScrollAlign, StorageBackend,
    StorageError, StorageResult, SurfaceRegistry, TabOpener,
};
use tracing::{debug, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, Element, FocusOptions, HtmlAnchorElement, HtmlElement, HtmlInputElement,
    HtmlTextAreaElement, KeyboardEvent, MutationObserver, MutationObserverInit, NodeList, Window,
};
use web_time::Instant;

use crate::input::DomKeyInput;

/// `<input type>` values that never accept text.
const NON_TEXT_INPUT_TYPES: &[&str] = &[
    "button", "checkbox", "color", "file", "hidden", "image", "radio", "range", "reset", "submit",
];

fn js_error(message: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&message.to_string())
}

// ---------------------------------------------------------------------------
// DomPage
// ---------------------------------------------------------------------------

/// [`Page`] over the live document.
#[derive(Debug, Clone)]
pub struct DomPage {
    window: Window,
    document: Document,
}

impl DomPage {
    pub fn new(window: Window) -> Result<Self, JsValue> {
        let document = window
            .document()
            .ok_or_else(|| js_error("window has no document"))?;
        Ok(Self { window, document })
    }

    fn collect(list: Result<NodeList, JsValue>, selector: &str) -> Vec<Element> {
        let list = match list {
            Ok(list) => list,
            Err(err) => {
                warn!(message = "dom.bad_selector", selector, error = ?err);
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }
}

impl Page for DomPage {
    type Element = Element;

    fn bounding_rect(&self, element: &Element) -> Rect {
        let r = element.get_bounding_client_rect();
        Rect::new(r.x(), r.y(), r.width(), r.height())
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn viewport_height(&self) -> f64 {
        self.window
            .inner_height()
            .ok()
            .and_then(|h| h.as_f64())
            .unwrap_or(0.0)
    }

    fn scroll_into_view(&self, element: &Element, align: ScrollAlign) {
        element.scroll_into_view_with_bool(align == ScrollAlign::Top);
    }

    fn scroll_by(&self, dy: f64) {
        self.window.scroll_by_with_x_and_y(0.0, dy);
    }

    fn scroll_to_top(&self) {
        self.window.scroll_to_with_x_and_y(0.0, 0.0);
    }

    fn add_class(&self, element: &Element, class: &str) {
        let _ = element.class_list().add_1(class);
    }

    fn remove_class(&self, element: &Element, class: &str) {
        let _ = element.class_list().remove_1(class);
    }

    fn has_class(&self, element: &Element, class: &str) -> bool {
        element.class_list().contains(class)
    }

    fn focus_without_scroll(&self, element: &Element) {
        let Some(html) = element.dyn_ref::<HtmlElement>() else {
            return;
        };
        let options = FocusOptions::new();
        options.set_prevent_scroll(true);
        if let Err(err) = html.focus_with_options(&options) {
            debug!(message = "dom.focus_failed", error = ?err);
        }
    }

    fn focus_for_typing(&self, element: &Element) {
        if let Some(html) = element.dyn_ref::<HtmlElement>() {
            let _ = html.focus();
        }
        // Caret to the end so typing appends to the current query.
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            let end = u32::try_from(input.value().encode_utf16().count()).unwrap_or(u32::MAX);
            let _ = input.set_selection_range(end, end);
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            let end = u32::try_from(area.value().encode_utf16().count()).unwrap_or(u32::MAX);
            let _ = area.set_selection_range(end, end);
        }
    }

    fn active_element(&self) -> Option<Element> {
        self.document
            .active_element()
            .filter(|el| !matches!(el.tag_name().as_str(), "BODY" | "HTML"))
    }

    fn is_editable(&self, element: &Element) -> bool {
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            let kind = input.type_().to_ascii_lowercase();
            return !NON_TEXT_INPUT_TYPES.contains(&kind.as_str());
        }
        if element.is_instance_of::<HtmlTextAreaElement>() || element.tag_name() == "SELECT" {
            return true;
        }
        element
            .dyn_ref::<HtmlElement>()
            .is_some_and(HtmlElement::is_content_editable)
    }

    fn link_address(&self, element: &Element) -> Option<String> {
        element
            .dyn_ref::<HtmlAnchorElement>()
            .map(HtmlAnchorElement::href)
            .filter(|href| !href.is_empty())
    }

    fn click(&self, element: &Element) {
        if let Some(html) = element.dyn_ref::<HtmlElement>() {
            html.click();
        }
    }

    fn current_url(&self) -> String {
        self.window.location().href().unwrap_or_default()
    }

    fn navigate_to(&self, url: &str) {
        if let Err(err) = self.window.location().set_href(url) {
            warn!(message = "dom.navigate_failed", url, error = ?err);
        }
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        Self::collect(self.document.query_selector_all(selector), selector)
    }

    fn query_within(&self, root: &Element, selector: &str) -> Vec<Element> {
        Self::collect(root.query_selector_all(selector), selector)
    }
}

// ---------------------------------------------------------------------------
// Storage and tabs
// ---------------------------------------------------------------------------

/// [`StorageBackend`] over `window.localStorage`.
///
/// Private browsing modes may deny access; every call then reports
/// [`StorageError::Unavailable`] and the navigator carries on without
/// restore.
#[derive(Debug, Clone)]
pub struct LocalStorageBackend {
    storage: Option<web_sys::Storage>,
}

impl LocalStorageBackend {
    #[must_use]
    pub fn new(window: &Window) -> Self {
        Self {
            storage: window.local_storage().ok().flatten(),
        }
    }

    fn storage(&self) -> StorageResult<&web_sys::Storage> {
        self.storage
            .as_ref()
            .ok_or_else(|| StorageError::Unavailable("localStorage is not accessible".to_owned()))
    }
}

fn unavailable(err: JsValue) -> StorageError {
    StorageError::Unavailable(format!("{err:?}"))
}

impl StorageBackend for LocalStorageBackend {
    fn name(&self) -> &str {
        "localStorage"
    }

    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        self.storage()?.get_item(key).map_err(unavailable)
    }

    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        self.storage()?.set_item(key, value).map_err(unavailable)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.storage()?.remove_item(key).map_err(unavailable)
    }
}

/// [`TabOpener`] that hands `{ address, activate }` to a JS callback.
///
/// Pages cannot open background tabs themselves; the extension's
/// background script owns the callback.
#[derive(Debug, Clone)]
pub struct JsTabOpener {
    callback: Function,
}

impl JsTabOpener {
    #[must_use]
    pub fn new(callback: Function) -> Self {
        Self { callback }
    }
}

impl TabOpener for JsTabOpener {
    fn open(&self, request: OpenTabRequest) {
        let payload = serde_json::to_string(&request)
            .map_err(js_error)
            .and_then(|text| JSON::parse(&text));
        let result = payload.and_then(|value| self.callback.call1(&JsValue::NULL, &value));
        if let Err(err) = result {
            warn!(message = "tabs.open_failed", address = %request.address, error = ?err);
        }
    }
}

// ---------------------------------------------------------------------------
// SerpNavWeb
// ---------------------------------------------------------------------------

type SharedNavigator = Rc<RefCell<Navigator<DomPage>>>;

struct Watcher {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut(Array, MutationObserver)>,
}

/// Entry point for the content script.
#[wasm_bindgen]
pub struct SerpNavWeb {
    registry: SurfaceRegistry,
    window: Option<Window>,
    navigator: Option<SharedNavigator>,
    keydown: Option<Closure<dyn FnMut(KeyboardEvent)>>,
    watcher: Option<Watcher>,
}

impl Default for SerpNavWeb {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl SerpNavWeb {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            registry: SurfaceRegistry::builtin(),
            window: None,
            navigator: None,
            keydown: None,
            watcher: None,
        }
    }

    /// Register extra surface profiles (JSON array). They take precedence
    /// over the built-in ones. Returns the number of profiles now known.
    #[wasm_bindgen(js_name = addSurfaces)]
    pub fn add_surfaces(&mut self, json: &str) -> Result<usize, JsValue> {
        let mut registry = SurfaceRegistry::from_json(json).map_err(js_error)?;
        registry.append(std::mem::take(&mut self.registry));
        self.registry = registry;
        Ok(self.registry.len())
    }

    /// Attach to the current page.
    ///
    /// `options` is the stored options object (or `undefined`);
    /// `open_tab` receives `{ address, activate }` for new-tab requests.
    /// Resolves to false when the page is not a known search surface.
    pub async fn start(&mut self, options: JsValue, open_tab: Function) -> Result<bool, JsValue> {
        if self.navigator.is_some() {
            return Ok(true);
        }
        let window = web_sys::window().ok_or_else(|| js_error("no window"))?;
        let options = parse_options(&options)?;

        let delay = options.startup_delay();
        if !delay.is_zero() {
            let ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
            sleep(&window, ms).await?;
        }

        let url = window.location().href()?;
        let Some(source) = self.registry.detect(&url) else {
            debug!(message = "web.inactive", url = %url);
            return Ok(false);
        };

        let page = DomPage::new(window.clone())?;
        let document = page.document.clone();
        let store = NavigationStore::new(LocalStorageBackend::new(&window));
        let mut navigator =
            Navigator::new(page, source, options, store, JsTabOpener::new(open_tab));
        navigator.init();
        let watch = navigator.change_watch();
        info!(
            message = "web.attached",
            source = navigator.source_name(),
            results = navigator.ledger().len()
        );
        let navigator = Rc::new(RefCell::new(navigator));

        let keydown = keydown_listener(Rc::clone(&navigator));
        // Capture phase: the page's own shortcuts must not see handled keys.
        window.add_event_listener_with_callback_and_bool(
            "keydown",
            keydown.as_ref().unchecked_ref(),
            true,
        )?;

        let watcher = match watch {
            Some(watch) => match document.query_selector(&watch.selector)? {
                Some(target) => Some(watch_results(&navigator, &target, watch.kind)?),
                None => {
                    debug!(message = "web.watch_target_missing", selector = %watch.selector);
                    None
                }
            },
            None => None,
        };

        self.window = Some(window);
        self.navigator = Some(navigator);
        self.keydown = Some(keydown);
        self.watcher = watcher;
        Ok(true)
    }

    #[wasm_bindgen(js_name = isAttached)]
    pub fn is_attached(&self) -> bool {
        self.navigator.is_some()
    }

    /// Index of the focused result, if any.
    #[wasm_bindgen(js_name = focusedIndex)]
    pub fn focused_index(&self) -> Option<u32> {
        let navigator = self.navigator.as_ref()?;
        let index = navigator.borrow().ledger().focused_index()?;
        u32::try_from(index).ok()
    }

    /// Detach listeners and the mutation observer.
    pub fn destroy(&mut self) {
        if let (Some(window), Some(keydown)) = (self.window.as_ref(), self.keydown.as_ref()) {
            let _ = window.remove_event_listener_with_callback_and_bool(
                "keydown",
                keydown.as_ref().unchecked_ref(),
                true,
            );
        }
        if let Some(watcher) = self.watcher.take() {
            watcher.observer.disconnect();
        }
        self.keydown = None;
        self.navigator = None;
        self.window = None;
    }
}

fn parse_options(value: &JsValue) -> Result<Options, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(Options::default());
    }
    let text: String = JSON::stringify(value)?.into();
    Options::from_json(&text).map_err(js_error)
}

async fn sleep(window: &Window, ms: i32) -> Result<(), JsValue> {
    let mut schedule = |resolve: Function, _reject: Function| {
        if let Err(err) =
            window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
        {
            warn!(message = "web.timer_failed", error = ?err);
            let _ = resolve.call0(&JsValue::NULL);
        }
    };
    JsFuture::from(Promise::new(&mut schedule)).await?;
    Ok(())
}

fn keydown_listener(navigator: SharedNavigator) -> Closure<dyn FnMut(KeyboardEvent)> {
    Closure::new(move |event: KeyboardEvent| {
        let input = DomKeyInput {
            key: event.key(),
            code: event.code(),
            ctrl_key: event.ctrl_key(),
            shift_key: event.shift_key(),
            alt_key: event.alt_key(),
            meta_key: event.meta_key(),
            repeat: event.repeat(),
            is_composing: event.is_composing(),
        };
        let Some(key) = input.to_key_event() else {
            return;
        };
        // Handlers triggered by our own click() may re-enter; drop those keys.
        let Ok(mut navigator) = navigator.try_borrow_mut() else {
            return;
        };
        if navigator.handle_key(&key, Instant::now()) {
            event.prevent_default();
            event.stop_propagation();
        }
    })
}

fn watch_results(
    navigator: &SharedNavigator,
    target: &Element,
    kind: ChangeKind,
) -> Result<Watcher, JsValue> {
    let shared = Rc::clone(navigator);
    let callback = Closure::<dyn FnMut(Array, MutationObserver)>::new(
        move |_records: Array, _observer: MutationObserver| {
            if let Ok(mut navigator) = shared.try_borrow_mut() {
                navigator.on_results_changed(kind);
            }
        },
    );
    let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
    let init = MutationObserverInit::new();
    init.set_child_list(true);
    init.set_subtree(kind == ChangeKind::Replaced);
    observer.observe_with_options(target, &init)?;
    Ok(Watcher {
        observer,
        _callback: callback,
    })
}
