#![cfg(target_arch = "wasm32")]

use serpnav_runtime::Page;
use serpnav_web::DomPage;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{Element, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

fn page() -> DomPage {
    DomPage::new(web_sys::window().unwrap()).unwrap()
}

fn mount(html: &str) -> Element {
    let document = web_sys::window().unwrap().document().unwrap();
    let root = document.create_element("div").unwrap();
    root.set_inner_html(html);
    document.body().unwrap().append_child(&root).unwrap();
    root
}

#[wasm_bindgen_test]
fn queries_and_links() {
    let page = page();
    let root = mount(
        r#"<div class="t-result"><a href="https://r/0">zero</a></div>
           <div class="t-result"><span>no link</span></div>"#,
    );
    let results = page.query_all("div.t-result");
    assert_eq!(results.len(), 2);
    let anchors = page.query_within(&results[0], "a");
    assert_eq!(anchors.len(), 1);
    assert_eq!(page.link_address(&anchors[0]).as_deref(), Some("https://r/0"));
    assert_eq!(page.link_address(&results[1]), None);
    root.remove();
}

#[wasm_bindgen_test]
fn invalid_selector_matches_nothing() {
    assert!(page().query_all("div[").is_empty());
}

#[wasm_bindgen_test]
fn editable_detection() {
    let page = page();
    let root = mount(
        r#"<input id="t-text" type="search"><input id="t-box" type="checkbox">
           <textarea id="t-area"></textarea><div id="t-div"></div>"#,
    );
    let by_id = |id: &str| page.query_first(&format!("#{id}")).unwrap();
    assert!(page.is_editable(&by_id("t-text")));
    assert!(!page.is_editable(&by_id("t-box")));
    assert!(page.is_editable(&by_id("t-area")));
    assert!(!page.is_editable(&by_id("t-div")));
    root.remove();
}

#[wasm_bindgen_test]
fn classes_and_focus() {
    let page = page();
    let root = mount(r#"<a id="t-link" href="https://r/1">one</a>"#);
    let link = page.query_first("#t-link").unwrap();

    page.add_class(&link, "serpnav-focused");
    assert!(page.has_class(&link, "serpnav-focused"));
    page.remove_class(&link, "serpnav-focused");
    assert!(!page.has_class(&link, "serpnav-focused"));

    page.focus_without_scroll(&link);
    assert_eq!(page.active_element(), Some(link.clone()));
    link.dyn_ref::<HtmlElement>().unwrap().blur().unwrap();
    root.remove();
}
