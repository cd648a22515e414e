//! WASM browser tests for textbus-browser.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

#![cfg(target_arch = "wasm32")]

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

use textbus_browser::{
    BrowserEditor, BrowserSelection, DomMirror, Editor, EditorConfig, FormatMatcher,
    InlineCommander, SelectionSource, ToolbarHandler,
};

fn host() -> web_sys::HtmlElement {
    let document = web_sys::window().unwrap().document().unwrap();
    let div = document.create_element("div").unwrap();
    document.body().unwrap().append_child(&div).unwrap();
    div.dyn_into().unwrap()
}

fn mount(html: &str) -> (web_sys::HtmlElement, BrowserEditor) {
    let element = host();
    let editor = Editor::from_html(html, EditorConfig::default()).unwrap();
    let mut mounted = BrowserEditor::mount(element.clone(), editor).unwrap();
    mounted
        .editor_mut()
        .add_handler(ToolbarHandler::new(
            "bold",
            FormatMatcher::new("bold"),
            InlineCommander::bold(),
        ));
    (element, mounted)
}

/// Fire a cancelable `beforeinput` on `element`, as typing does.
fn type_text(element: &web_sys::HtmlElement, text: &str) -> bool {
    let init = web_sys::InputEventInit::new();
    init.set_input_type("insertText");
    init.set_data(Some(text));
    init.set_bubbles(true);
    init.set_cancelable(true);
    let event = web_sys::InputEvent::new_with_event_init_dict("beforeinput", &init).unwrap();
    element.dispatch_event(&event).unwrap()
}

/// Select `start..end` of the first text node under `element`.
fn select_text(element: &web_sys::HtmlElement, start: u32, end: u32) {
    let document = web_sys::window().unwrap().document().unwrap();
    let p = element.first_child().unwrap();
    let text = p.first_child().unwrap();
    let range = document.create_range().unwrap();
    range.set_start(&text, start).unwrap();
    range.set_end(&text, end).unwrap();
    let selection = web_sys::window().unwrap().get_selection().unwrap().unwrap();
    selection.remove_all_ranges().unwrap();
    selection.add_range(&range).unwrap();
}

#[wasm_bindgen_test]
fn test_mount_mirrors_render() {
    let (element, mounted) = mount("<p style=\"text-align: center\">hi <em>there</em></p>");
    assert_eq!(element.get_attribute("contenteditable").as_deref(), Some("true"));
    insta::assert_snapshot!(
        element.inner_html(),
        @r#"<p style="text-align: center">hi <em>there</em></p>"#
    );
    assert!(!mounted.mirror().is_empty());
}

#[wasm_bindgen_test]
fn test_mirror_maps_nodes_both_ways() {
    let editor = Editor::from_html("<p>abc</p>", EditorConfig::default()).unwrap();
    let mut mirror = DomMirror::new(host().into());
    mirror.sync(editor.output()).unwrap();

    let output = editor.output();
    for &child in output.dom.children(output.host) {
        let live = mirror.node(child).unwrap();
        assert_eq!(mirror.node_id(live), Some(child));
    }
}

#[wasm_bindgen_test]
fn test_selection_round_trip_utf16() {
    let (element, mounted) = mount("<p>a😀bc</p>");
    // UTF-16 offsets 3..4 cover "b"
    select_text(&element, 3, 4);

    let source = BrowserSelection::new(mounted.mirror());
    let ranges = source.native_ranges().unwrap();
    assert_eq!(ranges.len(), 1);
    assert_eq!(ranges[0].start.offset, 2);
    assert_eq!(ranges[0].end.offset, 3);

    source.apply_ranges(&ranges).unwrap();
    let selection = web_sys::window().unwrap().get_selection().unwrap().unwrap();
    let range = selection.get_range_at(0).unwrap();
    assert_eq!(range.start_offset().unwrap(), 3);
    assert_eq!(range.end_offset().unwrap(), 4);
}

#[wasm_bindgen_test]
fn test_exec_bold_updates_page() {
    let (element, mut mounted) = mount("<p>hello world</p>");
    select_text(&element, 0, 5);

    mounted.exec("bold").unwrap();
    insta::assert_snapshot!(element.inner_html(), @"<p><strong>hello</strong> world</p>");

    // Selection is restored into the new DOM
    assert_eq!(mounted.read_selection().unwrap(), 1);
    let range = mounted.editor().selection().first().unwrap().clone();
    assert_eq!((range.start.offset, range.end.offset), (0, 5));
}

#[wasm_bindgen_test]
fn test_typed_text_survives_bold() {
    let (element, mut mounted) = mount("<p>hello</p>");
    select_text(&element, 5, 5);
    mounted.read_selection().unwrap();

    // The browser's own edit is cancelled; the editor applies it
    assert!(!type_text(&element, " world"));
    mounted.pump(web_time::Instant::now()).unwrap();
    insta::assert_snapshot!(element.inner_html(), @"<p>hello world</p>");

    select_text(&element, 0, 11);
    mounted.exec("bold").unwrap();
    insta::assert_snapshot!(element.inner_html(), @"<p><strong>hello world</strong></p>");
}
