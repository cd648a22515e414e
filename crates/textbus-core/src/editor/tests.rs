use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use web_time::Instant;

use super::*;
use crate::commands::InlineCommander;
use crate::platform::PlatformError;
use crate::selection::{
    AbstractPosition, CursorRect, FontMetrics, NativePosition, SelectionPhase,
};
use crate::toolbar::{FormatMatcher, ToolbarHandler};
use crate::view::{Content, ViewId};

fn editor(html: &str) -> Editor {
    Editor::from_html(html, EditorConfig::default()).unwrap()
}

fn first_block(editor: &Editor) -> ViewId {
    let tree = editor.tree();
    tree.fragment(tree.root())
        .unwrap()
        .child_views()
        .next()
        .unwrap()
}

fn select(editor: &mut Editor, start: usize, end: usize) {
    let p = first_block(editor);
    editor.select(vec![TbRange::new(
        AbstractPosition::new(p, start),
        AbstractPosition::new(p, end),
    )]);
}

fn bold_handler() -> ToolbarHandler {
    ToolbarHandler::new("bold", FormatMatcher::new("bold"), InlineCommander::bold())
}

#[derive(Default)]
struct FakeHost {
    ranges: RefCell<Vec<NativeRange>>,
}

impl SelectionSource for FakeHost {
    fn native_ranges(&self) -> std::result::Result<Vec<NativeRange>, PlatformError> {
        Ok(self.ranges.borrow().clone())
    }

    fn apply_ranges(&self, ranges: &[NativeRange]) -> std::result::Result<(), PlatformError> {
        *self.ranges.borrow_mut() = ranges.to_vec();
        Ok(())
    }
}

struct FakeLayout;

impl CursorPlatform for FakeLayout {
    fn caret_rect(
        &self,
        _pos: &NativePosition,
    ) -> std::result::Result<Option<CursorRect>, PlatformError> {
        Ok(Some(CursorRect::new(4.0, 10.0, 1.0, 30.0)))
    }

    fn font_metrics(&self, _pos: &NativePosition) -> std::result::Result<FontMetrics, PlatformError> {
        Ok(FontMetrics {
            font_size: 16.0,
            line_height: "20px".into(),
            color: "#333".into(),
        })
    }
}

/// Mutates the tree, then fails.
struct Broken;

impl Commander for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn command(&self, ctx: &mut CommandContext<'_>, _overlap: bool) -> Result<()> {
        let root = ctx.tree.root();
        ctx.tree.insert_text(root, 0, "oops")?;
        Err(EditorError::NoSelection)
    }
}

#[test]
fn test_parse_render_round_trip() {
    let mut editor = editor("<p><strong>abc</strong> def</p>");
    insta::assert_snapshot!(editor.contents(), @"<p><strong>abc</strong> def</p>");

    select(&mut editor, 0, 3);
    let delta = editor.query(&FormatMatcher::new("bold")).unwrap();
    assert!(delta.overlap);
    assert!(!delta.is_mixed());
}

#[test]
fn test_handler_applies_mixed_then_removes() {
    let mut editor = editor("<p><strong>hello</strong> world</p>");
    editor.add_handler(bold_handler());

    select(&mut editor, 0, 8);
    editor.exec("bold").unwrap();
    insta::assert_snapshot!(editor.contents(), @"<p><strong>hello wo</strong>rld</p>");
    assert_eq!(editor.selection().phase(), SelectionPhase::Applied);
    let status = editor.handler("bold").unwrap().status().unwrap();
    assert!(status.overlap);

    editor.exec("bold").unwrap();
    insta::assert_snapshot!(editor.contents(), @"<p>hello world</p>");
    let status = editor.handler("bold").unwrap().status().unwrap();
    assert!(!status.contain);
}

#[test]
fn test_unknown_handler() {
    let mut editor = editor("<p>a</p>");
    assert!(matches!(
        editor.exec("bold"),
        Err(EditorError::UnknownHandler(name)) if name == "bold"
    ));
}

#[test]
fn test_undo_redo_restores_document_and_selection() {
    let mut editor = editor("<p>hello world</p>");
    assert!(!editor.can_undo());

    select(&mut editor, 0, 5);
    editor
        .exec_commander(&InlineCommander::bold(), false)
        .unwrap();
    assert!(editor.can_undo());

    assert!(editor.undo());
    insta::assert_snapshot!(editor.contents(), @"<p>hello world</p>");
    assert_eq!(editor.selection().first().unwrap().end.offset, 5);
    assert!(!editor.can_undo());

    assert!(editor.redo());
    insta::assert_snapshot!(editor.contents(), @"<p><strong>hello</strong> world</p>");
    assert!(!editor.redo());

    editor.clear_history();
    assert!(!editor.undo());
}

#[test]
fn test_failed_command_leaves_document_untouched() {
    let mut editor = editor("<p>abc</p>");
    select(&mut editor, 0, 1);
    assert!(editor.exec_commander(&Broken, false).is_err());
    insta::assert_snapshot!(editor.contents(), @"<p>abc</p>");
    assert_eq!(editor.tree().content_length(editor.tree().root()).unwrap(), 1);
    assert!(!editor.can_undo());
}

#[test]
fn test_selection_survives_rerender() {
    let mut editor = editor("<p>hello</p>");
    let host = FakeHost::default();
    select(&mut editor, 1, 3);
    editor
        .exec_commander(&InlineCommander::bold(), false)
        .unwrap();
    insta::assert_snapshot!(editor.contents(), @"<p>h<strong>el</strong>lo</p>");

    editor.restore_selection(&host).unwrap();
    assert_eq!(editor.selection().phase(), SelectionPhase::Idle);
    assert_eq!(host.ranges.borrow().len(), 1);

    assert_eq!(editor.read_selection(&host).unwrap(), 1);
    let p = first_block(&editor);
    let range = editor.selection().first().unwrap();
    assert_eq!(range.start, AbstractPosition::new(p, 1));
    assert_eq!(range.end, AbstractPosition::new(p, 3));
}

#[test]
fn test_empty_native_selection_is_noop() {
    let mut editor = editor("<p>abc</p>");
    select(&mut editor, 0, 1);
    editor.process_events(Instant::now());

    assert_eq!(editor.select_native(&[]), 0);
    assert!(editor.selection().is_empty());
    assert_eq!(editor.process_events(Instant::now()), 0);
    assert!(!editor.caret_visible());
}

#[test]
fn test_debounced_toolbar_update() {
    let mut editor = editor("<p><strong>abc</strong></p>");
    editor.add_handler(bold_handler());
    let start = Instant::now();

    select(&mut editor, 0, 2);
    select(&mut editor, 0, 3);
    assert_eq!(editor.process_events(start), 2);
    assert!(!editor.poll_toolbar(start));
    assert!(editor.handler("bold").unwrap().status().is_none());

    assert!(editor.poll_toolbar(start + Duration::from_millis(10)));
    assert!(editor.handler("bold").unwrap().status().unwrap().overlap);
    assert!(!editor.poll_toolbar(start + Duration::from_millis(20)));
}

#[test]
fn test_listeners_see_commands() {
    let mut editor = editor("<p>abc</p>");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    let id = editor.on(EventKind::Command, move |event| {
        if let EditorEvent::Command { name } = event {
            log.borrow_mut().push(name.to_string());
        }
    });

    select(&mut editor, 0, 2);
    editor
        .exec_commander(&InlineCommander::italic(), false)
        .unwrap();
    editor.process_events(Instant::now());
    assert_eq!(*seen.borrow(), vec!["italic".to_string()]);

    assert!(editor.off(id));
}

#[test]
fn test_caret_follows_focus_and_layout() {
    let mut editor = editor("<p>abc</p>");
    assert_eq!(editor.caret(&FakeLayout).unwrap(), None);

    let p = first_block(&editor);
    editor.select(vec![TbRange::collapsed(AbstractPosition::new(p, 1))]);
    let caret = editor.caret(&FakeLayout).unwrap().unwrap();
    assert_eq!(caret.left, 4.0);
    assert_eq!(caret.top, 15.0);
    assert_eq!(caret.height, 20.0);
    assert_eq!(caret.color, "#333");

    let now = Instant::now();
    editor.dispatch(EditorEvent::Focus);
    editor.process_events(now);
    assert!(editor.caret_visible());
    editor.dispatch(EditorEvent::VisibilityChange { visible: false });
    editor.process_events(now);
    assert!(!editor.caret_visible());

    select(&mut editor, 0, 2);
    assert_eq!(editor.caret(&FakeLayout).unwrap(), None);
}

#[test]
fn test_new_document_and_set_contents() {
    let mut editor = Editor::new(EditorConfig::default()).unwrap();
    assert_eq!(editor.contents(), "");

    editor.set_contents("<p>one</p><p>two</p>");
    insta::assert_snapshot!(editor.contents(), @"<p>one</p><p>two</p>");
    assert!(matches!(
        editor.tree().fragment(editor.tree().root()).unwrap().contents()[0],
        Content::View(_)
    ));
}

#[test]
fn test_typed_text_survives_bold() {
    let mut editor = editor("<p>hello</p>");
    editor.add_handler(bold_handler());
    let p = first_block(&editor);
    editor.select(vec![TbRange::collapsed(AbstractPosition::new(p, 5))]);
    let revision = editor.revision();

    editor.dispatch(EditorEvent::Input {
        data: Some(" world".into()),
    });
    editor.process_events(Instant::now());
    assert!(editor.revision() > revision);
    insta::assert_snapshot!(editor.contents(), @"<p>hello world</p>");
    assert_eq!(
        editor.selection().ranges(),
        &[TbRange::collapsed(AbstractPosition::new(p, 11))]
    );

    select(&mut editor, 0, 11);
    editor.exec("bold").unwrap();
    insta::assert_snapshot!(editor.contents(), @"<p><strong>hello world</strong></p>");
}

#[test]
fn test_composition_inserts_final_text_only() {
    let mut editor = editor("<p>ab</p>");
    let p = first_block(&editor);
    editor.select(vec![TbRange::collapsed(AbstractPosition::new(p, 1))]);

    editor.dispatch(EditorEvent::CompositionStart);
    editor.dispatch(EditorEvent::Input {
        data: Some("n".into()),
    });
    editor.process_events(Instant::now());
    assert!(editor.is_composing());
    insta::assert_snapshot!(editor.contents(), @"<p>ab</p>");

    editor.dispatch(EditorEvent::CompositionEnd {
        data: "日本".into(),
    });
    editor.process_events(Instant::now());
    assert!(!editor.is_composing());
    insta::assert_snapshot!(editor.contents(), @"<p>a日本b</p>");
}

#[test]
fn test_delete_then_undo() {
    let mut editor = editor("<p>abc</p>");
    let p = first_block(&editor);
    editor.select(vec![TbRange::collapsed(AbstractPosition::new(p, 3))]);

    editor.dispatch(EditorEvent::Delete { forward: false });
    editor.process_events(Instant::now());
    insta::assert_snapshot!(editor.contents(), @"<p>ab</p>");

    assert!(editor.undo());
    insta::assert_snapshot!(editor.contents(), @"<p>abc</p>");
}

#[test]
fn test_typing_without_selection_is_ignored() {
    let mut editor = editor("<p>abc</p>");
    editor.dispatch(EditorEvent::Input {
        data: Some("x".into()),
    });
    assert_eq!(editor.process_events(Instant::now()), 1);
    insta::assert_snapshot!(editor.contents(), @"<p>abc</p>");
    assert!(!editor.can_undo());
}

#[test]
fn test_zero_blink_period_keeps_caret_steady() {
    let config = EditorConfig::from_json(r#"{"caretBlinkMs": 0}"#).unwrap();
    let mut editor = Editor::from_html("<p>a</p>", config).unwrap();
    let now = Instant::now();

    editor.dispatch(EditorEvent::Focus);
    editor.process_events(now);
    assert!(editor.tick_caret(now));
    assert!(editor.tick_caret(now + Duration::from_secs(3)));
}
