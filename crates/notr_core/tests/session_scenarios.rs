use notr_core::model::node::Fragment;
use notr_core::{
    from_json_str, serialize, to_json_string, AttrValue, Document, Editor, EditorError,
    EditorOptions, InputOutcome, InvalidEdit, Node, NodeKind, Platform, PointerInput, PointerKind,
    SchemaId, Selection, Transaction, WidgetKind,
};

const TWO_PARAGRAPHS: &str = r#"{"schema":"text","doc":{"type":"doc","content":[
    {"type":"paragraph","content":[{"type":"text","text":"Buy milk"}]},
    {"type":"paragraph","content":[{"type":"text","text":"Call mom"}]}
]}}"#;

fn content_editor() -> Editor {
    Editor::new("Take a note...", EditorOptions::content().with_platform(Platform::Other))
}

fn task_items(doc: &Document) -> Vec<(String, bool)> {
    let list = doc.blocks().first().expect("task list");
    list.content()
        .expect("task items")
        .iter()
        .map(|item| {
            let checked = item.child(0).and_then(|checkbox| checkbox.attr("checked"));
            (item.text_content(), checked == Some(AttrValue::Bool(true)))
        })
        .collect()
}

fn checkbox_positions(editor: &Editor) -> Vec<usize> {
    editor
        .decorations()
        .iter()
        .filter(|decoration| decoration.widget.kind() == WidgetKind::CheckboxToggle)
        .map(|decoration| decoration.pos)
        .collect()
}

fn click(editor: &Editor, pos: usize, kind: PointerKind) -> PointerInput {
    PointerInput {
        pos,
        widget: WidgetKind::CheckboxToggle,
        kind,
        version: editor.version(),
    }
}

#[test]
fn freeform_to_task_to_freeform_keeps_block_text_in_order() {
    let mut editor = content_editor();
    editor.set_json(TWO_PARAGRAPHS).expect("load paragraphs");
    assert_eq!(editor.current_mode(), "text");

    editor.toggle_mode().expect("to checklist");
    assert_eq!(editor.current_mode(), "checklist");
    assert_eq!(
        task_items(editor.document()),
        vec![("Buy milk".to_string(), false), ("Call mom".to_string(), false)]
    );

    let positions = checkbox_positions(&editor);
    assert_eq!(positions, vec![2, 15]);
    let outcome = editor
        .handle_pointer(&click(&editor, positions[0], PointerKind::Click))
        .expect("toggle first item");
    assert_eq!(outcome, InputOutcome::Handled);
    assert_eq!(
        task_items(editor.document()),
        vec![("Buy milk".to_string(), true), ("Call mom".to_string(), false)]
    );

    let json = to_json_string(editor.document()).expect("serialize");
    let restored = from_json_str(&json).expect("deserialize");
    assert_eq!(&restored, editor.document());
    assert_eq!(task_items(&restored), task_items(editor.document()));

    editor.toggle_mode().expect("back to text");
    assert_eq!(editor.current_mode(), "text");
    let blocks: Vec<(NodeKind, String)> = editor
        .document()
        .blocks()
        .iter()
        .map(|block| (block.kind(), block.text_content()))
        .collect();
    assert_eq!(
        blocks,
        vec![
            (NodeKind::Paragraph, "Buy milk".to_string()),
            (NodeKind::Paragraph, "Call mom".to_string()),
        ]
    );
    let stored = to_json_string(editor.document()).expect("serialize");
    assert!(!stored.contains("checked"));
}

#[test]
fn toggling_a_checkbox_touches_only_that_node() {
    let mut editor = content_editor();
    editor.set_json(TWO_PARAGRAPHS).expect("load paragraphs");
    editor.toggle_mode().expect("to checklist");
    let before = editor.document().clone();

    editor
        .handle_pointer(&click(&editor, 15, PointerKind::DoubleClick))
        .expect("toggle second item");

    let after = editor.document();
    assert_eq!(before.blocks().size(), after.blocks().size());
    assert_eq!(before.text_content(), after.text_content());
    assert_eq!(
        after.node_at(2).and_then(|node| node.attr("checked")),
        Some(AttrValue::Bool(false))
    );
    assert_eq!(
        after.node_at(15).and_then(|node| node.attr("checked")),
        Some(AttrValue::Bool(true))
    );
}

#[test]
fn every_click_kind_flips_once_and_repeats_toggle_back() {
    let mut editor = content_editor();
    editor.toggle_mode().expect("to checklist");
    for (kind, expected) in [
        (PointerKind::Click, true),
        (PointerKind::DoubleClick, false),
        (PointerKind::TripleClick, true),
    ] {
        editor
            .handle_pointer(&click(&editor, 2, kind))
            .expect("toggle");
        assert_eq!(
            editor.document().node_at(2).and_then(|node| node.attr("checked")),
            Some(AttrValue::Bool(expected))
        );
    }
}

#[test]
fn stale_decoration_versions_are_rejected() {
    let mut editor = content_editor();
    editor.toggle_mode().expect("to checklist");
    let stale = click(&editor, 2, PointerKind::Click);
    editor
        .handle_pointer(&stale)
        .expect("first toggle uses the live version");
    let err = editor
        .handle_pointer(&stale)
        .expect_err("same input after an edit is stale");
    assert!(matches!(err, EditorError::StaleDecorations { .. }));
    assert_eq!(
        editor.document().node_at(2).and_then(|node| node.attr("checked")),
        Some(AttrValue::Bool(true))
    );
}

#[test]
fn drag_handle_press_selects_the_whole_item() {
    let mut editor = content_editor();
    editor.set_json(TWO_PARAGRAPHS).expect("load paragraphs");
    editor.toggle_mode().expect("to checklist");
    let input = PointerInput {
        pos: 14,
        widget: WidgetKind::DragHandle,
        kind: PointerKind::TouchStart,
        version: editor.version(),
    };
    let version = editor.version();
    assert_eq!(
        editor.handle_pointer(&input).expect("press handle"),
        InputOutcome::Handled
    );
    assert_eq!(editor.selection(), Selection::Node { from: 14, to: 27 });
    assert_eq!(editor.version(), version);
}

#[test]
fn reset_empties_the_document_and_history() {
    for mode in [SchemaId::Text, SchemaId::Task] {
        let mut editor = Editor::new(
            "Title",
            EditorOptions::content()
                .with_platform(Platform::Other)
                .with_initial_mode(mode),
        );
        assert_eq!(editor.insert_text("Buy milk"), InputOutcome::Handled);
        assert!(!editor.is_empty());
        assert!(editor.can_undo());

        editor.reset();
        assert!(editor.is_empty());
        assert_eq!(editor.get_doc(), serialize(&Document::empty(mode)));
        assert!(!editor.undo());
        assert!(!editor.redo());
        assert_eq!(editor.get_doc(), serialize(&Document::empty(mode)));
    }
}

#[test]
fn whitespace_only_documents_count_as_empty() {
    let mut editor = content_editor();
    editor
        .set_json(
            r#"{"schema":"text","doc":{"type":"doc","content":[
                {"type":"paragraph","content":[{"type":"text","text":"   "}]},
                {"type":"paragraph"}
            ]}}"#,
        )
        .expect("blank paragraphs");
    assert!(editor.is_empty());
    assert_eq!(editor.placeholder(), None);

    editor.reset();
    assert_eq!(editor.placeholder(), Some("Take a note..."));
}

#[test]
fn rejected_edits_leave_the_document_untouched() {
    let mut editor = content_editor();
    editor.set_json(TWO_PARAGRAPHS).expect("load paragraphs");
    let before = editor.get_doc();
    let version = editor.version();

    let tr = Transaction::new()
        .replace_range(1, 1, Fragment::from_nodes(vec![Node::text("Go ")]))
        .replace_range(0, 0, Fragment::from_nodes(vec![Node::checkbox(false)]));
    let err = editor.apply(&tr).expect_err("checkbox is not a freeform block");
    assert!(matches!(err, EditorError::Edit(InvalidEdit { step: 1, .. })));
    assert_eq!(editor.get_doc(), before);
    assert_eq!(editor.version(), version);
    assert!(!editor.can_undo());
}

#[test]
fn set_rejects_trees_foreign_to_their_tag() {
    let mut editor = content_editor();
    editor.set_json(TWO_PARAGRAPHS).expect("load paragraphs");
    let before = editor.get_doc();

    let err = editor
        .set_json(r#"{"schema":"task","doc":{"type":"doc","content":[{"type":"paragraph"}]}}"#)
        .expect_err("paragraph is not a task list");
    assert!(matches!(
        err,
        EditorError::Doc(notr_core::DocError::SchemaMismatch { .. })
    ));
    assert_eq!(editor.get_doc(), before);
}

#[test]
fn title_sessions_stay_freeform() {
    let mut title = Editor::new("Title", EditorOptions::title().with_platform(Platform::Other));
    let err = title.toggle_mode().expect_err("no mode toggle");
    assert!(matches!(err, EditorError::CapabilityDisabled(_)));

    title
        .set(&serialize(&{
            let mut source = content_editor();
            source.set_json(TWO_PARAGRAPHS).expect("load paragraphs");
            source.toggle_mode().expect("to checklist");
            source.document().clone()
        }))
        .expect("task docs are flattened for titles");
    assert_eq!(title.current_mode(), "text");
    assert_eq!(title.document().text_content(), "Buy milkCall mom");
    assert!(title.decorations().is_empty());
}

#[test]
fn focus_hook_fires_and_blur_clears_focus() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let focused = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&focused);
    let mut editor = Editor::new(
        "Title",
        EditorOptions::title()
            .with_platform(Platform::Other)
            .on_focus(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
    );
    editor.focus();
    assert!(editor.is_focused());
    assert_eq!(focused.load(Ordering::SeqCst), 1);
    editor.blur();
    assert!(!editor.is_focused());
}
