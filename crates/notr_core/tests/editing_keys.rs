use notr_core::{
    AttrValue, Editor, EditorOptions, InputOutcome, KeyEvent, Mark, NodeKind, Platform,
    PointerInput, PointerKind, SchemaId, Selection, SerializedDoc, WidgetKind,
};
use std::sync::{Arc, Mutex};

const TWO_PARAGRAPHS: &str = r#"{"schema":"text","doc":{"type":"doc","content":[
    {"type":"paragraph","content":[{"type":"text","text":"Buy milk"}]},
    {"type":"paragraph","content":[{"type":"text","text":"Call mom"}]}
]}}"#;

fn content_editor(platform: Platform) -> Editor {
    Editor::new("Take a note...", EditorOptions::content().with_platform(platform))
}

fn block_texts(editor: &Editor) -> Vec<String> {
    editor
        .document()
        .blocks()
        .iter()
        .map(|block| block.text_content())
        .collect()
}

#[test]
fn mod_enter_submits_without_editing() {
    let submitted: Arc<Mutex<Vec<SerializedDoc>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&submitted);
    let mut editor = Editor::new(
        "Title",
        EditorOptions::title()
            .with_platform(Platform::Other)
            .on_submit(move |doc| sink.lock().expect("submit sink").push(doc.clone())),
    );
    editor.insert_text("Groceries");
    let version = editor.version();

    assert_eq!(
        editor.handle_key(&KeyEvent::new("Enter").ctrl()),
        InputOutcome::Submit
    );
    assert_eq!(editor.version(), version);
    let submitted = submitted.lock().expect("submit sink");
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0], editor.get_doc());
    assert_eq!(editor.handle_key(&KeyEvent::new("Enter")), InputOutcome::Ignored);
}

#[test]
fn mod_enter_submits_in_checklist_mode_too() {
    let mut editor = Editor::new(
        "Take a note...",
        EditorOptions::content()
            .with_platform(Platform::Mac)
            .with_initial_mode(SchemaId::Task),
    );
    assert_eq!(
        editor.handle_key(&KeyEvent::new("Enter").meta()),
        InputOutcome::Submit
    );
}

#[test]
fn undo_and_redo_follow_platform_chords() {
    let mut editor = content_editor(Platform::Other);
    editor.insert_text("Buy");
    editor.insert_text(" milk");
    assert_eq!(editor.document().text_content(), "Buy milk");

    assert_eq!(editor.handle_key(&KeyEvent::new("z").ctrl()), InputOutcome::Handled);
    assert_eq!(editor.document().text_content(), "Buy");
    assert_eq!(editor.selection(), Selection::cursor(4));
    assert_eq!(editor.handle_key(&KeyEvent::new("z").ctrl()), InputOutcome::Handled);
    assert_eq!(editor.document().text_content(), "");
    assert_eq!(editor.handle_key(&KeyEvent::new("z").ctrl()), InputOutcome::Ignored);

    assert_eq!(editor.handle_key(&KeyEvent::new("y").ctrl()), InputOutcome::Handled);
    assert_eq!(editor.document().text_content(), "Buy");
    assert_eq!(
        editor.handle_key(&KeyEvent::new("Z").ctrl().shift()),
        InputOutcome::Handled
    );
    assert_eq!(editor.document().text_content(), "Buy milk");
    assert!(!editor.can_redo());
}

#[test]
fn new_edit_clears_redo() {
    let mut editor = content_editor(Platform::Mac);
    editor.insert_text("Buy");
    assert!(editor.undo());
    assert!(editor.can_redo());
    editor.insert_text("Call");
    assert!(!editor.can_redo());
    assert_eq!(editor.handle_key(&KeyEvent::new("y").meta()), InputOutcome::Ignored);
    assert_eq!(editor.document().text_content(), "Call");
}

#[test]
fn history_is_bounded() {
    let mut editor = Editor::new(
        "Title",
        EditorOptions::content()
            .with_platform(Platform::Other)
            .with_history_depth(2),
    );
    for text in ["a", "b", "c"] {
        editor.insert_text(text);
    }
    assert!(editor.undo());
    assert!(editor.undo());
    assert!(!editor.undo());
    assert_eq!(editor.document().text_content(), "a");
}

#[test]
fn mod_b_toggles_bold_on_the_selection() {
    let mut editor = content_editor(Platform::Other);
    editor.set_json(TWO_PARAGRAPHS).expect("load paragraphs");
    editor.set_selection(Selection::range(1, 4));

    assert_eq!(editor.handle_key(&KeyEvent::new("b").ctrl()), InputOutcome::Handled);
    let paragraph = editor.document().blocks().first().expect("first block");
    let bold = paragraph.child(0).expect("bold run");
    assert_eq!(bold.text_value(), Some("Buy"));
    assert_eq!(bold.marks(), &[Mark::Strong]);
    assert_eq!(paragraph.child(1).and_then(|node| node.text_value()), Some(" milk"));

    assert_eq!(editor.handle_key(&KeyEvent::new("b").ctrl()), InputOutcome::Handled);
    let paragraph = editor.document().blocks().first().expect("first block");
    assert_eq!(paragraph.child_count(), 1);
}

#[test]
fn enter_splits_paragraphs_in_text_mode() {
    let mut editor = content_editor(Platform::Other);
    editor.set_json(TWO_PARAGRAPHS).expect("load paragraphs");
    editor.set_selection(Selection::cursor(5));

    assert_eq!(editor.handle_key(&KeyEvent::new("Enter")), InputOutcome::Handled);
    assert_eq!(block_texts(&editor), vec!["Buy ", "milk", "Call mom"]);
    assert_eq!(editor.selection(), Selection::cursor(7));
}

#[test]
fn backspace_at_block_start_joins_with_previous() {
    let mut editor = content_editor(Platform::Other);
    editor.set_json(TWO_PARAGRAPHS).expect("load paragraphs");
    editor.set_selection(Selection::cursor(11));

    assert_eq!(editor.handle_key(&KeyEvent::new("Backspace")), InputOutcome::Handled);
    assert_eq!(block_texts(&editor), vec!["Buy milkCall mom"]);
    assert_eq!(editor.selection(), Selection::cursor(9));

    assert_eq!(editor.handle_key(&KeyEvent::new("Backspace")), InputOutcome::Handled);
    assert_eq!(block_texts(&editor), vec!["Buy milCall mom"]);
}

#[test]
fn enter_in_code_block_inserts_a_newline() {
    let mut editor = content_editor(Platform::Other);
    editor
        .set_json(
            r#"{"schema":"text","doc":{"type":"doc","content":[
                {"type":"code_block","content":[{"type":"text","text":"let x"}]}
            ]}}"#,
        )
        .expect("code block");
    editor.set_selection(Selection::cursor(6));

    assert_eq!(editor.handle_key(&KeyEvent::new("Enter")), InputOutcome::Handled);
    assert_eq!(editor.document().blocks().len(), 1);
    assert_eq!(editor.document().text_content(), "let x\n");
}

#[test]
fn enter_in_a_list_item_starts_a_new_item() {
    let mut editor = content_editor(Platform::Other);
    editor
        .set_json(
            r#"{"schema":"text","doc":{"type":"doc","content":[
                {"type":"bullet_list","content":[
                    {"type":"list_item","content":[
                        {"type":"paragraph","content":[{"type":"text","text":"ab"}]}
                    ]}
                ]}
            ]}}"#,
        )
        .expect("bullet list");
    editor.set_selection(Selection::cursor(4));

    assert_eq!(editor.handle_key(&KeyEvent::new("Enter")), InputOutcome::Handled);
    let list = editor.document().blocks().first().expect("list");
    assert_eq!(list.kind(), NodeKind::BulletList);
    let items: Vec<String> = list
        .content()
        .expect("items")
        .iter()
        .map(|item| item.text_content())
        .collect();
    assert_eq!(items, vec!["a", "b"]);
    assert_eq!(editor.selection(), Selection::cursor(8));
}

#[test]
fn enter_in_an_empty_list_item_lifts_it_out_of_the_list() {
    let mut editor = content_editor(Platform::Other);
    editor
        .set_json(
            r#"{"schema":"text","doc":{"type":"doc","content":[
                {"type":"bullet_list","content":[
                    {"type":"list_item","content":[{"type":"paragraph","content":[{"type":"text","text":"a"}]}]},
                    {"type":"list_item","content":[{"type":"paragraph"}]},
                    {"type":"list_item","content":[{"type":"paragraph","content":[{"type":"text","text":"b"}]}]}
                ]}
            ]}}"#,
        )
        .expect("bullet list with an empty item");
    editor.set_selection(Selection::cursor(8));

    assert_eq!(editor.handle_key(&KeyEvent::new("Enter")), InputOutcome::Handled);
    let kinds: Vec<NodeKind> = editor
        .document()
        .blocks()
        .iter()
        .map(|block| block.kind())
        .collect();
    assert_eq!(
        kinds,
        vec![NodeKind::BulletList, NodeKind::Paragraph, NodeKind::BulletList]
    );
    assert_eq!(block_texts(&editor), vec!["a", "", "b"]);
    assert_eq!(editor.selection(), Selection::cursor(8));
}

#[test]
fn ctrl_greater_than_wraps_in_blockquote() {
    let mut editor = content_editor(Platform::Mac);
    editor.set_json(TWO_PARAGRAPHS).expect("load paragraphs");
    editor.set_selection(Selection::cursor(3));

    assert_eq!(
        editor.handle_key(&KeyEvent::new(">").ctrl().shift()),
        InputOutcome::Handled
    );
    let kinds: Vec<NodeKind> = editor
        .document()
        .blocks()
        .iter()
        .map(|block| block.kind())
        .collect();
    assert_eq!(kinds, vec![NodeKind::Blockquote, NodeKind::Paragraph]);
    assert_eq!(editor.selection(), Selection::cursor(4));
}

#[test]
fn enter_in_checklist_mode_adds_an_unchecked_item() {
    let mut editor = content_editor(Platform::Other);
    editor.set_json(TWO_PARAGRAPHS).expect("load paragraphs");
    editor.toggle_mode().expect("to checklist");
    editor
        .handle_pointer(&PointerInput {
            pos: 2,
            widget: WidgetKind::CheckboxToggle,
            kind: PointerKind::Click,
            version: editor.version(),
        })
        .expect("check first item");
    editor.set_selection(Selection::cursor(12));

    assert_eq!(editor.handle_key(&KeyEvent::new("Enter")), InputOutcome::Handled);
    let list = editor.document().blocks().first().expect("task list");
    let items: Vec<(String, Option<AttrValue>)> = list
        .content()
        .expect("items")
        .iter()
        .map(|item| {
            (
                item.text_content(),
                item.child(0).and_then(|checkbox| checkbox.attr("checked")),
            )
        })
        .collect();
    assert_eq!(
        items,
        vec![
            ("Buy milk".to_string(), Some(AttrValue::Bool(true))),
            (String::new(), Some(AttrValue::Bool(false))),
            ("Call mom".to_string(), Some(AttrValue::Bool(false))),
        ]
    );
    assert_eq!(editor.selection(), Selection::cursor(17));
    let toggles: Vec<usize> = editor
        .decorations()
        .iter()
        .filter(|decoration| decoration.widget.kind() == WidgetKind::CheckboxToggle)
        .map(|decoration| decoration.pos)
        .collect();
    assert_eq!(toggles, vec![2, 15, 20]);
}

#[test]
fn key_overrides_rebind_default_chords() {
    let mut editor = Editor::new(
        "Title",
        EditorOptions::title()
            .with_platform(Platform::Other)
            .with_key_override("Mod-Enter", Some("Alt-s".to_string())),
    );
    assert_eq!(
        editor.handle_key(&KeyEvent::new("Enter").ctrl()),
        InputOutcome::Ignored
    );
    assert_eq!(editor.handle_key(&KeyEvent::new("s").alt()), InputOutcome::Submit);
}
