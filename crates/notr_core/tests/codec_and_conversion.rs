use notr_core::convert::block_plain_text;
use notr_core::{
    compute_decorations, deserialize, from_json_str, render_live, render_static, serialize,
    to_freeform, to_task, DocError, Document, Editor, EditorOptions, Platform, SchemaId,
};

const MIXED_BLOCKS: &str = r#"{"schema":"text","doc":{"type":"doc","content":[
    {"type":"heading","attrs":{"level":2},"content":[{"type":"text","text":"Plan"}]},
    {"type":"paragraph","content":[
        {"type":"text","text":"Buy "},
        {"type":"text","text":"oat","marks":[{"type":"strong"}]},
        {"type":"hard_break"},
        {"type":"text","text":"milk"}
    ]},
    {"type":"bullet_list","content":[
        {"type":"list_item","content":[{"type":"paragraph","content":[{"type":"text","text":"a"}]}]},
        {"type":"list_item","content":[{"type":"paragraph","content":[{"type":"text","text":"b"}]}]}
    ]},
    {"type":"horizontal_rule"},
    {"type":"code_block","content":[{"type":"text","text":"x = 1"}]}
]}}"#;

fn per_block_text(doc: &Document) -> Vec<String> {
    doc.blocks()
        .iter()
        .map(|block| block_plain_text(block).trim().to_string())
        .collect()
}

#[test]
fn round_trip_preserves_block_text_but_not_structure() {
    let doc = from_json_str(MIXED_BLOCKS).expect("mixed freeform doc");
    let task = to_task(&doc);
    assert_eq!(task.schema_id(), SchemaId::Task);
    assert_eq!(
        task.blocks().first().map(|list| list.child_count()),
        Some(5)
    );

    let back = to_freeform(&task);
    assert_eq!(per_block_text(&back), per_block_text(&doc));
    assert_eq!(
        per_block_text(&back),
        vec!["Plan", "Buy oat milk", "a b", "", "x = 1"]
    );
    assert!(back
        .blocks()
        .iter()
        .all(|block| block.kind() == notr_core::NodeKind::Paragraph));
    assert!(!render_static(&back).contains("<strong>"));
}

#[test]
fn blocks_without_text_become_single_space_items() {
    let doc = from_json_str(MIXED_BLOCKS).expect("mixed freeform doc");
    let task = to_task(&doc);
    let rule_item = task
        .blocks()
        .first()
        .and_then(|list| list.child(3))
        .expect("fourth item");
    assert_eq!(rule_item.text_content(), " ");
    assert!(!task.is_blank());
}

#[test]
fn serialization_round_trips_every_block_kind() {
    let doc = from_json_str(MIXED_BLOCKS).expect("mixed freeform doc");
    assert_eq!(deserialize(&serialize(&doc)).expect("round trip"), doc);

    let task = to_task(&doc);
    let json = serde_json::to_string(&serialize(&task)).expect("encode");
    assert_eq!(from_json_str(&json).expect("decode"), task);
}

#[test]
fn unknown_kinds_and_marks_are_schema_mismatches() {
    let err = from_json_str(
        r#"{"schema":"text","doc":{"type":"doc","content":[{"type":"table","content":[]}]}}"#,
    )
    .expect_err("table is not a node kind");
    assert!(matches!(err, DocError::SchemaMismatch { schema: SchemaId::Text, .. }));

    let err = from_json_str(
        r#"{"schema":"task","doc":{"type":"doc","content":[{"type":"task_list","content":[
            {"type":"task_item","content":[
                {"type":"checkbox","attrs":{"checked":false}},
                {"type":"paragraph","content":[{"type":"text","text":"x","marks":[{"type":"em"}]}]}
            ]}
        ]}]}}"#,
    )
    .expect_err("task schema has no marks");
    assert!(matches!(err, DocError::SchemaMismatch { schema: SchemaId::Task, .. }));

    assert!(matches!(
        from_json_str("not json"),
        Err(DocError::Malformed(_))
    ));
}

#[test]
fn static_markup_mirrors_live_markup_without_widgets() {
    let mut editor = Editor::new(
        "Take a note...",
        EditorOptions::content()
            .with_platform(Platform::Other)
            .with_initial_mode(SchemaId::Task),
    );
    editor.insert_text("Buy milk");
    let doc = editor.document().clone();

    assert_eq!(
        render_static(&doc),
        "<ul class=\"checklist\"><li><span class=\"taskbox unchecked\"></span><p>Buy milk</p></li></ul>"
    );
    let live = editor.render();
    assert_eq!(live, render_live(&doc, &compute_decorations(&doc, editor.version())));
    assert!(live.contains("<p>Buy milk</p>"));
    assert!(live.contains("data-pos=\"2\""));
    assert!(live.contains("checklist-drag-handle"));
}

#[test]
fn freeform_markup_maps_each_node_kind() {
    let doc = from_json_str(MIXED_BLOCKS).expect("mixed freeform doc");
    assert_eq!(
        render_static(&doc),
        "<h2>Plan</h2>\
         <p>Buy <strong>oat</strong><br>milk</p>\
         <ul><li><p>a</p></li><li><p>b</p></li></ul>\
         <hr>\
         <pre><code>x = 1</code></pre>"
    );
}

const NOTE_WITH_IMAGE: &str = r#"{"schema":"text","doc":{"type":"doc","content":[
    {"type":"paragraph","content":[
        {"type":"text","text":"Receipt "},
        {"type":"image","attrs":{"src":"r.png","alt":"receipt","title":null}}
    ]},
    {"type":"paragraph","content":[
        {"type":"image","attrs":{"src":"a.png","alt":null,"title":null}}
    ]}
]}}"#;

#[test]
fn images_load_render_and_round_trip() {
    let doc = from_json_str(NOTE_WITH_IMAGE).expect("note with images");
    assert_eq!(
        render_static(&doc),
        "<p>Receipt <img src=\"r.png\" alt=\"receipt\"></p><p><img src=\"a.png\"></p>"
    );
    let json = notr_core::to_json_string(&doc).expect("encode");
    assert_eq!(from_json_str(&json).expect("decode"), doc);
    let value: serde_json::Value = serde_json::from_str(&json).expect("json");
    assert_eq!(
        value["doc"]["content"][1]["content"][0],
        serde_json::json!({"type":"image","attrs":{"src":"a.png","alt":null,"title":null}})
    );
}

#[test]
fn images_carry_no_text_into_checklists() {
    let doc = from_json_str(NOTE_WITH_IMAGE).expect("note with images");
    let task = to_task(&doc);
    let texts: Vec<String> = task
        .blocks()
        .first()
        .and_then(|list| list.content())
        .expect("task list")
        .iter()
        .map(|item| item.text_content())
        .collect();
    assert_eq!(texts, vec!["Receipt ", " "]);
    assert!(!render_static(&to_freeform(&task)).contains("<img"));
}
