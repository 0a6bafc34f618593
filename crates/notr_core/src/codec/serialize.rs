//! JSON persistence of documents.
//!
//! # Responsibility
//! - Convert documents to and from the `{schema, doc}` envelope.
//! - Reject documents whose content the tagged schema does not admit.
//! - Upgrade the legacy checklist shapes on read.
//! - Reject fields and attributes a node kind does not define.
//!
//! # Invariants
//! - `deserialize(&serialize(doc)) == doc` for every valid document.
//! - Deserialization never coerces content into the tagged schema.

use crate::model::document::Document;
use crate::model::node::Node;
use crate::model::schema::{SchemaId, SchemaViolation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Persisted form of one note body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedDoc {
    pub schema: SchemaId,
    pub doc: Node,
}

/// Envelope read before the tree is typed, so tree errors can be told apart
/// from envelope errors.
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    schema: SchemaId,
    doc: Value,
}

/// Codec failures.
#[derive(Debug)]
pub enum DocError {
    /// The tree uses kinds, marks or content the tagged schema does not admit.
    SchemaMismatch { schema: SchemaId, detail: String },
    /// The input is not a `{schema, doc}` JSON envelope.
    Malformed(serde_json::Error),
}

impl Display for DocError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SchemaMismatch { schema, detail } => {
                write!(f, "document does not match schema `{schema}`: {detail}")
            }
            Self::Malformed(err) => write!(f, "malformed document json: {err}"),
        }
    }
}

impl Error for DocError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SchemaMismatch { .. } => None,
            Self::Malformed(err) => Some(err),
        }
    }
}

impl DocError {
    fn mismatch(schema: SchemaId, violation: &SchemaViolation) -> Self {
        Self::SchemaMismatch {
            schema,
            detail: violation.to_string(),
        }
    }
}

pub fn serialize(doc: &Document) -> SerializedDoc {
    SerializedDoc {
        schema: doc.schema_id(),
        doc: doc.root().clone(),
    }
}

/// Validates a serialized tree against its tagged schema.
///
/// # Errors
/// - `SchemaMismatch` when the tree is not valid under `serialized.schema`.
pub fn deserialize(serialized: &SerializedDoc) -> Result<Document, DocError> {
    Document::new(serialized.schema, serialized.doc.clone())
        .map_err(|violation| DocError::mismatch(serialized.schema, &violation))
}

/// Writes the envelope as compact JSON.
pub fn to_json_string(doc: &Document) -> Result<String, DocError> {
    serde_json::to_string(&serialize(doc)).map_err(DocError::Malformed)
}

/// Parses and validates a JSON envelope.
///
/// # Errors
/// - `Malformed` when the text is not a `{schema, doc}` object.
/// - `SchemaMismatch` when the tree has unknown kinds or invalid content.
pub fn from_json_str(input: &str) -> Result<Document, DocError> {
    let raw: RawEnvelope = serde_json::from_str(input).map_err(DocError::Malformed)?;
    let tree = match raw.schema {
        SchemaId::Task => upgrade_legacy_task_tree(raw.doc),
        SchemaId::Text => raw.doc,
    };
    if let Some(detail) = find_stray_field(&tree) {
        return Err(DocError::SchemaMismatch {
            schema: raw.schema,
            detail,
        });
    }
    let doc: Node = serde_json::from_value(tree).map_err(|err| DocError::SchemaMismatch {
        schema: raw.schema,
        detail: err.to_string(),
    })?;
    deserialize(&SerializedDoc {
        schema: raw.schema,
        doc,
    })
}

/// Rewrites the two legacy checklist shapes into
/// `task_list > task_item > [checkbox, paragraph > text*]`:
/// - `taskList > task > [checkbox, text*]`
/// - `bullet_list > list_item > paragraph{checked} > text*`
fn upgrade_legacy_task_tree(value: Value) -> Value {
    let Value::Object(mut object) = value else {
        return value;
    };
    let content = object
        .remove("content")
        .and_then(|content| match content {
            Value::Array(children) => Some(children),
            _ => None,
        })
        .map(|children| {
            children
                .into_iter()
                .map(upgrade_legacy_task_tree)
                .collect::<Vec<_>>()
        });

    match object.get("type").and_then(Value::as_str) {
        Some("taskList") => {
            object.insert("type".to_string(), Value::from("task_list"));
        }
        Some("bullet_list") => {
            let items: Vec<Value> = content
                .unwrap_or_default()
                .into_iter()
                .flat_map(legacy_list_item_tasks)
                .collect();
            object.insert("type".to_string(), Value::from("task_list"));
            object.insert("content".to_string(), Value::Array(items));
            return Value::Object(object);
        }
        Some("task") => {
            let children = content.unwrap_or_default();
            let (checkboxes, inline): (Vec<Value>, Vec<Value>) = children
                .into_iter()
                .partition(|child| child.get("type").and_then(Value::as_str) == Some("checkbox"));
            let mut paragraph = Map::new();
            paragraph.insert("type".to_string(), Value::from("paragraph"));
            if !inline.is_empty() {
                paragraph.insert("content".to_string(), Value::Array(inline));
            }
            let mut item_content = checkboxes;
            item_content.push(Value::Object(paragraph));
            object.insert("type".to_string(), Value::from("task_item"));
            object.insert("content".to_string(), Value::Array(item_content));
            return Value::Object(object);
        }
        _ => {}
    }
    if let Some(children) = content {
        object.insert("content".to_string(), Value::Array(children));
    }
    Value::Object(object)
}

/// One `task_item` per paragraph of a legacy `list_item`.
fn legacy_list_item_tasks(item: Value) -> Vec<Value> {
    if item.get("type").and_then(Value::as_str) != Some("list_item") {
        return vec![item];
    }
    let children = match item {
        Value::Object(mut object) => match object.remove("content") {
            Some(Value::Array(children)) => children,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    children.into_iter().map(legacy_paragraph_task).collect()
}

/// Moves a legacy paragraph's `checked` attribute onto a checkbox.
fn legacy_paragraph_task(paragraph: Value) -> Value {
    let Value::Object(mut paragraph) = paragraph else {
        return paragraph;
    };
    if paragraph.get("type").and_then(Value::as_str) != Some("paragraph") {
        return Value::Object(paragraph);
    }
    let checked = paragraph
        .remove("attrs")
        .and_then(|attrs| attrs.get("checked").and_then(Value::as_bool))
        .unwrap_or(false);
    json!({
        "type": "task_item",
        "content": [
            {"type": "checkbox", "attrs": {"checked": checked}},
            Value::Object(paragraph),
        ],
    })
}

/// Keys a node object may carry besides `type`.
fn allowed_keys(kind: &str) -> &'static [&'static str] {
    match kind {
        "text" => &["type", "text", "marks"],
        _ => &["type", "attrs", "content"],
    }
}

fn has_attrs(kind: &str) -> bool {
    matches!(kind, "heading" | "ordered_list" | "checkbox" | "image")
}

/// First field or attribute in the tree that its node kind does not define.
///
/// An empty or `null` `attrs` is accepted on any non-text kind.
fn find_stray_field(value: &Value) -> Option<String> {
    let Value::Object(object) = value else {
        return None;
    };
    let kind = object.get("type").and_then(Value::as_str).unwrap_or_default();
    if let Some(key) = object
        .keys()
        .find(|key| !allowed_keys(kind).contains(&key.as_str()))
    {
        return Some(format!("node `{kind}` has no field `{key}`"));
    }
    let stray_attrs = match object.get("attrs") {
        None | Some(Value::Null) => None,
        Some(Value::Object(attrs)) if attrs.is_empty() => None,
        Some(Value::Object(attrs)) if !has_attrs(kind) => attrs.keys().next().cloned(),
        Some(_) => None,
    };
    if let Some(key) = stray_attrs {
        return Some(format!("node `{kind}` has no attribute `{key}`"));
    }
    object
        .get("content")
        .and_then(Value::as_array)
        .and_then(|children| children.iter().find_map(find_stray_field))
}
