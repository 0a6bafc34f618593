//! Schema-bound document values and position resolution.
//!
//! # Responsibility
//! - Pair a root `doc` node with the schema it is valid under.
//! - Resolve flat positions into ancestor paths for edits and commands.
//!
//! # Invariants
//! - A `Document` is valid against its schema for its whole lifetime.
//! - Positions are only meaningful for the document value they came from.

use crate::model::node::{Fragment, Node, NodeKind};
use crate::model::schema::{Schema, SchemaId, SchemaViolation};
use std::sync::Arc;

/// A note body: a `doc` root valid under exactly one schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    schema: SchemaId,
    root: Arc<Node>,
}

impl Document {
    /// Wraps `root` after validating it against `schema`.
    ///
    /// # Errors
    /// - `InvalidContent` when `root` is not a `doc` node.
    /// - Any violation found while validating the tree.
    pub fn new(schema: SchemaId, root: Node) -> Result<Self, SchemaViolation> {
        if root.kind() != NodeKind::Doc {
            return Err(SchemaViolation::InvalidContent {
                schema,
                parent: NodeKind::Doc,
                found: root.kind().as_str().to_string(),
            });
        }
        schema.schema().validate(&root)?;
        Ok(Self {
            schema,
            root: Arc::new(root),
        })
    }

    /// Empty placeholder document for `schema`.
    pub fn empty(schema: SchemaId) -> Self {
        Self::from_trusted(schema, schema.schema().empty_doc())
    }

    /// Wraps a root that the caller built valid by construction.
    pub(crate) fn from_trusted(schema: SchemaId, root: Node) -> Self {
        debug_assert!(
            schema.schema().validate(&root).is_ok(),
            "trusted document must validate"
        );
        Self {
            schema,
            root: Arc::new(root),
        }
    }

    pub fn schema_id(&self) -> SchemaId {
        self.schema
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema.schema()
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Top-level blocks of the document.
    pub fn blocks(&self) -> &Fragment {
        static EMPTY: once_cell::sync::Lazy<Fragment> = once_cell::sync::Lazy::new(Fragment::empty);
        self.root.content().unwrap_or(&EMPTY)
    }

    pub fn content_size(&self) -> usize {
        self.root.content_size()
    }

    pub fn text_content(&self) -> String {
        self.root.text_content()
    }

    /// True when the document has no text other than whitespace.
    pub fn is_blank(&self) -> bool {
        self.text_content().trim().is_empty()
    }

    /// Resolves `pos` into its ancestor path. `None` when out of range.
    pub fn resolve(&self, pos: usize) -> Option<ResolvedPos> {
        if pos > self.content_size() {
            return None;
        }
        let mut path = Vec::new();
        let mut node = Arc::clone(&self.root);
        let mut start = 0;
        let mut offset = pos;
        loop {
            let Some(content) = node.content() else {
                break;
            };
            let (index, child_start) = content.find_index(offset);
            let inside = offset - child_start;
            let entered = if inside > 0 {
                content
                    .shared()
                    .get(index)
                    .filter(|child| child.content().is_some())
                    .cloned()
            } else {
                None
            };
            path.push(PathStep {
                node: Arc::clone(&node),
                index,
                start,
                child_start,
            });
            match entered {
                Some(child) => {
                    start += child_start + 1;
                    offset = inside - 1;
                    node = child;
                }
                None => break,
            }
        }
        Some(ResolvedPos {
            pos,
            path,
            parent_offset: offset,
        })
    }

    /// The node that starts exactly at `pos`, if any.
    pub fn node_at(&self, pos: usize) -> Option<&Node> {
        let resolved = self.resolve(pos)?;
        if resolved.text_offset() != 0 {
            return None;
        }
        let mut node = self.root.as_ref();
        for depth in 0..resolved.depth() {
            node = node.child(resolved.index(depth))?;
        }
        node.child(resolved.index(resolved.depth()))
    }
}

#[derive(Debug, Clone)]
struct PathStep {
    node: Arc<Node>,
    index: usize,
    start: usize,
    child_start: usize,
}

/// A position resolved against one document version.
///
/// Depth 0 is the `doc` node; `depth()` is the innermost container holding
/// the position.
#[derive(Debug, Clone)]
pub struct ResolvedPos {
    pos: usize,
    path: Vec<PathStep>,
    parent_offset: usize,
}

impl ResolvedPos {
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn depth(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// Ancestor at `depth`.
    pub fn node(&self, depth: usize) -> &Node {
        &self.path[depth.min(self.depth())].node
    }

    pub fn parent(&self) -> &Node {
        self.node(self.depth())
    }

    /// Index of the child of `node(depth)` that holds (or follows) the position.
    pub fn index(&self, depth: usize) -> usize {
        self.path[depth.min(self.depth())].index
    }

    /// Position where the content of `node(depth)` starts.
    pub fn start(&self, depth: usize) -> usize {
        self.path[depth.min(self.depth())].start
    }

    /// Position directly before `node(depth)`; depth 0 has none.
    pub fn before(&self, depth: usize) -> Option<usize> {
        (depth > 0).then(|| self.start(depth) - 1)
    }

    /// Position directly after `node(depth)`; depth 0 has none.
    pub fn after(&self, depth: usize) -> Option<usize> {
        self.before(depth)
            .map(|before| before + self.node(depth).node_size())
    }

    /// Offset of the position inside its parent's content.
    pub fn parent_offset(&self) -> usize {
        self.parent_offset
    }

    /// Offset into the text node the position falls inside; 0 on boundaries.
    pub fn text_offset(&self) -> usize {
        self.path
            .last()
            .map(|step| self.parent_offset - step.child_start)
            .unwrap_or(0)
    }

    /// Nearest ancestor depth whose node has `kind`.
    pub fn find_ancestor(&self, kind: NodeKind) -> Option<usize> {
        (0..=self.depth()).rev().find(|depth| self.node(*depth).kind() == kind)
    }

    /// Whether both positions share the same innermost parent.
    pub fn same_parent(&self, other: &ResolvedPos) -> bool {
        self.depth() == other.depth() && self.start(self.depth()) == other.start(other.depth())
    }
}
