//! The `Change` context and every edit that runs through it.
//!
//! A change owns the value being edited. Operations are layered:
//!
//! - `by_key`: primitive mutations addressed by node key. These are the only
//!   code that rewrites the tree; each one records an [`Operation`] and
//!   carries the selection along.
//! - `on_selection`: selection-only updates.
//! - `at_range`: the range editing engine, built from primitives.
//! - `at_current_range`: the same edits applied to the current selection.

mod at_current_range;
mod at_range;
mod by_key;
mod on_selection;

use crate::error::EditError;
use crate::models::{
    Key, KeyGenerator, Mark, MarkSet, Node, NodeProperties, Range, UuidKeyGenerator, Value,
};
use crate::schema::{CoreSchema, Schema};
use std::fmt;
use std::sync::Arc;

/// Options accepted by every edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeOptions {
    /// Repair the touched subtree against the schema once the edit is done.
    pub normalize: bool,
}

impl ChangeOptions {
    pub const fn without_normalize() -> Self {
        Self { normalize: false }
    }
}

impl Default for ChangeOptions {
    fn default() -> Self {
        Self { normalize: true }
    }
}

/// One applied primitive mutation, addressed by key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    InsertNode {
        parent: Key,
        index: usize,
        node: Node,
    },
    RemoveNode {
        key: Key,
        node: Node,
    },
    MoveNode {
        key: Key,
        parent: Key,
        index: usize,
    },
    SetNode {
        key: Key,
        properties: NodeProperties,
    },
    SplitNode {
        key: Key,
        position: usize,
        new_key: Key,
    },
    MergeNode {
        key: Key,
        into: Key,
    },
    InsertText {
        key: Key,
        offset: usize,
        text: String,
        marks: MarkSet,
    },
    RemoveText {
        key: Key,
        offset: usize,
        text: String,
    },
    AddMark {
        key: Key,
        offset: usize,
        length: usize,
        mark: Mark,
    },
    RemoveMark {
        key: Key,
        offset: usize,
        length: usize,
        mark: Mark,
    },
    SetSelection {
        selection: Option<Range>,
    },
}

/// A value under edit.
///
/// Edits read the latest document, apply primitives in order and leave the
/// updated document and selection behind for the next call. Failed argument
/// checks happen before anything is applied.
pub struct Change {
    pub(crate) value: Value,
    keys: Box<dyn KeyGenerator>,
    schema: Arc<dyn Schema>,
    operations: Vec<Operation>,
    snapshot: Option<Range>,
}

impl Change {
    /// Starts a change with uuid keys and the core schema.
    pub fn new(value: Value) -> Self {
        Self {
            value,
            keys: Box::new(UuidKeyGenerator),
            schema: Arc::new(CoreSchema::default()),
            operations: Vec::new(),
            snapshot: None,
        }
    }

    pub fn with_key_generator(mut self, keys: impl KeyGenerator + 'static) -> Self {
        self.keys = Box::new(keys);
        self
    }

    pub fn with_schema(mut self, schema: impl Schema + 'static) -> Self {
        self.schema = Arc::new(schema);
        self
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Handle to the current document. Cheap: the tree is shared.
    pub fn document(&self) -> Node {
        self.value.document.clone()
    }

    pub fn selection(&self) -> Option<&Range> {
        self.value.selection.as_ref()
    }

    /// Every primitive applied so far, oldest first.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Selection saved by the last destructive range edit.
    pub fn snapshot(&self) -> Option<&Range> {
        self.snapshot.as_ref()
    }

    pub fn key_generator(&mut self) -> &mut dyn KeyGenerator {
        self.keys.as_mut()
    }

    pub(crate) fn generate_key(&mut self) -> Key {
        self.keys.generate_key()
    }

    pub(crate) fn schema(&self) -> Arc<dyn Schema> {
        Arc::clone(&self.schema)
    }

    pub(crate) fn record(&mut self, operation: Operation) {
        tracing::trace!(?operation, "applied");
        self.operations.push(operation);
    }

    /// The selection resolved against the current document.
    pub(crate) fn current_selection(&self) -> Result<Range, EditError> {
        let selection = self.value.selection.clone().ok_or(EditError::NoSelection)?;
        selection.normalize(&self.value.document)
    }

    /// Runs `edit` on the node `key`, copying the path to it first.
    pub(crate) fn with_node_mut<T>(
        &mut self,
        key: &str,
        edit: impl FnOnce(&mut Node) -> T,
    ) -> Result<T, EditError> {
        let missing = || EditError::NodeNotFound(key.to_string());
        let path = self.value.document.get_path(key).ok_or_else(missing)?;
        let node = self.value.document.descend_mut(&path).ok_or_else(missing)?;
        Ok(edit(node))
    }

    pub(crate) fn set_snapshot(&mut self, selection: Option<Range>) {
        self.snapshot = selection;
    }
}

impl fmt::Debug for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Change")
            .field("value", &self.value)
            .field("schema", &self.schema)
            .field("operations", &self.operations.len())
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

impl From<Value> for Change {
    fn from(value: Value) -> Self {
        Change::new(value)
    }
}
