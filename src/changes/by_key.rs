//! Primitive mutations addressed by node key.
//!
//! Every primitive validates its arguments against the current document
//! before touching it, records one or more [`Operation`]s, moves the
//! selection along with the content it pointed at and, when asked, repairs
//! the affected parent against the schema.

use super::{Change, ChangeOptions, Operation};
use crate::error::{EditError, EditResult};
use crate::models::{Inline, Key, Mark, MarkSet, Node, NodeProperties};
use crate::schema::Schema;

impl Change {
    pub fn insert_node_by_key(
        &mut self,
        parent_key: &str,
        index: usize,
        node: Node,
        options: ChangeOptions,
    ) -> EditResult {
        if node.is_document() {
            return Err(EditError::invalid(
                "node",
                "a document cannot be inserted as a child",
            ));
        }
        let document = self.document();
        let parent = document.assert_node(parent_key)?;
        if parent.is_text() {
            return Err(EditError::NotContainer(parent_key.to_string()));
        }
        if index > parent.nodes().len() {
            return Err(EditError::InvalidIndex {
                key: parent_key.to_string(),
                index,
            });
        }
        if let Some(duplicate) = first_duplicate(&document, &node) {
            return Err(EditError::DuplicateKey(duplicate.to_string()));
        }

        let inserted = node.clone();
        self.with_node_mut(parent_key, move |parent| {
            if let Some(children) = parent.children_mut() {
                children.insert(index, inserted);
            }
        })?;
        self.record(Operation::InsertNode {
            parent: parent_key.to_string(),
            index,
            node,
        });
        self.refresh_direction();
        if options.normalize {
            self.normalize_node_by_key(parent_key)?;
        }
        Ok(())
    }

    /// Removes `key` and its subtree. Selection edges inside it move to the
    /// end of the previous text, or the start of the next one; with neither
    /// the selection is cleared.
    pub fn remove_node_by_key(&mut self, key: &str, options: ChangeOptions) -> EditResult {
        let document = self.document();
        let node = document.assert_descendant(key)?;
        let parent_key = parent_key_of(&document, key)?;

        let mut cleared = false;
        if let Some(selection) = self.value.selection.as_mut() {
            let inside = |point: &str| node.get_node(point).is_some();
            let anchor_inside = inside(&selection.anchor_key);
            let focus_inside = inside(&selection.focus_key);
            if anchor_inside || focus_inside {
                let fallback = document
                    .get_previous_text(key)
                    .map(|previous| {
                        let offset = if document.has_void_parent(previous.key()) {
                            1
                        } else {
                            previous.len()
                        };
                        (previous.key().to_string(), offset)
                    })
                    .or_else(|| {
                        document
                            .get_next_text(key)
                            .map(|next| (next.key().to_string(), 0))
                    });
                match fallback {
                    Some((fallback_key, fallback_offset)) => {
                        if anchor_inside {
                            selection.anchor_key = fallback_key.clone();
                            selection.anchor_offset = fallback_offset;
                        }
                        if focus_inside {
                            selection.focus_key = fallback_key;
                            selection.focus_offset = fallback_offset;
                        }
                    }
                    None => cleared = true,
                }
            }
        }
        if cleared {
            self.value.selection = None;
        }

        self.with_node_mut(&parent_key, |parent| {
            if let Some(children) = parent.children_mut() {
                children.retain(|child| child.key() != key);
            }
        })?;
        self.record(Operation::RemoveNode {
            key: key.to_string(),
            node: node.clone(),
        });
        self.refresh_direction();
        if options.normalize {
            self.normalize_node_by_key(&parent_key)?;
        }
        Ok(())
    }

    /// Moves `key` under `new_parent_key`. `new_index` counts the new
    /// parent's children after the node has been taken out.
    pub fn move_node_by_key(
        &mut self,
        key: &str,
        new_parent_key: &str,
        new_index: usize,
        options: ChangeOptions,
    ) -> EditResult {
        let document = self.document();
        let node = document.assert_descendant(key)?.clone();
        let old_parent_key = parent_key_of(&document, key)?;
        let new_parent = document.assert_node(new_parent_key)?;
        if new_parent.is_text() {
            return Err(EditError::NotContainer(new_parent_key.to_string()));
        }
        if node.get_node(new_parent_key).is_some() {
            return Err(EditError::invalid(
                "parent",
                format!("`{key}` cannot be moved into itself"),
            ));
        }
        let available = if old_parent_key == new_parent_key {
            new_parent.nodes().len() - 1
        } else {
            new_parent.nodes().len()
        };
        if new_index > available {
            return Err(EditError::InvalidIndex {
                key: new_parent_key.to_string(),
                index: new_index,
            });
        }

        self.with_node_mut(&old_parent_key, |parent| {
            if let Some(children) = parent.children_mut() {
                children.retain(|child| child.key() != key);
            }
        })?;
        self.with_node_mut(new_parent_key, move |parent| {
            if let Some(children) = parent.children_mut() {
                children.insert(new_index, node);
            }
        })?;
        self.record(Operation::MoveNode {
            key: key.to_string(),
            parent: new_parent_key.to_string(),
            index: new_index,
        });
        self.refresh_direction();
        if options.normalize {
            self.normalize_node_by_key(&old_parent_key)?;
            self.normalize_node_by_key(new_parent_key)?;
        }
        Ok(())
    }

    /// Patches type, data and void flag. The key cannot be changed.
    pub fn set_node_by_key(
        &mut self,
        key: &str,
        properties: NodeProperties,
        options: ChangeOptions,
    ) -> EditResult {
        let document = self.document();
        let node = document.assert_node(key)?;
        if node.is_text() {
            return Err(EditError::invalid(
                "node",
                format!("text node `{key}` has no properties to set"),
            ));
        }
        let target = document
            .get_parent(key)
            .map_or_else(|| key.to_string(), |parent| parent.key().to_string());

        self.with_node_mut(key, |node| node.set_properties(&properties))?;
        self.record(Operation::SetNode {
            key: key.to_string(),
            properties,
        });
        if options.normalize {
            self.normalize_node_by_key(&target)?;
        }
        Ok(())
    }

    /// Splits `key` in two siblings and returns the key of the right half.
    ///
    /// Texts split at a character offset, containers at a child index. The
    /// left half keeps the original key.
    pub fn split_node_by_key(
        &mut self,
        key: &str,
        position: usize,
        options: ChangeOptions,
    ) -> Result<Key, EditError> {
        let document = self.document();
        let node = document.assert_descendant(key)?;
        let parent_key = parent_key_of(&document, key)?;
        match node {
            Node::Text(text) if position > text.len() => {
                return Err(EditError::InvalidOffset {
                    key: key.to_string(),
                    offset: position,
                });
            }
            Node::Text(_) => {}
            _ if position > node.nodes().len() => {
                return Err(EditError::InvalidIndex {
                    key: key.to_string(),
                    index: position,
                });
            }
            _ => {}
        }

        let new_key = self.generate_key();
        let (left, right) = match node {
            Node::Text(text) => {
                let mut left = text.as_ref().clone();
                let right = left.split_off(position, new_key.clone());
                (Node::from(left), Node::from(right))
            }
            _ => {
                let (before, after) = node.nodes().split_at(position);
                let left = node.with_children(before.to_vec());
                let mut right = node.with_children(after.to_vec());
                right.set_key(new_key.clone());
                (left, right)
            }
        };

        self.with_node_mut(&parent_key, |parent| {
            if let Some(children) = parent.children_mut()
                && let Some(index) = children.iter().position(|child| child.key() == key)
            {
                children[index] = left;
                children.insert(index + 1, right);
            }
        })?;
        if node.is_text() {
            self.map_points(|point, offset| {
                (point == key && offset >= position).then(|| (new_key.clone(), offset - position))
            });
        }
        self.record(Operation::SplitNode {
            key: key.to_string(),
            position,
            new_key: new_key.clone(),
        });
        self.refresh_direction();
        if options.normalize {
            self.normalize_node_by_key(&parent_key)?;
        }
        Ok(new_key)
    }

    /// Splits the text `text_key` at `offset`, then every ancestor up to and
    /// including `ancestor_key` after the left half. Returns the key of the
    /// right half of `ancestor_key`.
    pub fn split_descendants_by_key(
        &mut self,
        ancestor_key: &str,
        text_key: &str,
        offset: usize,
        options: ChangeOptions,
    ) -> Result<Key, EditError> {
        let document = self.document();
        document.assert_text(text_key)?;
        let mut chain = vec![text_key.to_string()];
        if ancestor_key != text_key {
            let ancestors = document
                .get_ancestors(text_key)
                .ok_or_else(|| EditError::NodeNotFound(text_key.to_string()))?;
            let from = ancestors
                .iter()
                .position(|ancestor| ancestor.key() == ancestor_key)
                .ok_or_else(|| {
                    EditError::invalid(
                        "ancestor",
                        format!("`{ancestor_key}` does not contain `{text_key}`"),
                    )
                })?;
            chain.extend(
                ancestors[from..]
                    .iter()
                    .rev()
                    .map(|ancestor| ancestor.key().to_string()),
            );
        }
        let outer_parent = parent_key_of(&document, ancestor_key)?;

        let without = ChangeOptions::without_normalize();
        let mut right = self.split_node_by_key(text_key, offset, without)?;
        for pair in chain.windows(2) {
            let (previous, key) = (&pair[0], &pair[1]);
            let position = self
                .value
                .document
                .get_node(key)
                .and_then(|node| node.index_of(previous))
                .ok_or_else(|| EditError::NodeNotFound(previous.clone()))?;
            right = self.split_node_by_key(key, position + 1, without)?;
        }
        if options.normalize {
            self.normalize_node_by_key(&outer_parent)?;
        }
        Ok(right)
    }

    /// Appends `key` to its previous sibling and removes it.
    pub fn merge_node_by_key(&mut self, key: &str, options: ChangeOptions) -> EditResult {
        let document = self.document();
        let node = document.assert_descendant(key)?;
        let parent_key = parent_key_of(&document, key)?;
        let previous = document.get_previous_sibling(key).ok_or_else(|| {
            EditError::invalid("node", format!("`{key}` has no previous sibling to merge into"))
        })?;
        if previous.kind() != node.kind() {
            return Err(EditError::invalid(
                "node",
                format!(
                    "cannot merge a {} into a {}",
                    node.kind().as_str(),
                    previous.kind().as_str()
                ),
            ));
        }
        let previous_key = previous.key().to_string();
        let previous_len = previous.text_len();
        let merged = match (previous, node) {
            (Node::Text(left), Node::Text(right)) => {
                let mut text = left.as_ref().clone();
                text.append(right);
                Node::from(text)
            }
            _ => {
                let mut nodes = previous.nodes().to_vec();
                nodes.extend(node.nodes().iter().cloned());
                previous.with_children(nodes)
            }
        };

        self.with_node_mut(&parent_key, |parent| {
            if let Some(children) = parent.children_mut() {
                if let Some(slot) = children.iter_mut().find(|child| child.key() == previous_key) {
                    *slot = merged;
                }
                children.retain(|child| child.key() != key);
            }
        })?;
        if node.is_text() {
            self.map_points(|point, offset| {
                (point == key).then(|| (previous_key.clone(), previous_len + offset))
            });
        }
        self.record(Operation::MergeNode {
            key: key.to_string(),
            into: previous_key,
        });
        self.refresh_direction();
        if options.normalize {
            self.normalize_node_by_key(&parent_key)?;
        }
        Ok(())
    }

    /// Inserts `text` at `offset`. Without explicit marks the new characters
    /// take the marks of the character before them.
    pub fn insert_text_by_key(
        &mut self,
        key: &str,
        offset: usize,
        text: &str,
        marks: Option<MarkSet>,
        options: ChangeOptions,
    ) -> EditResult {
        let document = self.document();
        let node = document.assert_text(key)?;
        if offset > node.len() {
            return Err(EditError::InvalidOffset {
                key: key.to_string(),
                offset,
            });
        }
        if text.is_empty() {
            return Ok(());
        }
        let marks = marks.unwrap_or_else(|| node.marks_at_index(offset));

        let count = self.with_node_mut(key, |node| {
            node.text_mut()
                .map_or(0, |node| node.insert_text(offset, text, &marks))
        })?;
        self.map_points(|point, at| (point == key && at >= offset).then(|| (point.to_string(), at + count)));
        self.record(Operation::InsertText {
            key: key.to_string(),
            offset,
            text: text.to_string(),
            marks,
        });
        if options.normalize {
            self.normalize_around(key)?;
        }
        Ok(())
    }

    pub fn remove_text_by_key(
        &mut self,
        key: &str,
        offset: usize,
        length: usize,
        options: ChangeOptions,
    ) -> EditResult {
        self.check_span(key, offset, length)?;
        if length == 0 {
            return Ok(());
        }
        let removed = self.with_node_mut(key, |node| {
            node.text_mut()
                .map(|node| node.remove_text(offset, length))
                .unwrap_or_default()
        })?;
        let end = offset + length;
        self.map_points(|point, at| {
            if point != key || at <= offset {
                None
            } else if at >= end {
                Some((point.to_string(), at - length))
            } else {
                Some((point.to_string(), offset))
            }
        });
        self.record(Operation::RemoveText {
            key: key.to_string(),
            offset,
            text: removed,
        });
        self.refresh_direction();
        if options.normalize {
            self.normalize_around(key)?;
        }
        Ok(())
    }

    pub fn add_mark_by_key(
        &mut self,
        key: &str,
        offset: usize,
        length: usize,
        mark: Mark,
        options: ChangeOptions,
    ) -> EditResult {
        self.check_span(key, offset, length)?;
        if length == 0 {
            return Ok(());
        }
        self.with_node_mut(key, |node| {
            if let Some(text) = node.text_mut() {
                text.add_mark(offset, length, &mark);
            }
        })?;
        self.record(Operation::AddMark {
            key: key.to_string(),
            offset,
            length,
            mark,
        });
        if options.normalize {
            self.normalize_around(key)?;
        }
        Ok(())
    }

    pub fn remove_mark_by_key(
        &mut self,
        key: &str,
        offset: usize,
        length: usize,
        mark: Mark,
        options: ChangeOptions,
    ) -> EditResult {
        self.check_span(key, offset, length)?;
        if length == 0 {
            return Ok(());
        }
        self.with_node_mut(key, |node| {
            if let Some(text) = node.text_mut() {
                text.remove_mark(offset, length, &mark);
            }
        })?;
        self.record(Operation::RemoveMark {
            key: key.to_string(),
            offset,
            length,
            mark,
        });
        if options.normalize {
            self.normalize_around(key)?;
        }
        Ok(())
    }

    /// Wraps the node `key` in a fresh, childless copy of `inline`.
    pub fn wrap_inline_by_key(
        &mut self,
        key: &str,
        inline: Inline,
        options: ChangeOptions,
    ) -> EditResult {
        let document = self.document();
        document.assert_descendant(key)?;
        let parent_key = parent_key_of(&document, key)?;
        let index = document
            .get_parent(key)
            .and_then(|parent| parent.index_of(key))
            .ok_or_else(|| EditError::NodeNotFound(key.to_string()))?;

        let wrapper_key = self.generate_key();
        let wrapper = inline.with_key(wrapper_key.clone()).without_nodes();
        let without = ChangeOptions::without_normalize();
        self.insert_node_by_key(&parent_key, index, wrapper.into(), without)?;
        self.move_node_by_key(key, &wrapper_key, 0, without)?;
        if options.normalize {
            self.normalize_node_by_key(&parent_key)?;
        }
        Ok(())
    }

    /// Repairs `key` and its subtree against the change's schema.
    pub fn normalize_node_by_key(&mut self, key: &str) -> EditResult {
        let schema = self.schema();
        self.normalize_with(schema.as_ref(), key)
    }

    pub fn normalize_document(&mut self) -> EditResult {
        let key = self.value.document.key().to_string();
        self.normalize_node_by_key(&key)
    }

    /// Children first, then `key` itself until the schema reports no change.
    fn normalize_with(&mut self, schema: &dyn Schema, key: &str) -> EditResult {
        let children: Vec<Key> = match self.value.document.get_node(key) {
            None => return Ok(()),
            Some(node) => node
                .nodes()
                .iter()
                .filter(|child| !child.is_text())
                .map(|child| child.key().to_string())
                .collect(),
        };
        for child in &children {
            self.normalize_with(schema, child)?;
        }

        let limit = schema.max_iterations();
        for _ in 0..limit {
            if self.value.document.get_node(key).is_none() {
                return Ok(());
            }
            if !schema.normalize_node(self, key)? {
                return Ok(());
            }
            tracing::trace!(key, "repaired node");
        }
        tracing::warn!(key, iterations = limit, "normalization did not settle");
        Err(EditError::NormalizationLimit {
            key: key.to_string(),
            iterations: limit,
        })
    }

    fn normalize_around(&mut self, key: &str) -> EditResult {
        let target = self
            .value
            .document
            .get_closest_block(key)
            .or_else(|| self.value.document.get_parent(key))
            .map(|node| node.key().to_string());
        match target {
            Some(target) => self.normalize_node_by_key(&target),
            None => Ok(()),
        }
    }

    fn check_span(&self, key: &str, offset: usize, length: usize) -> EditResult {
        let text = self.value.document.assert_text(key)?;
        if offset + length > text.len() {
            return Err(EditError::InvalidOffset {
                key: key.to_string(),
                offset: offset + length,
            });
        }
        Ok(())
    }

    /// Rewrites each selection point for which `map` returns a new position.
    pub(crate) fn map_points(&mut self, map: impl Fn(&str, usize) -> Option<(Key, usize)>) {
        let Some(selection) = self.value.selection.as_mut() else {
            return;
        };
        if let Some((key, offset)) = map(&selection.anchor_key, selection.anchor_offset) {
            selection.anchor_key = key;
            selection.anchor_offset = offset;
        }
        if let Some((key, offset)) = map(&selection.focus_key, selection.focus_offset) {
            selection.focus_key = key;
            selection.focus_offset = offset;
        }
    }

    /// Recomputes `is_backward` from document order.
    pub(crate) fn refresh_direction(&mut self) {
        let document = &self.value.document;
        let Some(selection) = self.value.selection.as_mut() else {
            return;
        };
        if selection.anchor_key == selection.focus_key {
            selection.is_backward = selection.anchor_offset > selection.focus_offset;
        } else if let (Some(anchor), Some(focus)) = (
            document.get_path(&selection.anchor_key),
            document.get_path(&selection.focus_key),
        ) {
            selection.is_backward = anchor > focus;
        }
    }
}

fn parent_key_of(document: &Node, key: &str) -> Result<Key, EditError> {
    document
        .get_parent(key)
        .map(|parent| parent.key().to_string())
        .ok_or_else(|| EditError::NodeNotFound(key.to_string()))
}

fn first_duplicate<'a>(document: &Node, node: &'a Node) -> Option<&'a str> {
    if document.get_node(node.key()).is_some() {
        return Some(node.key());
    }
    node.nodes()
        .iter()
        .find_map(|child| first_duplicate(document, child))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Block, CounterKeyGenerator, Document, Range, Text, Value};

    fn change(range: Option<Range>) -> Change {
        let para = Block::new("p", "paragraph", vec![Text::new("t", "hello").into()]);
        let mut value = Value::new(Document::new("d", vec![para.into()]));
        value.selection = range;
        Change::new(value).with_key_generator(CounterKeyGenerator::starting_at(100))
    }

    #[test]
    fn inserted_text_pushes_later_points() {
        let mut change = change(Some(Range::new("t", 1, "t", 3)));
        change
            .insert_text_by_key("t", 2, "XY", None, ChangeOptions::default())
            .unwrap();
        let selection = change.selection().unwrap();
        assert_eq!((selection.anchor_offset, selection.focus_offset), (1, 5));
        assert_eq!(change.document().text(), "heXYllo");
    }

    #[test]
    fn removed_text_clamps_points_inside_the_span() {
        let mut change = change(Some(Range::new("t", 2, "t", 5)));
        change
            .remove_text_by_key("t", 1, 3, ChangeOptions::default())
            .unwrap();
        let selection = change.selection().unwrap();
        assert_eq!((selection.anchor_offset, selection.focus_offset), (1, 2));
    }

    #[test]
    fn split_and_merge_carry_the_caret() {
        let mut change = change(Some(Range::collapsed("t", 4)));
        let right = change
            .split_node_by_key("t", 2, ChangeOptions::without_normalize())
            .unwrap();
        assert_eq!(right, "100");
        let selection = change.selection().unwrap().clone();
        assert_eq!((selection.anchor_key.as_str(), selection.anchor_offset), ("100", 2));

        change
            .merge_node_by_key("100", ChangeOptions::without_normalize())
            .unwrap();
        let selection = change.selection().unwrap();
        assert_eq!((selection.anchor_key.as_str(), selection.anchor_offset), ("t", 4));
        assert_eq!(change.document().nodes()[0].nodes().len(), 1);
    }

    #[test]
    fn duplicate_keys_are_rejected_before_mutation() {
        let mut change = change(None);
        let err = change
            .insert_node_by_key("p", 0, Text::new("t", "again").into(), ChangeOptions::default())
            .unwrap_err();
        assert_eq!(err, EditError::DuplicateKey("t".into()));
        assert!(change.operations().is_empty());
    }

    #[test]
    fn removing_the_only_text_clears_the_selection() {
        let mut change = change(Some(Range::collapsed("t", 0)));
        change
            .remove_node_by_key("p", ChangeOptions::without_normalize())
            .unwrap();
        assert!(change.selection().is_none());
    }

    #[test]
    fn moving_into_a_descendant_fails() {
        let mut change = change(None);
        let err = change
            .move_node_by_key("p", "t", 0, ChangeOptions::default())
            .unwrap_err();
        assert!(matches!(err, EditError::NotContainer(_)));
    }
}
