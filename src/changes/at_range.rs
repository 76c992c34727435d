//! The range editing engine.
//!
//! Each operation takes an explicit range, resolves it against the current
//! document and expresses the edit as a sequence of primitives. Intermediate
//! primitives never normalize; the operation issues one final normalization
//! when its options ask for it.

use super::{Change, ChangeOptions};
use crate::error::{EditError, EditResult};
use crate::models::{Document, Key, MarkSet, Node, NodeKind, NodeProperties, Range};
use crate::normalize::{self, BlockInput, InlineInput, MarkInput, MarksInput, PropertiesInput};
use crate::string::{word_offset_backward, word_offset_forward};
use tracing::debug;

const WITHOUT: ChangeOptions = ChangeOptions::without_normalize();

impl Change {
    pub fn add_mark_at_range(
        &mut self,
        range: &Range,
        mark: impl Into<MarkInput>,
        options: ChangeOptions,
    ) -> EditResult {
        let mark = normalize::mark(mark)?;
        let range = self.resolve(range)?;
        if range.is_collapsed() {
            return Ok(());
        }
        log_range("add_mark_at_range", &range);
        for (key, offset, length) in mark_spans(&self.document(), &range) {
            self.add_mark_by_key(&key, offset, length, mark.clone(), options)?;
        }
        Ok(())
    }

    pub fn remove_mark_at_range(
        &mut self,
        range: &Range,
        mark: impl Into<MarkInput>,
        options: ChangeOptions,
    ) -> EditResult {
        let mark = normalize::mark(mark)?;
        let range = self.resolve(range)?;
        if range.is_collapsed() {
            return Ok(());
        }
        log_range("remove_mark_at_range", &range);
        for (key, offset, length) in mark_spans(&self.document(), &range) {
            self.remove_mark_by_key(&key, offset, length, mark.clone(), options)?;
        }
        Ok(())
    }

    /// Removes `mark` when every character in the range carries it, adds it
    /// otherwise.
    pub fn toggle_mark_at_range(
        &mut self,
        range: &Range,
        mark: impl Into<MarkInput>,
        options: ChangeOptions,
    ) -> EditResult {
        let mark = normalize::mark(mark)?;
        let range = self.resolve(range)?;
        if range.is_collapsed() {
            return Ok(());
        }
        let exists = self
            .value
            .document
            .get_active_marks_at_range(&range)
            .contains(&mark);
        if exists {
            self.remove_mark_at_range(&range, mark, options)
        } else {
            self.add_mark_at_range(&range, mark, options)
        }
    }

    /// Deletes everything inside `range` by splitting at both edges, pruning
    /// the nodes in between and merging the end block into the start block.
    pub fn delete_at_range(&mut self, range: &Range, options: ChangeOptions) -> EditResult {
        let range = self.resolve(range)?;
        if range.is_collapsed() {
            return Ok(());
        }
        log_range("delete_at_range", &range);
        self.snapshot_selection();

        let document = self.document();
        let mut start_key = range.start_key().to_string();
        let mut start_offset = range.start_offset();
        let end_key = range.end_key().to_string();
        let end_offset = range.end_offset();

        let ancestor = document.get_common_ancestor(&start_key, &end_key)?;
        let outer_key = ancestor.key().to_string();
        let mut start_child = furthest_under(ancestor, &start_key)?.clone();
        let end_child_key = furthest_under(ancestor, &end_key)?.key().to_string();

        if start_child.is_void() && start_offset == 0 {
            loop {
                let next = document.get_next_sibling(start_child.key()).cloned();
                self.remove_node_by_key(start_child.key(), WITHOUT)?;
                match next {
                    None => return self.normalize_if(&outer_key, options),
                    Some(next) if next.is_void() && next.key() == end_child_key => {
                        return self.normalize_if(&outer_key, options);
                    }
                    Some(next) if next.is_void() => start_child = next,
                    Some(next) => {
                        start_key = first_text_key(&next);
                        start_offset = 0;
                        break;
                    }
                }
            }
        } else if start_child.is_void() && start_offset == 1 {
            if let Some(next) = document.get_next_sibling(start_child.key()) {
                start_key = first_text_key(next);
                start_offset = 0;
            }
        }

        if start_key == end_key {
            if ancestor.is_void() {
                if document.nodes().len() == 1 && document.has_child(ancestor.key()) {
                    self.deselect();
                }
                return self.remove_node_by_key(ancestor.key(), options);
            }
            let length = end_offset.saturating_sub(start_offset);
            return self.remove_text_by_key(&start_key, start_offset, length, options);
        }

        let document = self.document();
        let ancestor = document.get_common_ancestor(&start_key, &end_key)?;
        let ancestor_key = ancestor.key().to_string();
        let start_child = furthest_under(ancestor, &start_key)?;
        let end_child = furthest_under(ancestor, &end_key)?;
        let start_split = clamp_offset(&document, &start_key, start_offset);
        let end_split = clamp_offset(&document, &end_key, end_offset);
        self.split_descendants_by_key(start_child.key(), &start_key, start_split, WITHOUT)?;
        self.split_descendants_by_key(end_child.key(), &end_key, end_split, WITHOUT)?;

        let document = self.document();
        let ancestor = document.assert_node(&ancestor_key)?;
        let start_index = index_under(ancestor, &start_key)?;
        let end_index = index_under(ancestor, &end_key)?;
        let middles: Vec<Key> = ancestor.nodes()[start_index + 1..=end_index]
            .iter()
            .map(|node| node.key().to_string())
            .collect();
        let next = document
            .get_next_text(&end_key)
            .map(|text| text.key().to_string());
        for key in &middles {
            self.remove_node_by_key(key, WITHOUT)?;
        }

        let document = self.document();
        let start_block = document
            .get_closest_block(&start_key)
            .ok_or_else(|| EditError::NodeNotFound(start_key.clone()))?;
        if let Some(next) = next {
            let end_block = document
                .get_closest_block(&next)
                .ok_or(EditError::NodeNotFound(next))?;
            if end_block.is_void() {
                return self.remove_node_by_key(start_block.key(), options);
            }
            if start_block.key() != end_block.key() {
                let base = start_block.nodes().len();
                for (i, child) in end_block.nodes().iter().enumerate() {
                    self.move_node_by_key(child.key(), start_block.key(), base + i, WITHOUT)?;
                }
                let lonely = document
                    .get_furthest_only_child_ancestor(end_block.key())
                    .unwrap_or(end_block);
                self.remove_node_by_key(lonely.key(), WITHOUT)?;
            }
        }

        self.normalize_if(&ancestor_key, options)
    }

    pub fn delete_char_backward_at_range(&mut self, range: &Range, options: ChangeOptions) -> EditResult {
        self.delete_backward_at_range(range, 1, options)
    }

    pub fn delete_word_backward_at_range(&mut self, range: &Range, options: ChangeOptions) -> EditResult {
        let (text, offset) = self.block_text_at(range)?;
        let n = word_offset_backward(&text, offset).max(1);
        self.delete_backward_at_range(range, n, options)
    }

    /// Deletes back to the start of the block; at the start it joins the
    /// previous block.
    pub fn delete_line_backward_at_range(&mut self, range: &Range, options: ChangeOptions) -> EditResult {
        let (_, offset) = self.block_text_at(range)?;
        self.delete_backward_at_range(range, offset.max(1), options)
    }

    /// Deletes `n` characters before a caret, or the range itself when
    /// expanded. Voids next to the caret are removed whole.
    pub fn delete_backward_at_range(
        &mut self,
        range: &Range,
        n: usize,
        options: ChangeOptions,
    ) -> EditResult {
        let range = self.resolve(range)?;
        if range.is_expanded() {
            return self.delete_at_range(&range, options);
        }
        log_range("delete_backward_at_range", &range);

        let document = self.document();
        let start_key = range.start_key();
        let block = document.get_closest_block(start_key);
        if let Some(block) = block {
            if block.is_void() {
                return self.remove_node_by_key(block.key(), options);
            }
            if block.is_empty() && document.nodes().len() != 1 {
                return self.remove_node_by_key(block.key(), options);
            }
        }
        if let Some(inline) = document.get_closest_inline(start_key)
            && inline.is_void()
        {
            return self.remove_node_by_key(inline.key(), options);
        }
        if range.is_at_start_of(&document) {
            return Ok(());
        }

        let text = document.assert_text(start_key)?;
        if range.start_offset() == 0
            && let Some(previous) = document.get_previous_text(start_key)
        {
            let previous_block = document.get_closest_block(previous.key());
            if let Some(void) = previous_block.filter(|block| block.is_void()) {
                return self.remove_node_by_key(void.key(), options);
            }
            if let Some(void) = document
                .get_closest_inline(previous.key())
                .filter(|inline| inline.is_void())
            {
                return self.remove_node_by_key(void.key(), options);
            }
            let crosses_block = previous_block.map(Node::key) != block.map(Node::key);
            if n == 1 && crosses_block {
                let merged = range.clone().with_anchor(previous.key(), previous.len());
                return self.delete_at_range(&merged, options);
            }
        }

        let focus_offset = range.focus_offset;
        if n < focus_offset {
            let expanded = range
                .clone()
                .with_focus(text.key(), focus_offset - n)
                .with_backward(true);
            return self.delete_at_range(&expanded, options);
        }

        let mut node = text;
        let mut offset = 0;
        let mut traversed = focus_offset;
        while n > traversed {
            let Some(previous) = document.get_previous_text(node.key()) else {
                break;
            };
            node = previous;
            let next = traversed + node.len();
            if n <= next {
                offset = next - n;
                break;
            }
            traversed = next;
        }
        if let Some(void) = document.get_closest_void(node.key())
            && let Some(after) = document.get_next_text(void.key())
        {
            node = after;
            offset = 0;
        }

        let expanded = range
            .clone()
            .with_focus(node.key(), offset)
            .with_backward(true);
        self.delete_at_range(&expanded, options)
    }

    pub fn delete_char_forward_at_range(&mut self, range: &Range, options: ChangeOptions) -> EditResult {
        self.delete_forward_at_range(range, 1, options)
    }

    pub fn delete_word_forward_at_range(&mut self, range: &Range, options: ChangeOptions) -> EditResult {
        let (text, offset) = self.block_text_at(range)?;
        let n = word_offset_forward(&text, offset).max(1);
        self.delete_forward_at_range(range, n, options)
    }

    /// Deletes to the end of the block; at the end it joins the next block.
    pub fn delete_line_forward_at_range(&mut self, range: &Range, options: ChangeOptions) -> EditResult {
        let (text, offset) = self.block_text_at(range)?;
        let remaining = crate::string::char_count(&text).saturating_sub(offset);
        self.delete_forward_at_range(range, remaining.max(1), options)
    }

    /// Mirror of [`Change::delete_backward_at_range`].
    pub fn delete_forward_at_range(
        &mut self,
        range: &Range,
        n: usize,
        options: ChangeOptions,
    ) -> EditResult {
        let range = self.resolve(range)?;
        if range.is_expanded() {
            return self.delete_at_range(&range, options);
        }
        log_range("delete_forward_at_range", &range);

        let document = self.document();
        let start_key = range.start_key();
        let block = document.get_closest_block(start_key);
        if let Some(block) = block {
            if block.is_void() {
                return self.remove_node_by_key(block.key(), options);
            }
            if block.is_empty() && document.nodes().len() != 1 {
                return self.remove_node_by_key(block.key(), options);
            }
        }
        if let Some(inline) = document.get_closest_inline(start_key)
            && inline.is_void()
        {
            return self.remove_node_by_key(inline.key(), options);
        }
        if range.is_at_end_of(&document) {
            return Ok(());
        }

        let text = document.assert_text(start_key)?;
        if range.start_offset() == text.len()
            && let Some(next) = document.get_next_text(start_key)
        {
            let next_block = document.get_closest_block(next.key());
            if let Some(void) = next_block.filter(|block| block.is_void()) {
                return self.remove_node_by_key(void.key(), options);
            }
            if let Some(void) = document
                .get_closest_inline(next.key())
                .filter(|inline| inline.is_void())
            {
                return self.remove_node_by_key(void.key(), options);
            }
            let crosses_block = next_block.map(Node::key) != block.map(Node::key);
            if n == 1 && crosses_block {
                let merged = range.clone().with_focus(next.key(), 0);
                return self.delete_at_range(&merged, options);
            }
        }

        let focus_offset = range.focus_offset;
        if n <= text.len() - focus_offset {
            let expanded = range.clone().with_focus(text.key(), focus_offset + n);
            return self.delete_at_range(&expanded, options);
        }

        let mut node = text;
        let mut offset = text.len();
        let mut traversed = text.len() - focus_offset;
        while n > traversed {
            let Some(next) = document.get_next_text(node.key()) else {
                break;
            };
            node = next;
            offset = node.len();
            let reached = traversed + node.len();
            if n <= reached {
                offset = n - traversed;
                break;
            }
            traversed = reached;
        }
        if let Some(void) = document.get_closest_void(node.key())
            && let Some(before) = document.get_previous_text(void.key())
        {
            node = before;
            offset = before.len();
        }

        let expanded = range.clone().with_focus(node.key(), offset);
        self.delete_at_range(&expanded, options)
    }

    /// Inserts `block` at the range: around a void, in place of an empty
    /// block, before or after the block at its edges, or after splitting it.
    pub fn insert_block_at_range(
        &mut self,
        range: &Range,
        block: impl Into<BlockInput>,
        options: ChangeOptions,
    ) -> EditResult {
        let block = normalize::block(block, self.key_generator())?;
        let mut range = self.resolve(range)?;
        if range.is_expanded() {
            self.delete_at_range(&range, options)?;
            range = range.collapse_to_start();
        }
        log_range("insert_block_at_range", &range);

        let document = self.document();
        let start_key = range.start_key();
        let start_block = document
            .get_closest_block(start_key)
            .ok_or_else(|| EditError::NodeNotFound(start_key.to_string()))?;
        let parent = document
            .get_parent(start_block.key())
            .ok_or_else(|| EditError::NodeNotFound(start_block.key().to_string()))?;
        let parent_key = parent.key().to_string();
        let index = index_in(parent, start_block.key())?;
        let block: Node = block.into();

        if start_block.is_void() {
            let extra = usize::from(range.is_at_end_of(start_block));
            self.insert_node_by_key(&parent_key, index + extra, block, WITHOUT)?;
        } else if start_block.is_empty() {
            self.remove_node_by_key(start_block.key(), WITHOUT)?;
            self.insert_node_by_key(&parent_key, index, block, WITHOUT)?;
        } else if range.is_at_start_of(start_block) {
            self.insert_node_by_key(&parent_key, index, block, WITHOUT)?;
        } else if range.is_at_end_of(start_block) {
            self.insert_node_by_key(&parent_key, index + 1, block, WITHOUT)?;
        } else {
            self.split_descendants_by_key(start_block.key(), start_key, range.start_offset(), WITHOUT)?;
            self.insert_node_by_key(&parent_key, index + 1, block, WITHOUT)?;
        }

        if options.normalize {
            self.normalize_node_by_key(&parent_key)?;
        }
        Ok(())
    }

    /// Pastes `fragment` at the range. Keys are regenerated first so the
    /// fragment can be inserted more than once.
    pub fn insert_fragment_at_range(
        &mut self,
        range: &Range,
        fragment: Document,
        options: ChangeOptions,
    ) -> EditResult {
        let mut range = self.resolve(range)?;
        if fragment.nodes().is_empty() {
            if range.is_expanded() {
                return self.delete_at_range(&range, options);
            }
            return Ok(());
        }
        let fragment = Node::from(fragment);
        if fragment.get_blocks().is_empty() {
            return Err(EditError::invalid("fragment", "a fragment must hold blocks"));
        }
        if range.is_expanded() {
            self.delete_at_range(&range, WITHOUT)?;
            range = range.collapse_to_start();
        }
        log_range("insert_fragment_at_range", &range);
        let fragment = fragment.regenerate_keys(self.key_generator());

        let document = self.document();
        let start_key = range.start_key().to_string();
        let start_offset = clamp_offset(&document, &start_key, range.start_offset());
        let start_block = document
            .get_closest_block(&start_key)
            .ok_or_else(|| EditError::NodeNotFound(start_key.clone()))?;
        let start_block_key = start_block.key().to_string();
        let start_child_key = furthest_under(start_block, &start_key)?.key().to_string();
        let is_at_start = range.is_at_start_of(start_block);
        let parent = document
            .get_parent(&start_block_key)
            .ok_or_else(|| EditError::NodeNotFound(start_block_key.clone()))?;
        let parent_key = parent.key().to_string();
        let index = index_in(parent, &start_block_key)?;

        let blocks = fragment.get_blocks();
        let (Some(&first_block), Some(&last_block)) = (blocks.first(), blocks.last()) else {
            return Err(EditError::invalid("fragment", "a fragment must hold blocks"));
        };
        let is_multi_block = first_block.key() != last_block.key();
        if !is_multi_block && first_block.is_void() {
            return self.insert_block_at_range(&range, first_block.clone(), options);
        }

        if is_multi_block {
            let lonely = fragment
                .get_furthest_only_child_ancestor(first_block.key())
                .unwrap_or(first_block);
            let rest = without_descendant(&fragment, lonely.key());
            for (i, node) in rest.nodes().iter().enumerate() {
                self.insert_node_by_key(&parent_key, index + 1 + i, node.clone(), WITHOUT)?;
            }
        }

        if start_offset != 0 {
            self.split_descendants_by_key(&start_child_key, &start_key, start_offset, WITHOUT)?;
        }

        let document = self.document();
        let start_block = document.assert_node(&start_block_key)?;
        let start_child = furthest_under(start_block, &start_key)?;

        if is_multi_block {
            let next_child = if is_at_start {
                Some(start_child.key())
            } else {
                start_block
                    .get_next_sibling(start_child.key())
                    .map(Node::key)
            };
            let trailing: Vec<Key> = match next_child {
                Some(next) => start_block
                    .nodes()
                    .iter()
                    .skip_while(|node| node.key() != next)
                    .map(|node| node.key().to_string())
                    .collect(),
                None => Vec::new(),
            };
            let base = last_block.nodes().len();
            for (i, key) in trailing.iter().enumerate() {
                self.move_node_by_key(key, last_block.key(), base + i, WITHOUT)?;
            }
        }

        if start_block.is_empty() {
            self.remove_node_by_key(&start_block_key, WITHOUT)?;
            self.insert_node_by_key(&parent_key, index, first_block.clone(), WITHOUT)?;
        } else {
            let inline_index = index_in(start_block, start_child.key())?;
            let shift = usize::from(start_offset != 0);
            for (i, inline) in first_block.nodes().iter().enumerate() {
                self.insert_node_by_key(&start_block_key, inline_index + i + shift, inline.clone(), WITHOUT)?;
            }
        }

        if options.normalize {
            self.normalize_node_by_key(&parent_key)?;
        }
        Ok(())
    }

    /// Splits the text at the caret and inserts `inline` after the left half.
    pub fn insert_inline_at_range(
        &mut self,
        range: &Range,
        inline: impl Into<InlineInput>,
        options: ChangeOptions,
    ) -> EditResult {
        let inline = normalize::inline(inline, self.key_generator())?;
        let mut range = self.resolve(range)?;
        if range.is_expanded() {
            self.delete_at_range(&range, WITHOUT)?;
            range = range.collapse_to_start();
        }
        log_range("insert_inline_at_range", &range);

        let document = self.document();
        let start_key = range.start_key();
        document.assert_text(start_key)?;
        let parent = document
            .get_parent(start_key)
            .ok_or_else(|| EditError::NodeNotFound(start_key.to_string()))?;
        if parent.is_void() {
            return Ok(());
        }
        let parent_key = parent.key().to_string();
        let index = index_in(parent, start_key)?;

        self.split_node_by_key(start_key, range.start_offset(), WITHOUT)?;
        self.insert_node_by_key(&parent_key, index + 1, inline.into(), WITHOUT)?;
        if options.normalize {
            self.normalize_node_by_key(&parent_key)?;
        }
        Ok(())
    }

    /// Inserts `text` at the range start, deleting an expanded range first.
    ///
    /// Marks default to the range's pending marks, then to the marks of the
    /// character before the caret. A collapsed insertion is never normalized,
    /// an expanded one always is, whatever `options` says.
    pub fn insert_text_at_range(
        &mut self,
        range: &Range,
        text: &str,
        marks: impl Into<MarksInput>,
        options: ChangeOptions,
    ) -> EditResult {
        let marks = normalize::marks(marks)?;
        let range = self.resolve(range)?;
        let document = self.document();
        let start_key = range.start_key();
        let parent = document
            .get_parent(start_key)
            .ok_or_else(|| EditError::NodeNotFound(start_key.to_string()))?;
        if parent.is_void() {
            return Ok(());
        }
        log_range("insert_text_at_range", &range);
        if range.is_expanded() {
            self.delete_at_range(&range, WITHOUT)?;
        }
        if !options.normalize && range.is_expanded() {
            debug!("normalizing an expanded insertion despite normalize = false");
        }
        let options = ChangeOptions {
            normalize: range.is_expanded(),
        };
        let marks = marks.or_else(|| range.marks.clone());
        self.insert_text_by_key(start_key, range.start_offset(), text, marks, options)
    }

    pub fn set_block_at_range(
        &mut self,
        range: &Range,
        properties: impl Into<PropertiesInput>,
        options: ChangeOptions,
    ) -> EditResult {
        let properties = normalize::node_properties(properties)?;
        let range = self.resolve(range)?;
        log_range("set_block_at_range", &range);
        let keys = node_keys(self.value.document.get_blocks_at_range(&range));
        for key in keys {
            self.set_node_by_key(&key, properties.clone(), options)?;
        }
        Ok(())
    }

    pub fn set_inline_at_range(
        &mut self,
        range: &Range,
        properties: impl Into<PropertiesInput>,
        options: ChangeOptions,
    ) -> EditResult {
        let properties = normalize::node_properties(properties)?;
        let range = self.resolve(range)?;
        log_range("set_inline_at_range", &range);
        let keys = node_keys(self.value.document.get_inlines_at_range(&range));
        for key in keys {
            self.set_node_by_key(&key, properties.clone(), options)?;
        }
        Ok(())
    }

    /// Splits up to `height` block ancestors of the caret.
    pub fn split_block_at_range(
        &mut self,
        range: &Range,
        height: usize,
        options: ChangeOptions,
    ) -> EditResult {
        self.split_at_range(range, height, NodeKind::Block, options)
    }

    /// Splits up to `height` inline ancestors of the caret; pass
    /// `usize::MAX` for all of them.
    pub fn split_inline_at_range(
        &mut self,
        range: &Range,
        height: usize,
        options: ChangeOptions,
    ) -> EditResult {
        self.split_at_range(range, height, NodeKind::Inline, options)
    }

    fn split_at_range(
        &mut self,
        range: &Range,
        height: usize,
        kind: NodeKind,
        options: ChangeOptions,
    ) -> EditResult {
        let mut range = self.resolve(range)?;
        if range.is_expanded() {
            self.delete_at_range(&range, options)?;
            range = range.collapse_to_start();
        }
        log_range("split_at_range", &range);

        let document = self.document();
        let start_key = range.start_key();
        let mut node = document.assert_descendant(start_key)?;
        let mut level = 0;
        while level < height
            && let Some(parent) = document.get_closest(node.key(), |node| node.kind() == kind)
        {
            node = parent;
            level += 1;
        }
        let offset = clamp_offset(&document, start_key, range.start_offset());
        self.split_descendants_by_key(node.key(), start_key, offset, options)?;
        Ok(())
    }

    /// Lifts the covered blocks out of matching wrapper blocks.
    pub fn unwrap_block_at_range(
        &mut self,
        range: &Range,
        properties: impl Into<PropertiesInput>,
        options: ChangeOptions,
    ) -> EditResult {
        let properties = normalize::node_properties(properties)?;
        self.unwrap_at_range(range, &properties, NodeKind::Block, options)
    }

    /// Lifts the covered content out of matching wrapper inlines.
    pub fn unwrap_inline_at_range(
        &mut self,
        range: &Range,
        properties: impl Into<PropertiesInput>,
        options: ChangeOptions,
    ) -> EditResult {
        let properties = normalize::node_properties(properties)?;
        self.unwrap_at_range(range, &properties, NodeKind::Inline, options)
    }

    fn unwrap_at_range(
        &mut self,
        range: &Range,
        properties: &NodeProperties,
        kind: NodeKind,
        options: ChangeOptions,
    ) -> EditResult {
        let range = self.resolve(range)?;
        log_range("unwrap_at_range", &range);
        let document = self.document();
        let covered: Vec<Key> = match kind {
            NodeKind::Block => node_keys(document.get_blocks_at_range(&range)),
            _ => document
                .get_texts_at_range(&range)
                .into_iter()
                .map(|text| text.key().to_string())
                .collect(),
        };
        let mut wrappers: Vec<Key> = Vec::new();
        for key in &covered {
            if let Some(wrapper) =
                document.get_closest(key, |node| node.kind() == kind && properties.matches(node))
                && !wrappers.iter().any(|seen| seen == wrapper.key())
            {
                wrappers.push(wrapper.key().to_string());
            }
        }

        for wrapper_key in &wrappers {
            let document = self.document();
            let Some(wrapper) = document.get_node(wrapper_key) else {
                continue;
            };
            let parent = document
                .get_parent(wrapper_key)
                .ok_or_else(|| EditError::NodeNotFound(wrapper_key.clone()))?;
            let parent_key = parent.key().to_string();
            let index = index_in(parent, wrapper_key)?;
            let children = wrapper.nodes();
            let matched: Vec<usize> = children
                .iter()
                .enumerate()
                .filter(|(_, child)| {
                    covered
                        .iter()
                        .any(|key| child.key() == key || child.has_descendant(key))
                })
                .map(|(i, _)| i)
                .collect();
            let (Some(&first_match), Some(&last_match)) = (matched.first(), matched.last()) else {
                continue;
            };
            let keys = node_keys(children.iter());
            let last = children.len() - 1;

            if first_match == 0 && last_match == last {
                for (i, key) in keys.iter().enumerate() {
                    self.move_node_by_key(key, &parent_key, index + i, WITHOUT)?;
                }
                self.remove_node_by_key(wrapper_key, WITHOUT)?;
            } else if last_match == last {
                for (i, key) in keys[first_match..].iter().enumerate() {
                    self.move_node_by_key(key, &parent_key, index + 1 + i, WITHOUT)?;
                }
            } else if first_match == 0 {
                for (i, key) in keys[..=last_match].iter().enumerate() {
                    self.move_node_by_key(key, &parent_key, index + i, WITHOUT)?;
                }
            } else {
                self.split_node_by_key(wrapper_key, first_match, WITHOUT)?;
                for (i, key) in keys[first_match..=last_match].iter().enumerate() {
                    self.move_node_by_key(key, &parent_key, index + 1 + i, WITHOUT)?;
                }
            }
        }

        if options.normalize {
            self.normalize_document()?;
        }
        Ok(())
    }

    /// Wraps the covered sibling blocks under their common ancestor in `block`.
    pub fn wrap_block_at_range(
        &mut self,
        range: &Range,
        block: impl Into<BlockInput>,
        options: ChangeOptions,
    ) -> EditResult {
        let block = normalize::block(block, self.key_generator())?.without_nodes();
        let range = self.resolve(range)?;
        log_range("wrap_block_at_range", &range);

        let document = self.document();
        let blocks = document.get_blocks_at_range(&range);
        let (Some(first), Some(last)) = (blocks.first(), blocks.last()) else {
            return Ok(());
        };
        let parent = if first.key() == last.key() {
            document
                .get_parent(first.key())
                .ok_or_else(|| EditError::NodeNotFound(first.key().to_string()))?
        } else {
            document.get_common_ancestor(first.key(), last.key())?
        };
        let parent_key = parent.key().to_string();
        let from = index_under(parent, first.key())?;
        let to = index_under(parent, last.key())?;
        let siblings = node_keys(parent.nodes()[from..=to].iter());

        let wrapper_key = block.key().to_string();
        self.insert_node_by_key(&parent_key, from, block.into(), WITHOUT)?;
        for (i, key) in siblings.iter().enumerate() {
            self.move_node_by_key(key, &wrapper_key, i, WITHOUT)?;
        }
        if options.normalize {
            self.normalize_node_by_key(&parent_key)?;
        }
        Ok(())
    }

    /// Wraps the covered text and inlines in copies of `inline`, one per
    /// touched block. A collapsed range only wraps a void inline at the caret.
    pub fn wrap_inline_at_range(
        &mut self,
        range: &Range,
        inline: impl Into<InlineInput>,
        options: ChangeOptions,
    ) -> EditResult {
        let inline = normalize::inline(inline, self.key_generator())?.without_nodes();
        let range = self.resolve(range)?;
        log_range("wrap_inline_at_range", &range);
        let document = self.document();

        if range.is_collapsed() {
            return match document.get_closest_inline(range.start_key()) {
                Some(void) if void.is_void() => self.wrap_inline_by_key(void.key(), inline, options),
                _ => Ok(()),
            };
        }

        let start_key = range.start_key();
        let end_key = range.end_key();
        let blocks = node_keys(document.get_blocks_at_range(&range));
        let start_block = closest_block_key(&document, start_key)?;
        let end_block = closest_block_key(&document, end_key)?;
        let start_child = furthest_under(document.assert_node(&start_block)?, start_key)?;
        let end_child = furthest_under(document.assert_node(&end_block)?, end_key)?;
        let start_offset = clamp_offset(&document, start_key, range.start_offset());
        let end_offset = clamp_offset(&document, end_key, range.end_offset());
        self.split_descendants_by_key(end_child.key(), end_key, end_offset, WITHOUT)?;
        self.split_descendants_by_key(start_child.key(), start_key, start_offset, WITHOUT)?;

        let document = self.document();
        if start_block == end_block {
            let block = document.assert_node(&start_block)?;
            let start_inner = index_under(block, start_key)? + 1;
            let end_inner = if start_key == end_key {
                start_inner
            } else {
                index_under(block, end_key)?
            };
            let covered = node_keys(block.nodes()[start_inner..=end_inner].iter());
            let wrapper_key = self.generate_key();
            let wrapper = inline.with_key(wrapper_key.clone());
            self.insert_node_by_key(&start_block, start_inner, wrapper.into(), WITHOUT)?;
            for (i, key) in covered.iter().enumerate() {
                self.move_node_by_key(key, &wrapper_key, i, WITHOUT)?;
            }
            if options.normalize {
                self.normalize_node_by_key(&start_block)?;
            }
            return Ok(());
        }

        let start_node = document.assert_node(&start_block)?;
        let end_node = document.assert_node(&end_block)?;
        let start_index = index_under(start_node, start_key)?;
        let end_index = index_under(end_node, end_key)?;
        let trailing = node_keys(start_node.nodes()[start_index + 1..].iter());
        let leading = node_keys(end_node.nodes()[..=end_index].iter());

        let start_wrapper = self.generate_key();
        self.insert_node_by_key(
            &start_block,
            start_index + 1,
            inline.clone().with_key(start_wrapper.clone()).into(),
            WITHOUT,
        )?;
        for (i, key) in trailing.iter().enumerate() {
            self.move_node_by_key(key, &start_wrapper, i, WITHOUT)?;
        }
        let end_wrapper = self.generate_key();
        self.insert_node_by_key(&end_block, 0, inline.clone().with_key(end_wrapper.clone()).into(), WITHOUT)?;
        for (i, key) in leading.iter().enumerate() {
            self.move_node_by_key(key, &end_wrapper, i, WITHOUT)?;
        }

        let middles: Vec<&Key> = blocks
            .iter()
            .filter(|key| **key != start_block && **key != end_block)
            .collect();
        for block_key in &middles {
            let document = self.document();
            let block = document.assert_node(block_key)?;
            if block.is_void() {
                continue;
            }
            let children = node_keys(block.nodes().iter());
            let wrapper_key = self.generate_key();
            self.insert_node_by_key(block_key, 0, inline.clone().with_key(wrapper_key.clone()).into(), WITHOUT)?;
            for (i, key) in children.iter().enumerate() {
                self.move_node_by_key(key, &wrapper_key, i, WITHOUT)?;
            }
        }

        if options.normalize {
            self.normalize_node_by_key(&start_block)?;
            self.normalize_node_by_key(&end_block)?;
            for block_key in middles {
                self.normalize_node_by_key(block_key)?;
            }
        }
        Ok(())
    }

    /// Surrounds the range with `prefix` and `suffix`, inserted without marks.
    pub fn wrap_text_at_range(
        &mut self,
        range: &Range,
        prefix: &str,
        suffix: &str,
        options: ChangeOptions,
    ) -> EditResult {
        let range = self.resolve(range)?;
        log_range("wrap_text_at_range", &range);
        let start = range.collapse_to_start();
        let mut end = range.collapse_to_end();
        if range.start_key() == range.end_key() {
            end = end.move_offsets(crate::string::char_count(prefix) as isize);
        }
        self.insert_text_at_range(&start, prefix, MarkSet::new(), options)?;
        self.insert_text_at_range(&end, suffix, MarkSet::new(), options)
    }

    fn normalize_if(&mut self, key: &str, options: ChangeOptions) -> EditResult {
        if options.normalize {
            self.normalize_node_by_key(key)?;
        }
        Ok(())
    }

    pub(crate) fn resolve(&self, range: &Range) -> Result<Range, EditError> {
        range.clone().normalize(&self.value.document)
    }

    /// Text of the closest block of the range start, and the start's
    /// character offset into it.
    fn block_text_at(&self, range: &Range) -> Result<(String, usize), EditError> {
        let range = self.resolve(range)?;
        let start_key = range.start_key();
        let block = self
            .value
            .document
            .get_closest_block(start_key)
            .ok_or_else(|| EditError::NodeNotFound(start_key.to_string()))?;
        let offset = block.get_offset(start_key)? + range.start_offset();
        Ok((block.text(), offset))
    }
}

fn log_range(operation: &'static str, range: &Range) {
    debug!(
        operation,
        start_key = range.start_key(),
        start_offset = range.start_offset(),
        end_key = range.end_key(),
        end_offset = range.end_offset(),
        "range edit"
    );
}

/// `(key, offset, length)` for every text the range covers, clipped at the
/// edges. Spans are disjoint, in document order, and never empty.
fn mark_spans(document: &Node, range: &Range) -> Vec<(Key, usize, usize)> {
    document
        .get_texts_at_range(range)
        .into_iter()
        .filter_map(|text| {
            let len = text.len();
            let end = if text.key() == range.end_key() {
                range.end_offset().min(len)
            } else {
                len
            };
            let start = if text.key() == range.start_key() {
                range.start_offset().min(end)
            } else {
                0
            };
            (end > start).then(|| (text.key().to_string(), start, end - start))
        })
        .collect()
}

/// The child of `ancestor` that is, or contains, `key`.
fn furthest_under<'a>(ancestor: &'a Node, key: &str) -> Result<&'a Node, EditError> {
    if ancestor.key() == key {
        return Ok(ancestor);
    }
    ancestor
        .get_furthest_ancestor(key)
        .ok_or_else(|| EditError::NodeNotFound(key.to_string()))
}

fn index_under(ancestor: &Node, key: &str) -> Result<usize, EditError> {
    let child = furthest_under(ancestor, key)?;
    index_in(ancestor, child.key())
}

fn index_in(parent: &Node, key: &str) -> Result<usize, EditError> {
    parent
        .index_of(key)
        .ok_or_else(|| EditError::NodeNotFound(key.to_string()))
}

fn closest_block_key(document: &Node, key: &str) -> Result<Key, EditError> {
    document
        .get_closest_block(key)
        .map(|block| block.key().to_string())
        .ok_or_else(|| EditError::NodeNotFound(key.to_string()))
}

fn first_text_key(node: &Node) -> Key {
    node.get_first_text()
        .map_or(node.key(), |text| text.key())
        .to_string()
}

/// Void placeholders accept offset 1 in a selection but hold no characters.
fn clamp_offset(document: &Node, key: &str, offset: usize) -> usize {
    document
        .get_node(key)
        .and_then(Node::as_text)
        .map_or(offset, |text| offset.min(text.len()))
}

fn node_keys<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Vec<Key> {
    nodes.into_iter().map(|node| node.key().to_string()).collect()
}

fn without_descendant(node: &Node, key: &str) -> Node {
    let nodes = node
        .nodes()
        .iter()
        .filter(|child| child.key() != key)
        .map(|child| without_descendant(child, key))
        .collect();
    node.with_children(nodes)
}
