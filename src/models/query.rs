//! Read-only document queries.
//!
//! Every query works on any node, so the same calls serve documents,
//! subtrees and fragments. Lookups are linear walks over the tree.

use super::{Character, Document, MarkSet, Node, Range, Text};
use crate::error::EditError;

type Bound<'p> = Option<(&'p [usize], usize)>;

impl Node {
    /// This node or a descendant with `key`.
    pub fn get_node(&self, key: &str) -> Option<&Node> {
        if self.key() == key {
            Some(self)
        } else {
            self.get_descendant(key)
        }
    }

    pub fn get_descendant(&self, key: &str) -> Option<&Node> {
        for child in self.nodes() {
            if child.key() == key {
                return Some(child);
            }
            if let Some(found) = child.get_descendant(key) {
                return Some(found);
            }
        }
        None
    }

    pub fn assert_descendant(&self, key: &str) -> Result<&Node, EditError> {
        self.get_descendant(key)
            .ok_or_else(|| EditError::NodeNotFound(key.to_string()))
    }

    pub fn assert_node(&self, key: &str) -> Result<&Node, EditError> {
        self.get_node(key)
            .ok_or_else(|| EditError::NodeNotFound(key.to_string()))
    }

    pub fn assert_text(&self, key: &str) -> Result<&Text, EditError> {
        self.assert_node(key)?
            .as_text()
            .ok_or_else(|| EditError::NotText(key.to_string()))
    }

    pub fn has_descendant(&self, key: &str) -> bool {
        self.get_descendant(key).is_some()
    }

    pub fn has_child(&self, key: &str) -> bool {
        self.index_of(key).is_some()
    }

    /// Position of the child `key` among this node's children.
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.nodes().iter().position(|child| child.key() == key)
    }

    /// Child indexes leading from this node to `key`; empty for the node itself.
    pub fn get_path(&self, key: &str) -> Option<Vec<usize>> {
        if self.key() == key {
            return Some(Vec::new());
        }
        let mut path = Vec::new();
        self.find_path(key, &mut path).then_some(path)
    }

    fn find_path(&self, key: &str, path: &mut Vec<usize>) -> bool {
        for (index, child) in self.nodes().iter().enumerate() {
            path.push(index);
            if child.key() == key || child.find_path(key, path) {
                return true;
            }
            path.pop();
        }
        false
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        path.iter()
            .try_fold(self, |node, &index| node.nodes().get(index))
    }

    /// Ancestors of `key`, outermost first. This node is included, `key` is not.
    pub fn get_ancestors(&self, key: &str) -> Option<Vec<&Node>> {
        let path = self.get_path(key)?;
        let mut ancestors = Vec::with_capacity(path.len());
        let mut node = self;
        for index in path {
            ancestors.push(node);
            node = node.nodes().get(index)?;
        }
        Some(ancestors)
    }

    pub fn get_parent(&self, key: &str) -> Option<&Node> {
        self.get_ancestors(key)?.pop()
    }

    /// Nearest ancestor of `key` matching `predicate`, never this node itself.
    pub fn get_closest(&self, key: &str, predicate: impl Fn(&Node) -> bool) -> Option<&Node> {
        self.get_ancestors(key)?
            .into_iter()
            .skip(1)
            .rev()
            .find(|node| predicate(node))
    }

    /// Outermost ancestor of `key` matching `predicate`, never this node itself.
    pub fn get_furthest(&self, key: &str, predicate: impl Fn(&Node) -> bool) -> Option<&Node> {
        self.get_ancestors(key)?
            .into_iter()
            .skip(1)
            .find(|node| predicate(node))
    }

    pub fn get_closest_block(&self, key: &str) -> Option<&Node> {
        self.get_closest(key, Node::is_block)
    }

    pub fn get_closest_inline(&self, key: &str) -> Option<&Node> {
        self.get_closest(key, Node::is_inline)
    }

    pub fn get_closest_void(&self, key: &str) -> Option<&Node> {
        self.get_closest(key, Node::is_void)
    }

    pub fn has_void_parent(&self, key: &str) -> bool {
        self.get_closest_void(key).is_some()
    }

    /// The child of this node that is, or contains, `key`.
    pub fn get_furthest_ancestor(&self, key: &str) -> Option<&Node> {
        let path = self.get_path(key)?;
        self.nodes().get(*path.first()?)
    }

    /// Deepest node strictly containing both keys. When either key is this
    /// node, this node is returned.
    pub fn get_common_ancestor(&self, one: &str, two: &str) -> Result<&Node, EditError> {
        if self.key() == one || self.key() == two {
            return Ok(self);
        }
        let first = self
            .get_path(one)
            .ok_or_else(|| EditError::NodeNotFound(one.to_string()))?;
        let second = self
            .get_path(two)
            .ok_or_else(|| EditError::NodeNotFound(two.to_string()))?;
        let first = &first[..first.len() - 1];
        let second = &second[..second.len() - 1];
        let shared = first
            .iter()
            .zip(second)
            .take_while(|(a, b)| a == b)
            .count();
        self.node_at(&first[..shared])
            .ok_or_else(|| EditError::NodeNotFound(one.to_string()))
    }

    /// Highest ancestor reachable from `key` through parents that each have
    /// exactly one child. Removing it removes `key` without leaving an empty
    /// container behind.
    pub fn get_furthest_only_child_ancestor(&self, key: &str) -> Option<&Node> {
        let ancestors = self.get_ancestors(key)?;
        let mut furthest = None;
        for ancestor in ancestors.into_iter().skip(1).rev() {
            if ancestor.nodes().len() != 1 {
                break;
            }
            furthest = Some(ancestor);
        }
        furthest
    }

    pub fn get_next_sibling(&self, key: &str) -> Option<&Node> {
        let parent = self.get_parent(key)?;
        let index = parent.index_of(key)?;
        parent.nodes().get(index + 1)
    }

    pub fn get_previous_sibling(&self, key: &str) -> Option<&Node> {
        let parent = self.get_parent(key)?;
        let index = parent.index_of(key)?;
        parent.nodes().get(index.checked_sub(1)?)
    }

    /// Every text node in document order.
    pub fn get_texts(&self) -> Vec<&Text> {
        let mut texts = Vec::new();
        self.collect_texts(&mut texts);
        texts
    }

    fn collect_texts<'a>(&'a self, out: &mut Vec<&'a Text>) {
        match self {
            Node::Text(text) => out.push(text),
            _ => {
                for child in self.nodes() {
                    child.collect_texts(out);
                }
            }
        }
    }

    pub fn get_first_text(&self) -> Option<&Text> {
        match self {
            Node::Text(text) => Some(text),
            _ => self.nodes().iter().find_map(Node::get_first_text),
        }
    }

    pub fn get_last_text(&self) -> Option<&Text> {
        match self {
            Node::Text(text) => Some(text),
            _ => self.nodes().iter().rev().find_map(Node::get_last_text),
        }
    }

    /// Text following `key` in document order. For a container, the text
    /// after its last text.
    pub fn get_next_text(&self, key: &str) -> Option<&Text> {
        let last = self.get_descendant(key)?.get_last_text()?.key();
        let texts = self.get_texts();
        let index = texts.iter().position(|text| text.key() == last)?;
        texts.get(index + 1).copied()
    }

    /// Text preceding `key` in document order. For a container, the text
    /// before its first text.
    pub fn get_previous_text(&self, key: &str) -> Option<&Text> {
        let first = self.get_descendant(key)?.get_first_text()?.key();
        let texts = self.get_texts();
        let index = texts.iter().position(|text| text.key() == first)?;
        texts.get(index.checked_sub(1)?).copied()
    }

    /// Leaf blocks (blocks not holding blocks) in document order.
    pub fn get_blocks(&self) -> Vec<&Node> {
        let mut blocks = Vec::new();
        self.collect_leaf_blocks(&mut blocks);
        blocks
    }

    fn collect_leaf_blocks<'a>(&'a self, out: &mut Vec<&'a Node>) {
        for child in self.nodes() {
            if !child.is_block() {
                continue;
            }
            if child.nodes().first().is_some_and(Node::is_block) {
                child.collect_leaf_blocks(out);
            } else {
                out.push(child);
            }
        }
    }

    pub fn get_next_block(&self, key: &str) -> Option<&Node> {
        let child = self.get_descendant(key)?;
        let last = if child.is_block() {
            child.get_last_text()?
        } else {
            self.get_closest_block(key)?.get_last_text()?
        };
        let next = self.get_next_text(last.key())?;
        self.get_closest_block(next.key())
    }

    /// Characters in this node before the descendant `key`.
    pub fn get_offset(&self, key: &str) -> Result<usize, EditError> {
        let child = self
            .get_furthest_ancestor(key)
            .ok_or_else(|| EditError::NodeNotFound(key.to_string()))?;
        let before: usize = self
            .nodes()
            .iter()
            .take_while(|node| node.key() != child.key())
            .map(Node::text_len)
            .sum();
        if child.key() == key {
            Ok(before)
        } else {
            Ok(before + child.get_offset(key)?)
        }
    }

    /// Texts from the range's start text through its end text.
    pub fn get_texts_at_range(&self, range: &Range) -> Vec<&Text> {
        let texts = self.get_texts();
        let start = texts.iter().position(|text| text.key() == range.start_key());
        let end = texts.iter().position(|text| text.key() == range.end_key());
        match (start, end) {
            (Some(start), Some(end)) if start <= end => texts[start..=end].to_vec(),
            _ => Vec::new(),
        }
    }

    pub fn get_characters_at_range(&self, range: &Range) -> Vec<&Character> {
        self.get_texts_at_range(range)
            .into_iter()
            .flat_map(|text| {
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
                text.characters()[start..end].iter()
            })
            .collect()
    }

    /// Closest block of every text in the range, de-duplicated, in order.
    pub fn get_blocks_at_range(&self, range: &Range) -> Vec<&Node> {
        let mut blocks: Vec<&Node> = Vec::new();
        for text in self.get_texts_at_range(range) {
            if let Some(block) = self.get_closest_block(text.key())
                && !blocks.iter().any(|seen| seen.key() == block.key())
            {
                blocks.push(block);
            }
        }
        blocks
    }

    /// Closest inline of every text in the range, de-duplicated, in order.
    pub fn get_inlines_at_range(&self, range: &Range) -> Vec<&Node> {
        let mut inlines: Vec<&Node> = Vec::new();
        for text in self.get_texts_at_range(range) {
            if let Some(inline) = self.get_closest_inline(text.key())
                && !inlines.iter().any(|seen| seen.key() == inline.key())
            {
                inlines.push(inline);
            }
        }
        inlines
    }

    /// Marks shared by every character in the range. A collapsed range reads
    /// the character just before the caret.
    pub fn get_active_marks_at_range(&self, range: &Range) -> MarkSet {
        if range.is_collapsed() {
            return self.marks_before(range.start_key(), range.start_offset());
        }
        let characters = self.get_characters_at_range(range);
        let Some((first, rest)) = characters.split_first() else {
            return MarkSet::new();
        };
        rest.iter()
            .fold(first.marks.clone(), |marks, character| {
                marks.intersection(&character.marks)
            })
    }

    /// Marks carried by any character in the range.
    pub fn get_marks_at_range(&self, range: &Range) -> MarkSet {
        if range.is_collapsed() {
            return self.marks_before(range.start_key(), range.start_offset());
        }
        self.get_characters_at_range(range)
            .into_iter()
            .fold(MarkSet::new(), |marks, character| marks.union(&character.marks))
    }

    fn marks_before(&self, key: &str, offset: usize) -> MarkSet {
        if offset == 0 {
            return self
                .get_previous_text(key)
                .and_then(|previous| previous.characters().last())
                .map(|character| character.marks.clone())
                .unwrap_or_default();
        }
        self.get_node(key)
            .and_then(Node::as_text)
            .map(|text| text.marks_at_index(offset))
            .unwrap_or_default()
    }

    /// Detached copy of exactly the content inside `range`. Partially
    /// covered nodes are clipped and keep their keys.
    pub fn get_fragment_at_range(&self, range: &Range) -> Document {
        let empty = || Document::new(self.key(), Vec::new());
        if range.is_collapsed() {
            return empty();
        }
        let (Some(start), Some(end)) = (
            self.get_path(range.start_key()),
            self.get_path(range.end_key()),
        ) else {
            return empty();
        };
        let clipped = clip(
            self,
            Some((&start, range.start_offset())),
            Some((&end, range.end_offset())),
        );
        Document::new(self.key(), clipped.nodes().to_vec())
    }
}

fn descend(bound: Bound<'_>) -> Option<(usize, Bound<'_>)> {
    let (path, offset) = bound?;
    let (first, rest) = path.split_first()?;
    Some((*first, Some((rest, offset))))
}

fn clip(node: &Node, start: Bound<'_>, end: Bound<'_>) -> Node {
    if let Node::Text(text) = node {
        let from = start.map_or(0, |(_, offset)| offset);
        let to = end.map_or(text.len(), |(_, offset)| offset);
        return Node::from(text.clipped(from, to));
    }
    let children = node.nodes();
    if children.is_empty() {
        return node.clone();
    }
    let start = descend(start);
    let end = descend(end);
    let first = start.map_or(0, |(index, _)| index);
    let last = end.map_or(children.len() - 1, |(index, _)| index);
    let mut nodes = Vec::new();
    for (index, child) in children.iter().enumerate().take(last + 1).skip(first) {
        let child_start = start.filter(|_| index == first).and_then(|(_, bound)| bound);
        let child_end = end.filter(|_| index == last).and_then(|(_, bound)| bound);
        if child_start.is_none() && child_end.is_none() {
            nodes.push(child.clone());
        } else {
            nodes.push(clip(child, child_start, child_end));
        }
    }
    node.with_children(nodes)
}
