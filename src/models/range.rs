//! Anchor/focus selections and their coordinate algebra.
//!
//! A range is plain data; nothing here consults a document except
//! [`Range::normalize`] and the `*_of` helpers that take the node they
//! describe.

use super::{Key, MarkSet, Node};
use crate::error::EditError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    pub anchor_key: Key,
    pub anchor_offset: usize,
    pub focus_key: Key,
    pub focus_offset: usize,
    #[serde(default)]
    pub is_backward: bool,
    #[serde(default)]
    pub is_focused: bool,
    /// Pending marks for the next insertion at a collapsed caret.
    #[serde(default)]
    pub marks: Option<MarkSet>,
}

impl Range {
    /// A forward range; call [`Range::normalize`] to derive the real direction.
    pub fn new(
        anchor_key: impl Into<Key>,
        anchor_offset: usize,
        focus_key: impl Into<Key>,
        focus_offset: usize,
    ) -> Self {
        Self {
            anchor_key: anchor_key.into(),
            anchor_offset,
            focus_key: focus_key.into(),
            focus_offset,
            is_backward: false,
            is_focused: false,
            marks: None,
        }
    }

    pub fn collapsed(key: impl Into<Key>, offset: usize) -> Self {
        let key = key.into();
        Self::new(key.clone(), offset, key, offset)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor_key == self.focus_key && self.anchor_offset == self.focus_offset
    }

    pub fn is_expanded(&self) -> bool {
        !self.is_collapsed()
    }

    pub fn is_forward(&self) -> bool {
        !self.is_backward
    }

    pub fn start_key(&self) -> &str {
        if self.is_backward {
            &self.focus_key
        } else {
            &self.anchor_key
        }
    }

    pub fn start_offset(&self) -> usize {
        if self.is_backward {
            self.focus_offset
        } else {
            self.anchor_offset
        }
    }

    pub fn end_key(&self) -> &str {
        if self.is_backward {
            &self.anchor_key
        } else {
            &self.focus_key
        }
    }

    pub fn end_offset(&self) -> usize {
        if self.is_backward {
            self.anchor_offset
        } else {
            self.focus_offset
        }
    }

    pub fn with_anchor(mut self, key: impl Into<Key>, offset: usize) -> Self {
        self.anchor_key = key.into();
        self.anchor_offset = offset;
        self
    }

    pub fn with_focus(mut self, key: impl Into<Key>, offset: usize) -> Self {
        self.focus_key = key.into();
        self.focus_offset = offset;
        self
    }

    pub fn with_backward(mut self, is_backward: bool) -> Self {
        self.is_backward = is_backward;
        self
    }

    pub fn with_focused(mut self, is_focused: bool) -> Self {
        self.is_focused = is_focused;
        self
    }

    pub fn with_marks(mut self, marks: Option<MarkSet>) -> Self {
        self.marks = marks;
        self
    }

    pub fn collapse_to_anchor(&self) -> Range {
        let mut range = self.clone();
        range.focus_key = range.anchor_key.clone();
        range.focus_offset = range.anchor_offset;
        range.is_backward = false;
        range
    }

    pub fn collapse_to_focus(&self) -> Range {
        let mut range = self.clone();
        range.anchor_key = range.focus_key.clone();
        range.anchor_offset = range.focus_offset;
        range.is_backward = false;
        range
    }

    pub fn collapse_to_start(&self) -> Range {
        if self.is_backward {
            self.collapse_to_focus()
        } else {
            self.collapse_to_anchor()
        }
    }

    pub fn collapse_to_end(&self) -> Range {
        if self.is_backward {
            self.collapse_to_anchor()
        } else {
            self.collapse_to_focus()
        }
    }

    /// Caret at offset 0 of the node's first text.
    pub fn collapse_to_start_of(&self, node: &Node) -> Range {
        let key = node
            .get_first_text()
            .map_or(node.key(), |text| text.key())
            .to_string();
        self.collapsed_at(key, 0)
    }

    /// Caret at the node's end, just after it when it ends in a void.
    pub fn collapse_to_end_of(&self, node: &Node) -> Range {
        let key = node
            .get_last_text()
            .map_or(node.key(), |text| text.key())
            .to_string();
        self.collapsed_at(key, node.end_offset())
    }

    fn collapsed_at(&self, key: Key, offset: usize) -> Range {
        Range {
            anchor_key: key.clone(),
            anchor_offset: offset,
            focus_key: key,
            focus_offset: offset,
            is_backward: false,
            is_focused: self.is_focused,
            marks: self.marks.clone(),
        }
    }

    /// Shifts both points by `n` characters within their texts.
    pub fn move_offsets(&self, n: isize) -> Range {
        let mut range = self.clone();
        range.anchor_offset = range.anchor_offset.saturating_add_signed(n);
        range.focus_offset = range.focus_offset.saturating_add_signed(n);
        range
    }

    pub fn move_anchor(&self, n: isize) -> Range {
        let mut range = self.clone();
        range.anchor_offset = range.anchor_offset.saturating_add_signed(n);
        range
    }

    pub fn move_focus(&self, n: isize) -> Range {
        let mut range = self.clone();
        range.focus_offset = range.focus_offset.saturating_add_signed(n);
        range
    }

    pub fn move_start(&self, n: isize) -> Range {
        if self.is_backward {
            self.move_focus(n)
        } else {
            self.move_anchor(n)
        }
    }

    pub fn move_end(&self, n: isize) -> Range {
        if self.is_backward {
            self.move_anchor(n)
        } else {
            self.move_focus(n)
        }
    }

    /// Swaps anchor and focus; the covered span is unchanged.
    pub fn flip(&self) -> Range {
        Range {
            anchor_key: self.focus_key.clone(),
            anchor_offset: self.focus_offset,
            focus_key: self.anchor_key.clone(),
            focus_offset: self.anchor_offset,
            is_backward: !self.is_backward,
            is_focused: self.is_focused,
            marks: self.marks.clone(),
        }
    }

    pub fn is_at_start_of(&self, node: &Node) -> bool {
        self.is_collapsed()
            && self.start_offset() == 0
            && node
                .get_first_text()
                .is_some_and(|text| text.key() == self.start_key())
    }

    pub fn is_at_end_of(&self, node: &Node) -> bool {
        self.is_collapsed()
            && self.end_offset() == node.end_offset()
            && node
                .get_last_text()
                .is_some_and(|text| text.key() == self.end_key())
    }

    pub fn has_edge_at_start_of(&self, node: &Node) -> bool {
        let Some(first) = node.get_first_text() else {
            return false;
        };
        (self.anchor_key == first.key() && self.anchor_offset == 0)
            || (self.focus_key == first.key() && self.focus_offset == 0)
    }

    pub fn has_edge_at_end_of(&self, node: &Node) -> bool {
        let Some(last) = node.get_last_text() else {
            return false;
        };
        let end = node.end_offset();
        (self.anchor_key == last.key() && self.anchor_offset == end)
            || (self.focus_key == last.key() && self.focus_offset == end)
    }

    /// Resolves both points against `document` and recomputes the direction.
    ///
    /// A point addressed at a container is moved to the text that holds the
    /// container-relative offset. Offsets inside a void's placeholder may be
    /// 0 or 1.
    pub fn normalize(self, document: &Node) -> Result<Range, EditError> {
        let (anchor_key, anchor_offset) =
            resolve_point(document, &self.anchor_key, self.anchor_offset)?;
        let (focus_key, focus_offset) =
            resolve_point(document, &self.focus_key, self.focus_offset)?;
        let is_backward = if anchor_key == focus_key {
            anchor_offset > focus_offset
        } else {
            document.get_path(&anchor_key) > document.get_path(&focus_key)
        };
        Ok(Range {
            anchor_key,
            anchor_offset,
            focus_key,
            focus_offset,
            is_backward,
            ..self
        })
    }
}

fn resolve_point(document: &Node, key: &str, offset: usize) -> Result<(Key, usize), EditError> {
    let node = document
        .get_node(key)
        .ok_or_else(|| EditError::NodeNotFound(key.to_string()))?;
    let invalid = || EditError::InvalidOffset {
        key: key.to_string(),
        offset,
    };
    if let Some(text) = node.as_text() {
        let max = if document.has_void_parent(key) {
            text.len().max(1)
        } else {
            text.len()
        };
        return if offset <= max {
            Ok((key.to_string(), offset))
        } else {
            Err(invalid())
        };
    }
    let mut remaining = offset;
    for text in node.get_texts() {
        if remaining <= text.len() {
            return Ok((text.key().to_string(), remaining));
        }
        remaining -= text.len();
    }
    Err(invalid())
}
