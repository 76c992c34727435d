//! Edits applied to the current selection.
//!
//! Each method forwards to its `*_at_range` counterpart with default options
//! and then places the caret where an editor user expects it. All of them
//! fail with [`EditError::NoSelection`] when nothing is selected.

use super::{Change, ChangeOptions};
use crate::error::{EditError, EditResult};
use crate::models::{Document, Node, Range};
use crate::normalize::{self, BlockInput, InlineInput, MarkInput, MarksInput, PropertiesInput};
use crate::string::char_count;
use std::collections::HashSet;

impl Change {
    /// Adds `mark` to the selected text. At a caret it becomes a pending
    /// mark for the next insertion instead.
    pub fn add_mark(&mut self, mark: impl Into<MarkInput>) -> EditResult {
        let mark = normalize::mark(mark)?;
        let selection = self.current_selection()?;
        if selection.is_expanded() {
            return self.add_mark_at_range(&selection, mark, ChangeOptions::default());
        }
        let marks = selection
            .marks
            .clone()
            .unwrap_or_else(|| self.value.document.get_active_marks_at_range(&selection));
        self.set_pending_marks(Some(marks.with(mark)))
    }

    pub fn remove_mark(&mut self, mark: impl Into<MarkInput>) -> EditResult {
        let mark = normalize::mark(mark)?;
        let selection = self.current_selection()?;
        if selection.is_expanded() {
            return self.remove_mark_at_range(&selection, mark, ChangeOptions::default());
        }
        let marks = selection
            .marks
            .clone()
            .unwrap_or_else(|| self.value.document.get_active_marks_at_range(&selection));
        self.set_pending_marks(Some(marks.without(&mark)))
    }

    pub fn toggle_mark(&mut self, mark: impl Into<MarkInput>) -> EditResult {
        let mark = normalize::mark(mark)?;
        let selection = self.current_selection()?;
        let active = selection
            .marks
            .clone()
            .unwrap_or_else(|| self.value.document.get_active_marks_at_range(&selection));
        if active.contains(&mark) {
            self.remove_mark(mark)
        } else {
            self.add_mark(mark)
        }
    }

    /// Deletes the selected content and collapses to where it started.
    pub fn delete(&mut self) -> EditResult {
        let selection = self.current_selection()?;
        if selection.is_collapsed() {
            return Ok(());
        }
        self.delete_at_range(&selection, ChangeOptions::default())?;
        self.collapse_if_selected()
    }

    pub fn delete_backward(&mut self, n: usize) -> EditResult {
        self.delete_collapsing(|change, range| {
            change.delete_backward_at_range(range, n, ChangeOptions::default())
        })
    }

    pub fn delete_forward(&mut self, n: usize) -> EditResult {
        self.delete_collapsing(|change, range| {
            change.delete_forward_at_range(range, n, ChangeOptions::default())
        })
    }

    pub fn delete_char_backward(&mut self) -> EditResult {
        self.delete_collapsing(|change, range| {
            change.delete_char_backward_at_range(range, ChangeOptions::default())
        })
    }

    pub fn delete_char_forward(&mut self) -> EditResult {
        self.delete_collapsing(|change, range| {
            change.delete_char_forward_at_range(range, ChangeOptions::default())
        })
    }

    pub fn delete_word_backward(&mut self) -> EditResult {
        self.delete_collapsing(|change, range| {
            change.delete_word_backward_at_range(range, ChangeOptions::default())
        })
    }

    pub fn delete_word_forward(&mut self) -> EditResult {
        self.delete_collapsing(|change, range| {
            change.delete_word_forward_at_range(range, ChangeOptions::default())
        })
    }

    pub fn delete_line_backward(&mut self) -> EditResult {
        self.delete_collapsing(|change, range| {
            change.delete_line_backward_at_range(range, ChangeOptions::default())
        })
    }

    pub fn delete_line_forward(&mut self) -> EditResult {
        self.delete_collapsing(|change, range| {
            change.delete_line_forward_at_range(range, ChangeOptions::default())
        })
    }

    /// An expanded selection is simply deleted. A caret goes to `at_caret`.
    fn delete_collapsing(
        &mut self,
        at_caret: impl FnOnce(&mut Self, &Range) -> EditResult,
    ) -> EditResult {
        let selection = self.current_selection()?;
        if selection.is_expanded() {
            return self.delete();
        }
        at_caret(self, &selection)
    }

    /// Inserts `block` and moves the caret to its end.
    pub fn insert_block(&mut self, block: impl Into<BlockInput>) -> EditResult {
        let block = normalize::block(block, self.key_generator())?;
        let selection = self.current_selection()?;
        let key = block.key().to_string();
        self.insert_block_at_range(&selection, block, ChangeOptions::default())?;
        self.collapse_to_end_of_if_present(&key)
    }

    /// Inserts `inline` and moves the caret to its end.
    pub fn insert_inline(&mut self, inline: impl Into<InlineInput>) -> EditResult {
        let inline = normalize::inline(inline, self.key_generator())?;
        let selection = self.current_selection()?;
        let key = inline.key().to_string();
        self.insert_inline_at_range(&selection, inline, ChangeOptions::default())?;
        self.collapse_to_end_of_if_present(&key)
    }

    /// Pastes `fragment` and leaves the caret after the pasted content.
    pub fn insert_fragment(&mut self, fragment: Document) -> EditResult {
        let selection = self.current_selection()?;
        if fragment.nodes().is_empty() {
            return Ok(());
        }
        let fragment_node = Node::from(fragment.clone());
        let last_text = fragment_node
            .get_last_text()
            .ok_or_else(|| EditError::invalid("fragment", "a fragment must hold text"))?;
        let last_len = last_text.len();
        let last_in_inline = fragment_node.get_closest_inline(last_text.key()).is_some();

        let document = self.document();
        let existing: HashSet<String> = document
            .get_texts()
            .into_iter()
            .map(|text| text.key().to_string())
            .collect();
        let start_node = document.assert_node(selection.start_key())?;
        let end_node = document.assert_node(selection.end_key())?;
        let is_appending =
            selection.has_edge_at_end_of(end_node) || selection.has_edge_at_start_of(start_node);

        self.insert_fragment_at_range(&selection, fragment, ChangeOptions::default())?;

        let document = self.document();
        let new_texts: Vec<&str> = document
            .get_texts()
            .into_iter()
            .map(|text| text.key())
            .filter(|key| !existing.contains(*key))
            .collect();
        let anchor_text = if is_appending || new_texts.len() < 2 {
            new_texts.last()
        } else {
            new_texts.get(new_texts.len() - 2)
        };
        let caret = match anchor_text {
            Some(key) if last_in_inline => selection.collapse_to_end_of(document.assert_node(key)?),
            Some(key) => selection
                .collapse_to_start_of(document.assert_node(key)?)
                .move_offsets(last_len as isize),
            None => selection.collapse_to_start().move_offsets(last_len as isize),
        };
        self.select(caret)
    }

    /// Types `text` at the selection, replacing it when expanded. Pending
    /// marks apply to the typed text and are cleared once it lands.
    pub fn insert_text(&mut self, text: &str, marks: impl Into<MarksInput>) -> EditResult {
        let selection = self.current_selection()?;
        let marks = normalize::marks(marks)?.or_else(|| selection.marks.clone());
        let before = self.document();
        self.insert_text_at_range(&selection, text, marks, ChangeOptions::default())?;
        if selection.marks.is_some() && !before.ptr_eq(&self.value.document) {
            self.set_pending_marks(None)?;
        }
        Ok(())
    }

    pub fn set_block(&mut self, properties: impl Into<PropertiesInput>) -> EditResult {
        let selection = self.current_selection()?;
        self.set_block_at_range(&selection, properties, ChangeOptions::default())
    }

    pub fn set_inline(&mut self, properties: impl Into<PropertiesInput>) -> EditResult {
        let selection = self.current_selection()?;
        self.set_inline_at_range(&selection, properties, ChangeOptions::default())
    }

    /// Splits the closest `depth` blocks at the caret and moves the caret to
    /// the start of the new block.
    pub fn split_block(&mut self, depth: usize) -> EditResult {
        let selection = self.current_selection()?;
        self.split_block_at_range(&selection, depth, ChangeOptions::default())?;
        self.collapse_if_selected_to_end()
    }

    pub fn split_inline(&mut self, depth: usize) -> EditResult {
        let selection = self.current_selection()?;
        self.split_inline_at_range(&selection, depth, ChangeOptions::default())
    }

    pub fn unwrap_block(&mut self, properties: impl Into<PropertiesInput>) -> EditResult {
        let selection = self.current_selection()?;
        self.unwrap_block_at_range(&selection, properties, ChangeOptions::default())
    }

    pub fn unwrap_inline(&mut self, properties: impl Into<PropertiesInput>) -> EditResult {
        let selection = self.current_selection()?;
        self.unwrap_inline_at_range(&selection, properties, ChangeOptions::default())
    }

    pub fn wrap_block(&mut self, block: impl Into<BlockInput>) -> EditResult {
        let selection = self.current_selection()?;
        self.wrap_block_at_range(&selection, block, ChangeOptions::default())
    }

    pub fn wrap_inline(&mut self, inline: impl Into<InlineInput>) -> EditResult {
        let selection = self.current_selection()?;
        self.wrap_inline_at_range(&selection, inline, ChangeOptions::default())
    }

    /// Surrounds the selection with `prefix` and `suffix`, keeping the
    /// selection on the original content and its original direction.
    pub fn wrap_text(&mut self, prefix: &str, suffix: &str) -> EditResult {
        let selection = self.current_selection()?;
        self.wrap_text_at_range(&selection, prefix, suffix, ChangeOptions::default())?;
        if selection.is_collapsed() {
            self.move_start(-(char_count(prefix) as isize))?;
        }
        self.move_end(-(char_count(suffix) as isize))?;
        if self.current_selection()?.is_forward() != selection.is_forward() {
            self.flip()?;
        }
        Ok(())
    }

    fn collapse_if_selected(&mut self) -> EditResult {
        if self.value.selection.is_some() {
            self.collapse_to_start()?;
        }
        Ok(())
    }

    fn collapse_if_selected_to_end(&mut self) -> EditResult {
        if self.value.selection.is_some() {
            self.collapse_to_end()?;
        }
        Ok(())
    }

    fn collapse_to_end_of_if_present(&mut self, key: &str) -> EditResult {
        if self.value.document.has_descendant(key) {
            self.collapse_to_end_of(key)?;
        }
        Ok(())
    }
}
