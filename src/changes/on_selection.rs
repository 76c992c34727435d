use super::{Change, Operation};
use crate::error::EditResult;
use crate::models::{MarkSet, Range};

impl Change {
    /// Replaces the selection. Points are resolved against the document and
    /// the direction is recomputed.
    pub fn select(&mut self, range: Range) -> EditResult {
        let range = range.normalize(&self.value.document)?;
        self.set_selection(Some(range));
        Ok(())
    }

    pub fn deselect(&mut self) {
        self.set_selection(None);
    }

    /// Marks applied to the next text typed at the caret; `None` reverts to
    /// the marks of the surrounding text.
    pub fn set_pending_marks(&mut self, marks: Option<MarkSet>) -> EditResult {
        self.update_selection(|selection| selection.with_marks(marks))
    }

    pub fn collapse_to_start(&mut self) -> EditResult {
        self.update_selection(|selection| selection.collapse_to_start())
    }

    pub fn collapse_to_end(&mut self) -> EditResult {
        self.update_selection(|selection| selection.collapse_to_end())
    }

    pub fn collapse_to_anchor(&mut self) -> EditResult {
        self.update_selection(|selection| selection.collapse_to_anchor())
    }

    pub fn collapse_to_focus(&mut self) -> EditResult {
        self.update_selection(|selection| selection.collapse_to_focus())
    }

    /// Caret at the start of the node `key`. Works without a selection.
    pub fn collapse_to_start_of(&mut self, key: &str) -> EditResult {
        let document = self.document();
        let node = document.assert_node(key)?;
        let base = self.base_selection(key);
        self.select(base.collapse_to_start_of(node))
    }

    /// Caret at the end of the node `key`, after it if it ends in a void.
    pub fn collapse_to_end_of(&mut self, key: &str) -> EditResult {
        let document = self.document();
        let node = document.assert_node(key)?;
        let base = self.base_selection(key);
        self.select(base.collapse_to_end_of(node))
    }

    /// Shifts both points by `n` characters inside their texts.
    pub fn move_offsets(&mut self, n: isize) -> EditResult {
        self.update_selection(|selection| selection.move_offsets(n))
    }

    pub fn move_start(&mut self, n: isize) -> EditResult {
        self.update_selection(|selection| selection.move_start(n))
    }

    pub fn move_end(&mut self, n: isize) -> EditResult {
        self.update_selection(|selection| selection.move_end(n))
    }

    pub fn flip(&mut self) -> EditResult {
        self.update_selection(|selection| selection.flip())
    }

    pub fn focus(&mut self) -> EditResult {
        self.update_selection(|selection| selection.with_focused(true))
    }

    pub fn blur(&mut self) -> EditResult {
        self.update_selection(|selection| selection.with_focused(false))
    }

    /// Remembers the current selection; read back with [`Change::snapshot`].
    pub fn snapshot_selection(&mut self) {
        let selection = self.value.selection.clone();
        self.set_snapshot(selection);
    }

    fn update_selection(&mut self, update: impl FnOnce(Range) -> Range) -> EditResult {
        let selection = self.current_selection()?;
        self.select(update(selection))
    }

    fn base_selection(&self, key: &str) -> Range {
        self.value
            .selection
            .clone()
            .unwrap_or_else(|| Range::collapsed(key, 0))
    }

    fn set_selection(&mut self, selection: Option<Range>) {
        self.value.selection = selection.clone();
        self.record(Operation::SetSelection { selection });
    }
}
