//! A naive, simple oracle editor for differential testing.
//!
//! The document is a list of plain paragraphs and points are
//! `(paragraph, character offset)` pairs. Every edit rebuilds strings from
//! scratch, so the behavior is easy to audit.
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Point {
    pub block: usize,
    pub offset: usize,
}

impl Point {
    pub fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Editor {
    blocks: Vec<Vec<String>>,
    anchor: Point,
    focus: Point,
}

impl Editor {
    /// Caret at the start of the first paragraph. An empty list becomes one
    /// empty paragraph.
    pub fn new<S: AsRef<str>>(paragraphs: &[S]) -> Self {
        let mut blocks: Vec<Vec<String>> = paragraphs
            .iter()
            .map(|text| {
                text.as_ref()
                    .graphemes(true)
                    .map(str::to_string)
                    .collect()
            })
            .collect();
        if blocks.is_empty() {
            blocks.push(Vec::new());
        }
        Self {
            blocks,
            anchor: Point::new(0, 0),
            focus: Point::new(0, 0),
        }
    }

    pub fn paragraphs(&self) -> Vec<String> {
        self.blocks.iter().map(|block| block.concat()).collect()
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn focus(&self) -> Point {
        self.focus
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn block_len(&self, block: usize) -> usize {
        self.blocks[block].len()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Clamps both points into the document.
    pub fn select(&mut self, anchor: Point, focus: Point) {
        self.anchor = self.clamp(anchor);
        self.focus = self.clamp(focus);
    }

    pub fn insert_text(&mut self, text: &str) {
        self.delete();
        let caret = self.anchor;
        let inserted: Vec<String> = text.graphemes(true).map(str::to_string).collect();
        let count = inserted.len();
        let block = &mut self.blocks[caret.block];
        block.splice(caret.offset..caret.offset, inserted);
        self.collapse(Point::new(caret.block, caret.offset + count));
    }

    /// Removes the selected span, leaving the caret at its start.
    pub fn delete(&mut self) {
        let (start, end) = self.edges();
        if start == end {
            return;
        }
        let tail: Vec<String> = self.blocks[end.block][end.offset..].to_vec();
        self.blocks[start.block].truncate(start.offset);
        self.blocks[start.block].extend(tail);
        self.blocks.drain(start.block + 1..=end.block);
        self.collapse(start);
    }

    pub fn delete_backward(&mut self) {
        if !self.is_collapsed() {
            self.delete();
            return;
        }
        let caret = self.focus;
        if self.blocks[caret.block].is_empty() && self.blocks.len() > 1 {
            self.remove_block(caret.block);
            return;
        }
        if caret.offset > 0 {
            self.blocks[caret.block].remove(caret.offset - 1);
            self.collapse(Point::new(caret.block, caret.offset - 1));
        } else if caret.block > 0 {
            let joined = Point::new(caret.block - 1, self.block_len(caret.block - 1));
            self.join(caret.block - 1);
            self.collapse(joined);
        }
    }

    pub fn delete_forward(&mut self) {
        if !self.is_collapsed() {
            self.delete();
            return;
        }
        let caret = self.focus;
        if self.blocks[caret.block].is_empty() && self.blocks.len() > 1 {
            self.remove_block(caret.block);
            return;
        }
        if caret.offset < self.block_len(caret.block) {
            self.blocks[caret.block].remove(caret.offset);
        } else if caret.block + 1 < self.blocks.len() {
            self.join(caret.block);
        }
    }

    /// Splits the paragraph at the selection start, after deleting the
    /// selection; the caret lands at the start of the new paragraph.
    pub fn split_block(&mut self) {
        self.delete();
        let caret = self.anchor;
        let tail = self.blocks[caret.block].split_off(caret.offset);
        self.blocks.insert(caret.block + 1, tail);
        self.collapse(Point::new(caret.block + 1, 0));
    }

    fn edges(&self) -> (Point, Point) {
        if self.anchor <= self.focus {
            (self.anchor, self.focus)
        } else {
            (self.focus, self.anchor)
        }
    }

    fn join(&mut self, block: usize) {
        let next = self.blocks.remove(block + 1);
        self.blocks[block].extend(next);
    }

    /// Removes an empty paragraph; the caret goes to the end of the one
    /// before it, or the start of the one after.
    fn remove_block(&mut self, block: usize) {
        self.blocks.remove(block);
        let caret = if block > 0 {
            Point::new(block - 1, self.block_len(block - 1))
        } else {
            Point::new(0, 0)
        };
        self.collapse(caret);
    }

    fn collapse(&mut self, point: Point) {
        self.anchor = point;
        self.focus = point;
    }

    fn clamp(&self, point: Point) -> Point {
        let block = point.block.min(self.blocks.len() - 1);
        Point::new(block, point.offset.min(self.block_len(block)))
    }
}
