use super::{Document, MarkSet, Node, Range, Text};

/// A document paired with its selection.
///
/// `selection` is `None` when nothing is selected, for instance after the
/// last node holding the caret was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    pub(crate) document: Node,
    pub(crate) selection: Option<Range>,
}

impl Value {
    pub fn new(document: Document) -> Self {
        Self {
            document: document.into(),
            selection: None,
        }
    }

    /// Sets the selection, resolved against the document so that its
    /// direction is known. A selection that does not resolve is kept as
    /// given; edits report the error.
    pub fn with_selection(mut self, selection: Range) -> Self {
        let resolved = selection.clone().normalize(&self.document);
        self.selection = Some(resolved.unwrap_or(selection));
        self
    }

    /// The root node; always the `Node::Document` variant.
    pub fn document(&self) -> &Node {
        &self.document
    }

    pub fn selection(&self) -> Option<&Range> {
        self.selection.as_ref()
    }

    pub fn start_text(&self) -> Option<&Text> {
        let selection = self.selection.as_ref()?;
        self.document.get_node(selection.start_key())?.as_text()
    }

    pub fn end_text(&self) -> Option<&Text> {
        let selection = self.selection.as_ref()?;
        self.document.get_node(selection.end_key())?.as_text()
    }

    /// Pending marks when the caret carries some, otherwise the marks shared
    /// across the selection.
    pub fn active_marks(&self) -> MarkSet {
        match &self.selection {
            None => MarkSet::new(),
            Some(selection) => match &selection.marks {
                Some(marks) => marks.clone(),
                None => self.document.get_active_marks_at_range(selection),
            },
        }
    }
}
