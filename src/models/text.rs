use super::{Character, Key, KeyGenerator, Mark, MarkSet};

/// Leaf node: an ordered run of characters with per-character marks.
///
/// The concatenated string is computed whenever the characters change and
/// stored next to them, so reads never rebuild it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    key: Key,
    characters: Vec<Character>,
    text: String,
}

impl Text {
    pub fn new(key: impl Into<Key>, text: &str) -> Self {
        Self::with_marks(key, text, &MarkSet::new())
    }

    pub fn empty(key: impl Into<Key>) -> Self {
        Self::from_characters(key, Vec::new())
    }

    pub fn with_marks(key: impl Into<Key>, text: &str, marks: &MarkSet) -> Self {
        Self::from_characters(key, Character::list_from_text(text, marks))
    }

    pub fn from_characters(key: impl Into<Key>, characters: Vec<Character>) -> Self {
        let mut node = Self {
            key: key.into(),
            characters,
            text: String::new(),
        };
        node.refresh();
        node
    }

    pub fn create(text: &str, keys: &mut dyn KeyGenerator) -> Self {
        Self::new(keys.generate_key(), text)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    /// Length in characters (grapheme clusters), the unit of every offset.
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Marks a character typed at `index` would inherit: those of the
    /// character just before it.
    pub fn marks_at_index(&self, index: usize) -> MarkSet {
        if index == 0 {
            return MarkSet::new();
        }
        self.characters
            .get(index - 1)
            .map(|character| character.marks.clone())
            .unwrap_or_default()
    }

    /// Union of every character's marks.
    pub fn marks(&self) -> MarkSet {
        self.characters
            .iter()
            .fold(MarkSet::new(), |set, character| set.union(&character.marks))
    }

    /// Text between two character offsets, clamped to the node.
    pub fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.len());
        let start = start.min(end);
        self.characters[start..end]
            .iter()
            .map(|character| character.text.as_str())
            .collect()
    }

    pub(crate) fn set_key(&mut self, key: Key) {
        self.key = key;
    }

    /// Copy of `[start, end)` under the same key.
    pub(crate) fn clipped(&self, start: usize, end: usize) -> Text {
        let end = end.min(self.len());
        let start = start.min(end);
        Text::from_characters(self.key.clone(), self.characters[start..end].to_vec())
    }

    /// Returns the number of characters inserted.
    pub(crate) fn insert_text(&mut self, offset: usize, text: &str, marks: &MarkSet) -> usize {
        let inserted = Character::list_from_text(text, marks);
        let count = inserted.len();
        let offset = offset.min(self.len());
        self.characters.splice(offset..offset, inserted);
        self.refresh();
        count
    }

    /// Returns the removed text.
    pub(crate) fn remove_text(&mut self, offset: usize, length: usize) -> String {
        let end = (offset + length).min(self.len());
        let removed: String = self
            .characters
            .drain(offset.min(end)..end)
            .map(|character| character.text)
            .collect();
        self.refresh();
        removed
    }

    pub(crate) fn add_mark(&mut self, offset: usize, length: usize, mark: &Mark) {
        for character in self.characters.iter_mut().skip(offset).take(length) {
            character.marks.insert(mark.clone());
        }
    }

    pub(crate) fn remove_mark(&mut self, offset: usize, length: usize, mark: &Mark) {
        for character in self.characters.iter_mut().skip(offset).take(length) {
            character.marks.remove(mark);
        }
    }

    /// Moves everything from `offset` on into a new text keyed `key`.
    pub(crate) fn split_off(&mut self, offset: usize, key: Key) -> Text {
        let offset = offset.min(self.len());
        let right = self.characters.split_off(offset);
        self.refresh();
        Text::from_characters(key, right)
    }

    pub(crate) fn append(&mut self, other: &Text) {
        self.characters.extend(other.characters.iter().cloned());
        self.refresh();
    }

    fn refresh(&mut self) {
        self.text = self
            .characters
            .iter()
            .map(|character| character.text.as_str())
            .collect();
    }
}
