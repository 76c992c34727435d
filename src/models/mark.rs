//! Formatting marks and the de-duplicating set that characters carry.

use super::Data;
use serde::{Deserialize, Serialize};

/// A formatting annotation such as `bold` or a link with data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub mark_type: String,
    #[serde(default)]
    pub data: Data,
}

impl Mark {
    pub fn new(mark_type: impl Into<String>) -> Self {
        Self {
            mark_type: mark_type.into(),
            data: Data::new(),
        }
    }

    pub fn with_data(mut self, data: Data) -> Self {
        self.data = data;
        self
    }
}

/// Unordered set of marks; equal marks collapse into one entry.
///
/// Iteration follows insertion order so results are reproducible, but
/// equality ignores it.
#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Mark>", into = "Vec<Mark>")]
pub struct MarkSet(Vec<Mark>);

impl MarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mark> {
        self.0.iter()
    }

    pub fn contains(&self, mark: &Mark) -> bool {
        self.0.contains(mark)
    }

    /// Returns `false` when an equal mark was already present.
    pub fn insert(&mut self, mark: Mark) -> bool {
        if self.contains(&mark) {
            return false;
        }
        self.0.push(mark);
        true
    }

    pub fn remove(&mut self, mark: &Mark) -> bool {
        let before = self.0.len();
        self.0.retain(|existing| existing != mark);
        before != self.0.len()
    }

    pub fn with(mut self, mark: Mark) -> Self {
        self.insert(mark);
        self
    }

    pub fn without(mut self, mark: &Mark) -> Self {
        self.remove(mark);
        self
    }

    pub fn intersection(&self, other: &MarkSet) -> MarkSet {
        MarkSet(
            self.0
                .iter()
                .filter(|mark| other.contains(mark))
                .cloned()
                .collect(),
        )
    }

    pub fn union(&self, other: &MarkSet) -> MarkSet {
        let mut merged = self.clone();
        for mark in &other.0 {
            merged.insert(mark.clone());
        }
        merged
    }
}

impl PartialEq for MarkSet {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().all(|mark| other.contains(mark))
    }
}

impl From<Vec<Mark>> for MarkSet {
    fn from(marks: Vec<Mark>) -> Self {
        marks.into_iter().collect()
    }
}

impl From<MarkSet> for Vec<Mark> {
    fn from(set: MarkSet) -> Self {
        set.0
    }
}

impl FromIterator<Mark> for MarkSet {
    fn from_iter<I: IntoIterator<Item = Mark>>(iter: I) -> Self {
        let mut set = MarkSet::new();
        for mark in iter {
            set.insert(mark);
        }
        set
    }
}

impl<'a> IntoIterator for &'a MarkSet {
    type Item = &'a Mark;
    type IntoIter = std::slice::Iter<'a, Mark>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_collapse() {
        let set: MarkSet = vec![Mark::new("bold"), Mark::new("bold"), Mark::new("italic")].into();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn equality_ignores_order() {
        let a: MarkSet = vec![Mark::new("bold"), Mark::new("italic")].into();
        let b: MarkSet = vec![Mark::new("italic"), Mark::new("bold")].into();
        assert_eq!(a, b);
    }

    #[test]
    fn marks_with_different_data_are_distinct() {
        let plain = Mark::new("link");
        let href = Mark::new("link").with_data(Data::new().with("href", "/"));
        let set = MarkSet::new().with(plain.clone()).with(href.clone());
        assert_eq!(set.len(), 2);
        assert_eq!(set.without(&plain), MarkSet::new().with(href));
    }
}
