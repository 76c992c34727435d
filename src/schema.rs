//! Structural rules and the contract for repairing a subtree.
//!
//! The change drives a [`Schema`] bottom-up: children are repaired before
//! their parent, and each node is offered to the schema until it reports
//! that nothing changed.

use crate::changes::{Change, ChangeOptions};
use crate::error::EditError;
use crate::models::{Block, Node, NodeKind, NodeProperties, Text};
use serde::Deserialize;
use std::fmt;

pub const DEFAULT_MAX_ITERATIONS: usize = 1024;

/// Repairs one node at a time.
pub trait Schema: Send + Sync + fmt::Debug {
    /// Applies at most one repair to `key` and reports whether it did.
    ///
    /// Implementations must edit through `change` with normalization turned
    /// off, since the caller is already normalizing.
    fn normalize_node(&self, change: &mut Change, key: &str) -> Result<bool, EditError>;

    /// Upper bound on repairs per node before giving up.
    fn max_iterations(&self) -> usize {
        DEFAULT_MAX_ITERATIONS
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Type given to the block created in an empty document.
    pub default_block_type: String,
    pub max_iterations: usize,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            default_block_type: "paragraph".to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Rules every document obeys regardless of the host's own schema:
///
/// 1. a void holds exactly one empty text;
/// 2. containers are never empty (a document gets a default block);
/// 3. documents hold only blocks;
/// 4. a block holds either only blocks or only inlines and texts;
/// 5. inlines hold no blocks;
/// 6. non-void inlines without text or voids inside are removed;
/// 7. inlines are surrounded by texts;
/// 8. adjacent texts are merged.
#[derive(Debug, Clone, Default)]
pub struct CoreSchema {
    config: SchemaConfig,
}

impl CoreSchema {
    pub fn new(config: SchemaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }
}

impl Schema for CoreSchema {
    fn normalize_node(&self, change: &mut Change, key: &str) -> Result<bool, EditError> {
        let document = change.document();
        let Some(node) = document.get_node(key) else {
            return Ok(false);
        };
        if node.is_text() {
            return Ok(false);
        }
        let without = ChangeOptions::without_normalize();
        let children = node.nodes();

        if node.is_void() {
            let Some(text) = children.iter().find(|child| child.is_text()) else {
                let text = Text::empty(change.generate_key());
                change.insert_node_by_key(key, 0, text.into(), without)?;
                return Ok(true);
            };
            if let Some(extra) = children.iter().find(|child| child.key() != text.key()) {
                change.remove_node_by_key(extra.key(), without)?;
                return Ok(true);
            }
            let len = text.text_len();
            if len > 0 {
                change.remove_text_by_key(text.key(), 0, len, without)?;
                return Ok(true);
            }
            return Ok(false);
        }

        if children.is_empty() {
            let child: Node = if node.is_document() {
                Block::create(
                    NodeProperties::of_type(self.config.default_block_type.clone()),
                    Vec::new(),
                    change.key_generator(),
                )?
                .into()
            } else {
                Text::empty(change.generate_key()).into()
            };
            change.insert_node_by_key(key, 0, child, without)?;
            return Ok(true);
        }

        let misplaced = match node.kind() {
            NodeKind::Document => children.iter().find(|child| !child.is_block()),
            NodeKind::Block => {
                let holds_blocks = children[0].is_block();
                children
                    .iter()
                    .find(|child| child.is_block() != holds_blocks)
            }
            NodeKind::Inline => children.iter().find(|child| child.is_block()),
            NodeKind::Text => None,
        };
        if let Some(child) = misplaced {
            change.remove_node_by_key(child.key(), without)?;
            return Ok(true);
        }
        if node.is_document() || children[0].is_block() {
            return Ok(false);
        }

        if let Some(empty) = children.iter().find(|child| {
            child.is_inline() && !child.is_void() && child.is_empty() && !contains_void(child)
        }) {
            change.remove_node_by_key(empty.key(), without)?;
            return Ok(true);
        }

        if children[0].is_inline() {
            let text = Text::empty(change.generate_key());
            change.insert_node_by_key(key, 0, text.into(), without)?;
            return Ok(true);
        }
        if children.last().is_some_and(Node::is_inline) {
            let text = Text::empty(change.generate_key());
            change.insert_node_by_key(key, children.len(), text.into(), without)?;
            return Ok(true);
        }
        for (index, pair) in children.windows(2).enumerate() {
            if pair[0].is_inline() && pair[1].is_inline() {
                let text = Text::empty(change.generate_key());
                change.insert_node_by_key(key, index + 1, text.into(), without)?;
                return Ok(true);
            }
            if pair[0].is_text() && pair[1].is_text() {
                change.merge_node_by_key(pair[1].key(), without)?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn max_iterations(&self) -> usize {
        self.config.max_iterations
    }
}

fn contains_void(node: &Node) -> bool {
    node.nodes()
        .iter()
        .any(|child| child.is_void() || contains_void(child))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CounterKeyGenerator, Document, Inline, Value};

    fn normalized(document: Document) -> Node {
        let mut change = Change::new(Value::new(document))
            .with_key_generator(CounterKeyGenerator::starting_at(100));
        change.normalize_document().unwrap();
        change.document()
    }

    #[test]
    fn empty_document_gets_a_default_block() {
        let document = normalized(Document::new("d", vec![]));
        assert_eq!(document.nodes().len(), 1);
        assert_eq!(document.nodes()[0].node_type(), Some("paragraph"));
        assert!(document.nodes()[0].nodes()[0].is_text());
    }

    #[test]
    fn adjacent_texts_merge_and_inlines_get_padding() {
        let link = Inline::new("l", "link", vec![Text::new("lt", "go").into()]);
        let para = Block::new(
            "p",
            "paragraph",
            vec![
                Text::new("a", "x").into(),
                Text::new("b", "y").into(),
                link.into(),
            ],
        );
        let document = normalized(Document::new("d", vec![para.into()]));
        let para = &document.nodes()[0];
        let kinds: Vec<_> = para.nodes().iter().map(Node::kind).collect();
        assert_eq!(kinds, vec![NodeKind::Text, NodeKind::Inline, NodeKind::Text]);
        assert_eq!(para.nodes()[0].text(), "xy");
    }

    #[test]
    fn voids_are_reduced_to_one_empty_text() {
        let image = Block::new(
            "img",
            "image",
            vec![Text::new("a", "junk").into(), Text::new("b", "more").into()],
        )
        .with_void(true);
        let document = normalized(Document::new("d", vec![image.into()]));
        let image = &document.nodes()[0];
        assert_eq!(image.nodes().len(), 1);
        assert_eq!(image.text(), "");
    }

    #[test]
    fn a_block_keeps_the_kind_of_its_first_child() {
        let inner = Block::new("q", "paragraph", vec![Text::new("a", "x").into()]);
        let outer = Block::new(
            "o",
            "quote",
            vec![inner.into(), Text::new("stray", "y").into()],
        );
        let document = normalized(Document::new("d", vec![outer.into()]));
        assert_eq!(document.nodes()[0].nodes().len(), 1);
        assert_eq!(document.text(), "x");
    }

    #[test]
    fn a_tight_limit_is_reported() {
        let para = Block::new(
            "p",
            "paragraph",
            (0..5)
                .map(|i| Text::new(format!("t{i}"), "x").into())
                .collect(),
        );
        let mut change = Change::new(Value::new(Document::new("d", vec![para.into()])))
            .with_schema(CoreSchema::new(SchemaConfig {
                max_iterations: 2,
                ..SchemaConfig::default()
            }));
        let err = change.normalize_document().unwrap_err();
        assert!(matches!(err, EditError::NormalizationLimit { iterations: 2, .. }));
    }
}
