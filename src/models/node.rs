//! Tree node types and the closed [`Node`] union over them.
//!
//! Payloads sit behind `Arc`, so cloning a node is cheap and an edit only
//! copies the nodes on the path from the root to the change.

use super::{Data, Key, KeyGenerator, NodeProperties, Text};
use crate::error::EditError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Document,
    Block,
    Inline,
    Text,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Block => "block",
            NodeKind::Inline => "inline",
            NodeKind::Text => "text",
        }
    }
}

/// Block-level container: paragraphs, list items, quotes, images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    key: Key,
    node_type: String,
    data: Data,
    is_void: bool,
    nodes: Vec<Node>,
}

/// Inline container inside a block: links, mentions, inline images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inline {
    key: Key,
    node_type: String,
    data: Data,
    is_void: bool,
    nodes: Vec<Node>,
}

/// Root container. Also the shape of detached fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    key: Key,
    data: Data,
    nodes: Vec<Node>,
}

impl Block {
    /// Builds a block from explicit parts. Children are taken as given; use
    /// [`Block::create`] to get the empty-text default.
    pub fn new(key: impl Into<Key>, node_type: impl Into<String>, nodes: Vec<Node>) -> Self {
        Self {
            key: key.into(),
            node_type: node_type.into(),
            data: Data::new(),
            is_void: false,
            nodes,
        }
    }

    /// Builds a block from properties. A missing key is generated; missing
    /// children default to a single empty text.
    pub fn create(
        properties: NodeProperties,
        nodes: Vec<Node>,
        keys: &mut dyn KeyGenerator,
    ) -> Result<Self, EditError> {
        let node_type = properties
            .node_type
            .ok_or(EditError::MissingType("block"))?;
        let key = properties.key.unwrap_or_else(|| keys.generate_key());
        Ok(Self {
            key,
            node_type,
            data: properties.data.unwrap_or_default(),
            is_void: properties.is_void.unwrap_or(false),
            nodes: default_children(nodes, keys),
        })
    }

    pub fn with_data(mut self, data: Data) -> Self {
        self.data = data;
        self
    }

    pub fn with_void(mut self, is_void: bool) -> Self {
        self.is_void = is_void;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn is_void(&self) -> bool {
        self.is_void
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn without_nodes(mut self) -> Self {
        self.nodes.clear();
        self
    }
}

impl Inline {
    /// Builds an inline from explicit parts. Children are taken as given.
    pub fn new(key: impl Into<Key>, node_type: impl Into<String>, nodes: Vec<Node>) -> Self {
        Self {
            key: key.into(),
            node_type: node_type.into(),
            data: Data::new(),
            is_void: false,
            nodes,
        }
    }

    pub fn create(
        properties: NodeProperties,
        nodes: Vec<Node>,
        keys: &mut dyn KeyGenerator,
    ) -> Result<Self, EditError> {
        let node_type = properties
            .node_type
            .ok_or(EditError::MissingType("inline"))?;
        let key = properties.key.unwrap_or_else(|| keys.generate_key());
        Ok(Self {
            key,
            node_type,
            data: properties.data.unwrap_or_default(),
            is_void: properties.is_void.unwrap_or(false),
            nodes: default_children(nodes, keys),
        })
    }

    pub fn with_data(mut self, data: Data) -> Self {
        self.data = data;
        self
    }

    pub fn with_void(mut self, is_void: bool) -> Self {
        self.is_void = is_void;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn is_void(&self) -> bool {
        self.is_void
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn with_key(mut self, key: Key) -> Self {
        self.key = key;
        self
    }

    pub(crate) fn without_nodes(mut self) -> Self {
        self.nodes.clear();
        self
    }
}

impl Document {
    pub fn new(key: impl Into<Key>, nodes: Vec<Node>) -> Self {
        Self {
            key: key.into(),
            data: Data::new(),
            nodes,
        }
    }

    /// Documents may be created empty; that is the shape of an empty fragment.
    /// The schema gives a live document its first block.
    pub fn create(nodes: Vec<Node>, keys: &mut dyn KeyGenerator) -> Self {
        Self::new(keys.generate_key(), nodes)
    }

    pub fn with_data(mut self, data: Data) -> Self {
        self.data = data;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.push_text(&mut out);
        }
        out
    }
}

fn default_children(nodes: Vec<Node>, keys: &mut dyn KeyGenerator) -> Vec<Node> {
    if nodes.is_empty() {
        vec![Text::empty(keys.generate_key()).into()]
    } else {
        nodes
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Document(Arc<Document>),
    Block(Arc<Block>),
    Inline(Arc<Inline>),
    Text(Arc<Text>),
}

impl Node {
    pub fn key(&self) -> &str {
        match self {
            Node::Document(document) => &document.key,
            Node::Block(block) => &block.key,
            Node::Inline(inline) => &inline.key,
            Node::Text(text) => text.key(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Document(_) => NodeKind::Document,
            Node::Block(_) => NodeKind::Block,
            Node::Inline(_) => NodeKind::Inline,
            Node::Text(_) => NodeKind::Text,
        }
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Node::Document(_))
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Node::Block(_))
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Node::Inline(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn is_void(&self) -> bool {
        match self {
            Node::Block(block) => block.is_void,
            Node::Inline(inline) => inline.is_void,
            Node::Document(_) | Node::Text(_) => false,
        }
    }

    pub fn node_type(&self) -> Option<&str> {
        match self {
            Node::Block(block) => Some(&block.node_type),
            Node::Inline(inline) => Some(&inline.node_type),
            Node::Document(_) | Node::Text(_) => None,
        }
    }

    pub fn data(&self) -> Option<&Data> {
        match self {
            Node::Document(document) => Some(&document.data),
            Node::Block(block) => Some(&block.data),
            Node::Inline(inline) => Some(&inline.data),
            Node::Text(_) => None,
        }
    }

    /// Children in order; empty for text nodes.
    pub fn nodes(&self) -> &[Node] {
        match self {
            Node::Document(document) => &document.nodes,
            Node::Block(block) => &block.nodes,
            Node::Inline(inline) => &inline.nodes,
            Node::Text(_) => &[],
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Node::Block(block) => Some(block),
            _ => None,
        }
    }

    pub fn as_inline(&self) -> Option<&Inline> {
        match self {
            Node::Inline(inline) => Some(inline),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Node::Document(document) => Some(document),
            _ => None,
        }
    }

    /// Concatenated text of every descendant.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    /// Length in characters of [`Node::text`].
    pub fn text_len(&self) -> usize {
        match self {
            Node::Text(text) => text.len(),
            _ => self.nodes().iter().map(Node::text_len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text_len() == 0
    }

    /// Offset that denotes "the end" of this node within its last text.
    ///
    /// When the last text sits inside a void the end is 1, the position just
    /// after the void; otherwise it is the last text's length.
    pub fn end_offset(&self) -> usize {
        match self {
            Node::Text(text) => text.len(),
            _ if self.is_void() => 1,
            _ => self.nodes().last().map(Node::end_offset).unwrap_or(0),
        }
    }

    /// Copy of this subtree in which every descendant has a fresh key. The
    /// node itself keeps its key.
    pub fn regenerate_keys(&self, keys: &mut dyn KeyGenerator) -> Node {
        let mut node = self.clone();
        node.rekey_descendants(keys);
        node
    }

    /// True when both handles share the same allocation.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Document(a), Node::Document(b)) => Arc::ptr_eq(a, b),
            (Node::Block(a), Node::Block(b)) => Arc::ptr_eq(a, b),
            (Node::Inline(a), Node::Inline(b)) => Arc::ptr_eq(a, b),
            (Node::Text(a), Node::Text(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn push_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text.text()),
            _ => {
                for child in self.nodes() {
                    child.push_text(out);
                }
            }
        }
    }

    fn rekey_descendants(&mut self, keys: &mut dyn KeyGenerator) {
        if let Some(children) = self.children_mut() {
            for child in children.iter_mut() {
                child.set_key(keys.generate_key());
                child.rekey_descendants(keys);
            }
        }
    }

    pub(crate) fn set_key(&mut self, key: Key) {
        match self {
            Node::Document(document) => Arc::make_mut(document).key = key,
            Node::Block(block) => Arc::make_mut(block).key = key,
            Node::Inline(inline) => Arc::make_mut(inline).key = key,
            Node::Text(text) => Arc::make_mut(text).set_key(key),
        }
    }

    /// Mutable children, copying the payload first if it is shared.
    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Document(document) => Some(&mut Arc::make_mut(document).nodes),
            Node::Block(block) => Some(&mut Arc::make_mut(block).nodes),
            Node::Inline(inline) => Some(&mut Arc::make_mut(inline).nodes),
            Node::Text(_) => None,
        }
    }

    pub(crate) fn text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Node::Text(text) => Some(Arc::make_mut(text)),
            _ => None,
        }
    }

    pub(crate) fn descend_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let mut node = self;
        for &index in path {
            node = node.children_mut()?.get_mut(index)?;
        }
        Some(node)
    }

    /// Same container with other children. Text nodes are returned as is.
    pub(crate) fn with_children(&self, nodes: Vec<Node>) -> Node {
        let mut node = self.clone();
        if let Some(children) = node.children_mut() {
            *children = nodes;
        }
        node
    }

    pub(crate) fn set_properties(&mut self, properties: &NodeProperties) {
        match self {
            Node::Block(block) => {
                let block = Arc::make_mut(block);
                if let Some(node_type) = &properties.node_type {
                    block.node_type = node_type.clone();
                }
                if let Some(data) = &properties.data {
                    block.data = data.clone();
                }
                if let Some(is_void) = properties.is_void {
                    block.is_void = is_void;
                }
            }
            Node::Inline(inline) => {
                let inline = Arc::make_mut(inline);
                if let Some(node_type) = &properties.node_type {
                    inline.node_type = node_type.clone();
                }
                if let Some(data) = &properties.data {
                    inline.data = data.clone();
                }
                if let Some(is_void) = properties.is_void {
                    inline.is_void = is_void;
                }
            }
            Node::Document(document) => {
                if let Some(data) = &properties.data {
                    Arc::make_mut(document).data = data.clone();
                }
            }
            Node::Text(_) => {}
        }
    }
}

impl From<Document> for Node {
    fn from(document: Document) -> Self {
        Node::Document(Arc::new(document))
    }
}

impl From<Block> for Node {
    fn from(block: Block) -> Self {
        Node::Block(Arc::new(block))
    }
}

impl From<Inline> for Node {
    fn from(inline: Inline) -> Self {
        Node::Inline(Arc::new(inline))
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(Arc::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CounterKeyGenerator;

    #[test]
    fn create_defaults_to_one_empty_text() {
        let mut keys = CounterKeyGenerator::new();
        let block = Block::create(NodeProperties::of_type("paragraph"), vec![], &mut keys).unwrap();
        assert_eq!(block.key(), "0");
        assert_eq!(block.nodes().len(), 1);
        assert!(block.nodes()[0].is_text());
    }

    #[test]
    fn create_requires_a_type() {
        let mut keys = CounterKeyGenerator::new();
        let err = Inline::create(NodeProperties::default(), vec![], &mut keys).unwrap_err();
        assert_eq!(err, EditError::MissingType("inline"));
    }

    #[test]
    fn end_offset_of_a_trailing_void_is_one() {
        let image: Node = Block::new("img", "image", vec![Text::empty("t").into()])
            .with_void(true)
            .into();
        let para: Node = Block::new("p", "paragraph", vec![Text::new("a", "abc").into()]).into();
        let document: Node = Document::new("d", vec![para.clone(), image]).into();
        assert_eq!(para.end_offset(), 3);
        assert_eq!(document.end_offset(), 1);
    }

    #[test]
    fn regenerated_keys_leave_the_root() {
        let mut keys = CounterKeyGenerator::starting_at(100);
        let para: Node = Block::new("p", "paragraph", vec![Text::new("a", "x").into()]).into();
        let fragment: Node = Document::new("f", vec![para]).into();
        let copy = fragment.regenerate_keys(&mut keys);
        assert_eq!(copy.key(), "f");
        assert_eq!(copy.nodes()[0].key(), "100");
        assert_eq!(copy.nodes()[0].nodes()[0].key(), "101");
        assert_eq!(copy.text(), "x");
    }
}
