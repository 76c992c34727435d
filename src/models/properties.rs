use super::{Data, Key, Node};
use serde::{Deserialize, Serialize};

/// Partial description of a block or inline.
///
/// Used to create nodes, to patch them with `set_*` operations, and as a
/// filter where every present field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_void: Option<bool>,
}

impl NodeProperties {
    pub fn of_type(node_type: impl Into<String>) -> Self {
        Self {
            node_type: Some(node_type.into()),
            ..Self::default()
        }
    }

    pub fn with_data(mut self, data: Data) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_void(mut self, is_void: bool) -> Self {
        self.is_void = Some(is_void);
        self
    }

    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Properties describing an existing block or inline.
    pub fn of_node(node: &Node) -> Self {
        Self {
            key: None,
            node_type: node.node_type().map(str::to_string),
            data: node.data().cloned(),
            is_void: (node.is_block() || node.is_inline()).then(|| node.is_void()),
        }
    }

    /// Type equal, void flag equal, data a superset; absent fields match anything.
    pub fn matches(&self, node: &Node) -> bool {
        if let Some(node_type) = &self.node_type
            && node.node_type() != Some(node_type.as_str())
        {
            return false;
        }
        if let Some(is_void) = self.is_void
            && node.is_void() != is_void
        {
            return false;
        }
        if let Some(data) = &self.data {
            return node.data().is_some_and(|own| own.is_superset(data));
        }
        true
    }
}

impl From<&str> for NodeProperties {
    fn from(node_type: &str) -> Self {
        Self::of_type(node_type)
    }
}

/// Partial description of a mark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkProperties {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub mark_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

impl MarkProperties {
    pub fn of_type(mark_type: impl Into<String>) -> Self {
        Self {
            mark_type: Some(mark_type.into()),
            data: None,
        }
    }
}
