//! Coercion of loose arguments into value-model instances.
//!
//! Each input union lists what a caller may pass. Typed variants are
//! accepted as is, strings become a `type`, and JSON objects are read
//! through serde. Node handles are checked at runtime: an inline handle
//! passed where a block is expected is rejected, never converted.

use crate::error::EditError;
use crate::models::{
    Block, Data, Document, Inline, KeyGenerator, Mark, MarkProperties, MarkSet, Node,
    NodeProperties, Text,
};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone)]
pub enum MarkInput {
    Mark(Mark),
    Type(String),
    Properties(MarkProperties),
    Json(JsonValue),
}

#[derive(Debug, Clone)]
pub enum MarksInput {
    Set(MarkSet),
    List(Vec<MarkInput>),
    Null,
}

#[derive(Debug, Clone)]
pub enum BlockInput {
    Block(Block),
    Node(Node),
    Type(String),
    Properties(NodeProperties),
    Json(JsonValue),
}

#[derive(Debug, Clone)]
pub enum InlineInput {
    Inline(Inline),
    Node(Node),
    Type(String),
    Properties(NodeProperties),
    Json(JsonValue),
}

#[derive(Debug, Clone)]
pub enum NodeInput {
    Node(Node),
    Json(JsonValue),
}

#[derive(Debug, Clone)]
pub enum PropertiesInput {
    Type(String),
    Properties(NodeProperties),
    Node(Node),
    Json(JsonValue),
}

macro_rules! impl_from {
    ($target:ident { $($source:ty => $variant:ident),* $(,)? }) => {
        $(
            impl From<$source> for $target {
                fn from(value: $source) -> Self {
                    $target::$variant(value.into())
                }
            }
        )*
    };
}

impl_from!(MarkInput {
    Mark => Mark,
    &str => Type,
    String => Type,
    MarkProperties => Properties,
    JsonValue => Json,
});

impl_from!(MarksInput {
    MarkSet => Set,
    Vec<MarkInput> => List,
});

impl_from!(BlockInput {
    Block => Block,
    Node => Node,
    &str => Type,
    String => Type,
    NodeProperties => Properties,
    JsonValue => Json,
});

impl_from!(InlineInput {
    Inline => Inline,
    Node => Node,
    &str => Type,
    String => Type,
    NodeProperties => Properties,
    JsonValue => Json,
});

impl_from!(NodeInput {
    Node => Node,
    Block => Node,
    Inline => Node,
    Text => Node,
    JsonValue => Json,
});

impl_from!(PropertiesInput {
    &str => Type,
    String => Type,
    NodeProperties => Properties,
    Node => Node,
    JsonValue => Json,
});

impl From<Vec<Mark>> for MarksInput {
    fn from(marks: Vec<Mark>) -> Self {
        MarksInput::Set(marks.into())
    }
}

impl<T: Into<MarksInput>> From<Option<T>> for MarksInput {
    fn from(marks: Option<T>) -> Self {
        marks.map_or(MarksInput::Null, Into::into)
    }
}

pub fn mark(input: impl Into<MarkInput>) -> Result<Mark, EditError> {
    let properties = match input.into() {
        MarkInput::Mark(mark) => return Ok(mark),
        MarkInput::Type(mark_type) => MarkProperties::of_type(mark_type),
        MarkInput::Properties(properties) => properties,
        MarkInput::Json(value) => mark_properties(value)?,
    };
    let mark_type = properties.mark_type.ok_or(EditError::MissingType("mark"))?;
    Ok(Mark {
        mark_type,
        data: properties.data.unwrap_or_default(),
    })
}

/// `Null` means "no explicit marks" and maps to `None`.
pub fn marks(input: impl Into<MarksInput>) -> Result<Option<MarkSet>, EditError> {
    match input.into() {
        MarksInput::Set(set) => Ok(Some(set)),
        MarksInput::List(list) => list
            .into_iter()
            .map(mark)
            .collect::<Result<MarkSet, _>>()
            .map(Some),
        MarksInput::Null => Ok(None),
    }
}

pub fn block(input: impl Into<BlockInput>, keys: &mut dyn KeyGenerator) -> Result<Block, EditError> {
    match input.into() {
        BlockInput::Block(block) => Ok(block),
        BlockInput::Node(node) => match node {
            Node::Block(block) => Ok((*block).clone()),
            other => Err(wrong_kind("block", &other)),
        },
        BlockInput::Type(node_type) => Block::create(NodeProperties::of_type(node_type), Vec::new(), keys),
        BlockInput::Properties(properties) => Block::create(properties, Vec::new(), keys),
        BlockInput::Json(value) => match node_from_json(&value, Some("block"), keys)? {
            Node::Block(block) => Ok((*block).clone()),
            other => Err(wrong_kind("block", &other)),
        },
    }
}

pub fn inline(input: impl Into<InlineInput>, keys: &mut dyn KeyGenerator) -> Result<Inline, EditError> {
    match input.into() {
        InlineInput::Inline(inline) => Ok(inline),
        InlineInput::Node(node) => match node {
            Node::Inline(inline) => Ok((*inline).clone()),
            other => Err(wrong_kind("inline", &other)),
        },
        InlineInput::Type(node_type) => {
            Inline::create(NodeProperties::of_type(node_type), Vec::new(), keys)
        }
        InlineInput::Properties(properties) => Inline::create(properties, Vec::new(), keys),
        InlineInput::Json(value) => match node_from_json(&value, Some("inline"), keys)? {
            Node::Inline(inline) => Ok((*inline).clone()),
            other => Err(wrong_kind("inline", &other)),
        },
    }
}

/// Any child node. JSON objects must name their `kind`.
pub fn node(input: impl Into<NodeInput>, keys: &mut dyn KeyGenerator) -> Result<Node, EditError> {
    match input.into() {
        NodeInput::Node(Node::Document(_)) => Err(EditError::invalid(
            "node",
            "a document cannot be inserted as a child",
        )),
        NodeInput::Node(node) => Ok(node),
        NodeInput::Json(value) => node_from_json(&value, None, keys),
    }
}

pub fn node_properties(input: impl Into<PropertiesInput>) -> Result<NodeProperties, EditError> {
    match input.into() {
        PropertiesInput::Type(node_type) => Ok(NodeProperties::of_type(node_type)),
        PropertiesInput::Properties(properties) => Ok(properties),
        PropertiesInput::Node(node) => Ok(NodeProperties::of_node(&node)),
        PropertiesInput::Json(JsonValue::String(node_type)) => Ok(NodeProperties::of_type(node_type)),
        PropertiesInput::Json(value @ JsonValue::Object(_)) => {
            serde_json::from_value(value).map_err(|err| EditError::invalid("properties", err.to_string()))
        }
        PropertiesInput::Json(other) => Err(EditError::invalid(
            "properties",
            format!("expected a string or an object, got {other}"),
        )),
    }
}

pub fn mark_properties(value: JsonValue) -> Result<MarkProperties, EditError> {
    match value {
        JsonValue::String(mark_type) => Ok(MarkProperties::of_type(mark_type)),
        JsonValue::Object(ref map) => {
            if let Some(kind) = map.get("kind").and_then(JsonValue::as_str)
                && kind != "mark"
            {
                return Err(EditError::invalid("mark", format!("got a `{kind}`")));
            }
            serde_json::from_value(value).map_err(|err| EditError::invalid("mark", err.to_string()))
        }
        other => Err(EditError::invalid(
            "mark",
            format!("expected a string or an object, got {other}"),
        )),
    }
}

/// Fragment document from a JSON object holding `nodes`.
pub fn fragment(value: &JsonValue, keys: &mut dyn KeyGenerator) -> Result<Document, EditError> {
    let nodes = children_from_json(value, keys)?;
    let data = match value.get("data") {
        Some(data) => serde_json::from_value::<Data>(data.clone())
            .map_err(|err| EditError::invalid("document", err.to_string()))?,
        None => Data::new(),
    };
    Ok(Document::create(nodes, keys).with_data(data))
}

fn wrong_kind(expected: &'static str, node: &Node) -> EditError {
    EditError::invalid(expected, format!("got a `{}` node", node.kind().as_str()))
}

fn node_from_json(
    value: &JsonValue,
    default_kind: Option<&str>,
    keys: &mut dyn KeyGenerator,
) -> Result<Node, EditError> {
    let expected = default_kind.map_or("node", |kind| if kind == "block" { "block" } else { "inline" });
    if let JsonValue::String(node_type) = value {
        let properties = NodeProperties::of_type(node_type.clone());
        return match default_kind {
            Some("block") => Ok(Block::create(properties, Vec::new(), keys)?.into()),
            Some(_) => Ok(Inline::create(properties, Vec::new(), keys)?.into()),
            None => Err(EditError::invalid("node", "a bare string has no `kind`")),
        };
    }
    let JsonValue::Object(map) = value else {
        return Err(EditError::invalid(expected, format!("expected an object, got {value}")));
    };
    let kind = map
        .get("kind")
        .and_then(JsonValue::as_str)
        .or(default_kind)
        .ok_or_else(|| EditError::invalid("node", "missing `kind`"))?;
    match kind {
        "block" | "inline" => {
            let properties: NodeProperties = serde_json::from_value(value.clone())
                .map_err(|err| EditError::invalid(expected, err.to_string()))?;
            let nodes = children_from_json(value, keys)?;
            if kind == "block" {
                Ok(Block::create(properties, nodes, keys)?.into())
            } else {
                Ok(Inline::create(properties, nodes, keys)?.into())
            }
        }
        "text" => {
            let key = match map.get("key").and_then(JsonValue::as_str) {
                Some(key) => key.to_string(),
                None => keys.generate_key(),
            };
            let text = map.get("text").and_then(JsonValue::as_str).unwrap_or("");
            let marks = match map.get("marks") {
                Some(marks) => serde_json::from_value::<MarkSet>(marks.clone())
                    .map_err(|err| EditError::invalid("text", err.to_string()))?,
                None => MarkSet::new(),
            };
            Ok(Text::with_marks(key, text, &marks).into())
        }
        other => Err(EditError::invalid(expected, format!("got a `{other}`"))),
    }
}

fn children_from_json(value: &JsonValue, keys: &mut dyn KeyGenerator) -> Result<Vec<Node>, EditError> {
    match value.get("nodes") {
        None | Some(JsonValue::Null) => Ok(Vec::new()),
        Some(JsonValue::Array(items)) => items
            .iter()
            .map(|item| node_from_json(item, None, keys))
            .collect(),
        Some(other) => Err(EditError::invalid("nodes", format!("expected an array, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CounterKeyGenerator;
    use serde_json::json;

    #[test]
    fn strings_become_types() {
        let mut keys = CounterKeyGenerator::new();
        assert_eq!(mark("bold").unwrap(), Mark::new("bold"));
        let block = block("quote", &mut keys).unwrap();
        assert_eq!(block.node_type(), "quote");
        assert_eq!(block.nodes().len(), 1);
    }

    #[test]
    fn cross_kind_nodes_are_rejected() {
        let mut keys = CounterKeyGenerator::new();
        let link: Node = Inline::new("l", "link", vec![Text::empty("t").into()]).into();
        let err = block(link.clone(), &mut keys).unwrap_err();
        assert!(matches!(err, EditError::InvalidArgument { expected: "block", .. }));
        assert!(inline(link, &mut keys).is_ok());
        let err = block(json!({ "kind": "inline", "type": "link" }), &mut keys).unwrap_err();
        assert!(matches!(err, EditError::InvalidArgument { expected: "block", .. }));
    }

    #[test]
    fn missing_type_is_reported() {
        let mut keys = CounterKeyGenerator::new();
        assert_eq!(
            block(NodeProperties::default(), &mut keys).unwrap_err(),
            EditError::MissingType("block")
        );
        assert_eq!(mark(json!({ "data": {} })).unwrap_err(), EditError::MissingType("mark"));
    }

    #[test]
    fn json_nodes_build_recursively() {
        let mut keys = CounterKeyGenerator::new();
        let node = node(
            json!({
                "kind": "block",
                "type": "paragraph",
                "data": { "align": "center" },
                "nodes": [
                    { "kind": "text", "text": "hi ", "marks": [{ "type": "bold" }] },
                    { "kind": "inline", "type": "link", "nodes": [{ "kind": "text", "text": "there" }] }
                ]
            }),
            &mut keys,
        )
        .unwrap();
        assert_eq!(node.text(), "hi there");
        assert_eq!(node.nodes().len(), 2);
        assert!(node.nodes()[1].is_inline());
        assert_eq!(node.data().and_then(|data| data.get("align")), Some(&json!("center")));
    }

    #[test]
    fn properties_read_camel_case() {
        let properties = node_properties(json!({ "type": "image", "isVoid": true })).unwrap();
        assert_eq!(properties.node_type.as_deref(), Some("image"));
        assert_eq!(properties.is_void, Some(true));
        assert!(node_properties(json!(3)).is_err());
    }

    #[test]
    fn null_marks_mean_unspecified() {
        assert_eq!(marks(None::<MarkSet>).unwrap(), None);
        let list = marks(vec![MarkInput::from("bold"), MarkInput::from("bold")]).unwrap();
        assert_eq!(list.map(|set| set.len()), Some(1));
    }
}
