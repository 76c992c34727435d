//! Immutable value model: marks, characters, the node tree, ranges.

mod character;
mod data;
mod key;
mod mark;
mod node;
mod properties;
mod query;
mod range;
mod text;
mod value;

pub use character::Character;
pub use data::Data;
pub use key::{CounterKeyGenerator, Key, KeyGenerator, UuidKeyGenerator};
pub use mark::{Mark, MarkSet};
pub use node::{Block, Document, Inline, Node, NodeKind};
pub use properties::{MarkProperties, NodeProperties};
pub use range::Range;
pub use text::Text;
pub use value::Value;
