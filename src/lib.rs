//! richtext-core: an immutable rich-text document model with range-based
//! editing.
//!
//! The crate provides:
//!
//! - **Value model** - documents, blocks, inlines and texts with per-character
//!   marks, plus ranges and the document/selection pair
//! - **Document queries** - ancestry, sibling and range lookups on any node
//! - **Changes** - primitive by-key mutations, a range editing engine built on
//!   them, and the same edits applied to the current selection
//! - **Schema** - bottom-up repair of structural invariants after each edit
//!
//! # Quick Start
//!
//! ```rust
//! use richtext_core::{Block, Change, Document, Range, Text, Value};
//!
//! let paragraph = Block::new("p", "paragraph", vec![Text::new("t", "Hello").into()]);
//! let value = Value::new(Document::new("d", vec![paragraph.into()]))
//!     .with_selection(Range::collapsed("t", 5));
//!
//! let mut change = Change::new(value);
//! change.insert_text(" world", None::<richtext_core::MarkSet>).unwrap();
//! change.add_mark("bold").unwrap();
//!
//! assert_eq!(change.document().text(), "Hello world");
//! ```

// Edits over a value and the operation log
pub mod changes;

pub mod error;

// Immutable value model and document queries
pub mod models;

// Coercion of loose arguments
pub mod normalize;

// Structural rules
pub mod schema;

pub mod string;

pub use changes::{Change, ChangeOptions, Operation};
pub use error::{EditError, EditResult};
pub use models::{
    Block, Character, CounterKeyGenerator, Data, Document, Inline, Key, KeyGenerator, Mark,
    MarkProperties, MarkSet, Node, NodeKind, NodeProperties, Range, Text, UuidKeyGenerator, Value,
};
pub use normalize::{BlockInput, InlineInput, MarkInput, MarksInput, NodeInput, PropertiesInput};
pub use schema::{CoreSchema, DEFAULT_MAX_ITERATIONS, Schema, SchemaConfig};
