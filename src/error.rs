use crate::models::Key;

/// Errors raised by constructors, argument normalization and change operations.
///
/// Structural no-ops (deleting a collapsed range, inserting into a void) are
/// not errors; they return `Ok(())` and leave the change untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("invalid `{expected}` argument: {reason}")]
    InvalidArgument {
        expected: &'static str,
        reason: String,
    },
    #[error("a `type` is required to create a {0}")]
    MissingType(&'static str),
    #[error("no node with key `{0}`")]
    NodeNotFound(Key),
    #[error("key `{0}` is already used in the document")]
    DuplicateKey(Key),
    #[error("node `{0}` is not a text node")]
    NotText(Key),
    #[error("node `{0}` cannot hold children here")]
    NotContainer(Key),
    #[error("offset {offset} is out of bounds for `{key}`")]
    InvalidOffset { key: Key, offset: usize },
    #[error("index {index} is out of bounds for `{key}`")]
    InvalidIndex { key: Key, index: usize },
    #[error("the value has no selection")]
    NoSelection,
    #[error("normalizing `{key}` did not settle after {iterations} passes")]
    NormalizationLimit { key: Key, iterations: usize },
}

impl EditError {
    pub(crate) fn invalid(expected: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            expected,
            reason: reason.into(),
        }
    }
}

pub type EditResult = Result<(), EditError>;
