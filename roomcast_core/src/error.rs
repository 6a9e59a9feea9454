use thiserror::Error;

/// Reasons a reasoning-service payload is rejected outright.
///
/// Anything finer-grained than these (unknown item ids, out-of-range
/// coordinates, odd rotation values) is repaired by the validator instead.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("response is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("response is not a JSON object")]
    NotAnObject,
    #[error("response is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` should be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

/// Failure to produce geometry for a variant's model reference. Always
/// recovered by substituting a placeholder box.
#[derive(Debug, Error)]
pub enum AssetLoadError {
    #[error("could not read model {model}: {reason}")]
    Unreadable { model: String, reason: String },
    #[error("model {model} is not a readable glTF document: {reason}")]
    Malformed { model: String, reason: String },
    #[error("model {0} has no position bounds")]
    MissingBounds(String),
    #[error("model {0} has a zero-sized bounding box")]
    DegenerateBounds(String),
}

/// Problems found while turning a furniture catalog into room state.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON could not be decoded: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog lists no furniture")]
    Empty,
    #[error("catalog lists item `{0}` more than once")]
    DuplicateId(String),
    #[error("item `{0}` has no variants")]
    NoVariants(String),
    #[error("item `{id}` variant `{label}` has a non-positive dimension")]
    InvalidDimension { id: String, label: String },
    #[error("item `{id}` variant `{label}` does not fit inside the room")]
    OversizedVariant { id: String, label: String },
    #[error("item `{0}` starts outside the room bounds")]
    StartOutOfBounds(String),
}
