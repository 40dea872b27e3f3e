use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Unresolved chain call in {part}: no `{base}` method with matching parameters to chain from")]
    UnresolvedChainCall { base: String, part: String },

    #[error("Malformed chain alias: {0:?}")]
    MalformedAlias(String),

    #[error("Nothing to compose into {0}: the part list is empty")]
    NoParts(String),

    #[error("Duplicate field `{field}` contributed by {part}")]
    DuplicateField { field: String, part: String },

    #[error("Unit not found: {0}")]
    UnitNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
