//! Error types for the jsonschema-go-gen crate.

use std::path::PathBuf;

/// Errors that can occur while loading a schema or generating Go code.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The schema document is structurally unusable for generation.
    #[error("schema error: {0}")]
    Schema(String),

    /// An `allOf` composition did not have exactly two elements.
    #[error("definition '{name}': allOf must hold exactly a $ref base and one body, found {arity} element(s)")]
    AllOfArity { name: String, arity: usize },

    /// A `$ref` did not point into `#/definitions/`.
    #[error("'{context}': not a '#/definitions/' reference: '{reference}'")]
    BadRef { context: String, reference: String },

    /// A top-level definition did not end up with exactly one type name.
    #[error("definition '{name}': expected exactly one type after normalization, found {count}")]
    TypeArity { name: String, count: usize },

    /// A primitive type name has no entry in the type-mapping table.
    #[error("'{context}': no Go mapping for schema type '{type_name}'")]
    UnmappedType { context: String, type_name: String },

    /// A definition carries no `$ref` and no usable type shape.
    #[error("'{context}': definition has no resolvable shape (no $ref, no usable type)")]
    Unresolvable { context: String },

    /// A discriminator property cannot drive decode dispatch for its base.
    #[error("decode helper for base '{base}' keyed on '{property}': {detail}")]
    Discriminator {
        base: String,
        property: String,
        detail: String,
    },

    /// Failed to write the generated source.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to read a file from disk.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON parse error with context.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Network error during schema download.
    #[cfg(feature = "download")]
    #[error("download failed: {0}")]
    Download(String),
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
