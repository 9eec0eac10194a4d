//! Loader error types.

use thiserror::Error;

/// Errors returned while configuring or building a loader.
///
/// Every variant is recoverable: a failed call leaves the builder's working
/// query untouched, so the caller may report the problem and continue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoaderError {
    /// An extension was requested, directly or as a prerequisite, that the
    /// spec does not declare.
    #[error("unknown extension: {0}")]
    UnknownExtension(String),

    /// A sort was requested on a field the spec does not declare as sortable.
    #[error("unknown sortable field: {0}")]
    UnknownSortField(String),

    /// A filter was requested on a field the spec does not declare as
    /// filterable.
    #[error("unknown filterable field: {0}")]
    UnknownFilterField(String),

    /// A filter was requested with an operator the field does not support.
    #[error("field '{field}' does not support operator '{operator}'")]
    UnsupportedOperator { field: String, operator: String },

    /// Page arithmetic overflowed the offset.
    #[error("page {page} with {items_per_page} items per page overflows the offset")]
    PageOverflow { page: u64, items_per_page: u64 },

    /// The spec itself is inconsistent. Validated specs cannot produce this;
    /// it surfaces only on clones edited after construction.
    #[error(transparent)]
    Spec(#[from] SpecError),
}

/// Inconsistencies detected while validating a spec's declarations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    /// A default sort references a field missing from the sortable table.
    #[error("default sort references unknown sortable field: {field}")]
    DanglingDefaultSort { field: String },

    /// A piece requires an extension missing from the extension table.
    #[error("{piece} requires unknown extension: {extension}")]
    DanglingRequiredExtension { piece: String, extension: String },

    /// Extension prerequisites form a cycle.
    #[error("extension prerequisite cycle through: {extension}")]
    ExtensionCycle { extension: String },
}
