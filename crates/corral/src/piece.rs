//! Transformer traits implemented by spec pieces.
//!
//! A piece is a filter, sort, or extension declared in a
//! [`LoaderSpec`](crate::spec::LoaderSpec). Each piece knows how to transform
//! one concrete query type `Q`; the builder resolves pieces by name and
//! applies them to its working query.

use crate::types::{FilterValue, SortDirection};

/// Common behavior of every spec piece.
///
/// `required_extensions` names the extensions that must be applied to the
/// query before this piece's own transform runs, in order. Names are resolved
/// against the owning spec's extension table.
pub trait SpecPiece: Send + Sync {
    /// Extensions this piece depends on, in application order.
    fn required_extensions(&self) -> &[String] {
        &[]
    }
}

/// A filter a caller may request on a declared field and operator.
pub trait QueryFilter<Q>: SpecPiece {
    /// Narrow the query by this filter.
    ///
    /// `reference_value` is the caller-supplied comparison value; pieces that
    /// need no value (null checks) receive `None`.
    fn apply_filter(&self, query: &mut Q, reference_value: Option<&FilterValue>);
}

/// An ordering a caller may request on a declared field.
pub trait QuerySort<Q>: SpecPiece {
    /// Order the query by this sort in `direction`.
    fn apply_sorting(&self, query: &mut Q, direction: SortDirection);
}

/// A named query transformation other pieces may depend on.
///
/// Extensions are applied at most once per build session; repeated requests
/// are skipped by the builder.
pub trait LoaderExtension<Q>: SpecPiece {
    /// Apply this extension to the query.
    fn apply_extension(&self, query: &mut Q);
}
