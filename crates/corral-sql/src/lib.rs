//! SeaQuery backend for corral loader specs.
//!
//! Provides column-level filter and sort pieces, join extensions, and a
//! [`SqlLoaderBuilder`] that renders PostgreSQL and executes it through the
//! [`SqlRunner`] seam. Specs are declared over `sea_query::SelectStatement`,
//! so any piece that can reshape a select works here unchanged.

pub mod builder;
pub mod filter;
pub mod join;
pub mod sort;

pub use builder::{SqlBuildError, SqlLoader, SqlLoaderBuilder, SqlRunner};
pub use filter::{ColumnFilter, Comparison};
pub use join::{JoinExtension, JoinKind};
pub use sort::{ColumnSort, NullsOrder};
