//! Constrained, declarative data loaders.
//!
//! A [`LoaderSpec`] declares what a loader allows: which fields can be
//! sorted, which field/operator pairs can be filtered, and which named
//! extensions can reshape the query. Builders implementing
//! [`ConfigurableLoaderBuilder`] validate every caller request against the
//! spec before touching the query, resolve prerequisite extensions exactly
//! once per session, and finish into a counted [`Loader`].
//!
//! The spec and builder machinery are generic over the query type, so the
//! same declarations drive the in-memory backend in [`memory`] as well as
//! external backends built on other query representations.

pub mod builder;
pub mod error;
pub mod memory;
pub mod page;
pub mod piece;
pub mod registry;
pub mod spec;
pub mod types;

pub use builder::{ConfigurableLoaderBuilder, Loader, LoaderBuilder, LoaderBuilderCore};
pub use error::{LoaderError, SpecError};
pub use page::PageInfo;
pub use piece::{LoaderExtension, QueryFilter, QuerySort, SpecPiece};
pub use registry::SpecRegistry;
pub use spec::{LoaderSpec, LoaderSpecBuilder};
pub use types::{DefaultSort, FilterValue, SortDirection};
