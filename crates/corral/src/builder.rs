//! Loader builder protocol and the shared validation engine.
//!
//! [`LoaderBuilderCore`] owns the working query and performs every
//! spec-validated operation: lookups, prerequisite resolution, extension
//! bookkeeping, and default-sort application. Backend builders embed a core
//! and forward the [`ConfigurableLoaderBuilder`] protocol to it, adding only
//! their own offset/limit handling and `build` step.

use crate::error::{LoaderError, SpecError};
use crate::piece::LoaderExtension;
use crate::spec::LoaderSpec;
use crate::types::{DefaultSort, FilterValue, SortDirection};
use std::collections::HashSet;
use std::sync::Arc;

/// A finite, counted sequence of loaded items.
///
/// `total` reports the size of the full matching set. It ignores any
/// offset/limit window and does not shrink as items are consumed.
pub trait Loader<T>: Iterator<Item = T> {
    /// Total number of matching items.
    fn total(&self) -> u64;
}

/// Terminal step shared by every loader builder.
pub trait LoaderBuilder<T> {
    /// Loader type produced by `build`.
    type Loader: Loader<T>;
    /// Error type produced by `build`.
    type Error;

    /// Consume the builder and produce the loader.
    ///
    /// Taking `self` by value makes reuse after build unrepresentable.
    fn build(self) -> Result<Self::Loader, Self::Error>;
}

/// Builder protocol for spec-constrained loaders.
///
/// Implementations accumulate caller requests against a working query of type
/// `Q`, validating each request before applying it. A failed call returns the
/// error and leaves the working query exactly as it was.
pub trait ConfigurableLoaderBuilder<T, Q>: LoaderBuilder<T> {
    /// Apply the named extension, if declared. Extensions already applied
    /// this session are skipped.
    fn apply_extension(&mut self, name: &str) -> Result<(), LoaderError>;

    /// Order results by a declared sortable field. Later calls append
    /// ordering criteria rather than replacing earlier ones.
    fn add_sort(&mut self, field: &str, direction: SortDirection) -> Result<(), LoaderError>;

    /// Narrow results by a declared filter.
    fn add_filter(
        &mut self,
        field: &str,
        operator: &str,
        reference_value: Option<&FilterValue>,
    ) -> Result<(), LoaderError>;

    /// Skip the first `offset` matching items.
    fn set_offset(&mut self, offset: u64);

    /// Cap the number of returned items.
    fn set_limit(&mut self, limit: u64);

    /// Position the offset/limit window on a zero-indexed page.
    fn set_page(&mut self, page: u64, items_per_page: u64) -> Result<(), LoaderError> {
        let offset = page
            .checked_mul(items_per_page)
            .ok_or(LoaderError::PageOverflow {
                page,
                items_per_page,
            })?;
        self.set_limit(items_per_page);
        self.set_offset(offset);
        Ok(())
    }

    /// Read access to the working query.
    fn query(&self) -> &Q;
}

/// Validation and accumulation engine shared by loader builders.
///
/// Owns the working query plus the per-session extension bookkeeping. Every
/// lookup, including prerequisite extensions, completes before any transform
/// runs, so an error leaves the query untouched.
pub struct LoaderBuilderCore<Q> {
    spec: Arc<LoaderSpec<Q>>,
    query: Q,
    applied_extensions: HashSet<String>,
    explicit_sort: bool,
}

impl<Q> LoaderBuilderCore<Q> {
    /// Create a core over a shared spec and a starting query.
    pub fn new(spec: Arc<LoaderSpec<Q>>, query: Q) -> Self {
        Self {
            spec,
            query,
            applied_extensions: HashSet::new(),
            explicit_sort: false,
        }
    }

    /// The spec this builder validates against.
    pub fn spec(&self) -> &LoaderSpec<Q> {
        &self.spec
    }

    /// The working query.
    pub fn query(&self) -> &Q {
        &self.query
    }

    /// Mutable access for backend-specific concerns (offset/limit windows).
    pub fn query_mut(&mut self) -> &mut Q {
        &mut self.query
    }

    /// Whether an explicit sort has been requested this session.
    pub fn has_explicit_sort(&self) -> bool {
        self.explicit_sort
    }

    /// Names of extensions already applied this session.
    pub fn applied_extensions(&self) -> &HashSet<String> {
        &self.applied_extensions
    }

    /// Apply the named extension, resolving its prerequisites first.
    pub fn apply_extension(&mut self, name: &str) -> Result<(), LoaderError> {
        if self.applied_extensions.contains(name) {
            tracing::debug!(extension = %name, "extension already applied, skipping");
            return Ok(());
        }
        let mut plan = Vec::new();
        let mut planned = HashSet::new();
        self.plan_extension(name, &mut plan, &mut planned)?;
        self.run_extensions(plan);
        Ok(())
    }

    /// Order the working query by a declared sortable field.
    pub fn add_sort(&mut self, field: &str, direction: SortDirection) -> Result<(), LoaderError> {
        let sort = self
            .spec
            .sort(field)
            .cloned()
            .ok_or_else(|| LoaderError::UnknownSortField(field.to_string()))?;
        let plan = self.plan_requirements(sort.required_extensions())?;
        self.run_extensions(plan);
        tracing::debug!(field = %field, direction = ?direction, "applying sort");
        sort.apply_sorting(&mut self.query, direction);
        self.explicit_sort = true;
        Ok(())
    }

    /// Narrow the working query by a declared filter.
    pub fn add_filter(
        &mut self,
        field: &str,
        operator: &str,
        reference_value: Option<&FilterValue>,
    ) -> Result<(), LoaderError> {
        let Some(operators) = self.spec.operators(field) else {
            return Err(LoaderError::UnknownFilterField(field.to_string()));
        };
        let filter =
            operators
                .get(operator)
                .cloned()
                .ok_or_else(|| LoaderError::UnsupportedOperator {
                    field: field.to_string(),
                    operator: operator.to_string(),
                })?;
        let plan = self.plan_requirements(filter.required_extensions())?;
        self.run_extensions(plan);
        tracing::debug!(field = %field, operator = %operator, "applying filter");
        filter.apply_filter(&mut self.query, reference_value);
        Ok(())
    }

    /// Apply default sorts if no explicit sort was requested, then return the
    /// finished query.
    pub fn into_query(mut self) -> Result<Q, LoaderError> {
        if !self.explicit_sort {
            let defaults = self.spec.default_sort_by().to_vec();
            for default in &defaults {
                self.apply_default_sort(default)?;
            }
        }
        Ok(self.query)
    }

    fn apply_default_sort(&mut self, default: &DefaultSort) -> Result<(), LoaderError> {
        let sort = self
            .spec
            .sort(&default.field)
            .cloned()
            .ok_or_else(|| SpecError::DanglingDefaultSort {
                field: default.field.clone(),
            })?;
        let plan = self.plan_requirements(sort.required_extensions())?;
        self.run_extensions(plan);
        tracing::debug!(field = %default.field, direction = ?default.direction, "applying default sort");
        sort.apply_sorting(&mut self.query, default.direction);
        Ok(())
    }

    /// Resolve a piece's prerequisites into an ordered application plan,
    /// skipping extensions already applied this session.
    fn plan_requirements(
        &self,
        required: &[String],
    ) -> Result<ExtensionPlan<Q>, LoaderError> {
        let mut plan = Vec::new();
        let mut planned = HashSet::new();
        for name in required {
            self.plan_extension(name, &mut plan, &mut planned)?;
        }
        Ok(plan)
    }

    fn plan_extension(
        &self,
        name: &str,
        plan: &mut ExtensionPlan<Q>,
        planned: &mut HashSet<String>,
    ) -> Result<(), LoaderError> {
        if self.applied_extensions.contains(name) || planned.contains(name) {
            return Ok(());
        }
        let extension = self
            .spec
            .extension(name)
            .cloned()
            .ok_or_else(|| LoaderError::UnknownExtension(name.to_string()))?;
        planned.insert(name.to_string());
        for dep in extension.required_extensions() {
            self.plan_extension(dep, plan, planned)?;
        }
        plan.push((name.to_string(), extension));
        Ok(())
    }

    fn run_extensions(&mut self, plan: ExtensionPlan<Q>) {
        for (name, extension) in plan {
            tracing::debug!(extension = %name, "applying extension");
            extension.apply_extension(&mut self.query);
            self.applied_extensions.insert(name);
        }
    }
}

type ExtensionPlan<Q> = Vec<(String, Arc<dyn LoaderExtension<Q>>)>;
