//! In-memory loader backend.
//!
//! [`MemoryQuery`] is a deferred pipeline over an owned `Vec<T>`: filters
//! accumulate as boxed predicates, sorts as boxed comparators, and the window
//! as offset/limit fields. Nothing runs until the builder finishes, so spec
//! pieces stay cheap to apply and free to compose in any order.

use crate::builder::{ConfigurableLoaderBuilder, Loader, LoaderBuilder, LoaderBuilderCore};
use crate::error::LoaderError;
use crate::piece::{LoaderExtension, QueryFilter, QuerySort, SpecPiece};
use crate::spec::LoaderSpec;
use crate::types::{FilterValue, SortDirection};
use std::cmp::Ordering;
use std::sync::Arc;

/// Boxed row predicate accumulated by [`MemoryQuery`].
pub type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Boxed row comparator accumulated by [`MemoryQuery`].
pub type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Deferred query over an owned item set.
pub struct MemoryQuery<T> {
    items: Vec<T>,
    predicates: Vec<Predicate<T>>,
    ordering: Vec<(Comparator<T>, SortDirection)>,
    offset: u64,
    limit: Option<u64>,
}

impl<T> MemoryQuery<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            predicates: Vec::new(),
            ordering: Vec::new(),
            offset: 0,
            limit: None,
        }
    }

    /// Add a predicate; an item must satisfy every predicate to match.
    pub fn push_predicate(&mut self, predicate: Predicate<T>) {
        self.predicates.push(predicate);
    }

    /// Add an ordering criterion. Earlier criteria take precedence, later
    /// ones break ties.
    pub fn push_ordering(&mut self, comparator: Comparator<T>, direction: SortDirection) {
        self.ordering.push((comparator, direction));
    }

    /// Replace the item set wholesale.
    pub fn map_items(&mut self, transform: impl FnOnce(Vec<T>) -> Vec<T>) {
        let items = std::mem::take(&mut self.items);
        self.items = transform(items);
    }

    pub fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }

    pub fn set_limit(&mut self, limit: u64) {
        self.limit = Some(limit);
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn predicate_count(&self) -> usize {
        self.predicates.len()
    }

    pub fn ordering_count(&self) -> usize {
        self.ordering.len()
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Run the pipeline: filter, count, sort, then window.
    ///
    /// Returns the windowed items and the total number of matching items
    /// before the window. The sort is stable, so rows the comparators
    /// consider equal keep their input order.
    fn execute(self) -> (Vec<T>, u64) {
        let Self {
            items,
            predicates,
            ordering,
            offset,
            limit,
        } = self;

        let mut matching: Vec<T> = items
            .into_iter()
            .filter(|item| predicates.iter().all(|predicate| predicate(item)))
            .collect();
        let total = u64::try_from(matching.len()).unwrap_or(u64::MAX);

        if !ordering.is_empty() {
            matching.sort_by(|a, b| {
                for (comparator, direction) in &ordering {
                    let ordered = match direction {
                        SortDirection::Desc => comparator(a, b).reverse(),
                        SortDirection::Asc | SortDirection::Unspecified => comparator(a, b),
                    };
                    if ordered != Ordering::Equal {
                        return ordered;
                    }
                }
                Ordering::Equal
            });
        }

        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let mut windowed: Vec<T> = matching.into_iter().skip(skip).collect();
        if let Some(limit) = limit {
            windowed.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        (windowed, total)
    }
}

/// Filter piece for [`MemoryQuery`], built from a row predicate.
///
/// The predicate receives the caller's reference value on every row, so one
/// piece can serve any comparison the closure chooses to implement.
pub struct MemoryFilter<T> {
    predicate: Arc<dyn Fn(&T, Option<&FilterValue>) -> bool + Send + Sync>,
    required_extensions: Vec<String>,
}

impl<T> MemoryFilter<T> {
    pub fn new(
        predicate: impl Fn(&T, Option<&FilterValue>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            predicate: Arc::new(predicate),
            required_extensions: Vec::new(),
        }
    }

    /// Declare extensions that must run before this filter applies.
    #[must_use]
    pub fn requires(mut self, extensions: &[&str]) -> Self {
        self.required_extensions = extensions.iter().map(ToString::to_string).collect();
        self
    }
}

impl<T> SpecPiece for MemoryFilter<T> {
    fn required_extensions(&self) -> &[String] {
        &self.required_extensions
    }
}

impl<T: 'static> QueryFilter<MemoryQuery<T>> for MemoryFilter<T> {
    fn apply_filter(&self, query: &mut MemoryQuery<T>, reference_value: Option<&FilterValue>) {
        let predicate = Arc::clone(&self.predicate);
        let value = reference_value.cloned();
        query.push_predicate(Box::new(move |item| predicate(item, value.as_ref())));
    }
}

/// Sort piece for [`MemoryQuery`], built from a row comparator.
pub struct MemorySort<T> {
    comparator: Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>,
    required_extensions: Vec<String>,
}

impl<T> MemorySort<T> {
    pub fn new(comparator: impl Fn(&T, &T) -> Ordering + Send + Sync + 'static) -> Self {
        Self {
            comparator: Arc::new(comparator),
            required_extensions: Vec::new(),
        }
    }

    /// Compare rows by an extracted key.
    pub fn by_key<K, F>(key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self::new(move |a, b| key(a).cmp(&key(b)))
    }

    /// Declare extensions that must run before this sort applies.
    #[must_use]
    pub fn requires(mut self, extensions: &[&str]) -> Self {
        self.required_extensions = extensions.iter().map(ToString::to_string).collect();
        self
    }
}

impl<T> SpecPiece for MemorySort<T> {
    fn required_extensions(&self) -> &[String] {
        &self.required_extensions
    }
}

impl<T: 'static> QuerySort<MemoryQuery<T>> for MemorySort<T> {
    fn apply_sorting(&self, query: &mut MemoryQuery<T>, direction: SortDirection) {
        let comparator = Arc::clone(&self.comparator);
        query.push_ordering(Box::new(move |a, b| comparator(a, b)), direction);
    }
}

/// Extension piece for [`MemoryQuery`], built from an item-set transform.
pub struct MemoryExtension<T> {
    transform: Arc<dyn Fn(Vec<T>) -> Vec<T> + Send + Sync>,
    required_extensions: Vec<String>,
}

impl<T> MemoryExtension<T> {
    pub fn new(transform: impl Fn(Vec<T>) -> Vec<T> + Send + Sync + 'static) -> Self {
        Self {
            transform: Arc::new(transform),
            required_extensions: Vec::new(),
        }
    }

    /// Declare extensions that must run before this one.
    #[must_use]
    pub fn requires(mut self, extensions: &[&str]) -> Self {
        self.required_extensions = extensions.iter().map(ToString::to_string).collect();
        self
    }
}

impl<T> SpecPiece for MemoryExtension<T> {
    fn required_extensions(&self) -> &[String] {
        &self.required_extensions
    }
}

impl<T> LoaderExtension<MemoryQuery<T>> for MemoryExtension<T> {
    fn apply_extension(&self, query: &mut MemoryQuery<T>) {
        query.map_items(|items| (self.transform)(items));
    }
}

/// Spec-constrained builder over an in-memory item set.
pub struct MemoryLoaderBuilder<T> {
    core: LoaderBuilderCore<MemoryQuery<T>>,
}

impl<T> MemoryLoaderBuilder<T> {
    pub fn new(spec: Arc<LoaderSpec<MemoryQuery<T>>>, items: Vec<T>) -> Self {
        Self {
            core: LoaderBuilderCore::new(spec, MemoryQuery::new(items)),
        }
    }
}

impl<T> LoaderBuilder<T> for MemoryLoaderBuilder<T> {
    type Loader = MemoryLoader<T>;
    type Error = LoaderError;

    fn build(self) -> Result<Self::Loader, Self::Error> {
        let (items, total) = self.core.into_query()?.execute();
        Ok(MemoryLoader {
            items: items.into_iter(),
            total,
        })
    }
}

impl<T> ConfigurableLoaderBuilder<T, MemoryQuery<T>> for MemoryLoaderBuilder<T> {
    fn apply_extension(&mut self, name: &str) -> Result<(), LoaderError> {
        self.core.apply_extension(name)
    }

    fn add_sort(&mut self, field: &str, direction: SortDirection) -> Result<(), LoaderError> {
        self.core.add_sort(field, direction)
    }

    fn add_filter(
        &mut self,
        field: &str,
        operator: &str,
        reference_value: Option<&FilterValue>,
    ) -> Result<(), LoaderError> {
        self.core.add_filter(field, operator, reference_value)
    }

    fn set_offset(&mut self, offset: u64) {
        self.core.query_mut().set_offset(offset);
    }

    fn set_limit(&mut self, limit: u64) {
        self.core.query_mut().set_limit(limit);
    }

    fn query(&self) -> &MemoryQuery<T> {
        self.core.query()
    }
}

/// Finished in-memory loader: the windowed items plus the pre-window total.
pub struct MemoryLoader<T> {
    items: std::vec::IntoIter<T>,
    total: u64,
}

impl<T> Iterator for MemoryLoader<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.items.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

impl<T> Loader<T> for MemoryLoader<T> {
    fn total(&self) -> u64 {
        self.total
    }
}
