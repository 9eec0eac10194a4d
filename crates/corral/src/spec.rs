//! Declarative loader specs.
//!
//! A [`LoaderSpec`] is the single source of truth for what a loader endpoint
//! allows: which fields may be sorted, which field/operator pairs may be
//! filtered, and which named extensions exist. Specs are assembled once via
//! [`LoaderSpec::builder`], validated, and then shared read-only across
//! requests.

use crate::error::SpecError;
use crate::piece::{LoaderExtension, QueryFilter, QuerySort};
use crate::types::DefaultSort;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Registry of everything a loader endpoint allows.
///
/// Builders read the spec; they never write it. Call sites that need a
/// per-request variant (hiding a field behind a permission check, say) clone
/// the spec and edit the clone: cloning copies the lookup tables while
/// sharing the piece instances themselves, so edits to one copy never leak
/// into the other.
pub struct LoaderSpec<Q> {
    sortable_fields: HashMap<String, Arc<dyn QuerySort<Q>>>,
    default_sort_by: Vec<DefaultSort>,
    filterable_fields: HashMap<String, HashMap<String, Arc<dyn QueryFilter<Q>>>>,
    extensions: HashMap<String, Arc<dyn LoaderExtension<Q>>>,
}

impl<Q> Clone for LoaderSpec<Q> {
    fn clone(&self) -> Self {
        Self {
            sortable_fields: self.sortable_fields.clone(),
            default_sort_by: self.default_sort_by.clone(),
            filterable_fields: self.filterable_fields.clone(),
            extensions: self.extensions.clone(),
        }
    }
}

impl<Q> std::fmt::Debug for LoaderSpec<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderSpec")
            .field("sortable_fields", &self.sortable_field_names())
            .field("default_sort_by", &self.default_sort_by)
            .field("filterable_fields", &self.filterable_field_names())
            .field("extensions", &self.extension_names())
            .finish()
    }
}

impl<Q> LoaderSpec<Q> {
    /// Start assembling a spec.
    pub fn builder() -> LoaderSpecBuilder<Q> {
        LoaderSpecBuilder::new()
    }

    /// Look up the sort declared for `field`.
    pub fn sort(&self, field: &str) -> Option<&Arc<dyn QuerySort<Q>>> {
        self.sortable_fields.get(field)
    }

    /// Look up the filter declared for `field` under `operator`.
    pub fn filter(&self, field: &str, operator: &str) -> Option<&Arc<dyn QueryFilter<Q>>> {
        self.filterable_fields.get(field)?.get(operator)
    }

    /// Operator table declared for a filterable field.
    pub fn operators(&self, field: &str) -> Option<&HashMap<String, Arc<dyn QueryFilter<Q>>>> {
        self.filterable_fields.get(field)
    }

    /// Look up an extension by name.
    pub fn extension(&self, name: &str) -> Option<&Arc<dyn LoaderExtension<Q>>> {
        self.extensions.get(name)
    }

    /// Fallback ordering applied when a caller requests none.
    pub fn default_sort_by(&self) -> &[DefaultSort] {
        &self.default_sort_by
    }

    /// Names of declared sortable fields.
    pub fn sortable_field_names(&self) -> Vec<&str> {
        self.sortable_fields.keys().map(String::as_str).collect()
    }

    /// Names of declared filterable fields.
    pub fn filterable_field_names(&self) -> Vec<&str> {
        self.filterable_fields.keys().map(String::as_str).collect()
    }

    /// Names of declared extensions.
    pub fn extension_names(&self) -> Vec<&str> {
        self.extensions.keys().map(String::as_str).collect()
    }

    /// Declare or replace the sort for `field`.
    pub fn insert_sortable(&mut self, field: impl Into<String>, sort: Arc<dyn QuerySort<Q>>) {
        self.sortable_fields.insert(field.into(), sort);
    }

    /// Remove a sortable field, returning its piece.
    pub fn remove_sortable(&mut self, field: &str) -> Option<Arc<dyn QuerySort<Q>>> {
        self.sortable_fields.remove(field)
    }

    /// Declare or replace the filter for `field` under `operator`.
    pub fn insert_filterable(
        &mut self,
        field: impl Into<String>,
        operator: impl Into<String>,
        filter: Arc<dyn QueryFilter<Q>>,
    ) {
        self.filterable_fields
            .entry(field.into())
            .or_default()
            .insert(operator.into(), filter);
    }

    /// Remove one operator from a filterable field, returning its piece.
    /// The field itself is dropped once its last operator goes.
    pub fn remove_filterable(
        &mut self,
        field: &str,
        operator: &str,
    ) -> Option<Arc<dyn QueryFilter<Q>>> {
        let operators = self.filterable_fields.get_mut(field)?;
        let removed = operators.remove(operator);
        if operators.is_empty() {
            self.filterable_fields.remove(field);
        }
        removed
    }

    /// Remove a filterable field and all its operators.
    pub fn remove_filterable_field(
        &mut self,
        field: &str,
    ) -> Option<HashMap<String, Arc<dyn QueryFilter<Q>>>> {
        self.filterable_fields.remove(field)
    }

    /// Declare or replace a named extension.
    pub fn insert_extension(
        &mut self,
        name: impl Into<String>,
        extension: Arc<dyn LoaderExtension<Q>>,
    ) {
        self.extensions.insert(name.into(), extension);
    }

    /// Remove an extension, returning its piece.
    pub fn remove_extension(&mut self, name: &str) -> Option<Arc<dyn LoaderExtension<Q>>> {
        self.extensions.remove(name)
    }

    /// Replace the fallback ordering.
    pub fn set_default_sort_by(&mut self, default_sort_by: Vec<DefaultSort>) {
        self.default_sort_by = default_sort_by;
    }
}

/// Assembles and validates a [`LoaderSpec`].
pub struct LoaderSpecBuilder<Q> {
    spec: LoaderSpec<Q>,
}

impl<Q> LoaderSpecBuilder<Q> {
    fn new() -> Self {
        Self {
            spec: LoaderSpec {
                sortable_fields: HashMap::new(),
                default_sort_by: Vec::new(),
                filterable_fields: HashMap::new(),
                extensions: HashMap::new(),
            },
        }
    }

    /// Declare a sortable field.
    pub fn sortable(mut self, field: impl Into<String>, sort: Arc<dyn QuerySort<Q>>) -> Self {
        self.spec.sortable_fields.insert(field.into(), sort);
        self
    }

    /// Declare a filter for `field` under `operator`.
    pub fn filterable(
        mut self,
        field: impl Into<String>,
        operator: impl Into<String>,
        filter: Arc<dyn QueryFilter<Q>>,
    ) -> Self {
        self.spec
            .filterable_fields
            .entry(field.into())
            .or_default()
            .insert(operator.into(), filter);
        self
    }

    /// Declare a named extension.
    pub fn extension(
        mut self,
        name: impl Into<String>,
        extension: Arc<dyn LoaderExtension<Q>>,
    ) -> Self {
        self.spec.extensions.insert(name.into(), extension);
        self
    }

    /// Append a fallback sort applied when the caller requests none.
    pub fn default_sort(mut self, sort: DefaultSort) -> Self {
        self.spec.default_sort_by.push(sort);
        self
    }

    /// Validate the declarations and produce the spec.
    ///
    /// Rejects default sorts on undeclared fields, required extensions the
    /// extension table does not declare, and prerequisite cycles, so a spec
    /// that builds cannot fail those lookups at request time.
    pub fn build(self) -> Result<LoaderSpec<Q>, SpecError> {
        self.validate()?;
        Ok(self.spec)
    }

    fn validate(&self) -> Result<(), SpecError> {
        let spec = &self.spec;

        for default in &spec.default_sort_by {
            if !spec.sortable_fields.contains_key(&default.field) {
                return Err(SpecError::DanglingDefaultSort {
                    field: default.field.clone(),
                });
            }
        }

        for (field, sort) in &spec.sortable_fields {
            check_requirements(spec, &format!("sort '{field}'"), sort.required_extensions())?;
        }
        for (field, operators) in &spec.filterable_fields {
            for (operator, filter) in operators {
                check_requirements(
                    spec,
                    &format!("filter '{field}'/'{operator}'"),
                    filter.required_extensions(),
                )?;
            }
        }
        for (name, extension) in &spec.extensions {
            check_requirements(
                spec,
                &format!("extension '{name}'"),
                extension.required_extensions(),
            )?;
        }

        detect_cycles(spec)
    }
}

fn check_requirements<Q>(
    spec: &LoaderSpec<Q>,
    piece: &str,
    required: &[String],
) -> Result<(), SpecError> {
    for name in required {
        if !spec.extensions.contains_key(name) {
            return Err(SpecError::DanglingRequiredExtension {
                piece: piece.to_string(),
                extension: name.clone(),
            });
        }
    }
    Ok(())
}

fn detect_cycles<Q>(spec: &LoaderSpec<Q>) -> Result<(), SpecError> {
    let mut finished: HashSet<&str> = HashSet::new();
    for name in spec.extensions.keys() {
        let mut in_progress = HashSet::new();
        visit(spec, name, &mut in_progress, &mut finished)?;
    }
    Ok(())
}

fn visit<'a, Q>(
    spec: &'a LoaderSpec<Q>,
    name: &'a str,
    in_progress: &mut HashSet<&'a str>,
    finished: &mut HashSet<&'a str>,
) -> Result<(), SpecError> {
    if finished.contains(name) {
        return Ok(());
    }
    if !in_progress.insert(name) {
        return Err(SpecError::ExtensionCycle {
            extension: name.to_string(),
        });
    }
    if let Some(extension) = spec.extensions.get(name) {
        for dep in extension.required_extensions() {
            visit(spec, dep, in_progress, finished)?;
        }
    }
    in_progress.remove(name);
    finished.insert(name);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::piece::SpecPiece;
    use crate::types::{FilterValue, SortDirection};

    struct NoopSort {
        requires: Vec<String>,
    }

    impl SpecPiece for NoopSort {
        fn required_extensions(&self) -> &[String] {
            &self.requires
        }
    }

    impl QuerySort<()> for NoopSort {
        fn apply_sorting(&self, _query: &mut (), _direction: SortDirection) {}
    }

    struct NoopFilter {
        requires: Vec<String>,
    }

    impl SpecPiece for NoopFilter {
        fn required_extensions(&self) -> &[String] {
            &self.requires
        }
    }

    impl QueryFilter<()> for NoopFilter {
        fn apply_filter(&self, _query: &mut (), _value: Option<&FilterValue>) {}
    }

    struct NoopExtension {
        requires: Vec<String>,
    }

    impl SpecPiece for NoopExtension {
        fn required_extensions(&self) -> &[String] {
            &self.requires
        }
    }

    impl LoaderExtension<()> for NoopExtension {
        fn apply_extension(&self, _query: &mut ()) {}
    }

    fn sort(requires: &[&str]) -> Arc<dyn QuerySort<()>> {
        Arc::new(NoopSort {
            requires: requires.iter().map(ToString::to_string).collect(),
        })
    }

    fn filter(requires: &[&str]) -> Arc<dyn QueryFilter<()>> {
        Arc::new(NoopFilter {
            requires: requires.iter().map(ToString::to_string).collect(),
        })
    }

    fn extension(requires: &[&str]) -> Arc<dyn LoaderExtension<()>> {
        Arc::new(NoopExtension {
            requires: requires.iter().map(ToString::to_string).collect(),
        })
    }

    #[test]
    fn builder_assembles_lookup_tables() {
        let spec: LoaderSpec<()> = LoaderSpec::builder()
            .sortable("created_at", sort(&[]))
            .filterable("status", "eq", filter(&[]))
            .filterable("status", "neq", filter(&[]))
            .extension("with_author", extension(&[]))
            .default_sort(DefaultSort::from_field("created_at"))
            .build()
            .unwrap();

        assert!(spec.sort("created_at").is_some());
        assert!(spec.sort("missing").is_none());
        assert!(spec.filter("status", "eq").is_some());
        assert!(spec.filter("status", "like").is_none());
        assert!(spec.filter("missing", "eq").is_none());
        assert_eq!(spec.operators("status").map(HashMap::len), Some(2));
        assert!(spec.extension("with_author").is_some());
        assert_eq!(spec.default_sort_by().len(), 1);
    }

    #[test]
    fn rejects_dangling_default_sort() {
        let err = LoaderSpec::<()>::builder()
            .default_sort(DefaultSort::from_field("ghost"))
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            SpecError::DanglingDefaultSort {
                field: "ghost".to_string()
            }
        );
    }

    #[test]
    fn rejects_dangling_required_extension() {
        let err = LoaderSpec::<()>::builder()
            .filterable("author_name", "eq", filter(&["with_author"]))
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            SpecError::DanglingRequiredExtension {
                piece: "filter 'author_name'/'eq'".to_string(),
                extension: "with_author".to_string(),
            }
        );
    }

    #[test]
    fn rejects_extension_cycle() {
        let err = LoaderSpec::<()>::builder()
            .extension("a", extension(&["b"]))
            .extension("b", extension(&["a"]))
            .build()
            .unwrap_err();

        assert!(matches!(err, SpecError::ExtensionCycle { .. }));
    }

    #[test]
    fn rejects_self_requiring_extension() {
        let err = LoaderSpec::<()>::builder()
            .extension("a", extension(&["a"]))
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            SpecError::ExtensionCycle {
                extension: "a".to_string()
            }
        );
    }

    #[test]
    fn accepts_extension_chains() {
        let spec = LoaderSpec::<()>::builder()
            .extension("base", extension(&[]))
            .extension("middle", extension(&["base"]))
            .extension("top", extension(&["middle", "base"]))
            .build();

        assert!(spec.is_ok());
    }

    #[test]
    fn clone_shares_pieces_but_not_containers() {
        let original: LoaderSpec<()> = LoaderSpec::builder()
            .sortable("created_at", sort(&[]))
            .filterable("status", "eq", filter(&[]))
            .extension("with_author", extension(&[]))
            .build()
            .unwrap();

        let mut cloned = original.clone();

        let original_piece = original.filter("status", "eq").unwrap();
        let cloned_piece = cloned.filter("status", "eq").unwrap();
        assert!(Arc::ptr_eq(original_piece, cloned_piece));

        cloned.remove_filterable("status", "eq");
        cloned.remove_sortable("created_at");
        cloned.remove_extension("with_author");
        cloned.insert_filterable("title", "eq", filter(&[]));

        assert!(original.filter("status", "eq").is_some());
        assert!(original.sort("created_at").is_some());
        assert!(original.extension("with_author").is_some());
        assert!(original.filter("title", "eq").is_none());
        assert!(cloned.filter("status", "eq").is_none());
        assert!(cloned.filter("title", "eq").is_some());
    }

    #[test]
    fn reshaping_a_clone_leaves_the_original_intact() {
        let original: LoaderSpec<()> = LoaderSpec::builder()
            .sortable("created_at", sort(&[]))
            .filterable("status", "eq", filter(&[]))
            .filterable("status", "neq", filter(&[]))
            .build()
            .unwrap();

        let mut cloned = original.clone();
        cloned.insert_sortable("title", sort(&[]));
        cloned.insert_extension("with_author", extension(&[]));
        cloned.set_default_sort_by(vec![DefaultSort::from_field("title")]);
        assert!(cloned.remove_filterable_field("status").is_some());

        assert!(cloned.sort("title").is_some());
        assert!(cloned.extension("with_author").is_some());
        assert_eq!(cloned.default_sort_by().len(), 1);
        assert!(cloned.operators("status").is_none());

        assert!(original.sort("title").is_none());
        assert!(original.extension("with_author").is_none());
        assert!(original.default_sort_by().is_empty());
        assert_eq!(original.operators("status").map(HashMap::len), Some(2));
    }

    #[test]
    fn removing_last_operator_drops_the_field() {
        let mut spec: LoaderSpec<()> = LoaderSpec::builder()
            .filterable("status", "eq", filter(&[]))
            .build()
            .unwrap();

        assert!(spec.remove_filterable("status", "eq").is_some());
        assert!(spec.operators("status").is_none());
        assert!(spec.remove_filterable("status", "eq").is_none());
    }

    #[test]
    fn debug_reports_declared_names() {
        let spec: LoaderSpec<()> = LoaderSpec::builder()
            .sortable("created_at", sort(&[]))
            .filterable("status", "eq", filter(&[]))
            .extension("with_author", extension(&[]))
            .default_sort(DefaultSort::from_field("created_at"))
            .build()
            .unwrap();

        let rendered = format!("{spec:?}");
        assert!(rendered.contains("LoaderSpec"));
        assert!(rendered.contains("created_at"));
        assert!(rendered.contains("status"));
        assert!(rendered.contains("with_author"));
    }

    #[test]
    fn name_listings_cover_all_tables() {
        let spec: LoaderSpec<()> = LoaderSpec::builder()
            .sortable("created_at", sort(&[]))
            .sortable("title", sort(&[]))
            .filterable("status", "eq", filter(&[]))
            .extension("with_author", extension(&[]))
            .build()
            .unwrap();

        let mut sortable = spec.sortable_field_names();
        sortable.sort_unstable();
        assert_eq!(sortable, vec!["created_at", "title"]);
        assert_eq!(spec.filterable_field_names(), vec!["status"]);
        assert_eq!(spec.extension_names(), vec!["with_author"]);
    }
}
