//! Column filter pieces for SQL-backed loaders.
//!
//! A [`ColumnFilter`] narrows a `SelectStatement` by comparing one column
//! against the caller's value. Unusable values restrict the query to no rows
//! rather than silently widening the result.

use corral::{FilterValue, QueryFilter, SpecPiece};
use sea_query::{Alias, Expr, ExprTrait, SelectStatement, SimpleExpr, Value};
use serde::{Deserialize, Serialize};

/// Comparison applied by a [`ColumnFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Exact match.
    Equals,
    /// Not equal.
    NotEquals,
    /// Substring match (LIKE %value%).
    Contains,
    /// Prefix match (LIKE value%).
    StartsWith,
    /// Suffix match (LIKE %value).
    EndsWith,
    /// Greater than.
    GreaterThan,
    /// Less than.
    LessThan,
    /// Greater than or equal.
    GreaterOrEqual,
    /// Less than or equal.
    LessOrEqual,
    /// Value in list.
    In,
    /// Value not in list.
    NotIn,
    /// Column is NULL.
    IsNull,
    /// Column is not NULL.
    IsNotNull,
}

/// Filter piece comparing a single column against the caller's value.
pub struct ColumnFilter {
    table: Option<String>,
    column: String,
    comparison: Comparison,
    required_extensions: Vec<String>,
}

impl ColumnFilter {
    pub fn new(column: &str, comparison: Comparison) -> Self {
        Self {
            table: None,
            column: column.to_string(),
            comparison,
            required_extensions: Vec::new(),
        }
    }

    /// Qualify the column with a table or join alias.
    #[must_use]
    pub fn table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    /// Declare extensions that must run before this filter applies,
    /// typically the join that brings the column into scope.
    #[must_use]
    pub fn requires(mut self, extensions: &[&str]) -> Self {
        self.required_extensions = extensions.iter().map(ToString::to_string).collect();
        self
    }

    fn column_expr(&self) -> Expr {
        match &self.table {
            Some(table) => Expr::col((Alias::new(table), Alias::new(&self.column))),
            None => Expr::col(Alias::new(&self.column)),
        }
    }

    /// Build the WHERE condition, or `None` when the value cannot drive
    /// this comparison.
    fn condition(&self, reference_value: Option<&FilterValue>) -> Option<SimpleExpr> {
        let column = self.column_expr();

        match self.comparison {
            Comparison::Equals => Some(column.eq(scalar_value(reference_value?)?)),
            Comparison::NotEquals => Some(column.ne(scalar_value(reference_value?)?)),
            Comparison::Contains => {
                let value = reference_value?.as_string()?;
                Some(column.like(format!("%{}%", escape_like_wildcards(&value))))
            }
            Comparison::StartsWith => {
                let value = reference_value?.as_string()?;
                Some(column.like(format!("{}%", escape_like_wildcards(&value))))
            }
            Comparison::EndsWith => {
                let value = reference_value?.as_string()?;
                Some(column.like(format!("%{}", escape_like_wildcards(&value))))
            }
            Comparison::GreaterThan => Some(column.gt(numeric_value(reference_value?)?)),
            Comparison::LessThan => Some(column.lt(numeric_value(reference_value?)?)),
            Comparison::GreaterOrEqual => Some(column.gte(numeric_value(reference_value?)?)),
            Comparison::LessOrEqual => Some(column.lte(numeric_value(reference_value?)?)),
            Comparison::In => {
                let values = value_list(reference_value?);
                if values.is_empty() {
                    return None;
                }
                Some(column.is_in(values))
            }
            Comparison::NotIn => {
                let values = value_list(reference_value?);
                if values.is_empty() {
                    return None;
                }
                Some(column.is_not_in(values))
            }
            Comparison::IsNull => Some(column.is_null()),
            Comparison::IsNotNull => Some(column.is_not_null()),
        }
    }
}

impl SpecPiece for ColumnFilter {
    fn required_extensions(&self) -> &[String] {
        &self.required_extensions
    }
}

impl QueryFilter<SelectStatement> for ColumnFilter {
    fn apply_filter(&self, query: &mut SelectStatement, reference_value: Option<&FilterValue>) {
        match self.condition(reference_value) {
            Some(condition) => {
                query.and_where(condition);
            }
            None => {
                tracing::warn!(
                    column = %self.column,
                    comparison = ?self.comparison,
                    "filter value unusable, restricting query to no rows"
                );
                query.and_where(Expr::cust("FALSE"));
            }
        }
    }
}

/// Convert a scalar value for equality comparisons.
fn scalar_value(value: &FilterValue) -> Option<Value> {
    match value {
        FilterValue::String(s) => Some(s.clone().into()),
        FilterValue::Integer(i) => Some((*i).into()),
        FilterValue::Float(f) => Some((*f).into()),
        FilterValue::Boolean(b) => Some((*b).into()),
        FilterValue::List(_) => None,
    }
}

/// Convert a value for ordering comparisons, parsing numeric strings.
fn numeric_value(value: &FilterValue) -> Option<Value> {
    if let Some(int) = value.as_i64() {
        return Some(int.into());
    }
    value.as_f64().map(Into::into)
}

/// Flatten a value into the scalars for an IN list.
fn value_list(value: &FilterValue) -> Vec<Value> {
    match value {
        FilterValue::List(items) => items.iter().filter_map(scalar_value).collect(),
        other => scalar_value(other).into_iter().collect(),
    }
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use sea_query::{Asterisk, PostgresQueryBuilder, Query};

    fn render(filter: &ColumnFilter, value: Option<&FilterValue>) -> String {
        let mut query = Query::select();
        query.column(Asterisk).from(Alias::new("post"));
        filter.apply_filter(&mut query, value);
        query.to_string(PostgresQueryBuilder)
    }

    #[test]
    fn equals_renders_typed_value() {
        let filter = ColumnFilter::new("status", Comparison::Equals);
        let sql = render(&filter, Some(&FilterValue::String("published".to_string())));

        assert!(sql.contains(r#""status" = 'published'"#));
    }

    #[test]
    fn qualified_column_carries_the_table() {
        let filter = ColumnFilter::new("name", Comparison::Equals).table("author");
        let sql = render(&filter, Some(&FilterValue::String("Ann".to_string())));

        assert!(sql.contains(r#""author"."name""#));
    }

    #[test]
    fn contains_builds_a_like_pattern() {
        let filter = ColumnFilter::new("title", Comparison::Contains);
        let sql = render(&filter, Some(&FilterValue::String("rust".to_string())));

        assert!(sql.contains("LIKE"));
        assert!(sql.contains("%rust%"));
    }

    #[test]
    fn starts_with_anchors_the_pattern() {
        let filter = ColumnFilter::new("title", Comparison::StartsWith);
        let sql = render(&filter, Some(&FilterValue::String("rust".to_string())));

        assert!(sql.contains("rust%"));
        assert!(!sql.contains("%rust%"));
    }

    #[test]
    fn numeric_comparison_parses_string_values() {
        let filter = ColumnFilter::new("created_at", Comparison::GreaterThan);
        let sql = render(&filter, Some(&FilterValue::String("42".to_string())));

        assert!(sql.contains(r#""created_at" > 42"#));
    }

    #[test]
    fn in_renders_every_scalar() {
        let filter = ColumnFilter::new("status", Comparison::In);
        let value = FilterValue::List(vec![
            FilterValue::String("draft".to_string()),
            FilterValue::String("published".to_string()),
        ]);
        let sql = render(&filter, Some(&value));

        assert!(sql.contains("IN"));
        assert!(sql.contains("'draft'"));
        assert!(sql.contains("'published'"));
    }

    #[test]
    fn empty_in_list_restricts_to_no_rows() {
        let filter = ColumnFilter::new("status", Comparison::In);
        let sql = render(&filter, Some(&FilterValue::List(Vec::new())));

        assert!(sql.contains("FALSE"));
    }

    #[test]
    fn missing_value_restricts_to_no_rows() {
        let filter = ColumnFilter::new("status", Comparison::Equals);
        let sql = render(&filter, None);

        assert!(sql.contains("FALSE"));
    }

    #[test]
    fn null_checks_need_no_value() {
        let filter = ColumnFilter::new("deleted_at", Comparison::IsNull);
        let sql = render(&filter, None);

        assert!(sql.contains(r#""deleted_at" IS NULL"#));
        assert!(!sql.contains("FALSE"));
    }

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like_wildcards(r"50%_o\ff"), r"50\%\_o\\ff");
    }

    #[test]
    fn comparison_serializes_snake_case() {
        let json = serde_json::to_string(&Comparison::GreaterOrEqual).unwrap();
        assert_eq!(json, r#""greater_or_equal""#);

        let parsed: Comparison = serde_json::from_str(r#""not_in""#).unwrap();
        assert_eq!(parsed, Comparison::NotIn);
    }
}
