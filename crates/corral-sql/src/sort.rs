//! Column sort pieces for SQL-backed loaders.

use corral::{QuerySort, SortDirection, SpecPiece};
use sea_query::{Alias, NullOrdering, Order, SelectStatement};
use serde::{Deserialize, Serialize};

/// Placement of NULLs within an ordered column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullsOrder {
    First,
    Last,
}

/// Sort piece ordering results by a single column.
///
/// An unspecified direction orders ascending, so default sorts declared
/// without a direction stay deterministic.
pub struct ColumnSort {
    table: Option<String>,
    column: String,
    nulls: Option<NullsOrder>,
    required_extensions: Vec<String>,
}

impl ColumnSort {
    pub fn new(column: &str) -> Self {
        Self {
            table: None,
            column: column.to_string(),
            nulls: None,
            required_extensions: Vec::new(),
        }
    }

    /// Qualify the column with a table or join alias.
    #[must_use]
    pub fn table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    /// Fix where NULLs land regardless of direction.
    #[must_use]
    pub fn nulls(mut self, nulls: NullsOrder) -> Self {
        self.nulls = Some(nulls);
        self
    }

    /// Declare extensions that must run before this sort applies.
    #[must_use]
    pub fn requires(mut self, extensions: &[&str]) -> Self {
        self.required_extensions = extensions.iter().map(ToString::to_string).collect();
        self
    }
}

impl SpecPiece for ColumnSort {
    fn required_extensions(&self) -> &[String] {
        &self.required_extensions
    }
}

impl QuerySort<SelectStatement> for ColumnSort {
    fn apply_sorting(&self, query: &mut SelectStatement, direction: SortDirection) {
        let order = match direction {
            SortDirection::Desc => Order::Desc,
            SortDirection::Asc | SortDirection::Unspecified => Order::Asc,
        };
        let nulls = self.nulls.map(|nulls| match nulls {
            NullsOrder::First => NullOrdering::First,
            NullsOrder::Last => NullOrdering::Last,
        });

        match (&self.table, nulls) {
            (Some(table), Some(nulls)) => {
                query.order_by_with_nulls(
                    (Alias::new(table), Alias::new(&self.column)),
                    order,
                    nulls,
                );
            }
            (Some(table), None) => {
                query.order_by((Alias::new(table), Alias::new(&self.column)), order);
            }
            (None, Some(nulls)) => {
                query.order_by_with_nulls(Alias::new(&self.column), order, nulls);
            }
            (None, None) => {
                query.order_by(Alias::new(&self.column), order);
            }
        }
    }
}
