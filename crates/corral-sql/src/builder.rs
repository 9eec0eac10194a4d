//! Spec-constrained loader builder over a SeaQuery `SelectStatement`.
//!
//! The builder validates caller requests through the shared loader core,
//! renders PostgreSQL, and hands the SQL to a [`SqlRunner`] for execution.
//! The matching total is fetched eagerly at build time from an unwindowed
//! count query; rows are fetched lazily on first iteration.

use corral::{
    ConfigurableLoaderBuilder, FilterValue, Loader, LoaderBuilder, LoaderBuilderCore, LoaderError,
    LoaderSpec, SortDirection,
};
use sea_query::{Alias, Asterisk, Expr, PostgresQueryBuilder, Query, SelectStatement};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced while building a SQL loader.
#[derive(Debug, Error)]
pub enum SqlBuildError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error("query execution failed")]
    Execution(#[source] anyhow::Error),
}

/// Connection seam: executes rendered SQL.
///
/// Implementations wrap whatever connection or pool the application uses.
/// `fetch_total` runs a single-row COUNT query; `fetch_rows` returns each
/// result row as a JSON object.
pub trait SqlRunner {
    fn fetch_rows(&mut self, sql: &str) -> anyhow::Result<Vec<Value>>;
    fn fetch_total(&mut self, sql: &str) -> anyhow::Result<u64>;
}

/// Spec-constrained builder over a SeaQuery select.
///
/// The caller supplies the base statement (columns and FROM); declared
/// pieces contribute WHERE, ORDER BY, and JOIN clauses. The offset/limit
/// window is held aside so the count query always covers the full
/// matching set.
pub struct SqlLoaderBuilder<R> {
    core: LoaderBuilderCore<SelectStatement>,
    runner: R,
    offset: Option<u64>,
    limit: Option<u64>,
}

impl<R: SqlRunner> SqlLoaderBuilder<R> {
    pub fn new(
        spec: Arc<LoaderSpec<SelectStatement>>,
        statement: SelectStatement,
        runner: R,
    ) -> Self {
        Self {
            core: LoaderBuilderCore::new(spec, statement),
            runner,
            offset: None,
            limit: None,
        }
    }
}

/// Render a COUNT(*) wrapper around the unwindowed statement.
fn count_sql(statement: &SelectStatement) -> String {
    let mut count = Query::select();
    count.expr(Expr::col(Asterisk).count());
    count.from_subquery(statement.clone(), Alias::new("matching"));
    count.to_string(PostgresQueryBuilder)
}

impl<R: SqlRunner> LoaderBuilder<anyhow::Result<Value>> for SqlLoaderBuilder<R> {
    type Loader = SqlLoader<R>;
    type Error = SqlBuildError;

    fn build(self) -> Result<Self::Loader, Self::Error> {
        let Self {
            core,
            mut runner,
            offset,
            limit,
        } = self;
        let mut statement = core.into_query()?;

        let total_sql = count_sql(&statement);
        tracing::debug!(sql = %total_sql, "counting matching rows");
        let total = runner
            .fetch_total(&total_sql)
            .map_err(SqlBuildError::Execution)?;

        if let Some(limit) = limit {
            statement.limit(limit);
        }
        if let Some(offset) = offset {
            statement.offset(offset);
        }
        let rows_sql = statement.to_string(PostgresQueryBuilder);
        tracing::debug!(sql = %rows_sql, total, "built sql loader");

        Ok(SqlLoader {
            runner,
            rows_sql,
            total,
            state: LoaderState::Pending,
        })
    }
}

impl<R: SqlRunner> ConfigurableLoaderBuilder<anyhow::Result<Value>, SelectStatement>
    for SqlLoaderBuilder<R>
{
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
        self.offset = Some(offset);
    }

    fn set_limit(&mut self, limit: u64) {
        self.limit = Some(limit);
    }

    fn query(&self) -> &SelectStatement {
        self.core.query()
    }
}

enum LoaderState {
    Pending,
    Active(std::vec::IntoIter<Value>),
    Finished,
}

/// Finished SQL loader.
///
/// Rows are fetched once, on the first `next` call. A fetch failure yields
/// the error as the only item; the loader is exhausted afterwards.
pub struct SqlLoader<R> {
    runner: R,
    rows_sql: String,
    total: u64,
    state: LoaderState,
}

impl<R: SqlRunner> Iterator for SqlLoader<R> {
    type Item = anyhow::Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &mut self.state {
                LoaderState::Pending => match self.runner.fetch_rows(&self.rows_sql) {
                    Ok(rows) => {
                        self.state = LoaderState::Active(rows.into_iter());
                    }
                    Err(err) => {
                        self.state = LoaderState::Finished;
                        return Some(Err(err));
                    }
                },
                LoaderState::Active(rows) => {
                    let row = rows.next();
                    if row.is_none() {
                        self.state = LoaderState::Finished;
                    }
                    return row.map(Ok);
                }
                LoaderState::Finished => return None,
            }
        }
    }
}

impl<R: SqlRunner> Loader<anyhow::Result<Value>> for SqlLoader<R> {
    fn total(&self) -> u64 {
        self.total
    }
}
