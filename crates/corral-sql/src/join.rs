//! Join extensions for SQL-backed loaders.

use corral::{LoaderExtension, SpecPiece};
use sea_query::{Alias, Expr, ExprTrait, SelectStatement};
use serde::{Deserialize, Serialize};

/// Join flavor applied by a [`JoinExtension`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
}

/// Extension joining a related table under an alias.
///
/// Filters and sorts over joined columns declare this extension as a
/// prerequisite, so the join lands exactly once however many pieces
/// reference it.
pub struct JoinExtension {
    target_table: String,
    alias: String,
    kind: JoinKind,
    local_table: String,
    local_field: String,
    foreign_field: String,
    required_extensions: Vec<String>,
}

impl JoinExtension {
    pub fn new(
        target_table: &str,
        alias: &str,
        local_table: &str,
        local_field: &str,
        foreign_field: &str,
    ) -> Self {
        Self {
            target_table: target_table.to_string(),
            alias: alias.to_string(),
            kind: JoinKind::default(),
            local_table: local_table.to_string(),
            local_field: local_field.to_string(),
            foreign_field: foreign_field.to_string(),
            required_extensions: Vec::new(),
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: JoinKind) -> Self {
        self.kind = kind;
        self
    }

    /// Declare extensions that must run before this one, for joins that
    /// hang off another joined table.
    #[must_use]
    pub fn requires(mut self, extensions: &[&str]) -> Self {
        self.required_extensions = extensions.iter().map(ToString::to_string).collect();
        self
    }
}

impl SpecPiece for JoinExtension {
    fn required_extensions(&self) -> &[String] {
        &self.required_extensions
    }
}

impl LoaderExtension<SelectStatement> for JoinExtension {
    fn apply_extension(&self, query: &mut SelectStatement) {
        let join_type = match self.kind {
            JoinKind::Inner => sea_query::JoinType::InnerJoin,
            JoinKind::Left => sea_query::JoinType::LeftJoin,
            JoinKind::Right => sea_query::JoinType::RightJoin,
        };

        let on_condition = Expr::col((
            Alias::new(&self.local_table),
            Alias::new(&self.local_field),
        ))
        .equals((Alias::new(&self.alias), Alias::new(&self.foreign_field)));

        query.join_as(
            join_type,
            Alias::new(&self.target_table),
            Alias::new(&self.alias),
            on_condition,
        );
    }
}
