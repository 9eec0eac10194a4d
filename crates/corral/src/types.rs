//! Shared vocabulary for loader declarations and requests.
//!
//! These types travel between transports, specs, and builders:
//! - SortDirection: requested ordering direction
//! - DefaultSort: fallback ordering declared on a spec
//! - FilterValue: runtime reference value accompanying a filter request

use serde::{Deserialize, Serialize};

/// Sort direction requested by a caller.
///
/// `Unspecified` defers to whatever the sort piece considers natural
/// (ascending for both shipped backends).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
    #[default]
    Unspecified,
}

/// Fallback ordering entry applied when a caller requests no sort.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DefaultSort {
    /// Sortable field to order by.
    pub field: String,

    /// Direction to apply.
    #[serde(default)]
    pub direction: SortDirection,
}

impl DefaultSort {
    /// Create a default sort with an explicit direction.
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Create a default sort from a bare field name, leaving the direction
    /// unspecified.
    pub fn from_field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Unspecified,
        }
    }
}

/// Filter value types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FilterValue {
    /// String value.
    String(String),
    /// Integer value.
    Integer(i64),
    /// Float value.
    Float(f64),
    /// Boolean value.
    Boolean(bool),
    /// List of values (for in/not_in comparisons).
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Convert to string representation for textual comparison.
    pub fn as_string(&self) -> Option<String> {
        match self {
            FilterValue::String(s) => Some(s.clone()),
            FilterValue::Integer(i) => Some(i.to_string()),
            FilterValue::Float(f) => Some(f.to_string()),
            FilterValue::Boolean(b) => Some(b.to_string()),
            FilterValue::List(_) => None,
        }
    }

    /// Convert to integer if possible.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FilterValue::Integer(i) => Some(*i),
            FilterValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Convert to float if possible.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FilterValue::Float(f) => Some(*f),
            FilterValue::Integer(i) => Some(*i as f64),
            FilterValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Convert to boolean if possible.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FilterValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow the list items (for in/not_in comparisons).
    pub fn as_list(&self) -> Option<&[FilterValue]> {
        match self {
            FilterValue::List(items) => Some(items),
            _ => None,
        }
    }
}
