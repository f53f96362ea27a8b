//! Equality-only queries over a single collection.
//!
//! A `Query` is a conjunction of exact-match field filters. There is no OR,
//! ordering, limit or cursor: the whole matching set is always requested.

use serde_json::Value;

use crate::mapper::RECIPE_FIELDS;
use crate::model::SearchCriteria;
use crate::moderation::ModerationState;
use crate::store::RawDocument;

/// Right-hand side of an equality filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Bool(bool),
    Text(String),
}

impl FilterValue {
    pub fn to_json(&self) -> Value {
        match self {
            FilterValue::Bool(value) => Value::Bool(*value),
            FilterValue::Text(value) => Value::String(value.clone()),
        }
    }

    /// Exact comparison against a stored field; a type mismatch never matches
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (FilterValue::Bool(expected), Value::Bool(actual)) => expected == actual,
            (FilterValue::Text(expected), Value::String(actual)) => expected == actual,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: &'static str,
    pub value: FilterValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    collection: String,
    filters: Vec<FieldFilter>,
}

impl Query {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn filters(&self) -> &[FieldFilter] {
        &self.filters
    }

    /// Evaluate the query against one document
    pub fn matches(&self, document: &RawDocument) -> bool {
        self.filters.iter().all(|filter| {
            document
                .fields
                .get(filter.field)
                .is_some_and(|value| filter.value.matches(value))
        })
    }
}

pub struct QueryBuilder {
    collection: String,
    filters: Vec<FieldFilter>,
}

impl QueryBuilder {
    pub fn new(collection: impl Into<String>) -> Self {
        QueryBuilder {
            collection: collection.into(),
            filters: Vec::new(),
        }
    }

    /// Constrain `approved` to the given moderation state
    pub fn moderation(self, state: ModerationState) -> Self {
        self.where_eq(RECIPE_FIELDS.approved, FilterValue::Bool(state.approved()))
    }

    /// Add one exact-match filter per present, non-empty criterion
    pub fn criteria(self, criteria: &SearchCriteria) -> Self {
        self.where_text(RECIPE_FIELDS.name, criteria.name.as_deref())
            .where_text(RECIPE_FIELDS.chef_name, criteria.chef_name.as_deref())
            .where_text(
                RECIPE_FIELDS.category,
                criteria.category.as_ref().map(|category| category.as_str()),
            )
    }

    pub fn where_eq(mut self, field: &'static str, value: FilterValue) -> Self {
        self.filters.push(FieldFilter { field, value });
        self
    }

    fn where_text(self, field: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(value) if !value.is_empty() => {
                self.where_eq(field, FilterValue::Text(value.to_string()))
            }
            _ => self,
        }
    }

    pub fn build(self) -> Query {
        Query {
            collection: self.collection,
            filters: self.filters,
        }
    }
}
