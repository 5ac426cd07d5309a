use std::collections::HashMap;

use crate::error::ForumError;
use crate::models::Category;

/// Bidirectional lookup between category display names (forms, filters) and
/// stable ids (storage, the listing procedure's filter parameter).
///
/// Backed by a single full fetch cached for the session; categories are
/// near-static reference data, so there is no invalidation. A resolution
/// failure during a submission aborts it before any upload or write happens.
#[derive(Debug, Default)]
pub struct CategoryResolver {
    categories: Vec<Category>,
    by_name: HashMap<String, String>,
    by_id: HashMap<String, String>,
}

impl CategoryResolver {
    pub fn from_categories(mut categories: Vec<Category>) -> Self {
        categories.sort_by_key(|c| c.order_index);
        let by_name = categories
            .iter()
            .map(|c| (c.name.clone(), c.id.clone()))
            .collect();
        let by_id = categories
            .iter()
            .map(|c| (c.id.clone(), c.name.clone()))
            .collect();
        Self {
            categories,
            by_name,
            by_id,
        }
    }

    pub fn is_loaded(&self) -> bool {
        !self.categories.is_empty()
    }

    /// Display-ordered categories for populating select controls.
    pub fn all(&self) -> &[Category] {
        &self.categories
    }

    pub fn resolve_id(&self, name: &str) -> Result<&str, ForumError> {
        self.by_name
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ForumError::Resolution(name.to_string()))
    }

    pub fn resolve_name(&self, id: &str) -> Result<&str, ForumError> {
        self.by_id
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| ForumError::Resolution(id.to_string()))
    }
}
