use serde::{Deserialize, Serialize};

use super::query::SearchQuery;

pub type CategoryId = u32;

/// Storefront scope used to resolve store-specific category data.
pub type StoreId = u32;

/// A catalog category as the rewriter sees it.
///
/// A *virtual* category has its membership computed from `virtual_rule`
/// rather than from explicit product assignment. An *anchor* category
/// includes the products of its descendants when used as a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_virtual_category: bool,
    #[serde(default)]
    pub is_anchor: bool,
    /// Direct children, in repository order.
    #[serde(default)]
    pub child_ids: Vec<CategoryId>,
    /// All descendants, in repository order.
    #[serde(default)]
    pub descendant_ids: Vec<CategoryId>,
    /// Saved search defining a virtual category's members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_rule: Option<SearchQuery>,
}

impl Category {
    #[must_use]
    pub fn new(id: CategoryId, name: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            is_virtual_category: false,
            is_anchor: false,
            child_ids: Vec::new(),
            descendant_ids: Vec::new(),
            virtual_rule: None,
        }
    }

    /// Mark as virtual, with the saved search that defines membership.
    #[must_use]
    pub fn virtual_with(mut self, rule: SearchQuery) -> Self {
        self.is_virtual_category = true;
        self.virtual_rule = Some(rule);
        self
    }

    /// Mark as anchor with the given descendants. Direct children are the
    /// descendants unless set separately with [`Category::children_of`].
    #[must_use]
    pub fn anchor(mut self, descendants: &[CategoryId]) -> Self {
        self.is_anchor = true;
        self.descendant_ids = descendants.to_vec();
        if self.child_ids.is_empty() {
            self.child_ids = descendants.to_vec();
        }
        self
    }

    #[must_use]
    pub fn children_of(mut self, children: &[CategoryId]) -> Self {
        self.child_ids = children.to_vec();
        self
    }

    /// Comma-joined child ids: all descendants when `recursive`, else only
    /// direct children. Empty string when there are none.
    #[must_use]
    pub fn children(&self, recursive: bool) -> String {
        let ids = if recursive {
            &self.descendant_ids
        } else {
            &self.child_ids
        };
        ids.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}
