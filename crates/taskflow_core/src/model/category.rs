//! Category records and the protected default seed.
//!
//! # Invariants
//! - Default category ids are stable strings and never removable.
//! - Custom category ids are generated UUID strings, so they can never
//!   collide with a default id.

use crate::model::validate::{require_name, validate_color, ModelValidationError};
use serde::{Deserialize, Serialize};

pub type CategoryId = String;

/// Category that tasks fall back to when their category goes away.
pub const FALLBACK_CATEGORY_ID: &str = "personal";

pub const DEFAULT_CATEGORY_IDS: [&str; 6] =
    ["work", "personal", "shopping", "health", "finance", "education"];

// (id, name, color, icon)
const DEFAULT_CATEGORY_SEED: [(&str, &str, &str, &str); 6] = [
    ("work", "Work", "#5D5FEF", "briefcase"),
    ("personal", "Personal", "#FF8A65", "user"),
    ("shopping", "Shopping", "#4CAF50", "shopping-cart"),
    ("health", "Health", "#2196F3", "heart"),
    ("finance", "Finance", "#FFC107", "dollar-sign"),
    ("education", "Education", "#9C27B0", "book-open"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// Returns a fresh copy of the default category seed, in display order.
pub fn default_categories() -> Vec<Category> {
    DEFAULT_CATEGORY_SEED
        .iter()
        .map(|(id, name, color, icon)| Category {
            id: (*id).to_string(),
            name: (*name).to_string(),
            color: (*color).to_string(),
            icon: (*icon).to_string(),
        })
        .collect()
}

pub fn is_default_category_id(id: &str) -> bool {
    DEFAULT_CATEGORY_IDS.contains(&id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub color: String,
    pub icon: String,
}

impl NewCategory {
    pub fn new(
        name: impl Into<String>,
        color: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            icon: icon.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_name(&self.name)?;
        validate_color(&self.color)?;
        if self.icon.trim().is_empty() {
            return Err(ModelValidationError::BlankIcon);
        }
        Ok(())
    }
}

/// Partial category update. The id is not patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl CategoryPatch {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if let Some(name) = &self.name {
            require_name(name)?;
        }
        if let Some(color) = &self.color {
            validate_color(color)?;
        }
        if let Some(icon) = &self.icon {
            if icon.trim().is_empty() {
                return Err(ModelValidationError::BlankIcon);
            }
        }
        Ok(())
    }

    pub(crate) fn apply_to(self, category: &mut Category) {
        if let Some(name) = self.name {
            category.name = name;
        }
        if let Some(color) = self.color {
            category.color = color;
        }
        if let Some(icon) = self.icon {
            category.icon = icon;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_matches_default_id_list() {
        let seeded = default_categories()
            .into_iter()
            .map(|category| category.id)
            .collect::<Vec<_>>();
        assert_eq!(seeded, DEFAULT_CATEGORY_IDS);
        assert!(DEFAULT_CATEGORY_IDS.contains(&FALLBACK_CATEGORY_ID));
    }

    #[test]
    fn new_category_requires_icon() {
        let category = NewCategory::new("Gym", "#000", " ");
        assert_eq!(category.validate(), Err(ModelValidationError::BlankIcon));
    }
}
