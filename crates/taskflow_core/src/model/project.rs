//! Project records.

use crate::model::validate::{require_name, validate_color, ModelValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ProjectId = Uuid;

/// Grouping container for tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub color: String,
}

impl NewProject {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            color: color.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_name(&self.name)?;
        validate_color(&self.color)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub color: Option<String>,
}

impl ProjectPatch {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if let Some(name) = &self.name {
            require_name(name)?;
        }
        if let Some(color) = &self.color {
            validate_color(color)?;
        }
        Ok(())
    }

    pub(crate) fn apply_to(self, project: &mut Project) {
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(description) = self.description {
            project.description = description;
        }
        if let Some(color) = self.color {
            project.color = color;
        }
    }
}
