//! Staff roster entries.

use serde::{Deserialize, Serialize};

/// Employment class of a roster member.
///
/// Only FULL_TIME and PART_TIME members may be assigned EARLY;
/// contract staff work fixed engagements and never take the short day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentClass {
    #[default]
    FullTime,
    PartTime,
    Contract,
}

/// One roster member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    /// Stable identifier, unique within a roster.
    pub id: String,
    /// Display name; defaults to the id.
    pub name: String,
    /// Employment class.
    pub class: EmploymentClass,
    /// Names of conflict groups the member belongs to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
}

impl Staff {
    /// Creates a full-time member with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            class: EmploymentClass::default(),
            groups: Vec::new(),
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the employment class.
    pub fn with_class(mut self, class: EmploymentClass) -> Self {
        self.class = class;
        self
    }

    /// Adds a conflict-group membership.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    /// Whether the employment class permits EARLY assignments.
    pub fn class_allows_early(&self) -> bool {
        !matches!(self.class, EmploymentClass::Contract)
    }
}
