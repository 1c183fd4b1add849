//! Board service and task service data types
//!
//! Field names follow the wire format of the services (Trello REST v1 and
//! Airtable v0), renamed to Rust conventions.

use serde::{Deserialize, Serialize};

/// Top-level container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "shortUrl", skip_serializing_if = "Option::is_none")]
    pub short_url: Option<String>,
    #[serde(default)]
    pub desc: String,
}

impl Board {
    /// Short URL when the service provides one
    pub fn link(&self) -> &str {
        self.short_url.as_deref().unwrap_or(&self.url)
    }
}

/// Ordered grouping within a board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardList {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "idBoard")]
    pub board_id: String,
    #[serde(default, rename = "pos")]
    pub position: f64,
}

/// Leaf work item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "desc")]
    pub description: String,
    #[serde(default, rename = "idList")]
    pub list_id: String,
    #[serde(default, rename = "due")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "shortUrl", skip_serializing_if = "Option::is_none")]
    pub short_url: Option<String>,
}

impl Card {
    pub fn link(&self) -> &str {
        self.short_url.as_deref().unwrap_or(&self.url)
    }
}

/// Card creation payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewCard {
    pub list_id: String,
    pub name: String,
    pub description: Option<String>,
    /// `YYYY-MM-DD`
    pub due_date: Option<String>,
}

/// Partial card update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub list_id: Option<String>,
    pub closed: Option<bool>,
}

impl CardUpdate {
    pub fn archive() -> Self {
        Self {
            closed: Some(true),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityMember {
    #[serde(default, rename = "fullName")]
    pub full_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityData {
    #[serde(default)]
    pub card: Option<NamedRef>,
    #[serde(default)]
    pub list: Option<NamedRef>,
    #[serde(default)]
    pub text: Option<String>,
}

/// One entry of a board's recent activity feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default, rename = "memberCreator")]
    pub member: ActivityMember,
    #[serde(default)]
    pub data: ActivityData,
}

impl Activity {
    /// `2024-03-01 10:22:05` from `2024-03-01T10:22:05.123Z`
    pub fn display_date(&self) -> String {
        if self.date.contains('T') {
            let replaced = self.date.replacen('T', " ", 1);
            replaced.split('.').next().unwrap_or(&replaced).to_string()
        } else {
            self.date.clone()
        }
    }

    pub fn summary(&self) -> String {
        if let Some(text) = self.data.text.as_deref().filter(|t| !t.is_empty()) {
            return text.to_string();
        }
        match self.data.card.as_ref() {
            Some(card) if !card.name.is_empty() => format!("{} '{}'", self.kind, card.name),
            _ => self.kind.clone(),
        }
    }
}

/// Status a task gets when none is given
pub const DEFAULT_TASK_STATUS: &str = "Not started";

/// Task fields as stored in the tabular service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFields {
    #[serde(rename = "Task", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Notes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "Deadline", default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(rename = "Status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// A row of the task table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    #[serde(default)]
    pub fields: TaskFields,
}

impl TaskRecord {
    pub fn name(&self) -> &str {
        self.fields.name.as_deref().unwrap_or("Sem nome")
    }
}

/// Task creation payload
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub name: String,
    pub description: Option<String>,
    pub deadline: Option<String>,
    pub status: String,
}

impl NewTask {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            deadline: None,
            status: DEFAULT_TASK_STATUS.to_string(),
        }
    }

    pub fn fields(&self) -> TaskFields {
        TaskFields {
            name: Some(self.name.clone()),
            notes: self.description.clone(),
            deadline: self.deadline.clone(),
            status: Some(self.status.clone()),
        }
    }
}
