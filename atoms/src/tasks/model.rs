use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::fields::{amount, has_text, is_supplied, parse_date};

/// Allow-listed task categories. `Other` is the catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Web Development")]
    WebDevelopment,
    #[serde(rename = "Graphic Design")]
    GraphicDesign,
    #[serde(rename = "Writing & Translation")]
    WritingTranslation,
    #[serde(rename = "Digital Marketing")]
    DigitalMarketing,
    #[serde(rename = "Data Entry")]
    DataEntry,
    #[serde(rename = "Other")]
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::WebDevelopment,
        Category::GraphicDesign,
        Category::WritingTranslation,
        Category::DigitalMarketing,
        Category::DataEntry,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::WebDevelopment => "Web Development",
            Category::GraphicDesign => "Graphic Design",
            Category::WritingTranslation => "Writing & Translation",
            Category::DigitalMarketing => "Digital Marketing",
            Category::DataEntry => "Data Entry",
            Category::Other => "Other",
        }
    }

    pub fn parse(raw: &str) -> Option<Category> {
        let raw = raw.trim();
        Category::ALL.into_iter().find(|c| c.as_str() == raw)
    }

    fn invalid() -> ApiError {
        let names: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
        ApiError::validation(format!("Invalid category. Must be one of: {}.", names.join(", ")))
    }
}

/// Task domain model - a gig posted by a client
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub category: Category,
    pub budget: f64,
    /// Stored as supplied by the client; see [`Task::deadline_at`].
    pub deadline: String,
    pub description: String,
    pub creator_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn deadline_at(&self) -> Option<DateTime<Utc>> {
        parse_date(&self.deadline)
    }
}

/// Raw create body. Everything is optional so that missing fields can be
/// reported together instead of failing on the first serde error.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskPayload {
    pub title: Option<String>,
    pub category: Option<String>,
    pub budget: Option<Value>,
    pub deadline: Option<String>,
    pub description: Option<String>,
    pub creator_email: Option<String>,
    pub creator_name: Option<String>,
}

/// A create payload that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub category: Category,
    pub budget: f64,
    pub deadline: String,
    pub description: String,
    pub creator_email: String,
    pub creator_name: Option<String>,
}

impl CreateTaskPayload {
    /// `today` is the current UTC date; deadlines before it are rejected.
    pub fn validate(self, today: NaiveDate) -> Result<NewTask, ApiError> {
        let mut missing = Vec::new();
        if !has_text(&self.title) {
            missing.push("title".to_string());
        }
        if !has_text(&self.category) {
            missing.push("category".to_string());
        }
        if !is_supplied(self.budget.as_ref()) {
            missing.push("budget".to_string());
        }
        if !has_text(&self.deadline) {
            missing.push("deadline".to_string());
        }
        if !has_text(&self.description) {
            missing.push("description".to_string());
        }
        if !has_text(&self.creator_email) {
            missing.push("creatorEmail".to_string());
        }
        if !missing.is_empty() {
            return Err(ApiError::missing_fields(missing));
        }

        let budget = amount(self.budget.as_ref().unwrap_or(&Value::Null), "Budget")?;

        let category = self
            .category
            .as_deref()
            .and_then(Category::parse)
            .ok_or_else(Category::invalid)?;

        let deadline = trimmed(self.deadline);
        let deadline_at = parse_date(&deadline)
            .ok_or_else(|| ApiError::validation("Deadline must be a valid date."))?;
        if deadline_at.date_naive() < today {
            return Err(ApiError::validation("Deadline cannot be in the past."));
        }

        Ok(NewTask {
            title: trimmed(self.title),
            category,
            budget,
            deadline,
            description: trimmed(self.description),
            creator_email: trimmed(self.creator_email),
            creator_name: self
                .creator_name
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        })
    }
}

/// Fields an update may never touch. They are dropped before parsing.
pub const PROTECTED_FIELDS: [&str; 4] = ["_id", "id", "creatorEmail", "creatorName"];

/// Server-stamped timestamps. Clients echoing a fetched task send them back,
/// so they are dropped like the protected fields.
pub const SERVER_FIELDS: [&str; 2] = ["createdAt", "updatedAt"];

/// The only fields an update may set.
pub const UPDATABLE_FIELDS: [&str; 5] = ["title", "category", "budget", "deadline", "description"];

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskPayload {
    pub title: Option<String>,
    pub category: Option<String>,
    pub budget: Option<Value>,
    pub deadline: Option<String>,
    pub description: Option<String>,
}

/// Validated partial update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub category: Option<Category>,
    pub budget: Option<f64>,
    pub deadline: Option<String>,
    pub description: Option<String>,
}

impl UpdateTaskPayload {
    /// Parse an update body: must be a non-empty JSON object. Protected and
    /// server fields are stripped silently; anything else not updatable is
    /// rejected.
    pub fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ApiError::validation("Update payload cannot be empty."));
        }
        let Value::Object(mut fields) = serde_json::from_slice::<Value>(body)? else {
            return Err(ApiError::validation("Update payload must be a JSON object."));
        };
        if fields.is_empty() {
            return Err(ApiError::validation("Update payload cannot be empty."));
        }
        for name in PROTECTED_FIELDS.iter().chain(SERVER_FIELDS.iter()) {
            fields.remove(*name);
        }
        let unknown: Vec<&str> = fields
            .keys()
            .map(String::as_str)
            .filter(|name| !UPDATABLE_FIELDS.contains(name))
            .collect();
        if !unknown.is_empty() {
            return Err(ApiError::validation(format!(
                "Unknown update fields: {}.",
                unknown.join(", ")
            )));
        }
        Ok(serde_json::from_value(Value::Object(fields))?)
    }

    pub fn validate(self) -> Result<TaskChanges, ApiError> {
        let title = non_blank(self.title, "Title cannot be empty.")?;
        let description = non_blank(self.description, "Description cannot be empty.")?;

        let category = match self.category {
            Some(raw) => Some(Category::parse(&raw).ok_or_else(Category::invalid)?),
            None => None,
        };

        let budget = match self.budget {
            Some(raw) => Some(amount(&raw, "Budget")?),
            None => None,
        };

        let deadline = match self.deadline {
            Some(raw) => {
                let raw = raw.trim().to_string();
                if parse_date(&raw).is_none() {
                    return Err(ApiError::validation("Deadline must be a valid date."));
                }
                Some(raw)
            }
            None => None,
        };

        Ok(TaskChanges {
            title,
            category,
            budget,
            deadline,
            description,
        })
    }
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        *self == TaskChanges::default()
    }

    /// Keep only the fields whose value differs from `task`.
    pub fn changed_from(self, task: &Task) -> TaskChanges {
        TaskChanges {
            title: self.title.filter(|v| *v != task.title),
            category: self.category.filter(|v| *v != task.category),
            budget: self.budget.filter(|v| *v != task.budget),
            deadline: self.deadline.filter(|v| *v != task.deadline),
            description: self.description.filter(|v| *v != task.description),
        }
    }

    /// Merge into `task`. Returns whether any stored value changed.
    pub fn apply(&self, task: &mut Task) -> bool {
        let mut changed = false;
        if let Some(title) = &self.title {
            changed |= replace(&mut task.title, title.clone());
        }
        if let Some(category) = self.category {
            changed |= replace(&mut task.category, category);
        }
        if let Some(budget) = self.budget {
            changed |= replace(&mut task.budget, budget);
        }
        if let Some(deadline) = &self.deadline {
            changed |= replace(&mut task.deadline, deadline.clone());
        }
        if let Some(description) = &self.description {
            changed |= replace(&mut task.description, description.clone());
        }
        changed
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn trimmed(value: Option<String>) -> String {
    value.map(|s| s.trim().to_string()).unwrap_or_default()
}

fn non_blank(value: Option<String>, message: &str) -> Result<Option<String>, ApiError> {
    match value.map(|s| s.trim().to_string()) {
        Some(s) if s.is_empty() => Err(ApiError::validation(message)),
        other => Ok(other),
    }
}
