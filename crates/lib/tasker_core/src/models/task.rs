//! Task domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Row returned by task queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when creating a task.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewTask {
    /// Reject blank or oversized titles.
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)
    }
}

/// Partial update. Absent fields are left untouched.
///
/// `description` distinguishes "absent" (`None`) from an explicit
/// `null` (`Some(None)`), which clears the stored description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl TaskUpdate {
    pub fn validate(&self) -> Result<(), String> {
        match &self.title {
            Some(title) => validate_title(title),
            None => Ok(()),
        }
    }

    /// Merge the present fields into `task`.
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title must not be empty".into());
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(format!("Title must be at most {MAX_TITLE_LEN} characters"));
    }
    Ok(())
}

/// Marks a field as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Task {
        Task {
            id: 1,
            title: "Write report".into(),
            description: Some("quarterly".into()),
            completed: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn description_only_update_keeps_other_fields() {
        let mut task = sample();
        let update: TaskUpdate = serde_json::from_str(r#"{"description":"annual"}"#).unwrap();
        update.apply(&mut task);
        assert_eq!(task.title, "Write report");
        assert_eq!(task.description.as_deref(), Some("annual"));
        assert!(!task.completed);
    }

    #[test]
    fn explicit_null_clears_description() {
        let mut task = sample();
        let update: TaskUpdate = serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(update.description, Some(None));
        update.apply(&mut task);
        assert_eq!(task.description, None);
    }

    #[test]
    fn absent_description_is_untouched() {
        let mut task = sample();
        let update: TaskUpdate = serde_json::from_str(r#"{"completed":true}"#).unwrap();
        assert_eq!(update.description, None);
        update.apply(&mut task);
        assert_eq!(task.description.as_deref(), Some("quarterly"));
        assert!(task.completed);
    }

    #[test]
    fn empty_update_leaves_every_field_absent() {
        let update: TaskUpdate = serde_json::from_str("{}").unwrap();
        assert!(update.title.is_none());
        assert!(update.description.is_none());
        assert!(update.completed.is_none());
    }

    #[test]
    fn blank_title_is_rejected() {
        let task = NewTask {
            title: "   ".into(),
            description: None,
        };
        assert!(task.validate().is_err());

        let update = TaskUpdate {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn long_title_is_rejected() {
        let task = NewTask {
            title: "x".repeat(MAX_TITLE_LEN + 1),
            description: None,
        };
        assert!(task.validate().is_err());
    }
}
