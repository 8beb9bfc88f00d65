use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::task::{Priority, StatusGroup, TaskStatus, TaskType};

/// Conjunction of optional predicates. An all-empty filter matches every task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TaskFilter {
    #[serde(default)]
    pub task_type: Option<TaskType>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    #[schemars(description = "Matches any status in the group")]
    pub status_group: Option<StatusGroup>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    #[schemars(description = "Assignee Notion user ID")]
    pub assignee: Option<String>,
    #[serde(default)]
    #[schemars(description = "Matches tasks carrying any of these labels")]
    pub labels: Vec<String>,
    #[serde(default)]
    #[schemars(description = "Matches tasks tagged with any of these services")]
    pub services: Vec<String>,
    #[serde(default)]
    pub start_date_from: Option<NaiveDate>,
    #[serde(default)]
    pub start_date_to: Option<NaiveDate>,
    #[serde(default)]
    pub end_date_from: Option<NaiveDate>,
    #[serde(default)]
    pub end_date_to: Option<NaiveDate>,
    #[serde(default)]
    #[schemars(description = "Parent item page ID")]
    pub parent_id: Option<String>,
    #[serde(default)]
    #[schemars(description = "true: only items with a parent, false: only top-level items")]
    pub has_parent: Option<bool>,
}

impl TaskFilter {
    pub fn of_type(task_type: TaskType) -> Self {
        Self {
            task_type: Some(task_type),
            ..Default::default()
        }
    }
}
