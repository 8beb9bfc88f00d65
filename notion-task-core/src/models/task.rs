use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A task as read back from the database, flattened out of Notion's
/// property bag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    /// Auto-numbered ticket id, e.g. `TASK-42`.
    pub no: Option<String>,
    pub title: String,
    pub task_type: Option<TaskType>,
    pub status: Option<TaskStatus>,
    pub status_group: Option<StatusGroup>,
    pub priority: Option<Priority>,
    pub assignee: Option<String>,
    pub assignee_name: Option<String>,
    pub creator: Option<String>,
    pub creator_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub completed_at: Option<DateTime<Utc>>,
    pub labels: Vec<String>,
    pub services: Vec<String>,
    pub parent_id: Option<String>,
    pub children_ids: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_edited_by: Option<String>,
    /// Formula output, e.g. `3/4 ~ 3/12`.
    pub period: Option<String>,
    /// Formula output in the 0.0..=1.0 range.
    pub progress: Option<f64>,
    pub url: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

impl Task {
    /// Sets the status and keeps `status_group` in step with it.
    pub fn set_status(&mut self, status: Option<TaskStatus>) {
        self.status = status;
        self.status_group = status.map(StatusGroup::of);
    }
}

/// Strips whitespace so `시작 전` and `시작전` compare equal.
fn squash(s: &str) -> String {
    s.split_whitespace().collect::<String>().to_lowercase()
}

/// `In Progress`, `in-progress` and `in_progress` all become `in_progress`.
fn snake(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Task,
    Epic,
    Issue,
    Project,
}

impl TaskType {
    pub const ALL: [TaskType; 4] = [Self::Task, Self::Epic, Self::Issue, Self::Project];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Epic => "epic",
            Self::Issue => "issue",
            Self::Project => "project",
        }
    }

    /// Option name in the Notion select.
    pub fn external_name(&self) -> &'static str {
        match self {
            Self::Task => "Task",
            Self::Epic => "Epic",
            Self::Issue => "Issue",
            Self::Project => "Project",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = snake(s);
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    OnHold,
    NotStarted,
    InProgress,
    Done,
    Deployed,
    Archived,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 6] = [
        Self::OnHold,
        Self::NotStarted,
        Self::InProgress,
        Self::Done,
        Self::Deployed,
        Self::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnHold => "on_hold",
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Deployed => "deployed",
            Self::Archived => "archived",
        }
    }

    /// Option name in the Notion status property.
    pub fn external_name(&self) -> &'static str {
        match self {
            Self::OnHold => "보류",
            Self::NotStarted => "시작 전",
            Self::InProgress => "진행 중",
            Self::Done => "완료",
            Self::Deployed => "배포됨",
            Self::Archived => "보관",
        }
    }

    /// Accepts the English name in any case or spacing (`In Progress`,
    /// `in_progress`) or the Notion option name.
    pub fn from_str(s: &str) -> Option<Self> {
        let (name, option) = (snake(s), squash(s));
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == name || squash(st.external_name()) == option)
    }

    pub fn group(&self) -> StatusGroup {
        StatusGroup::of(*self)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StatusGroup {
    Todo,
    InProgress,
    Done,
}

impl StatusGroup {
    pub const ALL: [StatusGroup; 3] = [Self::Todo, Self::InProgress, Self::Done];

    pub fn of(status: TaskStatus) -> Self {
        match status {
            TaskStatus::OnHold | TaskStatus::NotStarted => Self::Todo,
            TaskStatus::InProgress => Self::InProgress,
            TaskStatus::Done | TaskStatus::Deployed | TaskStatus::Archived => Self::Done,
        }
    }

    /// Statuses belonging to this group, in declaration order.
    pub fn statuses(&self) -> Vec<TaskStatus> {
        TaskStatus::ALL
            .into_iter()
            .filter(|s| Self::of(*s) == *self)
            .collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match (snake(s).as_str(), squash(s).as_str()) {
            ("todo" | "to_do", _) | (_, "할일") => Some(Self::Todo),
            ("in_progress", _) | (_, "진행중") => Some(Self::InProgress),
            ("done", _) | (_, "완료") => Some(Self::Done),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn external_name(&self) -> &'static str {
        match self {
            Self::Low => "낮음",
            Self::Medium => "중간",
            Self::High => "높음",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let (name, option) = (snake(s), squash(s));
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == name || p.external_name() == option)
    }
}
