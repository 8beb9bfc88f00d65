use std::borrow::Cow;

use chrono::NaiveDate;
use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::task::{Priority, TaskStatus, TaskType};

/// An update to an optional field.
///
/// In JSON a missing key is [`Patch::Absent`], an explicit `null` is
/// [`Patch::Clear`] and any other value is [`Patch::Set`]. Fields of this type
/// must carry `#[serde(default)]` so that a missing key deserializes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Absent,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn as_ref(&self) -> Patch<&T> {
        match self {
            Self::Absent => Patch::Absent,
            Self::Clear => Patch::Clear,
            Self::Set(v) => Patch::Set(v),
        }
    }

    /// A value wins over `clear`; neither leaves the field untouched.
    pub fn from_flags(value: Option<T>, clear: bool) -> Self {
        match (value, clear) {
            (Some(v), _) => Self::Set(v),
            (None, true) => Self::Clear,
            (None, false) => Self::Absent,
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    /// Maps `None` to `Absent`, for create requests where "not given" never
    /// means "clear".
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Set(v),
            None => Self::Absent,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Self::Set(v),
            None => Self::Clear,
        })
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Set(v) => serializer.serialize_some(v),
            Self::Absent | Self::Clear => serializer.serialize_none(),
        }
    }
}

impl<T: JsonSchema> JsonSchema for Patch<T> {
    fn inline_schema() -> bool {
        true
    }

    fn schema_name() -> Cow<'static, str> {
        Option::<T>::schema_name()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        Option::<T>::json_schema(generator)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CreateTaskInput {
    #[schemars(description = "Task title")]
    pub title: String,
    #[serde(default = "default_task_type")]
    #[schemars(description = "Item type (defaults to task)")]
    pub task_type: TaskType,
    #[serde(default = "default_status")]
    #[schemars(description = "Initial status (defaults to not_started)")]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    #[schemars(description = "Assignee Notion user ID")]
    pub assignee: Option<String>,
    #[serde(default)]
    #[schemars(description = "Start date (YYYY-MM-DD)")]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    #[schemars(description = "End date (YYYY-MM-DD)")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    #[schemars(description = "Parent item page ID")]
    pub parent_id: Option<String>,
    #[serde(default)]
    #[schemars(description = "Database template to apply on creation")]
    pub template_id: Option<String>,
}

fn default_task_type() -> TaskType {
    TaskType::Task
}

fn default_status() -> TaskStatus {
    TaskStatus::NotStarted
}

impl CreateTaskInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            task_type: default_task_type(),
            status: default_status(),
            priority: None,
            assignee: None,
            start_date: None,
            end_date: None,
            labels: Vec::new(),
            services: Vec::new(),
            parent_id: None,
            template_id: None,
        }
    }
}

/// Field changes for an existing task. Also the common shape both create and
/// update requests go through on their way to Notion properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UpdateTaskInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<TaskType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    #[schemars(description = "Priority; null clears it")]
    pub priority: Patch<Priority>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    #[schemars(description = "Assignee Notion user ID; null clears it")]
    pub assignee: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    #[schemars(description = "Start date (YYYY-MM-DD); null clears it")]
    pub start_date: Patch<NaiveDate>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    #[schemars(description = "End date (YYYY-MM-DD); null clears it")]
    pub end_date: Patch<NaiveDate>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    #[schemars(description = "Replaces all labels; null or an empty list clears them")]
    pub labels: Patch<Vec<String>>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    #[schemars(description = "Replaces all services; null or an empty list clears them")]
    pub services: Patch<Vec<String>>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    #[schemars(description = "Parent item page ID; null detaches the item")]
    pub parent_id: Patch<String>,
}

impl UpdateTaskInput {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn assignee(assignee: impl Into<String>) -> Self {
        Self {
            assignee: Patch::Set(assignee.into()),
            ..Default::default()
        }
    }
}

impl From<CreateTaskInput> for UpdateTaskInput {
    fn from(input: CreateTaskInput) -> Self {
        Self {
            title: Some(input.title),
            task_type: Some(input.task_type),
            status: Some(input.status),
            priority: input.priority.into(),
            assignee: input.assignee.into(),
            start_date: input.start_date.into(),
            end_date: input.end_date.into(),
            labels: (!input.labels.is_empty()).then_some(input.labels).into(),
            services: (!input.services.is_empty()).then_some(input.services).into(),
            parent_id: input.parent_id.into(),
        }
    }
}
