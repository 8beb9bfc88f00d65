//! Conversion between Notion pages and [`Task`]s.
//!
//! Reads never fail: a property that is missing, null or of an unexpected
//! type leaves the task field unset, and select options outside the known
//! enumerations are treated as unset too.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Map, Value};

use crate::models::{
    Patch, Priority, PropertyNames, Task, TaskStatus, TaskType, UpdateTaskInput,
};

/// Result of reading an enumerated property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed<T> {
    /// The property is missing or empty.
    Absent,
    Known(T),
    /// The property holds an option name we have no variant for.
    Unrecognized(String),
}

impl<T> Parsed<T> {
    fn read(name: Option<&str>, parse: impl FnOnce(&str) -> Option<T>) -> Self {
        match name {
            None => Self::Absent,
            Some(name) => match parse(name) {
                Some(value) => Self::Known(value),
                None => Self::Unrecognized(name.to_string()),
            },
        }
    }

    /// Collapses to an `Option`, logging unrecognized values.
    pub fn known(self, field: &str) -> Option<T> {
        match self {
            Self::Known(value) => Some(value),
            Self::Absent => None,
            Self::Unrecognized(raw) => {
                tracing::debug!(field, value = %raw, "ignoring unrecognized option");
                None
            }
        }
    }
}

pub fn parse_task_type(props: Option<&Map<String, Value>>, names: &PropertyNames) -> Parsed<TaskType> {
    Parsed::read(option_name(prop(props, &names.task_type), "select"), TaskType::from_str)
}

pub fn parse_status(props: Option<&Map<String, Value>>, names: &PropertyNames) -> Parsed<TaskStatus> {
    Parsed::read(option_name(prop(props, &names.status), "status"), TaskStatus::from_str)
}

pub fn parse_priority(props: Option<&Map<String, Value>>, names: &PropertyNames) -> Parsed<Priority> {
    Parsed::read(option_name(prop(props, &names.priority), "select"), Priority::from_str)
}

/// Converts a Notion page object into a normalized task.
pub fn to_normalized(page: &Value, names: &PropertyNames) -> Task {
    let props = page.get("properties").and_then(Value::as_object);

    let (assignee, assignee_name) = person(
        prop(props, &names.assignee)
            .and_then(|p| p.get("people"))
            .and_then(Value::as_array)
            .and_then(|people| people.first()),
    );
    let (creator, creator_name) =
        person(prop(props, &names.creator).and_then(|p| p.get("created_by")));

    let mut task = Task {
        id: str_field(page, "id").unwrap_or_default(),
        no: unique_number(props, names),
        title: title(props, names),
        task_type: parse_task_type(props, names).known(&names.task_type),
        priority: parse_priority(props, names).known(&names.priority),
        assignee,
        assignee_name,
        creator,
        creator_name,
        start_date: date_start(prop(props, &names.start_date)).and_then(parse_date),
        end_date: date_start(prop(props, &names.end_date)).and_then(parse_date),
        completed_at: date_start(prop(props, &names.completed_at)).and_then(parse_timestamp),
        labels: option_names(prop(props, &names.labels)),
        services: option_names(prop(props, &names.services)),
        parent_id: relation_ids(prop(props, &names.parent)).into_iter().next(),
        children_ids: relation_ids(prop(props, &names.children)),
        created_at: str_field(page, "created_time").as_deref().and_then(parse_timestamp),
        updated_at: str_field(page, "last_edited_time").as_deref().and_then(parse_timestamp),
        last_edited_by: page
            .get("last_edited_by")
            .and_then(|u| u.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string),
        period: formula(prop(props, &names.period), "string")
            .and_then(Value::as_str)
            .map(str::to_string),
        progress: formula(prop(props, &names.progress), "number").and_then(Value::as_f64),
        url: str_field(page, "url"),
        archived: bool_field(page, "archived") || bool_field(page, "in_trash"),
        ..Default::default()
    };
    task.set_status(parse_status(props, names).known(&names.status));
    task
}

/// Builds the `properties` object for a create or update call.
///
/// Only fields present in `input` are emitted. A [`Patch::Clear`] becomes the
/// property's empty value so Notion clears it.
pub fn to_external_patch(input: &UpdateTaskInput, names: &PropertyNames) -> Map<String, Value> {
    let mut props = Map::new();

    if let Some(title) = &input.title {
        props.insert(
            names.title.clone(),
            json!({ "title": [{ "type": "text", "text": { "content": title } }] }),
        );
    }
    if let Some(task_type) = input.task_type {
        props.insert(
            names.task_type.clone(),
            json!({ "select": { "name": task_type.external_name() } }),
        );
    }
    if let Some(status) = input.status {
        props.insert(
            names.status.clone(),
            json!({ "status": { "name": status.external_name() } }),
        );
    }
    match input.priority {
        Patch::Absent => {}
        Patch::Clear => {
            props.insert(names.priority.clone(), json!({ "select": null }));
        }
        Patch::Set(priority) => {
            props.insert(
                names.priority.clone(),
                json!({ "select": { "name": priority.external_name() } }),
            );
        }
    }
    match &input.assignee {
        Patch::Absent => {}
        Patch::Clear => {
            props.insert(names.assignee.clone(), json!({ "people": [] }));
        }
        Patch::Set(id) => {
            props.insert(
                names.assignee.clone(),
                json!({ "people": [{ "object": "user", "id": id }] }),
            );
        }
    }
    insert_date(&mut props, &names.start_date, input.start_date.as_ref());
    insert_date(&mut props, &names.end_date, input.end_date.as_ref());
    insert_multi_select(&mut props, &names.labels, input.labels.as_ref());
    insert_multi_select(&mut props, &names.services, input.services.as_ref());
    match &input.parent_id {
        Patch::Absent => {}
        Patch::Clear => {
            props.insert(names.parent.clone(), json!({ "relation": [] }));
        }
        Patch::Set(id) => {
            props.insert(names.parent.clone(), json!({ "relation": [{ "id": id }] }));
        }
    }

    props
}

fn insert_date(props: &mut Map<String, Value>, name: &str, date: Patch<&NaiveDate>) {
    match date {
        Patch::Absent => {}
        Patch::Clear => {
            props.insert(name.to_string(), json!({ "date": null }));
        }
        Patch::Set(date) => {
            props.insert(
                name.to_string(),
                json!({ "date": { "start": date.format("%Y-%m-%d").to_string() } }),
            );
        }
    }
}

/// Clear and an empty list both write `{"multi_select": []}`.
fn insert_multi_select(props: &mut Map<String, Value>, name: &str, values: Patch<&Vec<String>>) {
    let options: Vec<Value> = match values {
        Patch::Absent => return,
        Patch::Clear => Vec::new(),
        Patch::Set(values) => values.iter().map(|v| json!({ "name": v })).collect(),
    };
    props.insert(name.to_string(), json!({ "multi_select": options }));
}

fn prop<'a>(props: Option<&'a Map<String, Value>>, name: &str) -> Option<&'a Value> {
    props?.get(name).filter(|v| !v.is_null())
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn bool_field(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// `{"select": {"name": ...}}` style option name.
fn option_name<'a>(prop: Option<&'a Value>, kind: &str) -> Option<&'a str> {
    prop?.get(kind)?.get("name")?.as_str()
}

fn option_names(prop: Option<&Value>) -> Vec<String> {
    prop.and_then(|p| p.get("multi_select"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn relation_ids(prop: Option<&Value>) -> Vec<String> {
    prop.and_then(|p| p.get("relation"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("id").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn person(user: Option<&Value>) -> (Option<String>, Option<String>) {
    match user {
        Some(user) => (str_field(user, "id"), str_field(user, "name")),
        None => (None, None),
    }
}

/// Concatenates text runs, using `plain_text` when Notion rendered it and
/// the raw `text.content` otherwise.
fn rich_text(runs: &Value) -> Option<String> {
    let runs = runs.as_array()?;
    Some(
        runs.iter()
            .filter_map(|run| {
                run.get("plain_text")
                    .and_then(Value::as_str)
                    .or_else(|| run.pointer("/text/content").and_then(Value::as_str))
            })
            .collect(),
    )
}

fn title(props: Option<&Map<String, Value>>, names: &PropertyNames) -> String {
    prop(props, &names.title)
        .and_then(|p| p.get("title"))
        .or_else(|| {
            // Every database has exactly one title property; find it if renamed.
            props?.values().find_map(|p| p.get("title").filter(|t| t.is_array()))
        })
        .and_then(rich_text)
        .unwrap_or_default()
}

fn unique_number(props: Option<&Map<String, Value>>, names: &PropertyNames) -> Option<String> {
    let unique_id = prop(props, &names.number)
        .and_then(|p| p.get("unique_id"))
        .or_else(|| props?.values().find_map(|p| p.get("unique_id")))?;
    let number = unique_id.get("number")?.as_i64()?;
    match unique_id.get("prefix").and_then(Value::as_str) {
        Some(prefix) if !prefix.is_empty() => Some(format!("{prefix}-{number}")),
        _ => Some(number.to_string()),
    }
}

fn date_start(prop: Option<&Value>) -> Option<&str> {
    prop?.get("date")?.get("start")?.as_str()
}

fn formula<'a>(prop: Option<&'a Value>, kind: &str) -> Option<&'a Value> {
    let formula = prop?.get("formula")?;
    if formula.get("type")?.as_str()? != kind {
        return None;
    }
    formula.get(kind).filter(|v| !v.is_null())
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok()
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| parse_date(s)?.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()))
}
