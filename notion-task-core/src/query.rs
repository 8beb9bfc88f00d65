//! Database query construction and cursor pagination.

use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{PropertyNames, TaskFilter};

/// Largest page the query endpoint will return.
pub const MAX_PAGE_SIZE: u32 = 100;

pub fn clamp_page_size(page_size: u32) -> u32 {
    page_size.clamp(1, MAX_PAGE_SIZE)
}

/// A node of Notion's compound filter tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterNode {
    And { and: Vec<FilterNode> },
    Or { or: Vec<FilterNode> },
    Property(PropertyFilter),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyFilter {
    pub property: String,
    #[serde(flatten)]
    pub condition: Condition,
}

/// Condition keyed by the property type, e.g. `{"select": {"equals": "Epic"}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Select(Equals),
    Status(Equals),
    People(Contains),
    MultiSelect(Contains),
    Date(DateCondition),
    Relation(RelationCondition),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Equals {
    pub equals: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contains {
    pub contains: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateCondition {
    OnOrAfter(NaiveDate),
    OnOrBefore(NaiveDate),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationCondition {
    Contains(String),
    IsEmpty(bool),
    IsNotEmpty(bool),
}

impl FilterNode {
    pub fn property(property: &str, condition: Condition) -> Self {
        Self::Property(PropertyFilter {
            property: property.to_string(),
            condition,
        })
    }

    /// `None` for no clauses, the clause itself for one, `or` otherwise.
    pub fn any_of(mut clauses: Vec<FilterNode>) -> Option<Self> {
        match clauses.len() {
            0 => None,
            1 => clauses.pop(),
            _ => Some(Self::Or { or: clauses }),
        }
    }

    /// `None` for no clauses, the clause itself for one, `and` otherwise.
    pub fn all_of(mut clauses: Vec<FilterNode>) -> Option<Self> {
        match clauses.len() {
            0 => None,
            1 => clauses.pop(),
            _ => Some(Self::And { and: clauses }),
        }
    }
}

/// Translates a task filter into a Notion filter tree.
///
/// Returns `None` when no predicate is set, meaning the query should carry no
/// filter at all.
pub fn build_filter(filter: &TaskFilter, names: &PropertyNames) -> Option<FilterNode> {
    let mut clauses = Vec::new();

    if let Some(task_type) = filter.task_type {
        clauses.push(select_equals(&names.task_type, task_type.external_name()));
    }
    if let Some(status) = filter.status {
        clauses.push(status_equals(&names.status, status.external_name()));
    }
    if let Some(group) = filter.status_group {
        let statuses = group
            .statuses()
            .into_iter()
            .map(|s| status_equals(&names.status, s.external_name()))
            .collect();
        clauses.extend(FilterNode::any_of(statuses));
    }
    if let Some(priority) = filter.priority {
        clauses.push(select_equals(&names.priority, priority.external_name()));
    }
    if let Some(assignee) = &filter.assignee {
        clauses.push(FilterNode::property(
            &names.assignee,
            Condition::People(Contains {
                contains: assignee.clone(),
            }),
        ));
    }
    clauses.extend(FilterNode::any_of(
        filter
            .labels
            .iter()
            .map(|label| multi_select_contains(&names.labels, label))
            .collect(),
    ));
    clauses.extend(FilterNode::any_of(
        filter
            .services
            .iter()
            .map(|service| multi_select_contains(&names.services, service))
            .collect(),
    ));

    let date_bounds = [
        (&names.start_date, filter.start_date_from.map(DateCondition::OnOrAfter)),
        (&names.start_date, filter.start_date_to.map(DateCondition::OnOrBefore)),
        (&names.end_date, filter.end_date_from.map(DateCondition::OnOrAfter)),
        (&names.end_date, filter.end_date_to.map(DateCondition::OnOrBefore)),
    ];
    for (property, bound) in date_bounds {
        if let Some(bound) = bound {
            clauses.push(FilterNode::property(property, Condition::Date(bound)));
        }
    }

    if let Some(parent_id) = &filter.parent_id {
        clauses.push(FilterNode::property(
            &names.parent,
            Condition::Relation(RelationCondition::Contains(parent_id.clone())),
        ));
    }
    if let Some(has_parent) = filter.has_parent {
        let condition = if has_parent {
            RelationCondition::IsNotEmpty(true)
        } else {
            RelationCondition::IsEmpty(true)
        };
        clauses.push(FilterNode::property(&names.parent, Condition::Relation(condition)));
    }

    FilterNode::all_of(clauses)
}

fn select_equals(property: &str, name: &str) -> FilterNode {
    FilterNode::property(
        property,
        Condition::Select(Equals {
            equals: name.to_string(),
        }),
    )
}

fn status_equals(property: &str, name: &str) -> FilterNode {
    FilterNode::property(
        property,
        Condition::Status(Equals {
            equals: name.to_string(),
        }),
    )
}

fn multi_select_contains(property: &str, name: &str) -> FilterNode {
    FilterNode::property(
        property,
        Condition::MultiSelect(Contains {
            contains: name.to_string(),
        }),
    )
}

/// Body of a data source query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
}

/// One page of a paginated list response. Template listings name their item
/// array `templates`; everything else uses `results`.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default, alias = "templates")]
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Fetches pages until one reports `has_more: false`, concatenating results
/// in order.
///
/// `fetch` receives the cursor for the page to load (`None` for the first).
/// Empty pages do not stop the walk; only the `has_more` flag does.
pub async fn collect_pages<T, E, F, Fut>(mut fetch: F) -> Result<Vec<T>, E>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let mut items = Vec::new();
    let mut cursor = None;
    let mut pages = 0usize;

    loop {
        let page = fetch(cursor.take()).await?;
        pages += 1;
        tracing::debug!(
            page = pages,
            results = page.results.len(),
            has_more = page.has_more,
            "fetched page"
        );
        items.extend(page.results);

        if !page.has_more {
            break;
        }
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => {
                tracing::warn!(page = pages, "has_more set without next_cursor, stopping");
                break;
            }
        }
    }

    Ok(items)
}
