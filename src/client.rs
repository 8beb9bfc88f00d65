//! REST client for the Notion task database.

use std::time::Duration;

use notion_task_core::mapper::{to_external_patch, to_normalized};
use notion_task_core::models::{
    CreateTaskInput, Patch, PropertyNames, Task, TaskFilter, TaskStatus, TaskType, Template,
    UpdateTaskInput,
};
use notion_task_core::query::{build_filter, clamp_page_size, collect_pages, Page, QueryRequest, MAX_PAGE_SIZE};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result, ResultExt};

/// Notion client bound to one task database.
#[derive(Debug)]
pub struct NotionClient {
    http: reqwest::Client,
    api_url: String,
    database_id: String,
    /// Looked up from the database on first use and kept for the client's
    /// lifetime.
    data_source_id: OnceCell<String>,
    names: PropertyNames,
}

/// Result of applying one change to many tasks.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub updated: Vec<Task>,
    pub failed: Vec<BatchFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub id: String,
    pub error: String,
}

#[derive(Debug, Deserialize)]
struct DatabaseObject {
    #[serde(default)]
    data_sources: Vec<DataSourceRef>,
}

#[derive(Debug, Deserialize)]
struct DataSourceRef {
    id: String,
}

/// Error body Notion returns with non-2xx statuses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
    message: String,
}

impl NotionClient {
    /// Builds a client from resolved configuration.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the API key cannot be sent as a header.
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|_| Error::Config("API key contains invalid characters".into()))?,
        );
        headers.insert(
            "notion-version",
            HeaderValue::from_str(&config.notion_version)
                .map_err(|_| Error::Config("invalid Notion API version".into()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let data_source_id = match &config.data_source_id {
            Some(id) => OnceCell::new_with(Some(id.clone())),
            None => OnceCell::new(),
        };

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            database_id: config.database_id.clone(),
            data_source_id,
            names: config.properties.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.api_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Decode(e.to_string()))
    }

    /// The data source backing the configured database.
    ///
    /// Fetched once; later calls return the cached value even if the database
    /// has since been restructured.
    pub async fn data_source_id(&self) -> Result<&str> {
        self.data_source_id
            .get_or_try_init(|| async {
                debug!(database_id = %self.database_id, "looking up data source");
                let database: DatabaseObject = self
                    .send(self.http.get(self.url(&format!("databases/{}", self.database_id))))
                    .await?;
                database
                    .data_sources
                    .into_iter()
                    .next()
                    .map(|ds| ds.id)
                    .ok_or_else(|| {
                        Error::Decode(format!("database {} has no data sources", self.database_id))
                    })
            })
            .await
            .map(String::as_str)
    }

    // =========================================================================
    // Single task operations
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn get_task(&self, task_id: &str) -> Result<Task> {
        let id = normalize_id("task_id", task_id)?;
        let page: Value = self
            .send(self.http.get(self.url(&format!("pages/{id}"))))
            .await
            .context("get_task", &id)?;
        Ok(to_normalized(&page, &self.names))
    }

    /// Lists every task matching `filter`, following cursors to the end.
    #[instrument(skip(self, filter))]
    pub async fn list_tasks(&self, filter: &TaskFilter, page_size: Option<u32>) -> Result<Vec<Task>> {
        let filter = validate_filter(filter)?;
        let filter_node = build_filter(&filter, &self.names);
        let page_size = clamp_page_size(page_size.unwrap_or(MAX_PAGE_SIZE));

        let data_source_id = self.data_source_id().await.context("list_tasks", &self.database_id)?;
        let url = self.url(&format!("data_sources/{data_source_id}/query"));

        let pages = collect_pages(|cursor| {
            let request = QueryRequest {
                filter: filter_node.clone(),
                page_size: Some(page_size),
                start_cursor: cursor,
            };
            self.send::<Page<Value>>(self.http.post(&url).json(&request))
        })
        .await
        .context("list_tasks", data_source_id)?;

        debug!(count = pages.len(), "listed tasks");
        Ok(pages.iter().map(|page| to_normalized(page, &self.names)).collect())
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_task(&self, input: CreateTaskInput) -> Result<Task> {
        if input.title.trim().is_empty() {
            return Err(Error::validation("title", "must not be empty"));
        }
        let template_id = input
            .template_id
            .as_deref()
            .map(|id| normalize_id("template_id", id))
            .transpose()?;
        let patch = validate_patch(UpdateTaskInput::from(input))?;

        let data_source_id = self.data_source_id().await.context("create_task", &self.database_id)?;
        let mut body = json!({
            "parent": { "type": "data_source_id", "data_source_id": data_source_id },
            "properties": to_external_patch(&patch, &self.names),
        });
        if let Some(template_id) = template_id {
            body["template"] = json!({ "type": "template_id", "template_id": template_id });
        }

        let page: Value = self
            .send(self.http.post(self.url("pages")).json(&body))
            .await
            .context("create_task", data_source_id)?;
        let task = to_normalized(&page, &self.names);
        info!(task_id = %task.id, "created task");
        Ok(task)
    }

    /// Creates a task, applying the database template named after its type
    /// when no template was given and one exists.
    pub async fn create_task_from_type_template(&self, mut input: CreateTaskInput) -> Result<Task> {
        if input.template_id.is_none() {
            input.template_id = self
                .get_template_by_type(input.task_type)
                .await?
                .map(|template| template.id);
        }
        self.create_task(input).await
    }

    #[instrument(skip(self, patch))]
    pub async fn update_task(&self, task_id: &str, patch: &UpdateTaskInput) -> Result<Task> {
        let id = normalize_id("task_id", task_id)?;
        let patch = validate_patch(patch.clone())?;
        self.send_update(&id, &patch).await
    }

    async fn send_update(&self, id: &str, patch: &UpdateTaskInput) -> Result<Task> {
        let body = json!({ "properties": to_external_patch(patch, &self.names) });
        let page: Value = self
            .send(self.http.patch(self.url(&format!("pages/{id}"))).json(&body))
            .await
            .context("update_task", id)?;
        Ok(to_normalized(&page, &self.names))
    }

    /// Archives the task page. Notion keeps it in trash; nothing is removed.
    #[instrument(skip(self))]
    pub async fn delete_task(&self, task_id: &str) -> Result<()> {
        let id = normalize_id("task_id", task_id)?;
        let _: Value = self
            .send(
                self.http
                    .patch(self.url(&format!("pages/{id}")))
                    .json(&json!({ "archived": true })),
            )
            .await
            .context("delete_task", &id)?;
        info!(task_id = %id, "archived task");
        Ok(())
    }

    pub async fn complete_task(&self, task_id: &str) -> Result<Task> {
        self.update_task(task_id, &UpdateTaskInput::status(TaskStatus::Done))
            .await
    }

    // =========================================================================
    // Batch operations
    // =========================================================================

    /// Applies `patch` to each task in order, one request at a time.
    ///
    /// Every ID is validated before the first request. After that a failing
    /// item is recorded in [`BatchOutcome::failed`] and the batch moves on;
    /// earlier updates stay applied.
    #[instrument(skip(self, task_ids, patch), fields(count = task_ids.len()))]
    pub async fn batch_update(&self, task_ids: &[String], patch: &UpdateTaskInput) -> Result<BatchOutcome> {
        let ids = task_ids
            .iter()
            .map(|id| normalize_id("task_ids", id))
            .collect::<Result<Vec<_>>>()?;
        let patch = validate_patch(patch.clone())?;

        let mut outcome = BatchOutcome::default();
        for id in ids {
            match self.send_update(&id, &patch).await {
                Ok(task) => outcome.updated.push(task),
                Err(e) => {
                    warn!(task_id = %id, error = %e, "batch item failed");
                    outcome.failed.push(BatchFailure {
                        id,
                        error: e.root().to_string(),
                    });
                }
            }
        }

        info!(
            updated = outcome.updated.len(),
            failed = outcome.failed.len(),
            "batch update finished"
        );
        Ok(outcome)
    }

    pub async fn batch_update_status(&self, task_ids: &[String], status: TaskStatus) -> Result<BatchOutcome> {
        self.batch_update(task_ids, &UpdateTaskInput::status(status))
            .await
    }

    pub async fn batch_update_assignee(&self, task_ids: &[String], assignee: &str) -> Result<BatchOutcome> {
        self.batch_update(task_ids, &UpdateTaskInput::assignee(assignee))
            .await
    }

    // =========================================================================
    // Templates
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn list_templates(&self) -> Result<Vec<Template>> {
        let data_source_id = self.data_source_id().await.context("list_templates", &self.database_id)?;
        let url = self.url(&format!("data_sources/{data_source_id}/templates"));
        let page_size = MAX_PAGE_SIZE.to_string();

        collect_pages(|cursor| {
            let mut request = self.http.get(&url).query(&[("page_size", page_size.as_str())]);
            if let Some(cursor) = cursor {
                request = request.query(&[("start_cursor", cursor)]);
            }
            self.send::<Page<Template>>(request)
        })
        .await
        .context("list_templates", data_source_id)
    }

    pub async fn get_template_by_type(&self, task_type: TaskType) -> Result<Option<Template>> {
        let templates = self.list_templates().await?;
        Ok(template_for_type(&templates, task_type).cloned())
    }

    // =========================================================================
    // Related items
    // =========================================================================

    /// Items of `task_type` assigned to `assignee`, plus the parents of the
    /// assignee's tasks that have that type.
    pub async fn related_of_type(&self, task_type: TaskType, assignee: Option<&str>) -> Result<Vec<Task>> {
        let mut filter = TaskFilter::of_type(task_type);
        filter.assignee = assignee.map(str::to_string);
        let mut items = self.list_tasks(&filter, None).await?;

        filter.task_type = Some(TaskType::Task);
        let mut parent_ids: Vec<String> = self
            .list_tasks(&filter, None)
            .await?
            .into_iter()
            .filter_map(|task| task.parent_id)
            .collect();
        parent_ids.sort();
        parent_ids.dedup();

        for parent_id in parent_ids {
            if items.iter().any(|item| item.id == parent_id) {
                continue;
            }
            match self.get_task(&parent_id).await {
                Ok(parent) if parent.task_type == Some(task_type) => items.push(parent),
                Ok(_) => {}
                Err(e) => warn!(%parent_id, error = %e, "skipping unreadable parent"),
            }
        }

        Ok(items)
    }
}

/// The template for a task type: an exact (case-insensitive) name match,
/// else the first template whose name contains the type name.
pub fn template_for_type(templates: &[Template], task_type: TaskType) -> Option<&Template> {
    let wanted = task_type.external_name().to_lowercase();
    templates
        .iter()
        .find(|t| t.name.trim().to_lowercase() == wanted)
        .or_else(|| {
            templates
                .iter()
                .find(|t| t.name.to_lowercase().contains(&wanted))
        })
}

/// Canonical hyphenated form of a Notion ID.
///
/// Accepts both the dashed and the 32-hex-digit form Notion shows in URLs.
pub fn normalize_id(field: &'static str, raw: &str) -> Result<String> {
    Uuid::parse_str(raw.trim())
        .map(|id| id.hyphenated().to_string())
        .map_err(|_| Error::validation(field, format!("{raw:?} is not a Notion ID")))
}

fn validate_patch(mut patch: UpdateTaskInput) -> Result<UpdateTaskInput> {
    if patch.is_empty() {
        return Err(Error::validation("changes", "no fields to update"));
    }
    if matches!(&patch.title, Some(title) if title.trim().is_empty()) {
        return Err(Error::validation("title", "must not be empty"));
    }
    if let Patch::Set(id) = &patch.assignee {
        patch.assignee = Patch::Set(normalize_id("assignee", id)?);
    }
    if let Patch::Set(id) = &patch.parent_id {
        patch.parent_id = Patch::Set(normalize_id("parent_id", id)?);
    }
    Ok(patch)
}

fn validate_filter(filter: &TaskFilter) -> Result<TaskFilter> {
    let mut filter = filter.clone();
    if let Some(id) = &filter.assignee {
        filter.assignee = Some(normalize_id("assignee", id)?);
    }
    if let Some(id) = &filter.parent_id {
        filter.parent_id = Some(normalize_id("parent_id", id)?);
    }
    Ok(filter)
}

fn api_error(status: u16, body: &str) -> Error {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) => Error::Api {
            status,
            code: err.code,
            message: err.message,
        },
        Err(_) => Error::Api {
            status,
            code: "http_error".into(),
            message: body.to_string(),
        },
    }
}
