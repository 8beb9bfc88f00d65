use std::sync::Arc;

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    schemars::JsonSchema,
    ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use notion_task_core::models::*;

use crate::client::NotionClient;
use crate::error::Error;

#[derive(Clone)]
pub struct McpServer {
    client: Arc<NotionClient>,
    tool_router: ToolRouter<Self>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TaskIdRequest {
    #[schemars(description = "Notion page ID of the task")]
    pub task_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListTasksRequest {
    #[serde(flatten)]
    pub filter: TaskFilter,
    #[schemars(description = "Results per request (1-100); all pages are always fetched")]
    #[serde(default)]
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateTaskRequest {
    #[serde(flatten)]
    pub task: CreateTaskInput,
    #[schemars(description = "Apply the database template named after the task type when template_id is not given")]
    #[serde(default)]
    pub use_type_template: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateTaskRequest {
    #[schemars(description = "Notion page ID of the task")]
    pub task_id: String,
    #[serde(flatten)]
    pub changes: UpdateTaskInput,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BatchUpdateStatusRequest {
    #[schemars(description = "Notion page IDs to update, applied in order")]
    pub task_ids: Vec<String>,
    pub status: TaskStatus,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BatchUpdateAssigneeRequest {
    #[schemars(description = "Notion page IDs to update, applied in order")]
    pub task_ids: Vec<String>,
    #[schemars(description = "Notion user ID of the new assignee")]
    pub assignee: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TemplateByTypeRequest {
    pub task_type: TaskType,
}

#[derive(Debug, Serialize)]
pub struct TaskList {
    pub count: usize,
    pub tasks: Vec<Task>,
}

impl McpServer {
    pub fn new(client: NotionClient) -> Self {
        Self {
            client: Arc::new(client),
            tool_router: Self::tool_router(),
        }
    }

    fn json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

/// Validation problems are the caller's to fix; everything else is reported
/// as an internal error, with Notion's status and code attached when known.
pub fn to_mcp_error(err: Error) -> McpError {
    let message = err.to_string();
    match err.root() {
        Error::Validation { .. } => McpError::invalid_params(message, None),
        Error::Api { status, code, .. } => McpError::internal_error(
            message,
            Some(json!({ "status": status, "code": code })),
        ),
        _ => McpError::internal_error(message, None),
    }
}

#[tool_router]
impl McpServer {
    #[tool(description = "Get a single task by its Notion page ID")]
    async fn get_task(
        &self,
        params: Parameters<TaskIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        let task = self.client.get_task(&params.0.task_id).await.map_err(to_mcp_error)?;
        Self::json(&task)
    }

    #[tool(description = "List tasks matching optional filters. Labels and services match any of the given values; all other filters must all match")]
    async fn list_tasks(
        &self,
        params: Parameters<ListTasksRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let tasks = self
            .client
            .list_tasks(&req.filter, req.page_size)
            .await
            .map_err(to_mcp_error)?;
        Self::json(&TaskList {
            count: tasks.len(),
            tasks,
        })
    }

    #[tool(description = "Create a task, epic, issue or project")]
    async fn create_task(
        &self,
        params: Parameters<CreateTaskRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let task = if req.use_type_template {
            self.client.create_task_from_type_template(req.task).await
        } else {
            self.client.create_task(req.task).await
        }
        .map_err(to_mcp_error)?;
        Self::json(&task)
    }

    #[tool(description = "Update fields of a task. Omitted fields are left as they are; null clears priority, assignee, dates, labels, services or parent. At least one field is required")]
    async fn update_task(
        &self,
        params: Parameters<UpdateTaskRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let task = self
            .client
            .update_task(&req.task_id, &req.changes)
            .await
            .map_err(to_mcp_error)?;
        Self::json(&task)
    }

    #[tool(description = "Delete a task (archives the page)")]
    async fn delete_task(
        &self,
        params: Parameters<TaskIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        let task_id = params.0.task_id;
        self.client.delete_task(&task_id).await.map_err(to_mcp_error)?;
        Self::json(&json!({ "success": true, "task_id": task_id }))
    }

    #[tool(description = "Set the status of several tasks. Items are updated one by one; failures are reported per item and do not stop the batch")]
    async fn batch_update_status(
        &self,
        params: Parameters<BatchUpdateStatusRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let outcome = self
            .client
            .batch_update_status(&req.task_ids, req.status)
            .await
            .map_err(to_mcp_error)?;
        Self::json(&outcome)
    }

    #[tool(description = "Set the assignee of several tasks. Items are updated one by one; failures are reported per item and do not stop the batch")]
    async fn batch_update_assignee(
        &self,
        params: Parameters<BatchUpdateAssigneeRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let outcome = self
            .client
            .batch_update_assignee(&req.task_ids, &req.assignee)
            .await
            .map_err(to_mcp_error)?;
        Self::json(&outcome)
    }

    #[tool(description = "List the page templates defined on the task database")]
    async fn list_templates(&self) -> Result<CallToolResult, McpError> {
        let templates = self.client.list_templates().await.map_err(to_mcp_error)?;
        Self::json(&templates)
    }

    #[tool(description = "Find the page template for a task type (task, epic, issue, project)")]
    async fn get_template_by_type(
        &self,
        params: Parameters<TemplateByTypeRequest>,
    ) -> Result<CallToolResult, McpError> {
        let template = self
            .client
            .get_template_by_type(params.0.task_type)
            .await
            .map_err(to_mcp_error)?;
        Self::json(&template)
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("Notion task database tools: read, filter, create and update tasks, epics, issues and projects".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_stdio_server(client: NotionClient) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server via stdio");

    let service = McpServer::new(client);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}
