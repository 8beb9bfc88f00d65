use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notion_task::{format, mcp, Config, NotionClient};
use notion_task_core::models::*;

#[derive(Parser)]
#[command(name = "notion-task")]
#[command(about = "Notion task database tools for AI agents")]
struct Cli {
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Config file (default: ~/.notion-task/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server via stdio (the default)
    Mcp,
    /// List tasks
    List(ListArgs),
    /// Show one task
    Get { task_id: String },
    /// Create a task
    Create(CreateArgs),
    /// Update a task
    Update(UpdateArgs),
    /// Mark a task as done
    Done { task_id: String },
    /// Archive a task
    Delete { task_id: String },
    /// Set the status of several tasks
    BatchStatus {
        #[arg(long, value_parser = parse_status)]
        status: TaskStatus,
        #[arg(required = true)]
        task_ids: Vec<String>,
    },
    /// Set the assignee of several tasks
    BatchAssignee {
        #[arg(long)]
        assignee: String,
        #[arg(required = true)]
        task_ids: Vec<String>,
    },
    /// Projects I own or that contain my tasks
    Projects {
        #[arg(long)]
        assignee: Option<String>,
    },
    /// Epics I own or that contain my tasks
    Epics {
        #[arg(long)]
        assignee: Option<String>,
    },
    /// List database templates
    Templates {
        /// Only the template for this type
        #[arg(long = "type", value_parser = parse_task_type)]
        task_type: Option<TaskType>,
    },
}

#[derive(Args)]
struct ListArgs {
    #[arg(long = "type", value_parser = parse_task_type)]
    task_type: Option<TaskType>,
    #[arg(long, value_parser = parse_status)]
    status: Option<TaskStatus>,
    /// todo, in_progress or done
    #[arg(long, value_parser = parse_status_group)]
    status_group: Option<StatusGroup>,
    #[arg(long, value_parser = parse_priority)]
    priority: Option<Priority>,
    #[arg(long)]
    assignee: Option<String>,
    /// Comma separated; matches any
    #[arg(long, value_delimiter = ',')]
    labels: Vec<String>,
    /// Comma separated; matches any
    #[arg(long, value_delimiter = ',')]
    services: Vec<String>,
    #[arg(long)]
    parent: Option<String>,
    /// true: only items with a parent, false: only top-level items
    #[arg(long, action = clap::ArgAction::Set)]
    has_parent: Option<bool>,
    #[arg(long)]
    start_from: Option<NaiveDate>,
    #[arg(long)]
    start_to: Option<NaiveDate>,
    #[arg(long)]
    end_from: Option<NaiveDate>,
    #[arg(long)]
    end_to: Option<NaiveDate>,
    #[arg(long)]
    page_size: Option<u32>,
}

#[derive(Args)]
struct CreateArgs {
    #[arg(long)]
    title: String,
    #[arg(long = "type", value_parser = parse_task_type)]
    task_type: Option<TaskType>,
    #[arg(long, value_parser = parse_priority)]
    priority: Option<Priority>,
    /// Notion user ID; defaults to the configured user when auto_assign is on
    #[arg(long)]
    assignee: Option<String>,
    #[arg(long, value_delimiter = ',')]
    labels: Vec<String>,
    #[arg(long, value_delimiter = ',')]
    services: Vec<String>,
    #[arg(long)]
    parent: Option<String>,
    #[arg(long)]
    start_date: Option<NaiveDate>,
    #[arg(long)]
    end_date: Option<NaiveDate>,
    /// Template page ID to apply
    #[arg(long, conflicts_with = "type_template")]
    template: Option<String>,
    /// Apply the template named after the task type
    #[arg(long)]
    type_template: bool,
}

#[derive(Args)]
struct UpdateArgs {
    task_id: String,
    #[arg(long)]
    title: Option<String>,
    #[arg(long = "type", value_parser = parse_task_type)]
    task_type: Option<TaskType>,
    #[arg(long, value_parser = parse_status)]
    status: Option<TaskStatus>,
    #[arg(long, value_parser = parse_priority)]
    priority: Option<Priority>,
    #[arg(long, conflicts_with = "priority")]
    clear_priority: bool,
    #[arg(long)]
    assignee: Option<String>,
    #[arg(long, conflicts_with = "assignee")]
    clear_assignee: bool,
    #[arg(long)]
    start_date: Option<NaiveDate>,
    #[arg(long, conflicts_with = "start_date")]
    clear_start_date: bool,
    #[arg(long)]
    end_date: Option<NaiveDate>,
    #[arg(long, conflicts_with = "end_date")]
    clear_end_date: bool,
    /// Replaces all labels (comma separated)
    #[arg(long, value_delimiter = ',')]
    labels: Option<Vec<String>>,
    #[arg(long, conflicts_with = "labels")]
    clear_labels: bool,
    /// Replaces all services (comma separated)
    #[arg(long, value_delimiter = ',')]
    services: Option<Vec<String>>,
    #[arg(long, conflicts_with = "services")]
    clear_services: bool,
    #[arg(long)]
    parent: Option<String>,
    #[arg(long, conflicts_with = "parent")]
    clear_parent: bool,
}

fn parse_task_type(s: &str) -> Result<TaskType, String> {
    TaskType::from_str(s).ok_or_else(|| format!("unknown type {s:?} (task, epic, issue, project)"))
}

fn parse_status(s: &str) -> Result<TaskStatus, String> {
    TaskStatus::from_str(s).ok_or_else(|| {
        format!("unknown status {s:?} (on_hold, not_started, in_progress, done, deployed, archived)")
    })
}

fn parse_status_group(s: &str) -> Result<StatusGroup, String> {
    StatusGroup::from_str(s).ok_or_else(|| format!("unknown status group {s:?} (todo, in_progress, done)"))
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::from_str(s).ok_or_else(|| format!("unknown priority {s:?} (low, medium, high)"))
}

impl UpdateArgs {
    fn changes(self) -> UpdateTaskInput {
        UpdateTaskInput {
            title: self.title,
            task_type: self.task_type,
            status: self.status,
            priority: Patch::from_flags(self.priority, self.clear_priority),
            assignee: Patch::from_flags(self.assignee, self.clear_assignee),
            start_date: Patch::from_flags(self.start_date, self.clear_start_date),
            end_date: Patch::from_flags(self.end_date, self.clear_end_date),
            labels: Patch::from_flags(self.labels, self.clear_labels),
            services: Patch::from_flags(self.services, self.clear_services),
            parent_id: Patch::from_flags(self.parent, self.clear_parent),
        }
    }
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce(&T) -> String) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text(value));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the MCP protocol, so logs go to stderr.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "notion_task=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let client = NotionClient::new(&config)?;
    let json = cli.json;

    match cli.command.unwrap_or(Commands::Mcp) {
        Commands::Mcp => {
            mcp::run_stdio_server(client).await?;
        }
        Commands::List(args) => {
            let filter = TaskFilter {
                task_type: args.task_type,
                status: args.status,
                status_group: args.status_group,
                priority: args.priority,
                assignee: args.assignee,
                labels: args.labels,
                services: args.services,
                start_date_from: args.start_from,
                start_date_to: args.start_to,
                end_date_from: args.end_from,
                end_date_to: args.end_to,
                parent_id: args.parent,
                has_parent: args.has_parent,
            };
            let page_size = args.page_size.or(config.defaults.page_size);
            let tasks = client.list_tasks(&filter, page_size).await?;
            emit(json, &tasks, |t| format::format_task_table(t))?;
        }
        Commands::Get { task_id } => {
            let task = client.get_task(&task_id).await?;
            emit(json, &task, |t| format::format_task(t, true))?;
        }
        Commands::Create(args) => {
            let assignee = args.assignee.or_else(|| {
                config
                    .defaults
                    .auto_assign
                    .then(|| config.user.notion_id.clone())
                    .flatten()
            });
            let input = CreateTaskInput {
                task_type: args
                    .task_type
                    .or(config.defaults.task_type)
                    .unwrap_or(TaskType::Task),
                priority: args.priority.or(config.defaults.priority),
                assignee,
                start_date: args.start_date,
                end_date: args.end_date,
                labels: args.labels,
                services: args.services,
                parent_id: args.parent,
                template_id: args.template,
                ..CreateTaskInput::new(args.title)
            };
            let task = if args.type_template {
                client.create_task_from_type_template(input).await?
            } else {
                client.create_task(input).await?
            };
            emit(json, &task, |t| format!("Created: {}", format::format_task(t, false)))?;
        }
        Commands::Update(args) => {
            let task_id = args.task_id.clone();
            let task = client.update_task(&task_id, &args.changes()).await?;
            emit(json, &task, |t| format!("Updated: {}", format::format_task(t, false)))?;
        }
        Commands::Done { task_id } => {
            let task = client.complete_task(&task_id).await?;
            emit(json, &task, |t| format!("Done: {}", format::format_task(t, false)))?;
        }
        Commands::Delete { task_id } => {
            client.delete_task(&task_id).await?;
            emit(json, &serde_json::json!({ "success": true, "task_id": task_id }), |_| {
                format!("Archived {task_id}")
            })?;
        }
        Commands::BatchStatus { status, task_ids } => {
            let outcome = client.batch_update_status(&task_ids, status).await?;
            emit(json, &outcome, format::format_batch)?;
        }
        Commands::BatchAssignee { assignee, task_ids } => {
            let outcome = client.batch_update_assignee(&task_ids, &assignee).await?;
            emit(json, &outcome, format::format_batch)?;
        }
        Commands::Projects { assignee } => {
            let assignee = assignee.or_else(|| config.user.notion_id.clone());
            let projects = client
                .related_of_type(TaskType::Project, assignee.as_deref())
                .await?;
            emit(json, &projects, |p| format::format_task_table(p))?;
        }
        Commands::Epics { assignee } => {
            let assignee = assignee.or_else(|| config.user.notion_id.clone());
            let epics = client
                .related_of_type(TaskType::Epic, assignee.as_deref())
                .await?;
            emit(json, &epics, |e| format::format_task_table(e))?;
        }
        Commands::Templates { task_type: Some(task_type) } => {
            let template = client.get_template_by_type(task_type).await?;
            emit(json, &template, |t| match t {
                Some(t) => format::format_templates(std::slice::from_ref(t)),
                None => format!("No template for {}", task_type.as_str()),
            })?;
        }
        Commands::Templates { task_type: None } => {
            let templates = client.list_templates().await?;
            emit(json, &templates, |t| format::format_templates(t))?;
        }
    }

    Ok(())
}
