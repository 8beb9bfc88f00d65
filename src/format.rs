//! Plain-text rendering for the CLI.

use notion_task_core::models::{Priority, StatusGroup, Task, TaskStatus, Template};

use crate::client::BatchOutcome;

fn status_marker(status: Option<TaskStatus>) -> &'static str {
    match status {
        Some(TaskStatus::OnHold) => "[hold]",
        Some(TaskStatus::NotStarted) => "[ ]",
        Some(TaskStatus::InProgress) => "[~]",
        Some(TaskStatus::Done) => "[x]",
        Some(TaskStatus::Deployed) => "[^]",
        Some(TaskStatus::Archived) => "[-]",
        None => "[?]",
    }
}

fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "!!!",
        Priority::Medium => "!!",
        Priority::Low => "!",
    }
}

/// One line per task; `verbose` adds labels, services, dates and URL.
pub fn format_task(task: &Task, verbose: bool) -> String {
    let key = task
        .no
        .clone()
        .unwrap_or_else(|| task.id.chars().take(8).collect());
    let mut line = format!("{} [{}] {}", status_marker(task.status), key, task.title);

    if let Some(priority) = task.priority {
        line.push(' ');
        line.push_str(priority_marker(priority));
    }
    if let Some(name) = task.assignee_name.as_ref().or(task.assignee.as_ref()) {
        line.push_str(&format!(" (@{name})"));
    }

    if verbose {
        if let Some(task_type) = task.task_type {
            line.push_str(&format!("\n   type: {}", task_type.as_str()));
        }
        if let Some(status) = task.status {
            let group = task.status_group.as_ref().map(StatusGroup::as_str).unwrap_or("-");
            line.push_str(&format!("\n   status: {} ({group})", status.as_str()));
        }
        if task.start_date.is_some() || task.end_date.is_some() {
            let show = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
            line.push_str(&format!(
                "\n   dates: {} ~ {}",
                show(task.start_date),
                show(task.end_date)
            ));
        }
        if let Some(progress) = task.progress {
            line.push_str(&format!("\n   progress: {:.0}%", progress * 100.0));
        }
        if !task.labels.is_empty() {
            line.push_str(&format!("\n   labels: {}", task.labels.join(", ")));
        }
        if !task.services.is_empty() {
            line.push_str(&format!("\n   services: {}", task.services.join(", ")));
        }
        if let Some(url) = &task.url {
            line.push_str(&format!("\n   url: {url}"));
        }
    }

    line
}

pub fn format_task_table(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks found.".to_string();
    }

    let mut lines = vec![format!("{} task(s)", tasks.len()), "-".repeat(60)];
    lines.extend(tasks.iter().map(|task| format_task(task, false)));
    lines.join("\n")
}

pub fn format_batch(outcome: &BatchOutcome) -> String {
    let mut lines = vec![format!(
        "updated {}, failed {}",
        outcome.updated.len(),
        outcome.failed.len()
    )];
    lines.extend(outcome.updated.iter().map(|task| format_task(task, false)));
    lines.extend(
        outcome
            .failed
            .iter()
            .map(|failure| format!("failed {}: {}", failure.id, failure.error)),
    );
    lines.join("\n")
}

pub fn format_templates(templates: &[Template]) -> String {
    if templates.is_empty() {
        return "No templates defined.".to_string();
    }
    templates
        .iter()
        .map(|t| {
            let default = if t.is_default { " (default)" } else { "" };
            format!("{} {}{default}", t.id, t.name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_task_uses_number_and_assignee_name() {
        let mut task = Task {
            id: "1c2d3e4f-5a6b-7c8d-9e0f-112233445566".into(),
            no: Some("TASK-7".into()),
            title: "Write docs".into(),
            priority: Some(Priority::High),
            assignee: Some("user-id".into()),
            assignee_name: Some("Kim".into()),
            ..Default::default()
        };
        task.set_status(Some(TaskStatus::InProgress));

        assert_eq!(format_task(&task, false), "[~] [TASK-7] Write docs !!! (@Kim)");
    }

    #[test]
    fn format_task_falls_back_to_short_id() {
        let task = Task {
            id: "1c2d3e4f-5a6b-7c8d-9e0f-112233445566".into(),
            title: "Untitled".into(),
            ..Default::default()
        };
        assert_eq!(format_task(&task, false), "[?] [1c2d3e4f] Untitled");
    }

    #[test]
    fn empty_table_says_so() {
        assert_eq!(format_task_table(&[]), "No tasks found.");
    }
}
