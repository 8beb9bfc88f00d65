use speculate2::speculate;

speculate! {
    use notion_task_core::models::*;
    use serde_json::json;

    describe "status groups" {
        it "assigns every status to exactly one group" {
            for status in TaskStatus::ALL {
                let owners: Vec<StatusGroup> = StatusGroup::ALL
                    .into_iter()
                    .filter(|g| g.statuses().contains(&status))
                    .collect();
                assert_eq!(owners, vec![status.group()]);
                assert_eq!(StatusGroup::of(status), StatusGroup::of(status));
            }
        }

        it "groups the workflow into todo, in progress and done" {
            assert_eq!(
                StatusGroup::Todo.statuses(),
                vec![TaskStatus::OnHold, TaskStatus::NotStarted]
            );
            assert_eq!(StatusGroup::InProgress.statuses(), vec![TaskStatus::InProgress]);
            assert_eq!(
                StatusGroup::Done.statuses(),
                vec![TaskStatus::Done, TaskStatus::Deployed, TaskStatus::Archived]
            );
        }

        it "keeps status_group in step when the status changes" {
            let mut task = Task::default();
            task.set_status(Some(TaskStatus::Deployed));
            assert_eq!(task.status_group, Some(StatusGroup::Done));
            task.set_status(None);
            assert_eq!(task.status_group, None);
        }
    }

    describe "enum parsing" {
        it "accepts snake_case and Notion option names" {
            assert_eq!(TaskStatus::from_str("in_progress"), Some(TaskStatus::InProgress));
            assert_eq!(TaskStatus::from_str("진행 중"), Some(TaskStatus::InProgress));
            assert_eq!(TaskStatus::from_str("진행중"), Some(TaskStatus::InProgress));
            assert_eq!(TaskStatus::from_str("시작전"), Some(TaskStatus::NotStarted));
            assert_eq!(Priority::from_str("높음"), Some(Priority::High));
            assert_eq!(TaskType::from_str("Epic"), Some(TaskType::Epic));
            assert_eq!(StatusGroup::from_str("할일"), Some(StatusGroup::Todo));
        }

        it "accepts English display names in any case and spacing" {
            assert_eq!(TaskStatus::from_str("In Progress"), Some(TaskStatus::InProgress));
            assert_eq!(TaskStatus::from_str("not-started"), Some(TaskStatus::NotStarted));
            assert_eq!(TaskStatus::from_str("ON HOLD"), Some(TaskStatus::OnHold));
            assert_eq!(StatusGroup::from_str("In Progress"), Some(StatusGroup::InProgress));
            assert_eq!(StatusGroup::from_str("To Do"), Some(StatusGroup::Todo));
            assert_eq!(Priority::from_str(" High "), Some(Priority::High));
            assert_eq!(TaskType::from_str("PROJECT"), Some(TaskType::Project));
        }

        it "returns None for unknown values" {
            assert_eq!(TaskStatus::from_str("blocked"), None);
            assert_eq!(Priority::from_str("urgent"), None);
            assert_eq!(TaskType::from_str("Story"), None);
        }

        it "round-trips external names" {
            for status in TaskStatus::ALL {
                assert_eq!(TaskStatus::from_str(status.external_name()), Some(status));
            }
            for priority in Priority::ALL {
                assert_eq!(Priority::from_str(priority.external_name()), Some(priority));
            }
            for task_type in TaskType::ALL {
                assert_eq!(TaskType::from_str(task_type.external_name()), Some(task_type));
            }
        }
    }

    describe "update patches" {
        it "tells a missing field from an explicit null" {
            let patch: UpdateTaskInput = serde_json::from_value(json!({
                "assignee": null,
                "start_date": "2024-04-01"
            }))
            .unwrap();

            assert_eq!(patch.assignee, Patch::Clear);
            assert_eq!(patch.priority, Patch::Absent);
            assert_eq!(
                patch.start_date,
                Patch::Set(chrono::NaiveDate::from_ymd_opt(2024, 4, 1).unwrap())
            );
        }

        it "serializes absent fields away and clears as null" {
            let patch = UpdateTaskInput {
                parent_id: Patch::Clear,
                ..Default::default()
            };
            assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "parent_id": null }));
            assert!(UpdateTaskInput::default().is_empty());
        }

        it "reads null labels as a clear and a missing key as no change" {
            let cleared: UpdateTaskInput =
                serde_json::from_value(json!({ "labels": null, "services": [] })).unwrap();
            let untouched: UpdateTaskInput = serde_json::from_value(json!({})).unwrap();

            assert_eq!(cleared.labels, Patch::Clear);
            assert_eq!(cleared.services, Patch::Set(vec![]));
            assert_eq!(untouched.labels, Patch::Absent);
            assert_ne!(cleared, untouched);
        }

        it "builds a patch from a value and a clear flag" {
            assert_eq!(Patch::from_flags(Some(3), false), Patch::Set(3));
            assert_eq!(Patch::from_flags(None::<u8>, true), Patch::Clear);
            assert_eq!(Patch::from_flags(None::<u8>, false), Patch::Absent);
        }

        it "carries every create field over, never as a clear" {
            let mut input = CreateTaskInput::new("Ship it");
            input.priority = Some(Priority::Low);
            let patch = UpdateTaskInput::from(input);

            assert_eq!(patch.title.as_deref(), Some("Ship it"));
            assert_eq!(patch.task_type, Some(TaskType::Task));
            assert_eq!(patch.status, Some(TaskStatus::NotStarted));
            assert_eq!(patch.priority, Patch::Set(Priority::Low));
            assert_eq!(patch.assignee, Patch::Absent);
            assert_eq!(patch.labels, Patch::Absent);
        }
    }
}
