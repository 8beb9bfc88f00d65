use speculate2::speculate;

speculate! {
    use notion_task::{Config, Error, NotionClient};
    use notion_task_core::models::*;
    use serde_json::{json, Value};
    use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DATABASE_ID: &str = "0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0";
    const TASK_A: &str = "11111111-1111-1111-1111-111111111111";
    const TASK_B: &str = "22222222-2222-2222-2222-222222222222";
    const TASK_C: &str = "33333333-3333-3333-3333-333333333333";
    const TEMPLATE_ID: &str = "44444444-4444-4444-4444-444444444444";

    fn client_for(server: &MockServer, data_source_id: Option<&str>) -> NotionClient {
        let mut config = Config::new("secret", DATABASE_ID);
        config.api_url = server.uri();
        config.data_source_id = data_source_id.map(str::to_string);
        NotionClient::new(&config).unwrap()
    }

    fn task_page(id: &str, title: &str, status: &str) -> Value {
        json!({
            "object": "page",
            "id": id,
            "properties": {
                "제목": { "type": "title", "title": [{ "plain_text": title }] },
                "상태": { "type": "status", "status": { "name": status } }
            }
        })
    }

    fn not_found() -> ResponseTemplate {
        ResponseTemplate::new(404).set_body_json(json!({
            "object": "error",
            "status": 404,
            "code": "object_not_found",
            "message": "Could not find page"
        }))
    }

    async fn mount_database(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/databases/{DATABASE_ID}")))
            .and(header("authorization", "Bearer secret"))
            .and(header("notion-version", "2025-09-03"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "database",
                "id": DATABASE_ID,
                "data_sources": [{ "id": "ds-1", "name": "Tasks" }]
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    describe "listing" {
        it "collects every page of a status group query" {
            tokio_test::block_on(async {
                let server = MockServer::start().await;
                mount_database(&server).await;

                Mock::given(method("POST"))
                    .and(path("/v1/data_sources/ds-1/query"))
                    .and(body_partial_json(json!({ "start_cursor": "c1" })))
                    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                        "results": [task_page(TASK_C, "Three", "보관")],
                        "has_more": false,
                        "next_cursor": null
                    })))
                    .with_priority(1)
                    .expect(1)
                    .mount(&server)
                    .await;

                Mock::given(method("POST"))
                    .and(path("/v1/data_sources/ds-1/query"))
                    .and(body_partial_json(json!({
                        "page_size": 2,
                        "filter": { "or": [
                            { "property": "상태", "status": { "equals": "완료" } },
                            { "property": "상태", "status": { "equals": "배포됨" } },
                            { "property": "상태", "status": { "equals": "보관" } }
                        ]}
                    })))
                    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                        "results": [
                            task_page(TASK_A, "One", "완료"),
                            task_page(TASK_B, "Two", "배포됨")
                        ],
                        "has_more": true,
                        "next_cursor": "c1"
                    })))
                    .expect(1)
                    .mount(&server)
                    .await;

                let client = client_for(&server, None);
                let filter = TaskFilter {
                    status_group: Some(StatusGroup::Done),
                    ..Default::default()
                };
                let tasks = client.list_tasks(&filter, Some(2)).await.unwrap();

                let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
                assert_eq!(titles, vec!["One", "Two", "Three"]);
                assert!(tasks.iter().all(|t| t.status_group == Some(StatusGroup::Done)));

                // Second lookup is served from the cache.
                assert_eq!(client.data_source_id().await.unwrap(), "ds-1");
            });
        }

        it "skips the database lookup when the data source is configured" {
            tokio_test::block_on(async {
                let server = MockServer::start().await;
                Mock::given(method("POST"))
                    .and(path("/v1/data_sources/ds-9/query"))
                    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                        "results": [],
                        "has_more": false
                    })))
                    .expect(1)
                    .mount(&server)
                    .await;

                let client = client_for(&server, Some("ds-9"));
                let tasks = client.list_tasks(&TaskFilter::default(), None).await.unwrap();
                assert!(tasks.is_empty());

                let requests = server.received_requests().await.unwrap();
                assert!(requests.iter().all(|r| !r.url.path().starts_with("/v1/databases")));
            });
        }

        it "rejects a malformed assignee before any request" {
            tokio_test::block_on(async {
                let server = MockServer::start().await;
                let client = client_for(&server, None);
                let filter = TaskFilter {
                    assignee: Some("me".into()),
                    ..Default::default()
                };

                let err = client.list_tasks(&filter, None).await.unwrap_err();
                assert!(err.is_validation());
                assert!(server.received_requests().await.unwrap().is_empty());
            });
        }
    }

    describe "single tasks" {
        it "rejects a malformed id without calling the API" {
            tokio_test::block_on(async {
                let server = MockServer::start().await;
                let client = client_for(&server, None);

                let err = client.get_task("not-a-page").await.unwrap_err();
                assert!(matches!(err, Error::Validation { field: "task_id", .. }));
                assert!(server.received_requests().await.unwrap().is_empty());
            });
        }

        it "surfaces API errors with status, code and the failing id" {
            tokio_test::block_on(async {
                let server = MockServer::start().await;
                Mock::given(method("GET"))
                    .and(path(format!("/v1/pages/{TASK_A}")))
                    .respond_with(not_found())
                    .mount(&server)
                    .await;

                let client = client_for(&server, None);
                let err = client.get_task(TASK_A).await.unwrap_err();

                assert!(matches!(
                    err.root(),
                    Error::Api { status: 404, code, .. } if code == "object_not_found"
                ));
                let message = err.to_string();
                assert!(message.contains("get_task"));
                assert!(message.contains(TASK_A));
            });
        }

        it "keeps the raw body when the error is not JSON" {
            tokio_test::block_on(async {
                let server = MockServer::start().await;
                Mock::given(method("GET"))
                    .and(path(format!("/v1/pages/{TASK_A}")))
                    .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
                    .mount(&server)
                    .await;

                let client = client_for(&server, None);
                let err = client.get_task(TASK_A).await.unwrap_err();
                assert!(matches!(
                    err.root(),
                    Error::Api { status: 502, message, .. } if message == "Bad Gateway"
                ));
            });
        }

        it "accepts the compact id form" {
            tokio_test::block_on(async {
                let server = MockServer::start().await;
                Mock::given(method("GET"))
                    .and(path(format!("/v1/pages/{TASK_A}")))
                    .respond_with(
                        ResponseTemplate::new(200).set_body_json(task_page(TASK_A, "One", "진행 중")),
                    )
                    .expect(1)
                    .mount(&server)
                    .await;

                let client = client_for(&server, None);
                let task = client.get_task(&TASK_A.replace('-', "")).await.unwrap();
                assert_eq!(task.status, Some(TaskStatus::InProgress));
            });
        }

        it "sends explicit clears on update" {
            tokio_test::block_on(async {
                let server = MockServer::start().await;
                Mock::given(method("PATCH"))
                    .and(path(format!("/v1/pages/{TASK_A}")))
                    .and(body_json(json!({
                        "properties": {
                            "담당자": { "people": [] },
                            "상위 항목": { "relation": [] }
                        }
                    })))
                    .respond_with(
                        ResponseTemplate::new(200).set_body_json(task_page(TASK_A, "One", "시작 전")),
                    )
                    .expect(1)
                    .mount(&server)
                    .await;

                let client = client_for(&server, None);
                let changes = UpdateTaskInput {
                    assignee: Patch::Clear,
                    parent_id: Patch::Clear,
                    ..Default::default()
                };
                let task = client.update_task(TASK_A, &changes).await.unwrap();
                assert_eq!(task.assignee, None);
            });
        }

        it "refuses an update with no changes" {
            tokio_test::block_on(async {
                let server = MockServer::start().await;
                let client = client_for(&server, None);

                let err = client
                    .update_task(TASK_A, &UpdateTaskInput::default())
                    .await
                    .unwrap_err();
                assert!(matches!(err, Error::Validation { field: "changes", .. }));
                assert!(server.received_requests().await.unwrap().is_empty());
            });
        }

        it "archives on delete" {
            tokio_test::block_on(async {
                let server = MockServer::start().await;
                Mock::given(method("PATCH"))
                    .and(path(format!("/v1/pages/{TASK_A}")))
                    .and(body_json(json!({ "archived": true })))
                    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                        "object": "page",
                        "id": TASK_A,
                        "archived": true
                    })))
                    .expect(1)
                    .mount(&server)
                    .await;

                let client = client_for(&server, None);
                client.delete_task(TASK_A).await.unwrap();
            });
        }

        it "creates under the data source with the type template" {
            tokio_test::block_on(async {
                let server = MockServer::start().await;
                mount_database(&server).await;

                Mock::given(method("GET"))
                    .and(path("/v1/data_sources/ds-1/templates"))
                    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                        "templates": [
                            { "id": "55555555-5555-5555-5555-555555555555", "name": "Task" },
                            { "id": TEMPLATE_ID, "name": "Epic", "is_default": false }
                        ],
                        "has_more": false,
                        "next_cursor": null
                    })))
                    .expect(1)
                    .mount(&server)
                    .await;

                Mock::given(method("POST"))
                    .and(path("/v1/pages"))
                    .and(body_partial_json(json!({
                        "parent": { "type": "data_source_id", "data_source_id": "ds-1" },
                        "template": { "type": "template_id", "template_id": TEMPLATE_ID },
                        "properties": {
                            "제목": { "title": [{ "type": "text", "text": { "content": "Launch" } }] },
                            "타입": { "select": { "name": "Epic" } },
                            "상태": { "status": { "name": "시작 전" } }
                        }
                    })))
                    .respond_with(
                        ResponseTemplate::new(200).set_body_json(task_page(TASK_B, "Launch", "시작 전")),
                    )
                    .expect(1)
                    .mount(&server)
                    .await;

                let client = client_for(&server, None);
                let mut input = CreateTaskInput::new("Launch");
                input.task_type = TaskType::Epic;
                let task = client.create_task_from_type_template(input).await.unwrap();

                assert_eq!(task.id, TASK_B);
                assert_eq!(task.status, Some(TaskStatus::NotStarted));
            });
        }

        it "rejects a blank title" {
            tokio_test::block_on(async {
                let server = MockServer::start().await;
                let client = client_for(&server, None);

                let err = client.create_task(CreateTaskInput::new("   ")).await.unwrap_err();
                assert!(matches!(err, Error::Validation { field: "title", .. }));
                assert!(server.received_requests().await.unwrap().is_empty());
            });
        }
    }

    describe "batch updates" {
        it "keeps going after a failed item and reports it" {
            tokio_test::block_on(async {
                let server = MockServer::start().await;
                for id in [TASK_A, TASK_C] {
                    Mock::given(method("PATCH"))
                        .and(path(format!("/v1/pages/{id}")))
                        .and(body_json(json!({ "properties": { "상태": { "status": { "name": "완료" } } } })))
                        .respond_with(ResponseTemplate::new(200).set_body_json(task_page(id, "t", "완료")))
                        .expect(1)
                        .mount(&server)
                        .await;
                }
                Mock::given(method("PATCH"))
                    .and(path(format!("/v1/pages/{TASK_B}")))
                    .respond_with(not_found())
                    .expect(1)
                    .mount(&server)
                    .await;

                let client = client_for(&server, None);
                let ids = vec![TASK_A.to_string(), TASK_B.to_string(), TASK_C.to_string()];
                let outcome = client.batch_update_status(&ids, TaskStatus::Done).await.unwrap();

                let updated: Vec<&str> = outcome.updated.iter().map(|t| t.id.as_str()).collect();
                assert_eq!(updated, vec![TASK_A, TASK_C]);
                assert_eq!(outcome.failed.len(), 1);
                assert_eq!(outcome.failed[0].id, TASK_B);
                assert!(outcome.failed[0].error.contains("object_not_found"));
            });
        }

        it "rejects the whole batch when any id is malformed" {
            tokio_test::block_on(async {
                let server = MockServer::start().await;
                let client = client_for(&server, None);
                let ids = vec![TASK_A.to_string(), "bogus".to_string()];

                let err = client.batch_update_assignee(&ids, TASK_C).await.unwrap_err();
                assert!(err.is_validation());
                assert!(server.received_requests().await.unwrap().is_empty());
            });
        }
    }

    describe "related items" {
        it "adds parents of the assignee's tasks once" {
            tokio_test::block_on(async {
                let server = MockServer::start().await;
                let parent = "66666666-6666-6666-6666-666666666666";
                let typed = |id: &str, task_type: &str, parent_id: Option<&str>| {
                    json!({
                        "id": id,
                        "properties": {
                            "타입": { "select": { "name": task_type } },
                            "상위 항목": { "relation": parent_id.map(|p| vec![json!({ "id": p })]).unwrap_or_default() }
                        }
                    })
                };
                let by_type = |name: &str| json!({
                    "filter": { "and": [
                        { "property": "타입", "select": { "equals": name } },
                        { "property": "담당자", "people": { "contains": TASK_C } }
                    ]}
                });

                Mock::given(method("POST"))
                    .and(path("/v1/data_sources/ds-1/query"))
                    .and(body_partial_json(by_type("Epic")))
                    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                        "results": [typed(TASK_A, "Epic", None)],
                        "has_more": false
                    })))
                    .expect(1)
                    .mount(&server)
                    .await;
                Mock::given(method("POST"))
                    .and(path("/v1/data_sources/ds-1/query"))
                    .and(body_partial_json(by_type("Task")))
                    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                        "results": [
                            typed(TASK_B, "Task", Some(TASK_A)),
                            typed("77777777-7777-7777-7777-777777777777", "Task", Some(parent)),
                            typed("88888888-8888-8888-8888-888888888888", "Task", Some(parent))
                        ],
                        "has_more": false
                    })))
                    .expect(1)
                    .mount(&server)
                    .await;
                Mock::given(method("GET"))
                    .and(path(format!("/v1/pages/{parent}")))
                    .respond_with(ResponseTemplate::new(200).set_body_json(typed(parent, "Epic", None)))
                    .expect(1)
                    .mount(&server)
                    .await;

                let client = client_for(&server, Some("ds-1"));
                let epics = client.related_of_type(TaskType::Epic, Some(TASK_C)).await.unwrap();

                let ids: Vec<&str> = epics.iter().map(|t| t.id.as_str()).collect();
                assert_eq!(ids, vec![TASK_A, parent]);
            });
        }
    }

    describe "templates" {
        it "follows template cursors" {
            tokio_test::block_on(async {
                let server = MockServer::start().await;
                Mock::given(method("GET"))
                    .and(path("/v1/data_sources/ds-1/templates"))
                    .and(query_param("start_cursor", "t2"))
                    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                        "templates": [{ "id": "tpl-2", "name": "Issue" }],
                        "has_more": false
                    })))
                    .with_priority(1)
                    .expect(1)
                    .mount(&server)
                    .await;
                Mock::given(method("GET"))
                    .and(path("/v1/data_sources/ds-1/templates"))
                    .and(query_param("page_size", "100"))
                    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                        "templates": [{ "id": "tpl-1", "name": "Task", "is_default": true }],
                        "has_more": true,
                        "next_cursor": "t2"
                    })))
                    .expect(1)
                    .mount(&server)
                    .await;

                let client = client_for(&server, Some("ds-1"));
                let templates = client.list_templates().await.unwrap();
                let ids: Vec<&str> = templates.iter().map(|t| t.id.as_str()).collect();
                assert_eq!(ids, vec!["tpl-1", "tpl-2"]);
                assert!(templates[0].is_default);
            });
        }

        it "returns nothing when no template fits the type" {
            tokio_test::block_on(async {
                let server = MockServer::start().await;
                Mock::given(method("GET"))
                    .and(path("/v1/data_sources/ds-1/templates"))
                    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                        "templates": [{ "id": "tpl-1", "name": "Meeting notes" }],
                        "has_more": false
                    })))
                    .mount(&server)
                    .await;

                let client = client_for(&server, Some("ds-1"));
                let template = client.get_template_by_type(TaskType::Project).await.unwrap();
                assert!(template.is_none());
            });
        }
    }
}
