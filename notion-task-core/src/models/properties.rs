use serde::{Deserialize, Serialize};

/// Names of the database properties each task field lives in.
///
/// Defaults match the team workspace; any subset can be overridden from the
/// `properties` section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyNames {
    pub title: String,
    pub task_type: String,
    pub status: String,
    pub priority: String,
    pub assignee: String,
    pub creator: String,
    pub start_date: String,
    pub end_date: String,
    pub completed_at: String,
    pub labels: String,
    pub services: String,
    pub parent: String,
    pub children: String,
    pub number: String,
    pub period: String,
    pub progress: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            title: "제목".into(),
            task_type: "타입".into(),
            status: "상태".into(),
            priority: "우선순위".into(),
            assignee: "담당자".into(),
            creator: "생성자".into(),
            start_date: "시작일".into(),
            end_date: "종료일".into(),
            completed_at: "완료일".into(),
            labels: "라벨".into(),
            services: "서비스".into(),
            parent: "상위 항목".into(),
            children: "하위 항목".into(),
            number: "ID".into(),
            period: "기간".into(),
            progress: "진행률".into(),
        }
    }
}
