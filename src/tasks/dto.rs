use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::tasks::repo::Task;

/// Serde adapter keeping deadlines in the `YYYY-MM-DD` wire format.
pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    use crate::validation::DATE_FORMAT;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let text = date.format(DATE_FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let text = String::deserialize(deserializer)?;
        Date::parse(&text, DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Request body for POST /tasks. The deadline stays a string here so a
/// malformed date maps to a validation error rather than a body rejection.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub description: String,
    pub deadline: String,
}

/// Request body for PATCH /tasks/{id}.
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub description: Option<String>,
    pub deadline: Option<String>,
}

/// Query parameters for GET /tasks. Absent filters impose no constraint.
#[derive(Debug, Default, Deserialize)]
pub struct TaskFilter {
    pub keyword_pattern: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub description: String,
    #[serde(with = "iso_date")]
    pub deadline: Date,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            description: task.description,
            deadline: task.deadline,
        }
    }
}
