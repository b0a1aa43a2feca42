use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::dto::PublicUser;
use crate::error::ApiError;
use crate::tasks::status::TaskStatus;

/// Request body for task creation. Status is not accepted from the caller;
/// every task starts `OPEN`.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: String,
    pub priority: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub due_date: OffsetDateTime,
}

impl CreateTaskRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::InvalidInput("Title must not be empty".into()));
        }
        if self.description.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "Description must not be empty".into(),
            ));
        }
        if self.priority < 1 {
            return Err(ApiError::InvalidInput("Priority must be at least 1".into()));
        }
        Ok(())
    }
}

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<i32>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
}

impl UpdateTaskRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        // zero passes through: the merge treats it as absent (falsy quirk)
        if matches!(self.priority, Some(p) if p < 0) {
            return Err(ApiError::InvalidInput("Priority must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskStatusRequest {
    pub status: TaskStatus,
}

/// Optional query filter for task listing.
#[derive(Debug, Default, Deserialize)]
pub struct TaskFilter {
    pub owner: Option<Uuid>,
    pub status: Option<TaskStatus>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date_from: Option<OffsetDateTime>,
}

/// Outward task representation: the owner is always populated, password
/// hash stripped.
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub due_date: OffsetDateTime,
    pub status: TaskStatus,
    pub owner: PublicUser,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn create_request() -> CreateTaskRequest {
        CreateTaskRequest {
            title: "Ship release".into(),
            description: "Tag and push".into(),
            priority: 2,
            due_date: datetime!(2030-01-01 00:00 UTC),
        }
    }

    #[test]
    fn accepts_a_well_formed_task() {
        assert!(create_request().validate().is_ok());
    }

    #[test]
    fn rejects_blank_title_and_description() {
        let mut req = create_request();
        req.title = "  ".into();
        assert!(req.validate().is_err());

        let mut req = create_request();
        req.description = String::new();
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_priority_below_one_on_create() {
        for bad in [0, -1] {
            let mut req = create_request();
            req.priority = bad;
            assert!(req.validate().is_err(), "accepted priority {bad}");
        }
    }

    #[test]
    fn patch_allows_zero_priority_but_rejects_negative() {
        let patch = UpdateTaskRequest {
            priority: Some(0),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());

        let patch = UpdateTaskRequest {
            priority: Some(-2),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn update_request_parses_rfc3339_due_date() {
        let patch: UpdateTaskRequest =
            serde_json::from_str(r#"{"due_date": "2030-06-15T12:00:00Z"}"#).unwrap();
        assert_eq!(patch.due_date, Some(datetime!(2030-06-15 12:00 UTC)));
        assert!(patch.title.is_none());
    }
}
