use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Task lifecycle. A task starts `Open`, may be started or completed, and
/// `Done` is terminal. Stored as the `task_status` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    #[sqlx(rename = "OPEN")]
    Open,
    #[sqlx(rename = "IN_PROGRESS")]
    InProgress,
    #[sqlx(rename = "DONE")]
    Done,
}

impl TaskStatus {
    /// Legal edges: Open -> InProgress, Open -> Done, InProgress -> Done.
    /// Nothing leads back to Open, nothing leaves Done, and requesting the
    /// current status is rejected.
    pub fn validate_transition(self, requested: TaskStatus) -> Result<(), ApiError> {
        if self == requested {
            return Err(ApiError::InvalidTransition(
                "Task is already in the same status",
            ));
        }
        match (self, requested) {
            (Self::Done, _) => Err(ApiError::InvalidTransition("Task is already completed")),
            (Self::InProgress, Self::Open) => {
                Err(ApiError::InvalidTransition("Task is already in progress"))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TaskStatus::{self, Done, InProgress, Open};

    #[test]
    fn transition_table_is_exhaustive() {
        let all = [Open, InProgress, Done];
        let legal = [(Open, InProgress), (Open, Done), (InProgress, Done)];

        for from in all {
            for to in all {
                let result = from.validate_transition(to);
                if legal.contains(&(from, to)) {
                    assert!(result.is_ok(), "{from:?} -> {to:?} should be allowed");
                } else {
                    assert!(result.is_err(), "{from:?} -> {to:?} should be rejected");
                }
            }
        }
    }

    #[test]
    fn same_status_is_reported_as_such() {
        let err = InProgress.validate_transition(InProgress).unwrap_err();
        assert_eq!(err.to_string(), "Task is already in the same status");
    }

    #[test]
    fn done_is_terminal() {
        for to in [Open, InProgress] {
            let err = Done.validate_transition(to).unwrap_err();
            assert_eq!(err.to_string(), "Task is already completed");
        }
    }

    #[test]
    fn serializes_to_wire_names() {
        assert_eq!(serde_json::to_value(Open).unwrap(), "OPEN");
        assert_eq!(serde_json::to_value(InProgress).unwrap(), "IN_PROGRESS");
        assert_eq!(serde_json::to_value(Done).unwrap(), "DONE");
        let status: TaskStatus = serde_json::from_value("IN_PROGRESS".into()).unwrap();
        assert_eq!(status, InProgress);
    }
}
