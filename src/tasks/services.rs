use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::auth::repo::User;
use crate::error::ApiError;
use crate::events::{EventSink, TASK_CREATED, TASK_DELETED, TASK_UPDATED};
use crate::tasks::dto::{CreateTaskRequest, TaskFilter, TaskView, UpdateTaskRequest};
use crate::tasks::repo::Task;
use crate::tasks::status::TaskStatus;

fn ensure_due_date_not_past(due: OffsetDateTime, now: OffsetDateTime) -> Result<(), ApiError> {
    if due < now {
        return Err(ApiError::InvalidDueDate);
    }
    Ok(())
}

/// Falsy patch values are indistinguishable from absent ones and leave the
/// stored field untouched: clearing a title to "" or a priority to 0 is
/// silently ignored.
fn merge_patch(task: &mut Task, patch: &UpdateTaskRequest) {
    if let Some(title) = patch.title.as_deref() {
        if !title.is_empty() {
            task.title = title.to_string();
        }
    }
    if let Some(description) = patch.description.as_deref() {
        if !description.is_empty() {
            task.description = description.to_string();
        }
    }
    if let Some(priority) = patch.priority {
        if priority != 0 {
            task.priority = priority;
        }
    }
    if let Some(due_date) = patch.due_date {
        task.due_date = due_date;
    }
}

pub async fn list_tasks(db: &PgPool, filter: &TaskFilter) -> Result<Vec<TaskView>, ApiError> {
    let rows = Task::list(db, filter).await?;
    Ok(rows.into_iter().map(|row| row.into_view()).collect())
}

pub async fn get_task(db: &PgPool, id: Uuid) -> Result<TaskView, ApiError> {
    let row = Task::fetch_with_owner(db, id)
        .await?
        .ok_or(ApiError::NotFound("Task"))?;
    Ok(row.into_view())
}

pub async fn create_task(
    db: &PgPool,
    events: &dyn EventSink,
    owner_id: Uuid,
    req: CreateTaskRequest,
) -> Result<TaskView, ApiError> {
    ensure_due_date_not_past(req.due_date, OffsetDateTime::now_utc())?;

    // status is forced to OPEN no matter what the caller sent
    let task = Task::insert(
        db,
        &req.title,
        &req.description,
        req.priority,
        req.due_date,
        TaskStatus::Open,
        owner_id,
    )
    .await?;

    let view = populate(db, task.id).await?;
    info!(task_id = %view.id, owner = %owner_id, "task created");
    events.publish(TASK_CREATED, &view);
    Ok(view)
}

pub async fn update_task(
    db: &PgPool,
    events: &dyn EventSink,
    id: Uuid,
    caller_id: Uuid,
    patch: UpdateTaskRequest,
) -> Result<TaskView, ApiError> {
    let mut task = Task::find_owned(db, id, caller_id)
        .await?
        .ok_or(ApiError::NotFound("Task"))?;

    // an invalid due date fails the whole update, nothing is applied
    if let Some(due_date) = patch.due_date {
        ensure_due_date_not_past(due_date, OffsetDateTime::now_utc())?;
    }

    merge_patch(&mut task, &patch);
    task.save(db).await?;

    let view = populate(db, id).await?;
    info!(task_id = %id, owner = %caller_id, "task updated");
    events.publish(TASK_UPDATED, &view);
    Ok(view)
}

pub async fn update_task_status(
    db: &PgPool,
    events: &dyn EventSink,
    id: Uuid,
    caller_id: Uuid,
    status: TaskStatus,
) -> Result<TaskView, ApiError> {
    let mut task = Task::find_owned(db, id, caller_id)
        .await?
        .ok_or(ApiError::NotFound("Task"))?;

    task.status.validate_transition(status)?;
    task.status = status;
    task.save(db).await?;

    let view = populate(db, id).await?;
    info!(task_id = %id, status = ?status, "task status updated");
    events.publish(TASK_UPDATED, &view);
    Ok(view)
}

pub async fn delete_task(
    db: &PgPool,
    events: &dyn EventSink,
    id: Uuid,
    caller_id: Uuid,
) -> Result<TaskView, ApiError> {
    let task = Task::delete_owned(db, id, caller_id)
        .await?
        .ok_or(ApiError::NotFound("Task"))?;

    // the row is gone; the owner is fetched separately for the outgoing view
    let owner = User::find_by_id(db, task.owner_id)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("owner of deleted task missing")))?;

    let view = task.into_view(owner.into());
    info!(task_id = %id, owner = %caller_id, "task deleted");
    events.publish(TASK_DELETED, &view);
    Ok(view)
}

/// Re-fetch the task with its owner after a mutation, so every returned and
/// broadcast task carries the denormalized owner view.
async fn populate(db: &PgPool, id: Uuid) -> Result<TaskView, ApiError> {
    let row = Task::fetch_with_owner(db, id)
        .await?
        .ok_or(ApiError::NotFound("Task"))?;
    Ok(row.into_view())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample_task() -> Task {
        let now = datetime!(2030-01-01 00:00 UTC);
        Task {
            id: Uuid::new_v4(),
            title: "Write report".into(),
            description: "Quarterly numbers".into(),
            priority: 3,
            due_date: datetime!(2030-02-01 00:00 UTC),
            status: TaskStatus::Open,
            owner_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn due_date_in_the_past_is_rejected() {
        let now = datetime!(2030-01-01 12:00 UTC);
        let err = ensure_due_date_not_past(datetime!(2030-01-01 11:59 UTC), now).unwrap_err();
        assert_eq!(err.to_string(), "Due date cannot be in the past");
    }

    #[test]
    fn due_date_now_or_later_is_accepted() {
        let now = datetime!(2030-01-01 12:00 UTC);
        assert!(ensure_due_date_not_past(now, now).is_ok());
        assert!(ensure_due_date_not_past(datetime!(2031-01-01 0:00 UTC), now).is_ok());
    }

    #[test]
    fn merge_applies_provided_fields() {
        let mut task = sample_task();
        let patch = UpdateTaskRequest {
            title: Some("New title".into()),
            description: Some("New description".into()),
            priority: Some(5),
            due_date: Some(datetime!(2030-03-01 00:00 UTC)),
        };
        merge_patch(&mut task, &patch);
        assert_eq!(task.title, "New title");
        assert_eq!(task.description, "New description");
        assert_eq!(task.priority, 5);
        assert_eq!(task.due_date, datetime!(2030-03-01 00:00 UTC));
    }

    #[test]
    fn merge_leaves_absent_fields_untouched() {
        let mut task = sample_task();
        merge_patch(&mut task, &UpdateTaskRequest::default());
        assert_eq!(task.title, "Write report");
        assert_eq!(task.priority, 3);
    }

    #[test]
    fn empty_string_patch_is_silently_ignored() {
        let mut task = sample_task();
        let patch = UpdateTaskRequest {
            title: Some(String::new()),
            description: Some(String::new()),
            ..Default::default()
        };
        merge_patch(&mut task, &patch);
        assert_eq!(task.title, "Write report");
        assert_eq!(task.description, "Quarterly numbers");
    }

    #[test]
    fn zero_priority_patch_is_silently_ignored() {
        let mut task = sample_task();
        let patch = UpdateTaskRequest {
            priority: Some(0),
            ..Default::default()
        };
        merge_patch(&mut task, &patch);
        assert_eq!(task.priority, 3);
    }
}
