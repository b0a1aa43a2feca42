use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::dto::PublicUser;
use crate::tasks::dto::{TaskFilter, TaskView};
use crate::tasks::status::TaskStatus;

#[derive(Debug, Clone, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: i32,
    pub due_date: OffsetDateTime,
    pub status: TaskStatus,
    pub owner_id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Task row joined with its owner, for the populated outward view.
#[derive(Debug, Clone, FromRow)]
pub struct TaskWithOwner {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: i32,
    pub due_date: OffsetDateTime,
    pub status: TaskStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub owner_id: Uuid,
    pub owner_email: String,
    pub owner_full_name: String,
    pub owner_created_at: OffsetDateTime,
    pub owner_updated_at: OffsetDateTime,
}

const TASK_WITH_OWNER_COLUMNS: &str = r#"
    t.id, t.title, t.description, t.priority, t.due_date, t.status,
    t.created_at, t.updated_at,
    u.id AS owner_id, u.email AS owner_email, u.full_name AS owner_full_name,
    u.created_at AS owner_created_at, u.updated_at AS owner_updated_at
"#;

impl TaskWithOwner {
    pub fn into_view(self) -> TaskView {
        TaskView {
            id: self.id,
            title: self.title,
            description: self.description,
            priority: self.priority,
            due_date: self.due_date,
            status: self.status,
            owner: PublicUser {
                id: self.owner_id,
                email: self.owner_email,
                full_name: self.owner_full_name,
                created_at: self.owner_created_at,
                updated_at: self.owner_updated_at,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Task {
    pub fn into_view(self, owner: PublicUser) -> TaskView {
        TaskView {
            id: self.id,
            title: self.title,
            description: self.description,
            priority: self.priority,
            due_date: self.due_date,
            status: self.status,
            owner,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Filtered listing, most important work first: priority descending,
    /// then due date ascending, then newest created.
    pub async fn list(db: &PgPool, filter: &TaskFilter) -> Result<Vec<TaskWithOwner>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {TASK_WITH_OWNER_COLUMNS}
            FROM tasks t
            JOIN users u ON u.id = t.owner_id
            WHERE ($1::uuid IS NULL OR t.owner_id = $1)
              AND ($2::task_status IS NULL OR t.status = $2)
              AND ($3::timestamptz IS NULL OR t.due_date >= $3)
            ORDER BY t.priority DESC, t.due_date ASC, t.created_at DESC
            "#
        );
        sqlx::query_as::<_, TaskWithOwner>(&sql)
            .bind(filter.owner)
            .bind(filter.status)
            .bind(filter.due_date_from)
            .fetch_all(db)
            .await
    }

    /// Unscoped lookup with the owner populated.
    pub async fn fetch_with_owner(
        db: &PgPool,
        id: Uuid,
    ) -> Result<Option<TaskWithOwner>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {TASK_WITH_OWNER_COLUMNS}
            FROM tasks t
            JOIN users u ON u.id = t.owner_id
            WHERE t.id = $1
            "#
        );
        sqlx::query_as::<_, TaskWithOwner>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Ownership-scoped lookup: a task owned by someone else comes back as
    /// `None`, same as a missing one.
    pub async fn find_owned(
        db: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, priority, due_date, status, owner_id,
                   created_at, updated_at
            FROM tasks
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(db)
        .await
    }

    pub async fn insert(
        db: &PgPool,
        title: &str,
        description: &str,
        priority: i32,
        due_date: OffsetDateTime,
        status: TaskStatus,
        owner_id: Uuid,
    ) -> Result<Task, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, description, priority, due_date, status, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, priority, due_date, status, owner_id,
                      created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(priority)
        .bind(due_date)
        .bind(status)
        .bind(owner_id)
        .fetch_one(db)
        .await
    }

    /// Write back mutable fields. The read-save pair is not serialized
    /// against a concurrent second writer.
    pub async fn save(&self, db: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, priority = $4, due_date = $5,
                status = $6, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(self.id)
        .bind(&self.title)
        .bind(&self.description)
        .bind(self.priority)
        .bind(self.due_date)
        .bind(self.status)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Atomic ownership-scoped find-and-remove.
    pub async fn delete_owned(
        db: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            DELETE FROM tasks
            WHERE id = $1 AND owner_id = $2
            RETURNING id, title, description, priority, due_date, status, owner_id,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(db)
        .await
    }
}
