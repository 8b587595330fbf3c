use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::validation::escape_like;

/// Task record in the database. `user_id` is assigned at creation and never
/// reassigned.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub deadline: Date,
    pub created_at: OffsetDateTime,
}

impl Task {
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        description: &str,
        deadline: Date,
    ) -> sqlx::Result<Task> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (user_id, description, deadline)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, description, deadline, created_at
            "#,
        )
        .bind(user_id)
        .bind(description)
        .bind(deadline)
        .fetch_one(db)
        .await
    }

    /// Resolves by id alone; the ownership check happens above this layer so
    /// a missing task and a foreign task stay distinguishable.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Task>> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, description, deadline, created_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Owner-scoped listing. Filters intersect: case-insensitive substring
    /// match on description, inclusive deadline range. Ordered by id for a
    /// stable order on a fixed snapshot.
    pub async fn list_by_owner(
        db: &PgPool,
        user_id: Uuid,
        keyword: Option<&str>,
        start_date: Option<Date>,
        end_date: Option<Date>,
    ) -> sqlx::Result<Vec<Task>> {
        let mut qb = list_query(user_id, keyword, start_date, end_date);
        qb.build_query_as::<Task>().fetch_all(db).await
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        description: &str,
        deadline: Date,
    ) -> sqlx::Result<Task> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET description = $2, deadline = $3
            WHERE id = $1
            RETURNING id, user_id, description, deadline, created_at
            "#,
        )
        .bind(id)
        .bind(description)
        .bind(deadline)
        .fetch_one(db)
        .await
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<()> {
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}

fn list_query(
    user_id: Uuid,
    keyword: Option<&str>,
    start_date: Option<Date>,
    end_date: Option<Date>,
) -> QueryBuilder<'static, Postgres> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT id, user_id, description, deadline, created_at FROM tasks WHERE user_id = ",
    );
    qb.push_bind(user_id);
    if let Some(keyword) = keyword {
        qb.push(" AND description ILIKE ");
        qb.push_bind(format!("%{}%", escape_like(keyword)));
    }
    if let Some(start) = start_date {
        qb.push(" AND deadline >= ");
        qb.push_bind(start);
    }
    if let Some(end) = end_date {
        qb.push(" AND deadline <= ");
        qb.push_bind(end);
    }
    qb.push(" ORDER BY id");
    qb
}
