/// SQLx-backed implementation of [`PostRepository`].
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use event_schema::ReviewStatus;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use super::{ApplyOutcome, PostRepository, RepoError};
use crate::models::{NewPost, Post, PostSearch, PostUpdate};

pub struct SqlxPostRepository {
    pool: PgPool,
}

impl SqlxPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn post_from_row(row: &PgRow) -> Result<Post, RepoError> {
    let status: String = row.try_get("status").map_err(RepoError::from)?;
    let status = status
        .parse::<ReviewStatus>()
        .map_err(|e| RepoError(e.to_string()))?;

    Ok(Post {
        id: row.try_get("id").map_err(RepoError::from)?,
        title: row.try_get("title").map_err(RepoError::from)?,
        content: row.try_get("content").map_err(RepoError::from)?,
        author: row.try_get("author").map_err(RepoError::from)?,
        category: row.try_get("category").map_err(RepoError::from)?,
        status,
        last_decision_at: row.try_get("last_decision_at").map_err(RepoError::from)?,
        created_at: row.try_get("created_at").map_err(RepoError::from)?,
        updated_at: row.try_get("updated_at").map_err(RepoError::from)?,
    })
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, new_post: NewPost) -> Result<Post, RepoError> {
        let row = sqlx::query(
            r#"
            INSERT INTO posts (id, title, content, author, category, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, content, author, category, status,
                      last_decision_at, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_post.title)
        .bind(&new_post.content)
        .bind(&new_post.author)
        .bind(&new_post.category)
        .bind(ReviewStatus::Draft.as_str())
        .fetch_one(&self.pool)
        .await?;

        post_from_row(&row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, content, author, category, status,
                   last_decision_at, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(post_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Post>, RepoError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, content, author, category, status,
                   last_decision_at, created_at, updated_at
            FROM posts
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(post_from_row).collect()
    }

    async fn search(&self, filter: PostSearch) -> Result<Vec<Post>, RepoError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, content, author, category, status,
                   last_decision_at, created_at, updated_at
            FROM posts
            WHERE ($1::TEXT IS NULL OR content ILIKE '%' || $1 || '%')
              AND ($2::TEXT IS NULL OR category = $2)
              AND ($3::TEXT IS NULL OR author = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.content)
        .bind(filter.category)
        .bind(filter.author)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(post_from_row).collect()
    }

    async fn update(&self, id: Uuid, update: PostUpdate) -> Result<Option<Post>, RepoError> {
        let row = sqlx::query(
            r#"
            UPDATE posts
            SET title = $2, content = $3, author = $4, category = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, content, author, category, status,
                      last_decision_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.content)
        .bind(&update.author)
        .bind(&update.category)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(post_from_row).transpose()
    }

    async fn exists(&self, id: Uuid) -> Result<bool, RepoError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1) AS present")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get("present")?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn apply_review_status(
        &self,
        post_id: Uuid,
        status: ReviewStatus,
        decided_at: DateTime<Utc>,
    ) -> Result<ApplyOutcome, RepoError> {
        // Watermark check and mutation in a single statement: a stale
        // redelivery loses the row-level race inside PostgreSQL itself.
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET status = $2, last_decision_at = $3, updated_at = NOW()
            WHERE id = $1
              AND (last_decision_at IS NULL OR last_decision_at <= $3)
            "#,
        )
        .bind(post_id)
        .bind(status.as_str())
        .bind(decided_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(ApplyOutcome::Applied);
        }

        if self.exists(post_id).await? {
            debug!(%post_id, %status, "review decision older than watermark, discarded");
            Ok(ApplyOutcome::Stale)
        } else {
            Ok(ApplyOutcome::NotFound)
        }
    }
}
