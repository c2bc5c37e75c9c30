use crate::models::{Comment, Post};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    title: String,
    description: String,
    image: String,
    post_by: Uuid,
    like_count: i64,
    liked_by: Vec<Uuid>,
    comments: Json<Vec<Comment>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            title: row.title,
            description: row.description,
            image: row.image,
            post_by: row.post_by,
            like_count: row.like_count,
            liked_by: row.liked_by,
            comments: row.comments.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Fetch every post in insertion order
pub async fn find_all_posts(pool: &PgPool) -> Result<Vec<Post>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PostRow>(
        r#"
        SELECT id, title, description, image, post_by, like_count, liked_by, comments,
               created_at, updated_at
        FROM posts
        ORDER BY seq ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Post::from).collect())
}

/// Find a post by ID
pub async fn find_post_by_id(pool: &PgPool, post_id: Uuid) -> Result<Option<Post>, sqlx::Error> {
    let row = sqlx::query_as::<_, PostRow>(
        r#"
        SELECT id, title, description, image, post_by, like_count, liked_by, comments,
               created_at, updated_at
        FROM posts
        WHERE id = $1
        "#,
    )
    .bind(post_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Post::from))
}

/// Insert a new post
pub async fn insert_post(pool: &PgPool, post: &Post) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO posts (id, title, description, image, post_by, like_count, liked_by,
                           comments, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(post.id)
    .bind(&post.title)
    .bind(&post.description)
    .bind(&post.image)
    .bind(post.post_by)
    .bind(post.like_count)
    .bind(&post.liked_by)
    .bind(Json(&post.comments))
    .bind(post.created_at)
    .bind(post.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Persist the mutable fields of a post. `post_by` and `created_at` never change.
pub async fn update_post(pool: &PgPool, post: &Post) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE posts
        SET title = $2, description = $3, image = $4, like_count = $5,
            liked_by = $6, comments = $7, updated_at = $8
        WHERE id = $1
        "#,
    )
    .bind(post.id)
    .bind(&post.title)
    .bind(&post.description)
    .bind(&post.image)
    .bind(post.like_count)
    .bind(&post.liked_by)
    .bind(Json(&post.comments))
    .bind(post.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Hard delete a post
pub async fn delete_post(pool: &PgPool, post_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
