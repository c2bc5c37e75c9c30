use crate::models::{User, UserSummary};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Find a user by ID
pub async fn find_user_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, firstname, email, posts
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| User {
        id: row.get("id"),
        firstname: row.get("firstname"),
        email: row.get("email"),
        posts: row.get("posts"),
    }))
}

/// Insert a user or overwrite its fields and post list
pub async fn upsert_user(pool: &PgPool, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (id, firstname, email, posts)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (id) DO UPDATE
        SET firstname = EXCLUDED.firstname,
            email = EXCLUDED.email,
            posts = EXCLUDED.posts,
            updated_at = NOW()
        "#,
    )
    .bind(user.id)
    .bind(&user.firstname)
    .bind(&user.email)
    .bind(&user.posts)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch expansion fields for several users at once
pub async fn find_summaries(
    pool: &PgPool,
    user_ids: &[Uuid],
) -> Result<Vec<UserSummary>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, firstname, email
        FROM users
        WHERE id = ANY($1)
        "#,
    )
    .bind(user_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| UserSummary {
            id: row.get("id"),
            firstname: row.get("firstname"),
            email: row.get("email"),
        })
        .collect())
}
