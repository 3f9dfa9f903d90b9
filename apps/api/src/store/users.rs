use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::user::{UserRow, UserStatus};

pub async fn find_by_phone(pool: &PgPool, phone: &str) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE phone = $1")
        .bind(phone)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Creates a user together with its zero-balance coins row. Both inserts run
/// in one transaction so no user ever exists without a wallet.
pub async fn create_with_coins(pool: &PgPool, phone: &str) -> Result<UserRow, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (phone, status) VALUES ($1, $2) RETURNING *",
    )
    .bind(phone)
    .bind(UserStatus::NewUser.as_str())
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO coins (user_id, balance) VALUES ($1, 0)")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(user)
}

/// Fills in the profile fields collected after phone verification and moves
/// the user to ONBOARDING_COMPLETE.
pub async fn complete_registration(
    pool: &PgPool,
    user_id: Uuid,
    full_name: &str,
    email: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE users
        SET full_name = $1, email = $2, status = $3, updated_at = now()
        WHERE id = $4
        "#,
    )
    .bind(full_name)
    .bind(email)
    .bind(UserStatus::OnboardingComplete.as_str())
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Moves a user to a new lifecycle status. Runs on the caller's connection so
/// subscription grants can include it in their transaction.
pub async fn set_status(
    conn: &mut PgConnection,
    user_id: Uuid,
    status: UserStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET status = $1 WHERE id = $2")
        .bind(status.as_str())
        .bind(user_id)
        .execute(conn)
        .await?;

    Ok(())
}
