use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::models::commerce::TransactionKind;

/// Appends a completed payment record to the audit log. Takes a bare
/// connection so purchases can record themselves inside their own transaction.
pub async fn record(
    conn: &mut PgConnection,
    user_id: Uuid,
    kind: TransactionKind,
    amount: Decimal,
    description: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO transactions (user_id, type, amount, description, status)
        VALUES ($1, $2, $3, $4, 'completed')
        "#,
    )
    .bind(user_id)
    .bind(kind.as_str())
    .bind(amount)
    .bind(description)
    .execute(conn)
    .await?;

    Ok(())
}
