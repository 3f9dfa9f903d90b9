use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::commerce::{CoinsRow, TransactionKind};
use crate::store::transactions;

pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<CoinsRow>, sqlx::Error> {
    sqlx::query_as::<_, CoinsRow>("SELECT * FROM coins WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Balance for status checks. A user without a coins row reads as zero.
pub async fn balance_or_zero(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    let balance: Option<i64> = sqlx::query_scalar("SELECT balance FROM coins WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(balance.unwrap_or(0))
}

/// Credits a coin purchase and records its transaction as one atomic write.
/// Returns the new balance, or `None` (with everything rolled back) when the
/// user has no coins row.
pub async fn purchase(
    pool: &PgPool,
    user_id: Uuid,
    coins: i64,
    price: Decimal,
) -> Result<Option<i64>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let new_balance: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE coins
        SET balance = balance + $1,
            last_purchase_date = now(),
            total_purchased = total_purchased + $1,
            updated_at = now()
        WHERE user_id = $2
        RETURNING balance
        "#,
    )
    .bind(coins)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(new_balance) = new_balance else {
        tx.rollback().await?;
        return Ok(None);
    };

    transactions::record(
        &mut tx,
        user_id,
        TransactionKind::CoinPurchase,
        price,
        &format!("Purchase of {coins} coins"),
    )
    .await?;

    tx.commit().await?;
    Ok(Some(new_balance))
}
