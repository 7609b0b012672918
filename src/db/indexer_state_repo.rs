use sqlx::PgPool;

use crate::models::{Blockchain, IndexerState};

pub async fn get_state(
    pool: &PgPool,
    wallet_address: &str,
    chain: Blockchain,
) -> anyhow::Result<Option<IndexerState>> {
    let state = sqlx::query_as::<_, IndexerState>(
        "SELECT * FROM indexer_state WHERE wallet_address = $1 AND blockchain = $2",
    )
    .bind(wallet_address)
    .bind(chain.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(state)
}

pub async fn save_state(pool: &PgPool, state: &IndexerState) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO indexer_state
            (wallet_address, blockchain, last_signature, last_block, resume_before,
             pending_signature, last_updated, is_fully_indexed)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (wallet_address, blockchain) DO UPDATE SET
            last_signature = EXCLUDED.last_signature,
            last_block = EXCLUDED.last_block,
            resume_before = EXCLUDED.resume_before,
            pending_signature = EXCLUDED.pending_signature,
            last_updated = EXCLUDED.last_updated,
            is_fully_indexed = EXCLUDED.is_fully_indexed
        "#,
    )
    .bind(&state.wallet_address)
    .bind(&state.blockchain)
    .bind(&state.last_signature)
    .bind(state.last_block)
    .bind(&state.resume_before)
    .bind(&state.pending_signature)
    .bind(state.last_updated)
    .bind(state.is_fully_indexed)
    .execute(pool)
    .await?;

    Ok(())
}
