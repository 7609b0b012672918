use anyhow::anyhow;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::{Blockchain, Transaction, TxType};

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    tx_hash: String,
    wallet_address: String,
    blockchain: String,
    token_address: String,
    token_name: String,
    token_symbol: String,
    amount: Decimal,
    price: Decimal,
    block_time: i64,
    tx_type: String,
    dex: Option<String>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = anyhow::Error;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Transaction {
            blockchain: Blockchain::from_api_str(&row.blockchain)
                .ok_or_else(|| anyhow!("unknown blockchain in row: {}", row.blockchain))?,
            tx_type: TxType::from_db_str(&row.tx_type)
                .ok_or_else(|| anyhow!("unknown tx_type in row: {}", row.tx_type))?,
            tx_hash: row.tx_hash,
            wallet_address: row.wallet_address,
            token_address: row.token_address,
            token_name: row.token_name,
            token_symbol: row.token_symbol,
            amount: row.amount,
            price: row.price,
            timestamp: row.block_time,
            dex: row.dex,
        })
    }
}

/// Insert or refresh transactions in one database transaction. Returns how
/// many rows were new.
pub async fn upsert_transactions(pool: &PgPool, txs: &[Transaction]) -> anyhow::Result<usize> {
    if txs.is_empty() {
        return Ok(0);
    }

    let mut db_tx = pool.begin().await?;
    let mut inserted = 0usize;

    for t in txs {
        let (is_new,): (bool,) = sqlx::query_as(
            r#"
            INSERT INTO transactions
                (tx_hash, wallet_address, blockchain, token_address, token_name, token_symbol,
                 amount, price, block_time, tx_type, dex)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (tx_hash, wallet_address, token_address) DO UPDATE SET
                token_name = EXCLUDED.token_name,
                token_symbol = EXCLUDED.token_symbol,
                amount = EXCLUDED.amount,
                price = EXCLUDED.price,
                block_time = EXCLUDED.block_time,
                tx_type = EXCLUDED.tx_type,
                dex = EXCLUDED.dex
            RETURNING (xmax = 0)
            "#,
        )
        .bind(&t.tx_hash)
        .bind(&t.wallet_address)
        .bind(t.blockchain.as_str())
        .bind(&t.token_address)
        .bind(&t.token_name)
        .bind(&t.token_symbol)
        .bind(t.amount)
        .bind(t.price)
        .bind(t.timestamp)
        .bind(t.tx_type.as_str())
        .bind(&t.dex)
        .fetch_one(&mut *db_tx)
        .await?;

        if is_new {
            inserted += 1;
        }
    }

    db_tx.commit().await?;
    Ok(inserted)
}

/// All stored transactions for a wallet, oldest first.
pub async fn get_transactions(
    pool: &PgPool,
    wallet_address: &str,
    chain: Blockchain,
) -> anyhow::Result<Vec<Transaction>> {
    let rows = sqlx::query_as::<_, TransactionRow>(
        r#"
        SELECT tx_hash, wallet_address, blockchain, token_address, token_name, token_symbol,
               amount, price, block_time, tx_type, dex
        FROM transactions
        WHERE wallet_address = $1 AND blockchain = $2
        ORDER BY block_time ASC, tx_hash ASC
        "#,
    )
    .bind(wallet_address)
    .bind(chain.as_str())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Transaction::try_from).collect()
}

pub async fn count_transactions(pool: &PgPool, wallet_address: &str, chain: Blockchain) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM transactions WHERE wallet_address = $1 AND blockchain = $2",
    )
    .bind(wallet_address)
    .bind(chain.as_str())
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}
