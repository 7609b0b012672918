use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

use super::solana::{ParsedTransaction, TokenBalance, LAMPORTS_PER_SOL};
use super::TransferLeg;
use crate::models::TxType;

/// Known Solana DEX programs, label first.
pub const SOLANA_DEX_PROGRAMS: &[(&str, &str)] = &[
    ("jupiterV3", "JUP3c2Uh3WA4Ng34tw6kPd2G4C5BB21Xo36Je1s32Ph"),
    ("jupiterV4", "JUP4Fb2cqiRUcaTHdrPC8h2gNsA2ETXiPDD33WcGuJB"),
    ("jupiterV6", "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4"),
    ("raydium", "675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8"),
    ("raydiumV2", "9HzJyW1qZsEiSfMUf6L2jo3CcTKAyBmSyKdwQeYisHrC"),
    ("pumpfun", "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P"),
    ("orcaWhirlpool", "whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc"),
    ("meteoraDlmm", "LBUZKhRxPF3XUpBCjp4YzTKgLccjZhTSDM9YuVaPwxo"),
];

fn dex_label(program_id: &str) -> Option<&'static str> {
    SOLANA_DEX_PROGRAMS
        .iter()
        .find(|(_, id)| *id == program_id)
        .map(|(label, _)| *label)
}

/// First known DEX program invoked by the transaction, top level before inner.
pub fn detect_dex(tx: &ParsedTransaction) -> Option<&'static str> {
    let top = tx
        .transaction
        .message
        .instructions
        .iter()
        .find_map(|ix| dex_label(&ix.program_id));
    if top.is_some() {
        return top;
    }
    tx.meta.as_ref().and_then(|meta| {
        meta.inner_instructions
            .iter()
            .flat_map(|inner| inner.instructions.iter())
            .find_map(|ix| dex_label(&ix.program_id))
    })
}

/// Sum of the wallet's token balances per mint.
fn owner_balances(balances: &[TokenBalance], wallet: &str) -> BTreeMap<String, Decimal> {
    let mut out: BTreeMap<String, Decimal> = BTreeMap::new();
    for b in balances {
        if b.owner.as_deref() != Some(wallet) {
            continue;
        }
        let amount = b.ui_token_amount.to_decimal().unwrap_or_default();
        *out.entry(b.mint.clone()).or_default() += amount;
    }
    out
}

/// Net change in the wallet's native SOL balance, in SOL. The network fee is
/// added back when the wallet paid it so it does not distort the price.
fn native_sol_change(tx: &ParsedTransaction, wallet: &str) -> Option<Decimal> {
    let meta = tx.meta.as_ref()?;
    let index = tx
        .transaction
        .message
        .account_keys
        .iter()
        .position(|k| k.pubkey == wallet)?;

    let pre = i128::from(*meta.pre_balances.get(index)?);
    let post = i128::from(*meta.post_balances.get(index)?);
    let mut delta = post - pre;
    if index == 0 {
        delta += i128::from(meta.fee);
    }
    let lamports = Decimal::from_i128_with_scale(delta, 0);
    Some(lamports / Decimal::from(LAMPORTS_PER_SOL))
}

/// Turn one parsed transaction into the wallet's token legs.
///
/// Each mint whose wallet-owned balance changed becomes one leg: an increase
/// is a buy, a decrease a sell. When a DEX program is involved the price is
/// inferred from another mint that moved the opposite way, falling back to
/// the wallet's SOL movement. Failed transactions produce nothing.
pub fn extract_legs(tx: &ParsedTransaction, wallet: &str, fallback_timestamp: i64) -> Vec<TransferLeg> {
    let Some(meta) = tx.meta.as_ref() else {
        return Vec::new();
    };
    if meta.err.is_some() {
        return Vec::new();
    }

    let tx_hash = tx.transaction.signatures.first().cloned().unwrap_or_default();
    let timestamp = tx.block_time.unwrap_or(fallback_timestamp);
    let dex = detect_dex(tx);

    let pre = owner_balances(&meta.pre_token_balances, wallet);
    let post = owner_balances(&meta.post_token_balances, wallet);

    let mints: BTreeSet<&String> = pre.keys().chain(post.keys()).collect();
    let changes: Vec<(&String, Decimal)> = mints
        .into_iter()
        .map(|mint| {
            let before = pre.get(mint).copied().unwrap_or_default();
            let after = post.get(mint).copied().unwrap_or_default();
            (mint, after - before)
        })
        .filter(|(_, change)| !change.is_zero())
        .collect();

    let sol_change = if dex.is_some() {
        native_sol_change(tx, wallet)
    } else {
        None
    };

    let mut legs = Vec::with_capacity(changes.len());
    for (mint, change) in &changes {
        let tx_type = if change.is_sign_positive() {
            TxType::Buy
        } else {
            TxType::Sell
        };
        let amount = change.abs();

        let price = if dex.is_some() {
            infer_price(*change, mint, &changes, sol_change).unwrap_or_default()
        } else {
            Decimal::ZERO
        };

        legs.push(TransferLeg {
            tx_hash: tx_hash.clone(),
            token_address: (*mint).clone(),
            token_name: None,
            token_symbol: None,
            amount,
            price,
            timestamp,
            tx_type,
            dex: dex.map(str::to_string),
        });
    }
    legs
}

fn infer_price(
    change: Decimal,
    mint: &str,
    changes: &[(&String, Decimal)],
    sol_change: Option<Decimal>,
) -> Option<Decimal> {
    let amount = change.abs();
    if amount.is_zero() {
        return None;
    }

    let counter = changes
        .iter()
        .find(|(other, other_change)| {
            other.as_str() != mint && other_change.is_sign_positive() != change.is_sign_positive()
        })
        .map(|(_, c)| c.abs());

    if let Some(counter) = counter {
        return counter.checked_div(amount);
    }

    let sol = sol_change?;
    if !sol.is_zero() && sol.is_sign_positive() != change.is_sign_positive() {
        return sol.abs().checked_div(amount);
    }
    None
}
