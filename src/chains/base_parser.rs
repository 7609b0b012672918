use std::collections::HashMap;
use std::str::FromStr;

use alloy::primitives::utils::format_units;
use alloy::primitives::U256;
use rust_decimal::Decimal;

use super::basescan::TokenTransfer;
use super::TransferLeg;
use crate::models::TxType;

/// Known Base swap routers, label first.
pub const BASE_DEX_ROUTERS: &[(&str, &str)] = &[
    ("uniswapV3", "0x2626664c2603336E57B271c5C0b26F421741e481"),
    ("baseswap", "0x327Df1E6de05895d2ab08513aaDD9313Fe505d86"),
];

const DEFAULT_DECIMALS: u8 = 18;

fn router_label(address: &str) -> Option<&'static str> {
    BASE_DEX_ROUTERS
        .iter()
        .find(|(_, router)| router.eq_ignore_ascii_case(address))
        .map(|(label, _)| *label)
}

/// Scale a raw integer token amount by `decimals`.
pub fn scale_amount(raw: &str, decimals: u8) -> Option<Decimal> {
    let value = U256::from_str_radix(raw.trim(), 10).ok()?;
    let formatted = format_units(value, decimals).ok()?;
    Decimal::from_str(&formatted).ok().map(|d| d.normalize())
}

/// Convert Basescan-style transfers into the wallet's legs.
///
/// A transfer to the wallet is a buy, one from it a sell. Transfers that do
/// not touch the wallet are dropped. Movements of one token within one
/// transaction are netted into a single leg, so split routes and refunds
/// leave one row per (hash, token). When a hash then carries exactly one buy
/// and one sell leg it is treated as a swap and each leg is priced in units
/// of the other.
pub fn process_transfers(transfers: &[TokenTransfer], wallet: &str) -> Vec<TransferLeg> {
    let mut legs: Vec<TransferLeg> = Vec::with_capacity(transfers.len());

    for t in transfers {
        let is_buy = t.to.eq_ignore_ascii_case(wallet);
        let is_sell = t.from.eq_ignore_ascii_case(wallet);
        if !is_buy && !is_sell {
            continue;
        }
        // Self-transfers net to nothing.
        if is_buy && is_sell {
            continue;
        }

        let decimals = t.token_decimal.trim().parse().unwrap_or(DEFAULT_DECIMALS);
        let Some(amount) = scale_amount(&t.value, decimals) else {
            tracing::warn!(tx = %t.hash, value = %t.value, "Unparseable transfer value, skipping");
            continue;
        };

        let (tx_type, counterparty) = if is_buy {
            (TxType::Buy, &t.from)
        } else {
            (TxType::Sell, &t.to)
        };

        legs.push(TransferLeg {
            tx_hash: t.hash.clone(),
            token_address: t.contract_address.to_lowercase(),
            token_name: Some(t.token_name.clone()).filter(|s| !s.trim().is_empty()),
            token_symbol: Some(t.token_symbol.clone()).filter(|s| !s.trim().is_empty()),
            amount,
            price: Decimal::ZERO,
            timestamp: t.time_stamp.trim().parse().unwrap_or(0),
            tx_type,
            dex: router_label(counterparty).map(str::to_string),
        });
    }

    let mut legs = net_legs(legs);
    price_swaps(&mut legs);
    legs
}

/// Collapse legs sharing a (hash, token) into their net movement. Legs that
/// cancel out are dropped. First-seen order is kept.
fn net_legs(legs: Vec<TransferLeg>) -> Vec<TransferLeg> {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut merged: HashMap<(String, String), (TransferLeg, Decimal)> = HashMap::new();

    for leg in legs {
        let signed = match leg.tx_type {
            TxType::Buy => leg.amount,
            TxType::Sell => -leg.amount,
        };
        let key = (leg.tx_hash.clone(), leg.token_address.clone());
        match merged.get_mut(&key) {
            Some((first, net)) => {
                *net += signed;
                if first.dex.is_none() {
                    first.dex = leg.dex;
                }
            }
            None => {
                order.push(key.clone());
                merged.insert(key, (leg, signed));
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| {
            let (mut leg, net) = merged.remove(&key)?;
            if net.is_zero() {
                return None;
            }
            leg.tx_type = if net.is_sign_positive() { TxType::Buy } else { TxType::Sell };
            leg.amount = net.abs().normalize();
            Some(leg)
        })
        .collect()
}

fn price_swaps(legs: &mut [TransferLeg]) {
    let mut by_hash: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, leg) in legs.iter().enumerate() {
        by_hash.entry(leg.tx_hash.clone()).or_default().push(i);
    }

    for indices in by_hash.values() {
        let [a, b] = indices.as_slice() else {
            continue;
        };
        let (buy, sell) = match (legs[*a].tx_type, legs[*b].tx_type) {
            (TxType::Buy, TxType::Sell) => (*a, *b),
            (TxType::Sell, TxType::Buy) => (*b, *a),
            _ => continue,
        };

        let buy_amount = legs[buy].amount;
        let sell_amount = legs[sell].amount;

        if let Some(p) = sell_amount.checked_div(buy_amount).filter(|_| !buy_amount.is_zero()) {
            legs[buy].price = p.normalize();
        }
        if let Some(p) = buy_amount.checked_div(sell_amount).filter(|_| !sell_amount.is_zero()) {
            legs[sell].price = p.normalize();
        }

        // A swap through a known router tags both legs.
        if legs[buy].dex.is_none() {
            legs[buy].dex = legs[sell].dex.clone();
        } else if legs[sell].dex.is_none() {
            legs[sell].dex = legs[buy].dex.clone();
        }
    }
}

/// Highest block number among the transfers, used as the incremental cursor.
pub fn highest_block(transfers: &[TokenTransfer]) -> Option<i64> {
    transfers
        .iter()
        .filter_map(|t| t.block_number.trim().parse::<i64>().ok())
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "0x2d1c5e86ef58644b2b2b09921afe9ddf4e99ef28";

    fn transfer(hash: &str, from: &str, to: &str, token: &str, value: &str, decimals: &str, block: &str) -> TokenTransfer {
        TokenTransfer {
            block_number: block.into(),
            time_stamp: "1700000000".into(),
            hash: hash.into(),
            from: from.into(),
            to: to.into(),
            contract_address: token.into(),
            value: value.into(),
            token_name: "".into(),
            token_symbol: "".into(),
            token_decimal: decimals.into(),
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_scale_amount() {
        assert_eq!(scale_amount("1500000000000000000", 18), Some(dec("1.5")));
        assert_eq!(scale_amount("2500000", 6), Some(dec("2.5")));
        assert_eq!(scale_amount("abc", 6), None);
    }

    #[test]
    fn test_direction_and_filtering() {
        let transfers = vec![
            transfer("0x1", "0xpool", &WALLET.to_uppercase().replace("0X", "0x"), "0xTOKEN", "1000000", "6", "10"),
            transfer("0x2", WALLET, "0xpool", "0xtoken", "500000", "6", "11"),
            transfer("0x3", "0xa", "0xb", "0xtoken", "1", "6", "12"),
        ];
        let legs = process_transfers(&transfers, WALLET);
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].tx_type, TxType::Buy);
        assert_eq!(legs[0].amount, dec("1"));
        assert_eq!(legs[0].token_address, "0xtoken");
        assert_eq!(legs[1].tx_type, TxType::Sell);
        assert_eq!(legs[1].amount, dec("0.5"));
        // Single-leg hashes carry no price.
        assert_eq!(legs[0].price, Decimal::ZERO);
    }

    #[test]
    fn test_swap_legs_get_reciprocal_prices() {
        let router = "0x2626664c2603336e57b271c5c0b26f421741e481";
        let transfers = vec![
            // wallet sends 200 USDC to the router and receives 1000 MEME
            transfer("0xswap", WALLET, router, "0xusdc", "200000000", "6", "20"),
            transfer("0xswap", "0xpool", WALLET, "0xmeme", "1000000000000000000000", "18", "20"),
        ];
        let legs = process_transfers(&transfers, WALLET);
        let usdc = legs.iter().find(|l| l.token_address == "0xusdc").unwrap();
        let meme = legs.iter().find(|l| l.token_address == "0xmeme").unwrap();

        assert_eq!(meme.price, dec("0.2"));
        assert_eq!(usdc.price, dec("5"));
        assert_eq!(usdc.dex.as_deref(), Some("uniswapV3"));
        assert_eq!(meme.dex.as_deref(), Some("uniswapV3"));
    }

    #[test]
    fn test_three_leg_hash_is_not_priced() {
        let transfers = vec![
            transfer("0xh", WALLET, "0xp", "0xa", "1", "0", "1"),
            transfer("0xh", "0xp", WALLET, "0xb", "2", "0", "1"),
            transfer("0xh", "0xp", WALLET, "0xc", "3", "0", "1"),
        ];
        let legs = process_transfers(&transfers, WALLET);
        assert!(legs.iter().all(|l| l.price.is_zero()));
    }

    #[test]
    fn test_split_route_buy_is_one_leg() {
        let transfers = vec![
            transfer("0xh", "0xpoola", WALLET, "0xmeme", "100", "0", "5"),
            transfer("0xh", "0xpoolb", WALLET, "0xmeme", "50", "0", "5"),
        ];
        let legs = process_transfers(&transfers, WALLET);
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].tx_type, TxType::Buy);
        assert_eq!(legs[0].amount, dec("150"));
    }

    #[test]
    fn test_send_and_refund_nets_without_self_pricing() {
        let transfers = vec![
            transfer("0xh", WALLET, "0xrouter", "0xmeme", "100", "0", "5"),
            transfer("0xh", "0xrouter", WALLET, "0xmeme", "10", "0", "5"),
        ];
        let legs = process_transfers(&transfers, WALLET);
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].tx_type, TxType::Sell);
        assert_eq!(legs[0].amount, dec("90"));
        assert_eq!(legs[0].price, Decimal::ZERO);
    }

    #[test]
    fn test_split_route_swap_is_priced_on_totals() {
        let transfers = vec![
            transfer("0xs", WALLET, "0xpoola", "0xusdc", "60", "0", "5"),
            transfer("0xs", WALLET, "0xpoolb", "0xusdc", "40", "0", "5"),
            transfer("0xs", "0xpoola", WALLET, "0xmeme", "500", "0", "5"),
        ];
        let legs = process_transfers(&transfers, WALLET);
        assert_eq!(legs.len(), 2);
        let meme = legs.iter().find(|l| l.token_address == "0xmeme").unwrap();
        assert_eq!(meme.price, dec("0.2"));
    }

    #[test]
    fn test_full_refund_drops_leg() {
        let transfers = vec![
            transfer("0xh", WALLET, "0xrouter", "0xmeme", "100", "0", "5"),
            transfer("0xh", "0xrouter", WALLET, "0xmeme", "100", "0", "5"),
        ];
        assert!(process_transfers(&transfers, WALLET).is_empty());
    }

    #[test]
    fn test_highest_block() {
        let transfers = vec![
            transfer("0x1", WALLET, "0xp", "0xa", "1", "0", "100"),
            transfer("0x2", WALLET, "0xp", "0xa", "1", "0", "250"),
            transfer("0x3", WALLET, "0xp", "0xa", "1", "0", "bogus"),
        ];
        assert_eq!(highest_block(&transfers), Some(250));
        assert_eq!(highest_block(&[]), None);
    }
}
