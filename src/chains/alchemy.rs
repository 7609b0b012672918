use alloy::primitives::U256;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::basescan::TokenTransfer;
use super::rpc::{JsonRpcClient, RpcError};

const MAX_TRANSFER_PAGES: usize = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContract {
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    decimal: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferMetadata {
    #[serde(default)]
    block_timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransfer {
    block_num: String,
    hash: String,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    asset: Option<String>,
    raw_contract: RawContract,
    #[serde(default)]
    metadata: Option<TransferMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetTransfersPage {
    #[serde(default)]
    transfers: Vec<AssetTransfer>,
    #[serde(default)]
    page_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalanceEntry {
    pub contract_address: String,
    #[serde(default)]
    pub token_balance: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenBalancesResult {
    #[serde(default)]
    token_balances: Vec<TokenBalanceEntry>,
}

fn hex_to_decimal_string(hex: &str) -> Option<String> {
    let digits = hex.trim().trim_start_matches("0x");
    if digits.is_empty() {
        return Some("0".into());
    }
    U256::from_str_radix(digits, 16).ok().map(|v| v.to_string())
}

impl AssetTransfer {
    /// Reshape into the Basescan row format so both sources share one parser.
    pub fn into_token_transfer(self) -> Option<TokenTransfer> {
        let contract = self.raw_contract.address?;
        let value = hex_to_decimal_string(self.raw_contract.value.as_deref()?)?;
        let decimals = self
            .raw_contract
            .decimal
            .as_deref()
            .and_then(hex_to_decimal_string)
            .unwrap_or_else(|| "18".into());
        let block = hex_to_decimal_string(&self.block_num)?;
        let timestamp = self
            .metadata
            .and_then(|m| m.block_timestamp)
            .and_then(|ts| DateTime::parse_from_rfc3339(&ts).ok())
            .map(|dt| dt.timestamp())
            .unwrap_or(0);

        Some(TokenTransfer {
            block_number: block,
            time_stamp: timestamp.to_string(),
            hash: self.hash,
            from: self.from.unwrap_or_default(),
            to: self.to.unwrap_or_default(),
            contract_address: contract,
            value,
            token_name: String::new(),
            token_symbol: self.asset.unwrap_or_default(),
            token_decimal: decimals,
        })
    }
}

/// Alchemy enhanced API for Base. Only constructed when a key is configured.
#[derive(Debug, Clone)]
pub struct AlchemyClient {
    rpc: JsonRpcClient,
}

impl AlchemyClient {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            rpc: JsonRpcClient::new(http, url),
        }
    }

    async fn transfers_in_direction(
        &self,
        direction: &str,
        wallet: &str,
        from_block: Option<i64>,
    ) -> Result<Vec<AssetTransfer>, RpcError> {
        let mut out = Vec::new();
        let mut page_key: Option<String> = None;

        for _ in 0..MAX_TRANSFER_PAGES {
            let mut params = json!({
                "category": ["erc20"],
                "withMetadata": true,
                "excludeZeroValue": true,
                "order": "desc",
                "maxCount": "0x64",
                "fromBlock": from_block.map(|b| format!("{b:#x}")).unwrap_or_else(|| "0x0".into()),
            });
            params[direction] = json!(wallet);
            if let Some(key) = &page_key {
                params["pageKey"] = json!(key);
            }

            let page: AssetTransfersPage = self.rpc.call("alchemy_getAssetTransfers", json!([params])).await?;
            out.extend(page.transfers);

            match page.page_key {
                Some(key) => page_key = Some(key),
                None => break,
            }
        }
        Ok(out)
    }

    /// ERC-20 transfers to and from `wallet`, in Basescan row form.
    pub async fn token_transfers(&self, wallet: &str, from_block: Option<i64>) -> Result<Vec<TokenTransfer>, RpcError> {
        let mut transfers = self.transfers_in_direction("fromAddress", wallet, from_block).await?;
        transfers.extend(self.transfers_in_direction("toAddress", wallet, from_block).await?);

        Ok(transfers
            .into_iter()
            .filter_map(AssetTransfer::into_token_transfer)
            .collect())
    }

    /// Non-zero ERC-20 balances for `wallet` as `(contract, raw decimal string)`.
    pub async fn token_balances(&self, wallet: &str) -> Result<Vec<(String, String)>, RpcError> {
        let result: TokenBalancesResult = self
            .rpc
            .call("alchemy_getTokenBalances", json!([wallet, "erc20"]))
            .await?;

        Ok(result
            .token_balances
            .into_iter()
            .filter_map(|entry| {
                let raw = hex_to_decimal_string(entry.token_balance.as_deref()?)?;
                (raw != "0").then(|| (entry.contract_address.to_lowercase(), raw))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_conversion() {
        assert_eq!(hex_to_decimal_string("0x12").as_deref(), Some("18"));
        assert_eq!(hex_to_decimal_string("0x").as_deref(), Some("0"));
        assert_eq!(hex_to_decimal_string("0xzz"), None);
    }

    #[test]
    fn test_asset_transfer_reshaped() {
        let raw = json!({
            "blockNum": "0x10",
            "hash": "0xabc",
            "from": "0xfrom",
            "to": "0xto",
            "value": 1.5,
            "asset": "DEGEN",
            "category": "erc20",
            "rawContract": { "value": "0x14d1120d7b160000", "address": "0xdegen", "decimal": "0x12" },
            "metadata": { "blockTimestamp": "2024-01-01T00:00:00.000Z" }
        });
        let transfer: AssetTransfer = serde_json::from_value(raw).unwrap();
        let row = transfer.into_token_transfer().unwrap();

        assert_eq!(row.block_number, "16");
        assert_eq!(row.value, "1500000000000000000");
        assert_eq!(row.token_decimal, "18");
        assert_eq!(row.token_symbol, "DEGEN");
        assert_eq!(row.time_stamp, "1704067200");
    }
}
