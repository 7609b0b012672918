use std::str::FromStr;
use std::sync::Arc;

use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::rpc::{JsonRpcClient, RpcError};
use crate::indexer::RateLimiter;

pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
pub const TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";
pub const METADATA_PROGRAM_ID: &str = "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s";
pub const WRAPPED_SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Lamports per SOL.
pub const LAMPORTS_PER_SOL: i64 = 1_000_000_000;

/// Metadata account layout: key (1) + update authority (32), then the mint.
const METADATA_MINT_OFFSET: usize = 33;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    pub signature: String,
    #[serde(default)]
    pub slot: u64,
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub block_time: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiTokenAmount {
    pub amount: String,
    pub decimals: u8,
    #[serde(default)]
    pub ui_amount_string: Option<String>,
}

impl UiTokenAmount {
    /// Human-scale amount. Prefers the node's decimal string, falling back to
    /// scaling the raw integer amount by `decimals`.
    pub fn to_decimal(&self) -> Option<Decimal> {
        if let Some(s) = &self.ui_amount_string {
            if let Ok(d) = Decimal::from_str(s) {
                return Some(d);
            }
        }
        let raw: i128 = self.amount.parse().ok()?;
        Decimal::try_from_i128_with_scale(raw, u32::from(self.decimals)).ok()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub account_index: usize,
    pub mint: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub ui_token_amount: UiTokenAmount,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramRef {
    pub program_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InnerInstructions {
    #[serde(default)]
    pub instructions: Vec<ProgramRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub fee: u64,
    #[serde(default)]
    pub pre_balances: Vec<u64>,
    #[serde(default)]
    pub post_balances: Vec<u64>,
    #[serde(default)]
    pub pre_token_balances: Vec<TokenBalance>,
    #[serde(default)]
    pub post_token_balances: Vec<TokenBalance>,
    #[serde(default)]
    pub inner_instructions: Vec<InnerInstructions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountKey {
    pub pubkey: String,
    #[serde(default)]
    pub signer: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub account_keys: Vec<AccountKey>,
    #[serde(default)]
    pub instructions: Vec<ProgramRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionBody {
    #[serde(default)]
    pub signatures: Vec<String>,
    pub message: Message,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTransaction {
    #[serde(default)]
    pub slot: u64,
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
    pub transaction: TransactionBody,
}

#[derive(Debug, Clone, Deserialize)]
struct RpcValue<T> {
    value: T,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTokenAccountInfo {
    pub mint: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub token_amount: UiTokenAmount,
}

#[derive(Debug, Clone, Deserialize)]
struct ParsedAccountData {
    parsed: ParsedInfo<Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct ParsedInfo<T> {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    info: T,
}

#[derive(Debug, Clone, Deserialize)]
struct KeyedAccount<D> {
    pubkey: String,
    account: AccountData<D>,
}

#[derive(Debug, Clone, Deserialize)]
struct AccountData<D> {
    data: D,
}

#[derive(Debug, Clone, Deserialize)]
struct MintInfo {
    decimals: u8,
}

/// A token account held by a wallet, flattened from the jsonParsed layout.
#[derive(Debug, Clone)]
pub struct TokenAccount {
    pub pubkey: String,
    pub mint: String,
    pub amount: UiTokenAmount,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SolanaClient {
    rpc: JsonRpcClient,
    limiter: Option<Arc<RateLimiter>>,
}

impl SolanaClient {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            rpc: JsonRpcClient::new(http, url),
            limiter: None,
        }
    }

    /// Throttle every call made through this client (and its clones).
    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        if let Some(limiter) = &self.limiter {
            limiter.acquire().await;
        }
        self.rpc.call(method, params).await
    }

    /// Signatures touching `address`, newest first. `before` pages backwards,
    /// `until` stops at (and excludes) an already-known signature.
    pub async fn get_signatures_for_address(
        &self,
        address: &str,
        before: Option<&str>,
        until: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, RpcError> {
        let mut opts = json!({ "limit": limit });
        if let Some(before) = before {
            opts["before"] = json!(before);
        }
        if let Some(until) = until {
            opts["until"] = json!(until);
        }
        self.call("getSignaturesForAddress", json!([address, opts])).await
    }

    /// Fetch one transaction in jsonParsed form. `None` when the node has
    /// pruned or never saw it.
    pub async fn get_transaction(&self, signature: &str) -> Result<Option<ParsedTransaction>, RpcError> {
        self.call(
            "getTransaction",
            json!([
                signature,
                { "encoding": "jsonParsed", "maxSupportedTransactionVersion": 0 }
            ]),
        )
        .await
    }

    /// All SPL token accounts owned by `owner` under one token program.
    pub async fn get_token_accounts_by_owner(
        &self,
        owner: &str,
        program_id: &str,
    ) -> Result<Vec<TokenAccount>, RpcError> {
        let resp: RpcValue<Vec<KeyedAccount<ParsedAccountData>>> = self
            .call(
                "getTokenAccountsByOwner",
                json!([owner, { "programId": program_id }, { "encoding": "jsonParsed" }]),
            )
            .await?;

        let mut accounts = Vec::with_capacity(resp.value.len());
        for keyed in resp.value {
            let info: ParsedTokenAccountInfo = serde_json::from_value(keyed.account.data.parsed.info)?;
            accounts.push(TokenAccount {
                pubkey: keyed.pubkey,
                mint: info.mint,
                amount: info.token_amount,
            });
        }
        Ok(accounts)
    }

    /// Decimals of an SPL mint, or `None` when the account does not exist or
    /// is not a mint.
    pub async fn get_mint_decimals(&self, mint: &str) -> Result<Option<u8>, RpcError> {
        let resp: RpcValue<Option<AccountData<Value>>> = self
            .call("getAccountInfo", json!([mint, { "encoding": "jsonParsed" }]))
            .await?;

        let Some(account) = resp.value else {
            return Ok(None);
        };
        // Non-token accounts come back as raw base64 arrays, not objects.
        let Ok(parsed) = serde_json::from_value::<ParsedAccountData>(account.data) else {
            return Ok(None);
        };
        if parsed.parsed.kind.as_deref() != Some("mint") {
            return Ok(None);
        }
        let info: MintInfo = serde_json::from_value(parsed.parsed.info)?;
        Ok(Some(info.decimals))
    }

    /// Raw (base64-decoded) data of the Metaplex metadata account for `mint`.
    pub async fn get_metadata_account(&self, mint: &str) -> Result<Option<Vec<u8>>, RpcError> {
        let accounts: Vec<KeyedAccount<(String, String)>> = self
            .call(
                "getProgramAccounts",
                json!([
                    METADATA_PROGRAM_ID,
                    {
                        "encoding": "base64",
                        "filters": [
                            { "memcmp": { "offset": METADATA_MINT_OFFSET, "bytes": mint } }
                        ]
                    }
                ]),
            )
            .await?;

        let Some(first) = accounts.into_iter().next() else {
            return Ok(None);
        };

        use base64::Engine as _;
        match base64::engine::general_purpose::STANDARD.decode(first.account.data.0.as_bytes()) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) => {
                tracing::warn!(mint = %mint, account = %first.pubkey, error = %e, "Metadata account is not valid base64");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ui_amount_prefers_string() {
        let amt = UiTokenAmount {
            amount: "1500000".into(),
            decimals: 6,
            ui_amount_string: Some("1.5".into()),
        };
        assert_eq!(amt.to_decimal(), Some(Decimal::from_str("1.5").unwrap()));
    }

    #[test]
    fn test_ui_amount_scales_raw() {
        let amt = UiTokenAmount {
            amount: "1500000".into(),
            decimals: 6,
            ui_amount_string: None,
        };
        assert_eq!(amt.to_decimal(), Some(Decimal::from_str("1.5").unwrap()));
    }

    #[test]
    fn test_parsed_transaction_deserializes() {
        let raw = json!({
            "slot": 250000000,
            "blockTime": 1700000000,
            "meta": {
                "err": null,
                "fee": 5000,
                "preBalances": [10, 0],
                "postBalances": [5, 0],
                "preTokenBalances": [],
                "postTokenBalances": [{
                    "accountIndex": 1,
                    "mint": "MintA",
                    "owner": "Wallet",
                    "uiTokenAmount": { "amount": "100", "decimals": 0, "uiAmount": 100.0, "uiAmountString": "100" }
                }],
                "innerInstructions": [],
                "logMessages": []
            },
            "transaction": {
                "signatures": ["sig1"],
                "message": {
                    "accountKeys": [
                        { "pubkey": "Wallet", "signer": true, "writable": true, "source": "transaction" },
                        { "pubkey": "TokenAcct", "signer": false, "writable": true, "source": "transaction" }
                    ],
                    "instructions": [{ "programId": "ComputeBudget111111111111111111111111111111", "accounts": [], "data": "" }]
                }
            }
        });
        let tx: ParsedTransaction = serde_json::from_value(raw).unwrap();
        assert_eq!(tx.block_time, Some(1_700_000_000));
        let meta = tx.meta.unwrap();
        assert_eq!(meta.post_token_balances[0].owner.as_deref(), Some("Wallet"));
        assert_eq!(tx.transaction.message.account_keys[0].pubkey, "Wallet");
    }
}
