pub mod alchemy;
pub mod base_parser;
pub mod basescan;
pub mod metaplex;
pub mod rpc;
pub mod solana;
pub mod solana_parser;
pub mod solscan;

use rust_decimal::Decimal;

use crate::models::TxType;

/// One token movement for the indexed wallet, before token metadata is
/// attached. Name and symbol are only known up front when the source
/// reports them (Basescan does, Solana RPC does not).
#[derive(Debug, Clone, PartialEq)]
pub struct TransferLeg {
    pub tx_hash: String,
    pub token_address: String,
    pub token_name: Option<String>,
    pub token_symbol: Option<String>,
    pub amount: Decimal,
    pub price: Decimal,
    pub timestamp: i64,
    pub tx_type: TxType,
    pub dex: Option<String>,
}
