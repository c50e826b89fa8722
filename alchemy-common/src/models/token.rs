use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use strum_macros::{Display, EnumString};

use crate::{hex_number::quantity, HexNumber};

/// Default page size of `alchemy_getAssetTransfers`.
pub const DEFAULT_MAX_TRANSFER_COUNT: u64 = 1000;

/// `alchemy_getTokenBalances` accepts at most this many contract addresses.
pub const MAX_TOKEN_ADDRESSES: usize = 1500;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AssetTransferCategory {
    #[default]
    External,
    Internal,
    Erc20,
    Erc721,
    Erc1155,
    SpecialNft,
}

impl AssetTransferCategory {
    /// Categories queried when the caller does not pick any.
    pub fn defaults() -> Vec<AssetTransferCategory> {
        vec![
            AssetTransferCategory::External,
            AssetTransferCategory::Internal,
            AssetTransferCategory::Erc20,
            AssetTransferCategory::Erc721,
            AssetTransferCategory::SpecialNft,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetTransfer {
    #[serde(with = "quantity")]
    pub block_num: u64,
    pub unique_id: String,
    pub hash: B256,
    pub from: Address,
    pub to: Option<Address>,
    pub value: Option<f64>,
    pub erc721_token_id: Option<String>,
    pub erc1155_metadata: Option<Vec<Erc1155Metadata>>,
    pub token_id: Option<String>,
    pub asset: Option<String>,
    pub category: AssetTransferCategory,
    pub raw_contract: RawContract,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Erc1155Metadata {
    pub token_id: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawContract {
    pub value: Option<String>,
    pub address: Option<Address>,
    pub decimal: Option<String>,
}

/// One page of `alchemy_getAssetTransfers`. A missing `transfers` field is
/// treated as a malformed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransfersPage {
    pub transfers: Vec<AssetTransfer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_key: Option<String>,
}

/// Parameters of `alchemy_getAssetTransfers`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetTransfersRequest {
    pub from_address: Option<Address>,
    pub to_address: Option<Address>,
    pub from_block: u64,
    /// Resolved to the current block by the client when unset.
    pub to_block: Option<u64>,
    pub max_count: u64,
    pub page_key: Option<String>,
    pub contract_addresses: Vec<Address>,
    pub category: Vec<AssetTransferCategory>,
    pub exclude_zero_value: bool,
}

impl Default for AssetTransfersRequest {
    fn default() -> Self {
        Self {
            from_address: None,
            to_address: None,
            from_block: 0,
            to_block: None,
            max_count: DEFAULT_MAX_TRANSFER_COUNT,
            page_key: None,
            contract_addresses: Vec::new(),
            category: AssetTransferCategory::defaults(),
            exclude_zero_value: false,
        }
    }
}

impl AssetTransfersRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_address(mut self, address: Address) -> Self {
        self.from_address = Some(address);
        self
    }

    pub fn to_address(mut self, address: Address) -> Self {
        self.to_address = Some(address);
        self
    }

    pub fn from_block(mut self, block: u64) -> Self {
        self.from_block = block;
        self
    }

    pub fn to_block(mut self, block: u64) -> Self {
        self.to_block = Some(block);
        self
    }

    pub fn max_count(mut self, max_count: u64) -> Self {
        self.max_count = max_count;
        self
    }

    pub fn page_key(mut self, page_key: impl Into<String>) -> Self {
        self.page_key = Some(page_key.into());
        self
    }

    pub fn contract_addresses(mut self, addresses: Vec<Address>) -> Self {
        self.contract_addresses = addresses;
        self
    }

    pub fn category(mut self, category: Vec<AssetTransferCategory>) -> Self {
        self.category = category;
        self
    }

    pub fn to_param(&self) -> Value {
        let mut params = Map::new();
        params.insert("fromBlock".into(), json!(HexNumber::from(self.from_block)));
        if let Some(to_block) = self.to_block {
            params.insert("toBlock".into(), json!(HexNumber::from(to_block)));
        }
        params.insert("category".into(), json!(self.category));
        params.insert("excludeZeroValue".into(), json!(self.exclude_zero_value));
        params.insert("maxCount".into(), json!(HexNumber::from(self.max_count)));
        if let Some(page_key) = &self.page_key {
            params.insert("pageKey".into(), json!(page_key));
        }
        if !self.contract_addresses.is_empty() {
            params.insert("contractAddresses".into(), json!(self.contract_addresses));
        }
        // Addresses serialize as lowercase hex.
        if let Some(from) = &self.from_address {
            params.insert("fromAddress".into(), json!(from));
        }
        if let Some(to) = &self.to_address {
            params.insert("toAddress".into(), json!(to));
        }
        Value::Object(params)
    }
}

/// Which tokens `alchemy_getTokenBalances` should report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TokenSpec {
    Contracts(Vec<Address>),
    #[default]
    Erc20,
    DefaultTokens,
}

impl TokenSpec {
    pub fn to_param(&self) -> Value {
        match self {
            TokenSpec::Contracts(addresses) => json!(addresses),
            TokenSpec::Erc20 => json!("erc20"),
            TokenSpec::DefaultTokens => json!("DEFAULT_TOKENS"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenBalances {
    pub address: Address,
    pub token_balances: Vec<TokenBalance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenBalance {
    pub contract_address: Address,
    pub token_balance: Option<U256>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenMetadata {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
    pub logo: Option<String>,
}
