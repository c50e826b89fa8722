//! Models of the Alchemy NFT REST API (v2).
use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NftContract {
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NftTokenMetadata {
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NftId {
    /// Token id as returned by the API, usually a 32 byte hex string.
    pub token_id: String,
    pub token_metadata: Option<NftTokenMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenUri {
    pub raw: Option<String>,
    pub gateway: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Nft {
    pub contract: NftContract,
    pub id: NftId,
    pub balance: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub token_uri: Option<TokenUri>,
    pub media: Vec<TokenUri>,
    /// Free-form metadata as published by the token contract.
    pub metadata: Option<Value>,
    pub time_last_updated: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedNftsPage {
    pub owned_nfts: Vec<Nft>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_key: Option<String>,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub block_hash: Option<B256>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NftOwners {
    pub owners: Vec<Address>,
}
