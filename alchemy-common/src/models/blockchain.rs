use alloy_primitives::{Address, Bytes, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::{hex_number::quantity, models::BlockReference, HexNumber};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Block {
    #[serde(with = "quantity")]
    pub number: u64,
    pub hash: Option<B256>,
    pub parent_hash: B256,
    #[serde(with = "quantity")]
    pub timestamp: u64,
    pub miner: Address,
    pub gas_limit: U256,
    pub gas_used: U256,
    pub base_fee_per_gas: Option<U256>,
    pub extra_data: Bytes,
    pub transactions: BlockTransactions,
    pub uncles: Vec<B256>,
}

impl Block {
    /// Block timestamp as UTC time, `None` if it is out of chrono's range.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// Nodes return either transaction hashes or full transaction objects
/// depending on the `full` flag of `eth_getBlockBy*`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockTransactions {
    Hashes(Vec<B256>),
    Full(Vec<Transaction>),
}

impl Default for BlockTransactions {
    fn default() -> Self {
        BlockTransactions::Hashes(Vec::new())
    }
}

impl BlockTransactions {
    pub fn len(&self) -> usize {
        match self {
            BlockTransactions::Hashes(hashes) => hashes.len(),
            BlockTransactions::Full(txs) => txs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hashes(&self) -> Vec<B256> {
        match self {
            BlockTransactions::Hashes(hashes) => hashes.clone(),
            BlockTransactions::Full(txs) => txs.iter().map(|tx| tx.hash).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
    pub hash: B256,
    pub nonce: U256,
    pub block_hash: Option<B256>,
    #[serde(with = "quantity::option")]
    pub block_number: Option<u64>,
    #[serde(with = "quantity::option")]
    pub transaction_index: Option<u64>,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pub gas: U256,
    pub gas_price: Option<U256>,
    pub max_fee_per_gas: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
    pub input: Bytes,
    pub chain_id: Option<U256>,
    #[serde(rename = "type")]
    pub transaction_type: Option<U256>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(with = "quantity")]
    pub transaction_index: u64,
    pub block_hash: Option<B256>,
    #[serde(with = "quantity")]
    pub block_number: u64,
    pub from: Address,
    pub to: Option<Address>,
    /// Only set for contract creation transactions.
    pub contract_address: Option<Address>,
    pub cumulative_gas_used: U256,
    pub gas_used: U256,
    pub effective_gas_price: Option<U256>,
    pub status: Option<U256>,
    pub logs: Vec<Log>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status
            .map(|status| status == U256::from(1u64))
            .unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_hash: Option<B256>,
    #[serde(with = "quantity::option")]
    pub block_number: Option<u64>,
    pub transaction_hash: Option<B256>,
    #[serde(with = "quantity::option")]
    pub transaction_index: Option<u64>,
    #[serde(with = "quantity::option")]
    pub log_index: Option<u64>,
    pub removed: bool,
}

/// Filter for `eth_getLogs`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogFilter {
    pub from_block: Option<BlockReference>,
    pub to_block: Option<BlockReference>,
    pub block_hash: Option<B256>,
    pub addresses: Vec<Address>,
    /// Positional topic filters, `None` matches any topic.
    pub topics: Vec<Option<B256>>,
}

impl LogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_block(mut self, block: impl Into<BlockReference>) -> Self {
        self.from_block = Some(block.into());
        self
    }

    pub fn to_block(mut self, block: impl Into<BlockReference>) -> Self {
        self.to_block = Some(block.into());
        self
    }

    pub fn at_block_hash(mut self, hash: B256) -> Self {
        self.block_hash = Some(hash);
        self
    }

    pub fn address(mut self, address: Address) -> Self {
        self.addresses.push(address);
        self
    }

    pub fn topic(mut self, topic: Option<B256>) -> Self {
        self.topics.push(topic);
        self
    }

    /// `eth_getLogs` takes either a block range or a single `blockHash`. A
    /// hash given as range bound pins the filter to that block, with
    /// `block_hash` taking precedence over `from_block` over `to_block`.
    pub fn to_param(&self) -> Value {
        let mut filter = Map::new();
        let pinned = self.block_hash.or_else(|| {
            [self.from_block, self.to_block]
                .into_iter()
                .find_map(|bound| match bound {
                    Some(BlockReference::Hash(hash)) => Some(hash),
                    _ => None,
                })
        });
        match pinned {
            Some(hash) => {
                filter.insert("blockHash".into(), json!(hash));
            }
            None => {
                if let Some(from) = &self.from_block {
                    filter.insert("fromBlock".into(), from.to_param());
                }
                if let Some(to) = &self.to_block {
                    filter.insert("toBlock".into(), to.to_param());
                }
            }
        }
        match self.addresses.as_slice() {
            [] => {}
            [single] => {
                filter.insert("address".into(), json!(single));
            }
            many => {
                filter.insert("address".into(), json!(many));
            }
        }
        if !self.topics.is_empty() {
            filter.insert("topics".into(), json!(self.topics));
        }
        Value::Object(filter)
    }
}

/// Transaction skeleton for `eth_call` and `eth_estimateGas`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<HexNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<HexNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<HexNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
}

impl CallRequest {
    pub fn new(to: Address) -> Self {
        Self { to: Some(to), ..Default::default() }
    }

    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_data(mut self, data: Bytes) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_value(mut self, value: impl Into<HexNumber>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_gas(mut self, gas: impl Into<HexNumber>) -> Self {
        self.gas = Some(gas.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeeHistory {
    #[serde(with = "quantity")]
    pub oldest_block: u64,
    pub base_fee_per_gas: Vec<U256>,
    pub gas_used_ratio: Vec<f64>,
    pub reward: Option<Vec<Vec<U256>>>,
}

/// Recommended fees for a new transaction. EIP-1559 transactions use the
/// `max_*` fields, legacy ones `gas_price`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeData {
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub gas_price: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SyncStatus {
    Syncing(SyncProgress),
    NotSyncing(bool),
}

impl SyncStatus {
    pub fn is_syncing(&self) -> bool {
        matches!(self, SyncStatus::Syncing(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgress {
    #[serde(with = "quantity")]
    pub starting_block: u64,
    #[serde(with = "quantity")]
    pub current_block: u64,
    #[serde(with = "quantity")]
    pub highest_block: u64,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_block_with_hashes() {
        let raw = json!({
            "number": "0x1b4",
            "hash": format!("0x{}", "11".repeat(32)),
            "parentHash": format!("0x{}", "22".repeat(32)),
            "timestamp": "0x5f5e100",
            "miner": "0x0000000000000000000000000000000000000001",
            "gasLimit": "0x1c9c380",
            "gasUsed": "0x0",
            "extraData": "0x",
            "transactions": [format!("0x{}", "33".repeat(32))],
            "uncles": []
        });

        let block: Block = serde_json::from_value(raw).unwrap();

        assert_eq!(block.number, 436);
        assert_eq!(block.timestamp, 100_000_000);
        assert_eq!(block.transactions.hashes(), vec![B256::repeat_byte(0x33)]);
        assert_eq!(block.base_fee_per_gas, None);
        assert_eq!(
            block
                .datetime()
                .unwrap()
                .timestamp(),
            100_000_000
        );
    }

    #[test]
    fn test_block_with_full_transactions() {
        let raw = json!({
            "number": "0x1",
            "timestamp": "0x1",
            "transactions": [{
                "hash": format!("0x{}", "44".repeat(32)),
                "from": "0x0000000000000000000000000000000000000002",
                "to": null,
                "value": "0xde0b6b3a7640000",
                "blockNumber": "0x1",
                "input": "0x6080"
            }]
        });

        let block: Block = serde_json::from_value(raw).unwrap();

        match &block.transactions {
            BlockTransactions::Full(txs) => {
                assert_eq!(txs.len(), 1);
                assert_eq!(txs[0].to, None);
                assert_eq!(txs[0].block_number, Some(1));
                assert_eq!(txs[0].value, U256::from(1_000_000_000_000_000_000u64));
            }
            other => panic!("expected full transactions, got {other:?}"),
        }
    }

    #[test]
    fn test_receipt_contract_creation() {
        let raw = json!({
            "transactionHash": format!("0x{}", "55".repeat(32)),
            "transactionIndex": "0x0",
            "blockNumber": "0x64",
            "from": "0x00000000000000000000000000000000000000aa",
            "to": null,
            "contractAddress": "0x00000000000000000000000000000000000000BB",
            "gasUsed": "0x5208",
            "cumulativeGasUsed": "0x5208",
            "status": "0x1",
            "logs": []
        });

        let receipt: TransactionReceipt = serde_json::from_value(raw).unwrap();

        assert_eq!(receipt.block_number, 100);
        assert_eq!(receipt.contract_address, Some(Address::with_last_byte(0xbb)));
        assert!(receipt.succeeded());
    }

    #[test]
    fn test_log_filter_param() {
        let filter = LogFilter::new()
            .from_block(10u64)
            .to_block(BlockReference::latest())
            .address(Address::with_last_byte(1))
            .topic(None)
            .topic(Some(B256::repeat_byte(0x01)));

        assert_eq!(
            filter.to_param(),
            json!({
                "fromBlock": "0xa",
                "toBlock": "latest",
                "address": "0x0000000000000000000000000000000000000001",
                "topics": [null, format!("0x{}", "01".repeat(32))]
            })
        );
    }

    #[test]
    fn test_log_filter_hash_bound_becomes_block_hash() {
        let hash = B256::repeat_byte(0x0b);
        let filter = LogFilter::new()
            .from_block(hash)
            .to_block(BlockReference::latest())
            .address(Address::with_last_byte(1));

        assert_eq!(
            filter.to_param(),
            json!({
                "blockHash": hash,
                "address": "0x0000000000000000000000000000000000000001"
            })
        );
    }

    #[test]
    fn test_log_filter_explicit_block_hash_wins() {
        let pinned = B256::repeat_byte(0x0c);
        let filter = LogFilter::new()
            .from_block(10u64)
            .to_block(B256::repeat_byte(0x0d))
            .at_block_hash(pinned);

        assert_eq!(filter.to_param(), json!({ "blockHash": pinned }));
    }

    #[test]
    fn test_call_request_skips_empty_fields() {
        let call = CallRequest::new(Address::with_last_byte(2)).with_value(16u64);

        assert_eq!(
            serde_json::to_value(call).unwrap(),
            json!({ "to": "0x0000000000000000000000000000000000000002", "value": "0x10" })
        );
    }

    #[test]
    fn test_sync_status() {
        let status: SyncStatus = serde_json::from_value(json!(false)).unwrap();
        assert!(!status.is_syncing());

        let status: SyncStatus = serde_json::from_value(json!({
            "startingBlock": "0x0",
            "currentBlock": "0x10",
            "highestBlock": "0x20"
        }))
        .unwrap();
        assert!(status.is_syncing());
    }
}
