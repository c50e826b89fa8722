pub mod blockchain;
pub mod nft;
pub mod token;

use std::str::FromStr;

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use strum_macros::{Display, EnumString};

use crate::{HexNumber, HexNumberError};

/// Named block positions understood by every EVM node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BlockTag {
    #[default]
    Latest,
    Earliest,
    Pending,
    Safe,
    Finalized,
}

/// Identifies a block by number, hash or tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockReference {
    Number(u64),
    Hash(B256),
    Tag(BlockTag),
}

impl BlockReference {
    pub fn number(number: u64) -> Self {
        BlockReference::Number(number)
    }

    pub fn hash(hash: B256) -> Self {
        BlockReference::Hash(hash)
    }

    pub fn tag(tag: BlockTag) -> Self {
        BlockReference::Tag(tag)
    }

    pub fn latest() -> Self {
        BlockReference::Tag(BlockTag::Latest)
    }

    /// Wire form for state queries such as `eth_getCode`.
    ///
    /// Hashes are sent as EIP-1898 objects; methods that have a dedicated
    /// `...ByHash` variant should match on the reference instead.
    pub fn to_param(&self) -> Value {
        match self {
            BlockReference::Number(number) => json!(HexNumber::from(*number).as_hex()),
            BlockReference::Tag(tag) => json!(tag.to_string()),
            BlockReference::Hash(hash) => json!({ "blockHash": hash }),
        }
    }
}

impl Default for BlockReference {
    fn default() -> Self {
        BlockReference::latest()
    }
}

impl From<u64> for BlockReference {
    fn from(value: u64) -> Self {
        BlockReference::Number(value)
    }
}

impl From<BlockTag> for BlockReference {
    fn from(value: BlockTag) -> Self {
        BlockReference::Tag(value)
    }
}

impl From<B256> for BlockReference {
    fn from(value: B256) -> Self {
        BlockReference::Hash(value)
    }
}

impl FromStr for BlockReference {
    type Err = HexNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(tag) = BlockTag::from_str(s) {
            return Ok(BlockReference::Tag(tag));
        }
        if s.len() == 66 {
            if let Ok(hash) = B256::from_str(s) {
                return Ok(BlockReference::Hash(hash));
            }
        }
        let number: HexNumber = s.parse()?;
        number
            .try_as_u64()
            .map(BlockReference::Number)
            .ok_or_else(|| HexNumberError::Overflow(s.to_string()))
    }
}

/// Who deployed a contract and in which block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDeployment {
    pub deployer: Address,
    pub block_number: u64,
}

impl ContractDeployment {
    pub fn new(deployer: Address, block_number: u64) -> Self {
        Self { deployer, block_number }
    }
}
