use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, IntoStaticStr};
use thiserror::Error;

use crate::HexNumber;

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum NetworkError {
    #[error(
        "Network has been given a poor name or chain ID: {given}. Please use one of the following options: {valid}"
    )]
    Unknown { given: String, valid: String },
}

/// Networks served by Alchemy, each bound to a fixed chain id.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Network {
    #[default]
    EthMainnet,
    EthRopsten,
    EthRinkeby,
    EthGoerli,
    EthKovan,
    EthSepolia,
    OptMainnet,
    OptGoerli,
    ArbMainnet,
    ArbRinkeby,
    MaticMainnet,
    MaticMumbai,
    AstarMainnet,
    BaseMainnet,
    BaseSepolia,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::EthMainnet => 1,
            Network::EthRopsten => 3,
            Network::EthRinkeby => 4,
            Network::EthGoerli => 5,
            Network::EthKovan => 42,
            Network::EthSepolia => 11155111,
            Network::OptMainnet => 10,
            Network::OptGoerli => 420,
            Network::ArbMainnet => 42161,
            Network::ArbRinkeby => 421611,
            Network::MaticMainnet => 137,
            Network::MaticMumbai => 80001,
            Network::AstarMainnet => 592,
            Network::BaseMainnet => 8453,
            Network::BaseSepolia => 84532,
        }
    }

    /// Registry name, e.g. `eth_mainnet`.
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Subdomain used by Alchemy endpoints, e.g. `eth-mainnet`.
    pub fn url_name(&self) -> String {
        self.name().replace('_', "-")
    }

    pub fn from_chain_id(chain_id: u64) -> Option<Network> {
        Network::iter().find(|network| network.chain_id() == chain_id)
    }

    /// True if `value` names this network or its chain id.
    pub fn matches(&self, value: &str) -> bool {
        value
            .parse::<Network>()
            .map(|network| network == *self)
            .unwrap_or(false)
    }

    pub fn all() -> Vec<Network> {
        Network::iter().collect()
    }

    fn unknown(given: impl Into<String>) -> NetworkError {
        NetworkError::Unknown {
            given: given.into(),
            valid: Network::iter()
                .map(|network| network.name())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl FromStr for Network {
    type Err = NetworkError;

    /// Accepts a registry name (`eth_mainnet`, `eth-mainnet`), a decimal chain
    /// id (`137`) or a hex chain id (`0x89`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        if let Some(network) = Network::iter().find(|network| network.name() == normalized) {
            return Ok(network);
        }
        normalized
            .parse::<HexNumber>()
            .ok()
            .and_then(|id| id.try_as_u64())
            .and_then(Network::from_chain_id)
            .ok_or_else(|| Network::unknown(s))
    }
}

impl TryFrom<u64> for Network {
    type Error = NetworkError;

    fn try_from(chain_id: u64) -> Result<Self, Self::Error> {
        Network::from_chain_id(chain_id).ok_or_else(|| Network::unknown(chain_id.to_string()))
    }
}
