//! Async client for the Alchemy node, enhanced and NFT APIs.
//!
//! [`AlchemyClient`] wraps a retrying JSON-RPC transport and exposes the
//! standard `eth_*`/`net_*`/`web3_*` calls, Alchemy's `alchemy_*` methods and
//! a locator that finds the block and account that deployed a contract.
pub mod cli;
pub mod client;
pub mod config;
mod confirmation;
pub mod deployer;
mod enhanced;
mod nft;
mod node;
pub mod pagination;
pub mod rpc;

pub use client::AlchemyClient;
pub use config::AlchemyConfig;
pub use rpc::{HttpRPCClient, RPCError};
