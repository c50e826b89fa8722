//! Shared types for talking to Alchemy and other EVM JSON-RPC nodes.
//!
//! Nothing in this crate performs I/O. It holds the numeric codec used for
//! JSON-RPC quantities, the network registry and the typed models the client
//! decodes responses into.
pub mod hex_number;
pub mod models;
pub mod network;

pub use alloy_primitives::{Address, Bytes, B256, U256};
pub use hex_number::{HexNumber, HexNumberError};
pub use network::{Network, NetworkError};
