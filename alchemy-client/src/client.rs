//! # Alchemy client
//!
//! [`AlchemyClient`] owns the API key, the selected network and the transport.
//! Its methods are spread over the `node` (standard EVM json-rpc), `enhanced`
//! (Alchemy specific json-rpc) and `nft` (REST) modules.
use alchemy_common::{HexNumber, Network};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    config::{resolve_api_key, AlchemyConfig, Endpoints, API_KEY_ENV, MISSING_API_KEY_HELP},
    rpc::{HttpRPCClient, HttpRPCClientOptions, RPCError},
};

#[derive(Debug)]
pub struct AlchemyClient {
    api_key: String,
    network: Network,
    custom_url: Option<String>,
    nft_url: Option<String>,
    pub(crate) rpc: HttpRPCClient,
}

impl AlchemyClient {
    /// Creates a client, reading `ALCHEMY_API_KEY` when the config has no key.
    pub fn new(config: AlchemyConfig) -> Result<Self, RPCError> {
        let env_key = std::env::var(API_KEY_ENV).ok();
        Self::with_env_key(config, env_key)
    }

    fn with_env_key(config: AlchemyConfig, env_key: Option<String>) -> Result<Self, RPCError> {
        let api_key = resolve_api_key(config.api_key, env_key)?;
        let endpoints = Endpoints::new(
            config.network,
            &api_key,
            config.url.as_deref(),
            config.nft_url.as_deref(),
        )?;
        let options = HttpRPCClientOptions::new()
            .with_retries(config.retries)
            .with_proxies(config.proxies);
        let rpc = HttpRPCClient::new(endpoints, options)?;
        Ok(Self {
            api_key,
            network: config.network,
            custom_url: config.url,
            nft_url: config.nft_url,
            rpc,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Alias of [`AlchemyClient::api_key`].
    pub fn key(&self) -> &str {
        self.api_key()
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Id the next json-rpc request will carry.
    pub fn call_id(&self) -> u64 {
        self.rpc.current_id()
    }

    pub fn transport(&self) -> &HttpRPCClient {
        &self.rpc
    }

    pub fn set_api_key(&mut self, api_key: impl Into<String>) -> Result<(), RPCError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RPCError::MissingCredential(MISSING_API_KEY_HELP.to_string()));
        }
        self.api_key = api_key;
        self.rebuild_endpoints()
    }

    pub fn set_network(&mut self, network: Network) -> Result<(), RPCError> {
        self.network = network;
        self.rebuild_endpoints()
    }

    /// Updates whichever of key and network is given.
    pub fn set_settings(
        &mut self,
        api_key: Option<String>,
        network: Option<Network>,
    ) -> Result<(), RPCError> {
        if let Some(api_key) = api_key {
            self.set_api_key(api_key)?;
        }
        if let Some(network) = network {
            self.set_network(network)?;
        }
        Ok(())
    }

    fn rebuild_endpoints(&mut self) -> Result<(), RPCError> {
        let endpoints = Endpoints::new(
            self.network,
            &self.api_key,
            self.custom_url.as_deref(),
            self.nft_url.as_deref(),
        )?;
        self.rpc.set_endpoints(endpoints);
        Ok(())
    }

    /// Sends any json-rpc method and returns the raw `result`.
    pub async fn send(&self, method: &str, params: Vec<Value>) -> Result<Value, RPCError> {
        self.rpc
            .call(method, params, None)
            .await
    }

    pub(crate) async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, RPCError> {
        let value = self
            .rpc
            .call(method, params, None)
            .await?;
        decode(method, value)
    }

    /// Like `request`, but tags the call with the enhanced method name.
    pub(crate) async fn enhanced_request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
        sdk_method: &str,
    ) -> Result<T, RPCError> {
        let value = self
            .rpc
            .call(method, params, Some(sdk_method))
            .await?;
        decode(method, value)
    }

    /// Fails with `NotFound` when the node answers `null`.
    pub(crate) async fn request_required<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
        what: &str,
    ) -> Result<T, RPCError> {
        let value: Option<T> = self.request(method, params).await?;
        value.ok_or_else(|| RPCError::NotFound(format!("{method}: {what} not found")))
    }

    pub(crate) async fn request_u64(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<u64, RPCError> {
        let number: HexNumber = self
            .request_required(method, params, "quantity")
            .await?;
        to_u64(method, number)
    }
}

pub(crate) fn decode<T: DeserializeOwned>(method: &str, value: Value) -> Result<T, RPCError> {
    T::deserialize(&value).map_err(|e| {
        RPCError::ParseResponse(format!("Failed to decode {method} result: {e}, Result: {value}"))
    })
}

pub(crate) fn to_u64(method: &str, number: HexNumber) -> Result<u64, RPCError> {
    number.try_as_u64().ok_or_else(|| {
        RPCError::ParseResponse(format!("{method} returned {number}, which exceeds u64"))
    })
}
