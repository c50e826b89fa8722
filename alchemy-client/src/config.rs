use std::collections::HashMap;

use alchemy_common::Network;
use reqwest::Url;

use crate::rpc::RPCError;

/// Environment variable consulted when no API key is configured explicitly.
pub const API_KEY_ENV: &str = "ALCHEMY_API_KEY";

/// Placeholder shown instead of the API key in logs and error messages.
pub const REDACTED_API_KEY: &str = "<REDACTED_API_KEY>";

pub(crate) const MISSING_API_KEY_HELP: &str = "A valid Alchemy API key must be provided either \
    through `AlchemyConfig::with_api_key` or through the environment variable \"ALCHEMY_API_KEY\". \
    Get a free key from the alchemy website: https://alchemy.com";

/// Settings used to build an [`AlchemyClient`](crate::AlchemyClient).
///
/// ```no_run
/// use alchemy_client::AlchemyConfig;
/// use alchemy_common::Network;
///
/// let config = AlchemyConfig::new()
///     .with_api_key("my-key")
///     .with_network(Network::MaticMainnet)
///     .with_retries(3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlchemyConfig {
    /// Falls back to `ALCHEMY_API_KEY` when unset.
    pub api_key: Option<String>,
    pub network: Network,
    /// Number of times a request is reissued after a non-2xx response.
    pub retries: u32,
    /// Proxy urls keyed by scheme: `http`, `https` or `all`.
    pub proxies: HashMap<String, String>,
    /// Replaces the network derived JSON-RPC url.
    pub url: Option<String>,
    /// Replaces the network derived NFT REST url.
    pub nft_url: Option<String>,
}

impl AlchemyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Alias of [`AlchemyConfig::with_api_key`].
    pub fn with_key(self, key: impl Into<String>) -> Self {
        self.with_api_key(key)
    }

    pub fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_proxy(mut self, scheme: impl Into<String>, proxy_url: impl Into<String>) -> Self {
        self.proxies
            .insert(scheme.into(), proxy_url.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_nft_url(mut self, url: impl Into<String>) -> Self {
        self.nft_url = Some(url.into());
        self
    }
}

/// Picks the explicit key, else the environment value. Blank keys count as
/// missing.
pub fn resolve_api_key(
    explicit: Option<String>,
    from_env: Option<String>,
) -> Result<String, RPCError> {
    explicit
        .filter(|key| !key.trim().is_empty())
        .or_else(|| from_env.filter(|key| !key.trim().is_empty()))
        .ok_or_else(|| RPCError::MissingCredential(MISSING_API_KEY_HELP.to_string()))
}

/// Urls the transport talks to, derived from network and API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub rpc: Url,
    pub rest: Url,
    api_key: String,
}

impl Endpoints {
    /// Builds `https://{network}.g.alchemy.com/v2/{key}` and the matching NFT
    /// REST url. Custom urls take precedence over the derived ones.
    pub fn new(
        network: Network,
        api_key: &str,
        custom_url: Option<&str>,
        custom_nft_url: Option<&str>,
    ) -> Result<Self, RPCError> {
        let host = format!("https://{}.g.alchemy.com", network.url_name());
        let rpc = match custom_url {
            Some(url) => url.to_string(),
            None => format!("{host}/v2/{api_key}"),
        };
        let rest = match custom_nft_url {
            Some(url) => url.to_string(),
            None => format!("{host}/nft/v2/{api_key}"),
        };
        Ok(Self { rpc: parse_url(&rpc)?, rest: parse_url(&rest)?, api_key: api_key.to_string() })
    }

    /// Json-rpc url with the API key replaced, safe to log.
    pub fn display_rpc(&self) -> String {
        self.redact(self.rpc.as_str())
    }

    pub fn redact(&self, text: &str) -> String {
        if self.api_key.is_empty() {
            return text.to_string();
        }
        text.replace(&self.api_key, REDACTED_API_KEY)
    }

    /// `{rest}/{endpoint}`
    pub fn rest_endpoint(&self, endpoint: &str) -> Result<Url, RPCError> {
        let uri = format!(
            "{}/{}",
            self.rest
                .as_str()
                .trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        parse_url(&uri)
    }
}

fn parse_url(url: &str) -> Result<Url, RPCError> {
    url.parse::<Url>()
        .map_err(|e| RPCError::UrlParsing(url.to_string(), e.to_string()))
}
