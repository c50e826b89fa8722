//! # JSON-RPC transport
//!
//! Sends JSON-RPC 2.0 envelopes (and the occasional REST request) to an
//! Alchemy endpoint. Non-2xx responses are reissued a configurable number of
//! times without delay; every other failure is surfaced immediately.
use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use alchemy_common::{HexNumberError, NetworkError};
use backoff::backoff::Backoff;
use reqwest::{header, Client, ClientBuilder, Proxy, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::config::Endpoints;

/// Header carrying the name of the enhanced SDK method that issued a call.
pub const SDK_METHOD_HEADER: &str = "Alchemy-Rust-Sdk-Method";

#[derive(Error, Debug)]
pub enum RPCError {
    #[error("Missing API key: {0}")]
    MissingCredential(String),
    #[error(transparent)]
    InvalidNetwork(#[from] NetworkError),
    #[error(transparent)]
    InvalidNumericFormat(#[from] HexNumberError),
    #[error("Failed to parse URL: {0}. Error: {1}")]
    UrlParsing(String, String),
    #[error("Failed to format request: {0}")]
    FormatRequest(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Unexpected HTTP client error: {0}")]
    HttpClient(String, #[source] reqwest::Error),
    #[error("Status {status} when querying \"{url}\" with payload {payload}:\n >>> Response with Error: {body}")]
    Transport { url: String, payload: String, status: u16, body: String },
    #[error("Failed to parse response: {0}")]
    ParseResponse(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Contract not found at {address}: {reason}")]
    ContractNotFound { address: String, reason: String },
    #[error("Transaction {tx_hash} did not reach {confirmations} confirmations within {timeout:?}")]
    TimeoutExceeded { tx_hash: String, timeout: Duration, confirmations: u64 },
}

impl RPCError {
    /// Only upstream non-success statuses are worth reissuing.
    pub fn should_retry(&self) -> bool {
        match self {
            RPCError::Transport { status, .. } => !StatusCode::from_u16(*status)
                .map(|status| status.is_success())
                .unwrap_or(false),
            _ => false,
        }
    }

    fn into_backoff(self) -> backoff::Error<RPCError> {
        if self.should_retry() {
            backoff::Error::transient(self)
        } else {
            backoff::Error::permanent(self)
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    id: u64,
    jsonrpc: &'static str,
    method: &'a str,
    params: &'a [Value],
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<Value>,
}

/// Reissues a request a fixed number of times without waiting in between.
#[derive(Debug, Clone)]
struct FixedRetries {
    max: u32,
    remaining: u32,
}

impl FixedRetries {
    fn new(max: u32) -> Self {
        Self { max, remaining: max }
    }
}

impl Backoff for FixedRetries {
    fn reset(&mut self) {
        self.remaining = self.max;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(Duration::ZERO)
    }
}

/// Configuration options for HttpRPCClient
#[derive(Debug, Clone, Default)]
pub struct HttpRPCClientOptions {
    /// Retries after a non-2xx response (default: 0)
    pub retries: u32,
    /// Proxy urls keyed by scheme: `http`, `https` or `all`
    pub proxies: HashMap<String, String>,
}

impl HttpRPCClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_proxies(mut self, proxies: HashMap<String, String>) -> Self {
        self.proxies = proxies;
        self
    }
}

#[derive(Debug)]
pub struct HttpRPCClient {
    http_client: Client,
    endpoints: Endpoints,
    retries: u32,
    next_id: AtomicU64,
}

impl HttpRPCClient {
    pub fn new(endpoints: Endpoints, options: HttpRPCClientOptions) -> Result<Self, RPCError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
        let user_agent = format!("alchemy-client-{version}", version = env!("CARGO_PKG_VERSION"));
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_str(&user_agent)
                .map_err(|e| RPCError::FormatRequest(format!("Invalid user agent format: {e}")))?,
        );

        let mut builder = ClientBuilder::new().default_headers(headers);
        for (scheme, url) in &options.proxies {
            let proxy = match scheme.to_lowercase().as_str() {
                "http" => Proxy::http(url),
                "https" => Proxy::https(url),
                "all" => Proxy::all(url),
                other => {
                    return Err(RPCError::InvalidArgument(format!(
                        "Unsupported proxy scheme {other}, expected http, https or all"
                    )))
                }
            }
            .map_err(|e| RPCError::HttpClient(format!("Invalid proxy {url}: {e}"), e))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| RPCError::HttpClient(e.to_string(), e))?;
        Ok(Self {
            http_client: client,
            endpoints,
            retries: options.retries,
            next_id: AtomicU64::new(0),
        })
    }

    /// Id the next json-rpc request will carry.
    pub fn current_id(&self) -> u64 {
        self.next_id.load(Ordering::SeqCst)
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub(crate) fn set_endpoints(&mut self, endpoints: Endpoints) {
        self.endpoints = endpoints;
    }

    /// Executes a json-rpc call and returns its `result`.
    ///
    /// A missing or `null` result is returned as [`Value::Null`]; interpreting
    /// it is up to the caller. The request id only advances on success.
    pub async fn call(
        &self,
        method: &str,
        params: Vec<Value>,
        sdk_method: Option<&str>,
    ) -> Result<Value, RPCError> {
        let request = JsonRpcRequest {
            id: self.current_id(),
            jsonrpc: "2.0",
            method,
            params: &params,
        };
        let payload = serde_json::to_string(&request)
            .map_err(|e| RPCError::FormatRequest(format!("Failed to encode {method}: {e}")))?;
        let display_url = self.endpoints.display_rpc();
        debug!(url = %display_url, method, "Sending json-rpc request");
        trace!(%payload, "Json-rpc payload");

        let (status, body) = self
            .send_with_retry(&payload, &display_url, || {
                let builder = self
                    .http_client
                    .post(self.endpoints.rpc.clone())
                    .body(payload.clone());
                match sdk_method {
                    Some(name) => builder.header(SDK_METHOD_HEADER, name),
                    None => builder,
                }
            })
            .await?;

        let response = serde_json::from_str::<JsonRpcResponse>(&body)
            .map_err(|err| RPCError::ParseResponse(format!("Error: {err}, Body: {body}")))?;
        if response
            .error
            .as_ref()
            .is_some_and(|error| !error.is_null())
        {
            warn!(method, status = status.as_u16(), "Json-rpc call returned an error");
            return Err(RPCError::Transport {
                url: display_url,
                payload: self.endpoints.redact(&payload),
                status: status.as_u16(),
                body,
            });
        }

        self.next_id
            .fetch_add(1, Ordering::SeqCst);
        trace!(result = %response.result, "Received json-rpc result");
        Ok(response.result)
    }

    /// Issues a GET against the REST api, e.g. `getNFTs`, and returns the
    /// decoded json body.
    pub async fn get(&self, endpoint: &str, query: &[(String, String)]) -> Result<Value, RPCError> {
        let url = self
            .endpoints
            .rest_endpoint(endpoint)?;
        let display_url = self.endpoints.redact(url.as_str());
        let payload = serde_json::to_string(query)
            .map_err(|e| RPCError::FormatRequest(format!("Failed to encode query: {e}")))?;
        debug!(url = %display_url, "Sending rest request");

        let (_, body) = self
            .send_with_retry(&payload, &display_url, || {
                self.http_client
                    .get(url.clone())
                    .query(query)
            })
            .await?;

        serde_json::from_str::<Value>(&body)
            .map_err(|err| RPCError::ParseResponse(format!("Error: {err}, Body: {body}")))
    }

    /// Sends the request built by `make_request`, reissuing it after non-2xx
    /// responses until the retry budget is exhausted.
    async fn send_with_retry<F>(
        &self,
        payload: &str,
        display_url: &str,
        make_request: F,
    ) -> Result<(StatusCode, String), RPCError>
    where
        F: Fn() -> RequestBuilder,
    {
        backoff::future::retry(FixedRetries::new(self.retries), || async {
            let response = make_request()
                .send()
                .await
                .map_err(|e| {
                    RPCError::HttpClient(self.endpoints.redact(&e.to_string()), e).into_backoff()
                })?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| {
                    RPCError::HttpClient(self.endpoints.redact(&e.to_string()), e).into_backoff()
                })?;

            if !status.is_success() {
                warn!(url = %display_url, status = status.as_u16(), "Request failed");
                return Err(RPCError::Transport {
                    url: display_url.to_string(),
                    payload: self.endpoints.redact(payload),
                    status: status.as_u16(),
                    body,
                }
                .into_backoff());
            }
            Ok((status, body))
        })
        .await
    }
}
