use std::time::Duration;

use alchemy_common::{
    models::{
        token::{AssetTransfersRequest, TokenSpec},
        BlockReference,
    },
    Address, HexNumber, Network, B256,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use tracing_appender::rolling;

use crate::{config::AlchemyConfig, AlchemyClient, RPCError};

/// Alchemy CLI - query EVM chains through the Alchemy API
///
/// Every command prints a single JSON document to stdout. Logs are written to
/// the log folder.
#[derive(Parser, Debug, Clone, PartialEq)]
#[clap(name = "alchemy", version = env!("CARGO_PKG_VERSION"))]
struct CliArgs {
    /// Alchemy API key. Can be set with the ALCHEMY_API_KEY env variable or a .env file.
    #[clap(short = 'k', long, env = "ALCHEMY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Network name (eth_mainnet, matic_mumbai, ...) or chain id
    #[clap(short = 'n', long, default_value = "eth_mainnet", env = "ALCHEMY_NETWORK")]
    network: Network,

    /// How often a request is reissued after a non-2xx response
    #[clap(long, default_value = "0")]
    retries: u32,

    /// Custom JSON-RPC url, replaces the network derived one
    #[clap(long)]
    url: Option<String>,

    /// Folder the log file is written to
    #[clap(long, default_value = "logs")]
    log_folder: String,

    /// Log at debug level unless RUST_LOG says otherwise
    #[clap(short, long)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Command {
    /// Current block number
    BlockNumber,
    /// Block by number, hash or tag
    Block {
        block: BlockReference,
        /// Include full transaction objects
        #[clap(long)]
        full: bool,
    },
    /// Balance in wei
    Balance {
        address: Address,
        #[clap(long, default_value = "latest")]
        block: BlockReference,
    },
    /// Contract bytecode
    Code {
        address: Address,
        #[clap(long, default_value = "latest")]
        block: BlockReference,
    },
    /// Transaction receipt
    Receipt { hash: B256 },
    /// Deployer and deployment block of a contract
    Deployer {
        address: Address,
        /// Upper bound of the search, defaults to the chain head
        #[clap(long, value_parser = parse_block_number)]
        block: Option<u64>,
    },
    /// Asset transfers from and/or to an address
    Transfers {
        #[clap(long)]
        from: Option<Address>,
        #[clap(long)]
        to: Option<Address>,
        #[clap(long, default_value = "0", value_parser = parse_block_number)]
        from_block: u64,
        #[clap(long, value_parser = parse_block_number)]
        to_block: Option<u64>,
        /// Follow page keys until all transfers are fetched
        #[clap(long)]
        all: bool,
    },
    /// ERC-20 token balances of an address
    Tokens { address: Address },
    /// Wait until a transaction has enough confirmations
    Wait {
        hash: B256,
        #[clap(long, default_value = "1")]
        confirmations: u64,
        /// Seconds before giving up
        #[clap(long, default_value = "120")]
        timeout: u64,
        /// Milliseconds between polls
        #[clap(long, default_value = "2000")]
        interval: u64,
    },
    /// Raw json-rpc call, params given as a JSON array
    Send { method: String, params: Option<String> },
    /// Resolve a network name or chain id
    Network { network: Network },
}

fn parse_block_number(value: &str) -> Result<u64, String> {
    let number: HexNumber = value
        .parse()
        .map_err(|e: alchemy_common::HexNumberError| e.to_string())?;
    number
        .try_as_u64()
        .ok_or_else(|| format!("block number {value} exceeds u64"))
}

pub async fn run_cli() -> Result<(), String> {
    // Values from a .env file become visible to clap's env fallbacks.
    dotenvy::dotenv().ok();
    let args: CliArgs = CliArgs::parse();

    // Setup Logging
    let log_level = if args.verbose { "debug" } else { "info" };
    let (non_blocking, _guard) =
        tracing_appender::non_blocking(rolling::never(&args.log_folder, "alchemy.log"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(non_blocking)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("Failed to set up logging subscriber: {e}"))?;

    let output = run(args)
        .await
        .map_err(|e| e.to_string())?;
    let rendered = serde_json::to_string_pretty(&output)
        .map_err(|e| format!("Failed to render output: {e}"))?;
    println!("{rendered}");
    Ok(())
}

async fn run(args: CliArgs) -> Result<Value, RPCError> {
    if let Command::Network { network } = &args.command {
        return Ok(network_info(*network));
    }

    let mut config = AlchemyConfig::new()
        .with_network(args.network)
        .with_retries(args.retries);
    if let Some(api_key) = args.api_key {
        config = config.with_api_key(api_key);
    }
    if let Some(url) = args.url {
        config = config.with_url(url);
    }
    let client = AlchemyClient::new(config)?;
    info!(network = %args.network, command = ?args.command, "Running command");

    match args.command {
        Command::BlockNumber => Ok(json!(client.get_block_number().await?)),
        Command::Block { block, full } => {
            let block = if full {
                client
                    .get_block_with_transactions(block)
                    .await?
            } else {
                client.get_block(block).await?
            };
            to_output(block)
        }
        Command::Balance { address, block } => {
            let balance = client
                .get_balance(address, block)
                .await?;
            Ok(json!({ "address": address, "wei": balance.to_string() }))
        }
        Command::Code { address, block } => to_output(client.get_code(address, block).await?),
        Command::Receipt { hash } => to_output(
            client
                .get_transaction_receipt(hash)
                .await?,
        ),
        Command::Deployer { address, block } => {
            let deployment =
                crate::deployer::find_contract_deployer(&client, address, block).await?;
            to_output(deployment)
        }
        Command::Transfers { from, to, from_block, to_block, all } => {
            let mut request = AssetTransfersRequest::new().from_block(from_block);
            request.from_address = from;
            request.to_address = to;
            request.to_block = to_block;
            if all {
                to_output(
                    client
                        .get_all_asset_transfers(&request)
                        .await?,
                )
            } else {
                to_output(
                    client
                        .get_asset_transfers(&request)
                        .await?,
                )
            }
        }
        Command::Tokens { address } => to_output(
            client
                .get_token_balances(address, &TokenSpec::Erc20, None)
                .await?,
        ),
        Command::Wait { hash, confirmations, timeout, interval } => to_output(
            client
                .wait_for_transaction(
                    hash,
                    confirmations,
                    Duration::from_secs(timeout),
                    Duration::from_millis(interval),
                )
                .await?,
        ),
        Command::Send { method, params } => {
            let params = parse_params(params.as_deref())?;
            debug!(%method, ?params, "Sending raw request");
            client.send(&method, params).await
        }
        Command::Network { network } => Ok(network_info(network)),
    }
}

fn network_info(network: Network) -> Value {
    json!({
        "name": network.name(),
        "chainId": network.chain_id(),
        "url": format!("https://{}.g.alchemy.com/v2/", network.url_name()),
    })
}

/// A JSON array is passed through, any other JSON value becomes the single
/// parameter.
fn parse_params(raw: Option<&str>) -> Result<Vec<Value>, RPCError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| RPCError::InvalidArgument(format!("params are not valid JSON: {e}")))?;
    Ok(match value {
        Value::Array(params) => params,
        other => vec![other],
    })
}

fn to_output<T: Serialize>(value: T) -> Result<Value, RPCError> {
    serde_json::to_value(value)
        .map_err(|e| RPCError::FormatRequest(format!("Failed to encode output: {e}")))
}
