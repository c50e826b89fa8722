//! Alchemy specific json-rpc methods and helpers composed from several calls.
use std::collections::BTreeMap;

use alchemy_common::{
    models::{
        blockchain::{FeeData, FeeHistory, TransactionReceipt},
        token::{
            AssetTransfer, AssetTransfersPage, AssetTransfersRequest, TokenBalances,
            TokenMetadata, TokenSpec, MAX_TOKEN_ADDRESSES,
        },
        BlockReference, ContractDeployment,
    },
    Address, HexNumber, U256,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

use crate::{
    client::AlchemyClient,
    deployer,
    pagination::{collect_all, Page},
    rpc::RPCError,
};

#[derive(Debug, Deserialize)]
struct ReceiptsResult {
    #[serde(default)]
    receipts: Option<Vec<TransactionReceipt>>,
}

impl AlchemyClient {
    /// All receipts of one block in a single call.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_transaction_receipts(
        &self,
        block: BlockReference,
    ) -> Result<Vec<TransactionReceipt>, RPCError> {
        let selector = match block {
            BlockReference::Hash(hash) => json!({ "blockHash": hash }),
            other => json!({ "blockNumber": other.to_param() }),
        };
        let result: Option<ReceiptsResult> = self
            .enhanced_request(
                "alchemy_getTransactionReceipts",
                vec![selector],
                "getTransactionReceipts",
            )
            .await?;
        let receipts = result
            .and_then(|result| result.receipts)
            .unwrap_or_default();
        debug!(count = receipts.len(), "Fetched block receipts");
        Ok(receipts)
    }

    /// One page of asset transfers. An unset `to_block` is resolved to the
    /// current block first.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_asset_transfers(
        &self,
        request: &AssetTransfersRequest,
    ) -> Result<AssetTransfersPage, RPCError> {
        let mut request = request.clone();
        if request.to_block.is_none() {
            request.to_block = Some(self.get_block_number().await?);
        }
        self.enhanced_request(
            "alchemy_getAssetTransfers",
            vec![request.to_param()],
            "getAssetTransfers",
        )
        .await
    }

    /// Follows page keys until every transfer matching `request` is fetched.
    ///
    /// The block range is fixed before the first page so that all pages
    /// describe the same range.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_all_asset_transfers(
        &self,
        request: &AssetTransfersRequest,
    ) -> Result<Vec<AssetTransfer>, RPCError> {
        let mut base = request.clone();
        if base.to_block.is_none() {
            base.to_block = Some(self.get_block_number().await?);
        }
        let base = &base;
        collect_all(|page_key| async move {
            let mut request = base.clone();
            request.page_key = page_key;
            let page = self
                .get_asset_transfers(&request)
                .await?;
            Ok::<_, RPCError>(Page::new(page.transfers, page.page_key))
        })
        .await
    }

    /// ERC-20 balances of `owner`. Explicit contract lists must hold between 1
    /// and 1500 addresses; the page key only applies to `erc20` and
    /// `DEFAULT_TOKENS` queries.
    #[instrument(level = "debug", skip(self, tokens))]
    pub async fn get_token_balances(
        &self,
        owner: Address,
        tokens: &TokenSpec,
        page_key: Option<String>,
    ) -> Result<TokenBalances, RPCError> {
        let mut params = vec![json!(owner), tokens.to_param()];
        match tokens {
            TokenSpec::Contracts(addresses) if addresses.is_empty() => {
                return Err(RPCError::InvalidArgument("No token addresses".to_string()))
            }
            TokenSpec::Contracts(addresses) if addresses.len() > MAX_TOKEN_ADDRESSES => {
                return Err(RPCError::InvalidArgument(format!(
                    "Too many token addresses: {}, at most {MAX_TOKEN_ADDRESSES} are allowed",
                    addresses.len()
                )))
            }
            TokenSpec::Contracts(_) => {}
            TokenSpec::Erc20 | TokenSpec::DefaultTokens => {
                let mut options = Map::new();
                if let Some(page_key) = page_key {
                    options.insert("pageKey".into(), json!(page_key));
                }
                params.push(Value::Object(options));
            }
        }
        self.enhanced_request("alchemy_getTokenBalances", params, "getTokenBalances")
            .await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_token_metadata(&self, token: Address) -> Result<TokenMetadata, RPCError> {
        self.enhanced_request("alchemy_getTokenMetadata", vec![json!(token)], "getTokenMetadata")
            .await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_max_priority_fee_per_gas(&self) -> Result<U256, RPCError> {
        self.request("eth_maxPriorityFeePerGas", vec![])
            .await
    }

    /// `newest_block` must be a number or a tag.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_fee_history(
        &self,
        block_count: u64,
        newest_block: BlockReference,
        reward_percentiles: Option<&[f64]>,
    ) -> Result<FeeHistory, RPCError> {
        if let BlockReference::Hash(hash) = newest_block {
            return Err(RPCError::InvalidArgument(format!(
                "eth_feeHistory expects a block number or tag, got hash {hash}"
            )));
        }
        let mut params = vec![json!(HexNumber::from(block_count)), newest_block.to_param()];
        if let Some(percentiles) = reward_percentiles {
            params.push(json!(percentiles));
        }
        self.request("eth_feeHistory", params)
            .await
    }

    /// Base fee of the latest block.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_base_fee_per_gas(&self) -> Result<U256, RPCError> {
        let history = self
            .get_fee_history(1, BlockReference::latest(), None)
            .await?;
        history
            .base_fee_per_gas
            .first()
            .copied()
            .ok_or_else(|| {
                RPCError::ParseResponse("eth_feeHistory returned no baseFeePerGas".to_string())
            })
    }

    /// Base fee plus the suggested priority fee.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_max_fee_per_gas(&self) -> Result<U256, RPCError> {
        let base_fee = self.get_base_fee_per_gas().await?;
        let priority_fee = self
            .get_max_priority_fee_per_gas()
            .await?;
        Ok(base_fee.saturating_add(priority_fee))
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_fee_data(&self) -> Result<FeeData, RPCError> {
        let max_fee_per_gas = self.get_max_fee_per_gas().await?;
        let max_priority_fee_per_gas = self
            .get_max_priority_fee_per_gas()
            .await?;
        let gas_price = self.gas_price().await?;
        Ok(FeeData { max_fee_per_gas, max_priority_fee_per_gas, gas_price })
    }

    /// Timestamps of the given blocks, one `eth_getBlockByNumber` per block.
    #[instrument(level = "debug", skip(self, blocks))]
    pub async fn get_datetime_of_blocks(
        &self,
        blocks: impl IntoIterator<Item = u64>,
    ) -> Result<BTreeMap<u64, DateTime<Utc>>, RPCError> {
        let mut result = BTreeMap::new();
        for number in blocks {
            let block = self
                .get_block(BlockReference::Number(number))
                .await?;
            let datetime = block.datetime().ok_or_else(|| {
                RPCError::ParseResponse(format!(
                    "Block {} has an out of range timestamp {}",
                    block.number, block.timestamp
                ))
            })?;
            result.insert(block.number, datetime);
        }
        Ok(result)
    }

    /// Deployer and deployment block of `address`.
    #[instrument(level = "debug", skip(self))]
    pub async fn find_contract_deployer(
        &self,
        address: Address,
    ) -> Result<ContractDeployment, RPCError> {
        deployer::find_contract_deployer(self, address, None).await
    }

    /// First block in `[from, to]` at which `address` has code.
    #[instrument(level = "debug", skip(self))]
    pub async fn binary_search_first_block(
        &self,
        address: Address,
        from: u64,
        to: u64,
    ) -> Result<u64, RPCError> {
        deployer::binary_search_first_block(self, address, from, to).await
    }
}

#[cfg(test)]
mod tests {
    use alchemy_common::{models::token::AssetTransferCategory, B256};
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{client::tests::test_client, rpc::SDK_METHOD_HEADER};

    fn rpc_result(result: Value) -> String {
        json!({"jsonrpc": "2.0", "id": 0, "result": result}).to_string()
    }

    fn transfer(block: u64, id: &str) -> Value {
        json!({
            "blockNum": HexNumber::from(block),
            "uniqueId": id,
            "hash": B256::repeat_byte(0x01),
            "from": Address::with_last_byte(1),
            "to": Address::with_last_byte(2),
            "value": 1.0,
            "asset": "ETH",
            "category": "external",
            "rawContract": {}
        })
    }

    #[tokio::test]
    async fn test_get_transaction_receipts_by_number() {
        let mut server = Server::new_async().await;
        let mocked = server
            .mock("POST", "/")
            .match_header(SDK_METHOD_HEADER, "getTransactionReceipts")
            .match_body(Matcher::PartialJson(json!({
                "method": "alchemy_getTransactionReceipts",
                "params": [{"blockNumber": "0x64"}]
            })))
            .expect(1)
            .with_body(rpc_result(json!({
                "receipts": [{
                    "transactionHash": B256::repeat_byte(0x09),
                    "blockNumber": "0x64",
                    "from": Address::with_last_byte(7),
                    "contractAddress": Address::with_last_byte(8)
                }]
            })))
            .create_async()
            .await;
        let client = test_client(&server);

        let receipts = client
            .get_transaction_receipts(BlockReference::number(100))
            .await
            .expect("receipts");

        mocked.assert();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].contract_address, Some(Address::with_last_byte(8)));
    }

    #[tokio::test]
    async fn test_null_receipts_are_empty() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_body(rpc_result(json!({"receipts": null})))
            .create_async()
            .await;
        let client = test_client(&server);

        let receipts = client
            .get_transaction_receipts(BlockReference::hash(B256::ZERO))
            .await
            .expect("receipts");

        assert!(receipts.is_empty());
    }

    #[tokio::test]
    async fn test_asset_transfers_default_to_current_block() {
        let mut server = Server::new_async().await;
        let block_number = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "eth_blockNumber"})))
            .expect(1)
            .with_body(rpc_result(json!("0xc8")))
            .create_async()
            .await;
        let transfers = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "alchemy_getAssetTransfers",
                "params": [{
                    "fromBlock": "0x0",
                    "toBlock": "0xc8",
                    "maxCount": "0x3e8",
                    "excludeZeroValue": false,
                    "category": ["external", "internal", "erc20", "erc721", "specialnft"]
                }]
            })))
            .expect(1)
            .with_body(rpc_result(json!({"transfers": [transfer(5, "a")]})))
            .create_async()
            .await;
        let client = test_client(&server);

        let page = client
            .get_asset_transfers(&AssetTransfersRequest::new())
            .await
            .expect("transfers");

        block_number.assert();
        transfers.assert();
        assert_eq!(page.transfers.len(), 1);
        assert_eq!(page.page_key, None);
    }

    #[tokio::test]
    async fn test_missing_transfers_is_parse_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_body(rpc_result(json!({"pageKey": "x"})))
            .create_async()
            .await;
        let client = test_client(&server);

        let err = client
            .get_asset_transfers(&AssetTransfersRequest::new().to_block(10))
            .await
            .unwrap_err();

        assert!(matches!(err, RPCError::ParseResponse(_)));
    }

    #[tokio::test]
    async fn test_get_all_asset_transfers_follows_page_keys() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "alchemy_getAssetTransfers",
                "params": [{"toBlock": "0x10", "category": ["erc20"]}]
            })))
            .expect(1)
            .with_body(rpc_result(json!({
                "transfers": [transfer(1, "a"), transfer(2, "b")],
                "pageKey": "page-2"
            })))
            .create_async()
            .await;
        let second = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "alchemy_getAssetTransfers",
                "params": [{"pageKey": "page-2"}]
            })))
            .expect(1)
            .with_body(rpc_result(json!({"transfers": [transfer(3, "c")]})))
            .create_async()
            .await;
        let client = test_client(&server);

        let request = AssetTransfersRequest::new()
            .to_block(16)
            .category(vec![AssetTransferCategory::Erc20]);
        let transfers = client
            .get_all_asset_transfers(&request)
            .await
            .expect("all transfers");

        first.assert();
        second.assert();
        let ids: Vec<_> = transfers
            .iter()
            .map(|t| t.unique_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_token_balances_validates_address_count() {
        let server = Server::new_async().await;
        let client = test_client(&server);
        let owner = Address::with_last_byte(1);

        let empty = client
            .get_token_balances(owner, &TokenSpec::Contracts(vec![]), None)
            .await
            .unwrap_err();
        let too_many = client
            .get_token_balances(
                owner,
                &TokenSpec::Contracts(vec![Address::ZERO; MAX_TOKEN_ADDRESSES + 1]),
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(empty, RPCError::InvalidArgument(_)));
        assert!(matches!(too_many, RPCError::InvalidArgument(_)));
        assert_eq!(client.call_id(), 0);
    }

    #[tokio::test]
    async fn test_token_balances_erc20_with_page_key() {
        let mut server = Server::new_async().await;
        let owner = Address::with_last_byte(1);
        let mocked = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "alchemy_getTokenBalances",
                "params": [owner, "erc20", {"pageKey": "k"}]
            })))
            .expect(1)
            .with_body(rpc_result(json!({
                "address": owner,
                "tokenBalances": [{
                    "contractAddress": Address::with_last_byte(5),
                    "tokenBalance": "0x00000000000000000000000000000000000000000000000000000000000003e8"
                }]
            })))
            .create_async()
            .await;
        let client = test_client(&server);

        let balances = client
            .get_token_balances(owner, &TokenSpec::Erc20, Some("k".to_string()))
            .await
            .expect("balances");

        mocked.assert();
        assert_eq!(balances.token_balances[0].token_balance, Some(U256::from(1000u64)));
    }

    #[tokio::test]
    async fn test_max_fee_is_base_plus_priority() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "eth_feeHistory",
                "params": ["0x1", "latest"]
            })))
            .with_body(rpc_result(json!({
                "oldestBlock": "0x10",
                "baseFeePerGas": ["0x64", "0x6e"],
                "gasUsedRatio": [0.5]
            })))
            .create_async()
            .await;
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "eth_maxPriorityFeePerGas"})))
            .with_body(rpc_result(json!("0xa")))
            .create_async()
            .await;
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "eth_gasPrice"})))
            .with_body(rpc_result(json!("0x78")))
            .create_async()
            .await;
        let client = test_client(&server);

        let fee_data = client
            .get_fee_data()
            .await
            .expect("fee data");

        assert_eq!(
            fee_data,
            FeeData {
                max_fee_per_gas: U256::from(110u64),
                max_priority_fee_per_gas: U256::from(10u64),
                gas_price: U256::from(120u64),
            }
        );
    }

    #[tokio::test]
    async fn test_get_datetime_of_blocks() {
        let mut server = Server::new_async().await;
        for (number, timestamp) in [(1u64, 1_600_000_000u64), (2, 1_600_000_012)] {
            server
                .mock("POST", "/")
                .match_body(Matcher::PartialJson(json!({
                    "method": "eth_getBlockByNumber",
                    "params": [HexNumber::from(number), false]
                })))
                .with_body(rpc_result(json!({
                    "number": HexNumber::from(number),
                    "timestamp": HexNumber::from(timestamp)
                })))
                .create_async()
                .await;
        }
        let client = test_client(&server);

        let datetimes = client
            .get_datetime_of_blocks(1..=2)
            .await
            .expect("datetimes");

        assert_eq!(datetimes.len(), 2);
        assert_eq!(datetimes[&1].timestamp(), 1_600_000_000);
        assert_eq!(datetimes[&2].timestamp(), 1_600_000_012);
    }
}
