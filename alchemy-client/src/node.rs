//! Standard EVM json-rpc methods.
use alchemy_common::{
    models::{
        blockchain::{
            Block, CallRequest, Log, LogFilter, SyncStatus, Transaction, TransactionReceipt,
        },
        BlockReference,
    },
    Address, Bytes, HexNumber, B256, U256,
};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::{client::AlchemyClient, rpc::RPCError};

impl AlchemyClient {
    /// Executes a message call without creating a transaction (`eth_call`).
    #[instrument(level = "debug", skip(self, request))]
    pub async fn call(
        &self,
        request: &CallRequest,
        block: BlockReference,
    ) -> Result<Bytes, RPCError> {
        self.request("eth_call", vec![json!(request), block.to_param()])
            .await
    }

    #[instrument(level = "debug", skip(self, request))]
    pub async fn estimate_gas(&self, request: &CallRequest) -> Result<U256, RPCError> {
        self.request("eth_estimateGas", vec![json!(request)])
            .await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_block_number(&self) -> Result<u64, RPCError> {
        let block_number = self
            .request_u64("eth_blockNumber", vec![])
            .await?;
        debug!(block_number, "Fetched current block number");
        Ok(block_number)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_balance(
        &self,
        address: Address,
        block: BlockReference,
    ) -> Result<U256, RPCError> {
        self.request("eth_getBalance", vec![json!(address), block.to_param()])
            .await
    }

    /// Bytecode at `address`; empty if no contract lives there.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_code(
        &self,
        address: Address,
        block: BlockReference,
    ) -> Result<Bytes, RPCError> {
        self.request("eth_getCode", vec![json!(address), block.to_param()])
            .await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_transaction_count(
        &self,
        address: Address,
        block: BlockReference,
    ) -> Result<u64, RPCError> {
        self.request_u64("eth_getTransactionCount", vec![json!(address), block.to_param()])
            .await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_storage_at(
        &self,
        address: Address,
        slot: U256,
        block: BlockReference,
    ) -> Result<B256, RPCError> {
        let slot = HexNumber::from(slot);
        self.request("eth_getStorageAt", vec![json!(address), json!(slot), block.to_param()])
            .await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_block_transaction_count(
        &self,
        block: BlockReference,
    ) -> Result<u64, RPCError> {
        match block {
            BlockReference::Hash(hash) => {
                self.request_u64("eth_getBlockTransactionCountByHash", vec![json!(hash)])
                    .await
            }
            other => {
                self.request_u64("eth_getBlockTransactionCountByNumber", vec![other.to_param()])
                    .await
            }
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_uncle_count(&self, block: BlockReference) -> Result<u64, RPCError> {
        match block {
            BlockReference::Hash(hash) => {
                self.request_u64("eth_getUncleCountByBlockHash", vec![json!(hash)])
                    .await
            }
            other => {
                self.request_u64("eth_getUncleCountByBlockNumber", vec![other.to_param()])
                    .await
            }
        }
    }

    /// Block header with transaction hashes.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_block(&self, block: BlockReference) -> Result<Block, RPCError> {
        self.fetch_block(block, false)
            .await
    }

    /// Block header with full transaction objects.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_block_with_transactions(
        &self,
        block: BlockReference,
    ) -> Result<Block, RPCError> {
        self.fetch_block(block, true)
            .await
    }

    /// Resolves the current block number first, then fetches that block.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_current_block(&self) -> Result<Block, RPCError> {
        let number = self.get_block_number().await?;
        self.get_block(BlockReference::Number(number))
            .await
    }

    async fn fetch_block(&self, block: BlockReference, full: bool) -> Result<Block, RPCError> {
        let (method, params) = match block {
            BlockReference::Hash(hash) => ("eth_getBlockByHash", vec![json!(hash), json!(full)]),
            other => ("eth_getBlockByNumber", vec![other.to_param(), json!(full)]),
        };
        self.request_required(method, params, "block")
            .await
    }

    /// `None` if the node does not know the transaction.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_transaction(&self, hash: B256) -> Result<Option<Transaction>, RPCError> {
        self.request("eth_getTransactionByHash", vec![json!(hash)])
            .await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_transaction_by_block_and_index(
        &self,
        block: BlockReference,
        index: u64,
    ) -> Result<Option<Transaction>, RPCError> {
        let index = json!(HexNumber::from(index));
        match block {
            BlockReference::Hash(hash) => {
                self.request("eth_getTransactionByBlockHashAndIndex", vec![json!(hash), index])
                    .await
            }
            other => {
                self.request("eth_getTransactionByBlockNumberAndIndex", vec![other.to_param(), index])
                    .await
            }
        }
    }

    /// `None` while the transaction is pending or unknown.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, RPCError> {
        self.request("eth_getTransactionReceipt", vec![json!(hash)])
            .await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_uncle_by_block_and_index(
        &self,
        block: BlockReference,
        index: u64,
    ) -> Result<Option<Block>, RPCError> {
        let index = json!(HexNumber::from(index));
        match block {
            BlockReference::Hash(hash) => {
                self.request("eth_getUncleByBlockHashAndIndex", vec![json!(hash), index])
                    .await
            }
            other => {
                self.request("eth_getUncleByBlockNumberAndIndex", vec![other.to_param(), index])
                    .await
            }
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn client_version(&self) -> Result<String, RPCError> {
        self.request("web3_clientVersion", vec![])
            .await
    }

    /// Keccak-256 of `data` as computed by the node (`web3_sha3`).
    #[instrument(level = "debug", skip(self, data))]
    pub async fn sha3(&self, data: &Bytes) -> Result<B256, RPCError> {
        self.request("web3_sha3", vec![json!(data)])
            .await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn net_version(&self) -> Result<String, RPCError> {
        self.request("net_version", vec![])
            .await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn net_listening(&self) -> Result<bool, RPCError> {
        self.request("net_listening", vec![])
            .await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn protocol_version(&self) -> Result<String, RPCError> {
        let version: Value = self
            .request("eth_protocolVersion", vec![])
            .await?;
        Ok(match version {
            Value::String(version) => version,
            other => other.to_string(),
        })
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn syncing(&self) -> Result<SyncStatus, RPCError> {
        self.request("eth_syncing", vec![])
            .await
    }

    /// Legacy gas price in wei.
    #[instrument(level = "debug", skip(self))]
    pub async fn gas_price(&self) -> Result<U256, RPCError> {
        self.request("eth_gasPrice", vec![])
            .await
    }

    #[instrument(level = "debug", skip(self, filter))]
    pub async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>, RPCError> {
        let logs: Vec<Log> = self
            .request("eth_getLogs", vec![filter.to_param()])
            .await?;
        debug!(count = logs.len(), "Fetched logs");
        Ok(logs)
    }

    /// Broadcasts a signed transaction and returns its hash. The transaction is
    /// neither validated nor tracked afterwards.
    #[instrument(level = "debug", skip(self, raw_transaction))]
    pub async fn send_raw_transaction(&self, raw_transaction: &Bytes) -> Result<B256, RPCError> {
        self.request("eth_sendRawTransaction", vec![json!(raw_transaction)])
            .await
    }
}

#[cfg(test)]
mod tests {
    use alchemy_common::models::blockchain::BlockTransactions;
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::client::tests::test_client;

    fn rpc_result(result: Value) -> String {
        json!({"jsonrpc": "2.0", "id": 0, "result": result}).to_string()
    }

    #[tokio::test]
    async fn test_get_block_number() {
        let mut server = Server::new_async().await;
        let mocked = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "eth_blockNumber"})))
            .expect(1)
            .with_body(rpc_result(json!("0x1234")))
            .create_async()
            .await;
        let client = test_client(&server);

        let block_number = client
            .get_block_number()
            .await
            .expect("block number");

        mocked.assert();
        assert_eq!(block_number, 0x1234);
    }

    #[tokio::test]
    async fn test_get_code_with_block_hash_uses_eip1898() {
        let mut server = Server::new_async().await;
        let address = Address::with_last_byte(0x42);
        let hash = B256::repeat_byte(0x07);
        let mocked = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "eth_getCode",
                "params": [address, {"blockHash": hash}]
            })))
            .expect(1)
            .with_body(rpc_result(json!("0x6080")))
            .create_async()
            .await;
        let client = test_client(&server);

        let code = client
            .get_code(address, BlockReference::hash(hash))
            .await
            .expect("code");

        mocked.assert();
        assert_eq!(code, Bytes::from(vec![0x60, 0x80]));
    }

    #[tokio::test]
    async fn test_get_balance() {
        let mut server = Server::new_async().await;
        let address = Address::with_last_byte(1);
        let mocked = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "eth_getBalance",
                "params": [address, "0x64"]
            })))
            .expect(1)
            .with_body(rpc_result(json!("0xde0b6b3a7640000")))
            .create_async()
            .await;
        let client = test_client(&server);

        let balance = client
            .get_balance(address, BlockReference::number(100))
            .await
            .expect("balance");

        mocked.assert();
        assert_eq!(balance, U256::from(1_000_000_000_000_000_000u64));
    }

    #[tokio::test]
    async fn test_get_block_by_hash_routes_to_by_hash() {
        let mut server = Server::new_async().await;
        let hash = B256::repeat_byte(0x0a);
        let mocked = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "eth_getBlockByHash",
                "params": [hash, false]
            })))
            .expect(1)
            .with_body(rpc_result(json!({
                "number": "0x10",
                "hash": hash,
                "timestamp": "0x64",
                "transactions": []
            })))
            .create_async()
            .await;
        let client = test_client(&server);

        let block = client
            .get_block(BlockReference::hash(hash))
            .await
            .expect("block");

        mocked.assert();
        assert_eq!(block.number, 16);
        assert_eq!(block.hash, Some(hash));
        assert_eq!(block.transactions, BlockTransactions::Hashes(vec![]));
    }

    #[tokio::test]
    async fn test_missing_block_is_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .with_body(rpc_result(Value::Null))
            .create_async()
            .await;
        let client = test_client(&server);

        let err = client
            .get_block(BlockReference::number(u64::MAX))
            .await
            .unwrap_err();

        assert!(matches!(err, RPCError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_current_block() {
        let mut server = Server::new_async().await;
        let number_mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "eth_blockNumber"})))
            .expect(1)
            .with_body(rpc_result(json!("0x20")))
            .create_async()
            .await;
        let block_mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "eth_getBlockByNumber",
                "params": ["0x20", false]
            })))
            .expect(1)
            .with_body(rpc_result(json!({"number": "0x20", "timestamp": "0x1"})))
            .create_async()
            .await;
        let client = test_client(&server);

        let block = client
            .get_current_block()
            .await
            .expect("current block");

        number_mock.assert();
        block_mock.assert();
        assert_eq!(block.number, 32);
    }

    #[tokio::test]
    async fn test_pending_receipt_is_none() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "eth_getTransactionReceipt"})))
            .with_body(rpc_result(Value::Null))
            .create_async()
            .await;
        let client = test_client(&server);

        let receipt = client
            .get_transaction_receipt(B256::ZERO)
            .await
            .expect("receipt call");

        assert_eq!(receipt, None);
    }

    #[tokio::test]
    async fn test_transaction_count_by_tag() {
        let mut server = Server::new_async().await;
        let mocked = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "eth_getBlockTransactionCountByNumber",
                "params": ["pending"]
            })))
            .expect(1)
            .with_body(rpc_result(json!("0x3")))
            .create_async()
            .await;
        let client = test_client(&server);

        let count = client
            .get_block_transaction_count(BlockReference::tag(
                alchemy_common::models::BlockTag::Pending,
            ))
            .await
            .expect("count");

        mocked.assert();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_sha3_and_syncing() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "web3_sha3", "params": ["0x68656c6c6f"]})))
            .with_body(rpc_result(json!(format!("0x{}", "1c".repeat(32)))))
            .create_async()
            .await;
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "eth_syncing"})))
            .with_body(rpc_result(json!(false)))
            .create_async()
            .await;
        let client = test_client(&server);

        let hash = client
            .sha3(&Bytes::from(b"hello".to_vec()))
            .await
            .expect("sha3");
        let syncing = client
            .syncing()
            .await
            .expect("syncing");

        assert_eq!(hash, B256::repeat_byte(0x1c));
        assert!(!syncing.is_syncing());
    }

    #[tokio::test]
    async fn test_send_raw_passthrough() {
        let mut server = Server::new_async().await;
        let mocked = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({"method": "eth_chainId", "params": []})))
            .expect(1)
            .with_body(rpc_result(json!("0x1")))
            .create_async()
            .await;
        let client = test_client(&server);

        let result = client
            .send("eth_chainId", vec![])
            .await
            .expect("send");

        mocked.assert();
        assert_eq!(result, json!("0x1"));
    }
}
