//! # Contract deployment locator
//!
//! Finds the block in which a contract was created, and by whom, using only
//! archive-node queries. Contract code is assumed to stay non-empty once
//! deployed, which lets a binary search over `eth_getCode` find the first
//! block with code. The receipts of that block then reveal the deployer.
//!
//! Contracts created by other contracts (factories) have no receipt with a
//! matching `contractAddress` and are reported as not found.
use alchemy_common::{
    models::{blockchain::TransactionReceipt, BlockReference, ContractDeployment},
    Address, Bytes,
};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::{debug, instrument, trace};

use crate::{client::AlchemyClient, rpc::RPCError};

/// Chain history queries the locator relies on.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContractHistory: Send + Sync {
    async fn latest_block(&self) -> Result<u64, RPCError>;

    async fn code_at(&self, address: Address, block: u64) -> Result<Bytes, RPCError>;

    async fn receipts_in_block(&self, block: u64) -> Result<Vec<TransactionReceipt>, RPCError>;
}

#[async_trait]
impl ContractHistory for AlchemyClient {
    async fn latest_block(&self) -> Result<u64, RPCError> {
        self.get_block_number().await
    }

    async fn code_at(&self, address: Address, block: u64) -> Result<Bytes, RPCError> {
        self.get_code(address, BlockReference::Number(block))
            .await
    }

    async fn receipts_in_block(&self, block: u64) -> Result<Vec<TransactionReceipt>, RPCError> {
        self.get_transaction_receipts(BlockReference::Number(block))
            .await
    }
}

/// Returns the first block in `[from, to]` at which `address` has code.
///
/// Expects code to be present at `to`; if it is absent everywhere the result
/// is `to`. Issues at most `ceil(log2(to - from + 1))` code queries.
#[instrument(level = "debug", skip(source))]
pub async fn binary_search_first_block<S>(
    source: &S,
    address: Address,
    from: u64,
    to: u64,
) -> Result<u64, RPCError>
where
    S: ContractHistory + ?Sized,
{
    let mut low = from;
    let mut high = to;
    while low < high {
        let mid = low + (high - low) / 2;
        let code = source.code_at(address, mid).await?;
        trace!(low, high, mid, has_code = !code.is_empty(), "Narrowing deployment range");
        if code.is_empty() {
            low = mid + 1;
        } else {
            high = mid;
        }
    }
    Ok(high)
}

/// Locates the deployment block and deployer of `address`.
///
/// `current_block` bounds the search; the chain head is queried when it is
/// `None`.
#[instrument(level = "debug", skip(source))]
pub async fn find_contract_deployer<S>(
    source: &S,
    address: Address,
    current_block: Option<u64>,
) -> Result<ContractDeployment, RPCError>
where
    S: ContractHistory + ?Sized,
{
    let current = match current_block {
        Some(block) => block,
        None => source.latest_block().await?,
    };

    let code = source
        .code_at(address, current)
        .await?;
    if code.is_empty() {
        return Err(RPCError::ContractNotFound {
            address: address.to_string(),
            reason: format!("no code at block {current}"),
        });
    }

    let block = binary_search_first_block(source, address, 0, current).await?;
    debug!(block, "Found first block with code");

    let receipts = source
        .receipts_in_block(block)
        .await?;
    let receipt = receipts
        .iter()
        .find(|receipt| receipt.contract_address == Some(address))
        .ok_or_else(|| RPCError::ContractNotFound {
            address: address.to_string(),
            reason: format!(
                "no transaction in block {block} created it, it may have been deployed by another contract"
            ),
        })?;

    Ok(ContractDeployment::new(receipt.from, block))
}
