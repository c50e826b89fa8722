use std::{future::Future, time::Duration};

use alchemy_common::{models::blockchain::TransactionReceipt, B256};
use tokio::time::{error::Elapsed, sleep, timeout_at, Instant};
use tracing::{debug, instrument, warn};

use crate::{client::AlchemyClient, rpc::RPCError};

impl AlchemyClient {
    /// Polls until `tx_hash` is mined and buried under `confirmations` blocks,
    /// counting its own block as the first confirmation.
    ///
    /// With zero confirmations the receipt is returned as soon as it exists.
    /// The deadline also bounds requests in flight. A timeout too large to be
    /// represented as an instant means waiting without a deadline.
    #[instrument(level = "debug", skip(self))]
    pub async fn wait_for_transaction(
        &self,
        tx_hash: B256,
        confirmations: u64,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<TransactionReceipt, RPCError> {
        let deadline = Instant::now().checked_add(timeout);
        if deadline.is_none() {
            warn!(?timeout, "Timeout out of range, waiting without a deadline");
        }
        let timed_out = || RPCError::TimeoutExceeded {
            tx_hash: tx_hash.to_string(),
            timeout,
            confirmations,
        };

        loop {
            let receipt = before(deadline, self.get_transaction_receipt(tx_hash))
                .await
                .map_err(|_| timed_out())??;
            if let Some(receipt) = receipt {
                if confirmations == 0 {
                    return Ok(receipt);
                }
                let head = before(deadline, self.get_block_number())
                    .await
                    .map_err(|_| timed_out())??;
                let confirmed = head
                    .saturating_sub(receipt.block_number)
                    .saturating_add(1);
                debug!(confirmed, confirmations, "Transaction mined");
                if confirmed >= confirmations {
                    return Ok(receipt);
                }
            }

            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(timed_out());
                    }
                    poll_interval.min(deadline - now)
                }
                None => poll_interval,
            };
            sleep(pause).await;
        }
    }
}

/// Runs `request` until `deadline`, or to completion when there is none.
async fn before<T>(
    deadline: Option<Instant>,
    request: impl Future<Output = T>,
) -> Result<T, Elapsed> {
    match deadline {
        Some(deadline) => timeout_at(deadline, request).await,
        None => Ok(request.await),
    }
}
