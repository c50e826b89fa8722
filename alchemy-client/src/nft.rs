//! NFT REST api (`/nft/v2/{api_key}/...`).
use alchemy_common::{
    models::nft::{Nft, NftOwners, OwnedNftsPage},
    Address,
};
use tracing::{debug, instrument};

use crate::{
    client::{decode, AlchemyClient},
    pagination::{collect_all, Page},
    rpc::RPCError,
};

impl AlchemyClient {
    /// One page of the NFTs held by `owner`.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_nfts(
        &self,
        owner: Address,
        page_key: Option<String>,
        with_metadata: bool,
    ) -> Result<OwnedNftsPage, RPCError> {
        let mut query = vec![
            ("owner".to_string(), owner.to_string()),
            ("withMetadata".to_string(), with_metadata.to_string()),
        ];
        if let Some(page_key) = page_key {
            query.push(("pageKey".to_string(), page_key));
        }
        let value = self
            .rpc
            .get("getNFTs", &query)
            .await?;
        decode("getNFTs", value)
    }

    /// Every NFT held by `owner`, following page keys.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_all_nfts(
        &self,
        owner: Address,
        with_metadata: bool,
    ) -> Result<Vec<Nft>, RPCError> {
        let nfts = collect_all(|page_key| async move {
            let page = self
                .get_nfts(owner, page_key, with_metadata)
                .await?;
            Ok::<_, RPCError>(Page::new(page.owned_nfts, page.page_key))
        })
        .await?;
        debug!(count = nfts.len(), "Fetched all nfts");
        Ok(nfts)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_nft_metadata(
        &self,
        contract: Address,
        token_id: &str,
        token_type: Option<&str>,
    ) -> Result<Nft, RPCError> {
        let mut query = vec![
            ("contractAddress".to_string(), contract.to_string()),
            ("tokenId".to_string(), token_id.to_string()),
        ];
        if let Some(token_type) = token_type {
            query.push(("tokenType".to_string(), token_type.to_string()));
        }
        let value = self
            .rpc
            .get("getNFTMetadata", &query)
            .await?;
        decode("getNFTMetadata", value)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_owners_for_token(
        &self,
        contract: Address,
        token_id: &str,
    ) -> Result<Vec<Address>, RPCError> {
        let query = vec![
            ("contractAddress".to_string(), contract.to_string()),
            ("tokenId".to_string(), token_id.to_string()),
        ];
        let value = self
            .rpc
            .get("getOwnersForToken", &query)
            .await?;
        let owners: NftOwners = decode("getOwnersForToken", value)?;
        Ok(owners.owners)
    }
}
