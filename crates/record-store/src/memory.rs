//! In-memory record store.

use crate::collections::Collections;
use crate::error::StoreError;
use crate::store::RecordStore;
use crate::types::{NewNft, NewOrganization, NewUser, Nft, Organization, User};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Record store kept entirely in process memory. Data is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn find_user_by_address(&self, address: &str) -> Result<Option<User>, StoreError> {
        Ok(self.data.read().await.user(address).cloned())
    }

    #[instrument(skip(self, user), fields(address = %user.address))]
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let user = self.data.write().await.insert_user(user)?;
        debug!(id = %user.id, "User inserted");
        Ok(user)
    }

    async fn find_all_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.data.read().await.users())
    }

    async fn count_users(&self) -> Result<usize, StoreError> {
        Ok(self.data.read().await.user_count())
    }

    async fn adjust_score(&self, address: &str, delta: i64) -> Result<User, StoreError> {
        self.data.write().await.adjust_score(address, delta)
    }

    async fn insert_organization(
        &self,
        organization: NewOrganization,
    ) -> Result<Organization, StoreError> {
        self.data.write().await.insert_organization(organization)
    }

    async fn find_organization(&self, id: &str) -> Result<Option<Organization>, StoreError> {
        Ok(self.data.read().await.organization(id).cloned())
    }

    async fn find_all_organizations(&self) -> Result<Vec<Organization>, StoreError> {
        Ok(self.data.read().await.organizations())
    }

    async fn add_member(&self, id: &str, address: &str) -> Result<Organization, StoreError> {
        self.data.write().await.add_member(id, address)
    }

    async fn insert_nft(&self, nft: NewNft) -> Result<Nft, StoreError> {
        self.data.write().await.insert_nft(nft)
    }

    async fn find_nft(&self, id: &str) -> Result<Option<Nft>, StoreError> {
        Ok(self.data.read().await.nft(id).cloned())
    }

    async fn find_nfts_by_owner(&self, owner: &str) -> Result<Vec<Nft>, StoreError> {
        Ok(self.data.read().await.nfts_by_owner(owner))
    }

    async fn find_all_nfts(&self) -> Result<Vec<Nft>, StoreError> {
        Ok(self.data.read().await.nfts())
    }
}
