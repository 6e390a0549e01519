//! The store contract consumed by the HTTP handlers.

use crate::error::StoreError;
use crate::types::{NewNft, NewOrganization, NewUser, Nft, Organization, User};
use async_trait::async_trait;

/// Persistence backend for users, organizations and NFT records.
///
/// Every mutation performs its existence and uniqueness checks atomically
/// with the write, so concurrent callers cannot both pass a check before
/// either inserts.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    async fn find_user_by_address(&self, address: &str) -> Result<Option<User>, StoreError>;

    /// Insert a user. Fails with [`StoreError::Duplicate`] if the address is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_all_users(&self) -> Result<Vec<User>, StoreError>;

    async fn count_users(&self) -> Result<usize, StoreError>;

    /// Add `delta` to a user's score and return the updated user.
    async fn adjust_score(&self, address: &str, delta: i64) -> Result<User, StoreError>;

    async fn insert_organization(
        &self,
        organization: NewOrganization,
    ) -> Result<Organization, StoreError>;

    async fn find_organization(&self, id: &str) -> Result<Option<Organization>, StoreError>;

    async fn find_all_organizations(&self) -> Result<Vec<Organization>, StoreError>;

    async fn add_member(&self, id: &str, address: &str) -> Result<Organization, StoreError>;

    async fn insert_nft(&self, nft: NewNft) -> Result<Nft, StoreError>;

    async fn find_nft(&self, id: &str) -> Result<Option<Nft>, StoreError>;

    async fn find_nfts_by_owner(&self, owner: &str) -> Result<Vec<Nft>, StoreError>;

    async fn find_all_nfts(&self) -> Result<Vec<Nft>, StoreError>;
}
