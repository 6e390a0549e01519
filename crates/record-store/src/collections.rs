//! In-memory record collections shared by every store backend.

use crate::error::{Collection, StoreError};
use crate::types::{new_record_id, NewNft, NewOrganization, NewUser, Nft, Organization, User};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// All records held by a store.
///
/// This is also the unit of persistence: the file-backed store serializes
/// the whole value as one snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collections {
    /// Users indexed by address
    users: HashMap<String, User>,
    /// Organizations indexed by id
    organizations: HashMap<String, Organization>,
    /// NFT records indexed by id
    nfts: HashMap<String, Nft>,
}

impl Collections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a user by address.
    pub fn user(&self, address: &str) -> Option<&User> {
        self.users.get(address)
    }

    /// Insert a new user, rejecting an address that is already taken.
    pub fn insert_user(&mut self, new: NewUser) -> Result<User, StoreError> {
        if self.users.contains_key(&new.address) {
            return Err(StoreError::duplicate(Collection::Users, new.address));
        }

        let user = User {
            id: new_record_id(),
            address: new.address,
            username: new.username,
            score: new.score,
            created_at: Utc::now(),
        };
        self.users.insert(user.address.clone(), user.clone());
        Ok(user)
    }

    /// All users ordered by creation time.
    pub fn users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        users
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Add `delta` to a user's score, saturating at the integer bounds.
    pub fn adjust_score(&mut self, address: &str, delta: i64) -> Result<User, StoreError> {
        let user = self
            .users
            .get_mut(address)
            .ok_or_else(|| StoreError::not_found(Collection::Users, address))?;
        user.score = user.score.saturating_add(delta);
        Ok(user.clone())
    }

    pub fn organization(&self, id: &str) -> Option<&Organization> {
        self.organizations.get(id)
    }

    /// Create an organization owned by an existing user.
    pub fn insert_organization(
        &mut self,
        new: NewOrganization,
    ) -> Result<Organization, StoreError> {
        if !self.users.contains_key(&new.owner) {
            return Err(StoreError::not_found(Collection::Users, new.owner));
        }
        if self.organizations.values().any(|o| o.name == new.name) {
            return Err(StoreError::duplicate(Collection::Organizations, new.name));
        }

        let organization = Organization {
            id: new_record_id(),
            name: new.name,
            description: new.description,
            members: vec![new.owner.clone()],
            owner: new.owner,
            created_at: Utc::now(),
        };
        self.organizations
            .insert(organization.id.clone(), organization.clone());
        Ok(organization)
    }

    pub fn organizations(&self) -> Vec<Organization> {
        let mut organizations: Vec<Organization> =
            self.organizations.values().cloned().collect();
        organizations.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        organizations
    }

    /// Add a registered user to an organization. Re-adding a member is a no-op.
    pub fn add_member(&mut self, id: &str, address: &str) -> Result<Organization, StoreError> {
        if !self.organizations.contains_key(id) {
            return Err(StoreError::not_found(Collection::Organizations, id));
        }
        if !self.users.contains_key(address) {
            return Err(StoreError::not_found(Collection::Users, address));
        }

        let organization = self
            .organizations
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(Collection::Organizations, id))?;
        if !organization.members.iter().any(|m| m == address) {
            organization.members.push(address.to_string());
        }
        Ok(organization.clone())
    }

    pub fn nft(&self, id: &str) -> Option<&Nft> {
        self.nfts.get(id)
    }

    /// Record an NFT for an existing user. Each contract/token pair is unique.
    pub fn insert_nft(&mut self, new: NewNft) -> Result<Nft, StoreError> {
        if !self.users.contains_key(&new.owner) {
            return Err(StoreError::not_found(Collection::Users, new.owner));
        }
        if self
            .nfts
            .values()
            .any(|n| n.contract_address == new.contract_address && n.token_id == new.token_id)
        {
            return Err(StoreError::duplicate(
                Collection::Nfts,
                format!("{}:{}", new.contract_address, new.token_id),
            ));
        }

        let nft = Nft {
            id: new_record_id(),
            token_id: new.token_id,
            contract_address: new.contract_address,
            owner: new.owner,
            metadata_uri: new.metadata_uri,
            created_at: Utc::now(),
        };
        self.nfts.insert(nft.id.clone(), nft.clone());
        Ok(nft)
    }

    pub fn nfts(&self) -> Vec<Nft> {
        let mut nfts: Vec<Nft> = self.nfts.values().cloned().collect();
        nfts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        nfts
    }

    pub fn nfts_by_owner(&self, owner: &str) -> Vec<Nft> {
        self.nfts()
            .into_iter()
            .filter(|n| n.owner == owner)
            .collect()
    }
}
