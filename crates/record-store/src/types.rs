//! Record types held by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generate a fresh record identifier.
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned identifier
    #[serde(rename = "_id")]
    pub id: String,

    /// Unique external identifier (wallet-style address)
    pub address: String,

    pub username: String,

    /// Reputation score
    #[serde(default)]
    pub score: i64,

    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the caller when creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub address: String,
    pub username: String,
    pub score: i64,
}

impl NewUser {
    /// A new user with the default score of zero.
    pub fn new(address: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            username: username.into(),
            score: 0,
        }
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.score = score;
        self
    }
}

/// An organization owned by a registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(rename = "_id")]
    pub id: String,

    /// Unique organization name
    pub name: String,

    pub description: Option<String>,

    /// Address of the owning user
    pub owner: String,

    /// Member addresses in join order; always contains the owner
    pub members: Vec<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub name: String,
    pub description: Option<String>,
    pub owner: String,
}

/// An NFT record attributed to a registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nft {
    #[serde(rename = "_id")]
    pub id: String,

    pub token_id: String,

    pub contract_address: String,

    /// Address of the owning user
    pub owner: String,

    pub metadata_uri: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNft {
    pub token_id: String,
    pub contract_address: String,
    pub owner: String,
    pub metadata_uri: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serializes_id_as_underscore_id() {
        let user = User {
            id: new_record_id(),
            address: "0x123".into(),
            username: "TestUser".into(),
            score: 0,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("_id").is_some());
        assert!(json.get("id").is_none());
        assert_eq!(json["address"], "0x123");
        assert_eq!(json["score"], 0);
    }

    #[test]
    fn test_record_ids_are_unique() {
        let a = new_record_id();
        let b = new_record_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_new_user_defaults_score_to_zero() {
        let user = NewUser::new("0x1", "alice");
        assert_eq!(user.score, 0);
        assert_eq!(user.with_score(7).score, 7);
    }
}
