//! API request and response types.

use crate::error::ApiError;
use record_store::{Nft, Organization, User};
use serde::{Deserialize, Serialize};

/// Return the trimmed value of a required text field.
pub(crate) fn required(field: &str, value: Option<String>) -> Result<String, ApiError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::InvalidInput(format!("{} is required", field))),
    }
}

/// Request to register a user.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub address: Option<String>,
    pub username: Option<String>,
}

/// Response after registering a user.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: User,
}

/// User entry in the listing.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub address: String,
    pub username: String,
    pub score: i64,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            address: user.address,
            username: user.username,
            score: user.score,
        }
    }
}

/// Request to create an organization.
#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Address of the owning user
    pub owner: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrganizationResponse {
    pub organization: Organization,
}

/// Request to add a member to an organization.
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub address: Option<String>,
}

/// Request to change a user's score.
#[derive(Debug, Deserialize)]
pub struct AdjustScoreRequest {
    /// Signed amount added to the current score
    pub delta: Option<i64>,
}

/// A user's reputation.
#[derive(Debug, Serialize)]
pub struct ReputationResponse {
    pub address: String,
    pub score: i64,
}

/// Leaderboard entry.
#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
    pub address: String,
    pub username: String,
    pub score: i64,
}

/// Request to record an NFT.
#[derive(Debug, Deserialize)]
pub struct CreateNftRequest {
    pub token_id: Option<String>,
    /// Address of the owning user
    pub owner: Option<String>,
    /// Falls back to the configured contract address
    pub contract_address: Option<String>,
    pub metadata_uri: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NftResponse {
    pub nft: Nft,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub store_backend: String,
    pub user_count: usize,
    pub chain_provider_configured: bool,
    pub contract_address: Option<String>,
}
