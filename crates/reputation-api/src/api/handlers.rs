//! HTTP request handlers.

use super::types::{
    required, AddMemberRequest, AdjustScoreRequest, CreateNftRequest, CreateOrganizationRequest,
    HealthResponse, LeaderboardEntry, NftResponse, OrganizationResponse, RegisterRequest,
    RegisterResponse, ReputationResponse, UserSummary,
};
use super::AppState;
use crate::error::ApiError;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use record_store::{NewNft, NewOrganization, NewUser, Nft, Organization, StoreError, User};
use tracing::{info, warn};

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let user_count = state.store.count_users().await?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        store_backend: state.store.backend().to_string(),
        user_count,
        chain_provider_configured: state.chain.provider_url.is_some(),
        contract_address: state.chain.contract_address.clone(),
    }))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Register a new user.
pub async fn register_user(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let Json(request) = payload?;
    let address = required("address", request.address)?;
    let username = required("username", request.username)?;
    info!(%address, "Registration request received");

    let user = state
        .store
        .insert_user(NewUser::new(address.clone(), username))
        .await
        .map_err(|e| {
            if matches!(e, StoreError::Duplicate { .. }) {
                warn!(%address, "Attempted registration of existing address");
            }
            ApiError::from(e)
        })?;

    info!(%address, id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(RegisterResponse { user })))
}

/// Get a user's profile by address.
pub async fn get_profile(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<User>, ApiError> {
    let Path(address) = path?;
    let user = state
        .store
        .find_user_by_address(&address)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    Ok(Json(user))
}

/// List all users.
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let users = state.store.find_all_users().await?;
    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}

// ---------------------------------------------------------------------------
// Organizations
// ---------------------------------------------------------------------------

/// Create an organization owned by a registered user.
pub async fn create_organization(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrganizationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrganizationResponse>), ApiError> {
    let Json(request) = payload?;
    let name = required("name", request.name)?;
    let owner = required("owner", request.owner)?;
    let description = request
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let organization = state
        .store
        .insert_organization(NewOrganization {
            name,
            description,
            owner,
        })
        .await?;

    info!(
        id = %organization.id,
        name = %organization.name,
        owner = %organization.owner,
        "Organization created"
    );

    Ok((
        StatusCode::CREATED,
        Json(OrganizationResponse { organization }),
    ))
}

/// List all organizations.
pub async fn list_organizations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Organization>>, ApiError> {
    Ok(Json(state.store.find_all_organizations().await?))
}

/// Get an organization by id.
pub async fn get_organization(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Organization>, ApiError> {
    let Path(id) = path?;
    let organization = state
        .store
        .find_organization(&id)
        .await?
        .ok_or(ApiError::OrganizationNotFound)?;

    Ok(Json(organization))
}

/// Add a registered user to an organization.
pub async fn add_member(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<AddMemberRequest>, JsonRejection>,
) -> Result<Json<OrganizationResponse>, ApiError> {
    let Path(id) = path?;
    let Json(request) = payload?;
    let address = required("address", request.address)?;

    let organization = state.store.add_member(&id, &address).await?;
    info!(id = %organization.id, member = %address, "Organization member added");

    Ok(Json(OrganizationResponse { organization }))
}

// ---------------------------------------------------------------------------
// Reputation
// ---------------------------------------------------------------------------

/// Users ordered by score, highest first.
pub async fn leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let mut users = state.store.find_all_users().await?;
    users.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.address.cmp(&b.address)));

    let entries = users
        .into_iter()
        .map(|u| LeaderboardEntry {
            address: u.address,
            username: u.username,
            score: u.score,
        })
        .collect();

    Ok(Json(entries))
}

/// Get a user's reputation score.
pub async fn get_reputation(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<ReputationResponse>, ApiError> {
    let Path(address) = path?;
    let user = state
        .store
        .find_user_by_address(&address)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    Ok(Json(ReputationResponse {
        address: user.address,
        score: user.score,
    }))
}

/// Add a signed delta to a user's reputation score.
pub async fn adjust_reputation(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<AdjustScoreRequest>, JsonRejection>,
) -> Result<Json<ReputationResponse>, ApiError> {
    let Path(address) = path?;
    let Json(request) = payload?;
    let delta = request
        .delta
        .ok_or_else(|| ApiError::InvalidInput("delta is required".to_string()))?;

    let user = state.store.adjust_score(&address, delta).await?;
    info!(%address, delta, score = user.score, "Reputation adjusted");

    Ok(Json(ReputationResponse {
        address: user.address,
        score: user.score,
    }))
}

// ---------------------------------------------------------------------------
// NFTs
// ---------------------------------------------------------------------------

/// Record an NFT owned by a registered user.
pub async fn create_nft(
    State(state): State<AppState>,
    payload: Result<Json<CreateNftRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<NftResponse>), ApiError> {
    let Json(request) = payload?;
    let token_id = required("token_id", request.token_id)?;
    let owner = required("owner", request.owner)?;

    let contract_address = match request.contract_address {
        Some(c) if !c.trim().is_empty() => c.trim().to_string(),
        _ => state.chain.contract_address.clone().ok_or_else(|| {
            ApiError::InvalidInput(
                "contract_address is required when no default contract is configured"
                    .to_string(),
            )
        })?,
    };

    let nft = state
        .store
        .insert_nft(NewNft {
            token_id,
            contract_address,
            owner,
            metadata_uri: request.metadata_uri,
        })
        .await?;

    info!(
        id = %nft.id,
        contract = %nft.contract_address,
        token_id = %nft.token_id,
        owner = %nft.owner,
        "NFT recorded"
    );

    Ok((StatusCode::CREATED, Json(NftResponse { nft })))
}

/// List all NFT records.
pub async fn list_nfts(State(state): State<AppState>) -> Result<Json<Vec<Nft>>, ApiError> {
    Ok(Json(state.store.find_all_nfts().await?))
}

/// List the NFT records owned by an address.
pub async fn list_nfts_by_owner(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<Nft>>, ApiError> {
    let Path(address) = path?;
    Ok(Json(state.store.find_nfts_by_owner(&address).await?))
}

/// Get an NFT record by id.
pub async fn get_nft(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Nft>, ApiError> {
    let Path(id) = path?;
    let nft = state
        .store
        .find_nft(&id)
        .await?
        .ok_or(ApiError::NftNotFound)?;

    Ok(Json(nft))
}

/// Fallback for paths that match no route.
pub async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

/// Fallback for known paths hit with an unsupported method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
