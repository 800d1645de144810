use crate::error::{ServerError, ServerResult};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use vaultshare_ledger::{CredentialCommitment, Identity};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub id: String,
    pub display_name: String,
    pub credential_commitment: String, // base58
    #[serde(default)]
    pub group_tag: String,
}

/// The stored commitment is never echoed back
#[derive(Serialize)]
pub struct IdentityResponse {
    pub id: String,
    pub display_name: String,
    pub group_tag: String,
}

impl From<Identity> for IdentityResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            display_name: identity.display_name,
            group_tag: identity.group_tag,
        }
    }
}

/// POST /identities
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> ServerResult<(StatusCode, Json<IdentityResponse>)> {
    let commitment = CredentialCommitment::from_base58(&body.credential_commitment)
        .ok_or_else(|| {
            ServerError::BadRequest("Invalid base58 in credential_commitment".into())
        })?;

    let identity = state
        .identities
        .register(&body.id, &body.display_name, commitment, &body.group_tag)
        .await?;

    Ok((StatusCode::CREATED, Json(identity.into())))
}

/// GET /identities/{id}
pub async fn get_identity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<IdentityResponse>> {
    let identity = state.identities.lookup(&id).await?;
    Ok(Json(identity.into()))
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub credential_commitment: String, // base58
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

/// POST /identities/{id}/verify
pub async fn verify_credential(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<VerifyRequest>,
) -> ServerResult<Json<VerifyResponse>> {
    let candidate = CredentialCommitment::from_base58(&body.credential_commitment)
        .ok_or_else(|| {
            ServerError::BadRequest("Invalid base58 in credential_commitment".into())
        })?;

    let valid = state.identities.verify_credential(&id, &candidate).await?;
    Ok(Json(VerifyResponse { valid }))
}
