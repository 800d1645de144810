//! Credential extraction and checking for mutating routes
//!
//! Every mutating request carries the caller's id and credential
//! commitment as headers; the check runs before the ledger is touched,
//! so an impostor never reaches the registries.

use axum::http::HeaderMap;
use vaultshare_ledger::{CredentialCommitment, Identity};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

pub const IDENTITY_HEADER: &str = "x-vaultshare-identity";
pub const CREDENTIAL_HEADER: &str = "x-vaultshare-credential";

pub struct AuthHeaders {
    pub identity_id: String,
    pub credential: CredentialCommitment,
}

/// Pull the identity id and base58 credential commitment out of headers
pub fn extract_auth_headers(headers: &HeaderMap) -> ServerResult<AuthHeaders> {
    let identity_id = headers
        .get(IDENTITY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            ServerError::Unauthenticated(format!("Missing {IDENTITY_HEADER} header"))
        })?
        .to_string();

    let credential = headers
        .get(CREDENTIAL_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(CredentialCommitment::from_base58)
        .ok_or_else(|| {
            ServerError::Unauthenticated(format!(
                "Missing or malformed {CREDENTIAL_HEADER} header"
            ))
        })?;

    Ok(AuthHeaders {
        identity_id,
        credential,
    })
}

/// Check the presented credential and return the caller's identity
///
/// A failed check reads the same for unknown ids and wrong credentials.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> ServerResult<Identity> {
    let auth = extract_auth_headers(headers)?;
    if !state
        .identities
        .verify_credential(&auth.identity_id, &auth.credential)
        .await?
    {
        return Err(ServerError::Unauthenticated(
            "Credential check failed".into(),
        ));
    }
    Ok(state.identities.lookup(&auth.identity_id).await?)
}
