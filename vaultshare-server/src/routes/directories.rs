use std::collections::BTreeSet;
use std::str::FromStr;

use crate::auth::authenticate;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;
use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::Response,
};
use serde::{Deserialize, Serialize};
use vaultshare_ledger::{AuditEntry, DirectoryRecord, LedgerError, access};
use vaultshare_store::ContentAddress;

/// Header carrying the caller's view of the record version for
/// routes whose body is raw bytes or absent
pub const EXPECTED_VERSION_HEADER: &str = "x-vaultshare-expected-version";

fn expected_version(headers: &HeaderMap) -> ServerResult<u64> {
    headers
        .get(EXPECTED_VERSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| {
            ServerError::BadRequest(format!(
                "Missing or malformed {EXPECTED_VERSION_HEADER} header"
            ))
        })
}

#[derive(Deserialize)]
pub struct CreateDirectoryRequest {
    pub key: String,
    #[serde(default)]
    pub access_policy: BTreeSet<String>,
}

/// POST /directories
pub async fn create_directory(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateDirectoryRequest>,
) -> ServerResult<(StatusCode, Json<DirectoryRecord>)> {
    let caller = authenticate(&state, &headers).await?;

    let record = state
        .directories
        .create_directory(&body.key, &caller.id, body.access_policy)
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /directories/{key}
///
/// Record metadata is public; only the content behind it is gated.
pub async fn get_directory(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ServerResult<Json<DirectoryRecord>> {
    let record = state.directories.get_directory(&key).await?;
    Ok(Json(record))
}

/// GET /directories
pub async fn list_directories(
    State(state): State<AppState>,
) -> ServerResult<Json<Vec<DirectoryRecord>>> {
    let records = state.directories.list_directories().await?;
    Ok(Json(records))
}

/// GET /directories/{key}/history
///
/// The record's audit trail, oldest first.
pub async fn directory_history(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ServerResult<Json<Vec<AuditEntry>>> {
    let entries = state.directories.directory_history(&key).await?;
    Ok(Json(entries))
}

#[derive(Serialize)]
pub struct UploadContentResponse {
    pub content_address: String,
    pub size: usize,
    pub record: DirectoryRecord,
}

/// POST /directories/{key}/content
///
/// Body is the raw payload; the content address is derived server-side
/// and bound to the record in the same request.
pub async fn upload_content(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<Json<UploadContentResponse>> {
    let caller = authenticate(&state, &headers).await?;
    let expected = expected_version(&headers)?;

    // Reject before the bytes land: an unauthorized or stale upload must
    // not leave an orphaned blob in the content store
    let current = state.directories.get_directory(&key).await?;
    if !access::authorize(&current, &caller.id, access::DirectoryOp::UpdateContent) {
        return Err(ServerError::Ledger(LedgerError::NotAuthorized(format!(
            "update_content requires ownership of {key}"
        ))));
    }
    if current.version != expected {
        return Err(ServerError::Ledger(LedgerError::VersionConflict {
            expected,
            actual: current.version,
        }));
    }

    let address = state.content.put(&body).await?;
    match state
        .directories
        .update_content(&key, &caller.id, &address.to_base58(), expected)
        .await
    {
        Ok(record) => Ok(Json(UploadContentResponse {
            content_address: address.to_base58(),
            size: body.len(),
            record,
        })),
        Err(e) => {
            // Lost the version race after the blob landed; clean up
            if let Err(del) = state.content.delete(&address).await {
                tracing::warn!(%address, error = %del, "failed to remove unbound blob");
            }
            Err(e.into())
        }
    }
}

/// GET /directories/{key}/content
pub async fn download_content(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> ServerResult<Response> {
    let caller = authenticate(&state, &headers).await?;
    let record = state.directories.get_directory(&key).await?;

    if !access::can_fetch_content(&record, &caller) {
        return Err(ServerError::Ledger(LedgerError::NotAuthorized(format!(
            "{} may not fetch the content of {key}",
            caller.id
        ))));
    }

    let address_str = record
        .content_address
        .ok_or_else(|| LedgerError::NotFound(format!("no content bound to {key}")))?;
    let address = ContentAddress::from_str(&address_str)?;
    let data = state.content.get(&address).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, data.len())
        .header("X-Content-Address", address_str)
        .body(Body::from(data))
        .map_err(|e| ServerError::Internal(e.to_string()))?;

    Ok(response)
}

#[derive(Deserialize)]
pub struct UpdatePolicyRequest {
    pub access_policy: BTreeSet<String>,
    pub expected_version: u64,
}

/// POST /directories/{key}/policy
pub async fn update_policy(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(body): Json<UpdatePolicyRequest>,
) -> ServerResult<Json<DirectoryRecord>> {
    let caller = authenticate(&state, &headers).await?;

    let record = state
        .directories
        .update_policy(&key, &caller.id, body.access_policy, body.expected_version)
        .await?;

    Ok(Json(record))
}

#[derive(Deserialize)]
pub struct GrantRequest {
    pub grantee: String,
    pub expected_version: u64,
}

/// POST /directories/{key}/grants
pub async fn grant_access(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(body): Json<GrantRequest>,
) -> ServerResult<Json<DirectoryRecord>> {
    let caller = authenticate(&state, &headers).await?;

    let record = state
        .directories
        .grant_access(&key, &caller.id, &body.grantee, body.expected_version)
        .await?;

    Ok(Json(record))
}

/// DELETE /directories/{key}/grants/{target}
pub async fn revoke_access(
    State(state): State<AppState>,
    Path((key, target)): Path<(String, String)>,
    headers: HeaderMap,
) -> ServerResult<Json<DirectoryRecord>> {
    let caller = authenticate(&state, &headers).await?;
    let expected = expected_version(&headers)?;

    let record = state
        .directories
        .revoke_access(&key, &caller.id, &target, expected)
        .await?;

    Ok(Json(record))
}
