use crate::auth::authenticate;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use vaultshare_ledger::{AttemptId, DirectoryRecord, LedgerError};

#[derive(Deserialize)]
pub struct SubmitProofRequest {
    pub proof: String,         // base58
    pub public_inputs: String, // base58
}

#[derive(Serialize)]
pub struct ProofOutcomeResponse {
    pub attempt_id: AttemptId,
    pub record: DirectoryRecord,
}

fn decode_b58(field: &str, value: &str) -> ServerResult<Vec<u8>> {
    bs58::decode(value)
        .into_vec()
        .map_err(|_| ServerError::BadRequest(format!("Invalid base58 in {field}")))
}

/// POST /directories/{key}/proofs
///
/// Opens an attempt and delegates it in the same request. When the
/// verifier is unreachable the attempt stays open, and the response
/// carries its id so a verdict can still land via the verdict route.
pub async fn submit_proof(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(body): Json<SubmitProofRequest>,
) -> ServerResult<Response> {
    let caller = authenticate(&state, &headers).await?;
    let proof = decode_b58("proof", &body.proof)?;
    let public_inputs = decode_b58("public_inputs", &body.public_inputs)?;

    let attempt = state
        .gate
        .submit_proof(&key, &caller.id, &proof, &public_inputs)
        .await?;

    match state
        .gate
        .execute(attempt.id, &proof, &public_inputs, state.verifier_timeout)
        .await
    {
        Ok(record) => Ok(Json(ProofOutcomeResponse {
            attempt_id: attempt.id,
            record,
        })
        .into_response()),
        Err(LedgerError::VerifierUnavailable(reason)) => Ok((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": reason,
                "attempt_id": attempt.id,
                "outcome": "pending",
            })),
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}

#[derive(Deserialize)]
pub struct VerdictRequest {
    pub verdict: bool,
}

/// POST /proofs/{attempt_id}/verdict
///
/// Out-of-band verdict delivery for attempts whose delegation did not
/// settle inline. Idempotent: replaying a landed verdict returns the
/// current record unchanged.
pub async fn apply_verdict(
    State(state): State<AppState>,
    Path(attempt_id): Path<AttemptId>,
    headers: HeaderMap,
    Json(body): Json<VerdictRequest>,
) -> ServerResult<Json<ProofOutcomeResponse>> {
    authenticate(&state, &headers).await?;

    let record = state.gate.apply_verdict(attempt_id, body.verdict).await?;
    Ok(Json(ProofOutcomeResponse { attempt_id, record }))
}
