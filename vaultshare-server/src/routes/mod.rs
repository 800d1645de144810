use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

mod directories;
mod health;
mod identities;
mod proofs;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/identities", post(identities::register))
        .route("/identities/{id}", get(identities::get_identity))
        .route("/identities/{id}/verify", post(identities::verify_credential))
        .route(
            "/directories",
            post(directories::create_directory).get(directories::list_directories),
        )
        .route("/directories/{key}", get(directories::get_directory))
        .route(
            "/directories/{key}/history",
            get(directories::directory_history),
        )
        .route(
            "/directories/{key}/content",
            post(directories::upload_content).get(directories::download_content),
        )
        .route("/directories/{key}/policy", post(directories::update_policy))
        .route("/directories/{key}/grants", post(directories::grant_access))
        .route(
            "/directories/{key}/grants/{target}",
            delete(directories::revoke_access),
        )
        .route("/directories/{key}/proofs", post(proofs::submit_proof))
        .route("/proofs/{attempt_id}/verdict", post(proofs::apply_verdict))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
