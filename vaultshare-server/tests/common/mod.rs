use std::net::SocketAddr;

use reqwest::Client;
use serde_json::json;
use tokio::net::TcpListener;
use vaultshare_ledger::CredentialCommitment;
use vaultshare_server::{config::Config, routes, state::AppState};

pub const IDENTITY_HEADER: &str = "x-vaultshare-identity";
pub const CREDENTIAL_HEADER: &str = "x-vaultshare-credential";
pub const EXPECTED_VERSION_HEADER: &str = "x-vaultshare-expected-version";

pub struct TestServer {
    pub url: String,
    #[allow(dead_code)]
    pub addr: SocketAddr,
    /// Handle onto the backends, for assertions HTTP cannot express
    pub state: AppState,
}

impl TestServer {
    pub async fn start() -> Self {
        let config = Config {
            host: "127.0.0.1".into(),
            port: 0, // OS assigns port
            storage: Default::default(),
            ledger: Default::default(),
            verifier: Default::default(),
        };

        let state = AppState::new(&config).await.unwrap();
        let app = routes::router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give server a moment to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            url: format!("http://{addr}"),
            addr,
            state,
        }
    }
}

/// Base58 commitment for a test secret, as the wire carries it
pub fn commitment(secret: &[u8]) -> String {
    CredentialCommitment::from_secret(secret).to_base58()
}

/// Register an identity whose secret equals its id, panicking on failure
pub async fn register(client: &Client, url: &str, id: &str, group: &str) {
    let response = client
        .post(format!("{url}/identities"))
        .json(&json!({
            "id": id,
            "display_name": id,
            "credential_commitment": commitment(id.as_bytes()),
            "group_tag": group,
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201, "registering {id}");
}

/// Request builder extension adding the test identity's auth headers
pub trait WithAuth {
    fn with_auth(self, id: &str) -> Self;
}

impl WithAuth for reqwest::RequestBuilder {
    fn with_auth(self, id: &str) -> Self {
        self.header(IDENTITY_HEADER, id)
            .header(CREDENTIAL_HEADER, commitment(id.as_bytes()))
    }
}
