use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub verifier: VerifierConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: String, // "memory", "local"
    pub local_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    #[serde(default = "default_backend")]
    pub backend: String, // "memory", "sqlite"
    pub sqlite_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VerifierConfig {
    #[serde(default = "default_verifier_backend")]
    pub backend: String, // "mock", "mock-reject"
    /// Opaque verification key handed to the verifier on every delegation
    #[serde(default)]
    pub verification_key: String,
    #[serde(default = "default_verifier_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            local_path: None,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            sqlite_path: None,
        }
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            backend: default_verifier_backend(),
            verification_key: String::new(),
            timeout_secs: default_verifier_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    7311
}
fn default_backend() -> String {
    "memory".into()
}
fn default_verifier_backend() -> String {
    "mock".into()
}
fn default_verifier_timeout_secs() -> u64 {
    30
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config: Config = Figment::new()
            .merge(Toml::file("vaultshare-server.toml"))
            .merge(Env::prefixed("VAULTSHARE_"))
            .extract()?;
        Ok(config)
    }
}
