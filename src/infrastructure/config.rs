use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Logical blockchain network. Used purely as a lookup key into the
/// environment-sourced configuration; unknown names are rejected at the
/// request-validation boundary before any component sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Sepolia,
    Localhost,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Sepolia => "sepolia",
            Network::Localhost => "localhost",
        }
    }

    /// Maps a wallet-reported chain id to a known network.
    pub fn from_chain_id(chain_id: u64) -> Option<Network> {
        match chain_id {
            1 => Some(Network::Mainnet),
            11155111 => Some(Network::Sepolia),
            31337 => Some(Network::Localhost),
            _ => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "sepolia" => Ok(Network::Sepolia),
            "localhost" => Ok(Network::Localhost),
            other => Err(format!("Unknown network: {other}")),
        }
    }
}

const DEFAULT_MAINNET_RPC: &str = "https://rpc.ankr.com/eth";
const DEFAULT_SEPOLIA_RPC: &str = "https://rpc.ankr.com/eth_sepolia";
const DEFAULT_LOCAL_RPC: &str = "http://127.0.0.1:8545";

// Hardhat's well-known first dev account; only meaningful against a
// throwaway local node.
const DEFAULT_LOCAL_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const DEFAULT_LOCAL_CONTRACT_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

fn rpc_env_var_for(network: Network) -> &'static str {
    match network {
        Network::Mainnet => "RPC_URL_MAINNET",
        Network::Sepolia => "RPC_URL_SEPOLIA",
        Network::Localhost => "LOCAL_RPC_URL",
    }
}

fn default_rpc_for(network: Network) -> &'static str {
    match network {
        Network::Mainnet => DEFAULT_MAINNET_RPC,
        Network::Sepolia => DEFAULT_SEPOLIA_RPC,
        Network::Localhost => DEFAULT_LOCAL_RPC,
    }
}

/// Splits a comma-separated endpoint list, trimming whitespace and dropping
/// empty entries. Order is preserved: left to right is first to try. An empty
/// result falls back to the single hardcoded default for the network.
pub fn parse_endpoint_list(raw: Option<&str>, default_url: &str) -> Vec<String> {
    let urls: Vec<String> = raw
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    if urls.is_empty() {
        vec![default_url.to_string()]
    } else {
        urls
    }
}

/// Candidate RPC endpoints for a network, in retry-precedence order. Derived
/// from the environment at call time, never cached.
pub fn rpc_urls_for(network: Network) -> Vec<String> {
    let raw = env::var(rpc_env_var_for(network)).ok();
    parse_endpoint_list(raw.as_deref(), default_rpc_for(network))
}

/// Everything needed to submit a server-side mint on a given network.
#[derive(Debug, Clone)]
pub struct MintSettings {
    pub rpc_url: String,
    pub private_key: String,
    pub contract_address: String,
}

/// Resolves the RPC endpoint, signing key, and contract address for a mint on
/// `network`. State-changing calls go to the first configured endpoint only,
/// so no retry list is carried here. Missing required values are rejected
/// before any network call is attempted.
pub fn mint_settings_for(network: Network) -> Result<MintSettings> {
    let (private_key, contract_address) = match network {
        Network::Sepolia => (
            env::var("SEPOLIA_PRIVATE_KEY").unwrap_or_default(),
            env::var("CONTRACT_ADDRESS_SEPOLIA").unwrap_or_default(),
        ),
        Network::Localhost => (
            env::var("LOCAL_PRIVATE_KEY").unwrap_or_else(|_| DEFAULT_LOCAL_PRIVATE_KEY.to_string()),
            env::var("CONTRACT_ADDRESS_LOCAL")
                .unwrap_or_else(|_| DEFAULT_LOCAL_CONTRACT_ADDRESS.to_string()),
        ),
        Network::Mainnet => {
            return Err(anyhow!("Minting is not configured for mainnet"));
        }
    };

    let rpc_url = rpc_urls_for(network).into_iter().next().unwrap_or_default();

    if rpc_url.is_empty() || private_key.is_empty() || contract_address.is_empty() {
        return Err(anyhow!(
            "Missing RPC/private key/contract address for selected network"
        ));
    }

    Ok(MintSettings {
        rpc_url,
        private_key,
        contract_address,
    })
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(3001);
        Self { port }
    }
}
