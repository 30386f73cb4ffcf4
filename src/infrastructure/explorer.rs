//! Block-explorer (Etherscan-style) transaction-history client. Read-only,
//! best-effort: callers treat a failure here as "no history available".

use anyhow::{anyhow, Result};
use ethers::core::types::U256;
use ethers::utils::format_ether;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxSummary {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub value_eth: String,
    pub timestamp: u64,
}

fn api_base(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        1 => Some("https://api.etherscan.io/api"),
        11155111 => Some("https://api-sepolia.etherscan.io/api"),
        _ => None,
    }
}

fn explorer_base(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        1 => Some("https://etherscan.io/tx/"),
        11155111 => Some("https://sepolia.etherscan.io/tx/"),
        _ => None,
    }
}

/// Browser-facing URL for a transaction, or the empty string when the chain
/// has no known explorer.
pub fn tx_explorer_url(chain_id: u64, hash: &str) -> String {
    match explorer_base(chain_id) {
        Some(base) => format!("{base}{hash}"),
        None => String::new(),
    }
}

fn wei_to_eth(value: &str) -> String {
    match U256::from_dec_str(value) {
        Ok(wei) => format_ether(wei),
        Err(_) => "0".to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct TxListResponse {
    status: String,
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawTx {
    hash: String,
    from: String,
    to: String,
    value: String,
    #[serde(rename = "timeStamp")]
    time_stamp: String,
}

#[derive(Clone, Default)]
pub struct ExplorerClient {
    http: reqwest::Client,
}

impl ExplorerClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// The ten most recent transactions for `address`, newest first. Errors
    /// for chains without an explorer API or when the API key is missing; an
    /// API-level "no results" status yields an empty list.
    pub async fn fetch_recent_transactions(
        &self,
        address: &str,
        chain_id: u64,
        api_key: Option<&str>,
    ) -> Result<Vec<TxSummary>> {
        let base = api_base(chain_id).ok_or_else(|| anyhow!("Unsupported network for transactions"))?;
        let api_key = api_key.ok_or_else(|| anyhow!("Missing block explorer API key"))?;

        let url = format!(
            "{base}?module=account&action=txlist&address={address}&sort=desc&page=1&offset=10&apikey={api_key}"
        );
        let response: TxListResponse = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.status != "1" {
            return Ok(Vec::new());
        }
        let raw: Vec<RawTx> = serde_json::from_value(response.result)?;
        Ok(raw
            .into_iter()
            .map(|tx| TxSummary {
                hash: tx.hash,
                from: tx.from,
                to: if tx.to.is_empty() { None } else { Some(tx.to) },
                value_eth: wei_to_eth(&tx.value),
                timestamp: tx.time_stamp.parse().unwrap_or(0),
            })
            .collect())
    }
}
