//! Wallet session state machine: the browser-side connect/mint/load flows,
//! expressed against injected seams so the flow logic is testable without a
//! wallet extension or a running relay.
//!
//! Top-level phases move `Idle -> Connecting -> {Connected | Failed}`.
//! Sub-actions (`mint`, `load_tokens`, `load_account_info`) never change the
//! top-level phase; they only enrich the `Connected` variant. There is no
//! cancellation: a completion observed after a phase change merges into the
//! current state if it is still `Connected` and is dropped otherwise.

use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ethers::contract::BaseContract;
use ethers::core::types::{Address, U256};
use ethers::utils::format_ether;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::infrastructure::blockchain::client::NetworkInfo;
use crate::infrastructure::config::Network;
use crate::infrastructure::explorer::{ExplorerClient, TxSummary};

/// Injected browser wallet: an EIP-1193-style request/response method call.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenMeta {
    pub name: String,
    pub image: String,
}

/// The relay's HTTP surface plus explorer history, as seen from the session.
#[async_trait]
pub trait RelayApi: Send + Sync {
    async fn account_info(&self, network: Network, address: &str) -> Result<NetworkInfo>;
    async fn tokens_of(&self, network: Network, contract: &str, address: &str)
        -> Result<Vec<u64>>;
    async fn token_metadata(&self, network: Network, contract: &str, id: u64)
        -> Result<TokenMeta>;
    async fn recent_transactions(&self, address: &str, chain_id: u64) -> Result<Vec<TxSummary>>;
}

#[derive(Debug, Clone)]
pub struct ConnectedWallet {
    pub address: String,
    pub chain_id: u64,
    pub balance_eth: String,
    pub txs: Vec<TxSummary>,
    pub tokens: Vec<u64>,
    pub token_meta: HashMap<u64, TokenMeta>,
    /// Network-info enrichment, present only after `load_account_info`.
    pub info: Option<NetworkInfo>,
}

#[derive(Debug, Clone)]
pub enum WalletState {
    Idle,
    Connecting,
    Connected(Box<ConnectedWallet>),
    Failed { message: String },
}

pub struct WalletSession<P, A> {
    provider: P,
    relay: A,
    /// Demo token contract the UI is configured against, if any.
    contract_address: Option<String>,
    /// Chain the configured contract lives on; 0 means unconfigured.
    contract_chain_id: u64,
    state: WalletState,
}

impl<P: WalletProvider, A: RelayApi> WalletSession<P, A> {
    pub fn new(
        provider: P,
        relay: A,
        contract_address: Option<String>,
        contract_chain_id: u64,
    ) -> Self {
        Self {
            provider,
            relay,
            contract_address,
            contract_chain_id,
            state: WalletState::Idle,
        }
    }

    pub fn state(&self) -> &WalletState {
        &self.state
    }

    /// Connects the wallet: requests accounts, chain id, and balance, and
    /// fetches recent history best-effort. Any hard failure lands in `Failed`
    /// with the error's message.
    pub async fn connect(&mut self) {
        self.state = WalletState::Connecting;
        match self.establish().await {
            Ok(wallet) => self.state = WalletState::Connected(Box::new(wallet)),
            Err(err) => {
                self.state = WalletState::Failed {
                    message: err.to_string(),
                }
            }
        }
    }

    async fn establish(&self) -> Result<ConnectedWallet> {
        let accounts = self
            .provider
            .request("eth_requestAccounts", json!([]))
            .await?;
        let address = accounts
            .get(0)
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("Wallet returned no accounts"))?
            .to_string();

        let chain_id = quantity_to_u64(&self.provider.request("eth_chainId", json!([])).await?)?;
        let balance = quantity_to_u256(
            &self
                .provider
                .request("eth_getBalance", json!([address, "latest"]))
                .await?,
        )?;

        // History is enrichment; a failing explorer degrades to no history.
        let txs = self
            .relay
            .recent_transactions(&address, chain_id)
            .await
            .unwrap_or_default();

        Ok(ConnectedWallet {
            address,
            chain_id,
            balance_eth: format_ether(balance),
            txs,
            tokens: Vec::new(),
            token_meta: HashMap::new(),
            info: None,
        })
    }

    /// Submits a `safeMint` for the connected account through the wallet
    /// provider, then reloads the token list. A no-op unless connected to the
    /// chain the contract is configured for.
    pub async fn mint(&mut self) {
        let Some((owner, contract)) = self.contract_target() else {
            return;
        };
        let data = match mint_calldata(&owner) {
            Ok(data) => data,
            Err(err) => {
                warn!(error = %err, "could not encode mint calldata");
                return;
            }
        };
        let tx = json!([{ "from": owner, "to": contract, "data": data }]);
        match self.provider.request("eth_sendTransaction", tx).await {
            Ok(_) => self.load_tokens().await,
            Err(err) => warn!(error = %err, "mint submission failed"),
        }
    }

    /// Loads owned token ids, then metadata per id best-effort (a failed
    /// metadata fetch is simply omitted).
    pub async fn load_tokens(&mut self) {
        let Some((owner, contract)) = self.contract_target() else {
            return;
        };
        let Some(network) = self.connected().and_then(|w| Network::from_chain_id(w.chain_id))
        else {
            return;
        };

        let ids = match self.relay.tokens_of(network, &contract, &owner).await {
            Ok(ids) => ids,
            Err(err) => {
                warn!(error = %err, "token enumeration failed");
                return;
            }
        };
        if let WalletState::Connected(wallet) = &mut self.state {
            wallet.tokens = ids.clone();
        }

        let mut loaded = HashMap::new();
        for id in ids {
            match self.relay.token_metadata(network, &contract, id).await {
                Ok(meta) => {
                    loaded.insert(id, meta);
                }
                Err(err) => warn!(id, error = %err, "token metadata unavailable"),
            }
        }
        // Merge into whatever the state is by now; dropped if no longer
        // connected.
        if let WalletState::Connected(wallet) = &mut self.state {
            wallet.token_meta.extend(loaded);
        }
    }

    /// Fetches the account snapshot from the relay and attaches it to the
    /// connected variant. Only offered on networks the relay serves queries
    /// for.
    pub async fn load_account_info(&mut self) {
        let Some(wallet) = self.connected() else {
            return;
        };
        let Some(network) = Network::from_chain_id(wallet.chain_id) else {
            return;
        };
        if !matches!(network, Network::Mainnet | Network::Sepolia) {
            return;
        }
        let address = wallet.address.clone();

        match self.relay.account_info(network, &address).await {
            Ok(info) => {
                if let WalletState::Connected(wallet) = &mut self.state {
                    wallet.info = Some(info);
                }
            }
            Err(err) => warn!(error = %err, "account info load failed"),
        }
    }

    fn connected(&self) -> Option<&ConnectedWallet> {
        match &self.state {
            WalletState::Connected(wallet) => Some(wallet),
            _ => None,
        }
    }

    /// Owner and contract for token actions, available only when connected to
    /// the chain the contract is configured for.
    fn contract_target(&self) -> Option<(String, String)> {
        let wallet = self.connected()?;
        let contract = self.contract_address.clone()?;
        if self.contract_chain_id == 0 || self.contract_chain_id != wallet.chain_id {
            return None;
        }
        Some((wallet.address.clone(), contract))
    }
}

/// ABI-encoded `safeMint(owner)` calldata as a 0x-prefixed hex string.
fn mint_calldata(owner: &str) -> Result<String> {
    let to: Address = owner
        .parse()
        .with_context(|| format!("Invalid owner address: {owner}"))?;
    let abi: ethers::abi::Abi = serde_json::from_slice(include_bytes!("../abi/DemoToken.json"))
        .context("bundled DemoToken ABI is valid JSON")?;
    let data = BaseContract::from(abi).encode("safeMint", to)?;
    Ok(format!("0x{}", hex::encode(&data)))
}

fn quantity_to_u64(value: &Value) -> Result<u64> {
    match value {
        Value::String(s) => u64::from_str_radix(s.trim_start_matches("0x"), 16)
            .with_context(|| format!("Invalid quantity: {s}")),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| anyhow!("Invalid quantity: {n}")),
        other => Err(anyhow!("Invalid quantity: {other}")),
    }
}

fn quantity_to_u256(value: &Value) -> Result<U256> {
    match value {
        Value::String(s) => U256::from_str_radix(s.trim_start_matches("0x"), 16)
            .map_err(|_| anyhow!("Invalid quantity: {s}")),
        Value::Number(n) => Ok(U256::from(
            n.as_u64().ok_or_else(|| anyhow!("Invalid quantity: {n}"))?,
        )),
        other => Err(anyhow!("Invalid quantity: {other}")),
    }
}

/// Production `RelayApi` backed by the relay's HTTP surface and the public
/// block explorer.
pub struct HttpRelayApi {
    base_url: String,
    http: reqwest::Client,
    explorer: ExplorerClient,
    explorer_api_key: Option<String>,
}

impl HttpRelayApi {
    pub fn new(base_url: impl Into<String>, explorer_api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
            explorer: ExplorerClient::new(),
            explorer_api_key,
        }
    }
}

#[async_trait]
impl RelayApi for HttpRelayApi {
    async fn account_info(&self, network: Network, address: &str) -> Result<NetworkInfo> {
        let url = format!("{}/api/account/{address}?network={network}", self.base_url);
        let info = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<NetworkInfo>()
            .await?;
        Ok(info)
    }

    async fn tokens_of(
        &self,
        network: Network,
        contract: &str,
        address: &str,
    ) -> Result<Vec<u64>> {
        #[derive(Deserialize)]
        struct TokensResponse {
            tokens: Vec<u64>,
        }
        let url = format!(
            "{}/api/tokens/{address}?network={network}&contract={contract}",
            self.base_url
        );
        let response = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<TokensResponse>()
            .await?;
        Ok(response.tokens)
    }

    async fn token_metadata(
        &self,
        network: Network,
        contract: &str,
        id: u64,
    ) -> Result<TokenMeta> {
        #[derive(Deserialize)]
        struct UriResponse {
            metadata: Option<Value>,
        }
        let url = format!(
            "{}/api/tokenUri?network={network}&contract={contract}&id={id}&fetch=1",
            self.base_url
        );
        let response = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<UriResponse>()
            .await?;

        let metadata = response.metadata.unwrap_or(Value::Null);
        let name = metadata
            .get("name")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| format!("Token #{id}"));
        let image = metadata
            .get("image")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(TokenMeta { name, image })
    }

    async fn recent_transactions(&self, address: &str, chain_id: u64) -> Result<Vec<TxSummary>> {
        self.explorer
            .fetch_recent_transactions(address, chain_id, self.explorer_api_key.as_deref())
            .await
    }
}
