use std::future::Future;
use std::sync::Arc;

use ethers::{
    contract::Contract,
    core::types::{Address, U256},
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    utils::format_ether,
};
use futures::join;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::error::{upstream, RelayError};
use crate::infrastructure::config::{self, MintSettings, Network};

/// Immutable snapshot of upstream network state, cached by the HTTP surface
/// under `net:{network}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub gas_price_wei: String,
    pub block_number: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintOutcome {
    pub tx_hash: String,
    pub block_number: Option<u64>,
}

fn token_abi() -> ethers::abi::Abi {
    let abi_bytes = include_bytes!("../../abi/DemoToken.json");
    serde_json::from_slice(abi_bytes).expect("bundled DemoToken ABI is valid JSON")
}

/// Runs `op` against each endpoint in order with a fresh provider, returning
/// the first success. Failures are recorded and the next endpoint is tried;
/// when every endpoint has failed, the *last* recorded error is returned, on
/// the theory that the most recent failure is the most relevant diagnostic.
/// Endpoints are attempted strictly sequentially, never concurrently.
pub async fn with_endpoints<T, F, Fut>(urls: &[String], op: F) -> Result<T, RelayError>
where
    F: Fn(Provider<Http>) -> Fut,
    Fut: Future<Output = Result<T, RelayError>>,
{
    let mut last_err = RelayError::Config("No RPC endpoints configured".to_string());
    for url in urls {
        let provider = match Provider::<Http>::try_from(url.as_str()) {
            Ok(provider) => provider,
            Err(err) => {
                warn!(url = %url, error = %err, "skipping malformed RPC endpoint");
                last_err = upstream(err);
                continue;
            }
        };
        match op(provider).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                debug!(url = %url, error = %err, "RPC endpoint failed, trying next");
                last_err = err;
            }
        }
    }
    Err(last_err)
}

/// Read-only query layer over the node client. Hides endpoint selection and
/// failover behind simple operations; holds no connection state of its own.
#[derive(Clone, Default)]
pub struct ChainClient;

impl ChainClient {
    pub fn new() -> Self {
        Self
    }

    async fn query<T, F, Fut>(&self, network: Network, op: F) -> Result<T, RelayError>
    where
        F: Fn(Provider<Http>) -> Fut,
        Fut: Future<Output = Result<T, RelayError>>,
    {
        let urls = config::rpc_urls_for(network);
        with_endpoints(&urls, op).await
    }

    /// Current gas price and chain head as seen by the first endpoint that
    /// answers. Gas price prefers `eth_gasPrice`, falls back to the EIP-1559
    /// max-fee estimate, and defaults to zero when neither is available.
    pub async fn get_network_info(&self, network: Network) -> Result<NetworkInfo, RelayError> {
        self.query(network, |provider| async move {
            let (gas_price, block_number) = join!(
                async {
                    match provider.get_gas_price().await {
                        Ok(price) => price,
                        Err(_) => match provider.estimate_eip1559_fees(None).await {
                            Ok((max_fee, _)) => max_fee,
                            Err(_) => U256::zero(),
                        },
                    }
                },
                provider.get_block_number()
            );
            let block_number = block_number.map_err(upstream)?;
            Ok(NetworkInfo {
                gas_price_wei: gas_price.to_string(),
                block_number: block_number.as_u64(),
            })
        })
        .await
    }

    /// Native balance of `address`, converted from wei to a whole-ether
    /// decimal string.
    pub async fn get_balance_eth(
        &self,
        network: Network,
        address: Address,
    ) -> Result<String, RelayError> {
        self.query(network, move |provider| async move {
            let balance = provider
                .get_balance(address, None)
                .await
                .map_err(upstream)?;
            Ok(format_ether(balance))
        })
        .await
    }

    /// Token ids owned by `owner` on `contract`, read as `balanceOf` followed
    /// by `tokenOfOwnerByIndex` for each index. Balance and enumeration are
    /// issued against the same endpoint within one attempt, but the reads are
    /// not pinned to a block; a concurrent mint or transfer can skew the
    /// result. Accepted, matching plain unsynchronized read calls.
    pub async fn tokens_of(
        &self,
        network: Network,
        contract: Address,
        owner: Address,
    ) -> Result<Vec<u64>, RelayError> {
        self.query(network, move |provider| async move {
            let token = Contract::new(contract, token_abi(), Arc::new(provider));
            let balance: U256 = token
                .method::<_, U256>("balanceOf", owner)
                .map_err(upstream)?
                .call()
                .await
                .map_err(upstream)?;
            let token = &token;
            enumerate_owned(balance, move |index| async move {
                token
                    .method::<_, U256>("tokenOfOwnerByIndex", (owner, U256::from(index)))
                    .map_err(upstream)?
                    .call()
                    .await
                    .map_err(upstream)
            })
            .await
        })
        .await
    }

    /// Metadata URI for a token, after checking the contract actually has
    /// code on the queried network.
    pub async fn token_uri(
        &self,
        network: Network,
        contract: Address,
        id: u64,
    ) -> Result<String, RelayError> {
        self.query(network, move |provider| async move {
            ensure_code_at(&provider, contract, "Contract not found").await?;
            let token = Contract::new(contract, token_abi(), Arc::new(provider));
            let uri: String = token
                .method::<_, String>("tokenURI", U256::from(id))
                .map_err(upstream)?
                .call()
                .await
                .map_err(upstream)?;
            Ok(uri)
        })
        .await
    }

    /// Submits `safeMint(to)` with the configured signing key and waits for
    /// inclusion. State-changing calls never retry across endpoints; the
    /// first configured endpoint is the only one used.
    pub async fn mint(
        &self,
        settings: &MintSettings,
        to: Address,
        check_code: bool,
    ) -> Result<MintOutcome, RelayError> {
        let provider = Provider::<Http>::try_from(settings.rpc_url.as_str()).map_err(upstream)?;

        let contract_address: Address = settings.contract_address.parse().map_err(|_| {
            RelayError::Validation(format!(
                "Invalid contract address: {}",
                settings.contract_address
            ))
        })?;

        if check_code {
            ensure_code_at(
                &provider,
                contract_address,
                "Contract not found at address on selected network",
            )
            .await?;
        }

        let chain_id = provider.get_chainid().await.map_err(upstream)?;
        let wallet = settings
            .private_key
            .parse::<LocalWallet>()
            .map_err(|_| {
                RelayError::Validation("Invalid private key for selected network".to_string())
            })?
            .with_chain_id(chain_id.low_u64());

        let signer = Arc::new(SignerMiddleware::new(provider, wallet));
        let token = Contract::new(contract_address, token_abi(), signer);

        let call = token.method::<_, ()>("safeMint", to).map_err(upstream)?;
        let pending = call.send().await.map_err(upstream)?;
        let tx_hash = format!("{:#x}", pending.tx_hash());
        let receipt = pending.await.map_err(upstream)?.ok_or_else(|| {
            RelayError::Upstream("Mint transaction was dropped before inclusion".to_string())
        })?;

        Ok(MintOutcome {
            tx_hash,
            block_number: receipt.block_number.map(|block| block.as_u64()),
        })
    }
}

/// Looks up one token id per owned index. A zero balance yields an empty
/// list without a single index lookup; any lookup failure aborts the whole
/// enumeration.
async fn enumerate_owned<F, Fut>(balance: U256, token_at: F) -> Result<Vec<u64>, RelayError>
where
    F: Fn(u64) -> Fut,
    Fut: Future<Output = Result<U256, RelayError>>,
{
    let count = balance.low_u64();
    let mut ids = Vec::with_capacity(count as usize);
    for index in 0..count {
        // Ids wider than u64 truncate.
        ids.push(token_at(index).await?.low_u64());
    }
    Ok(ids)
}

async fn ensure_code_at(
    provider: &Provider<Http>,
    contract: Address,
    message: &'static str,
) -> Result<(), RelayError> {
    let code = provider.get_code(contract, None).await.map_err(upstream)?;
    if code.is_empty() {
        return Err(RelayError::Validation(message.to_string()));
    }
    Ok(())
}
