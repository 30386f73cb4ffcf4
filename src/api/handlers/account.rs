use actix_web::{get, web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::api::handlers::{net_cache_key, SharedNetCache};
use crate::domain::error::RelayError;
use crate::infrastructure::blockchain::client::{ChainClient, NetworkInfo};
use crate::infrastructure::config::Network;
use crate::validators::request::{parse_address, parse_query_network};

#[derive(Debug, Deserialize)]
pub struct NetworkQuery {
    pub network: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    network: String,
    block_number: u64,
    gas_price_wei: String,
    balance_eth: String,
    address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    network: String,
    block_number: u64,
    gas_price_wei: String,
}

/// Health probe that proves upstream reachability: fetches the network
/// snapshot directly, bypassing the cache, so a stale entry cannot mask a
/// dead endpoint.
#[get("/health")]
pub async fn health(
    query: web::Query<NetworkQuery>,
    chain: web::Data<ChainClient>,
) -> Result<HttpResponse, RelayError> {
    let network = parse_query_network(query.network.as_deref())?;
    let info = chain.get_network_info(network).await?;
    Ok(HttpResponse::Ok().json(HealthResponse {
        network: network.to_string(),
        block_number: info.block_number,
        gas_price_wei: info.gas_price_wei,
    }))
}

/// Account snapshot: chain head and gas price (cached per network), plus the
/// live balance. Balance is never cached; it changes with every transaction.
#[get("/account/{address}")]
pub async fn account(
    path: web::Path<String>,
    query: web::Query<NetworkQuery>,
    chain: web::Data<ChainClient>,
    cache: web::Data<SharedNetCache>,
) -> Result<HttpResponse, RelayError> {
    let raw_address = path.into_inner();
    let network = parse_query_network(query.network.as_deref())?;
    let address = parse_address(&raw_address)?;

    let info = cached_network_info(&chain, &cache, network).await?;
    let balance_eth = chain.get_balance_eth(network, address).await?;

    Ok(HttpResponse::Ok().json(AccountResponse {
        network: network.to_string(),
        block_number: info.block_number,
        gas_price_wei: info.gas_price_wei,
        balance_eth,
        address: raw_address,
    }))
}

/// Check-then-fetch-then-set. The lock is dropped across the upstream call,
/// so two concurrent misses may both fetch; last write wins.
async fn cached_network_info(
    chain: &ChainClient,
    cache: &SharedNetCache,
    network: Network,
) -> Result<NetworkInfo, RelayError> {
    let key = net_cache_key(network);
    if let Some(info) = cache.lock().await.get(&key) {
        return Ok(info);
    }
    let info = chain.get_network_info(network).await?;
    cache.lock().await.set(key, info.clone());
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::NETWORK_INFO_TTL;
    use crate::infrastructure::cache::TtlCache;
    use actix_web::{http::StatusCode, test, App};
    use tokio::sync::Mutex;

    fn app_state() -> (web::Data<ChainClient>, web::Data<SharedNetCache>) {
        (
            web::Data::new(ChainClient::new()),
            web::Data::new(Mutex::new(TtlCache::new(NETWORK_INFO_TTL))),
        )
    }

    #[actix_web::test]
    async fn health_rejects_an_unknown_network() {
        let (chain, cache) = app_state();
        let app = test::init_service(
            App::new()
                .app_data(chain)
                .app_data(cache)
                .service(web::scope("/api").service(health).service(account)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/health?network=goerli")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[::core::prelude::v1::test]
    fn health_body_carries_the_network_snapshot() {
        let body = serde_json::to_value(HealthResponse {
            network: "sepolia".to_string(),
            block_number: 99,
            gas_price_wei: "7".to_string(),
        })
        .unwrap();
        assert_eq!(body["network"], "sepolia");
        assert_eq!(body["blockNumber"], 99);
        assert_eq!(body["gasPriceWei"], "7");
        assert!(body.get("status").is_none());
    }

    #[actix_web::test]
    async fn malformed_address_is_rejected_before_any_upstream_call() {
        let (chain, cache) = app_state();
        let app = test::init_service(
            App::new()
                .app_data(chain)
                .app_data(cache)
                .service(web::scope("/api").service(account)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/account/not-an-address")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid address: not-an-address");
    }

    #[actix_web::test]
    async fn unknown_network_is_rejected() {
        let (chain, cache) = app_state();
        let app = test::init_service(
            App::new()
                .app_data(chain)
                .app_data(cache)
                .service(web::scope("/api").service(account)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/account/0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266?network=goerli")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn cached_info_is_served_without_an_upstream_call() {
        // Seed the cache, then resolve against a client whose endpoints would
        // all be unreachable; a hit never touches them.
        let chain = ChainClient::new();
        let cache: SharedNetCache = Mutex::new(TtlCache::new(NETWORK_INFO_TTL));
        let seeded = NetworkInfo {
            gas_price_wei: "2000000000".to_string(),
            block_number: 42,
        };
        cache
            .lock()
            .await
            .set(net_cache_key(Network::Sepolia), seeded.clone());

        let info = cached_network_info(&chain, &cache, Network::Sepolia)
            .await
            .unwrap();
        assert_eq!(info, seeded);
    }
}
