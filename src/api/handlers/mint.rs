use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::domain::error::RelayError;
use crate::infrastructure::blockchain::client::ChainClient;
use crate::infrastructure::config::{mint_settings_for, Network};
use crate::validators::request::{parse_address, parse_mint_network};

#[derive(Debug, Deserialize)]
pub struct MintRequest {
    pub to: Option<String>,
    pub network: Option<String>,
    /// Optional override of the configured contract address.
    pub contract: Option<String>,
}

/// Server-side mint with the relay's signing key. Input is validated and the
/// signing configuration resolved before any network call; configuration gaps
/// surface as 400s since the caller picked the network.
#[post("/mint")]
pub async fn mint(
    body: web::Json<MintRequest>,
    chain: web::Data<ChainClient>,
) -> Result<HttpResponse, RelayError> {
    let to = parse_address(body.to.as_deref().unwrap_or(""))?;
    let network = parse_mint_network(body.network.as_deref())?;

    let mut settings =
        mint_settings_for(network).map_err(|err| RelayError::Validation(err.to_string()))?;
    if let Some(contract) = body.contract.as_deref().filter(|value| !value.is_empty()) {
        parse_address(contract)?;
        settings.contract_address = contract.to_string();
    }

    info!(network = %network, to = ?to, "mint requested");
    let outcome = chain.mint(&settings, to, true).await?;

    Ok(HttpResponse::Ok().json(json!({
        "network": network.to_string(),
        "txHash": outcome.tx_hash,
        "blockNumber": outcome.block_number,
    })))
}

#[derive(Debug, Deserialize)]
pub struct LocalMintRequest {
    pub to: Option<String>,
}

/// Convenience mint against the local dev chain. Skips the contract code
/// check so it works against a node that was just redeployed.
#[post("/local/mint")]
pub async fn local_mint(
    body: web::Json<LocalMintRequest>,
    chain: web::Data<ChainClient>,
) -> Result<HttpResponse, RelayError> {
    let to = parse_address(body.to.as_deref().unwrap_or(""))?;
    let settings = mint_settings_for(Network::Localhost)
        .map_err(|err| RelayError::Validation(err.to_string()))?;

    let outcome = chain.mint(&settings, to, false).await?;

    Ok(HttpResponse::Ok().json(json!({
        "network": Network::Localhost.to_string(),
        "txHash": outcome.tx_hash,
        "blockNumber": outcome.block_number,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};

    macro_rules! service {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(ChainClient::new()))
                    .service(web::scope("/api").service(mint).service(local_mint)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn mint_rejects_a_missing_recipient() {
        let app = service!();
        let req = test::TestRequest::post()
            .uri("/api/mint")
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid address: ");
    }

    #[actix_web::test]
    async fn mint_rejects_a_malformed_recipient() {
        let app = service!();
        let req = test::TestRequest::post()
            .uri("/api/mint")
            .set_json(json!({ "to": "0xnope" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn mint_is_not_offered_on_mainnet() {
        let app = service!();
        let req = test::TestRequest::post()
            .uri("/api/mint")
            .set_json(json!({
                "to": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
                "network": "mainnet",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn mint_rejects_a_malformed_contract_override() {
        let app = service!();
        let req = test::TestRequest::post()
            .uri("/api/mint")
            .set_json(json!({
                "to": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
                "contract": "not-a-contract",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn local_mint_rejects_a_malformed_recipient() {
        let app = service!();
        let req = test::TestRequest::post()
            .uri("/api/local/mint")
            .set_json(json!({ "to": "0x123" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
