use actix_web::{get, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::domain::error::RelayError;
use crate::infrastructure::blockchain::client::ChainClient;
use crate::infrastructure::config::Network;
use crate::validators::request::{
    parse_address, parse_any_network, parse_query_network, parse_token_id,
};

#[derive(Debug, Deserialize)]
pub struct TokensQuery {
    pub network: Option<String>,
    pub contract: Option<String>,
}

/// Token ids owned by an address, enumerated through the contract.
#[get("/tokens/{address}")]
pub async fn tokens(
    path: web::Path<String>,
    query: web::Query<TokensQuery>,
    chain: web::Data<ChainClient>,
) -> Result<HttpResponse, RelayError> {
    let raw_owner = path.into_inner();
    let network = parse_query_network(query.network.as_deref())?;
    let owner = parse_address(&raw_owner)?;
    let contract = required_contract(query.contract.as_deref())?;

    let ids = chain.tokens_of(network, contract, owner).await?;
    let raw_contract = query.contract.as_deref().unwrap_or_default();
    Ok(HttpResponse::Ok().json(tokens_response(&raw_owner, network, raw_contract, &ids)))
}

/// Response echoes the queried identifiers alongside the ids so the caller
/// can correlate answers without carrying its own request context.
fn tokens_response(
    address: &str,
    network: Network,
    contract: &str,
    token_ids: &[u64],
) -> serde_json::Value {
    json!({
        "address": address,
        "network": network.to_string(),
        "contract": contract,
        "tokens": token_ids,
    })
}

#[derive(Debug, Deserialize)]
pub struct TokenUriQuery {
    pub network: Option<String>,
    pub contract: Option<String>,
    pub id: Option<String>,
    pub fetch: Option<String>,
}

/// Resolves a token's metadata URI, and by default also fetches the metadata
/// document behind it. A metadata fetch failure is reported in-band with a
/// 200; the URI itself is still useful to the caller.
#[get("/tokenUri")]
pub async fn token_uri(
    query: web::Query<TokenUriQuery>,
    chain: web::Data<ChainClient>,
) -> Result<HttpResponse, RelayError> {
    let network = parse_any_network(query.network.as_deref())?;
    let contract = required_contract(query.contract.as_deref())?;
    let id = match query.id.as_deref() {
        Some(raw) if !raw.is_empty() => parse_token_id(raw)?,
        _ => return Err(RelayError::Validation("Missing token id".to_string())),
    };
    let fetch = query.fetch.as_deref().unwrap_or("1") != "0";

    let uri = chain.token_uri(network, contract, id).await?;
    if !fetch {
        return Ok(HttpResponse::Ok().json(json!({ "uri": uri })));
    }

    match fetch_metadata(&uri).await {
        Ok(doc) => Ok(HttpResponse::Ok().json(json!({
            "uri": uri,
            "metadata": doc,
        }))),
        Err(err) => {
            warn!(uri = %uri, error = %err, "token metadata fetch failed");
            Ok(HttpResponse::Ok().json(json!({
                "uri": uri,
                "error": "Failed to fetch metadata",
            })))
        }
    }
}

async fn fetch_metadata(uri: &str) -> anyhow::Result<serde_json::Value> {
    let value = reqwest::get(uri)
        .await?
        .error_for_status()?
        .json::<serde_json::Value>()
        .await?;
    Ok(value)
}

/// Placeholder metadata document for locally minted tokens, so `tokenURI`
/// targets pointing at this relay resolve to something renderable.
#[get("/metadata/{id}")]
pub async fn metadata(path: web::Path<String>) -> Result<HttpResponse, RelayError> {
    let id = parse_token_id(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(json!({
        "name": format!("DemoToken #{id}"),
        "description": "Demo token minted through the relay",
        "image": format!("https://via.placeholder.com/300?text=DemoToken+%23{id}"),
    })))
}

fn required_contract(raw: Option<&str>) -> Result<ethers::core::types::Address, RelayError> {
    match raw {
        Some(value) if !value.is_empty() => parse_address(value),
        _ => Err(RelayError::Validation(
            "Missing contract address".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};

    const OWNER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    macro_rules! service {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(ChainClient::new()))
                    .service(metadata)
                    .service(web::scope("/api").service(tokens).service(token_uri)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn tokens_requires_a_contract_parameter() {
        let app = service!();
        let req = test::TestRequest::get()
            .uri(&format!("/api/tokens/{OWNER}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Missing contract address");
    }

    #[actix_web::test]
    async fn tokens_rejects_a_malformed_owner() {
        let app = service!();
        let req = test::TestRequest::get()
            .uri("/api/tokens/0x123?contract=0x5FbDB2315678afecb367f032d93F642f64180aa3")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn token_uri_requires_an_id() {
        let app = service!();
        let req = test::TestRequest::get()
            .uri("/api/tokenUri?contract=0x5FbDB2315678afecb367f032d93F642f64180aa3")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Missing token id");
    }

    #[actix_web::test]
    async fn token_uri_rejects_a_non_decimal_id() {
        let app = service!();
        let req = test::TestRequest::get()
            .uri("/api/tokenUri?contract=0x5FbDB2315678afecb367f032d93F642f64180aa3&id=0x10")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[::core::prelude::v1::test]
    fn tokens_response_echoes_the_queried_identifiers() {
        let body = tokens_response(OWNER, Network::Sepolia, CONTRACT, &[1, 4]);
        assert_eq!(body["address"], OWNER);
        assert_eq!(body["network"], "sepolia");
        assert_eq!(body["contract"], CONTRACT);
        assert_eq!(body["tokens"], json!([1, 4]));
    }

    #[actix_web::test]
    async fn metadata_placeholder_names_the_token() {
        let app = service!();
        let req = test::TestRequest::get().uri("/metadata/7").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["name"], "DemoToken #7");
        assert!(body["image"].as_str().unwrap().contains("%237"));
    }

    #[actix_web::test]
    async fn metadata_rejects_a_non_numeric_id() {
        let app = service!();
        let req = test::TestRequest::get().uri("/metadata/abc").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
