use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use tokio::sync::Mutex;
use tracing::info;

use token_relay::api::handlers::account::{account, health};
use token_relay::api::handlers::mint::{local_mint, mint};
use token_relay::api::handlers::token::{metadata, token_uri, tokens};
use token_relay::api::handlers::{SharedNetCache, NETWORK_INFO_TTL};
use token_relay::domain::error::RelayError;
use token_relay::infrastructure::blockchain::client::ChainClient;
use token_relay::infrastructure::cache::TtlCache;
use token_relay::infrastructure::config::Config;
use token_relay::infrastructure::logger;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    logger::init();
    let config = Config::from_env();
    info!(port = config.port, "starting token relay");

    let chain = web::Data::new(ChainClient::new());
    let net_cache: web::Data<SharedNetCache> =
        web::Data::new(Mutex::new(TtlCache::new(NETWORK_INFO_TTL)));

    HttpServer::new(move || {
        App::new()
            .app_data(chain.clone())
            .app_data(net_cache.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                actix_web::Error::from(RelayError::Validation(err.to_string()))
            }))
            .wrap(middleware::Logger::default())
            .wrap(Cors::permissive())
            .service(metadata)
            .service(
                web::scope("/api")
                    .service(health)
                    .service(account)
                    .service(tokens)
                    .service(token_uri)
                    .service(mint)
                    .service(local_mint),
            )
    })
    .bind(("0.0.0.0", config.port))?
    .run()
    .await
}
