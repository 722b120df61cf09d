use actix_web::{web, App, HttpServer};
use eyre::{Result, WrapErr};
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;
use web3_client::{api, config::Config, AlloyClient, ChainClient};

/// Application entry point
///
/// This is the main function that:
/// 1. Sets up logging
/// 2. Loads configuration
/// 3. Connects the chain client to the Ethereum node
/// 4. Starts the HTTP gateway with all endpoints
#[actix_web::main] // Actix will build a multithreaded runtime
async fn main() -> Result<()> {
    // Debug level for our crate, lower levels for dependencies to reduce noise
    let filter = EnvFilter::from_default_env()
        .add_directive("web3_client=info".parse()?)
        .add_directive("actix_web=error".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env().wrap_err("Failed to load config")?;
    info!("Loaded configuration: {:?}", config);

    let client = AlloyClient::connect(
        &config.client_name,
        &config.ethereum_rpc_url,
        config.signer_private_key.as_deref(),
    )
    .await
    .wrap_err("Failed to connect to Ethereum")?;

    if let Some(address) = client.signer_address() {
        info!("Local signer configured for {}", address);
    }

    let client: Arc<dyn ChainClient> = Arc::new(client);

    HttpServer::new(move || {
        App::new()
            // Add logging middleware
            .wrap(TracingLogger::default())
            // Register the client as application data (shared between requests)
            .app_data(web::Data::new(client.clone()))
            .configure(api::configure)
    })
    // Set number of worker threads
    .workers(4)
    .bind(format!("{}:{}", config.host, config.port))?
    .run()
    .await?;

    Ok(())
}
