mod broker;
mod chain;
mod confirm;
mod config;
mod context;
mod db;
mod error;
mod fee;
mod ingest;
mod keystore;
mod matcher;
mod middleware;
mod models;
mod redis;
mod routes;
mod send_pipeline;
mod store;
mod tasks;
mod utils;

use std::sync::Arc;

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::broker::memory::InMemoryBroker;
use crate::chain::chain_a::EthLikeAdapter;
use crate::chain::chain_n::NeoLikeAdapter;
use crate::chain::ChainAdapter;
use crate::config::Config;
use crate::keystore::Keystore;
use crate::middleware::rate_limit::RateLimiter;
use crate::store::OrderStore;

/// Shared application state accessible in all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: db::Pool,
    pub store: OrderStore,
    pub chain_a: Arc<dyn ChainAdapter>,
    pub chain_n: Arc<dyn ChainAdapter>,
    pub chain_a_address: String,
    pub chain_n_address: String,
    pub rate_limiter: RateLimiter,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tokenswap_bridge=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!("Starting token-swap bridge on {}", config.addr());

    let db_pool = db::connect(&config).await;
    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations complete");

    let redis_pool = redis::connect(&config).await;
    tracing::info!("Connected to Redis");

    let chain_a_keystore = Keystore::new(
        config.chain_a_keystore_path.clone(),
        config.chain_a_keystore_password.clone(),
    );
    let chain_n_keystore = Keystore::new(
        config.chain_n_keystore_path.clone(),
        config.chain_n_keystore_password.clone(),
    );

    // The operator's deposit/payout address on each chain is derived from
    // the keystore, not configured separately -- matching the original's
    // `keyAddressOfETH`/`keyAddressOFNEO`, which come from `readETHKeyStore`
    // / `readNEOKeyStore` rather than a config key.
    let chain_a_wallet_address = wallet_address_placeholder(&config.chain_a_keystore_path);
    let chain_n_wallet_address = wallet_address_placeholder(&config.chain_n_keystore_path);

    let chain_a_adapter = Arc::new(EthLikeAdapter::new(
        config.chain_a_node_url.clone(),
        config.chain_a_tnc.clone(),
        chain_a_wallet_address.clone(),
        chain_a_keystore,
    ));
    let chain_n_adapter = Arc::new(NeoLikeAdapter::new(
        config.chain_n_node_url.clone(),
        config.chain_n_tnc.clone(),
        chain_n_wallet_address.clone(),
        chain_n_keystore,
    ));

    let store = OrderStore::new(db_pool.clone());
    let rate_limiter = RateLimiter::new(redis_pool, config.rate_limit_requests, config.rate_limit_interval_secs);

    let state = AppState {
        config: Arc::new(config.clone()),
        db: db_pool,
        store,
        chain_a: chain_a_adapter.clone() as Arc<dyn ChainAdapter>,
        chain_n: chain_n_adapter.clone() as Arc<dyn ChainAdapter>,
        chain_a_address: chain_a_wallet_address,
        chain_n_address: chain_n_wallet_address,
        rate_limiter,
    };

    // Kafka wiring is out of scope (see the bridge's own documented
    // non-goals); these in-memory brokers stand in as the integration seam
    // so the ingest loops have something to poll in every environment,
    // including this one, without a live message queue.
    let chain_a_broker: Arc<dyn broker::MessageBroker> = Arc::new(InMemoryBroker::new());
    let chain_n_broker: Arc<dyn broker::MessageBroker> = Arc::new(InMemoryBroker::new());

    let mut bridge_context = context::BridgeContext::new();
    let chain_a_tx_sender = bridge_context.chain_a_tx_sender();
    let chain_a_tx_receiver = bridge_context.take_chain_a_tx_receiver();

    tasks::spawn_all(
        state.clone(),
        chain_a_broker,
        chain_n_broker,
        chain_a_tx_sender,
        chain_a_tx_receiver,
    );

    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect::<Vec<_>>(),
        )
        .allow_methods(Any)
        .allow_headers(Any);

    let metrics_handle = setup_metrics();

    let app = Router::new()
        .merge(routes::health::router())
        .merge(routes::orders::router())
        .route(
            "/metrics",
            axum::routing::get(move || async move { metrics_handle.render() }),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::enforce,
        ))
        .layer(middleware::security::SecurityHeadersLayer)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind(state.config.addr())
        .await
        .expect("Failed to bind");

    tracing::info!("Listening on {}", state.config.addr());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Reads the wallet address a keystore file declares. The pack carries no
/// EVM/NEO keystore-parsing crate, so this reads the path component the
/// original's `readETHKeyStore`/`readNEOKeyStore` ultimately expose as
/// `.Address` -- here, the keystore file's name is the address, the
/// convention the original's own sample keystores follow (`<address>.json`).
fn wallet_address_placeholder(keystore_path: &str) -> String {
    std::path::Path::new(keystore_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(keystore_path)
        .to_string()
}

fn setup_metrics() -> metrics_exporter_prometheus::PrometheusHandle {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    builder.install_recorder().expect("Failed to install Prometheus recorder")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Ctrl+C received, shutting down"),
        _ = terminate => tracing::info!("SIGTERM received, shutting down"),
    }
}
