//! Server bootstrap: load config, connect and discover each endpoint, serve.

use std::collections::HashMap;
use std::sync::Arc;
use tablegate::{
    api_routes, common_routes, discover_endpoint, load_config, register_endpoint, AppState,
    DiscoveryError, EndpointCatalog, EndpointConfig, EndpointRuntime, MssqlPool, RouteTable,
    SchemaRegistry,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tablegate=info".parse()?))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CONFIG_PATH").ok())
        .unwrap_or_else(|| "tablegate.json".to_string());
    let config = load_config(&config_path)?;

    let mut endpoints = HashMap::new();
    let mut route_table = RouteTable::new();
    let registry = SchemaRegistry::new();

    for ep in &config.endpoints {
        match connect_and_discover(ep).await {
            Ok((pool, catalog)) => {
                register_endpoint(&ep.name, ep.advanced, catalog, &mut route_table, &registry);
                endpoints.insert(
                    ep.name.clone(),
                    EndpointRuntime {
                        name: ep.name.clone(),
                        pool,
                        advanced: ep.advanced,
                    },
                );
            }
            // A failed endpoint is logged and skipped; the rest still serve.
            Err(e) => {
                tracing::error!(endpoint = %ep.name, error = %e, "discovery failed, endpoint skipped");
            }
        }
    }

    let state = AppState {
        endpoints: Arc::new(endpoints),
        routes: Arc::new(route_table),
        registry,
    };
    let app = axum::Router::new()
        .merge(common_routes())
        .merge(api_routes(state));

    let listener = TcpListener::bind(&config.listen).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn connect_and_discover(
    cfg: &EndpointConfig,
) -> Result<(MssqlPool, EndpointCatalog), DiscoveryError> {
    let tiberius_config = tiberius::Config::from_ado_string(&cfg.connection)?;
    let manager = bb8_tiberius::ConnectionManager::new(tiberius_config);
    let pool = bb8::Pool::builder()
        .max_size(cfg.pool_size)
        .build(manager)
        .await?;
    let catalog = discover_endpoint(&pool, cfg).await?;
    Ok((pool, catalog))
}
