use std::sync::Arc;

use card_settlement::config::AppConfig;
use card_settlement::infrastructure::DieselOrderStore;
use card_settlement::{build_server, create_pool, run_migrations, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;
    log::info!("Loaded configuration: gateway {:?}", config.gateway);

    let pool = create_pool(&config.database.url, config.database.max_connections)
        .map_err(std::io::Error::other)?;
    run_migrations(&pool).map_err(std::io::Error::other)?;

    let state = AppState::new(Arc::new(DieselOrderStore::new(pool)), config.gateway);

    log::info!(
        "Starting server at http://{}:{}",
        config.server.host,
        config.server.port
    );

    build_server(state, &config.server.host, config.server.port)?.await
}
