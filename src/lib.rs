pub mod application;
pub mod client;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

#[cfg(test)]
mod testing;

use actix_web::{middleware::DefaultHeaders, middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use db::{create_pool, DbPool};
pub use handlers::AppState;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const CORS_ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::checkout::checkout,
        handlers::callback::payment_callback,
        handlers::orders::get_order,
    ),
    components(schemas(
        handlers::checkout::CheckoutItemRequest,
        handlers::checkout::CheckoutRequestBody,
        handlers::checkout::CheckoutResponse,
        handlers::orders::OrderResponse,
        handlers::orders::OrderItemResponse,
        domain::order::PaymentMethod,
        domain::order::OrderStatus,
        domain::order::PaymentStatus,
    )),
    tags(
        (name = "checkout", description = "Cart checkout and gateway redirect"),
        (name = "payments", description = "Gateway payment notifications"),
        (name = "orders", description = "Order status lookup"),
    )
)]
pub struct ApiDoc;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    log::info!("Applied {} pending migration(s)", applied.len());
    Ok(())
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(state);
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(handlers::json_config())
            .wrap(
                DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Headers", CORS_ALLOW_HEADERS)),
            )
            .wrap(Logger::default())
            .configure(handlers::configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
