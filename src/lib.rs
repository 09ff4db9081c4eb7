pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod messaging;
pub mod outbox;
pub mod saga;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::AppConfig;
pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::orders::create_order,
        handlers::orders::track_order,
    ),
    components(schemas(
        handlers::orders::CreateOrderRequest,
        handlers::orders::OrderAddressRequest,
        handlers::orders::CreateOrderItemRequest,
        handlers::orders::CreateOrderResponse,
        handlers::orders::TrackOrderResponse,
    )),
    tags(
        (name = "orders", description = "Order intake and tracking endpoints")
    ),
    info(
        title = "Order Service API",
        version = "0.1.0",
        description = "REST edge of the order service; orders progress through the payment and restaurant approval saga via transactional outboxes"
    )
)]
pub struct ApiDoc;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool
        .get()
        .expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let openapi = ApiDoc::openapi();
    Ok(HttpServer::new(move || {
        let order_service =
            application::order_service::OrderApplicationService::new(pool.clone());
        App::new()
            .app_data(web::Data::new(order_service))
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
            .service(
                web::scope("/orders")
                    .route("", web::post().to(handlers::orders::create_order))
                    .route(
                        "/track/{tracking_id}",
                        web::get().to(handlers::orders::track_order),
                    ),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
