pub mod application;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::path::PathBuf;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use application::order_service::OrderService;
pub use db::{create_pool, DbPool};
pub use infrastructure::local_store::LocalFileStore;
pub use infrastructure::order_repo::DieselOrderRepository;
pub use infrastructure::remote_store::RemoteImageStore;

/// The service type the HTTP handlers are wired against.
pub type AppService = OrderService<DieselOrderRepository>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database. This is
/// where the create-if-absent statement for the `orders` table lives.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::update_order,
        handlers::orders::delete_order,
    ),
    components(schemas(
        handlers::orders::OrderResponse,
        handlers::orders::UpdateOrderRequest,
    )),
    tags((name = "orders", description = "Order intake and management"))
)]
pub struct ApiDoc;

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// `uploads_dir` is `Some` for the local storage backend, in which case the
/// directory is exposed publicly under `/uploads`. The caller is responsible
/// for `.await`-ing (or `tokio::spawn`-ing) the returned server.
pub fn build_server(
    service: AppService,
    uploads_dir: Option<PathBuf>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let service = web::Data::new(service);

    Ok(HttpServer::new(move || {
        let mut app = App::new()
            .app_data(service.clone())
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .service(
                web::scope("/orders")
                    .route("", web::post().to(handlers::orders::create_order))
                    .route("", web::get().to(handlers::orders::list_orders))
                    .route("/{id}", web::put().to(handlers::orders::update_order))
                    .route("/{id}", web::delete().to(handlers::orders::delete_order)),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            );

        if let Some(dir) = &uploads_dir {
            app = app.service(Files::new("/uploads", dir));
        }

        app
    })
    .bind((host.to_string(), port))?
    .run())
}
