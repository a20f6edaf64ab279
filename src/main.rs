use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use dotenvy::dotenv;
use order_intake::domain::ports::FileStore;
use order_intake::{
    build_server, create_pool, run_migrations, DieselOrderRepository, LocalFileStore,
    OrderService, RemoteImageStore,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .expect("PORT must be a valid number");

    let pool = create_pool(&database_url);
    run_migrations(&pool);
    log::info!("Database ready");

    let backend = env::var("STORAGE_BACKEND").unwrap_or_else(|_| "local".to_string());
    let (store, uploads_dir): (Arc<dyn FileStore>, Option<PathBuf>) = match backend.as_str() {
        "remote" => {
            let api_base =
                env::var("STORAGE_API_BASE").expect("STORAGE_API_BASE must be set for remote storage");
            let account =
                env::var("STORAGE_ACCOUNT").expect("STORAGE_ACCOUNT must be set for remote storage");
            let key = env::var("STORAGE_KEY").expect("STORAGE_KEY must be set for remote storage");
            let secret =
                env::var("STORAGE_SECRET").expect("STORAGE_SECRET must be set for remote storage");
            log::info!("Using remote image storage (account '{}')", account);
            (
                Arc::new(RemoteImageStore::new(&api_base, &account, key, secret)),
                None,
            )
        }
        "local" => {
            let dir = PathBuf::from(env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()));
            let store = LocalFileStore::new(&dir)?;
            log::info!("Using local image storage at {}", dir.display());
            (Arc::new(store), Some(dir))
        }
        other => panic!("STORAGE_BACKEND must be 'local' or 'remote', got '{}'", other),
    };

    let service = OrderService::new(Arc::new(DieselOrderRepository::new(pool)), store);

    log::info!("Starting server at http://{}:{}", host, port);

    build_server(service, uploads_dir, &host, port)?.await
}
