use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use sqlx::PgPool;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use order_service::config::{Settings, StoreBackend};
use order_service::db::{self, InMemoryOrderStore, PgOrderStore};
use order_service::domain::order::OrderRepository;
use order_service::metrics::{self, Metrics};
use order_service::service::OrderService;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is fine; real environment variables still apply.
    dotenvy::dotenv().ok();

    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_service=debug")),
        )
        .init();

    tracing::info!("🚀 Starting order service");

    let settings = Settings::from_env()?;
    tracing::info!(backend = settings.backend.as_str(), "Loaded settings");

    let metrics = Arc::new(Metrics::new()?);

    // The pool is owned here and closed on shutdown; the store only borrows it.
    let (repository, pool): (Arc<dyn OrderRepository>, Option<PgPool>) = match settings.backend {
        StoreBackend::Postgres => {
            let pool = db::connect(&settings.database, &metrics).await?;
            db::ensure_schema(&pool).await?;
            let store: Arc<dyn OrderRepository> = Arc::new(PgOrderStore::new(pool.clone()));
            (store, Some(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on exit");
            let store: Arc<dyn OrderRepository> = Arc::new(InMemoryOrderStore::new());
            (store, None)
        }
    };

    let service = web::Data::new(OrderService::new(repository, metrics.clone()));
    let metrics_data = web::Data::new(metrics);

    tracing::info!(
        host = %settings.http.host,
        port = settings.http.port,
        "📡 HTTP server listening"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .app_data(metrics_data.clone())
            .configure(order_service::http::configure)
            .configure(metrics::configure)
    })
    .bind((settings.http.host.as_str(), settings.http.port))?
    .run()
    .await?;

    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("Connection pool closed");
    }

    tracing::info!("👋 Shutdown complete");
    Ok(())
}
