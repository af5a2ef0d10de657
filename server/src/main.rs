#![allow(dead_code)]

mod error;
mod ingest;
mod model;
mod prompt;
mod rate_limiters;
mod routes;
mod server_config;
mod state;
#[cfg(test)]
mod testing;
mod util;

use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use axum::extract::FromRef;
use mimalloc::MiMalloc;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ingest::{BatchWorker, EventQueue, WorkerSettings};
use prompt::ChatClassifier;
use rate_limiters::RateLimiters;
use routes::AppRouter;
use server_config::cfg;
use state::{category_feed::CategoryFeed, device_cache::DeviceCache};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

pub type HttpClient = reqwest::Client;

#[derive(Clone, FromRef)]
pub struct ServerState {
    pub http_client: HttpClient,
    pub conn: DatabaseConnection,
    pub rate_limiters: RateLimiters,
    pub event_queue: EventQueue,
    pub category_feed: CategoryFeed,
    pub device_cache: DeviceCache,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::Layer::default().with_ansi(false))
        .init();

    let db_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://usage.db?mode=rwc".to_string());
    let mut db_options = ConnectOptions::new(db_url);
    db_options.sqlx_logging(false);

    let conn = Database::connect(db_options)
        .await
        .expect("Database connection failed");

    model::init_schema(&conn).await.expect("Schema init failed");

    let http_client = reqwest::Client::new();
    let rate_limiters = RateLimiters::from_env();
    let event_queue = EventQueue::new();
    let category_feed = CategoryFeed::new();
    let device_cache = DeviceCache::new();

    let loaded = device_cache
        .load(&conn)
        .await
        .expect("Device cache failed to load");
    tracing::info!("Loaded {} devices into cache", loaded);

    let state = ServerState {
        http_client: http_client.clone(),
        conn: conn.clone(),
        rate_limiters: rate_limiters.clone(),
        event_queue: event_queue.clone(),
        category_feed,
        device_cache,
    };

    let classifier = Arc::new(ChatClassifier::new(http_client, rate_limiters));
    let worker = BatchWorker::new(event_queue, conn, classifier, WorkerSettings::from_cfg());
    worker.start();

    let router = AppRouter::create(state);

    let port = env::var("PORT").unwrap_or("5006".to_string());
    tracing::info!("Searchtrack server running on http://0.0.0.0:{}", port);
    // check config
    println!("{}", *cfg);

    let addr = SocketAddr::from(([0, 0, 0, 0], port.parse::<u16>().unwrap()));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    // Let the current worker iteration finish; in-flight dispatch is not
    // cancelled
    worker
        .stop(Duration::from_millis(cfg.ingest.worker_join_timeout_ms))
        .await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down");
        },
    }
}
