//! CarsRus booking server

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use carsrus_booking::booking::BookingEngine;
use carsrus_booking::cache::{AppCache, DEFAULT_SUBMISSION_TTL};
use carsrus_booking::config::{Config, StoreBackend};
use carsrus_booking::db::{BookingStore, MemoryBookingStore, PgBookingStore};
use carsrus_booking::pricing::feed::RateFeed;
use carsrus_booking::pricing::{detect_display_currency, run_rate_refresher, CurrencyService, HttpExchangeClient};
use carsrus_booking::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carsrus_booking=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    info!("Starting booking server with {:?} store", config.store);

    let store: Arc<dyn BookingStore> = match config.store {
        StoreBackend::Postgres => {
            let url = config.database_url.as_deref().context("DATABASE_URL must be set")?;
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(config.store_timeout)
                .connect(url)
                .await
                .context("failed to connect to database")?;
            info!("Connected to database");
            Arc::new(PgBookingStore::new(pool))
        }
        StoreBackend::Memory => Arc::new(MemoryBookingStore::new()),
    };

    let exchange = Arc::new(
        HttpExchangeClient::new(&config.rate_feed_url, &config.geo_url, config.rate_feed_timeout)
            .context("failed to build exchange rate client")?,
    );
    let display = detect_display_currency(exchange.as_ref()).await;
    let (currency, rate_writer) = CurrencyService::new(display);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let feed: Arc<dyn RateFeed> = exchange;
    let refresher = tokio::spawn(run_rate_refresher(rate_writer, feed, config.rate_refresh, shutdown_rx));

    let engine = BookingEngine::new(store, config.store_timeout);
    let cache = AppCache::with_limits(DEFAULT_SUBMISSION_TTL, config.submission_cache_capacity);
    let state = AppState::new(engine, Arc::new(currency), cache);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = refresher.await {
        tracing::warn!("Rate refresher ended abnormally: {}", e);
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
