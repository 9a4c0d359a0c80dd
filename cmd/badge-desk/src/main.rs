//! # Badge Desk Binary
//!
//! Assembles the application: configuration, adapters, services, router.

use std::sync::Arc;

use anyhow::{bail, Context};
use api_adapters::{router, AppState, Metrics};
use configs::{AppConfig, LedgerBackend, LedgerConfig, LogFormat};
use domains::{AssetStore, PickupStore};
use secrecy::ExposeSecret;
use services::{BadgeService, BadgeSettings, PassDirectoryCache, PickupLedger, ResolutionService};
use storage_adapters::{HttpPassDirectory, LocalAssetStore, MemoryPickupStore, PdfRenderer, QrCodeEncoder};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::load().context("loading configuration")?;
    init_tracing(cfg.log.format);

    // 1. Upstream directory
    let Some(directory_url) = cfg.directory.url.as_ref() else {
        bail!("directory.url (or EVENTIVE_API_URL) must be set");
    };
    let source = HttpPassDirectory::new(directory_url.expose_secret(), cfg.directory.timeout())?;
    let directory = Arc::new(PassDirectoryCache::new(Arc::new(source)));

    // Warm the cache; a failure here is not fatal, the operator can refresh.
    if let Err(e) = directory.refresh().await {
        warn!(error = %e, "initial directory fetch failed");
    }

    // 2. Pickup ledger
    let ledger = PickupLedger::with_max_attempts(pickup_store(&cfg.ledger)?, cfg.ledger.max_attempts);

    // 3. Badge composition
    let assets: Arc<dyn AssetStore> = Arc::new(LocalAssetStore::with_font_file(
        &cfg.assets.root,
        cfg.assets.font_file.as_str(),
    ));
    let settings = BadgeSettings {
        font_size: cfg.badge.font_size,
        ..BadgeSettings::default()
    };
    let badges = BadgeService::new(
        Arc::clone(&assets),
        Arc::new(QrCodeEncoder::new()),
        Arc::new(PdfRenderer::new()),
        settings,
    );

    let state = AppState {
        resolution: Arc::new(ResolutionService::new(
            Arc::clone(&directory),
            cfg.directory.refresh_on_resolve,
        )),
        directory,
        ledger: Arc::new(ledger),
        badges: Arc::new(badges),
        assets,
        metrics: Arc::new(Metrics::new()),
    };

    let address = cfg.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;

    info!(
        address = %address,
        ledger = ?cfg.ledger.backend,
        assets = %cfg.assets.root.display(),
        "badge desk listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("badge desk stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
    }
}

fn pickup_store(cfg: &LedgerConfig) -> anyhow::Result<Arc<dyn PickupStore>> {
    match cfg.backend {
        LedgerBackend::Memory => {
            warn!("using the in-memory ledger; pickups are not shared between processes");
            Ok(Arc::new(MemoryPickupStore::with_key(cfg.key.as_str())))
        }
        #[cfg(feature = "redis")]
        LedgerBackend::Redis => {
            let url = cfg
                .redis_url
                .as_ref()
                .context("ledger.redis_url (or REDIS_URL) must be set")?;
            let store = storage_adapters::RedisPickupStore::new(url.expose_secret(), cfg.key.as_str())?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "redis"))]
        LedgerBackend::Redis => bail!("ledger.backend = redis, but built without the `redis` feature"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
