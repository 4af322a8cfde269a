//! API Server
//!
//! Builds the router, starts the archive evictor and serves until shutdown.

use super::{
    handlers::AppState,
    middleware::{create_cors_layer, request_id_middleware},
    routes::create_router,
};
use crate::{
    auth::SessionValidator,
    config::FairFlipConfig,
    errors::{ConfigurationError, FairFlipResult},
    games::GameProcessor,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Build shared state from configuration; runs the engine self test.
pub fn app_state(config: &FairFlipConfig) -> FairFlipResult<Arc<AppState>> {
    config.validate()?;
    let processor = GameProcessor::new(&config.game, config.archive_retention())?;

    Ok(Arc::new(AppState {
        processor: Arc::new(processor),
        sessions: SessionValidator::new(&config.auth.jwt_secret, config.auth.issuer.as_deref()),
        reveal_delay: config.reveal_delay(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// Router with the full middleware stack
pub fn build_app(state: Arc<AppState>, config: &FairFlipConfig) -> axum::Router {
    create_router(state)
        // Request ID middleware (first for tracing)
        .layer(axum::middleware::from_fn(request_id_middleware))
        // CORS layer (before timeout to handle preflight)
        .layer(create_cors_layer(config.api.cors_origins.clone()))
        .layer(TimeoutLayer::new(config.request_timeout()))
        // Tracing layer (last for complete request tracing)
        .layer(TraceLayer::new_for_http())
}

pub struct ApiServer {
    config: FairFlipConfig,
}

impl ApiServer {
    pub fn new(config: FairFlipConfig) -> Self {
        Self { config }
    }

    pub async fn run(self) -> FairFlipResult<()> {
        info!("🚀 Starting FairFlip API Server");

        let state = app_state(&self.config)?;
        let evictor = state
            .processor
            .archive()
            .spawn_evictor(self.config.eviction_interval());

        let app = build_app(state, &self.config);
        let addr = self.socket_addr()?;

        info!("   Listen: http://{}", addr);
        self.log_server_info();

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("✅ API Server running");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        evictor.stop();
        info!("🛑 API Server stopped gracefully");
        Ok(())
    }

    fn socket_addr(&self) -> FairFlipResult<SocketAddr> {
        let ip: std::net::IpAddr = self.config.api.host.parse().map_err(|_| {
            ConfigurationError::InvalidValue {
                field: "api.host".to_string(),
                value: self.config.api.host.clone(),
                reason: "Not an IP address".to_string(),
            }
        })?;

        Ok(SocketAddr::from((ip, self.config.api.port)))
    }

    fn log_server_info(&self) {
        info!("📋 Server Configuration:");
        info!("   CORS: {:?}", self.config.api.cors_origins);
        info!("   Request timeout: {}s", self.config.api.request_timeout_secs);
        info!("   Starting balance: {}", self.config.game.starting_balance);
        info!("   Reveal delay: {}ms", self.config.game.reveal_delay_ms);
        info!("   Archive retention: {}s", self.config.archive.retention_secs);

        info!("📊 Available endpoints:");
        info!("   GET    /health                 - Health check");
        info!("   POST   /api/verify             - Verify a flip");
        info!("   POST   /api/verify/commitment  - Check a server seed commitment");
        info!("   GET    /api/rooms              - Active and recent rooms");
        info!("   POST   /api/rooms              - Create a room");
        info!("   DELETE /api/rooms/:id          - Cancel an unjoined room");
        info!("   POST   /api/rooms/:id/join     - Join a room");
        info!("   POST   /api/rooms/:id/seed     - Submit player seed and flip");
        info!("   GET    /api/flips/:id          - Archived flip");
        info!("   GET    /api/account            - Balance and stats");
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("⚠️  Failed to install Ctrl+C handler: {}", e);
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
                warn!("⚠️  Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
