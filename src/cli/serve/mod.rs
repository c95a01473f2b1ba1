//! Serve command - API, uploaded images and static front-end on one port

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{middleware::from_fn, Router};
use chrono::Utc;
use clap::Args;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::time::MissedTickBehavior;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{debug, info, warn};

use crate::api::create_router_with_state;
use crate::api::middleware::security_headers_middleware;
use crate::api::state::AppState;
use crate::config::AppConfig;
use crate::infrastructure::auth::AuthService;
use crate::infrastructure::images::PUBLIC_PREFIX;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::observability::{
    create_metrics_router, init_metrics, set_active_sessions, PrometheusMetrics,
};

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Bind address, overriding `server.host`
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port, overriding `server.port`
    #[arg(long)]
    pub port: Option<u16>,
}

/// Run the server until Ctrl+C or SIGTERM
pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut config = AppConfig::load().context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_logging(&config.logging);
    let metrics = init_metrics(&config.metrics);

    let state = crate::create_app_state_with_config(&config)?;
    spawn_session_sweep(
        state.auth_service.clone(),
        config.auth.session_sweep_interval_secs,
    );

    let app = create_app(state, &config, metrics);

    let addr = build_socket_addr(&config)?;
    info!("Starting storefront API on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn build_socket_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    let ip = config
        .server
        .host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("Invalid server host '{}'", config.server.host))?;

    Ok(SocketAddr::from((ip, config.server.port)))
}

/// Compose the API, the image directory, metrics and the front-end
fn create_app(state: AppState, config: &AppConfig, metrics: Option<PrometheusMetrics>) -> Router {
    let mut app = Router::new()
        .nest("/api", create_router_with_state(state))
        .nest_service(PUBLIC_PREFIX, ServeDir::new(&config.uploads.dir));

    if let Some(metrics) = metrics {
        app = app.merge(create_metrics_router(metrics, &config.metrics.path));
    }

    if let Some(dir) = &config.server.static_dir {
        let index = Path::new(dir).join("index.html");
        app = app.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    app.layer(from_fn(security_headers_middleware))
}

/// Periodically evict expired refresh sessions; `0` disables the sweep
fn spawn_session_sweep(auth: Arc<AuthService>, interval_secs: u64) {
    if interval_secs == 0 {
        info!("Session sweep disabled");
        return;
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let sessions = auth.sessions();

            match sessions.purge_expired(Utc::now()).await {
                Ok(0) => debug!("Session sweep found nothing to evict"),
                Ok(purged) => info!(purged, "Evicted expired refresh sessions"),
                Err(e) => warn!(error = %e, "Session sweep failed"),
            }

            if let Ok(active) = sessions.count().await {
                set_active_sessions(active);
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.uploads.dir = std::env::temp_dir()
            .join(format!("storefront-serve-{}", uuid::Uuid::new_v4()))
            .to_string_lossy()
            .into_owned();
        config
    }

    #[tokio::test]
    async fn test_api_is_mounted_under_api_prefix() {
        let config = test_config();
        let state = crate::create_app_state_with_config(&config).unwrap();
        let app = create_app(state, &config, None);

        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-store"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("healthy"));
    }

    #[tokio::test]
    async fn test_serves_uploaded_images() {
        let config = test_config();
        std::fs::create_dir_all(&config.uploads.dir).unwrap();
        std::fs::write(Path::new(&config.uploads.dir).join("1-mango.png"), b"PNG").unwrap();
        let state = crate::create_app_state_with_config(&config).unwrap();
        let app = create_app(state, &config, None);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/images/1-mango.png")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"PNG");
    }

    #[test]
    fn test_invalid_host_is_reported() {
        let mut config = AppConfig::default();
        config.server.host = "not a host".to_string();

        assert!(build_socket_addr(&config).is_err());
    }
}
