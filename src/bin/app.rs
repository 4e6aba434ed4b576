use std::{
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use adapter::{
    database::{connect_database_with, migrate},
    redis::RedisClient,
};
use anyhow::{Context, Result};
use api::route::v1;
use axum::{http::Method, Router};
use chrono::Utc;
use registry::AppRegistry;
use shared::{
    config::AppConfig,
    env::{which, Environment},
};
use tokio::{net::TcpListener, task::JoinHandle, time::MissedTickBehavior};
use tower_http::{
    cors::{self, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logger()?;
    bootstrap().await
}

fn init_logger() -> Result<()> {
    let log_level = match which() {
        Environment::Development => "debug",
        Environment::Production => "info",
    };

    // RUST_LOG が設定されていればそちらを優先する
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| log_level.into());

    match which() {
        Environment::Development => {
            let subscriber = tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_target(false);
            tracing_subscriber::registry()
                .with(subscriber)
                .with(env_filter)
                .try_init()?;
        }
        // 本番はログ収集基盤向けに JSON で出力する
        Environment::Production => {
            let subscriber = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(false);
            tracing_subscriber::registry()
                .with(subscriber)
                .with(env_filter)
                .try_init()?;
        }
    }

    Ok(())
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_headers(cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_origin(cors::Any)
}

// 期限切れの満了と放置された PENDING の取り消しを定期的に行う
fn spawn_sweeper(registry: AppRegistry, interval_seconds: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(e) = registry.entitlement_resolver().sweep(Utc::now()).await {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "grant sweep failed"
                );
            }
        }
    })
}

async fn bootstrap() -> Result<()> {
    let app_config = AppConfig::new()?;
    let pool = connect_database_with(&app_config.database);
    migrate(&pool).await?;

    let kv = Arc::new(RedisClient::new(&app_config.redis)?);
    let registry = AppRegistry::new(pool, kv, app_config.rental);

    let sweeper = spawn_sweeper(registry.clone(), app_config.sweep.interval_seconds);

    let app = Router::new()
        .merge(v1::build_routes())
        .layer(cors())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .with_state(registry);

    let addr = SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), 8080);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Listening on {}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Unexpected error happened in server")
        .inspect_err(|e| {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "Unexpected error"
            )
        });

    sweeper.abort();
    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Ctrl-C を受信しました。"),
        _ = terminate => tracing::info!("SIGTERM を受信しました。"),
    }
}
