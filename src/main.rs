//! bolao-bot binary entrypoint wiring the webhook server, the messaging
//! gateway, MongoDB storage and the reminder loop.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bolao_bot::{
    commands::CommandRegistry,
    config::AppConfig,
    dao::pool_store::{
        PoolStore,
        mongodb::{MongoConfig, MongoPoolStore},
    },
    gateway::http::HttpGateway,
    routes,
    services::{reminder, storage_supervisor},
    state::{AppState, BotContext},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env();
    let port = config.port;
    let state = AppState::new(config.clone());

    let gateway = Arc::new(HttpGateway::new(&config).context("building gateway client")?);

    let mongo_uri = config.mongo_uri.clone();
    let mongo_db = config.mongo_db.clone();
    tokio::spawn(storage_supervisor::run(state.clone(), move || {
        let uri = mongo_uri.clone();
        let db = mongo_db.clone();
        async move {
            let mongo_config = MongoConfig::from_uri(&uri, db.as_deref()).await?;
            let store = MongoPoolStore::connect(mongo_config).await?;
            Ok(Arc::new(store) as Arc<dyn PoolStore>)
        }
    }));

    tokio::spawn(reminder::run(state.clone(), gateway.clone()));

    let context = BotContext {
        state,
        gateway,
        registry: Arc::new(CommandRegistry::new()),
    };
    let app = build_router(context);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting webhook server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(context: BotContext) -> Router<()> {
    routes::router(context)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
