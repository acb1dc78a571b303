//! Quiz bot backend entrypoint wiring the chat gateway, SSE streams and the quiz store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quiz_bot_back::{
    config::AppConfig,
    routes,
    services::play_service,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);

    spawn_storage(app_state.clone()).await;
    let app = build_router(app_state.clone());

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    let abandoned = play_service::abandon_all(&app_state).await;
    info!(abandoned, "server stopped");
    Ok(())
}

/// Start the MongoDB supervisor; it retries in the background and toggles degraded mode.
#[cfg(feature = "mongo-store")]
async fn spawn_storage(state: SharedState) {
    use quiz_bot_back::dao::{
        quiz_store::{
            QuizStore,
            mongodb::{MongoConfig, MongoQuizStore},
        },
        storage::StorageError,
    };
    use quiz_bot_back::services::storage_supervisor;

    tokio::spawn(storage_supervisor::run(state, || async {
        let config = MongoConfig::from_env().await.map_err(StorageError::from)?;
        let store = MongoQuizStore::connect(config)
            .await
            .map_err(StorageError::from)?;
        Ok::<_, StorageError>(Arc::new(store) as Arc<dyn QuizStore>)
    }));
}

/// Without MongoDB support quizzes live in memory for the lifetime of the process.
#[cfg(not(feature = "mongo-store"))]
async fn spawn_storage(state: SharedState) {
    use quiz_bot_back::dao::quiz_store::InMemoryQuizStore;

    tracing::warn!("built without mongo-store; quizzes are kept in memory only");
    state
        .set_quiz_store(Arc::new(InMemoryQuizStore::new()))
        .await;
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
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

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
